//! Conversion of the tool catalog into an LLM function-calling schema
//!
//! Each catalog entry becomes
//! `{"type": "function", "function": {"name", "description", "parameters"}}`
//! with the input schema carried over untouched.

use crate::error::Result;
use crate::model::{InputSchema, ListToolsResponse, Tool};
use serde::{Deserialize, Serialize};

/// Function description as consumed by a function-calling model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionSpec {
    /// Tool name, unchanged
    pub name: String,
    /// Tool description, unchanged
    pub description: String,
    /// The tool's input schema
    pub parameters: InputSchema,
}

/// One entry of the function-calling tool list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionTool {
    /// Always `function`
    #[serde(rename = "type")]
    pub kind: String,
    /// The function description
    pub function: FunctionSpec,
}

impl From<&Tool> for FunctionTool {
    fn from(tool: &Tool) -> Self {
        Self {
            kind: "function".to_string(),
            function: FunctionSpec {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.input_schema.clone(),
            },
        }
    }
}

/// Translate tool definitions, preserving their order
pub fn translate_tools(tools: &[Tool]) -> Vec<FunctionTool> {
    tools.iter().map(FunctionTool::from).collect()
}

/// Translate a serialized `tools/list` envelope into a serialized
/// function-calling tool array
///
/// Only the structure is checked; schema semantics are not validated.
pub fn translate(catalog_json: &[u8]) -> Result<Vec<u8>> {
    let response: ListToolsResponse = serde_json::from_slice(catalog_json)?;
    let functions = translate_tools(&response.result.tools);
    Ok(serde_json::to_vec_pretty(&functions)?)
}
