//! Wire types for listing and calling tools

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single property of a tool's argument schema
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertySpec {
    /// JSON type of the property (`string`, `number`, ...)
    #[serde(rename = "type")]
    pub kind: String,
    /// Human readable description shown to the model
    #[serde(default)]
    pub description: String,
}

impl PropertySpec {
    /// Create a property of the given JSON type
    pub fn new(kind: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            description: description.into(),
        }
    }
}

/// Flat object schema describing a tool's arguments
///
/// Properties are kept in a sorted map so that serializing the same schema
/// always yields the same bytes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputSchema {
    /// Schema type, `object` for every tool in practice
    #[serde(rename = "type")]
    pub kind: String,
    /// Named properties
    #[serde(default)]
    pub properties: BTreeMap<String, PropertySpec>,
    /// Names of the mandatory properties
    #[serde(default)]
    pub required: Vec<String>,
}

impl InputSchema {
    /// Create an empty object schema
    pub fn object() -> Self {
        Self {
            kind: "object".to_string(),
            properties: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Add a property, optionally marking it as required
    pub fn with_property(
        mut self,
        name: impl Into<String>,
        spec: PropertySpec,
        required: bool,
    ) -> Self {
        let name = name.into();
        if required && !self.required.contains(&name) {
            self.required.push(name.clone());
        }
        self.properties.insert(name, spec);
        self
    }
}

/// Tool definition as published in the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tool {
    /// Name used to call the tool and to locate its plugin
    pub name: String,
    /// What the tool does
    pub description: String,
    /// Schema of the call arguments
    pub input_schema: InputSchema,
}

/// Body of a `tools/list` result
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListToolsResult {
    /// Tools in catalog order
    pub tools: Vec<Tool>,
}

/// `tools/list` envelope: `{"result": {"tools": [...]}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListToolsResponse {
    /// The listing itself
    pub result: ListToolsResult,
}

impl ListToolsResponse {
    /// Wrap a tool list in the envelope
    pub fn new(tools: Vec<Tool>) -> Self {
        Self {
            result: ListToolsResult { tools },
        }
    }
}

/// Tool call request body
///
/// The arguments are opaque to the gateway and forwarded verbatim to the
/// plugin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallToolRequest {
    /// Tool to call
    pub name: String,
    /// Arguments, `null` when absent
    #[serde(default)]
    pub arguments: serde_json::Value,
}

impl CallToolRequest {
    /// Build a request for `name`
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Content types for tool responses
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Content {
    /// Plain text item
    #[serde(rename = "text")]
    Text {
        /// The text
        text: String,
    },
}

impl Content {
    /// Create a text item
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Get the text of this content item
    pub fn as_text(&self) -> &str {
        match self {
            Self::Text { text } => text,
        }
    }
}

/// Tool call result
///
/// Success and failure share this shape; `is_error` is the only
/// discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToolResult {
    /// Output items, a single text item in practice
    pub content: Vec<Content>,
    /// Whether the call failed
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl CallToolResult {
    /// Successful result with the given items
    pub fn success(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: false,
        }
    }

    /// Failed result with the given items
    pub fn error(content: Vec<Content>) -> Self {
        Self {
            content,
            is_error: true,
        }
    }

    /// Successful result with one text item
    pub fn text(text: impl Into<String>) -> Self {
        Self::success(vec![Content::text(text)])
    }

    /// Failed result with one text item
    pub fn error_text(text: impl Into<String>) -> Self {
        Self::error(vec![Content::text(text)])
    }
}

/// `tools/call` envelope: `{"result": {"content": [...], "isError": bool}}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallToolResponse {
    /// The call outcome
    pub result: CallToolResult,
}

impl CallToolResponse {
    /// Successful call carrying the plugin output as a single text item
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            result: CallToolResult::text(text),
        }
    }

    /// Failed call carrying an English description of the failure
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            result: CallToolResult::error_text(message),
        }
    }

    /// Whether the call failed
    pub fn is_error(&self) -> bool {
        self.result.is_error
    }

    /// Text of the first content item, if any
    pub fn text(&self) -> Option<&str> {
        self.result.content.first().map(Content::as_text)
    }
}
