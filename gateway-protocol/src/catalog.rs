//! Static tool catalog
//!
//! The catalog is read once when the gateway starts and never changes
//! afterwards. The original bytes are kept so `tools/list` can serve them
//! exactly as they were written.

use crate::error::{ProtocolError, Result};
use crate::model::{ListToolsResponse, Tool};
use bytes::Bytes;
use std::collections::HashSet;
use std::path::Path;

/// Ordered, read-only list of the tools the gateway can dispatch to
#[derive(Debug, Clone)]
pub struct ToolCatalog {
    tools: Vec<Tool>,
    raw: Bytes,
}

impl ToolCatalog {
    /// Parse a catalog from its serialized `{"result": {"tools": [...]}}` form
    pub fn from_slice(raw: impl Into<Bytes>) -> Result<Self> {
        let raw = raw.into();
        let response: ListToolsResponse = serde_json::from_slice(&raw)?;
        let tools = response.result.tools;

        let mut seen = HashSet::with_capacity(tools.len());
        for (index, tool) in tools.iter().enumerate() {
            if tool.name.is_empty() {
                return Err(ProtocolError::EmptyToolName(index));
            }
            if !seen.insert(tool.name.as_str()) {
                return Err(ProtocolError::DuplicateTool(tool.name.clone()));
            }
        }

        Ok(Self { tools, raw })
    }

    /// Read and parse a catalog file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read(path).map_err(|source| ProtocolError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(raw)
    }

    /// Build a catalog from tool definitions
    pub fn from_tools(tools: Vec<Tool>) -> Result<Self> {
        let raw = serde_json::to_vec(&ListToolsResponse::new(tools))?;
        Self::from_slice(raw)
    }

    /// All tools, in declared order
    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    /// The catalog exactly as it was loaded
    pub fn raw(&self) -> &Bytes {
        &self.raw
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<&Tool> {
        self.tools.iter().find(|tool| tool.name == name)
    }

    /// Whether a tool named `name` is declared
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Number of declared tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Whether no tools are declared
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{InputSchema, PropertySpec};

    fn tool(name: &str) -> Tool {
        Tool {
            name: name.to_string(),
            description: format!("{name} tool"),
            input_schema: InputSchema::object().with_property(
                "value",
                PropertySpec::new("string", "a value"),
                true,
            ),
        }
    }

    #[test]
    fn test_catalog_keeps_declared_order() {
        let catalog =
            ToolCatalog::from_tools(vec![tool("zeta"), tool("alpha"), tool("mid")]).unwrap();
        let names: Vec<_> = catalog.tools().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_catalog_serves_raw_bytes() {
        let raw = br#"{ "result" : { "tools" : [] } }"#.to_vec();
        let catalog = ToolCatalog::from_slice(raw.clone()).unwrap();
        assert!(catalog.is_empty());
        assert_eq!(catalog.raw().as_ref(), raw.as_slice());
    }

    #[test]
    fn test_duplicate_tool_rejected() {
        let result = ToolCatalog::from_tools(vec![tool("dup"), tool("dup")]);
        assert!(matches!(result, Err(ProtocolError::DuplicateTool(name)) if name == "dup"));
    }

    #[test]
    fn test_empty_name_rejected() {
        let result = ToolCatalog::from_tools(vec![tool("ok"), tool("")]);
        assert!(matches!(result, Err(ProtocolError::EmptyToolName(1))));
    }

    #[test]
    fn test_malformed_catalog_rejected() {
        assert!(ToolCatalog::from_slice(b"not json".to_vec()).is_err());
        assert!(ToolCatalog::from_slice(br#"{"tools": []}"#.to_vec()).is_err());
    }

    #[test]
    fn test_missing_file_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let err = ToolCatalog::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mcp.list.json");
        let catalog = ToolCatalog::from_tools(vec![tool("say_hello")]).unwrap();
        std::fs::write(&path, catalog.raw()).unwrap();

        let loaded = ToolCatalog::from_file(&path).unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(loaded.contains("say_hello"));
        assert!(!loaded.contains("say_goodbye"));
        assert_eq!(loaded.get("say_hello").unwrap().description, "say_hello tool");
    }
}
