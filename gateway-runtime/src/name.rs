//! Validated tool identifiers

use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

const MAX_LEN: usize = 128;

/// Name of a tool, safe to use as a registry key and as a path component
///
/// Only ASCII letters, digits, `_`, `-` and `.` are accepted. Names may not
/// start with `.` or contain `..`, so a `ToolName` can never address anything
/// outside its own directory under the functions root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolName(String);

impl ToolName {
    /// Validate a raw name
    pub fn parse(raw: &str) -> Result<Self> {
        let reject = |reason| Error::InvalidToolName {
            name: raw.to_string(),
            reason,
        };

        if raw.is_empty() {
            return Err(reject("name is empty"));
        }
        if raw.len() > MAX_LEN {
            return Err(reject("name is longer than 128 bytes"));
        }
        if raw.starts_with('.') || raw.contains("..") {
            return Err(reject("name contains a relative path segment"));
        }
        if let Some(bad) = raw
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.')))
        {
            return Err(if bad == '/' || bad == '\\' {
                reject("name contains a path separator")
            } else {
                reject("name contains characters outside [A-Za-z0-9_.-]")
            });
        }

        Ok(Self(raw.to_string()))
    }

    /// The name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for ToolName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ToolName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
