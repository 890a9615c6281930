//! Error types for the signal-group model.
//!
//! Two failure families exist: structural problems with a value
//! (`Shape`/`Content`), and lookup problems (`UnresolvedName`,
//! `SchemaViolation`). Shape and schema errors are always hard; content
//! errors have an advisory twin in [`crate::check`]; unresolved names are
//! hard only in the `_strict` entry points.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ModelError>;

#[derive(Error, Debug)]
pub enum ModelError {
    /// The value is not even a structural candidate for its claimed kind.
    #[error("shape error in {what}: {detail}")]
    Shape { what: String, detail: String },

    /// Structurally a candidate, but a content rule is violated.
    #[error("content error in {what}: {detail}")]
    Content { what: String, detail: String },

    /// A requested name or selector matched zero channels.
    #[error("name {name:?} matched nothing in {scope}")]
    UnresolvedName { name: String, scope: String },

    /// The lookup source failed its internal consistency rules.
    /// Violations are accumulated, never reported one at a time.
    #[error("lookup source failed validation with {} error(s):\n{}", .errors.len(), .errors.join("\n"))]
    SchemaViolation { errors: Vec<String> },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

impl ModelError {
    pub fn shape(what: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Shape {
            what: what.into(),
            detail: detail.into(),
        }
    }

    pub fn content(what: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Content {
            what: what.into(),
            detail: detail.into(),
        }
    }

    pub fn unresolved(name: impl Into<String>, scope: impl Into<String>) -> Self {
        Self::UnresolvedName {
            name: name.into(),
            scope: scope.into(),
        }
    }
}
