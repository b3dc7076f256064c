//! Error types for loader code generation

use thiserror::Error;

/// Result type for codegen operations
pub type Result<T> = std::result::Result<T, CodegenError>;

/// Compile-time errors. Any of these aborts the whole run; there is no
/// partial generated output.
#[derive(Error, Debug)]
pub enum CodegenError {
    #[error("Unresolved type reference: {name}")]
    UnresolvedTypeReference { name: String },

    #[error("Unsupported type shape: {tag}")]
    UnsupportedTypeShape { tag: String },

    #[error("Inheritance cycle detected: {}", members.join(" -> "))]
    InheritanceCycle { members: Vec<String> },

    #[error("Record emitter protocol violation in {class_name}: {reason}")]
    EmitOrder { class_name: String, reason: String },

    #[error("Invalid schema format: {0}")]
    InvalidSchema(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl CodegenError {
    pub fn unresolved(name: impl Into<String>) -> Self {
        Self::UnresolvedTypeReference { name: name.into() }
    }

    pub fn unsupported(tag: impl Into<String>) -> Self {
        Self::UnsupportedTypeShape { tag: tag.into() }
    }

    /// True for the errors raised while resolving type declarations
    pub fn is_resolution_error(&self) -> bool {
        matches!(
            self,
            Self::UnresolvedTypeReference { .. } | Self::UnsupportedTypeShape { .. }
        )
    }
}
