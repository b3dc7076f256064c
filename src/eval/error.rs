//! Document validation errors
//!
//! Errors form a tree: a record failure carries every field failure, a
//! union failure carries every rejected alternative. `report()` renders the
//! whole tree, `Display` only the node itself.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("the `{field}` field is not valid because:")]
    InvalidField {
        field: String,
        cause: Box<ValidationError>,
    },

    #[error("Missing {field}")]
    MissingIdentifier { field: String },

    #[error("invalid field `{key}`, expected one of: {}", quoted(expected))]
    UnexpectedField { key: String, expected: Vec<String> },

    #[error("Trying '{class_name}'")]
    RecordValidationFailed {
        class_name: String,
        errors: Vec<ValidationError>,
    },

    #[error("Not a {class_name}")]
    ClassMismatch {
        class_name: String,
        found: Option<String>,
    },

    #[error("{0}")]
    Invalid(String),

    #[error("{message}")]
    Multiple {
        message: String,
        errors: Vec<ValidationError>,
    },

    #[error("Failed to fetch {uri}: {reason}")]
    Fetch { uri: String, reason: String },
}

fn quoted(keys: &[String]) -> String {
    keys.iter()
        .map(|k| format!("'{}'", k))
        .collect::<Vec<_>>()
        .join(", ")
}

impl ValidationError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    pub fn invalid_field(field: impl Into<String>, cause: ValidationError) -> Self {
        Self::InvalidField {
            field: field.into(),
            cause: Box::new(cause),
        }
    }

    pub fn unexpected_field(key: impl Into<String>, expected: &[String]) -> Self {
        Self::UnexpectedField {
            key: key.into(),
            expected: expected.to_vec(),
        }
    }

    pub fn fetch(uri: impl Into<String>, reason: impl ToString) -> Self {
        Self::Fetch {
            uri: uri.into(),
            reason: reason.to_string(),
        }
    }

    /// Direct children in the error tree
    pub fn causes(&self) -> &[ValidationError] {
        match self {
            Self::InvalidField { cause, .. } => std::slice::from_ref(cause.as_ref()),
            Self::RecordValidationFailed { errors, .. } | Self::Multiple { errors, .. } => errors,
            _ => &[],
        }
    }

    /// First record failure in depth-first order, this node included
    pub fn record_failure(&self) -> Option<(&str, &[ValidationError])> {
        if let Self::RecordValidationFailed { class_name, errors } = self {
            return Some((class_name, errors));
        }
        self.causes().iter().find_map(|c| c.record_failure())
    }

    /// Does this node or any descendant satisfy `pred`?
    pub fn any(&self, pred: &dyn Fn(&ValidationError) -> bool) -> bool {
        pred(self) || self.causes().iter().any(|c| c.any(pred))
    }

    /// Render the full tree, two spaces per level
    pub fn report(&self) -> String {
        let mut out = String::new();
        self.write_tree(&mut out, 0);
        out
    }

    fn write_tree(&self, out: &mut String, depth: usize) {
        let line = self.to_string();
        let child_depth = if line.is_empty() {
            depth
        } else {
            out.push_str(&"  ".repeat(depth));
            out.push_str(&line);
            out.push('\n');
            depth + 1
        };
        for cause in self.causes() {
            cause.write_tree(out, child_depth);
        }
    }
}
