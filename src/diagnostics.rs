//! Diagnostics
//!
//! Collects non-fatal findings during a compilation run. Fatal problems are
//! `CodegenError`s and abort the run instead.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Diagnostic Codes
// =============================================================================

/// Diagnostic code for categorizing issues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticCode {
    /// Two URIs share one short name in the vocabulary
    VocabularyConflict,
    /// No record is marked `documentRoot`; all concrete records become roots
    ImplicitDocumentRoot,
    /// An abstract record is marked `documentRoot` and is skipped as a root
    AbstractDocumentRoot,
}

impl DiagnosticCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VocabularyConflict => "W001",
            Self::ImplicitDocumentRoot => "W002",
            Self::AbstractDocumentRoot => "W003",
        }
    }

    pub fn severity(&self) -> Severity {
        match self {
            Self::ImplicitDocumentRoot => Severity::Info,
            Self::VocabularyConflict | Self::AbstractDocumentRoot => Severity::Warning,
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// =============================================================================
// Severity
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
        }
    }
}

// =============================================================================
// Diagnostic Item
// =============================================================================

/// A single diagnostic item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticItem {
    /// Schema element that caused this diagnostic
    pub subject: String,
    pub code: DiagnosticCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub context: Vec<String>,
}

impl DiagnosticItem {
    pub fn new(subject: impl Into<String>, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            code,
            message: message.into(),
            context: Vec::new(),
        }
    }

    pub fn with_context(mut self, ctx: impl Into<String>) -> Self {
        self.context.push(ctx.into());
        self
    }

    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl fmt::Display for DiagnosticItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} ({})",
            self.code,
            self.code.severity(),
            self.message,
            self.subject
        )?;

        for ctx in &self.context {
            write!(f, "\n  - {}", ctx)?;
        }

        Ok(())
    }
}

// =============================================================================
// Diagnostics Collection
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    items: Vec<DiagnosticItem>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a diagnostic item, mirroring it to the log
    pub fn push(&mut self, item: DiagnosticItem) {
        match item.severity() {
            Severity::Warning => tracing::warn!(code = %item.code, subject = %item.subject, "{}", item.message),
            Severity::Info => tracing::info!(code = %item.code, subject = %item.subject, "{}", item.message),
        }
        self.items.push(item);
    }

    pub fn vocabulary_conflict(&mut self, short: &str, previous: &str, current: &str) {
        self.push(
            DiagnosticItem::new(
                short,
                DiagnosticCode::VocabularyConflict,
                format!("short name '{}' is bound to more than one URI", short),
            )
            .with_context(format!("previous: {}", previous))
            .with_context(format!("current: {}", current)),
        );
    }

    pub fn implicit_document_root(&mut self, roots: &[String]) {
        self.push(
            DiagnosticItem::new(
                "<module>",
                DiagnosticCode::ImplicitDocumentRoot,
                "no record is marked documentRoot; using every concrete record",
            )
            .with_context(format!("roots: {}", roots.join(", "))),
        );
    }

    pub fn abstract_document_root(&mut self, record: &str) {
        self.push(DiagnosticItem::new(
            record,
            DiagnosticCode::AbstractDocumentRoot,
            "abstract records cannot be document roots; skipped",
        ));
    }

    pub fn warnings(&self) -> impl Iterator<Item = &DiagnosticItem> {
        self.items.iter().filter(|i| i.severity() == Severity::Warning)
    }

    pub fn all(&self) -> &[DiagnosticItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn has_code(&self, code: DiagnosticCode) -> bool {
        self.items.iter().any(|i| i.code == code)
    }

    pub fn warning_count(&self) -> usize {
        self.warnings().count()
    }

    pub fn merge(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    /// Format all diagnostics for display
    pub fn format_all(&self) -> String {
        let mut output = String::new();

        for item in &self.items {
            output.push_str(&format!("{}\n", item));
        }

        if !self.is_empty() {
            output.push_str(&format!("\n{} warning(s)\n", self.warning_count()));
        }

        output
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_all())
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a DiagnosticItem;
    type IntoIter = std::slice::Iter<'a, DiagnosticItem>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
