//! Codegen Configuration
//!
//! Two tiers:
//! - `CompileOptions`: target-independent settings for the resolver and emitters
//! - `RenderProfile`: settings for the Rust formatting stage only
//!
//! Resolution never reads the render profile.

use serde::{Deserialize, Serialize};

// =============================================================================
// Compile Options (Target-Independent)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompileOptions {
    /// How record and enum names become resolvable
    #[serde(default)]
    pub strategy: ResolutionStrategy,

    /// Overrides the parser identifier embedded in generated modules
    #[serde(default)]
    pub parser_info: Option<String>,
}

impl Default for CompileOptions {
    fn default() -> Self {
        Self {
            strategy: ResolutionStrategy::TwoPhase,
            parser_info: None,
        }
    }
}

/// Ordering strategy for named type resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// Pre-declare every record and enum, then resolve fields
    #[default]
    TwoPhase,
    /// Declare each type when it is reached in input order; forward
    /// references fail
    SinglePhase,
}

// =============================================================================
// Render Profile (Rust)
// =============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderProfile {
    /// Path of the loader runtime crate the generated code calls into
    #[serde(default = "default_runtime_crate")]
    pub runtime_crate: String,

    /// Copyright line placed under the generated-file banner
    #[serde(default)]
    pub copyright: Option<String>,

    /// Emit schema documentation as doc comments
    #[serde(default = "default_true")]
    pub emit_docs: bool,

    /// Derives added to every generated struct
    #[serde(default = "default_derives")]
    pub derives: Vec<String>,
}

fn default_runtime_crate() -> String {
    "loader_runtime".to_string()
}

fn default_true() -> bool {
    true
}

fn default_derives() -> Vec<String> {
    vec!["Debug".to_string()]
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self {
            runtime_crate: default_runtime_crate(),
            copyright: None,
            emit_docs: true,
            derives: default_derives(),
        }
    }
}

impl RenderProfile {
    /// Attribute line for the configured derives, empty if there are none
    pub fn derive_line(&self) -> String {
        if self.derives.is_empty() {
            String::new()
        } else {
            format!("#[derive({})]\n", self.derives.join(", "))
        }
    }
}
