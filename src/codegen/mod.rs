//! Code Generation
//!
//! Compiles a schema graph into loader modules.
//!
//! Architecture:
//! - CompilationContext: catalog, vocabulary and diagnostics for one run
//! - TypeResolver / FieldLoaderBuilder: decide which loaders must exist
//! - RecordEmitter / ModuleEmitter: produce `ModulePlan` nodes
//! - rust: renders a `ModulePlan` to source text
//!
//! The key constraint: the renderer NEVER sees schema declarations, only plans.

pub mod catalog;
pub mod config;
pub mod module;
pub mod names;
pub mod plan;
pub mod record;
pub mod resolve;
pub mod rust;
pub mod wrap;

use std::path::Path;

use crate::diagnostics::Diagnostics;
use crate::error::Result;
use crate::schema::SchemaDocument;

pub use catalog::{LoaderDescriptor, LoaderKind, PrimitiveKind, TypeCatalog, Vocabulary};
pub use config::{CompileOptions, RenderProfile, ResolutionStrategy};
pub use module::{compile, CompiledModule, ModuleEmitter};
pub use plan::{FieldPlan, ModulePlan, RecordPlan};
pub use record::{RecordEmitter, RecordField, RecordSpec};
pub use resolve::TypeResolver;
pub use wrap::FieldLoaderBuilder;

// =============================================================================
// CompilationContext
// =============================================================================

/// Mutable state of one compilation run. Separate runs never share it.
#[derive(Debug, Clone)]
pub struct CompilationContext {
    pub catalog: TypeCatalog,
    pub vocab: Vocabulary,
    pub diagnostics: Diagnostics,
}

impl Default for CompilationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl CompilationContext {
    /// Fresh context with the primitive loaders already interned
    pub fn new() -> Self {
        let mut catalog = TypeCatalog::new();
        for (name, kind) in resolve::PRIMITIVES {
            catalog.intern(LoaderDescriptor::new(*name, kind.clone()));
        }
        Self {
            catalog,
            vocab: Vocabulary::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Register a vocabulary term, reporting rebinding of a short name
    pub fn add_vocab(&mut self, short: &str, uri: &str) {
        if let Some(previous) = self.vocab.add(short, uri) {
            self.diagnostics.vocabulary_conflict(short, &previous, uri);
        }
    }
}

// =============================================================================
// Generated Output
// =============================================================================

/// Output from code generation
#[derive(Debug, Clone)]
pub struct GeneratedOutput {
    /// Generated code as a string
    pub code: String,
    /// Number of records generated
    pub record_count: usize,
    /// Number of loaders bound at module level
    pub loader_count: usize,
    /// Warnings collected during compilation
    pub diagnostics: Diagnostics,
}

// =============================================================================
// Public API
// =============================================================================

/// Compile and render an already loaded schema
pub fn generate(
    schema: &SchemaDocument,
    options: &CompileOptions,
    profile: &RenderProfile,
) -> Result<GeneratedOutput> {
    let compiled = compile(schema, options)?;
    let code = rust::render_module(&compiled.plan, profile);
    Ok(GeneratedOutput {
        code,
        record_count: compiled.plan.records.len(),
        loader_count: compiled.plan.loaders.len(),
        diagnostics: compiled.diagnostics,
    })
}

/// Generate Rust loader code from a schema file or directory
pub fn generate_rust(
    schema_path: &Path,
    options: &CompileOptions,
    profile: &RenderProfile,
) -> Result<GeneratedOutput> {
    let schema = SchemaDocument::load(schema_path)?;
    generate(&schema, options, profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticCode;

    #[test]
    fn test_context_preinterns_primitives() {
        let ctx = CompilationContext::new();
        let names: Vec<_> = ctx.catalog.all_entries().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["strtype", "inttype", "floattype", "booltype", "null_type", "any_type"]
        );
    }

    #[test]
    fn test_contexts_are_independent() {
        let mut a = CompilationContext::new();
        let b = CompilationContext::new();
        a.add_vocab("red", "http://example.com/red");
        assert_eq!(a.vocab.len(), 1);
        assert!(b.vocab.is_empty());
    }

    #[test]
    fn test_vocab_conflict_reported() {
        let mut ctx = CompilationContext::new();
        ctx.add_vocab("File", "http://a/File");
        ctx.add_vocab("File", "http://b/File");
        assert!(ctx.diagnostics.has_code(DiagnosticCode::VocabularyConflict));
    }
}
