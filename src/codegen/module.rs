//! Module Emitter
//!
//! Runs a whole compilation: validates inheritance, declares named types,
//! drives a `RecordEmitter` per record and closes with the epilogue that
//! binds the vocabulary, every bound loader and the document root.

use indexmap::IndexMap;

use crate::diagnostics::Diagnostics;
use crate::error::{CodegenError, Result};
use crate::graph::InheritanceGraph;
use crate::schema::{RecordDecl, SchemaDocument, TypeDecl};

use super::catalog::LoaderDescriptor;
use super::config::{CompileOptions, ResolutionStrategy};
use super::names::{safe_name, shortname};
use super::plan::{ModulePlan, RecordPlan};
use super::record::{RecordEmitter, RecordField, RecordSpec};
use super::resolve::TypeResolver;
use super::wrap::{field_loader, identifier_loader};
use super::CompilationContext;

/// Result of one compilation run
#[derive(Debug, Clone)]
pub struct CompiledModule {
    pub plan: ModulePlan,
    pub diagnostics: Diagnostics,
}

/// Collect named enum and record declarations, nested ones included
fn collect<'a>(decl: &'a TypeDecl, out: &mut Vec<&'a TypeDecl>) {
    match decl {
        TypeDecl::Enum(_) => out.push(decl),
        TypeDecl::Record(r) => {
            out.push(decl);
            for field in &r.fields {
                collect(&field.field_type, out);
            }
        }
        TypeDecl::Union(alternatives) => alternatives.iter().for_each(|a| collect(a, out)),
        TypeDecl::Array(items) => collect(items, out),
        TypeDecl::Named(_) | TypeDecl::Unknown { .. } => {}
    }
}

// =============================================================================
// Module Emitter
// =============================================================================

pub struct ModuleEmitter {
    ctx: CompilationContext,
    records: Vec<RecordPlan>,
}

impl Default for ModuleEmitter {
    fn default() -> Self {
        Self::new()
    }
}

impl ModuleEmitter {
    pub fn new() -> Self {
        Self::with_context(CompilationContext::new())
    }

    pub fn with_context(ctx: CompilationContext) -> Self {
        Self {
            ctx,
            records: Vec::new(),
        }
    }

    pub fn context(&self) -> &CompilationContext {
        &self.ctx
    }

    /// Declare a record or enum name so that later references resolve
    fn declare(&mut self, decl: &TypeDecl) {
        match decl {
            TypeDecl::Enum(e) => {
                TypeResolver::new(&mut self.ctx).declare_enum(e);
            }
            TypeDecl::Record(r) => {
                TypeResolver::new(&mut self.ctx).declare_record(r);
            }
            _ => return,
        }
        if let Some(name) = decl.declared_name() {
            self.ctx.add_vocab(shortname(name), name);
        }
    }

    /// Run the record generation protocol for one record
    pub fn emit_record(&mut self, decl: &RecordDecl, parents: Vec<String>) -> Result<()> {
        let mut emitter = RecordEmitter::begin(RecordSpec {
            class_name: safe_name(&decl.name),
            schema_name: decl.name.clone(),
            parents,
            doc: decl.doc.clone(),
            is_abstract: decl.is_abstract,
        });

        if let Some(id_field) = decl.fields.iter().find(|f| f.is_identifier()) {
            let loader = identifier_loader(&mut self.ctx, id_field)?;
            emitter.declare_identifier_field(RecordField {
                name: id_field.name.clone(),
                key: shortname(&id_field.name).to_string(),
                loader,
                optional: id_field.is_optional(),
                doc: id_field.doc.clone(),
                subscope: id_field.subscope.clone(),
            })?;
        }

        for field in decl.fields.iter().filter(|f| !f.is_identifier()) {
            let resolved = field_loader(&mut self.ctx, field)?;
            emitter.declare_field(RecordField {
                name: field.name.clone(),
                key: resolved.key,
                loader: resolved.loader,
                optional: field.is_optional(),
                doc: field.doc.clone(),
                subscope: None,
            })?;
        }

        self.records.push(emitter.end());
        Ok(())
    }

    /// Bind the vocabulary, the bound loaders and the root loader
    pub fn epilogue(self, root_loader: &LoaderDescriptor, parser_info: String) -> CompiledModule {
        let loaders: IndexMap<String, LoaderDescriptor> = self
            .ctx
            .catalog
            .all_entries()
            .filter(|d| !d.is_abstract)
            .map(|d| (d.name.clone(), d.clone()))
            .collect();

        tracing::info!(
            records = self.records.len(),
            loaders = loaders.len(),
            vocabulary = self.ctx.vocab.len(),
            root = %root_loader.name,
            "compiled loader module"
        );

        CompiledModule {
            plan: ModulePlan {
                parser_info,
                records: self.records,
                vocabulary: self.ctx.vocab,
                loaders,
                root_loader: root_loader.name.clone(),
            },
            diagnostics: self.ctx.diagnostics,
        }
    }

    fn root_loader(&mut self, records: &[&RecordDecl]) -> Result<LoaderDescriptor> {
        let mut roots = Vec::new();
        for record in records.iter().filter(|r| r.document_root) {
            if record.is_abstract {
                self.ctx.diagnostics.abstract_document_root(&record.name);
            } else {
                roots.push(record.name.clone());
            }
        }

        if roots.is_empty() {
            roots = records
                .iter()
                .filter(|r| !r.is_abstract)
                .map(|r| r.name.clone())
                .collect();
            if roots.is_empty() {
                return Err(CodegenError::InvalidSchema(
                    "schema declares no concrete record to use as document root".into(),
                ));
            }
            let short: Vec<String> = roots.iter().map(|r| safe_name(r)).collect();
            self.ctx.diagnostics.implicit_document_root(&short);
        }

        let named: Vec<TypeDecl> = roots.into_iter().map(TypeDecl::Named).collect();
        let mut alternatives = named.clone();
        alternatives.push(TypeDecl::Array(Box::new(TypeDecl::Union(named))));
        TypeResolver::new(&mut self.ctx).resolve(&TypeDecl::Union(alternatives))
    }
}

// =============================================================================
// Compile Driver
// =============================================================================

/// Compile a schema graph into a module plan
pub fn compile(schema: &SchemaDocument, options: &CompileOptions) -> Result<CompiledModule> {
    let mut declared = Vec::new();
    for decl in &schema.declarations {
        collect(decl, &mut declared);
    }
    let records: Vec<&RecordDecl> = declared
        .iter()
        .filter_map(|d| match d {
            TypeDecl::Record(r) => Some(r),
            _ => None,
        })
        .collect();

    let graph = InheritanceGraph::build(&records)?;
    let parents = |record: &RecordDecl| -> Vec<String> {
        graph
            .parents(&safe_name(&record.name))
            .into_iter()
            .map(str::to_string)
            .collect()
    };
    let mut emitter = ModuleEmitter::new();

    match options.strategy {
        ResolutionStrategy::TwoPhase => {
            for decl in &declared {
                emitter.declare(decl);
            }
            for idx in graph.emission_order() {
                emitter.emit_record(records[idx], parents(records[idx]))?;
            }
        }
        ResolutionStrategy::SinglePhase => {
            for decl in &declared {
                emitter.declare(decl);
                if let TypeDecl::Record(r) = decl {
                    emitter.emit_record(r, parents(r))?;
                }
            }
        }
    }

    let root = emitter.root_loader(&records)?;
    let parser_info = options
        .parser_info
        .clone()
        .unwrap_or_else(|| format!("{}-{}", env!("CARGO_PKG_NAME"), schema.fingerprint.short()));
    Ok(emitter.epilogue(&root, parser_info))
}
