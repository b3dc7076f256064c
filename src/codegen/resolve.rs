//! Type Resolver
//!
//! Maps a type declaration onto a catalog entry, interning every composite
//! shape it has not seen before. Record and enum references by name only
//! resolve once the referenced type has been declared, so callers either
//! declare types in dependency order or run a pre-declaration pass first.

use crate::error::{CodegenError, Result};
use crate::schema::{EnumDecl, RecordDecl, TypeDecl, SALAD_NS, XSD_NS};

use super::catalog::{LoaderDescriptor, LoaderKind, PrimitiveKind};
use super::names::{safe_name, shortname};
use super::CompilationContext;

/// Qualified name of the expression string subtype
pub const CWL_EXPRESSION: &str = "https://w3id.org/cwl/cwl#Expression";

/// Fixed primitive loaders, in the order a fresh context interns them
pub const PRIMITIVES: &[(&str, LoaderKind)] = &[
    ("strtype", LoaderKind::Primitive(PrimitiveKind::Str)),
    ("inttype", LoaderKind::Primitive(PrimitiveKind::Int)),
    ("floattype", LoaderKind::Primitive(PrimitiveKind::Float)),
    ("booltype", LoaderKind::Primitive(PrimitiveKind::Bool)),
    ("null_type", LoaderKind::Primitive(PrimitiveKind::Null)),
    ("any_type", LoaderKind::Any),
];

/// Loader name for a primitive type name, short or qualified
pub fn primitive_loader_name(name: &str) -> Option<&'static str> {
    let short = name
        .strip_prefix(XSD_NS)
        .or_else(|| name.strip_prefix(SALAD_NS))
        .unwrap_or(name);
    let loader = match short {
        "string" => "strtype",
        "int" | "long" => "inttype",
        "float" | "double" => "floattype",
        "boolean" => "booltype",
        "null" => "null_type",
        "Any" => "any_type",
        _ => return None,
    };
    Some(loader)
}

fn is_expression(name: &str) -> bool {
    name == "Expression" || name == CWL_EXPRESSION
}

/// Loader name used for a declared record or enum
pub fn declared_loader_name(type_name: &str) -> String {
    format!("{}Loader", safe_name(type_name))
}

/// Canonical union name: distinct member names, sorted, joined with `_or_`
pub fn union_name(member_names: &[String]) -> String {
    let mut sorted: Vec<&str> = member_names.iter().map(String::as_str).collect();
    sorted.sort_unstable();
    sorted.dedup();
    format!("union_of_{}", sorted.join("_or_"))
}

// =============================================================================
// Resolver
// =============================================================================

pub struct TypeResolver<'a> {
    ctx: &'a mut CompilationContext,
}

impl<'a> TypeResolver<'a> {
    pub fn new(ctx: &'a mut CompilationContext) -> Self {
        Self { ctx }
    }

    /// Resolve a declaration to its canonical loader descriptor
    pub fn resolve(&mut self, decl: &TypeDecl) -> Result<LoaderDescriptor> {
        match decl {
            TypeDecl::Named(name) => self.resolve_named(name),
            TypeDecl::Union(alternatives) => self.resolve_union(alternatives),
            TypeDecl::Array(items) => {
                let item = self.resolve(items)?;
                Ok(self.ctx.catalog.intern(LoaderDescriptor::new(
                    format!("array_of_{}", item.name),
                    LoaderKind::Array { items: item.name },
                )))
            }
            TypeDecl::Enum(decl) => Ok(self.declare_enum(decl)),
            TypeDecl::Record(decl) => Ok(self.declare_record(decl)),
            TypeDecl::Unknown { tag } => Err(CodegenError::unsupported(tag.clone())),
        }
    }

    fn resolve_named(&mut self, name: &str) -> Result<LoaderDescriptor> {
        if let Some(primitive) = primitive_loader_name(name) {
            return self
                .ctx
                .catalog
                .get(primitive)
                .cloned()
                .ok_or_else(|| CodegenError::unresolved(name));
        }

        if is_expression(name) {
            return Ok(self.ctx.catalog.intern(LoaderDescriptor::new(
                declared_loader_name(name),
                LoaderKind::Expression,
            )));
        }

        match self.ctx.catalog.get(&declared_loader_name(name)) {
            Some(found) if matches!(found.kind, LoaderKind::Record { .. } | LoaderKind::Enum { .. }) => {
                Ok(found.clone())
            }
            _ => Err(CodegenError::unresolved(name)),
        }
    }

    fn resolve_union(&mut self, alternatives: &[TypeDecl]) -> Result<LoaderDescriptor> {
        let mut members: Vec<String> = Vec::with_capacity(alternatives.len());
        for alternative in alternatives {
            let resolved = self.resolve(alternative)?;
            if !members.contains(&resolved.name) {
                members.push(resolved.name);
            }
        }
        if members.is_empty() {
            return Err(CodegenError::InvalidSchema("union without alternatives".into()));
        }

        let name = union_name(&members);
        Ok(self
            .ctx
            .catalog
            .intern(LoaderDescriptor::new(name, LoaderKind::Union { members })))
    }

    /// Intern an enum loader and register its symbols in the vocabulary
    pub fn declare_enum(&mut self, decl: &EnumDecl) -> LoaderDescriptor {
        for symbol in &decl.symbols {
            self.ctx.add_vocab(shortname(symbol), symbol);
        }
        self.ctx.catalog.intern(LoaderDescriptor::new(
            declared_loader_name(&decl.name),
            LoaderKind::Enum {
                symbols: decl.symbols.iter().map(|s| safe_name(s)).collect(),
            },
        ))
    }

    /// Intern a record loader; abstract records are flagged so the epilogue
    /// never binds them
    pub fn declare_record(&mut self, decl: &RecordDecl) -> LoaderDescriptor {
        self.ctx.catalog.intern(
            LoaderDescriptor::new(
                declared_loader_name(&decl.name),
                LoaderKind::Record {
                    class_name: safe_name(&decl.name),
                },
            )
            .with_abstract(decl.is_abstract),
        )
    }
}
