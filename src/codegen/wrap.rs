//! Field Loader Builder
//!
//! Wraps a resolved loader with the URI, ID-map, type-DSL and
//! secondary-files semantics a field's `jsonldPredicate` asks for. Every
//! wrapper is interned, keyed by the inner loader name plus its parameters.

use crate::error::Result;
use crate::schema::FieldDecl;

use super::catalog::{LoaderDescriptor, LoaderKind};
use super::names::{safe_name, shortname};
use super::resolve::TypeResolver;
use super::CompilationContext;

fn opt_scope(ref_scope: Option<i64>) -> String {
    ref_scope.map(|s| s.to_string()).unwrap_or_else(|| "None".to_string())
}

pub struct FieldLoaderBuilder<'a> {
    ctx: &'a mut CompilationContext,
}

impl<'a> FieldLoaderBuilder<'a> {
    pub fn new(ctx: &'a mut CompilationContext) -> Self {
        Self { ctx }
    }

    pub fn uri(
        &mut self,
        inner: &LoaderDescriptor,
        scoped_id: bool,
        vocab_term: bool,
        ref_scope: Option<i64>,
    ) -> LoaderDescriptor {
        let name = format!(
            "uri_{}_{}_{}_{}",
            inner.name,
            scoped_id,
            vocab_term,
            opt_scope(ref_scope)
        );
        self.ctx.catalog.intern(
            LoaderDescriptor::new(
                name,
                LoaderKind::Uri {
                    inner: inner.name.clone(),
                    scoped_id,
                    vocab_term,
                    ref_scope,
                },
            )
            .with_uri(scoped_id, ref_scope),
        )
    }

    /// Accepts a mapping keyed by `map_subject` as well as a list
    pub fn idmap(
        &mut self,
        field: &str,
        inner: &LoaderDescriptor,
        map_subject: &str,
        map_predicate: Option<&str>,
    ) -> LoaderDescriptor {
        self.ctx.catalog.intern(LoaderDescriptor::new(
            format!("idmap_{}_{}", safe_name(field), inner.name),
            LoaderKind::IdMap {
                inner: inner.name.clone(),
                map_subject: map_subject.to_string(),
                map_predicate: map_predicate.map(str::to_string),
            },
        ))
    }

    pub fn typedsl(&mut self, inner: &LoaderDescriptor, ref_scope: Option<i64>) -> LoaderDescriptor {
        self.ctx.catalog.intern(LoaderDescriptor::new(
            format!("typedsl_{}_{}", inner.name, opt_scope(ref_scope)),
            LoaderKind::TypeDsl {
                inner: inner.name.clone(),
                ref_scope,
            },
        ))
    }

    pub fn secondaryfilesdsl(&mut self, inner: &LoaderDescriptor) -> LoaderDescriptor {
        self.ctx.catalog.intern(LoaderDescriptor::new(
            format!("secondaryfilesdsl_{}", inner.name),
            LoaderKind::SecondaryFilesDsl {
                inner: inner.name.clone(),
            },
        ))
    }
}

// =============================================================================
// Field Resolution
// =============================================================================

/// A field's final loader and the document key it is read from
#[derive(Debug, Clone)]
pub struct ResolvedField {
    pub loader: LoaderDescriptor,
    pub key: String,
}

/// Resolve the identifier field: its type wrapped as a scoped-id URI
pub fn identifier_loader(ctx: &mut CompilationContext, field: &FieldDecl) -> Result<LoaderDescriptor> {
    let base = TypeResolver::new(ctx).resolve(&field.field_type)?;
    Ok(FieldLoaderBuilder::new(ctx).uri(&base, true, false, None))
}

/// Resolve a regular field's type and apply its `jsonldPredicate` wrappers
pub fn field_loader(ctx: &mut CompilationContext, field: &FieldDecl) -> Result<ResolvedField> {
    let mut loader = TypeResolver::new(ctx).resolve(&field.field_type)?;
    let mut key = shortname(&field.name).to_string();

    if let Some(pred) = field.predicate_map() {
        let mut builder = FieldLoaderBuilder::new(ctx);

        if pred.type_dsl {
            loader = builder.typedsl(&loader, pred.ref_scope);
        } else if pred.secondary_files_dsl {
            loader = builder.secondaryfilesdsl(&loader);
        } else {
            match pred.type_.as_deref() {
                Some("@id") => {
                    loader = builder.uri(&loader, pred.identity, false, pred.ref_scope);
                }
                Some("@vocab") => {
                    loader = builder.uri(&loader, false, true, pred.ref_scope);
                }
                _ => {}
            }
        }

        if let Some(subject) = &pred.map_subject {
            loader = builder.idmap(&field.name, &loader, subject, pred.map_predicate.as_deref());
        }

        if let Some(id) = pred.id.as_deref().filter(|id| !id.starts_with('@')) {
            key = shortname(id).to_string();
        }
    }

    Ok(ResolvedField { loader, key })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field(value: serde_json::Value) -> FieldDecl {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_uri_wrapper_carries_scope() {
        let mut ctx = CompilationContext::new();
        let f = field(json!({
            "name": "source",
            "type": ["null", "string"],
            "jsonldPredicate": {"_type": "@id", "refScope": 2}
        }));
        let resolved = field_loader(&mut ctx, &f).unwrap();
        assert_eq!(resolved.loader.name, "uri_union_of_null_type_or_strtype_false_false_2");
        assert!(resolved.loader.is_uri);
        assert_eq!(resolved.loader.ref_scope, Some(2));
        assert_eq!(resolved.key, "source");
    }

    #[test]
    fn test_idmap_over_typedsl() {
        let mut ctx = CompilationContext::new();
        let f = field(json!({
            "name": "http://example.com/schema#Tool/inputs",
            "type": {"type": "array", "items": "string"},
            "jsonldPredicate": {"_id": "ex:ins", "typeDSL": true, "mapSubject": "id", "mapPredicate": "type"}
        }));
        let resolved = field_loader(&mut ctx, &f).unwrap();
        assert_eq!(resolved.loader.name, "idmap_inputs_typedsl_array_of_strtype_None");
        assert_eq!(resolved.key, "ins");
        assert!(ctx.catalog.contains("typedsl_array_of_strtype_None"));
    }

    #[test]
    fn test_vocab_and_secondary_files() {
        let mut ctx = CompilationContext::new();
        let vocab = field_loader(
            &mut ctx,
            &field(json!({"name": "type", "type": "string", "jsonldPredicate": {"_type": "@vocab"}})),
        )
        .unwrap();
        assert_eq!(vocab.loader.name, "uri_strtype_false_true_None");

        let sf = field_loader(
            &mut ctx,
            &field(json!({"name": "secondaryFiles", "type": "Any", "jsonldPredicate": {"secondaryFilesDSL": true}})),
        )
        .unwrap();
        assert_eq!(sf.loader.name, "secondaryfilesdsl_any_type");
        assert!(!sf.loader.is_uri);
    }

    #[test]
    fn test_wrappers_shared_between_fields() {
        let mut ctx = CompilationContext::new();
        let f = field(json!({"name": "run", "type": "string", "jsonldPredicate": {"_type": "@id"}}));
        field_loader(&mut ctx, &f).unwrap();
        let before = ctx.catalog.len();
        field_loader(&mut ctx, &f).unwrap();
        assert_eq!(ctx.catalog.len(), before);
    }

    #[test]
    fn test_identifier_loader() {
        let mut ctx = CompilationContext::new();
        let f = field(json!({"name": "id", "type": ["null", "string"], "jsonldPredicate": "@id"}));
        let loader = identifier_loader(&mut ctx, &f).unwrap();
        assert_eq!(loader.name, "uri_union_of_null_type_or_strtype_true_false_None");
        assert!(loader.scoped_id);
    }
}
