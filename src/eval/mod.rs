//! Plan Evaluator
//!
//! Executes a `ModulePlan` directly against documents, with the same
//! semantics the generated loader module has. This is how generated
//! behavior is checked without compiling the generated code.
//!
//! ```text
//! text/yaml ──► document_load ──► load(root_loader) ──► Node
//!                  │                    │
//!                  ├─ $namespaces       ├─ records: load_record
//!                  ├─ $base             └─ fields:  load_field ($import/$include)
//!                  └─ $graph
//! ```

pub mod error;
mod loaders;
pub mod node;
pub mod options;
mod record;
pub mod uri;

pub use error::ValidationError;
pub use node::{Node, RecordInstance};
pub use options::{Fetcher, FileFetcher, LoadingOptions, MemoryFetcher};
pub use record::blank_node;
pub use uri::{default_base_uri, expand_url, prefix_url, relative_uri};

use indexmap::IndexMap;
use serde_json::Value;

use crate::codegen::plan::ModulePlan;
use options::urljoin;

/// Runs the loaders of one module plan
#[derive(Debug, Clone, Copy)]
pub struct Evaluator<'p> {
    plan: &'p ModulePlan,
}

impl<'p> Evaluator<'p> {
    pub fn new(plan: &'p ModulePlan) -> Self {
        Self { plan }
    }

    pub fn plan(&self) -> &'p ModulePlan {
        self.plan
    }

    fn default_options(&self) -> LoadingOptions {
        LoadingOptions::with_vocabulary(&self.plan.vocabulary)
    }

    // =========================================================================
    // Entry Points
    // =========================================================================

    /// Load an in-memory document with the root loader
    pub fn load_document(
        &self,
        doc: &Value,
        baseuri: Option<&str>,
        options: Option<LoadingOptions>,
    ) -> Result<Node, ValidationError> {
        let baseuri = baseuri.map(str::to_string).unwrap_or_else(default_base_uri);
        let options = options.unwrap_or_else(|| self.default_options());
        self.document_load(&self.plan.root_loader, doc, &baseuri, &options)
    }

    /// Parse YAML (or JSON) text and load it as the document at `uri`
    pub fn load_document_by_string(
        &self,
        text: &str,
        uri: &str,
        options: Option<LoadingOptions>,
    ) -> Result<Node, ValidationError> {
        let value = parse_yaml(text, uri)?;
        self.load_document_by_yaml(&value, uri, options)
    }

    /// Load an already parsed document as the document at `uri`
    pub fn load_document_by_yaml(
        &self,
        doc: &Value,
        uri: &str,
        options: Option<LoadingOptions>,
    ) -> Result<Node, ValidationError> {
        let options = options.unwrap_or_else(|| self.default_options().with_fileuri(uri));
        options.idx.insert(uri, doc.clone());
        self.document_load(&self.plan.root_loader, doc, uri, &options)
    }

    /// Serialize a loaded document, compacting URIs against `base_url`
    pub fn save_document(&self, node: &Node, base_url: &str) -> Value {
        self.save(node, true, base_url, true)
    }

    // =========================================================================
    // Document Driver
    // =========================================================================

    fn document_load(
        &self,
        loader: &str,
        doc: &Value,
        baseuri: &str,
        options: &LoadingOptions,
    ) -> Result<Node, ValidationError> {
        match doc {
            Value::String(url) => self.document_load_by_url(loader, &urljoin(baseuri, url), options),
            Value::Object(map) => {
                let namespaces = map.get("$namespaces").map(string_map).transpose()?;
                let schemas = map.get("$schemas").map(string_list).transpose()?;
                let options = options.scoped(namespaces, schemas);

                let baseuri = match map.get("$base") {
                    Some(Value::String(base)) => base.clone(),
                    Some(other) => {
                        return Err(ValidationError::invalid(format!("$base must be a string, got {}", other)))
                    }
                    None => baseuri.to_string(),
                };

                if let Some(graph) = map.get("$graph") {
                    return self.load(loader, graph, &baseuri, &options, None);
                }

                let mut body = map.clone();
                for directive in ["$namespaces", "$schemas", "$base"] {
                    body.remove(directive);
                }
                self.load(loader, &Value::Object(body), &baseuri, &options, Some(&baseuri))
            }
            Value::Array(_) => self.load(loader, doc, baseuri, options, None),
            _ => Err(ValidationError::invalid("Expected a mapping, a sequence or a string")),
        }
    }

    fn document_load_by_url(
        &self,
        loader: &str,
        url: &str,
        options: &LoadingOptions,
    ) -> Result<Node, ValidationError> {
        if let Some(doc) = options.idx.get(url) {
            return self.document_load(loader, &doc, url, options);
        }

        let doc_url = url.split_once('#').map_or(url, |(head, _)| head);
        let text = options.fetcher.fetch_text(doc_url)?;
        let doc = parse_yaml(&text, doc_url)?;
        options.idx.insert(url, doc.clone());
        tracing::debug!(url = %doc_url, "loaded referenced document");

        let options = options.clone().with_fileuri(doc_url);
        self.document_load(loader, &doc, doc_url, &options)
    }

    /// Load a field value, resolving `$import` and `$include` first
    fn load_field(
        &self,
        value: &Value,
        loader: &str,
        baseuri: &str,
        options: &LoadingOptions,
    ) -> Result<Node, ValidationError> {
        if let Value::Object(map) = value {
            if let Some(target) = map.get("$import") {
                let target = directive_target(options, "$import", target)?;
                return self.document_load_by_url(loader, &target, options);
            }
            if let Some(target) = map.get("$include") {
                let target = directive_target(options, "$include", target)?;
                let text = options.fetcher.fetch_text(&target)?;
                return self.load(loader, &Value::String(text), baseuri, options, None);
            }
        }
        self.load(loader, value, baseuri, options, None)
    }
}

fn directive_target(options: &LoadingOptions, directive: &str, target: &Value) -> Result<String, ValidationError> {
    let fileuri = options
        .fileuri
        .as_deref()
        .ok_or_else(|| ValidationError::invalid(format!("Cannot load {} without fileuri", directive)))?;
    let target = target
        .as_str()
        .ok_or_else(|| ValidationError::invalid(format!("{} target must be a string", directive)))?;
    Ok(urljoin(fileuri, target))
}

fn parse_yaml(text: &str, uri: &str) -> Result<Value, ValidationError> {
    serde_yaml::from_str(text).map_err(|e| ValidationError::invalid(format!("{}: {}", uri, e)))
}

fn string_map(value: &Value) -> Result<IndexMap<String, String>, ValidationError> {
    let map = value
        .as_object()
        .ok_or_else(|| ValidationError::invalid("$namespaces must be a mapping"))?;
    map.iter()
        .map(|(k, v)| match v {
            Value::String(s) => Ok((k.clone(), s.clone())),
            _ => Err(ValidationError::invalid(format!("namespace '{}' must be a string", k))),
        })
        .collect()
}

fn string_list(value: &Value) -> Result<Vec<String>, ValidationError> {
    match value {
        Value::String(s) => Ok(vec![s.clone()]),
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ValidationError::invalid("$schemas entries must be strings"))
            })
            .collect(),
        _ => Err(ValidationError::invalid("$schemas must be a list")),
    }
}
