//! Record validation and serialization
//!
//! `load_record` mirrors the generated `from_doc`, `save_record` the
//! generated `save`.

use indexmap::IndexMap;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::error::ValidationError;
use super::node::{Node, RecordInstance};
use super::options::LoadingOptions;
use super::uri::{expand_url, prefix_url, relative_uri};
use super::Evaluator;
use crate::codegen::plan::{RecordPlan, SaveBase, SaveStrategy, CLASS_KEY};

/// Fresh blank node identifier
pub fn blank_node() -> String {
    format!("_:{}", Uuid::new_v4())
}

impl<'p> Evaluator<'p> {
    /// Validate one mapping against a record plan, reporting every problem
    pub fn load_record(
        &self,
        record: &RecordPlan,
        doc: &Value,
        baseuri: &str,
        options: &LoadingOptions,
        doc_root: Option<&str>,
    ) -> Result<RecordInstance, ValidationError> {
        let map = doc.as_object().ok_or_else(|| {
            ValidationError::invalid(format!("Expected a mapping for {}", record.class_name))
        })?;

        if record.has_class_field {
            let found = map.get(CLASS_KEY).and_then(Value::as_str);
            if found != Some(record.schema_name_short()) {
                return Err(ValidationError::ClassMismatch {
                    class_name: record.class_name.clone(),
                    found: found.map(str::to_string),
                });
            }
        }

        let mut errors = Vec::new();
        let mut baseuri = baseuri.to_string();
        let mut fields = IndexMap::new();

        for field in &record.fields {
            match map.get(&field.key) {
                None if field.optional => {}
                raw => {
                    let raw = raw.unwrap_or(&Value::Null);
                    match self.load_field(raw, &field.loader, &baseuri, options) {
                        Ok(Node::Null) if field.optional => {}
                        Ok(node) => {
                            fields.insert(field.safe_name.clone(), node);
                        }
                        Err(cause) => errors.push(ValidationError::invalid_field(&field.key, cause)),
                    }
                }
            }

            let Some(id) = record.identifier.as_ref().filter(|id| id.field == field.safe_name) else {
                continue;
            };
            let loaded = fields.get(&id.field).and_then(Node::as_str).map(str::to_string);
            match (&loaded, doc_root) {
                (Some(value), _) => {
                    baseuri = match &id.subscope {
                        Some(subscope) => format!("{}/{}", value, subscope),
                        None => value.clone(),
                    };
                }
                (None, Some(root)) => {
                    fields.insert(id.field.clone(), Node::Str(root.to_string()));
                }
                (None, None) if id.optional => {
                    fields.insert(id.field.clone(), Node::Str(blank_node()));
                }
                (None, None) => errors.push(ValidationError::MissingIdentifier {
                    field: id.key.clone(),
                }),
            }
        }

        let mut extension_fields = IndexMap::new();
        for (key, value) in map {
            if record.declares_key(key) {
                continue;
            }
            if key.contains(':') {
                match expand_url(key, "", options, false, false, None) {
                    Ok(expanded) => {
                        extension_fields.insert(expanded, value.clone());
                    }
                    Err(e) => errors.push(e),
                }
            } else {
                errors.push(ValidationError::unexpected_field(key, &record.attrs));
            }
        }

        if !errors.is_empty() {
            tracing::debug!(record = %record.class_name, errors = errors.len(), "record failed validation");
            return Err(ValidationError::RecordValidationFailed {
                class_name: record.class_name.clone(),
                errors,
            });
        }

        Ok(RecordInstance {
            class_name: record.class_name.clone(),
            fields,
            extension_fields,
            namespaces: options.namespaces.clone(),
            schemas: options.schemas.clone(),
        })
    }

    /// Serialize a loaded value back to a plain document
    pub fn save(&self, node: &Node, top: bool, base_url: &str, relative_uris: bool) -> Value {
        match node {
            Node::Null => Value::Null,
            Node::Bool(b) => Value::Bool(*b),
            Node::Int(i) => Value::from(*i),
            Node::Float(f) => Value::from(*f),
            Node::Str(s) => Value::String(s.clone()),
            Node::Any(v) => v.clone(),
            Node::List(items) => Value::Array(
                items
                    .iter()
                    .map(|i| self.save(i, false, base_url, relative_uris))
                    .collect(),
            ),
            Node::Record(record) => self.save_record(record, top, base_url, relative_uris),
        }
    }

    pub fn save_record(&self, instance: &RecordInstance, top: bool, base_url: &str, relative_uris: bool) -> Value {
        let mut out = Map::new();
        for (key, value) in &instance.extension_fields {
            out.insert(prefix_url(key, &instance.namespaces), value.clone());
        }

        let Some(record) = self.plan().record(&instance.class_name) else {
            return Value::Object(out);
        };
        if record.has_class_field {
            out.insert(CLASS_KEY.to_string(), Value::from(record.schema_name_short()));
        }

        // A root identifier equal to the base is left out. Reloading restores it
        // from the document root and loads nested fields against the same base.
        let identifier = record
            .identifier
            .as_ref()
            .and_then(|id| instance.get_str(&id.field).map(|value| (id, value)));
        let omit_identifier = top && identifier.is_some_and(|(_, value)| value == base_url);
        let identifier_base = match identifier {
            Some((id, value)) if !omit_identifier => match &id.subscope {
                Some(subscope) => format!("{}/{}", value, subscope),
                None => value.to_string(),
            },
            _ => base_url.to_string(),
        };

        for field in &record.fields {
            let Some(node) = instance.fields.get(&field.safe_name) else {
                continue;
            };
            let base = match &field.save.base {
                SaveBase::Ambient => {
                    if omit_identifier && record.is_identifier(&field.safe_name) {
                        continue;
                    }
                    base_url
                }
                SaveBase::Identifier { .. } => identifier_base.as_str(),
            };
            let saved = match field.save.strategy {
                SaveStrategy::RelativeUri { scoped_id, ref_scope } => {
                    self.save_relative_uri(node, base, scoped_id, ref_scope, relative_uris)
                }
                SaveStrategy::Recursive => self.save(node, false, base, relative_uris),
            };
            out.insert(field.key.clone(), saved);
        }

        if top {
            if !instance.namespaces.is_empty() {
                let namespaces: Map<String, Value> = instance
                    .namespaces
                    .iter()
                    .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                    .collect();
                out.insert("$namespaces".to_string(), Value::Object(namespaces));
            }
            if !instance.schemas.is_empty() {
                out.insert(
                    "$schemas".to_string(),
                    Value::Array(instance.schemas.iter().cloned().map(Value::String).collect()),
                );
            }
        }
        Value::Object(out)
    }

    /// URI fields: compacted against `base_url`. A URI equal to the base is
    /// written out in full.
    fn save_relative_uri(
        &self,
        node: &Node,
        base_url: &str,
        scoped_id: bool,
        ref_scope: Option<i64>,
        relative_uris: bool,
    ) -> Value {
        let compact = |uri: &String| {
            let rel = relative_uri(uri, base_url, scoped_id, ref_scope);
            Value::String(if rel.is_empty() { uri.clone() } else { rel })
        };
        if !relative_uris {
            return self.save(node, false, base_url, relative_uris);
        }
        match node {
            Node::Str(uri) => compact(uri),
            Node::List(items) => Value::Array(
                items
                    .iter()
                    .map(|item| match item {
                        Node::Str(uri) => compact(uri),
                        other => self.save(other, false, base_url, relative_uris),
                    })
                    .collect(),
            ),
            other => self.save(other, false, base_url, relative_uris),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_nodes_are_unique() {
        let a = blank_node();
        let b = blank_node();
        assert!(a.starts_with("_:"));
        assert_ne!(a, b);
    }
}
