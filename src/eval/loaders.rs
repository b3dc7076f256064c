//! Loader semantics
//!
//! One arm per `LoaderKind`. Composite loaders look their dependencies up in
//! the plan by name, exactly like the generated statics do.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use super::error::ValidationError;
use super::node::Node;
use super::options::LoadingOptions;
use super::uri::expand_url;
use super::Evaluator;
use crate::codegen::catalog::{LoaderKind, PrimitiveKind};
use crate::codegen::names::{safe_name, shortname};

static TYPE_DSL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^([^\[?]+)(\[\])?(\?)?$").expect("type DSL pattern is valid"));

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_i64() || n.is_u64() => "int",
        Value::Number(_) => "float",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

impl<'p> Evaluator<'p> {
    /// Run the named loader against a raw value
    pub fn load(
        &self,
        loader: &str,
        doc: &Value,
        baseuri: &str,
        options: &LoadingOptions,
        doc_root: Option<&str>,
    ) -> Result<Node, ValidationError> {
        let desc = self
            .plan()
            .loader(loader)
            .ok_or_else(|| ValidationError::invalid(format!("No loader named {}", loader)))?;

        match &desc.kind {
            LoaderKind::Primitive(kind) => load_primitive(*kind, doc),
            LoaderKind::Any => match doc {
                Value::Null => Err(ValidationError::invalid("Expected non-null")),
                other => Ok(Node::Any(other.clone())),
            },
            LoaderKind::Expression => match doc {
                Value::String(s) => Ok(Node::Str(s.clone())),
                other => Err(ValidationError::invalid(format!(
                    "Expected a str but got {}",
                    kind_of(other)
                ))),
            },
            LoaderKind::Array { items } => self.load_array(loader, items, doc, baseuri, options),
            LoaderKind::Union { members } => self.load_union(members, doc, baseuri, options, doc_root),
            LoaderKind::Enum { symbols } => load_enum(symbols, doc),
            LoaderKind::Record { class_name } => {
                if !doc.is_object() {
                    return Err(ValidationError::invalid(format!("Expected a dict, was {}", kind_of(doc))));
                }
                let record = self
                    .plan()
                    .record(class_name)
                    .ok_or_else(|| ValidationError::invalid(format!("No record named {}", class_name)))?;
                self.load_record(record, doc, baseuri, options, doc_root)
                    .map(|r| Node::Record(Box::new(r)))
            }
            LoaderKind::Uri { inner, scoped_id, vocab_term, ref_scope } => {
                let expanded = match doc {
                    Value::String(s) => {
                        Value::String(expand_url(s, baseuri, options, *scoped_id, *vocab_term, *ref_scope)?)
                    }
                    Value::Array(items) => Value::Array(
                        items
                            .iter()
                            .map(|item| match item {
                                Value::String(s) => expand_url(s, baseuri, options, *scoped_id, *vocab_term, *ref_scope)
                                    .map(Value::String),
                                other => Ok(other.clone()),
                            })
                            .collect::<Result<Vec<_>, _>>()?,
                    ),
                    other => other.clone(),
                };
                self.load(inner, &expanded, baseuri, options, doc_root)
            }
            LoaderKind::IdMap { inner, map_subject, map_predicate } => {
                let normalized = idmap(doc, map_subject, map_predicate.as_deref())?;
                self.load(inner, &normalized, baseuri, options, doc_root)
            }
            LoaderKind::TypeDsl { inner, ref_scope } => {
                let resolved = match doc {
                    Value::String(s) => type_dsl(s, baseuri, options, *ref_scope)?,
                    Value::Array(items) => {
                        let mut out: Vec<Value> = Vec::with_capacity(items.len());
                        for item in items {
                            match item {
                                Value::String(s) => match type_dsl(s, baseuri, options, *ref_scope)? {
                                    Value::Array(parts) => {
                                        for part in parts {
                                            if !out.contains(&part) {
                                                out.push(part);
                                            }
                                        }
                                    }
                                    single => {
                                        if !out.contains(&single) {
                                            out.push(single);
                                        }
                                    }
                                },
                                other => out.push(other.clone()),
                            }
                        }
                        Value::Array(out)
                    }
                    other => other.clone(),
                };
                self.load(inner, &resolved, baseuri, options, doc_root)
            }
            LoaderKind::SecondaryFilesDsl { inner } => {
                let normalized = secondary_files(doc)?;
                self.load(inner, &normalized, baseuri, options, doc_root)
            }
        }
    }

    fn load_array(
        &self,
        this: &str,
        items: &str,
        doc: &Value,
        baseuri: &str,
        options: &LoadingOptions,
    ) -> Result<Node, ValidationError> {
        let Value::Array(values) = doc else {
            return Err(ValidationError::invalid(format!("Expected a list, was {}", kind_of(doc))));
        };

        let mut out = Vec::with_capacity(values.len());
        let mut errors = Vec::new();
        for (i, value) in values.iter().enumerate() {
            // Nested lists are flattened into this one
            let attempt = if value.is_array() {
                self.load_field(value, this, baseuri, options)
                    .or_else(|nested| {
                        self.load_field(value, items, baseuri, options).map_err(|e| ValidationError::Multiple {
                            message: String::new(),
                            errors: vec![nested, e],
                        })
                    })
            } else {
                self.load_field(value, items, baseuri, options)
            };
            match attempt {
                Ok(Node::List(nested)) => out.extend(nested),
                Ok(node) => out.push(node),
                Err(e) => errors.push(ValidationError::Multiple {
                    message: format!("item {}:", i),
                    errors: vec![e],
                }),
            }
        }

        if errors.is_empty() {
            Ok(Node::List(out))
        } else {
            Err(ValidationError::Multiple {
                message: String::new(),
                errors,
            })
        }
    }

    fn load_union(
        &self,
        members: &[String],
        doc: &Value,
        baseuri: &str,
        options: &LoadingOptions,
        doc_root: Option<&str>,
    ) -> Result<Node, ValidationError> {
        let mut errors = Vec::with_capacity(members.len());
        for member in members {
            match self.load(member, doc, baseuri, options, doc_root) {
                Ok(node) => return Ok(node),
                Err(e) => errors.push(ValidationError::Multiple {
                    message: format!("tried {} but", member),
                    errors: vec![e],
                }),
            }
        }
        Err(ValidationError::Multiple {
            message: String::new(),
            errors,
        })
    }
}

fn load_primitive(kind: PrimitiveKind, doc: &Value) -> Result<Node, ValidationError> {
    let node = match (kind, doc) {
        (PrimitiveKind::Str, Value::String(s)) => Some(Node::Str(s.clone())),
        (PrimitiveKind::Int, Value::Number(n)) => n.as_i64().map(Node::Int),
        (PrimitiveKind::Float, Value::Number(n)) => n.as_f64().map(Node::Float),
        (PrimitiveKind::Bool, Value::Bool(b)) => Some(Node::Bool(*b)),
        (PrimitiveKind::Null, Value::Null) => Some(Node::Null),
        _ => None,
    };
    node.ok_or_else(|| {
        ValidationError::invalid(format!("Expected a {} but got {}", kind.as_str(), kind_of(doc)))
    })
}

fn load_enum(symbols: &[String], doc: &Value) -> Result<Node, ValidationError> {
    let Value::String(value) = doc else {
        return Err(ValidationError::invalid(format!("Expected a str but got {}", kind_of(doc))));
    };
    let known = symbols.iter().any(|s| s == value || *s == safe_name(value));
    if known {
        Ok(Node::Str(value.clone()))
    } else {
        Err(ValidationError::invalid(format!(
            "Symbol {} not in [{}]",
            shortname(value),
            symbols.join(", ")
        )))
    }
}

/// `{key: value}` mappings to subject-tagged lists, sorted by key
fn idmap(doc: &Value, subject: &str, predicate: Option<&str>) -> Result<Value, ValidationError> {
    let Value::Object(map) = doc else {
        return Ok(doc.clone());
    };
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();

    let mut out = Vec::with_capacity(keys.len());
    for key in keys {
        let entry = match &map[key] {
            Value::Object(fields) => {
                let mut fields = fields.clone();
                fields.insert(subject.to_string(), Value::String(key.clone()));
                fields
            }
            scalar => {
                let predicate =
                    predicate.ok_or_else(|| ValidationError::invalid("No mapPredicate"))?;
                let mut fields = Map::new();
                fields.insert(predicate.to_string(), scalar.clone());
                fields.insert(subject.to_string(), Value::String(key.clone()));
                fields
            }
        };
        out.push(Value::Object(entry));
    }
    Ok(Value::Array(out))
}

/// `T`, `T[]`, `T?`, `T[]?` to type declarations
fn type_dsl(
    text: &str,
    baseuri: &str,
    options: &LoadingOptions,
    ref_scope: Option<i64>,
) -> Result<Value, ValidationError> {
    let Some(caps) = TYPE_DSL.captures(text) else {
        return Ok(Value::String(text.to_string()));
    };
    let first = Value::String(expand_url(&caps[1], baseuri, options, false, true, ref_scope)?);

    let typed = if caps.get(2).is_some() {
        serde_json::json!({"type": "array", "items": first})
    } else {
        first
    };
    if caps.get(3).is_some() {
        Ok(Value::Array(vec![Value::String("null".into()), typed]))
    } else {
        Ok(typed)
    }
}

/// `"pattern"` / `"pattern?"` shorthands to `{pattern, required}` mappings
fn secondary_files(doc: &Value) -> Result<Value, ValidationError> {
    fn entry(value: &Value) -> Result<Value, ValidationError> {
        match value {
            Value::String(s) => {
                let mut out = Map::new();
                match s.strip_suffix('?') {
                    Some(pattern) => {
                        out.insert("pattern".into(), Value::String(pattern.to_string()));
                        out.insert("required".into(), Value::Bool(false));
                    }
                    None => {
                        out.insert("pattern".into(), Value::String(s.clone()));
                    }
                }
                Ok(Value::Object(out))
            }
            Value::Object(map) => {
                let mut rest = map.clone();
                let pattern = rest.remove("pattern").ok_or_else(|| {
                    ValidationError::invalid(format!(
                        "Missing pattern in secondaryFiles specification entry: {}",
                        value
                    ))
                })?;
                let required = rest.remove("required");
                if !rest.is_empty() {
                    return Err(ValidationError::invalid(format!(
                        "Unallowed values in secondaryFiles specification entry: {}",
                        Value::Object(rest)
                    )));
                }
                let mut out = Map::new();
                out.insert("pattern".into(), pattern);
                if let Some(required) = required {
                    out.insert("required".into(), required);
                }
                Ok(Value::Object(out))
            }
            _ => Err(ValidationError::invalid(
                "Expected a string or sequence of (strings or mappings).",
            )),
        }
    }

    match doc {
        Value::Array(items) => items.iter().map(entry).collect::<Result<Vec<_>, _>>().map(Value::Array),
        other => entry(other).map(|e| Value::Array(vec![e])),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_messages() {
        assert_eq!(load_primitive(PrimitiveKind::Float, &json!(3)).unwrap(), Node::Float(3.0));
        let err = load_primitive(PrimitiveKind::Str, &json!(3)).unwrap_err();
        assert_eq!(err.to_string(), "Expected a str but got int");
        assert!(load_primitive(PrimitiveKind::Int, &json!(1.5)).is_err());
    }

    #[test]
    fn test_idmap_normalization() {
        let doc = json!({"b": {"type": "int"}, "a": "string"});
        let out = idmap(&doc, "id", Some("type")).unwrap();
        assert_eq!(
            out,
            json!([{"type": "string", "id": "a"}, {"type": "int", "id": "b"}])
        );
        let err = idmap(&json!({"a": "string"}), "id", None).unwrap_err();
        assert_eq!(err.to_string(), "No mapPredicate");
    }

    #[test]
    fn test_type_dsl() {
        let mut options = LoadingOptions::default();
        options.vocab.insert("File".into(), "http://example.com/File".into());
        assert_eq!(type_dsl("File", "file:///w/", &options, None).unwrap(), json!("File"));
        assert_eq!(
            type_dsl("File[]?", "file:///w/", &options, None).unwrap(),
            json!(["null", {"type": "array", "items": "File"}])
        );
        assert_eq!(type_dsl("File?", "file:///w/", &options, None).unwrap(), json!(["null", "File"]));
    }

    #[test]
    fn test_secondary_files() {
        assert_eq!(
            secondary_files(&json!([".bai?", {"pattern": ".crai", "required": true}])).unwrap(),
            json!([{"pattern": ".bai", "required": false}, {"pattern": ".crai", "required": true}])
        );
        assert_eq!(secondary_files(&json!(".idx")).unwrap(), json!([{"pattern": ".idx"}]));
        assert!(secondary_files(&json!({"required": true})).is_err());
        assert!(secondary_files(&json!({"pattern": ".x", "extra": 1})).is_err());
        assert!(secondary_files(&json!(3)).is_err());
    }
}
