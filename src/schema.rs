//! Schema graph input model
//!
//! The upstream schema parser hands us a normalized sequence of type
//! declarations. This module models that boundary: declarations are read from
//! JSON or YAML and turned into a closed `TypeDecl` variant before any
//! resolution happens.

use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::checksum::Checksum;
use crate::error::{CodegenError, Result};

/// Namespace of the schema-definition vocabulary
pub const SALAD_NS: &str = "https://w3id.org/cwl/salad#";

/// XML Schema datatypes namespace
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

// =============================================================================
// Type Declarations
// =============================================================================

/// A single type declaration as produced by the schema parser
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "Value")]
pub enum TypeDecl {
    /// Scalar type name (primitive, `Expression`, or a record/enum name)
    Named(String),
    /// Ordered list of alternatives
    Union(Vec<TypeDecl>),
    /// `{type: array, items: ...}`
    Array(Box<TypeDecl>),
    Enum(EnumDecl),
    Record(RecordDecl),
    /// Structured node with a tag we do not know how to load
    Unknown { tag: String },
}

/// `{type: enum, name, symbols}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EnumDecl {
    pub name: String,
    #[serde(default)]
    pub symbols: Vec<String>,
    #[serde(default, deserialize_with = "doc_string")]
    pub doc: Option<String>,
}

/// `{type: record, name, fields, ...}`
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RecordDecl {
    pub name: String,
    #[serde(default, deserialize_with = "one_or_many")]
    pub extends: Vec<String>,
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    #[serde(default, rename = "documentRoot")]
    pub document_root: bool,
    #[serde(default, deserialize_with = "doc_string")]
    pub doc: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDecl>,
}

/// A record field with its linked-data metadata
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: TypeDecl,
    #[serde(default, deserialize_with = "doc_string")]
    pub doc: Option<String>,
    #[serde(default, rename = "jsonldPredicate")]
    pub jsonld_predicate: Option<JsonldPredicate>,
    #[serde(default)]
    pub subscope: Option<String>,
}

/// `jsonldPredicate` annotation on a field
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum JsonldPredicate {
    /// Bare predicate string; `"@id"` designates the identifier field
    Term(String),
    Mapping(PredicateMap),
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PredicateMap {
    #[serde(default, rename = "_id")]
    pub id: Option<String>,
    #[serde(default, rename = "_type")]
    pub type_: Option<String>,
    #[serde(default)]
    pub identity: bool,
    #[serde(default, rename = "refScope")]
    pub ref_scope: Option<i64>,
    #[serde(default, rename = "typeDSL")]
    pub type_dsl: bool,
    #[serde(default, rename = "secondaryFilesDSL")]
    pub secondary_files_dsl: bool,
    #[serde(default, rename = "mapSubject")]
    pub map_subject: Option<String>,
    #[serde(default, rename = "mapPredicate")]
    pub map_predicate: Option<String>,
}

impl TypeDecl {
    /// Build a declaration from a raw JSON value
    pub fn from_value(value: &Value) -> Result<Self> {
        match value {
            Value::String(name) => Ok(Self::Named(name.clone())),
            Value::Array(items) => items
                .iter()
                .map(Self::from_value)
                .collect::<Result<Vec<_>>>()
                .map(Self::Union),
            Value::Object(map) => {
                let tag = map
                    .get("type")
                    .and_then(Value::as_str)
                    .ok_or_else(|| CodegenError::InvalidSchema(format!(
                        "type declaration without a string `type`: {}",
                        value
                    )))?;
                match strip_salad(tag) {
                    "array" => {
                        let items = map.get("items").ok_or_else(|| {
                            CodegenError::InvalidSchema("array declaration without `items`".into())
                        })?;
                        Ok(Self::Array(Box::new(Self::from_value(items)?)))
                    }
                    "enum" => Ok(Self::Enum(serde_json::from_value(value.clone())?)),
                    "record" => Ok(Self::Record(serde_json::from_value(value.clone())?)),
                    _ => Ok(Self::Unknown { tag: tag.to_string() }),
                }
            }
            other => Err(CodegenError::InvalidSchema(format!(
                "unexpected type declaration: {}",
                other
            ))),
        }
    }

    /// Is `null` one of the alternatives?
    pub fn is_optional(&self) -> bool {
        match self {
            Self::Union(alternatives) => alternatives.iter().any(|alt| {
                matches!(alt, Self::Named(name) if is_null_name(name))
            }),
            _ => false,
        }
    }

    /// Declared name for enums and records
    pub fn declared_name(&self) -> Option<&str> {
        match self {
            Self::Enum(e) => Some(&e.name),
            Self::Record(r) => Some(&r.name),
            _ => None,
        }
    }
}

impl TryFrom<Value> for TypeDecl {
    type Error = CodegenError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(&value)
    }
}

impl FieldDecl {
    /// Is this the designated identifier field?
    pub fn is_identifier(&self) -> bool {
        matches!(&self.jsonld_predicate, Some(JsonldPredicate::Term(t)) if t == "@id")
    }

    pub fn is_optional(&self) -> bool {
        self.field_type.is_optional()
    }

    pub fn predicate_map(&self) -> Option<&PredicateMap> {
        match &self.jsonld_predicate {
            Some(JsonldPredicate::Mapping(map)) => Some(map),
            _ => None,
        }
    }
}

fn strip_salad(tag: &str) -> &str {
    tag.strip_prefix(SALAD_NS).unwrap_or(tag)
}

fn is_null_name(name: &str) -> bool {
    strip_salad(name) == "null"
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(OneOrMany::One(s)) => vec![s],
        Some(OneOrMany::Many(v)) => v,
    })
}

fn doc_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Doc {
        Text(String),
        Lines(Vec<String>),
    }

    Ok(Option::<Doc>::deserialize(deserializer)?.map(|doc| match doc {
        Doc::Text(text) => text,
        Doc::Lines(lines) => lines.join("\n"),
    }))
}

// =============================================================================
// Schema Documents
// =============================================================================

/// A parsed schema graph together with its fingerprint
#[derive(Debug, Clone)]
pub struct SchemaDocument {
    /// Top-level declarations in input order
    pub declarations: Vec<TypeDecl>,
    /// Fingerprint over the raw input, embedded in generated output
    pub fingerprint: Checksum,
    /// Files the declarations came from
    pub sources: Vec<PathBuf>,
}

impl SchemaDocument {
    /// Parse declarations from an in-memory value (a list or `{$graph: [...]}`)
    pub fn from_value(value: &Value) -> Result<Self> {
        let declarations = declarations_from_value(value)?;
        Ok(Self {
            declarations,
            fingerprint: Checksum::from_json(value),
            sources: Vec::new(),
        })
    }

    /// Parse declarations from JSON or YAML text
    pub fn parse(text: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(text)?;
        Self::from_value(&value)
    }

    /// Load a schema file, or every `.json`/`.yml`/`.yaml` file below a directory
    pub fn load(path: &Path) -> Result<Self> {
        let files = if path.is_dir() {
            let mut files: Vec<PathBuf> = WalkDir::new(path)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .filter(|e| {
                    e.path()
                        .extension()
                        .and_then(|ext| ext.to_str())
                        .map(|ext| matches!(ext, "json" | "yml" | "yaml"))
                        .unwrap_or(false)
                })
                .map(|e| e.into_path())
                .collect();
            files.sort();
            files
        } else {
            vec![path.to_path_buf()]
        };

        let mut declarations = Vec::new();
        let mut raw = Vec::with_capacity(files.len());
        for file in &files {
            let content = fs::read_to_string(file)?;
            let value: Value = serde_yaml::from_str(&content)?;
            tracing::debug!(file = %file.display(), "loaded schema file");
            declarations.extend(declarations_from_value(&value)?);
            raw.push(value);
        }

        Ok(Self {
            declarations,
            fingerprint: Checksum::from_json(&Value::Array(raw)),
            sources: files,
        })
    }

    /// Iterate the record declarations
    pub fn records(&self) -> impl Iterator<Item = &RecordDecl> {
        self.declarations.iter().filter_map(|d| match d {
            TypeDecl::Record(r) => Some(r),
            _ => None,
        })
    }
}

fn declarations_from_value(value: &Value) -> Result<Vec<TypeDecl>> {
    let items = match value {
        Value::Array(items) => items,
        Value::Object(map) => match map.get("$graph") {
            Some(Value::Array(items)) => items,
            _ => {
                return Ok(vec![TypeDecl::from_value(value)?]);
            }
        },
        other => {
            return Err(CodegenError::InvalidSchema(format!(
                "expected a list of declarations, got {}",
                other
            )))
        }
    };
    items.iter().map(TypeDecl::from_value).collect()
}
