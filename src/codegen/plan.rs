//! Generation Plans
//!
//! Structured intermediate nodes produced by the record and module emitters.
//! Nothing in here knows target syntax: the Rust renderer turns a plan into
//! source text, and the evaluator executes a plan directly.

use indexmap::IndexMap;
use serde::Serialize;

use super::catalog::{LoaderDescriptor, Vocabulary};
use super::names::shortname;

/// Document key of the class discriminator field
pub const CLASS_KEY: &str = "class";

// =============================================================================
// Module Plan
// =============================================================================

/// Everything needed to emit one loader module
#[derive(Debug, Clone, Serialize)]
pub struct ModulePlan {
    /// Identifies the schema the module was generated from
    pub parser_info: String,
    /// Records in emission order
    pub records: Vec<RecordPlan>,
    pub vocabulary: Vocabulary,
    /// Non-abstract loaders in catalog insertion order
    pub loaders: IndexMap<String, LoaderDescriptor>,
    /// Loader the document entry points bind to
    pub root_loader: String,
}

impl ModulePlan {
    pub fn loader(&self, name: &str) -> Option<&LoaderDescriptor> {
        self.loaders.get(name)
    }

    pub fn record(&self, class_name: &str) -> Option<&RecordPlan> {
        self.records.iter().find(|r| r.class_name == class_name)
    }
}

// =============================================================================
// Record Plan
// =============================================================================

/// Generation plan for one record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecordPlan {
    /// Identifier-safe class name
    pub class_name: String,
    /// Name as declared in the schema
    pub schema_name: String,
    /// Safe parent names; empty means the default base capability
    pub parents: Vec<String>,
    pub doc: Option<String>,
    pub is_abstract: bool,
    /// The record carries a `class` discriminator
    pub has_class_field: bool,
    pub identifier: Option<IdentifierPlan>,
    /// Fields in load order
    pub fields: Vec<FieldPlan>,
    /// Required parameters first, then optional ones
    pub constructor: Vec<ConstructorParam>,
    /// Document keys the record declares
    pub attrs: Vec<String>,
}

impl RecordPlan {
    pub fn field(&self, safe_name: &str) -> Option<&FieldPlan> {
        self.fields.iter().find(|f| f.safe_name == safe_name)
    }

    /// Value of the `class` discriminator
    pub fn schema_name_short(&self) -> &str {
        shortname(&self.schema_name)
    }

    pub fn declares_key(&self, key: &str) -> bool {
        self.attrs.iter().any(|a| a == key)
    }

    pub fn is_identifier(&self, safe_name: &str) -> bool {
        matches!(&self.identifier, Some(id) if id.field == safe_name)
    }
}

/// Identifier defaulting for a record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IdentifierPlan {
    /// Safe member name of the identifier field
    pub field: String,
    /// Document key
    pub key: String,
    /// Absent identifiers get a blank node instead of failing
    pub optional: bool,
    /// Appended to the identifier when it becomes the base URI
    pub subscope: Option<String>,
}

/// Load and save plan for one field
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldPlan {
    pub safe_name: String,
    /// Document key the value is read from and written to
    pub key: String,
    /// Name of the resolved loader
    pub loader: String,
    pub optional: bool,
    pub doc: Option<String>,
    pub save: SavePlan,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SavePlan {
    pub strategy: SaveStrategy,
    pub base: SaveBase,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SaveStrategy {
    /// Render as a URI relative to the base
    RelativeUri { scoped_id: bool, ref_scope: Option<i64> },
    /// Recurse through the generic save routine
    Recursive,
}

/// Base URI a field is saved against
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum SaveBase {
    /// The base URI passed to `save`
    Ambient,
    /// The record's identifier, extended by its subscope when it has one
    Identifier { field: String, subscope: Option<String> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorParam {
    pub name: String,
    pub loader: String,
    pub optional: bool,
}
