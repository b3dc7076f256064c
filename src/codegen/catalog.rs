//! Type Catalog
//!
//! Symbol table of loader descriptors. Every distinct type shape gets exactly
//! one descriptor, keyed by a name derived from the shape, and descriptors are
//! kept in first-seen order so that a loader is always declared after the
//! loaders its constructor refers to.

use indexmap::IndexMap;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// Loader Kinds
// =============================================================================

/// Primitive value kinds understood by the loader runtime
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PrimitiveKind {
    Str,
    Int,
    Float,
    Bool,
    Null,
}

impl PrimitiveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Str => "str",
            Self::Int => "int",
            Self::Float => "float",
            Self::Bool => "bool",
            Self::Null => "null",
        }
    }
}

/// How the runtime builds a loader. Composite kinds refer to their
/// dependencies by loader name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LoaderKind {
    Primitive(PrimitiveKind),
    Any,
    /// String carrying an embedded expression
    Expression,
    Array {
        items: String,
    },
    Union {
        members: Vec<String>,
    },
    Enum {
        symbols: Vec<String>,
    },
    Record {
        class_name: String,
    },
    Uri {
        inner: String,
        scoped_id: bool,
        vocab_term: bool,
        ref_scope: Option<i64>,
    },
    IdMap {
        inner: String,
        map_subject: String,
        map_predicate: Option<String>,
    },
    TypeDsl {
        inner: String,
        ref_scope: Option<i64>,
    },
    SecondaryFilesDsl {
        inner: String,
    },
}

impl LoaderKind {
    /// Loader names this kind's constructor refers to
    pub fn dependencies(&self) -> Vec<&str> {
        match self {
            Self::Array { items } => vec![items.as_str()],
            Self::Union { members } => members.iter().map(String::as_str).collect(),
            Self::Uri { inner, .. }
            | Self::IdMap { inner, .. }
            | Self::TypeDsl { inner, .. }
            | Self::SecondaryFilesDsl { inner } => vec![inner.as_str()],
            Self::Primitive(_) | Self::Any | Self::Expression | Self::Enum { .. } | Self::Record { .. } => {
                Vec::new()
            }
        }
    }
}

fn opt_int(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "None".to_string())
}

impl fmt::Display for LoaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => write!(f, "PrimitiveLoader({})", kind.as_str()),
            Self::Any => write!(f, "AnyLoader()"),
            Self::Expression => write!(f, "ExpressionLoader(str)"),
            Self::Array { items } => write!(f, "ArrayLoader({})", items),
            Self::Union { members } => write!(f, "UnionLoader(({},))", members.join(", ")),
            Self::Enum { symbols } => write!(f, "EnumLoader((\"{}\",))", symbols.join("\", \"")),
            Self::Record { class_name } => write!(f, "RecordLoader({})", class_name),
            Self::Uri { inner, scoped_id, vocab_term, ref_scope } => write!(
                f,
                "URILoader({}, {}, {}, {})",
                inner,
                scoped_id,
                vocab_term,
                opt_int(*ref_scope)
            ),
            Self::IdMap { inner, map_subject, map_predicate } => write!(
                f,
                "IdMapLoader({}, '{}', '{}')",
                inner,
                map_subject,
                map_predicate.as_deref().unwrap_or("None")
            ),
            Self::TypeDsl { inner, ref_scope } => {
                write!(f, "TypeDSLLoader({}, {})", inner, opt_int(*ref_scope))
            }
            Self::SecondaryFilesDsl { inner } => write!(f, "SecondaryDSLLoader({})", inner),
        }
    }
}

// =============================================================================
// Loader Descriptor
// =============================================================================

/// A named, reusable loader for one distinct type shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoaderDescriptor {
    /// Unique name, a pure function of the shape
    pub name: String,
    /// How the runtime constructs this loader
    pub kind: LoaderKind,
    /// Values loaded through this loader are URIs
    pub is_uri: bool,
    pub scoped_id: bool,
    pub ref_scope: Option<i64>,
    /// Abstract record loaders are never bound at module level
    pub is_abstract: bool,
}

impl LoaderDescriptor {
    pub fn new(name: impl Into<String>, kind: LoaderKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_uri: false,
            scoped_id: false,
            ref_scope: None,
            is_abstract: false,
        }
    }

    pub fn with_abstract(mut self, is_abstract: bool) -> Self {
        self.is_abstract = is_abstract;
        self
    }

    /// Mark as a URI loader, carrying the parameters the serializer needs
    pub fn with_uri(mut self, scoped_id: bool, ref_scope: Option<i64>) -> Self {
        self.is_uri = true;
        self.scoped_id = scoped_id;
        self.ref_scope = ref_scope;
        self
    }

    /// Textual constructor expression, as listed by tooling
    pub fn constructor_expression(&self) -> String {
        self.kind.to_string()
    }
}

// =============================================================================
// Type Catalog
// =============================================================================

/// Interning table of loader descriptors, in first-seen order
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    entries: IndexMap<String, LoaderDescriptor>,
}

impl TypeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `descriptor` unless one with the same name exists; return the
    /// canonical descriptor either way.
    pub fn intern(&mut self, descriptor: LoaderDescriptor) -> LoaderDescriptor {
        if let Some(existing) = self.entries.get(&descriptor.name) {
            if existing.kind != descriptor.kind {
                tracing::trace!(
                    name = %descriptor.name,
                    "shape already interned with a different member order"
                );
            }
            return existing.clone();
        }
        tracing::debug!(name = %descriptor.name, kind = %descriptor.kind, "interned loader");
        self.entries.insert(descriptor.name.clone(), descriptor.clone());
        descriptor
    }

    pub fn get(&self, name: &str) -> Option<&LoaderDescriptor> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// All descriptors in first-seen order
    pub fn all_entries(&self) -> impl Iterator<Item = &LoaderDescriptor> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// =============================================================================
// Vocabulary
// =============================================================================

/// Bidirectional short name <-> URI table, sorted by short name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Vocabulary {
    terms: BTreeMap<String, String>,
    reverse: BTreeMap<String, String>,
}

impl Vocabulary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a term. Returns the URI previously bound to `short` if it
    /// differed, so the caller can report the collision.
    pub fn add(&mut self, short: impl Into<String>, uri: impl Into<String>) -> Option<String> {
        let short = short.into();
        let uri = uri.into();
        self.reverse.insert(uri.clone(), short.clone());
        match self.terms.insert(short, uri.clone()) {
            Some(previous) if previous != uri => Some(previous),
            _ => None,
        }
    }

    pub fn uri(&self, short: &str) -> Option<&str> {
        self.terms.get(short).map(String::as_str)
    }

    pub fn short(&self, uri: &str) -> Option<&str> {
        self.reverse.get(uri).map(String::as_str)
    }

    /// short -> URI, sorted by short name
    pub fn terms(&self) -> &BTreeMap<String, String> {
        &self.terms
    }

    /// URI -> short
    pub fn reverse(&self) -> &BTreeMap<String, String> {
        &self.reverse
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }
}
