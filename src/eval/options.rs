//! Load-time configuration and document fetching

use indexmap::IndexMap;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::{Arc, Mutex};
use url::Url;

use super::error::ValidationError;
use crate::codegen::Vocabulary;

// =============================================================================
// Fetcher
// =============================================================================

/// Source of documents referenced by `$import`, `$include` and string roots
pub trait Fetcher: Send + Sync {
    fn fetch_text(&self, uri: &str) -> Result<String, ValidationError>;

    /// Resolve `url` against `base`
    fn urljoin(&self, base: &str, url: &str) -> String {
        urljoin(base, url)
    }
}

/// Joins a reference onto a base URI. Bases that cannot be parsed (blank
/// nodes, bare names) leave the reference unchanged.
pub fn urljoin(base: &str, url: &str) -> String {
    if url.is_empty() {
        return base.to_string();
    }
    if let Ok(absolute) = Url::parse(url) {
        return absolute.to_string();
    }
    match Url::parse(base).and_then(|b| b.join(url)) {
        Ok(joined) => joined.to_string(),
        Err(_) => url.to_string(),
    }
}

/// Reads `file://` URIs and plain paths from the local filesystem
#[derive(Debug, Default, Clone, Copy)]
pub struct FileFetcher;

impl Fetcher for FileFetcher {
    fn fetch_text(&self, uri: &str) -> Result<String, ValidationError> {
        let path = match Url::parse(uri) {
            Ok(url) if url.scheme() == "file" => url
                .to_file_path()
                .map_err(|_| ValidationError::fetch(uri, "not a local file path"))?,
            Ok(url) => {
                return Err(ValidationError::fetch(
                    uri,
                    format!("unsupported scheme '{}'", url.scheme()),
                ))
            }
            Err(_) => uri.into(),
        };
        tracing::debug!(path = %path.display(), "fetching document");
        std::fs::read_to_string(&path).map_err(|e| ValidationError::fetch(uri, e))
    }
}

/// In-memory documents keyed by URI
#[derive(Debug, Default, Clone)]
pub struct MemoryFetcher {
    documents: HashMap<String, String>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(mut self, uri: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(uri.into(), text.into());
        self
    }
}

impl Fetcher for MemoryFetcher {
    fn fetch_text(&self, uri: &str) -> Result<String, ValidationError> {
        self.documents
            .get(uri)
            .cloned()
            .ok_or_else(|| ValidationError::fetch(uri, "no such document"))
    }
}

// =============================================================================
// Document Index
// =============================================================================

/// Parsed documents shared by every copy of one set of options
#[derive(Debug, Default, Clone)]
pub struct DocumentIndex(Arc<Mutex<HashMap<String, serde_json::Value>>>);

impl DocumentIndex {
    pub fn get(&self, uri: &str) -> Option<serde_json::Value> {
        let guard = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.get(uri).cloned()
    }

    pub fn insert(&self, uri: impl Into<String>, doc: serde_json::Value) {
        let mut guard = self.0.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.insert(uri.into(), doc);
    }
}

// =============================================================================
// Loading Options
// =============================================================================

#[derive(Clone)]
pub struct LoadingOptions {
    /// URI of the file being loaded, needed for `$import` and `$include`
    pub fileuri: Option<String>,
    /// Prefix -> namespace URI, from `$namespaces`
    pub namespaces: IndexMap<String, String>,
    /// From `$schemas`
    pub schemas: Vec<String>,
    /// Term -> URI, including namespace prefixes
    pub vocab: BTreeMap<String, String>,
    /// URI -> term
    pub rvocab: BTreeMap<String, String>,
    pub idx: DocumentIndex,
    pub fetcher: Arc<dyn Fetcher>,
}

impl fmt::Debug for LoadingOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoadingOptions")
            .field("fileuri", &self.fileuri)
            .field("namespaces", &self.namespaces)
            .field("schemas", &self.schemas)
            .field("vocab", &self.vocab.len())
            .finish_non_exhaustive()
    }
}

impl Default for LoadingOptions {
    fn default() -> Self {
        Self {
            fileuri: None,
            namespaces: IndexMap::new(),
            schemas: Vec::new(),
            vocab: BTreeMap::new(),
            rvocab: BTreeMap::new(),
            idx: DocumentIndex::default(),
            fetcher: Arc::new(FileFetcher),
        }
    }
}

impl LoadingOptions {
    /// Options seeded with a module's vocabulary
    pub fn with_vocabulary(vocab: &Vocabulary) -> Self {
        Self {
            vocab: vocab.terms().clone(),
            rvocab: vocab.reverse().clone(),
            ..Self::default()
        }
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    pub fn with_fileuri(mut self, fileuri: impl Into<String>) -> Self {
        self.fileuri = Some(fileuri.into());
        self
    }

    /// Copy for a document that declares its own `$namespaces`/`$schemas`.
    /// Namespace prefixes become vocabulary terms.
    pub fn scoped(&self, namespaces: Option<IndexMap<String, String>>, schemas: Option<Vec<String>>) -> Self {
        let mut next = self.clone();
        if let Some(namespaces) = namespaces {
            for (prefix, uri) in &namespaces {
                next.vocab.insert(prefix.clone(), uri.clone());
                next.rvocab.insert(uri.clone(), prefix.clone());
            }
            next.namespaces = namespaces;
        }
        if let Some(schemas) = schemas {
            next.schemas = schemas;
        }
        next
    }
}
