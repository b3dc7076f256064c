//! URI expansion and compaction
//!
//! `expand_url` turns document references into absolute URIs while loading;
//! `relative_uri` and `prefix_url` undo that while saving.

use indexmap::IndexMap;
use url::Url;

use super::error::ValidationError;
use super::options::LoadingOptions;

// =============================================================================
// Splitting
// =============================================================================

/// `scheme://netloc/path?query#fragment`, any part possibly empty
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitUri {
    pub scheme: String,
    pub netloc: String,
    pub path: String,
    pub query: String,
    pub fragment: String,
}

fn is_scheme(candidate: &str) -> bool {
    let mut chars = candidate.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

impl SplitUri {
    pub fn parse(uri: &str) -> Self {
        let mut rest = uri;
        let mut split = Self::default();

        if let Some((head, tail)) = rest.split_once('#') {
            split.fragment = tail.to_string();
            rest = head;
        }
        if let Some((head, tail)) = rest.split_once('?') {
            split.query = tail.to_string();
            rest = head;
        }
        if let Some((scheme, tail)) = rest.split_once(':') {
            if is_scheme(scheme) {
                split.scheme = scheme.to_ascii_lowercase();
                rest = tail;
            }
        }
        if let Some(tail) = rest.strip_prefix("//") {
            let end = tail.find('/').unwrap_or(tail.len());
            split.netloc = tail[..end].to_string();
            rest = &tail[end..];
        }
        split.path = rest.to_string();
        split
    }

    pub fn unsplit(&self) -> String {
        let mut out = String::new();
        if !self.scheme.is_empty() {
            out.push_str(&self.scheme);
            out.push(':');
        }
        let hierarchical = matches!(self.scheme.as_str(), "file" | "http" | "https");
        if !self.netloc.is_empty() || (hierarchical && self.path.starts_with('/')) {
            out.push_str("//");
            out.push_str(&self.netloc);
        }
        out.push_str(&self.path);
        if !self.query.is_empty() {
            out.push('?');
            out.push_str(&self.query);
        }
        if !self.fragment.is_empty() {
            out.push('#');
            out.push_str(&self.fragment);
        }
        out
    }
}

// =============================================================================
// Expansion
// =============================================================================

/// Expand a document reference against `base_url`.
///
/// - `scoped_id`: a fragment-less reference becomes a child of the base fragment
/// - `vocab_term`: known terms pass through, results are compacted back to terms
/// - `scoped_ref`: pop that many base fragment segments before appending
pub fn expand_url(
    url: &str,
    base_url: &str,
    options: &LoadingOptions,
    scoped_id: bool,
    vocab_term: bool,
    scoped_ref: Option<i64>,
) -> Result<String, ValidationError> {
    if url == "@id" || url == "@type" || url.starts_with("_:") {
        return Ok(url.to_string());
    }
    if vocab_term && options.vocab.contains_key(url) {
        return Ok(url.to_string());
    }

    let mut url = url.to_string();
    if !options.vocab.is_empty() {
        if let Some((prefix, rest)) = url.split_once(':') {
            if let Some(ns) = options.vocab.get(prefix) {
                url = format!("{}{}", ns, rest);
            }
        }
    }

    let split = SplitUri::parse(&url);
    if matches!(split.scheme.as_str(), "http" | "https" | "file")
        || url.starts_with("$(")
        || url.starts_with("${")
    {
        // absolute or an expression; keep as is
    } else if scoped_id && split.fragment.is_empty() {
        let base = SplitUri::parse(base_url);
        let fragment = if base.fragment.is_empty() {
            split.path.clone()
        } else {
            format!("{}/{}", base.fragment, split.path)
        };
        url = SplitUri {
            path: if base.path.is_empty() { "/".to_string() } else { base.path },
            fragment,
            ..base
        }
        .unsplit();
    } else if let (Some(mut n), true) = (scoped_ref, split.fragment.is_empty()) {
        let base = SplitUri::parse(base_url);
        let mut segments: Vec<String> = if base.fragment.is_empty() {
            Vec::new()
        } else {
            base.fragment.split('/').map(str::to_string).collect()
        };
        while n > 0 && !segments.is_empty() {
            segments.pop();
            n -= 1;
        }
        segments.push(url.clone());
        url = SplitUri {
            fragment: segments.join("/"),
            ..base
        }
        .unsplit();
    } else {
        url = options.fetcher.urljoin(base_url, &url);
    }

    if vocab_term {
        if !SplitUri::parse(&url).scheme.is_empty() {
            return match options.rvocab.get(&url) {
                Some(term) => Ok(term.clone()),
                None => Err(ValidationError::invalid(format!("Term '{}' not in vocabulary", url))),
            };
        }
    }
    Ok(url)
}

// =============================================================================
// Compaction
// =============================================================================

/// Rewrite `uri` relative to `base_url` when both share scheme and host.
///
/// The result expands back to `uri` under the same `scoped_id`/`ref_scope`
/// settings. An empty string means `uri` equals the base.
pub fn relative_uri(uri: &str, base_url: &str, scoped_id: bool, ref_scope: Option<i64>) -> String {
    if uri == base_url {
        return String::new();
    }
    let target = SplitUri::parse(uri);
    let base = SplitUri::parse(base_url);
    if target.scheme != base.scheme || target.netloc != base.netloc {
        return uri.to_string();
    }

    if target.path != base.path {
        let mut rel = relpath(&target.path, dirname(&base.path));
        if !target.fragment.is_empty() {
            rel.push('#');
            rel.push_str(&target.fragment);
        }
        return rel;
    }

    // Same document without a fragment: a bare name would expand into the base fragment
    if target.fragment.is_empty() {
        return uri.to_string();
    }

    if scoped_id || ref_scope.is_some() {
        // Mirror of scoped_ref expansion: drop `ref_scope` trailing segments
        let mut segments: Vec<&str> = base.fragment.split('/').filter(|s| !s.is_empty()).collect();
        for _ in 0..ref_scope.unwrap_or(0).max(0) {
            segments.pop();
        }
        let base_fragment = if segments.is_empty() {
            String::new()
        } else {
            format!("{}/", segments.join("/"))
        };
        if let Some(rest) = target.fragment.strip_prefix(&base_fragment).filter(|r| !r.is_empty()) {
            return rest.to_string();
        }
    }
    format!("#{}", target.fragment)
}

/// Compact a URI with the first namespace whose URI prefixes it
pub fn prefix_url(url: &str, namespaces: &IndexMap<String, String>) -> String {
    for (prefix, ns) in namespaces {
        if let Some(rest) = url.strip_prefix(ns.as_str()) {
            return format!("{}:{}", prefix, rest);
        }
    }
    url.to_string()
}

fn dirname(path: &str) -> &str {
    match path.rfind('/') {
        Some(0) => "/",
        Some(i) => &path[..i],
        None => "",
    }
}

/// POSIX relative path from directory `start` to `path`
fn relpath(path: &str, start: &str) -> String {
    let parts = |p: &str| -> Vec<String> {
        p.split('/').filter(|s| !s.is_empty()).map(str::to_string).collect()
    };
    let target = parts(path);
    let from = parts(start);
    let common = target.iter().zip(&from).take_while(|(a, b)| a == b).count();

    let mut rel: Vec<String> = vec!["..".to_string(); from.len() - common];
    rel.extend(target[common..].iter().cloned());
    if rel.is_empty() {
        ".".to_string()
    } else {
        rel.join("/")
    }
}

/// `file://` URI of the current directory, with a trailing slash
pub fn default_base_uri() -> String {
    std::env::current_dir()
        .ok()
        .and_then(|dir| Url::from_directory_path(dir).ok())
        .map(|url| url.to_string())
        .unwrap_or_else(|| "file:///".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_split_roundtrip() {
        let split = SplitUri::parse("http://example.com/a/b?x=1#frag/sub");
        assert_eq!(split.scheme, "http");
        assert_eq!(split.netloc, "example.com");
        assert_eq!(split.path, "/a/b");
        assert_eq!(split.query, "x=1");
        assert_eq!(split.fragment, "frag/sub");
        assert_eq!(split.unsplit(), "http://example.com/a/b?x=1#frag/sub");
        assert_eq!(SplitUri::parse("file:///tmp/x").unsplit(), "file:///tmp/x");
    }

    #[rstest]
    #[case("step1", true, None, "file:///w/main.cwl#main/step1")]
    #[case("#other", true, None, "file:///w/main.cwl#other")]
    #[case("out", false, Some(1), "file:///w/main.cwl#out")]
    #[case("sub.cwl", false, None, "file:///w/sub.cwl")]
    #[case("$(inputs.x)", false, None, "$(inputs.x)")]
    #[case("https://example.com/x", true, None, "https://example.com/x")]
    #[case("_:b0", true, None, "_:b0")]
    fn test_expand_url(
        #[case] url: &str,
        #[case] scoped_id: bool,
        #[case] scoped_ref: Option<i64>,
        #[case] expected: &str,
    ) {
        let options = LoadingOptions::default();
        let expanded = expand_url(url, "file:///w/main.cwl#main", &options, scoped_id, false, scoped_ref).unwrap();
        assert_eq!(expanded, expected);
    }

    #[test]
    fn test_expand_prefix_and_vocab() {
        let mut options = LoadingOptions::default();
        options.vocab.insert("ex".into(), "http://example.com/ns#".into());
        options.vocab.insert("red".into(), "http://example.com/ns#red".into());
        options.rvocab.insert("http://example.com/ns#red".into(), "red".into());

        assert_eq!(
            expand_url("ex:thing", "file:///w/a", &options, false, false, None).unwrap(),
            "http://example.com/ns#thing"
        );
        assert_eq!(expand_url("red", "file:///w/a", &options, false, true, None).unwrap(), "red");
        assert_eq!(expand_url("ex:red", "file:///w/a", &options, false, true, None).unwrap(), "red");
        let err = expand_url("blue", "file:///w/a", &options, false, true, None).unwrap_err();
        assert_eq!(err.to_string(), "Term 'file:///w/blue' not in vocabulary");
    }

    #[rstest]
    #[case("file:///w/main.cwl#main/step1", "file:///w/main.cwl#main", true, None, "step1")]
    #[case("file:///w/main.cwl#main", "file:///w/main.cwl", true, None, "main")]
    #[case("file:///w/lib/tool.cwl", "file:///w/main.cwl", false, None, "lib/tool.cwl")]
    #[case("file:///w/tool.cwl#x", "file:///w/sub/main.cwl", false, None, "../tool.cwl#x")]
    #[case("file:///w/main.cwl#main/out", "file:///w/main.cwl#main/step1", false, Some(1), "out")]
    #[case("http://other.org/x", "file:///w/main.cwl", false, None, "http://other.org/x")]
    #[case("file:///w/main.cwl", "file:///w/main.cwl#build", false, None, "file:///w/main.cwl")]
    #[case("file:///w/main.cwl", "file:///w/main.cwl#build", true, Some(1), "file:///w/main.cwl")]
    #[case("file:///w/main.cwl#other", "file:///w/main.cwl#build", false, None, "#other")]
    #[case("file:///w/main.cwl#build/x", "file:///w/main.cwl#build", false, None, "#build/x")]
    #[case("file:///w/main.cwl#top", "file:///w/main.cwl#wf/sub", true, None, "#top")]
    #[case("file:///w/main.cwl#wf", "file:///w/main.cwl#wf", true, None, "")]
    fn test_relative_uri(
        #[case] uri: &str,
        #[case] base: &str,
        #[case] scoped_id: bool,
        #[case] ref_scope: Option<i64>,
        #[case] expected: &str,
    ) {
        assert_eq!(relative_uri(uri, base, scoped_id, ref_scope), expected);
    }

    #[rstest]
    #[case("file:///w/main.cwl", "file:///w/main.cwl#build", false, None)]
    #[case("file:///w/main.cwl#other", "file:///w/main.cwl#build", false, None)]
    #[case("file:///w/main.cwl#wf/sub/s1", "file:///w/main.cwl#wf/sub", true, None)]
    #[case("file:///w/main.cwl#wf/in", "file:///w/main.cwl#wf/sub/s1", false, Some(2))]
    #[case("file:///w/lib/tool.cwl#x", "file:///w/main.cwl#wf", false, None)]
    fn test_relative_uri_expands_back(
        #[case] uri: &str,
        #[case] base: &str,
        #[case] scoped_id: bool,
        #[case] ref_scope: Option<i64>,
    ) {
        let options = LoadingOptions::default();
        let rel = relative_uri(uri, base, scoped_id, ref_scope);
        assert_eq!(expand_url(&rel, base, &options, scoped_id, false, ref_scope).unwrap(), uri);
    }

    #[test]
    fn test_prefix_url() {
        let mut ns = IndexMap::new();
        ns.insert("ex".to_string(), "http://example.com/".to_string());
        assert_eq!(prefix_url("http://example.com/foo", &ns), "ex:foo");
        assert_eq!(prefix_url("http://other.org/foo", &ns), "http://other.org/foo");
    }

    #[test]
    fn test_default_base_uri() {
        let base = default_base_uri();
        assert!(base.starts_with("file:///"));
        assert!(base.ends_with('/'));
    }
}
