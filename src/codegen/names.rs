//! Name Helpers
//!
//! Maps schema URIs to the short names used as document keys and to the
//! identifier-safe names used for generated classes, fields and loaders.

/// Last path segment of the fragment (if any), else of the path.
///
/// `https://w3id.org/cwl/salad#RecordField/name` -> `name`
pub fn shortname(uri: &str) -> &str {
    let without_query = |s: &'_ str| -> usize { s.find('?').unwrap_or(s.len()) };
    let segment = match uri.split_once('#') {
        Some((_, fragment)) if !fragment.is_empty() => fragment,
        Some((path, _)) => &path[..without_query(path)],
        None => &uri[..without_query(uri)],
    };
    segment.rsplit('/').next().unwrap_or(segment)
}

/// Identifier-safe form of a schema name.
///
/// Takes the short name, drops the `anon.` prefix the schema parser uses for
/// anonymous types, replaces characters that cannot appear in identifiers and
/// suffixes reserved words with `_`.
pub fn safe_name(name: &str) -> String {
    let short = shortname(name);
    let short = short.strip_prefix("anon.").unwrap_or(short);

    let mut out: String = short
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    if is_reserved(&out) {
        out.push('_');
    }
    out
}

/// Name of a module-level static holding a loader
pub fn static_ident(loader_name: &str) -> String {
    loader_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect()
}

fn is_reserved(name: &str) -> bool {
    RESERVED.contains(&name)
}

/// Rust keywords plus the names the loader runtime claims for itself
const RESERVED: &[&str] = &[
    "as", "break", "class", "const", "continue", "crate", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct",
    "super", "trait", "true", "type", "unsafe", "use", "where", "while",
    "async", "await", "dyn", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield",
    "extension_fields", "loading_options",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shortname() {
        assert_eq!(shortname("https://w3id.org/cwl/salad#RecordField/name"), "name");
        assert_eq!(shortname("https://w3id.org/cwl/salad#Any"), "Any");
        assert_eq!(shortname("http://example.com/path/Tool"), "Tool");
        assert_eq!(shortname("http://example.com/path/Tool?x=1"), "Tool");
        assert_eq!(shortname("string"), "string");
    }

    #[test]
    fn test_safe_name() {
        assert_eq!(safe_name("https://w3id.org/cwl/cwl#CommandLineTool"), "CommandLineTool");
        assert_eq!(safe_name("class"), "class_");
        assert_eq!(safe_name("in"), "in_");
        assert_eq!(safe_name("type"), "type_");
        assert_eq!(safe_name("anon.Output"), "Output");
        assert_eq!(safe_name("x-ray.level"), "x_ray_level");
        assert_eq!(safe_name("3d"), "_3d");
    }

    #[test]
    fn test_static_ident() {
        assert_eq!(static_ident("union_of_None_type_or_strtype"), "UNION_OF_NONE_TYPE_OR_STRTYPE");
        assert_eq!(static_ident("ToolLoader"), "TOOLLOADER");
    }
}
