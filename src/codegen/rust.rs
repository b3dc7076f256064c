//! Rust Code Emitter
//!
//! Renders a `ModulePlan` as a Rust module calling into the loader runtime
//! crate named by the `RenderProfile`.
//!
//! Key constraints:
//! - This module ONLY receives ModulePlan + RenderProfile - no schema input
//! - Field types are derived from loader descriptors
//! - Statics are bound in catalog order, so dependencies are always in scope

use super::catalog::{LoaderDescriptor, LoaderKind, PrimitiveKind};
use super::names::static_ident;
use super::plan::{FieldPlan, ModulePlan, RecordPlan, SaveBase, SaveStrategy};
use super::RenderProfile;

// =============================================================================
// Public API
// =============================================================================

/// Render a complete loader module
pub fn render_module(plan: &ModulePlan, profile: &RenderProfile) -> String {
    let mut output = String::new();

    emit_header(&mut output, plan, profile);

    for record in &plan.records {
        emit_record(&mut output, record, plan, profile);
        output.push('\n');
    }

    emit_vocabulary(&mut output, plan);
    emit_loaders(&mut output, plan);
    emit_entry_points(&mut output, plan);

    output
}

// =============================================================================
// Header
// =============================================================================

fn emit_header(output: &mut String, plan: &ModulePlan, profile: &RenderProfile) {
    output.push_str("//! Generated loader module - DO NOT EDIT\n");
    output.push_str("//!\n");
    output.push_str("//! This file is generated by `schema-codegen generate`.\n");
    if let Some(copyright) = &profile.copyright {
        output.push_str("//!\n");
        output.push_str(&format!("//! {}\n", copyright));
    }
    output.push('\n');
    output.push_str("#![allow(non_snake_case, non_camel_case_types, dead_code, unused_imports)]\n\n");

    let rt = &profile.runtime_crate;
    output.push_str("use indexmap::IndexMap;\n");
    output.push_str("use once_cell::sync::Lazy;\n");
    output.push_str("use serde_json::{Map, Value};\n\n");
    output.push_str(&format!(
        "use {rt}::{{\n    blank_node, default_base_uri, document_load, expand_url, load_field, \
         load_optional_field, prefix_url,\n    save, save_relative_uri, yaml_to_value, Loader, \
         LoadingOptions, Node, Primitive, Savable, ValidationError,\n}};\n\n"
    ));

    output.push_str("/// Identifies the schema this module was generated from\n");
    output.push_str("pub fn parser_info() -> &'static str {\n");
    output.push_str(&format!("    {:?}\n", plan.parser_info));
    output.push_str("}\n\n");
}

// =============================================================================
// Type Mapping
// =============================================================================

/// Rust type of the values a loader produces
fn rust_type(plan: &ModulePlan, loader: &str) -> String {
    let Some(desc) = plan.loader(loader) else {
        // Abstract record loaders are never bound
        return match loader.strip_suffix("Loader").and_then(|class| plan.record(class)) {
            Some(record) if record.is_abstract => format!("Box<dyn {}>", record.class_name),
            _ => "Node".to_string(),
        };
    };
    match &desc.kind {
        LoaderKind::Primitive(kind) => match kind {
            PrimitiveKind::Str => "String".to_string(),
            PrimitiveKind::Int => "i64".to_string(),
            PrimitiveKind::Float => "f64".to_string(),
            PrimitiveKind::Bool => "bool".to_string(),
            PrimitiveKind::Null => "()".to_string(),
        },
        LoaderKind::Any => "Value".to_string(),
        LoaderKind::Expression | LoaderKind::Enum { .. } => "String".to_string(),
        LoaderKind::Array { items } => format!("Vec<{}>", rust_type(plan, items)),
        LoaderKind::Union { members } => {
            let non_null: Vec<&String> = members.iter().filter(|m| !is_null_loader(plan, m)).collect();
            match non_null.as_slice() {
                [single] => rust_type(plan, single),
                _ => "Node".to_string(),
            }
        }
        LoaderKind::Record { class_name } => format!("Box<{}>", class_name),
        LoaderKind::Uri { inner, .. }
        | LoaderKind::IdMap { inner, .. }
        | LoaderKind::TypeDsl { inner, .. }
        | LoaderKind::SecondaryFilesDsl { inner } => rust_type(plan, inner),
    }
}

fn is_null_loader(plan: &ModulePlan, name: &str) -> bool {
    matches!(
        plan.loader(name).map(|d| &d.kind),
        Some(LoaderKind::Primitive(PrimitiveKind::Null))
    )
}

/// Member type: identifiers are always set after loading
fn member_type(plan: &ModulePlan, record: &RecordPlan, field: &FieldPlan) -> String {
    let inner = rust_type(plan, &field.loader);
    if field.optional && !record.is_identifier(&field.safe_name) {
        format!("Option<{}>", inner)
    } else {
        inner
    }
}

fn emit_doc(output: &mut String, doc: Option<&str>, indent: &str, profile: &RenderProfile) {
    if !profile.emit_docs {
        return;
    }
    if let Some(doc) = doc {
        for line in doc.lines() {
            if line.trim().is_empty() {
                output.push_str(&format!("{}///\n", indent));
            } else {
                output.push_str(&format!("{}/// {}\n", indent, line.trim_end()));
            }
        }
    }
}

// =============================================================================
// Record Emission
// =============================================================================

fn emit_record(output: &mut String, record: &RecordPlan, plan: &ModulePlan, profile: &RenderProfile) {
    emit_doc(output, record.doc.as_deref(), "", profile);

    if record.is_abstract {
        let mut bounds: Vec<String> = record.parents.clone();
        if bounds.is_empty() {
            bounds.push("Savable".to_string());
        }
        bounds.push("std::fmt::Debug".to_string());
        output.push_str(&format!("pub trait {}: {} {{}}\n", record.class_name, bounds.join(" + ")));
        return;
    }

    emit_struct(output, record, plan, profile);
    for parent in &record.parents {
        output.push_str(&format!("impl {} for {} {{}}\n", parent, record.class_name));
    }
    output.push('\n');
    emit_constructor(output, record, plan);
    output.push('\n');
    output.push_str(&format!("impl Savable for {} {{\n", record.class_name));
    emit_from_doc(output, record);
    output.push('\n');
    emit_save(output, record);
    output.push_str("}\n");
}

fn emit_struct(output: &mut String, record: &RecordPlan, plan: &ModulePlan, profile: &RenderProfile) {
    output.push_str(&profile.derive_line());
    output.push_str(&format!("pub struct {} {{\n", record.class_name));
    output.push_str("    pub extension_fields: IndexMap<String, Value>,\n");
    output.push_str("    pub loading_options: LoadingOptions,\n");
    for field in &record.fields {
        emit_doc(output, field.doc.as_deref(), "    ", profile);
        output.push_str(&format!(
            "    pub {}: {},\n",
            field.safe_name,
            member_type(plan, record, field)
        ));
    }
    output.push_str("}\n");
}

fn emit_constructor(output: &mut String, record: &RecordPlan, plan: &ModulePlan) {
    output.push_str(&format!("impl {} {{\n", record.class_name));

    let attrs: Vec<String> = record.attrs.iter().map(|a| format!("{:?}", a)).collect();
    output.push_str(&format!(
        "    pub const ATTRS: &'static [&'static str] = &[{}];\n\n",
        attrs.join(", ")
    ));

    output.push_str("    #[allow(clippy::too_many_arguments)]\n");
    output.push_str("    pub fn new(\n");
    for param in &record.constructor {
        let ty = rust_type(plan, &param.loader);
        if param.optional {
            output.push_str(&format!("        {}: Option<{}>,\n", param.name, ty));
        } else {
            output.push_str(&format!("        {}: {},\n", param.name, ty));
        }
    }
    output.push_str("        extension_fields: Option<IndexMap<String, Value>>,\n");
    output.push_str("        loading_options: Option<LoadingOptions>,\n");
    output.push_str("    ) -> Self {\n");
    output.push_str("        Self {\n");
    output.push_str("            extension_fields: extension_fields.unwrap_or_default(),\n");
    output.push_str("            loading_options: loading_options.unwrap_or_default(),\n");
    for field in &record.fields {
        let identifier_param_optional = record
            .constructor
            .iter()
            .any(|p| p.name == field.safe_name && p.optional);
        if record.is_identifier(&field.safe_name) && identifier_param_optional {
            output.push_str(&format!(
                "            {0}: {0}.unwrap_or_else(blank_node),\n",
                field.safe_name
            ));
        } else {
            output.push_str(&format!("            {},\n", field.safe_name));
        }
    }
    output.push_str("        }\n");
    output.push_str("    }\n");
    output.push_str("}\n");
}

fn emit_from_doc(output: &mut String, record: &RecordPlan) {
    let class = &record.class_name;
    output.push_str("    fn from_doc(\n");
    output.push_str("        doc: &Value,\n");
    output.push_str("        baseuri: &str,\n");
    output.push_str("        loading_options: &LoadingOptions,\n");
    output.push_str("        doc_root: Option<&str>,\n");
    output.push_str("    ) -> Result<Self, ValidationError> {\n");
    output.push_str(&format!(
        "        let doc = doc.as_object().ok_or_else(|| ValidationError::invalid(\"Expected a mapping for {}\"))?;\n",
        class
    ));
    if record.has_class_field {
        output.push_str(&format!(
            "        if doc.get(\"class\").and_then(Value::as_str) != Some({:?}) {{\n",
            record.schema_name_short()
        ));
        output.push_str(&format!(
            "            return Err(ValidationError::class_mismatch({:?}, doc.get(\"class\")));\n",
            class
        ));
        output.push_str("        }\n");
    }
    output.push_str("        let mut errors: Vec<ValidationError> = Vec::new();\n");
    output.push_str("        #[allow(unused_mut)]\n");
    output.push_str("        let mut baseuri = baseuri.to_string();\n");

    for field in &record.fields {
        emit_field_load(output, field);
        if let Some(id) = record.identifier.as_ref().filter(|id| id.field == field.safe_name) {
            let name = &id.field;
            output.push_str(&format!("        let {}_was_absent = {}.is_none();\n", name, name));
            let fallback = if id.optional {
                "Some(blank_node())".to_string()
            } else {
                format!(
                    "{{\n            errors.push(ValidationError::missing_identifier({:?}));\n            None\n        }}",
                    id.key
                )
            };
            output.push_str(&format!(
                "        let {0} = {0}.or_else(|| doc_root.map(str::to_string)).or_else(|| {1});\n",
                name, fallback
            ));
            let base = match &id.subscope {
                Some(subscope) => format!("format!(\"{{}}/{{}}\", value, {:?})", subscope),
                None => "value.clone()".to_string(),
            };
            output.push_str(&format!("        if !{}_was_absent {{\n", name));
            output.push_str(&format!("            if let Some(value) = &{} {{\n", name));
            output.push_str(&format!("                baseuri = {};\n", base));
            output.push_str("            }\n");
            output.push_str("        }\n");
        }
    }

    output.push_str("        let mut extension_fields = IndexMap::new();\n");
    output.push_str("        for (key, value) in doc {\n");
    output.push_str("            if Self::ATTRS.contains(&key.as_str()) {\n");
    output.push_str("                continue;\n");
    output.push_str("            }\n");
    output.push_str("            if key.contains(':') {\n");
    output.push_str("                match expand_url(key, \"\", loading_options, false, false, None) {\n");
    output.push_str("                    Ok(expanded) => {\n");
    output.push_str("                        extension_fields.insert(expanded, value.clone());\n");
    output.push_str("                    }\n");
    output.push_str("                    Err(e) => errors.push(e),\n");
    output.push_str("                }\n");
    output.push_str("            } else {\n");
    output.push_str("                errors.push(ValidationError::unexpected_field(key, Self::ATTRS));\n");
    output.push_str("            }\n");
    output.push_str("        }\n");
    output.push_str("        if !errors.is_empty() {\n");
    output.push_str(&format!(
        "            return Err(ValidationError::record_failed({:?}, errors));\n",
        class
    ));
    output.push_str("        }\n");

    output.push_str("        Ok(Self {\n");
    output.push_str("            extension_fields,\n");
    output.push_str("            loading_options: loading_options.clone(),\n");
    for field in &record.fields {
        if field.optional && !record.is_identifier(&field.safe_name) {
            output.push_str(&format!("            {},\n", field.safe_name));
        } else {
            output.push_str(&format!(
                "            {0}: {0}.ok_or_else(|| ValidationError::missing_field({1:?}))?,\n",
                field.safe_name, field.key
            ));
        }
    }
    output.push_str("        })\n");
    output.push_str("    }\n");
}

fn emit_field_load(output: &mut String, field: &FieldPlan) {
    let loader = static_ident(&field.loader);
    let on_error = format!(
        "|e| {{\n                errors.push(ValidationError::invalid_field({:?}, e));\n                None\n            }}",
        field.key
    );
    if field.optional {
        output.push_str(&format!("        let {} = match doc.get({:?}) {{\n", field.safe_name, field.key));
        output.push_str(&format!(
            "            Some(raw) => load_optional_field(raw, &{}, &baseuri, loading_options).unwrap_or_else({}),\n",
            loader, on_error
        ));
        output.push_str("            None => None,\n");
        output.push_str("        };\n");
    } else {
        output.push_str(&format!(
            "        let {} = load_field(doc.get({:?}).unwrap_or(&Value::Null), &{}, &baseuri, loading_options)\n",
            field.safe_name, field.key, loader
        ));
        output.push_str("            .map(Some)\n");
        output.push_str(&format!("            .unwrap_or_else({});\n", on_error.replace("\n    ", "\n")));
    }
}

fn emit_save(output: &mut String, record: &RecordPlan) {
    output.push_str("    fn save(&self, top: bool, base_url: &str, relative_uris: bool) -> Value {\n");
    output.push_str("        let mut r = Map::new();\n");
    output.push_str("        for (key, value) in &self.extension_fields {\n");
    output.push_str("            r.insert(prefix_url(key, &self.loading_options), value.clone());\n");
    output.push_str("        }\n");
    if record.has_class_field {
        output.push_str(&format!(
            "        r.insert(\"class\".to_string(), Value::from({:?}));\n",
            record.schema_name_short()
        ));
    }

    // Mirrors the base the loader switched to after reading the identifier
    if let Some(id) = &record.identifier {
        output.push_str(&format!(
            "        let omit_{f} = top && self.{f} == base_url;\n",
            f = id.field
        ));
        let uses_base = record
            .fields
            .iter()
            .any(|f| matches!(f.save.base, SaveBase::Identifier { .. }));
        if uses_base {
            let scoped = match &id.subscope {
                Some(subscope) => format!("format!(\"{{}}/{{}}\", self.{}, {:?})", id.field, subscope),
                None => format!("self.{}.clone()", id.field),
            };
            output.push_str(&format!(
                "        let {f}_base = if omit_{f} {{ base_url.to_string() }} else {{ {} }};\n",
                scoped,
                f = id.field
            ));
        }
    }

    for field in &record.fields {
        let base = match &field.save.base {
            SaveBase::Ambient => "base_url".to_string(),
            SaveBase::Identifier { field: id, .. } => format!("{}_base.as_str()", id),
        };
        let value_expr = match &field.save.strategy {
            SaveStrategy::RelativeUri { scoped_id, ref_scope } => format!(
                "save_relative_uri(value, {}, {}, {}, relative_uris)",
                base,
                scoped_id,
                ref_scope.map(|s| format!("Some({})", s)).unwrap_or_else(|| "None".to_string())
            ),
            SaveStrategy::Recursive => format!("save(value, false, {}, relative_uris)", base),
        };
        let binding = if record.is_identifier(&field.safe_name) {
            format!("if !omit_{f} {{\n            let value = &self.{f};", f = field.safe_name)
        } else if field.optional {
            format!("if let Some(value) = &self.{} {{", field.safe_name)
        } else {
            format!("{{\n            let value = &self.{};", field.safe_name)
        };
        output.push_str(&format!("        {}\n", binding));
        output.push_str(&format!(
            "            r.insert({:?}.to_string(), {});\n",
            field.key, value_expr
        ));
        output.push_str("        }\n");
    }

    output.push_str("        if top {\n");
    output.push_str("            self.loading_options.inject_namespaces(&mut r);\n");
    output.push_str("        }\n");
    output.push_str("        Value::Object(r)\n");
    output.push_str("    }\n");
}

// =============================================================================
// Epilogue
// =============================================================================

fn emit_vocabulary(output: &mut String, plan: &ModulePlan) {
    output.push_str("pub static VOCAB: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {\n");
    output.push_str("    IndexMap::from([\n");
    for (short, uri) in plan.vocabulary.terms() {
        output.push_str(&format!("        ({:?}, {:?}),\n", short, uri));
    }
    output.push_str("    ])\n");
    output.push_str("});\n\n");

    output.push_str("pub static RVOCAB: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {\n");
    output.push_str("    IndexMap::from([\n");
    for (short, uri) in plan.vocabulary.terms() {
        output.push_str(&format!("        ({:?}, {:?}),\n", uri, short));
    }
    output.push_str("    ])\n");
    output.push_str("});\n\n");
}

fn emit_loaders(output: &mut String, plan: &ModulePlan) {
    for desc in plan.loaders.values() {
        output.push_str(&format!(
            "pub static {}: Lazy<Loader> = Lazy::new(|| {});\n",
            static_ident(&desc.name),
            loader_expression(desc)
        ));
    }
    output.push('\n');
}

fn loader_expression(desc: &LoaderDescriptor) -> String {
    let opt_scope = |s: &Option<i64>| s.map(|v| format!("Some({})", v)).unwrap_or_else(|| "None".to_string());
    match &desc.kind {
        LoaderKind::Primitive(kind) => {
            let variant = match kind {
                PrimitiveKind::Str => "Str",
                PrimitiveKind::Int => "Int",
                PrimitiveKind::Float => "Float",
                PrimitiveKind::Bool => "Bool",
                PrimitiveKind::Null => "Null",
            };
            format!("Loader::primitive(Primitive::{})", variant)
        }
        LoaderKind::Any => "Loader::any()".to_string(),
        LoaderKind::Expression => "Loader::expression()".to_string(),
        LoaderKind::Array { items } => format!("Loader::array(&{})", static_ident(items)),
        LoaderKind::Union { members } => {
            let refs: Vec<String> = members.iter().map(|m| format!("&{}", static_ident(m))).collect();
            format!("Loader::union(&[{}])", refs.join(", "))
        }
        LoaderKind::Enum { symbols } => {
            let quoted: Vec<String> = symbols.iter().map(|s| format!("{:?}", s)).collect();
            format!("Loader::enumeration(&[{}])", quoted.join(", "))
        }
        LoaderKind::Record { class_name } => format!("Loader::record::<{}>()", class_name),
        LoaderKind::Uri { inner, scoped_id, vocab_term, ref_scope } => format!(
            "Loader::uri(&{}, {}, {}, {})",
            static_ident(inner),
            scoped_id,
            vocab_term,
            opt_scope(ref_scope)
        ),
        LoaderKind::IdMap { inner, map_subject, map_predicate } => format!(
            "Loader::idmap(&{}, {:?}, {})",
            static_ident(inner),
            map_subject,
            map_predicate
                .as_ref()
                .map(|p| format!("Some({:?})", p))
                .unwrap_or_else(|| "None".to_string())
        ),
        LoaderKind::TypeDsl { inner, ref_scope } => {
            format!("Loader::type_dsl(&{}, {})", static_ident(inner), opt_scope(ref_scope))
        }
        LoaderKind::SecondaryFilesDsl { inner } => {
            format!("Loader::secondary_files_dsl(&{})", static_ident(inner))
        }
    }
}

fn emit_entry_points(output: &mut String, plan: &ModulePlan) {
    let root = static_ident(&plan.root_loader);

    output.push_str("fn options_or_default(loading_options: Option<LoadingOptions>) -> LoadingOptions {\n");
    output.push_str("    loading_options.unwrap_or_else(|| LoadingOptions::with_vocabulary(&VOCAB, &RVOCAB))\n");
    output.push_str("}\n\n");

    output.push_str("pub fn load_document(\n");
    output.push_str("    doc: Value,\n");
    output.push_str("    baseuri: Option<&str>,\n");
    output.push_str("    loading_options: Option<LoadingOptions>,\n");
    output.push_str(") -> Result<Node, ValidationError> {\n");
    output.push_str("    let baseuri = baseuri.map(str::to_string).unwrap_or_else(default_base_uri);\n");
    output.push_str(&format!(
        "    document_load(&{}, doc, &baseuri, &options_or_default(loading_options))\n",
        root
    ));
    output.push_str("}\n\n");

    output.push_str("pub fn load_document_by_string(\n");
    output.push_str("    text: &str,\n");
    output.push_str("    uri: &str,\n");
    output.push_str("    loading_options: Option<LoadingOptions>,\n");
    output.push_str(") -> Result<Node, ValidationError> {\n");
    output.push_str("    let doc = yaml_to_value(text)?;\n");
    output.push_str("    load_document_by_yaml(doc, uri, loading_options)\n");
    output.push_str("}\n\n");

    output.push_str("pub fn load_document_by_yaml(\n");
    output.push_str("    yaml: Value,\n");
    output.push_str("    uri: &str,\n");
    output.push_str("    loading_options: Option<LoadingOptions>,\n");
    output.push_str(") -> Result<Node, ValidationError> {\n");
    output.push_str("    let loading_options = loading_options.unwrap_or_else(|| {\n");
    output.push_str("        let mut options = options_or_default(None);\n");
    output.push_str("        options.fileuri = Some(uri.to_string());\n");
    output.push_str("        options\n");
    output.push_str("    });\n");
    output.push_str("    loading_options.idx.insert(uri.to_string(), yaml.clone());\n");
    output.push_str(&format!("    document_load(&{}, yaml, uri, &loading_options)\n", root));
    output.push_str("}\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codegen::{compile, CompileOptions};
    use crate::schema::SchemaDocument;

    const SCHEMA: &str = r#"
- type: record
  name: Process
  abstract: true
- type: record
  name: Tool
  extends: Process
  documentRoot: true
  doc: A command line tool.
  fields:
    - {name: id, type: ["null", string], jsonldPredicate: "@id"}
    - {name: class, type: string}
    - {name: label, type: ["null", string]}
    - {name: baseCommand, type: {type: array, items: string}}
"#;

    fn render(profile: &RenderProfile) -> String {
        let schema = SchemaDocument::parse(SCHEMA).unwrap();
        let compiled = compile(&schema, &CompileOptions::default()).unwrap();
        render_module(&compiled.plan, profile)
    }

    #[test]
    fn test_render_record() {
        let code = render(&RenderProfile::default());
        assert!(code.contains("pub trait Process: Savable + std::fmt::Debug {}"));
        assert!(code.contains("pub struct Tool {"));
        assert!(code.contains("impl Process for Tool {}"));
        assert!(code.contains("    pub label: Option<String>,"));
        assert!(code.contains("    pub baseCommand: Vec<String>,"));
        assert!(code.contains("    pub id: String,"));
        assert!(code.contains("/// A command line tool."));
        assert!(code.contains(
            "pub const ATTRS: &'static [&'static str] = &[\"id\", \"class\", \"label\", \"baseCommand\"];"
        ));
    }

    #[test]
    fn test_constructor_parameter_order() {
        let code = render(&RenderProfile::default());
        let new_at = code.find("pub fn new(").unwrap();
        let tail = &code[new_at..];
        let base_command = tail.find("baseCommand: Vec<String>").unwrap();
        let id = tail.find("id: Option<String>").unwrap();
        assert!(base_command < id);
    }

    #[test]
    fn test_loaders_in_catalog_order() {
        let code = render(&RenderProfile::default());
        let str_at = code.find("pub static STRTYPE").unwrap();
        let array_at = code.find("pub static ARRAY_OF_STRTYPE").unwrap();
        assert!(str_at < array_at);
        assert!(!code.contains("pub static PROCESSLOADER"));
        assert!(code.contains("Loader::record::<Tool>()"));
        assert!(code.contains("pub fn load_document_by_yaml("));
    }

    #[test]
    fn test_save_uses_subscoped_identifier_base() {
        let schema = SchemaDocument::parse(
            r#"
- type: record
  name: Flow
  documentRoot: true
  fields:
    - {name: id, type: string, jsonldPredicate: "@id", subscope: run}
    - {name: next, type: ["null", string], jsonldPredicate: {_type: "@id"}}
"#,
        )
        .unwrap();
        let compiled = compile(&schema, &CompileOptions::default()).unwrap();
        let code = render_module(&compiled.plan, &RenderProfile::default());

        assert!(code.contains("let omit_id = top && self.id == base_url;"));
        assert!(code.contains(
            "let id_base = if omit_id { base_url.to_string() } else { format!(\"{}/{}\", self.id, \"run\") };"
        ));
        assert!(code.contains("save_relative_uri(value, id_base.as_str(), false, None, relative_uris)"));
        assert!(code.contains("save_relative_uri(value, base_url, true, None, relative_uris)"));
    }

    #[test]
    fn test_profile_controls_header() {
        let profile = RenderProfile {
            runtime_crate: "salad_rt".into(),
            copyright: Some("Copyright Example Org".into()),
            emit_docs: false,
            ..RenderProfile::default()
        };
        let code = render(&profile);
        assert!(code.contains("use salad_rt::{"));
        assert!(code.contains("//! Copyright Example Org"));
        assert!(!code.contains("/// A command line tool."));
    }
}
