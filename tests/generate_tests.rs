//! Generation Tests
//!
//! Schema files on disk through to rendered loader modules.

use std::fs;
use std::path::{Path, PathBuf};

use familiar_codegen::codegen::{generate_rust, CompilationContext, TypeResolver};
use familiar_codegen::schema::TypeDecl;
use familiar_codegen::{
    compile, CodegenError, CompileOptions, DiagnosticCode, RenderProfile, ResolutionStrategy, SchemaDocument,
};
use rstest::rstest;
use serde_json::json;

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

// =============================================================================
// Resolution
// =============================================================================

#[test]
fn test_interning_is_idempotent() {
    let mut ctx = CompilationContext::new();
    let decl = TypeDecl::from_value(&json!(["null", {"type": "array", "items": "string"}])).unwrap();

    let first = TypeResolver::new(&mut ctx).resolve(&decl).unwrap();
    let size = ctx.catalog.len();
    let second = TypeResolver::new(&mut ctx).resolve(&decl).unwrap();

    assert_eq!(first, second);
    assert_eq!(ctx.catalog.len(), size);
    assert_eq!(first.name, "union_of_array_of_strtype_or_null_type");
}

#[rstest]
#[case(json!(["null", "string", "int"]))]
#[case(json!(["int", "null", "string"]))]
#[case(json!(["string", "int", "null", "string"]))]
fn test_union_names_ignore_member_order(#[case] union: serde_json::Value) {
    let mut ctx = CompilationContext::new();
    let decl = TypeDecl::from_value(&union).unwrap();
    let loader = TypeResolver::new(&mut ctx).resolve(&decl).unwrap();
    assert_eq!(loader.name, "union_of_inttype_or_null_type_or_strtype");
}

#[rstest]
#[case(ResolutionStrategy::TwoPhase, true)]
#[case(ResolutionStrategy::SinglePhase, false)]
fn test_forward_reference_by_strategy(#[case] strategy: ResolutionStrategy, #[case] succeeds: bool) {
    let schema = SchemaDocument::load(&fixtures_path().join("workflow.yml")).unwrap();
    let options = CompileOptions {
        strategy,
        ..CompileOptions::default()
    };
    match compile(&schema, &options) {
        Ok(compiled) => {
            assert!(succeeds);
            assert_eq!(compiled.plan.records.len(), 3);
        }
        Err(CodegenError::UnresolvedTypeReference { name }) => {
            assert!(!succeeds);
            assert_eq!(name, "Step");
        }
        Err(other) => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_inheritance_cycle_is_rejected() {
    let schema = SchemaDocument::parse(
        "- {type: record, name: A, extends: B}\n- {type: record, name: B, extends: A}\n",
    )
    .unwrap();
    let err = compile(&schema, &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CodegenError::InheritanceCycle { .. }));
    assert!(err.to_string().contains("A -> B"));
}

#[test]
fn test_unknown_type_shape_is_rejected() {
    let schema = SchemaDocument::parse(
        "- type: record\n  name: Bag\n  fields:\n    - {name: items, type: {type: map, values: string}}\n",
    )
    .unwrap();
    let err = compile(&schema, &CompileOptions::default()).unwrap_err();
    assert!(matches!(err, CodegenError::UnsupportedTypeShape { ref tag } if tag == "map"));
}

// =============================================================================
// Rendering From Files
// =============================================================================

#[test]
fn test_generate_from_schema_file() {
    let output = generate_rust(
        &fixtures_path().join("workflow.yml"),
        &CompileOptions::default(),
        &RenderProfile::default(),
    )
    .unwrap();

    assert_eq!(output.record_count, 3);
    assert!(output.diagnostics.is_empty(), "{}", output.diagnostics);
    assert!(output.code.contains("pub struct Workflow {"));
    assert!(output.code.contains("pub struct Step {"));
    assert!(output.code.contains("pub static COLORLOADER: Lazy<Loader>"));
    assert!(output.code.contains("Loader::idmap(&ARRAY_OF_STEPLOADER, \"id\", None)"));
    assert!(output.code.contains("r.insert(\"class\".to_string(), Value::from(\"Workflow\"));"));
}

#[test]
fn test_generate_from_directory_is_deterministic() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("a_enum.yml"),
        "- {type: enum, name: Shape, symbols: [circle, square]}\n",
    )
    .unwrap();
    fs::write(
        dir.path().join("b_records.json"),
        r#"[{"type": "record", "name": "Drawing", "fields": [
              {"name": "shapes", "type": {"type": "array", "items": "Shape"}}
           ]}]"#,
    )
    .unwrap();

    let first = generate_rust(dir.path(), &CompileOptions::default(), &RenderProfile::default()).unwrap();
    let second = generate_rust(dir.path(), &CompileOptions::default(), &RenderProfile::default()).unwrap();
    assert_eq!(first.code, second.code);
    assert!(first.code.contains("pub shapes: Vec<String>,"));
    // No documentRoot: every concrete record is a root
    assert!(first.diagnostics.has_code(DiagnosticCode::ImplicitDocumentRoot));
}

#[test]
fn test_parser_info_tracks_schema_content() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("schema.yml");

    fs::write(&path, "- {type: record, name: Note, fields: [{name: text, type: string}]}\n").unwrap();
    let before = compile(&SchemaDocument::load(&path).unwrap(), &CompileOptions::default()).unwrap();
    fs::write(&path, "- {type: record, name: Note, fields: [{name: body, type: string}]}\n").unwrap();
    let after = compile(&SchemaDocument::load(&path).unwrap(), &CompileOptions::default()).unwrap();

    assert!(before.plan.parser_info.starts_with("familiar-codegen-"));
    assert_ne!(before.plan.parser_info, after.plan.parser_info);
}

#[test]
fn test_parser_info_override() {
    let schema = SchemaDocument::load(&fixtures_path().join("workflow.yml")).unwrap();
    let options = CompileOptions {
        parser_info: Some("workflow_v1_0".into()),
        ..CompileOptions::default()
    };
    let output = familiar_codegen::generate(&schema, &options, &RenderProfile::default()).unwrap();
    assert!(output.code.contains("\"workflow_v1_0\""));
}
