//! Document Loading Tests
//!
//! Compiles the workflow fixture and runs its plan against documents:
//! validation, identifier defaulting, extension fields and save round trips.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use familiar_codegen::eval::{Evaluator, LoadingOptions, MemoryFetcher, Node, ValidationError};
use familiar_codegen::{compile, CompileOptions, ModulePlan, SchemaDocument};
use rstest::{fixture, rstest};
use serde_json::json;

const MAIN_URI: &str = "file:///w/main.yml";

fn fixtures_path() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

fn compile_fixture(name: &str) -> ModulePlan {
    let schema = SchemaDocument::load(&fixtures_path().join(name)).unwrap();
    compile(&schema, &CompileOptions::default()).unwrap().plan
}

#[fixture]
fn plan() -> ModulePlan {
    compile_fixture("workflow.yml")
}

fn load(plan: &ModulePlan, text: &str) -> Result<Node, ValidationError> {
    Evaluator::new(plan).load_document_by_string(text, MAIN_URI, None)
}

fn record_errors(err: &ValidationError) -> (&str, &[ValidationError]) {
    err.record_failure()
        .unwrap_or_else(|| panic!("no record failure in:\n{}", err.report()))
}

// =============================================================================
// Valid Documents
// =============================================================================

#[rstest]
fn test_load_main_document(plan: ModulePlan) {
    let text = std::fs::read_to_string(fixtures_path().join("main.yml")).unwrap();
    let node = load(&plan, &text).unwrap();
    let workflow = node.as_record().unwrap();

    assert_eq!(workflow.class_name, "Workflow");
    // No id in the document: the root takes the document URI
    assert_eq!(workflow.get_str("id"), Some(MAIN_URI));
    assert_eq!(workflow.get_str("label"), Some("two steps"));
    assert_eq!(workflow.get_str("color"), Some("green"));

    let steps = workflow.get("steps").and_then(Node::as_list).unwrap();
    let ids: Vec<_> = steps.iter().map(|s| s.as_record().unwrap().get_str("id").unwrap()).collect();
    assert_eq!(ids, vec!["file:///w/main.yml#build", "file:///w/main.yml#test"]);

    let build = steps[0].as_record().unwrap();
    assert_eq!(build.get_str("run"), Some("file:///w/tools/build.yml"));
    assert_eq!(build.get("count"), Some(&Node::Int(2)));
    assert!(steps[1].as_record().unwrap().get("count").is_none());
}

#[rstest]
fn test_optional_identifiers_get_distinct_blank_nodes(plan: ModulePlan) {
    let text = std::fs::read_to_string(fixtures_path().join("main.yml")).unwrap();
    let node = load(&plan, &text).unwrap();
    let hints = node.as_record().unwrap().get("hints").and_then(Node::as_list).unwrap();

    let ids: Vec<_> = hints.iter().map(|h| h.as_record().unwrap().get_str("id").unwrap()).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.iter().all(|id| id.starts_with("_:")));
    assert_ne!(ids[0], ids[1]);
}

#[rstest]
fn test_explicit_base_scopes_identifiers(plan: ModulePlan) {
    let node = load(
        &plan,
        "$base: http://example.com/flows/wf.yml\nclass: Workflow\nsteps: [{id: only, run: tool.yml}]\n",
    )
    .unwrap();
    let workflow = node.as_record().unwrap();
    assert_eq!(workflow.get_str("id"), Some("http://example.com/flows/wf.yml"));

    let step = workflow.get("steps").and_then(Node::as_list).unwrap()[0].as_record().unwrap();
    assert_eq!(step.get_str("id"), Some("http://example.com/flows/wf.yml#only"));
    assert_eq!(step.get_str("run"), Some("http://example.com/flows/tool.yml"));
}

#[rstest]
fn test_graph_documents_load_as_lists(plan: ModulePlan) {
    let node = load(
        &plan,
        "$graph:\n  - {class: Workflow, id: '#a', steps: []}\n  - {class: Workflow, id: '#b', steps: []}\n",
    )
    .unwrap();
    let items = node.as_list().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[1].as_record().unwrap().get_str("id"), Some("file:///w/main.yml#b"));
}

// =============================================================================
// Validation Errors
// =============================================================================

#[rstest]
fn test_every_invalid_field_is_reported(plan: ModulePlan) {
    let text = std::fs::read_to_string(fixtures_path().join("invalid.yml")).unwrap();
    let err = load(&plan, &text).unwrap_err();
    let (class_name, errors) = record_errors(&err);

    assert_eq!(class_name, "Workflow");
    assert_eq!(errors.len(), 3, "{}", err.report());
    assert!(matches!(&errors[0], ValidationError::InvalidField { field, .. } if field == "label"));
    assert!(matches!(&errors[1], ValidationError::InvalidField { field, .. } if field == "color"));
    match &errors[2] {
        ValidationError::UnexpectedField { key, expected } => {
            assert_eq!(key, "colour");
            assert!(expected.contains(&"color".to_string()));
        }
        other => panic!("expected an unexpected field error, got {:?}", other),
    }
    assert!(err.report().contains("invalid field `colour`"));
}

#[rstest]
fn test_missing_required_identifier(plan: ModulePlan) {
    let err = load(&plan, "class: Workflow\nsteps: [{run: tool.yml}]\n").unwrap_err();
    assert!(err.any(&|e| matches!(e, ValidationError::MissingIdentifier { field } if field == "id")));
}

#[rstest]
fn test_class_mismatch(plan: ModulePlan) {
    let err = load(&plan, "class: Tool\nsteps: []\n").unwrap_err();
    assert!(err.any(&|e| matches!(e, ValidationError::ClassMismatch { class_name, .. } if class_name == "Workflow")));
}

#[rstest]
#[case("steps: []\n")]
#[case("class: Workflow\n")]
fn test_missing_required_fields(plan: ModulePlan, #[case] text: &str) {
    assert!(load(&plan, text).is_err());
}

// =============================================================================
// Extension Fields and Round Trips
// =============================================================================

#[rstest]
fn test_namespaced_keys_survive_round_trip(plan: ModulePlan) {
    let text = "$namespaces: {ex: 'http://example.com/ns#'}\nclass: Workflow\nsteps: []\nex:note: keep me\n";
    let node = load(&plan, text).unwrap();
    let workflow = node.as_record().unwrap();
    assert_eq!(
        workflow.extension_fields.get("http://example.com/ns#note"),
        Some(&json!("keep me"))
    );

    let saved = Evaluator::new(&plan).save_document(&node, MAIN_URI);
    assert_eq!(saved["ex:note"], json!("keep me"));
    assert_eq!(saved["$namespaces"], json!({"ex": "http://example.com/ns#"}));
}

#[rstest]
fn test_save_omits_absent_fields_and_compacts_uris(plan: ModulePlan) {
    let text = std::fs::read_to_string(fixtures_path().join("main.yml")).unwrap();
    let evaluator = Evaluator::new(&plan);
    let node = load(&plan, &text).unwrap();
    let saved = evaluator.save_document(&node, MAIN_URI);

    // A root id equal to the base is left out and restored from the document URI
    assert!(saved.get("id").is_none());
    assert_eq!(saved["class"], json!("Workflow"));
    assert_eq!(
        saved["steps"][0],
        json!({"id": "build", "run": "tools/build.yml", "count": 2})
    );
    assert!(saved["steps"][1].get("count").is_none());
}

#[rstest]
#[case::workflow("workflow.yml", include_str!("fixtures/main.yml"))]
#[case::same_document_run("workflow.yml", "class: Workflow\nsteps: [{id: build, run: main.yml}]\n")]
#[case::subscoped_identifier("scoped.yml", "id: '#wf'\nsteps: [{id: s1}]\n")]
#[case::subscoped_same_document_run("scoped.yml", "id: '#wf'\nsteps: [{id: s1, run: main.yml}]\n")]
#[case::ref_scope("scoped.yml", "id: '#wf'\nsteps: [{id: s1}, {id: s2, source: in}]\n")]
#[case::defaulted_root_with_subscope("scoped.yml", "steps: [{id: s1, run: '#wf'}]\n")]
fn test_validate_save_validate_is_stable(#[case] schema: &str, #[case] text: &str) {
    let plan = compile_fixture(schema);
    let evaluator = Evaluator::new(&plan);
    let first = load(&plan, text).unwrap();
    let saved = evaluator.save_document(&first, MAIN_URI);
    let second = evaluator
        .load_document_by_yaml(&saved, MAIN_URI, None)
        .unwrap_or_else(|e| panic!("saved document failed to load:\n{}\n{}", saved, e.report()));
    assert_eq!(first, second, "saved as {}", saved);
}

#[test]
fn test_subscoped_identifiers_save_against_scoped_base() {
    let plan = compile_fixture("scoped.yml");
    let evaluator = Evaluator::new(&plan);
    let node = load(
        &plan,
        "id: '#wf'\nsteps:\n  - {id: s1}\n  - {id: s2, source: in, run: main.yml}\n",
    )
    .unwrap();

    let flow = node.as_record().unwrap();
    assert_eq!(flow.get_str("id"), Some("file:///w/main.yml#wf"));
    let steps = flow.get("steps").and_then(Node::as_list).unwrap();
    assert_eq!(steps[0].as_record().unwrap().get_str("id"), Some("file:///w/main.yml#wf/sub/s1"));
    let second = steps[1].as_record().unwrap();
    assert_eq!(second.get_str("source"), Some("file:///w/main.yml#wf/in"));
    assert_eq!(second.get_str("run"), Some(MAIN_URI));

    let saved = evaluator.save_document(&node, MAIN_URI);
    assert_eq!(saved["id"], json!("wf"));
    assert_eq!(saved["steps"][0], json!({"id": "s1"}));
    assert_eq!(
        saved["steps"][1],
        json!({"id": "s2", "run": "file:///w/main.yml", "source": "in"})
    );
}

// =============================================================================
// Imports and Includes
// =============================================================================

#[rstest]
fn test_import_and_include(plan: ModulePlan) {
    let fetcher = MemoryFetcher::new()
        .with_document("file:///w/step.yml", "id: imported\nrun: tool.yml\n")
        .with_document("file:///w/label.txt", "from a file");
    let options = LoadingOptions::with_vocabulary(&plan.vocabulary)
        .with_fetcher(Arc::new(fetcher))
        .with_fileuri(MAIN_URI);

    let node = Evaluator::new(&plan)
        .load_document_by_string(
            "class: Workflow\nlabel: {$include: label.txt}\nsteps:\n  - {$import: step.yml}\n",
            MAIN_URI,
            Some(options),
        )
        .unwrap();

    let workflow = node.as_record().unwrap();
    assert_eq!(workflow.get_str("label"), Some("from a file"));
    let step = workflow.get("steps").and_then(Node::as_list).unwrap()[0].as_record().unwrap();
    assert_eq!(step.get_str("id"), Some("file:///w/step.yml#imported"));
    assert_eq!(step.get_str("run"), Some("file:///w/tool.yml"));
}

#[rstest]
fn test_import_without_fileuri_fails(plan: ModulePlan) {
    let options = LoadingOptions::with_vocabulary(&plan.vocabulary);
    let err = Evaluator::new(&plan)
        .load_document(
            &json!({"class": "Workflow", "steps": [{"$import": "step.yml"}]}),
            Some(MAIN_URI),
            Some(options),
        )
        .unwrap_err();
    assert!(err.report().contains("without fileuri"));
}
