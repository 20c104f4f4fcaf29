use std::sync::Arc;

use serde_json::json;

use validate_xml_lsp::{Position, Range, Settings, Severity};

use crate::common::mocks::*;
use crate::common::test_helpers::*;

#[test]
fn test_budget_of_one_keeps_first_of_two_problems() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/test.xsd", TEST_SCHEMA);
    let orchestrator =
        workspace.orchestrator(Arc::new(FixedValidator::new(xml_error_lines(2))), settings_with_budget(1));

    let publications = orchestrator.on_document_changed(
        workspace.uri("doc.xml"),
        1,
        INVALID_DOCUMENT.to_string(),
    );

    assert_eq!(publications.len(), 1);
    assert_eq!(publications[0].diagnostics.len(), 1);
    assert_eq!(publications[0].diagnostics[0].message, "Element 'item': problem 1");
}

#[test]
fn test_document_without_namespaces_is_not_validated() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/test.xsd", TEST_SCHEMA);
    let mut validator = MockValidator::new();
    validator.expect_validate().never();
    let orchestrator = workspace.orchestrator(Arc::new(validator), settings_with_budget(100));

    let publications =
        orchestrator.on_document_changed(workspace.uri("plain.xml"), 1, "<root/>".to_string());

    assert_eq!(publications.len(), 1);
    assert!(publications[0].diagnostics.is_empty());
    assert_eq!(publications[0].version, Some(1));
}

#[test]
fn test_missing_schema_reports_one_warning() {
    let workspace = TestWorkspace::new();
    let orchestrator = workspace.orchestrator(
        Arc::new(FixedValidator::new(Vec::<String>::new())),
        settings_with_budget(100),
    );

    let publications = orchestrator.on_document_changed(
        workspace.uri("doc.xml"),
        3,
        "<a:root xmlns:a=\"urn:missing\"/>".to_string(),
    );

    let diagnostics = &publications[0].diagnostics;
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].severity, Severity::Warning);
    assert_eq!(diagnostics[0].source, "xmlLint");
    assert!(diagnostics[0].message.contains("'urn:missing'"));
    assert!(diagnostics[0].message.contains("schemas"));
    assert_eq!(
        diagnostics[0].range,
        Range::new(Position::new(0, 8), Position::new(0, 29))
    );
}

#[test]
fn test_validator_receives_document_and_schema_text() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/test.xsd", TEST_SCHEMA);

    let mut validator = MockValidator::new();
    validator
        .expect_validate()
        .withf(|document, schema| document == INVALID_DOCUMENT && schema == TEST_SCHEMA)
        .times(1)
        .returning(|_, _| Ok(vec![]));
    let orchestrator = workspace.orchestrator(Arc::new(validator), settings_with_budget(100));

    let publications = orchestrator.on_document_changed(
        workspace.uri("doc.xml"),
        1,
        INVALID_DOCUMENT.to_string(),
    );

    assert!(publications[0].diagnostics.is_empty());
}

#[test]
fn test_schema_added_after_open_is_found_on_next_change() {
    let workspace = TestWorkspace::new();
    let mut validator = MockValidator::new();
    validator
        .expect_validate()
        .times(1)
        .returning(|_, _| Ok(vec![]));
    let orchestrator = workspace.orchestrator(Arc::new(validator), settings_with_budget(100));
    let uri = workspace.uri("doc.xml");

    let first = orchestrator.on_document_changed(uri.clone(), 1, VALID_DOCUMENT.to_string());
    assert_eq!(first[0].diagnostics.len(), 1);

    workspace.write("schemas/test.xsd", TEST_SCHEMA);
    let second = orchestrator.on_document_changed(uri, 2, VALID_DOCUMENT.to_string());
    assert!(second[0].diagnostics.is_empty());
    assert_eq!(second[0].version, Some(2));
}

#[test]
fn test_configuration_change_applies_new_budget_to_open_documents() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/test.xsd", TEST_SCHEMA);
    let orchestrator = workspace.orchestrator(
        Arc::new(FixedValidator::new(xml_error_lines(5))),
        settings_with_budget(100),
    );
    let uri = workspace.uri("doc.xml");

    let before = orchestrator.on_document_changed(uri.clone(), 1, INVALID_DOCUMENT.to_string());
    assert_eq!(before[0].diagnostics.len(), 5);

    let after = orchestrator.on_configuration_changed(&json!({
        "xml": { "maxNumberOfProblems": 2, "schemaLocations": ["schemas"] }
    }));

    assert_eq!(after.len(), 1);
    assert_eq!(after[0].uri, uri);
    assert_eq!(after[0].diagnostics.len(), 2);
}

#[test]
fn test_closed_document_is_not_revalidated() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/test.xsd", TEST_SCHEMA);
    let orchestrator = workspace.orchestrator(
        Arc::new(FixedValidator::new(xml_error_lines(1))),
        settings_with_budget(100),
    );
    let uri = workspace.uri("doc.xml");
    orchestrator.on_document_changed(uri.clone(), 1, INVALID_DOCUMENT.to_string());

    let cleared = orchestrator.on_document_closed(&uri);
    assert_eq!(cleared.len(), 1);
    assert!(cleared[0].diagnostics.is_empty());

    let publications = orchestrator.on_configuration_changed(&json!({ "xml": {} }));
    assert!(publications.is_empty());
}

#[test]
fn test_schema_problems_go_to_the_schema_file() {
    let workspace = TestWorkspace::new();
    let schema_path = workspace.write("schemas/test.xsd", TEST_SCHEMA);
    let orchestrator = workspace.orchestrator(
        Arc::new(FixedValidator::new([
            "file_0.xsd:4:Schemas parser error:element:bad type",
            "file_0.xml:2:Schemas validity error:wrong:Element 'wrong': not expected",
        ])),
        Settings {
            publish_schema_diagnostics: true,
            ..settings_with_budget(100)
        },
    );

    let publications = orchestrator.on_document_changed(
        workspace.uri("doc.xml"),
        1,
        INVALID_DOCUMENT.to_string(),
    );

    assert_eq!(publications.len(), 2);
    assert_eq!(publications[0].diagnostics.len(), 1);
    assert_eq!(
        publications[0].diagnostics[0].range,
        Range::on_line(1, 3, 8)
    );
    assert_eq!(publications[1].uri.to_file_path().unwrap(), schema_path);
    assert_eq!(publications[1].version, None);
    assert_eq!(
        publications[1].diagnostics[0].message,
        "Schemas parser error:element:bad type"
    );
    assert_eq!(publications[1].diagnostics[0].severity, Severity::Warning);
}

#[test]
fn test_zero_budget_means_default_budget() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/test.xsd", TEST_SCHEMA);
    let orchestrator = workspace.orchestrator(
        Arc::new(FixedValidator::new(xml_error_lines(3))),
        settings_with_budget(0),
    );

    let publications = orchestrator.on_document_changed(
        workspace.uri("doc.xml"),
        1,
        INVALID_DOCUMENT.to_string(),
    );

    assert_eq!(publications[0].diagnostics.len(), 3);
}

#[test]
fn test_schema_problems_cleared_when_namespace_dropped() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/test.xsd", TEST_SCHEMA);
    let orchestrator = workspace.orchestrator(
        Arc::new(FixedValidator::new(["file_0.xsd:4:Schemas parser error:element:bad type"])),
        Settings {
            publish_schema_diagnostics: true,
            ..settings_with_budget(100)
        },
    );
    let uri = workspace.uri("doc.xml");
    orchestrator.on_document_changed(uri.clone(), 1, INVALID_DOCUMENT.to_string());

    let publications = orchestrator.on_document_changed(uri, 2, "<root/>".to_string());

    assert_eq!(publications.len(), 2);
    assert!(publications[1].uri.as_str().ends_with("/schemas/test.xsd"));
    assert!(publications[1].diagnostics.is_empty());
}
