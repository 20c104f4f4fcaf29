use validate_xml_lsp::SchemaRegistry;

use crate::common::test_helpers::*;

#[test]
fn test_lookup_by_target_namespace() {
    let workspace = TestWorkspace::new();
    let path = workspace.write("schemas/a.xsd", &namespace_only_schema("urn:a"));

    let registry = SchemaRegistry::new();
    registry.rescan(&["./schemas"], Some(workspace.root()));

    let entry = registry.lookup("urn:a").unwrap();
    assert_eq!(entry.path, path);
    assert!(entry.location.starts_with("file://"));
    assert!(entry.location.ends_with("/schemas/a.xsd"));
    assert!(registry.lookup("urn:b").is_none());
}

#[test]
fn test_rescan_without_changes_is_idempotent() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/a.xsd", &namespace_only_schema("urn:a"));
    workspace.write("schemas/nested/b.xsd", &namespace_only_schema("urn:b"));

    let registry = SchemaRegistry::new();
    registry.rescan(&["schemas"], Some(workspace.root()));
    let first = registry.snapshot();
    registry.rescan(&["schemas"], Some(workspace.root()));
    let second = registry.snapshot();

    assert_eq!(first.len(), 2);
    assert_eq!(*first, *second);
}

#[test]
fn test_deleted_schema_disappears_on_rescan() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/a.xsd", &namespace_only_schema("urn:a"));
    workspace.write("schemas/b.xsd", &namespace_only_schema("urn:b"));

    let registry = SchemaRegistry::new();
    registry.rescan(&["schemas"], Some(workspace.root()));
    assert_eq!(registry.len(), 2);

    workspace.remove("schemas/b.xsd");
    registry.rescan(&["schemas"], Some(workspace.root()));

    assert!(registry.lookup("urn:a").is_some());
    assert!(registry.lookup("urn:b").is_none());
}

#[test]
fn test_snapshot_held_by_reader_survives_rescan() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/a.xsd", &namespace_only_schema("urn:a"));

    let registry = SchemaRegistry::new();
    registry.rescan(&["schemas"], Some(workspace.root()));
    let held = registry.snapshot();

    workspace.remove("schemas/a.xsd");
    registry.rescan(&["schemas"], Some(workspace.root()));

    assert!(held.lookup("urn:a").is_some());
    assert!(registry.is_empty());
}

#[test]
fn test_schemas_without_target_namespace_are_ignored() {
    let workspace = TestWorkspace::new();
    workspace.write(
        "schemas/plain.xsd",
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"/>"#,
    );
    workspace.write("schemas/a.xsd", &namespace_only_schema("urn:a"));

    let registry = SchemaRegistry::new();
    registry.rescan(&["schemas"], Some(workspace.root()));

    assert_eq!(registry.snapshot().namespaces().collect::<Vec<_>>(), vec!["urn:a"]);
}

#[test]
fn test_missing_and_remote_locations_are_skipped() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/a.xsd", &namespace_only_schema("urn:a"));

    let registry = SchemaRegistry::new();
    registry.rescan(
        &["does-not-exist", "https://example.com/schemas", "schemas"],
        Some(workspace.root()),
    );

    assert_eq!(registry.len(), 1);
}

#[test]
fn test_exclude_patterns_skip_matching_files() {
    let workspace = TestWorkspace::new();
    workspace.write("schemas/a.xsd", &namespace_only_schema("urn:a"));
    workspace.write("schemas/legacy/old.xsd", &namespace_only_schema("urn:old"));

    let registry = SchemaRegistry::with_exclude_patterns(&["**/legacy/**".to_string()]).unwrap();
    registry.rescan(&["schemas"], Some(workspace.root()));

    assert!(registry.lookup("urn:a").is_some());
    assert!(registry.lookup("urn:old").is_none());
}
