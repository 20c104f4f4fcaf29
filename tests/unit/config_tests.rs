use serde_json::json;
use tempfile::TempDir;

use validate_xml_lsp::config::{DEFAULT_MAX_PROBLEMS, DEFAULT_SCHEMA_LOCATION};
use validate_xml_lsp::{ConfigError, ConfigManager, Settings};

#[tokio::test]
async fn test_settings_file_layers_over_defaults() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("validate-xml-lsp.toml");
    std::fs::write(
        &path,
        r#"
[xml]
schemalocations = ["schemas", "vendor/xsd"]
"#,
    )
    .unwrap();

    let settings = ConfigManager::load_settings(Some(&path)).await.unwrap();

    assert_eq!(settings.schema_locations, vec!["schemas", "vendor/xsd"]);
    assert_eq!(settings.max_number_of_problems, DEFAULT_MAX_PROBLEMS);
    assert!(!settings.publish_schema_diagnostics);
}

#[tokio::test]
async fn test_missing_settings_file_is_an_error() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("absent.toml");

    let result = ConfigManager::load_settings(Some(&path)).await;

    assert!(matches!(result, Err(ConfigError::Io(_))));
}

#[test]
fn test_editor_payload_replaces_previous_editor_settings() {
    let base = Settings::default();

    let first = Settings::from_lsp_value(
        &base,
        &json!({ "xml": { "maxNumberOfProblems": 5, "publishSchemaDiagnostics": true } }),
    )
    .unwrap();
    assert_eq!(first.max_number_of_problems, 5);
    assert!(first.publish_schema_diagnostics);

    let second =
        Settings::from_lsp_value(&base, &json!({ "xml": { "schemaLocations": ["xsd"] } })).unwrap();
    assert_eq!(second.max_number_of_problems, DEFAULT_MAX_PROBLEMS);
    assert!(!second.publish_schema_diagnostics);
    assert_eq!(second.schema_locations, vec!["xsd"]);
}

#[test]
fn test_empty_payload_section_yields_base() {
    let base = Settings::default();

    let settings = Settings::from_lsp_value(&base, &json!({ "xml": {} })).unwrap();

    assert_eq!(settings, base);
    assert_eq!(settings.schema_locations, vec![DEFAULT_SCHEMA_LOCATION]);
}

#[test]
fn test_wrongly_typed_payload_is_rejected() {
    let result = Settings::from_lsp_value(
        &Settings::default(),
        &json!({ "xml": { "maxNumberOfProblems": "lots" } }),
    );

    assert!(matches!(result, Err(ConfigError::JsonParsing(_))));
}

#[test]
fn test_settings_serialize_with_editor_names() {
    let value = serde_json::to_value(Settings::default()).unwrap();

    assert_eq!(value["maxNumberOfProblems"], DEFAULT_MAX_PROBLEMS);
    assert_eq!(value["schemaLocations"][0], DEFAULT_SCHEMA_LOCATION);
    assert_eq!(value["publishSchemaDiagnostics"], false);
}
