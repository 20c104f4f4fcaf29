use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tower_lsp::lsp_types::Url;

use validate_xml_lsp::{Orchestrator, SchemaValidator, Settings};

/// Schema for `urn:test`: a `root` element holding one `child` string
pub const TEST_SCHEMA: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema"
           targetNamespace="urn:test"
           xmlns="urn:test"
           elementFormDefault="qualified">
    <xs:element name="root">
        <xs:complexType>
            <xs:sequence>
                <xs:element name="child" type="xs:string"/>
            </xs:sequence>
        </xs:complexType>
    </xs:element>
</xs:schema>"#;

pub const VALID_DOCUMENT: &str = "<root xmlns=\"urn:test\">\n  <child>ok</child>\n</root>\n";

pub const INVALID_DOCUMENT: &str = "<root xmlns=\"urn:test\">\n  <wrong/>\n</root>\n";

pub const MALFORMED_DOCUMENT: &str = "<root xmlns=\"urn:test\">\n  <child>\n</root>\n";

/// Minimal schema declaring only a target namespace
pub fn namespace_only_schema(namespace: &str) -> String {
    format!(
        r#"<xs:schema xmlns:xs="http://www.w3.org/2001/XMLSchema" targetNamespace="{}"/>"#,
        namespace
    )
}

/// Scratch workspace laid out like an editor project
pub struct TestWorkspace {
    dir: TempDir,
}

impl TestWorkspace {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root().join(relative);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(&path, content).unwrap();
        path
    }

    pub fn remove(&self, relative: &str) {
        fs::remove_file(self.root().join(relative)).unwrap();
    }

    pub fn uri(&self, relative: &str) -> Url {
        Url::from_file_path(self.root().join(relative)).unwrap()
    }

    /// Orchestrator searching `schemas/` under this workspace
    pub fn orchestrator(&self, validator: Arc<dyn SchemaValidator>, settings: Settings) -> Orchestrator {
        Orchestrator::new(validator, settings).with_workspace_root(Some(self.root().to_path_buf()))
    }
}

/// Settings searching `schemas/` with the given budget
pub fn settings_with_budget(max: usize) -> Settings {
    Settings {
        max_number_of_problems: max,
        schema_locations: vec!["schemas".to_string()],
        ..Settings::default()
    }
}
