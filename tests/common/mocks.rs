use mockall::mock;

use validate_xml_lsp::SchemaValidator;
use validate_xml_lsp::error::Result;

// Mock validator for driving the orchestrator without libxml2
mock! {
    pub Validator {}

    impl SchemaValidator for Validator {
        fn validate(&self, document_text: &str, schema_text: &str) -> Result<Vec<String>>;
    }
}

/// Validator answering every call with the same raw lines
pub struct FixedValidator {
    lines: Vec<String>,
}

impl FixedValidator {
    pub fn new<S: Into<String>>(lines: impl IntoIterator<Item = S>) -> Self {
        Self {
            lines: lines.into_iter().map(Into::into).collect(),
        }
    }
}

impl SchemaValidator for FixedValidator {
    fn validate(&self, _document_text: &str, _schema_text: &str) -> Result<Vec<String>> {
        Ok(self.lines.clone())
    }
}

/// Raw document-origin lines in the validator grammar
pub fn xml_error_lines(count: usize) -> Vec<String> {
    (1..=count)
        .map(|i| {
            format!(
                "file_0.xml:{}:Schemas validity error:item:Element 'item': problem {}",
                i, i
            )
        })
        .collect()
}
