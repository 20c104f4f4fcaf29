//! Validation invoker
//!
//! The orchestrator never talks to libxml2 directly. It goes through the
//! [`SchemaValidator`] capability, which turns a document and a schema into
//! raw error lines (see [`crate::libxml2`] for their grammar). Failures of the
//! capability are logged and degrade to "no errors" for that schema.

use std::path::Path;
use std::sync::Arc;

use moka::sync::Cache;

use crate::error::{Result, ServerError};
use crate::libxml2::{LibXml2Wrapper, XmlSchemaPtr};

/// Parsed schemas kept in memory, keyed by schema text
const DEFAULT_SCHEMA_CACHE_CAPACITY: u64 = 64;

/// Validates a document's text against a schema's text
#[cfg_attr(test, mockall::automock)]
pub trait SchemaValidator: Send + Sync {
    /// Return the raw error lines produced for `document_text`, including the
    /// lines produced while parsing `schema_text`
    fn validate(&self, document_text: &str, schema_text: &str) -> Result<Vec<String>>;
}

/// Outcome of parsing one schema text
#[derive(Debug)]
struct ParsedSchema {
    /// `None` when libxml2 rejected the schema
    schema: Option<XmlSchemaPtr>,
    errors: Vec<String>,
}

/// libxml2-backed validator with a bounded cache of parsed schemas
pub struct LibXml2Validator {
    wrapper: LibXml2Wrapper,
    schemas: Cache<String, Arc<ParsedSchema>>,
}

impl LibXml2Validator {
    pub fn new() -> Self {
        Self::with_cache_capacity(DEFAULT_SCHEMA_CACHE_CAPACITY)
    }

    pub fn with_cache_capacity(max_capacity: u64) -> Self {
        Self {
            wrapper: LibXml2Wrapper::new(),
            schemas: Cache::builder().max_capacity(max_capacity).build(),
        }
    }

    /// Parse a schema, or reuse the result of an earlier parse of the same text.
    ///
    /// Failed parses are cached too so their error lines are reported on
    /// every validation.
    fn parsed_schema(&self, schema_text: &str) -> Arc<ParsedSchema> {
        self.schemas.get_with(schema_text.to_string(), || {
            let mut errors = Vec::new();
            let schema = match self
                .wrapper
                .parse_schema_with_errors(schema_text.as_bytes(), &mut errors)
            {
                Ok(schema) => Some(schema),
                Err(e) => {
                    tracing::debug!("Schema rejected by libxml2: {}", e);
                    None
                }
            };
            Arc::new(ParsedSchema { schema, errors })
        })
    }
}

impl Default for LibXml2Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl SchemaValidator for LibXml2Validator {
    fn validate(&self, document_text: &str, schema_text: &str) -> Result<Vec<String>> {
        let parsed = self.parsed_schema(schema_text);
        let mut lines = parsed.errors.clone();

        if let Some(schema) = &parsed.schema {
            let result = self
                .wrapper
                .validate_memory(schema, document_text.as_bytes())?;
            lines.extend(result.into_errors());
        }

        Ok(lines)
    }
}

/// Read a schema file from disk
pub fn read_schema(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|source| ServerError::SchemaRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Validate a document against the schema stored at `schema_path`.
///
/// Never fails: unreadable schemas and validator errors are logged and yield
/// no lines for this schema.
pub fn invoke(
    validator: &dyn SchemaValidator,
    document_text: &str,
    schema_path: &Path,
    namespace: &str,
) -> Vec<String> {
    let schema_text = match read_schema(schema_path) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!("Cannot read schema for '{}': {}", namespace, e);
            return Vec::new();
        }
    };

    match validator.validate(document_text, &schema_text) {
        Ok(lines) => {
            tracing::debug!(
                "Validation against '{}' produced {} line(s)",
                namespace,
                lines.len()
            );
            lines
        }
        Err(e) => {
            tracing::warn!("Validation against '{}' failed: {}", namespace, e);
            Vec::new()
        }
    }
}
