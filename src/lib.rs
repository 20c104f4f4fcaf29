//! # validate-xml-lsp Library
//!
//! Language server that validates open XML documents against the XSD schemas
//! found in the workspace, matched by target namespace, and reports problems
//! as diagnostics. Validation itself is done by libxml2.

pub mod check;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod document;
pub mod error;
pub mod file_discovery;
pub mod libxml2;
pub mod lsp;
pub mod namespace_scanner;
pub mod orchestrator;
pub mod output;
pub mod schema_registry;
pub mod validation;

pub use check::{check_paths, collect_documents};
pub use cli::{CheckArgs, Cli, Command, OutputFormat, VerbosityLevel};
pub use config::{ConfigError, ConfigManager, Settings, SettingsLayer};
pub use diagnostics::{Diagnostic, Origin, ParsedErrorLine, Severity, TaggedDiagnostic};
pub use document::{DocumentStore, Position, Range, TextDocument};
pub use error::{LibXml2Error, ServerError};
pub use file_discovery::FileDiscovery;
pub use libxml2::{LibXml2Wrapper, ValidationResult, XmlSchemaPtr};
pub use lsp::Backend;
pub use namespace_scanner::UsedNamespace;
pub use orchestrator::{Orchestrator, Publication};
pub use output::{CheckReport, FileReport, Output};
pub use schema_registry::{RegistrySnapshot, SchemaEntry, SchemaRegistry, SearchLocation};
pub use validation::{LibXml2Validator, SchemaValidator};
