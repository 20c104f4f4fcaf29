//! Orchestrator
//!
//! Owns the settings, the schema registry and the open documents, and turns
//! editor events into sets of diagnostics to publish:
//!
//! - **configuration changed**: swap the settings, rescan schemas, revalidate
//!   every open document
//! - **document changed**: rescan schemas, validate that document
//! - **document closed**: forget it and clear its diagnostics
//!
//! Schema files that received diagnostics on behalf of a document are
//! remembered, and cleared once no open document publishes to them anymore.
//!
//! The orchestrator never talks to the editor itself; it returns
//! [`Publication`]s for the caller to send.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tower_lsp::lsp_types::Url;

use crate::config::Settings;
use crate::diagnostics::{self, Diagnostic, Origin};
use crate::document::{DocumentStore, TextDocument};
use crate::namespace_scanner;
use crate::schema_registry::SchemaRegistry;
use crate::validation::{self, SchemaValidator};

/// Diagnostics replacing everything previously published for `uri`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Publication {
    pub uri: Url,
    /// Version of the validated document; `None` for schema files
    pub version: Option<i32>,
    pub diagnostics: Vec<Diagnostic>,
}

impl Publication {
    fn cleared(uri: Url) -> Self {
        Self {
            uri,
            version: None,
            diagnostics: Vec::new(),
        }
    }
}

/// Running cap on the diagnostics emitted for one document
struct ProblemBudget {
    remaining: usize,
}

impl ProblemBudget {
    fn new(max: usize) -> Self {
        Self { remaining: max }
    }

    /// Move as much of `batch` into `target` as the budget allows
    fn admit(&mut self, target: &mut Vec<Diagnostic>, batch: Vec<Diagnostic>) {
        let take = batch.len().min(self.remaining);
        target.extend(batch.into_iter().take(take));
        self.remaining -= take;
    }

    fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }
}

pub struct Orchestrator {
    /// Settings from defaults, settings file and environment
    base_settings: Arc<Settings>,
    settings: RwLock<Arc<Settings>>,
    workspace_root: RwLock<Option<PathBuf>>,
    registry: SchemaRegistry,
    documents: DocumentStore,
    validator: Arc<dyn SchemaValidator>,
    /// Schema files each document last published diagnostics to
    schema_publications: Mutex<HashMap<Url, BTreeSet<Url>>>,
}

impl Orchestrator {
    pub fn new(validator: Arc<dyn SchemaValidator>, base_settings: Settings) -> Self {
        let registry = SchemaRegistry::with_exclude_patterns(&base_settings.exclude_patterns)
            .unwrap_or_else(|e| {
                tracing::warn!("Ignoring exclude patterns: {}", e);
                SchemaRegistry::new()
            });
        let base_settings = Arc::new(base_settings);

        Self {
            settings: RwLock::new(Arc::clone(&base_settings)),
            base_settings,
            workspace_root: RwLock::new(None),
            registry,
            documents: DocumentStore::new(),
            validator,
            schema_publications: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_workspace_root(self, root: Option<PathBuf>) -> Self {
        *self.workspace_root.write() = root;
        self
    }

    pub fn set_workspace_root(&self, root: Option<PathBuf>) {
        *self.workspace_root.write() = root;
    }

    pub fn workspace_root(&self) -> Option<PathBuf> {
        self.workspace_root.read().clone()
    }

    /// Current settings snapshot
    pub fn settings(&self) -> Arc<Settings> {
        Arc::clone(&self.settings.read())
    }

    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    /// Replace the settings and rescan the schema locations
    pub fn apply_settings(&self, settings: Settings) {
        if let Err(e) = self.registry.set_exclude_patterns(&settings.exclude_patterns) {
            tracing::warn!("Keeping previous exclude patterns: {}", e);
        }
        *self.settings.write() = Arc::new(settings);
        self.rescan();
    }

    /// Handle a settings payload from the editor.
    ///
    /// An invalid payload is logged and the current settings stay in effect.
    pub fn on_configuration_changed(&self, payload: &serde_json::Value) -> Vec<Publication> {
        match Settings::from_lsp_value(&self.base_settings, payload) {
            Ok(settings) => {
                tracing::info!(
                    "Settings changed: {} schema location(s), max {} problem(s)",
                    settings.schema_locations.len(),
                    settings.problem_limit()
                );
                self.apply_settings(settings);
            }
            Err(e) => {
                tracing::warn!("Ignoring invalid settings: {}", e);
                self.rescan();
            }
        }

        self.documents
            .all()
            .iter()
            .flat_map(|document| self.validate_document(document))
            .collect()
    }

    /// Store the new full content of a document and validate it
    pub fn on_document_changed(&self, uri: Url, version: i32, text: String) -> Vec<Publication> {
        let document = self.documents.upsert(uri, version, text);
        self.rescan();
        self.validate_document(&document)
    }

    /// Forget a closed document. Clears its diagnostics and those of the
    /// schema files only it published to.
    pub fn on_document_closed(&self, uri: &Url) -> Vec<Publication> {
        self.documents.close(uri);

        let mut published = self.schema_publications.lock();
        let previous = published.remove(uri).unwrap_or_default();

        let mut publications = vec![Publication::cleared(uri.clone())];
        publications.extend(stale_schema_publications(&published, previous));
        publications
    }

    /// Rescan the schema locations of the current settings
    pub fn rescan(&self) {
        let settings = self.settings();
        let root = self.workspace_root();
        self.registry
            .rescan(&settings.schema_locations, root.as_deref());
    }

    /// Validate one document against the schemas of the namespaces it uses.
    ///
    /// Always yields a publication for the document, empty when the pass
    /// panicked.
    pub fn validate_document(&self, document: &TextDocument) -> Vec<Publication> {
        let publications = self.run_validation_guarded(document);
        self.clear_stale_schema_publications(document.uri(), publications)
    }

    fn run_validation_guarded(&self, document: &TextDocument) -> Vec<Publication> {
        match catch_unwind(AssertUnwindSafe(|| self.run_validation(document))) {
            Ok(publications) => publications,
            Err(panic) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                tracing::error!("Validation of {} panicked: {}", document.uri(), reason);

                let mut cleared = Publication::cleared(document.uri().clone());
                cleared.version = Some(document.version());
                vec![cleared]
            }
        }
    }

    /// Record the schema files this pass published to, and append an empty
    /// publication for each one the document dropped that no other document
    /// still publishes to
    fn clear_stale_schema_publications(
        &self,
        document_uri: &Url,
        mut publications: Vec<Publication>,
    ) -> Vec<Publication> {
        let current = publications
            .iter()
            .filter(|publication| publication.uri != *document_uri)
            .map(|publication| publication.uri.clone())
            .collect::<BTreeSet<_>>();

        let mut published = self.schema_publications.lock();
        let previous = if current.is_empty() {
            published.remove(document_uri)
        } else {
            published.insert(document_uri.clone(), current)
        }
        .unwrap_or_default();

        publications.extend(stale_schema_publications(&published, previous));
        publications
    }

    fn run_validation(&self, document: &TextDocument) -> Vec<Publication> {
        let settings = self.settings();
        let registry = self.registry.snapshot();
        let max_problems = settings.problem_limit();

        let mut budget = ProblemBudget::new(max_problems);
        let mut document_diagnostics = Vec::new();
        let mut schema_publications = Vec::new();
        let mut visited = HashSet::new();

        for used in namespace_scanner::scan(document).into_values() {
            if budget.is_exhausted() {
                tracing::debug!("Problem budget of {} exhausted", max_problems);
                break;
            }
            if !visited.insert(used.uri.clone()) {
                continue;
            }

            let Some(entry) = registry.lookup(&used.uri) else {
                budget.admit(
                    &mut document_diagnostics,
                    vec![Diagnostic::schema_not_found(
                        &used.uri,
                        used.range,
                        &settings.schema_locations,
                    )],
                );
                continue;
            };

            let lines = validation::invoke(
                self.validator.as_ref(),
                document.text(),
                &entry.path,
                &used.uri,
            );

            let mut xml = Vec::new();
            let mut xsd = Vec::new();
            for line in &lines {
                let tagged = diagnostics::translate(line, document, &used.uri);
                match tagged.origin {
                    Origin::Xml => xml.push(tagged.diagnostic),
                    Origin::Xsd => xsd.push(tagged.diagnostic),
                    Origin::Unknown => {
                        tracing::warn!("Dropping unrecognized validator output: {}", line)
                    }
                }
            }

            budget.admit(&mut document_diagnostics, xml);

            if settings.publish_schema_diagnostics {
                if let Some(uri) = schema_uri(&entry.path) {
                    xsd.truncate(max_problems);
                    schema_publications.push(Publication {
                        uri,
                        version: None,
                        diagnostics: xsd,
                    });
                }
            } else if !xsd.is_empty() {
                tracing::debug!(
                    "Withholding {} problem(s) found in schema {}",
                    xsd.len(),
                    entry.path.display()
                );
            }
        }

        tracing::debug!(
            "{} problem(s) in {}",
            document_diagnostics.len(),
            document.uri()
        );

        let mut publications = vec![Publication {
            uri: document.uri().clone(),
            version: Some(document.version()),
            diagnostics: document_diagnostics,
        }];
        publications.extend(schema_publications);
        publications
    }
}

/// Empty publications for the schema files in `previous` that no document in
/// `published` still claims
fn stale_schema_publications(
    published: &HashMap<Url, BTreeSet<Url>>,
    previous: BTreeSet<Url>,
) -> Vec<Publication> {
    previous
        .into_iter()
        .filter(|schema| !published.values().any(|uris| uris.contains(schema)))
        .inspect(|schema| tracing::debug!("Clearing diagnostics of schema {}", schema))
        .map(Publication::cleared)
        .collect()
}

fn schema_uri(path: &Path) -> Option<Url> {
    match Url::from_file_path(path) {
        Ok(uri) => Some(uri),
        Err(()) => {
            tracing::warn!("Cannot express {} as a URI", path.display());
            None
        }
    }
}
