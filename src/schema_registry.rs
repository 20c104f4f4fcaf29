//! Namespace to schema-file registry built by scanning the configured search
//! locations.
//!
//! Every rescan publishes a fresh immutable [`RegistrySnapshot`]; readers hold
//! on to the snapshot they started with while a rescan swaps in the next one.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock};
use regex::Regex;
use serde::Serialize;
use tower_lsp::lsp_types::Url;

use crate::error::{Result, ServerError};
use crate::file_discovery::FileDiscovery;

/// Cached regex for targetNamespace extraction
static TARGET_NAMESPACE_REGEX: OnceLock<Regex> = OnceLock::new();

fn target_namespace_regex() -> &'static Regex {
    TARGET_NAMESPACE_REGEX.get_or_init(|| {
        Regex::new(r#"targetNamespace\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("Failed to compile targetNamespace regex")
    })
}

/// Extract the first `targetNamespace` attribute value from schema text
pub fn extract_target_namespace(schema_text: &str) -> Option<String> {
    let caps = target_namespace_regex().captures(schema_text)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str().to_string())
        .filter(|ns| !ns.is_empty())
}

/// A discovered schema file registered under its target namespace
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SchemaEntry {
    pub target_namespace: String,
    /// `file://` URI of the schema
    pub location: String,
    pub path: PathBuf,
}

/// Kind of a configured search location
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchLocation {
    /// Local directory or file, already resolved against the workspace root
    Local(PathBuf),
    /// Remote URI; downloading schemas is not supported
    Remote(String),
}

impl SearchLocation {
    /// Classify a configured location string
    pub fn resolve(location: &str, workspace_root: Option<&Path>) -> Result<Self> {
        let lowered = location.to_ascii_lowercase();
        if ["http://", "https://", "ftp://"]
            .iter()
            .any(|scheme| lowered.starts_with(scheme))
        {
            return Ok(SearchLocation::Remote(location.to_string()));
        }

        if lowered.starts_with("file://") {
            let url = Url::parse(location).map_err(|_| ServerError::UnsupportedLocation {
                location: location.to_string(),
            })?;
            let path = url
                .to_file_path()
                .map_err(|_| ServerError::UnsupportedLocation {
                    location: location.to_string(),
                })?;
            return Ok(SearchLocation::Local(path));
        }

        let path = PathBuf::from(location);
        if path.is_absolute() {
            return Ok(SearchLocation::Local(path));
        }

        match workspace_root {
            Some(root) => Ok(SearchLocation::Local(root.join(path))),
            None => Ok(SearchLocation::Local(path)),
        }
    }
}

/// Immutable view of the registry at the end of one scan
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrySnapshot {
    entries: BTreeMap<String, SchemaEntry>,
}

impl RegistrySnapshot {
    pub fn lookup(&self, namespace: &str) -> Option<&SchemaEntry> {
        self.entries.get(namespace)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn namespaces(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// What was last extracted from a schema file
#[derive(Debug, Clone)]
struct ScannedFile {
    modified: Option<SystemTime>,
    target_namespace: Option<String>,
}

/// Shared schema registry
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    current: RwLock<Arc<RegistrySnapshot>>,
    /// Per-file cache so unchanged schemas are not re-read on every rescan
    scanned: Mutex<HashMap<PathBuf, ScannedFile>>,
    discovery: RwLock<FileDiscovery>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose walks skip paths matching `exclude_patterns`
    pub fn with_exclude_patterns(exclude_patterns: &[String]) -> Result<Self> {
        let registry = Self::new();
        registry.set_exclude_patterns(exclude_patterns)?;
        Ok(registry)
    }

    pub fn set_exclude_patterns(&self, exclude_patterns: &[String]) -> Result<()> {
        let discovery = FileDiscovery::new().with_exclude_patterns(exclude_patterns)?;
        *self.discovery.write() = discovery;
        Ok(())
    }

    /// Rescan every search location and publish the resulting mapping.
    ///
    /// Never fails: unreadable locations and files are logged and skipped.
    /// When two files declare the same namespace the one scanned last wins.
    pub fn rescan<S: AsRef<str>>(&self, search_locations: &[S], workspace_root: Option<&Path>) {
        tracing::debug!("Checking for new schemas");

        let discovery = self.discovery.read().clone();
        let mut entries = BTreeMap::new();
        let mut scanned = self.scanned.lock();
        let mut seen = HashMap::with_capacity(scanned.len());

        for location in search_locations {
            let location = location.as_ref();
            let root = match SearchLocation::resolve(location, workspace_root) {
                Ok(SearchLocation::Local(root)) => root,
                Ok(SearchLocation::Remote(uri)) => {
                    tracing::debug!("Skipping remote schema location {}", uri);
                    continue;
                }
                Err(e) => {
                    tracing::warn!("{}", e);
                    continue;
                }
            };

            let files = match discovery.discover(&root) {
                Ok(files) => files,
                Err(e) => {
                    tracing::warn!("Cannot scan schema location {}: {}", root.display(), e);
                    continue;
                }
            };

            for file in files {
                let state = match Self::scan_file(&file, scanned.get(&file)) {
                    Ok(state) => state,
                    Err(e) => {
                        tracing::warn!("{}", e);
                        continue;
                    }
                };

                if let Some(namespace) = &state.target_namespace {
                    let location = Url::from_file_path(&file)
                        .map(|url| url.to_string())
                        .unwrap_or_else(|_| file.display().to_string());
                    entries.insert(
                        namespace.clone(),
                        SchemaEntry {
                            target_namespace: namespace.clone(),
                            location,
                            path: file.clone(),
                        },
                    );
                }
                seen.insert(file, state);
            }
        }

        *scanned = seen;
        let snapshot = RegistrySnapshot { entries };
        tracing::debug!("Schema registry holds {} namespace(s)", snapshot.len());
        *self.current.write() = Arc::new(snapshot);
    }

    fn scan_file(path: &Path, previous: Option<&ScannedFile>) -> Result<ScannedFile> {
        let modified = std::fs::metadata(path)
            .and_then(|meta| meta.modified())
            .ok();

        if let Some(previous) = previous
            && previous.modified.is_some()
            && previous.modified == modified
        {
            return Ok(previous.clone());
        }

        tracing::debug!("Adding schema '{}'", path.display());
        let content = std::fs::read(path).map_err(|source| ServerError::SchemaRead {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(ScannedFile {
            modified,
            target_namespace: extract_target_namespace(&String::from_utf8_lossy(&content)),
        })
    }

    /// Schema registered for a namespace in the current snapshot
    pub fn lookup(&self, namespace: &str) -> Option<SchemaEntry> {
        self.current.read().lookup(namespace).cloned()
    }

    /// Current immutable snapshot
    pub fn snapshot(&self) -> Arc<RegistrySnapshot> {
        Arc::clone(&self.current.read())
    }

    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }
}
