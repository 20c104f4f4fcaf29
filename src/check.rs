//! One-shot validation of files on disk, used by the `check` command

use std::path::{Path, PathBuf};
use std::time::Instant;

use tower_lsp::lsp_types::Url;

use crate::document::TextDocument;
use crate::error::{Result, ServerError};
use crate::file_discovery::FileDiscovery;
use crate::orchestrator::Orchestrator;
use crate::output::{CheckReport, FileReport};

/// Expand the given paths into XML documents; directories are walked
pub fn collect_documents(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let discovery = FileDiscovery::new().with_extensions(vec!["xml".to_string()]);
    let mut documents = Vec::new();

    for path in paths {
        if path.is_file() {
            documents.push(path.clone());
        } else {
            documents.extend(discovery.discover(path)?);
        }
    }

    documents.sort();
    documents.dedup();
    Ok(documents)
}

fn document_uri(path: &Path) -> Result<Url> {
    let absolute = std::fs::canonicalize(path)?;
    Url::from_file_path(&absolute).map_err(|_| ServerError::InvalidDocumentUri {
        uri: absolute.display().to_string(),
    })
}

/// Validate every document under `paths` with the orchestrator's settings.
///
/// Unreadable documents are logged and skipped.
pub fn check_paths(orchestrator: &Orchestrator, paths: &[PathBuf]) -> Result<CheckReport> {
    let start = Instant::now();
    orchestrator.rescan();

    let documents = collect_documents(paths)?;
    let mut report = CheckReport {
        schemas_known: orchestrator.registry().len(),
        ..CheckReport::default()
    };

    for path in &documents {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Cannot read {}: {}", path.display(), e);
                continue;
            }
        };
        let uri = document_uri(path)?;
        let document = TextDocument::new(uri, 0, text);
        report.checked_files += 1;

        for publication in orchestrator.validate_document(&document) {
            if publication.diagnostics.is_empty() {
                continue;
            }
            let path = if publication.uri == *document.uri() {
                path.clone()
            } else {
                publication
                    .uri
                    .to_file_path()
                    .unwrap_or_else(|_| PathBuf::from(publication.uri.as_str()))
            };
            report.files.push(FileReport {
                path,
                diagnostics: publication.diagnostics,
            });
        }
    }

    report.duration_ms = start.elapsed().as_millis();
    tracing::debug!(
        "Checked {} document(s) in {}ms",
        report.checked_files,
        report.duration_ms
    );
    Ok(report)
}
