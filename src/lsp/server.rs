//! tower-lsp `LanguageServer` implementation

use super::convert;
use crate::orchestrator::{Orchestrator, Publication};
use std::path::PathBuf;
use std::sync::Arc;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};

/// Language server forwarding editor events to the orchestrator
pub struct Backend {
    /// LSP client for sending notifications
    client: Client,
    orchestrator: Arc<Orchestrator>,
}

impl Backend {
    pub fn new(client: Client, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            client,
            orchestrator,
        }
    }

    /// Full document sync, nothing else
    pub fn capabilities() -> ServerCapabilities {
        ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Options(
                TextDocumentSyncOptions {
                    open_close: Some(true),
                    change: Some(TextDocumentSyncKind::FULL),
                    will_save: None,
                    will_save_wait_until: None,
                    save: None,
                },
            )),
            ..ServerCapabilities::default()
        }
    }

    async fn publish(&self, publications: Vec<Publication>) {
        for publication in publications {
            let diagnostics = publication
                .diagnostics
                .iter()
                .map(convert::to_lsp_diagnostic)
                .collect();
            self.client
                .publish_diagnostics(publication.uri, diagnostics, publication.version)
                .await;
        }
    }
}

fn workspace_root(params: &InitializeParams) -> Option<PathBuf> {
    let folder_uri = params
        .workspace_folders
        .as_ref()
        .and_then(|folders| folders.first())
        .map(|folder| &folder.uri);

    params
        .root_uri
        .as_ref()
        .or(folder_uri)
        .and_then(|uri| uri.to_file_path().ok())
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        let root = workspace_root(&params);
        tracing::info!(
            "Initializing for workspace {}",
            root.as_ref()
                .map(|root| root.display().to_string())
                .unwrap_or_else(|| "<none>".to_string())
        );
        self.orchestrator.set_workspace_root(root);

        match &params.initialization_options {
            Some(options) => {
                self.orchestrator.on_configuration_changed(options);
            }
            None => self.orchestrator.rescan(),
        }

        Ok(InitializeResult {
            capabilities: Self::capabilities(),
            server_info: Some(ServerInfo {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        tracing::info!(
            "Initialized with {} schema(s)",
            self.orchestrator.registry().len()
        );
        self.client
            .log_message(MessageType::INFO, "validate-xml-lsp ready")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        tracing::info!("Shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let document = params.text_document;
        tracing::debug!("Document opened: {}", document.uri);

        let publications =
            self.orchestrator
                .on_document_changed(document.uri, document.version, document.text);
        self.publish(publications).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        let version = params.text_document.version;

        // Full sync: the last change carries the whole text
        if let Some(change) = params.content_changes.into_iter().last() {
            let publications = self
                .orchestrator
                .on_document_changed(uri, version, change.text);
            self.publish(publications).await;
        }
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        let uri = params.text_document.uri;
        tracing::debug!("Document closed: {}", uri);

        let publications = self.orchestrator.on_document_closed(&uri);
        self.publish(publications).await;
    }

    async fn did_change_configuration(&self, params: DidChangeConfigurationParams) {
        let publications = self.orchestrator.on_configuration_changed(&params.settings);
        self.publish(publications).await;
    }
}
