//! validate-xml-lsp executable
//!
//! - `serve` (default): language server on stdin/stdout
//! - `check`: validate files on disk and print the diagnostics

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use tower_lsp::{LspService, Server};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use validate_xml_lsp::{
    Backend, CheckArgs, Cli, Command, ConfigManager, LibXml2Validator, Orchestrator, Output,
    Settings, VerbosityLevel, check_paths,
};

fn init_logging(verbosity: VerbosityLevel) {
    let default_level = match verbosity {
        VerbosityLevel::Quiet => "warn",
        VerbosityLevel::Normal => "info",
        VerbosityLevel::Verbose => "debug",
    };

    // stdout carries the LSP transport
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        tracing::error!("Panic: {}", info);
    }));
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    init_logging(cli.verbosity());
    install_panic_hook();

    cli.validate().map_err(anyhow::Error::msg)?;

    let settings = ConfigManager::load_settings(cli.config.as_deref())
        .await
        .context("Failed to load settings")?;

    match cli.command() {
        Command::Serve => {
            serve(settings).await;
            Ok(ExitCode::SUCCESS)
        }
        Command::Check(args) => check(settings, &args, cli.verbosity()),
    }
}

async fn serve(settings: Settings) {
    tracing::info!("Starting validate-xml-lsp {}", env!("CARGO_PKG_VERSION"));

    let orchestrator = Arc::new(Orchestrator::new(
        Arc::new(LibXml2Validator::new()),
        settings,
    ));

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) =
        LspService::new(|client| Backend::new(client, Arc::clone(&orchestrator)));
    Server::new(stdin, stdout, socket).serve(service).await;
}

fn check(settings: Settings, args: &CheckArgs, verbosity: VerbosityLevel) -> Result<ExitCode> {
    let settings = ConfigManager::merge_with_cli(settings, args);
    ConfigManager::validate_settings(&settings).context("Invalid check arguments")?;

    let orchestrator = Orchestrator::new(Arc::new(LibXml2Validator::new()), settings)
        .with_workspace_root(Some(args.workspace_root()));

    let report = check_paths(&orchestrator, &args.files).context("Check failed")?;

    let output = Output::new(verbosity, args.output_format);
    print!("{}", output.format_report(&report));

    Ok(if report.has_problems() {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}
