use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Verbosity levels for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum VerbosityLevel {
    /// Only show problems
    Quiet,
    /// Show standard information
    #[default]
    Normal,
    /// Show detailed information
    Verbose,
}

/// Output format of the `check` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Human,
    Json,
}

/// Language server validating XML documents against the XSD schemas of the workspace
#[derive(Parser, Debug, Clone)]
#[command(name = "validate-xml-lsp")]
#[command(
    about = "Validate XML documents against workspace XSD schemas, as a language server or from the command line"
)]
#[command(version)]
pub struct Cli {
    /// Settings file (TOML or JSON)
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short = 'v', long = "verbose", global = true)]
    pub verbose: bool,

    /// Only log warnings and errors
    #[arg(
        short = 'q',
        long = "quiet",
        global = true,
        conflicts_with = "verbose"
    )]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Run the language server on stdin/stdout (default)
    Serve,
    /// Validate files on disk and print their diagnostics
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone, PartialEq)]
pub struct CheckArgs {
    /// XML files to validate
    #[arg(required = true, value_name = "FILES")]
    pub files: Vec<PathBuf>,

    /// Directory searched for schemas (repeatable)
    #[arg(
        short = 's',
        long = "schema-location",
        value_name = "DIR",
        action = clap::ArgAction::Append
    )]
    pub schema_locations: Vec<String>,

    /// Exclude schema file patterns (glob syntax)
    #[arg(long = "exclude", value_name = "GLOB", action = clap::ArgAction::Append)]
    pub exclude_patterns: Vec<String>,

    /// Maximum number of problems reported per file
    #[arg(short = 'm', long = "max-problems", value_name = "N")]
    pub max_problems: Option<usize>,

    /// Directory relative schema locations are resolved against
    #[arg(short = 'w', long = "workspace-root", value_name = "DIR")]
    pub workspace_root: Option<PathBuf>,

    /// Output format
    #[arg(short = 'f', long = "format", value_enum, default_value = "human")]
    pub output_format: OutputFormat,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Subcommand to run; serving is the default
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Serve)
    }

    pub fn verbosity(&self) -> VerbosityLevel {
        if self.quiet {
            VerbosityLevel::Quiet
        } else if self.verbose {
            VerbosityLevel::Verbose
        } else {
            VerbosityLevel::Normal
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if let Some(config) = &self.config
            && !config.is_file()
        {
            return Err(format!("Settings file does not exist: {}", config.display()));
        }

        if let Some(Command::Check(args)) = &self.command {
            for file in &args.files {
                if !file.exists() {
                    return Err(format!("Path does not exist: {}", file.display()));
                }
            }
            if let Some(root) = &args.workspace_root
                && !root.is_dir()
            {
                return Err(format!(
                    "Workspace root is not a directory: {}",
                    root.display()
                ));
            }
        }
        Ok(())
    }
}

impl CheckArgs {
    /// Workspace root, defaulting to the current directory
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .clone()
            .or_else(|| std::env::current_dir().ok())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
