//! Output and reporting for the `check` command

use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use crate::cli::{OutputFormat, VerbosityLevel};
use crate::diagnostics::{Diagnostic, Severity};

/// Diagnostics found for one file
#[derive(Debug, Clone, Serialize)]
pub struct FileReport {
    /// Where the diagnostics point; a schema file when schema problems are published
    pub path: PathBuf,
    pub diagnostics: Vec<Diagnostic>,
}

/// Result of a `check` run
#[derive(Debug, Clone, Default, Serialize)]
pub struct CheckReport {
    pub files: Vec<FileReport>,
    /// Number of documents checked
    pub checked_files: usize,
    pub schemas_known: usize,
    pub duration_ms: u128,
}

impl CheckReport {
    pub fn problem_count(&self) -> usize {
        self.files.iter().map(|file| file.diagnostics.len()).sum()
    }

    pub fn has_problems(&self) -> bool {
        self.problem_count() > 0
    }

    pub fn count_severity(&self, severity: Severity) -> usize {
        self.files
            .iter()
            .flat_map(|file| &file.diagnostics)
            .filter(|diag| diag.severity == severity)
            .count()
    }

    pub fn duration(&self) -> Duration {
        Duration::from_millis(self.duration_ms.min(u64::MAX as u128) as u64)
    }
}

/// Formatter for `check` results
pub struct Output {
    verbosity: VerbosityLevel,
    format: OutputFormat,
    show_colors: bool,
}

impl Output {
    pub fn new(verbosity: VerbosityLevel, format: OutputFormat) -> Self {
        Self {
            verbosity,
            format,
            show_colors: std::io::stdout().is_terminal(),
        }
    }

    pub fn without_colors(mut self) -> Self {
        self.show_colors = false;
        self
    }

    fn colorize(&self, text: &str, color: &str) -> String {
        if self.show_colors {
            format!("\x1b[{}m{}\x1b[0m", color, text)
        } else {
            text.to_string()
        }
    }

    pub fn format_report(&self, report: &CheckReport) -> String {
        match self.format {
            OutputFormat::Human => self.format_human(report),
            OutputFormat::Json => serde_json::to_string_pretty(report)
                .map(|json| json + "\n")
                .unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}\n", e)),
        }
    }

    fn format_human(&self, report: &CheckReport) -> String {
        let mut output = String::new();

        for file in &report.files {
            for diag in &file.diagnostics {
                output.push_str(&self.format_diagnostic(file, diag));
                output.push('\n');
            }
        }

        if self.verbosity > VerbosityLevel::Quiet {
            output.push_str(&self.format_summary(report));
        }

        output
    }

    pub fn format_diagnostic(&self, file: &FileReport, diag: &Diagnostic) -> String {
        let label = match diag.severity {
            Severity::Error => self.colorize("error", "31"),
            Severity::Warning => self.colorize("warning", "33"),
            Severity::Information => self.colorize("info", "36"),
        };

        format!(
            "{}:{}:{}: {}: {} [{}]",
            file.path.display(),
            diag.range.start.line + 1,
            diag.range.start.character + 1,
            label,
            diag.message,
            diag.source
        )
    }

    fn format_summary(&self, report: &CheckReport) -> String {
        let problems = report.problem_count();
        let mut output = String::new();

        if problems == 0 {
            output.push_str(&format!(
                "{} {} file{} checked, no problems\n",
                self.colorize("✓", "32"),
                report.checked_files,
                plural(report.checked_files)
            ));
        } else {
            output.push_str(&format!(
                "{} {} problem{} ({} error{}, {} warning{}) in {} file{}\n",
                self.colorize("✗", "31"),
                problems,
                plural(problems),
                report.count_severity(Severity::Error),
                plural(report.count_severity(Severity::Error)),
                report.count_severity(Severity::Warning),
                plural(report.count_severity(Severity::Warning)),
                report.checked_files,
                plural(report.checked_files)
            ));
        }

        if self.verbosity >= VerbosityLevel::Verbose {
            output.push_str(&format!("  Schemas known: {}\n", report.schemas_known));
            output.push_str(&format!(
                "  Duration: {}\n",
                format_duration(report.duration())
            ));
        }

        output
    }
}

fn plural(count: usize) -> &'static str {
    if count == 1 { "" } else { "s" }
}

fn format_duration(duration: Duration) -> String {
    let total_secs = duration.as_secs_f64();
    if total_secs < 1.0 {
        format!("{:.0}ms", duration.as_millis())
    } else if total_secs < 60.0 {
        format!("{:.2}s", total_secs)
    } else {
        let mins = (total_secs / 60.0) as u64;
        let secs = total_secs % 60.0;
        format!("{}m{:.1}s", mins, secs)
    }
}
