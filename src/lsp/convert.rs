//! Type conversions from server types to LSP types

use crate::diagnostics::{Diagnostic, Severity};
use crate::document::{Position, Range};
use tower_lsp::lsp_types::{
    Diagnostic as LspDiagnostic, DiagnosticSeverity as LspDiagnosticSeverity,
    Position as LspPosition, Range as LspRange,
};

/// Convert diagnostic to LSP diagnostic
pub fn to_lsp_diagnostic(diag: &Diagnostic) -> LspDiagnostic {
    LspDiagnostic {
        range: to_lsp_range(&diag.range),
        severity: Some(to_lsp_severity(diag.severity)),
        code: None,
        code_description: None,
        source: Some(diag.source.clone()),
        message: diag.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}

fn to_lsp_severity(severity: Severity) -> LspDiagnosticSeverity {
    match severity {
        Severity::Error => LspDiagnosticSeverity::ERROR,
        Severity::Warning => LspDiagnosticSeverity::WARNING,
        Severity::Information => LspDiagnosticSeverity::INFORMATION,
    }
}

pub fn to_lsp_position(position: Position) -> LspPosition {
    LspPosition {
        line: position.line,
        character: position.character,
    }
}

pub fn to_lsp_range(range: &Range) -> LspRange {
    LspRange {
        start: to_lsp_position(range.start),
        end: to_lsp_position(range.end),
    }
}
