//! Translation of raw validator output into position-anchored diagnostics.
//!
//! Raw lines follow the grammar `<stem>.<ext>:<line>:<kind>:<detail>:<message>`.
//! The extension tells where the problem is: `xml` lines point into the
//! validated document, `xsd` lines into the schema. Anything else is
//! unrecognized output.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::document::{Position, Range, TextDocument};

/// Source reported for problems the server itself detects
pub const SOURCE_XMLLINT: &str = "xmlLint";
/// Source reported for unrecognized validator output
pub const SOURCE_UNKNOWN: &str = "unknown";

/// Columns used when a problem cannot be pinned to a token
const PLACEHOLDER_START: u32 = 1;
const PLACEHOLDER_END: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Information,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Information => "info",
        };
        f.write_str(label)
    }
}

/// Where a diagnostic belongs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Origin {
    /// The schema file
    Xsd,
    /// The validated document
    Xml,
    Unknown,
}

impl Origin {
    fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "xsd" => Some(Origin::Xsd),
            "xml" => Some(Origin::Xml),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Origin::Xsd => "xsd",
            Origin::Xml => "xml",
            Origin::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub message: String,
    pub range: Range,
    pub source: String,
    pub severity: Severity,
}

impl Diagnostic {
    /// Warning for a declared namespace that no known schema targets
    pub fn schema_not_found<S: AsRef<str>>(uri: &str, range: Range, search_locations: &[S]) -> Self {
        let locations = search_locations
            .iter()
            .map(|location| location.as_ref())
            .collect::<Vec<_>>()
            .join("', '");

        Self {
            message: format!(
                "Could not find schema for uri '{}'.\nMake sure your schema is located in '{}'",
                uri, locations
            ),
            range,
            source: SOURCE_XMLLINT.to_string(),
            severity: Severity::Warning,
        }
    }
}

/// A diagnostic together with where it belongs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaggedDiagnostic {
    pub origin: Origin,
    pub diagnostic: Diagnostic,
}

/// One raw validator line split into its fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedErrorLine<'a> {
    pub stem: &'a str,
    pub origin: Origin,
    /// One-based line as reported by the validator
    pub line: u32,
    pub kind: &'a str,
    pub detail: &'a str,
    pub message: &'a str,
}

impl<'a> ParsedErrorLine<'a> {
    /// Split a raw line, or `None` when it does not follow the grammar
    pub fn parse(raw: &'a str) -> Option<Self> {
        let mut fields = raw.trim_end_matches(['\r', '\n']).splitn(5, ':');

        let file = fields.next()?;
        let line = fields.next()?;
        let kind = fields.next()?;
        let detail = fields.next()?;
        let message = fields.next()?;

        let (stem, extension) = file.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        let origin = Origin::from_extension(extension)?;

        let line = line.trim();
        if line.is_empty() || !line.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let line = line.parse().ok()?;

        Some(Self {
            stem,
            origin,
            line,
            kind,
            detail,
            message,
        })
    }

    /// Zero-based line
    pub fn zero_based_line(&self) -> u32 {
        self.line.saturating_sub(1)
    }

    /// Token to look for in the document: the quoted name inside the detail
    /// when there is one, otherwise the whole detail
    pub fn detail_token(&self) -> &'a str {
        let detail = self.detail.trim();
        if let Some((_, rest)) = detail.split_once('\'')
            && let Some((name, _)) = rest.split_once('\'')
            && !name.is_empty()
        {
            return name;
        }
        detail
    }
}

/// Severity implied by a kind field; `warning` beats `error`
pub fn classify_severity(kind: &str) -> Severity {
    let kind = kind.to_lowercase();
    if kind.contains("warning") {
        Severity::Warning
    } else if kind.contains("error") {
        Severity::Error
    } else {
        Severity::Information
    }
}

/// Translate one raw validator line into a diagnostic for `document` (or for
/// the schema targeting `namespace`)
pub fn translate(raw: &str, document: &TextDocument, namespace: &str) -> TaggedDiagnostic {
    let Some(parsed) = ParsedErrorLine::parse(raw) else {
        return TaggedDiagnostic {
            origin: Origin::Unknown,
            diagnostic: Diagnostic {
                message: format!("Unrecognized validator output: {}", raw.trim()),
                range: Range::on_line(0, PLACEHOLDER_START, PLACEHOLDER_END),
                source: SOURCE_UNKNOWN.to_string(),
                severity: Severity::Information,
            },
        };
    };

    let line = parsed.zero_based_line();

    let diagnostic = match parsed.origin {
        Origin::Xsd => Diagnostic {
            message: format!(
                "{}:{}:{}",
                parsed.kind.trim(),
                parsed.detail.trim(),
                parsed.message.trim()
            ),
            range: Range::on_line(line, PLACEHOLDER_START, PLACEHOLDER_END),
            source: namespace.to_string(),
            severity: Severity::Warning,
        },
        Origin::Xml | Origin::Unknown => {
            let message = match parsed.message.trim() {
                "" => parsed.kind.trim(),
                message => message,
            };
            Diagnostic {
                message: message.to_string(),
                range: token_range(document, line, parsed.detail_token()),
                source: namespace.to_string(),
                severity: classify_severity(parsed.kind),
            }
        }
    };

    TaggedDiagnostic {
        origin: parsed.origin,
        diagnostic,
    }
}

/// Span of the first occurrence of `token` on `line`, or the placeholder range
fn token_range(document: &TextDocument, line: u32, token: &str) -> Range {
    if !token.is_empty()
        && let Some(text) = document.line_text(line)
        && let Some(column) = text.find(token)
    {
        let line_start = document.offset_at(Position::new(line, 0));
        let start = line_start + column;
        return document.range_of(start, start + token.len());
    }

    Range::on_line(line, PLACEHOLDER_START, PLACEHOLDER_END)
}
