use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::document::{Range, TextDocument};

/// Cached regex for `xmlns` / `xmlns:prefix` declarations
static XMLNS_REGEX: OnceLock<Regex> = OnceLock::new();

fn xmlns_regex() -> &'static Regex {
    XMLNS_REGEX.get_or_init(|| {
        Regex::new(r#"\bxmlns(?::([\w.\-]*))?\s*=\s*(?:"([^"]*)"|'([^']*)')"#)
            .expect("Failed to compile xmlns regex")
    })
}

/// A namespace declared in a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsedNamespace {
    /// Declared prefix; empty for the default namespace
    pub prefix: String,
    pub uri: String,
    /// Span of the whole declaration
    pub range: Range,
}

/// Collect the namespace declarations of a document, keyed by prefix.
///
/// A later declaration of the same prefix replaces the earlier one but keeps
/// its place in the iteration order. The text is not checked for
/// well-formedness.
pub fn scan(document: &TextDocument) -> IndexMap<String, UsedNamespace> {
    let mut used = IndexMap::new();

    for caps in xmlns_regex().captures_iter(document.text()) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let prefix = caps
            .get(1)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let uri = caps
            .get(2)
            .or_else(|| caps.get(3))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();

        used.insert(
            prefix.clone(),
            UsedNamespace {
                prefix,
                uri,
                range: document.range_of(whole.start(), whole.end()),
            },
        );
    }

    tracing::debug!("Found {} namespace declaration(s)", used.len());
    used
}
