use pretty_assertions::assert_eq;
use tower_lsp::lsp_types::Url;

use validate_xml_lsp::diagnostics::{classify_severity, translate};
use validate_xml_lsp::{Origin, ParsedErrorLine, Position, Range, Severity, TextDocument};

fn doc(text: &str) -> TextDocument {
    TextDocument::new(Url::parse("file:///t.xml").unwrap(), 1, text)
}

#[test]
fn test_message_may_contain_colons() {
    let parsed = ParsedErrorLine::parse(
        "file_0.xml:7:Schemas validity error:code:Element 'code': [facet 'pattern'] The value 'a:b' is not accepted.",
    )
    .unwrap();

    assert_eq!(parsed.detail, "code");
    assert_eq!(
        parsed.message,
        "Element 'code': [facet 'pattern'] The value 'a:b' is not accepted."
    );
}

#[test]
fn test_severity_examples() {
    assert_eq!(classify_severity("warning: unknown element"), Severity::Warning);
    assert_eq!(classify_severity("error: missing attribute"), Severity::Error);
    assert_eq!(classify_severity("notice"), Severity::Information);
}

#[test]
fn test_span_is_measured_in_utf16_units() {
    let document = doc("<r>\n<é/><item/>\n</r>");

    let tagged = translate(
        "file_0.xml:2:Schemas validity error:item:Element 'item': not expected",
        &document,
        "urn:a",
    );

    assert_eq!(tagged.origin, Origin::Xml);
    assert_eq!(
        tagged.diagnostic.range,
        Range::new(Position::new(1, 5), Position::new(1, 9))
    );
}

#[test]
fn test_line_past_end_of_document_uses_placeholder() {
    let document = doc("<r/>");

    let tagged = translate(
        "file_0.xml:40:Schemas validity error:item:gone",
        &document,
        "urn:a",
    );

    assert_eq!(tagged.diagnostic.range, Range::on_line(39, 1, 2));
}

#[test]
fn test_windows_line_endings_in_raw_line() {
    let document = doc("<r/>");
    let tagged = translate("file_0.xml:1:parser error::Extra content\r\n", &document, "urn:a");

    assert_eq!(tagged.origin, Origin::Xml);
    assert_eq!(tagged.diagnostic.message, "Extra content");
}
