use tower_lsp::lsp_types::Url;

use validate_xml_lsp::namespace_scanner::scan;
use validate_xml_lsp::{Position, TextDocument};

fn doc(text: &str) -> TextDocument {
    TextDocument::new(Url::parse("file:///scan.xml").unwrap(), 1, text)
}

#[test]
fn test_scan_typical_document() {
    let document = doc(concat!(
        "<?xml version=\"1.0\"?>\n",
        "<cfg:config xmlns:cfg=\"urn:config\"\n",
        "            xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\">\n",
        "  <cfg:item/>\n",
        "</cfg:config>\n",
    ));

    let used = scan(&document);

    assert_eq!(used.len(), 2);
    assert_eq!(used["cfg"].uri, "urn:config");
    assert_eq!(used["cfg"].range.start, Position::new(1, 12));
    assert_eq!(used["xsi"].range.start, Position::new(2, 12));
}

#[test]
fn test_scan_multibyte_text_before_declaration() {
    // 'ü' takes one UTF-16 unit
    let document = doc("<!-- grüße -->\n<r ü=\"1\" xmlns=\"urn:u\"/>");

    let used = scan(&document);

    assert_eq!(used[""].range.start, Position::new(1, 9));
}

#[test]
fn test_scan_spaces_around_equals() {
    let used = scan(&doc("<r xmlns:a = 'urn:a'/>"));
    assert_eq!(used["a"].uri, "urn:a");
}
