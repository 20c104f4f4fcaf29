//! LibXML2 FFI Wrapper Module
//!
//! Safe wrapper around the libxml2 calls needed to validate an in-memory XML
//! document against an in-memory XML Schema.
//!
//! No mature pure Rust library performs XML Schema (XSD) validation, so the
//! validation itself is libxml2's. This module only owns the FFI surface:
//!
//! - libxml2 is initialized exactly once (`std::sync::Once`)
//! - schema parsing is serialized (libxml2's schema parser is not thread-safe)
//! - every validation creates its own validation context, so validation may
//!   run in parallel against a shared parsed schema
//! - every structured error libxml2 reports is rendered as one text line
//!
//! ## Error line grammar
//!
//! ```text
//! file_0.<ext>:<line>:<kind>:<detail>:<message>
//! ```
//!
//! `<ext>` is `xsd` for errors raised while parsing the schema and `xml` for
//! errors raised while parsing or validating the document. `<kind>` is the
//! libxml2 domain and level (e.g. `Schemas validity error`), `<detail>` the
//! name of the offending element or attribute when libxml2 reports one, and
//! `<message>` libxml2's message, which may itself contain colons.

use std::ffi::{CStr, c_void};
use std::ptr::{self, NonNull};
use std::sync::{Arc, Once};

use libc::{c_char, c_int, c_long};
use parking_lot::Mutex;

use crate::error::{LibXml2Error, LibXml2Result};

static LIBXML2_INIT: Once = Once::new();

/// Serializes schema parsing; validation needs no lock
static SCHEMA_PARSE_LOCK: Mutex<()> = Mutex::new(());

/// Stem shared by the names given to in-memory inputs
pub const INPUT_STEM: &str = "file_0";
/// Extension used for errors raised by the schema
pub const SCHEMA_EXTENSION: &str = "xsd";
/// Extension used for errors raised by the document
pub const DOCUMENT_EXTENSION: &str = "xml";

const DOCUMENT_NAME: &CStr = c"file_0.xml";

/// Never touch the network while parsing documents
const XML_PARSE_NONET: c_int = 1 << 11;
/// Report line numbers past 65535 instead of clamping them
const XML_PARSE_BIG_LINES: c_int = 1 << 22;
/// Largest line a libxml2 node records in its own field
const NODE_LINE_LIMIT: i64 = 65535;

// libxml2 error domains (xmlErrorDomain)
const XML_FROM_PARSER: c_int = 1;
const XML_FROM_TREE: c_int = 2;
const XML_FROM_NAMESPACE: c_int = 3;
const XML_FROM_DTD: c_int = 4;
const XML_FROM_IO: c_int = 8;
const XML_FROM_SCHEMASP: c_int = 16;
const XML_FROM_SCHEMASV: c_int = 17;
const XML_FROM_VALID: c_int = 23;

// libxml2 error levels (xmlErrorLevel)
const XML_ERR_WARNING: c_int = 1;
const XML_ERR_ERROR: c_int = 2;
const XML_ERR_FATAL: c_int = 3;

// libxml2 node types (xmlElementType)
const XML_ELEMENT_NODE: c_int = 1;
const XML_ATTRIBUTE_NODE: c_int = 2;

// Opaque libxml2 structures
#[repr(C)]
pub struct XmlSchema {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaParserCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlSchemaValidCtxt {
    _private: [u8; 0],
}

#[repr(C)]
pub struct XmlDoc {
    _private: [u8; 0],
}

/// Leading fields shared by every libxml2 node
#[repr(C)]
struct XmlNodeHead {
    _private: *mut c_void,
    node_type: c_int,
    name: *const c_char,
}

#[repr(C)]
pub struct XmlError {
    pub domain: c_int,
    pub code: c_int,
    pub message: *const c_char,
    pub level: c_int,
    pub file: *const c_char,
    pub line: c_int,
    pub str1: *const c_char,
    pub str2: *const c_char,
    pub str3: *const c_char,
    pub int1: c_int,
    pub int2: c_int,
    pub ctxt: *mut c_void,
    pub node: *mut c_void,
}

pub type XmlStructuredErrorFunc =
    Option<unsafe extern "C" fn(user_data: *mut c_void, error: *const XmlError)>;

// External libxml2 FFI declarations
#[cfg_attr(target_os = "windows", link(name = "libxml2"))]
#[cfg_attr(not(target_os = "windows"), link(name = "xml2"))]
unsafe extern "C" {
    pub fn xmlInitParser();
    pub fn xmlInitGlobals();

    pub fn xmlSetStructuredErrorFunc(ctx: *mut c_void, handler: XmlStructuredErrorFunc);

    // Document parsing
    pub fn xmlReadMemory(
        buffer: *const c_char,
        size: c_int,
        url: *const c_char,
        encoding: *const c_char,
        options: c_int,
    ) -> *mut XmlDoc;
    pub fn xmlFreeDoc(doc: *mut XmlDoc);
    pub fn xmlGetLineNo(node: *const c_void) -> c_long;

    // Schema parsing functions
    pub fn xmlSchemaNewMemParserCtxt(
        buffer: *const c_char,
        size: c_int,
    ) -> *mut XmlSchemaParserCtxt;
    pub fn xmlSchemaSetParserStructuredErrors(
        ctxt: *mut XmlSchemaParserCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaParse(ctxt: *const XmlSchemaParserCtxt) -> *mut XmlSchema;
    pub fn xmlSchemaFreeParserCtxt(ctxt: *mut XmlSchemaParserCtxt);
    pub fn xmlSchemaFree(schema: *mut XmlSchema);

    // Schema validation functions
    pub fn xmlSchemaNewValidCtxt(schema: *const XmlSchema) -> *mut XmlSchemaValidCtxt;
    pub fn xmlSchemaFreeValidCtxt(ctxt: *mut XmlSchemaValidCtxt);
    pub fn xmlSchemaSetValidStructuredErrors(
        ctxt: *mut XmlSchemaValidCtxt,
        serror: XmlStructuredErrorFunc,
        ctx: *mut c_void,
    );
    pub fn xmlSchemaValidateDoc(ctxt: *mut XmlSchemaValidCtxt, doc: *mut XmlDoc) -> c_int;
}

/// Collects rendered error lines for one input
struct ErrorSink {
    extension: &'static str,
    lines: Vec<String>,
}

impl ErrorSink {
    fn new(extension: &'static str) -> Self {
        Self {
            extension,
            lines: Vec::new(),
        }
    }

    fn as_user_data(&mut self) -> *mut c_void {
        self as *mut ErrorSink as *mut c_void
    }
}

/// Callback for libxml2 to report parser and validation errors (structured)
unsafe extern "C" fn structured_error_callback(user_data: *mut c_void, error: *const XmlError) {
    if user_data.is_null() || error.is_null() {
        return;
    }

    let sink = unsafe { &mut *(user_data as *mut ErrorSink) };
    let line = unsafe { format_error_line(sink.extension, &*error) };
    sink.lines.push(line);
}

unsafe fn c_str_lossy(ptr: *const c_char) -> Option<String> {
    if ptr.is_null() {
        return None;
    }
    Some(
        unsafe { CStr::from_ptr(ptr) }
            .to_string_lossy()
            .into_owned(),
    )
}

fn domain_name(domain: c_int) -> &'static str {
    match domain {
        XML_FROM_PARSER => "parser",
        XML_FROM_TREE => "tree",
        XML_FROM_NAMESPACE => "namespace",
        XML_FROM_DTD | XML_FROM_VALID => "validity",
        XML_FROM_IO => "I/O",
        XML_FROM_SCHEMASP => "Schemas parser",
        XML_FROM_SCHEMASV => "Schemas validity",
        _ => "",
    }
}

fn level_name(level: c_int) -> &'static str {
    match level {
        XML_ERR_WARNING => "warning",
        XML_ERR_ERROR | XML_ERR_FATAL => "error",
        _ => "",
    }
}

/// Render a libxml2 error as `file_0.<ext>:<line>:<kind>:<detail>:<message>`.
///
/// Kind and detail never contain colons so the line can be split from the left.
unsafe fn format_error_line(extension: &str, error: &XmlError) -> String {
    let kind = format!("{} {}", domain_name(error.domain), level_name(error.level))
        .trim()
        .to_string();

    let node = if error.node.is_null() {
        None
    } else {
        let node = unsafe { &*(error.node as *const XmlNodeHead) };
        (node.node_type == XML_ELEMENT_NODE || node.node_type == XML_ATTRIBUTE_NODE)
            .then_some(node)
    };

    let detail = node
        .and_then(|node| unsafe { c_str_lossy(node.name) })
        .unwrap_or_default()
        .replace(':', "");

    // Nodes store at most 65535; the parser keeps the real line elsewhere
    let mut line = i64::from(error.line.max(0));
    if line >= NODE_LINE_LIMIT && node.is_some() {
        line = line.max(i64::from(unsafe { xmlGetLineNo(error.node) }));
    }

    let message = unsafe { c_str_lossy(error.message) }
        .unwrap_or_default()
        .replace(['\r', '\n'], " ")
        .trim()
        .to_string();

    format!(
        "{}.{}:{}:{}:{}:{}",
        INPUT_STEM,
        extension,
        line,
        kind,
        detail,
        message
    )
}

fn input_size(data: &[u8]) -> LibXml2Result<c_int> {
    c_int::try_from(data.len()).map_err(|_| LibXml2Error::InputTooLarge { size: data.len() })
}

/// Parsed schema shared between validations; freed when the last clone drops
#[derive(Debug, Clone)]
pub struct XmlSchemaPtr(Arc<SchemaHandle>);

#[derive(Debug)]
struct SchemaHandle(NonNull<XmlSchema>);

// A parsed schema is only read while validating
unsafe impl Send for SchemaHandle {}
unsafe impl Sync for SchemaHandle {}

impl XmlSchemaPtr {
    /// # Safety
    ///
    /// `ptr` must come from `xmlSchemaParse` and be owned by nobody else.
    pub(crate) unsafe fn from_raw(ptr: *mut XmlSchema) -> LibXml2Result<Self> {
        NonNull::new(ptr)
            .map(|ptr| Self(Arc::new(SchemaHandle(ptr))))
            .ok_or(LibXml2Error::SchemaParseFailed)
    }

    pub(crate) fn as_ptr(&self) -> *const XmlSchema {
        self.0.0.as_ptr()
    }
}

impl Drop for SchemaHandle {
    fn drop(&mut self) {
        unsafe { xmlSchemaFree(self.0.as_ptr()) }
    }
}

/// Outcome of validating one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationResult {
    Valid,
    /// Not well-formed or rejected by the schema; one line per reported error
    Invalid { errors: Vec<String> },
    /// `xmlSchemaValidateDoc` failed internally
    InternalError { code: i32 },
}

impl ValidationResult {
    /// Interpret the return code of `xmlSchemaValidateDoc`
    pub fn from_code(code: c_int, errors: Vec<String>) -> Self {
        match code {
            0 => ValidationResult::Valid,
            code if code < 0 => ValidationResult::InternalError { code },
            _ => ValidationResult::Invalid { errors },
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, ValidationResult::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, ValidationResult::Invalid { .. })
    }

    /// Captured error lines, empty unless invalid
    pub fn into_errors(self) -> Vec<String> {
        match self {
            ValidationResult::Invalid { errors } => errors,
            _ => Vec::new(),
        }
    }
}

/// Safe access to the libxml2 schema parser and validator
pub struct LibXml2Wrapper {
    _private: (),
}

impl LibXml2Wrapper {
    /// Create a new LibXML2 wrapper instance, initializing libxml2 on first use
    pub fn new() -> Self {
        LIBXML2_INIT.call_once(|| unsafe {
            xmlInitParser();
            xmlInitGlobals();
        });

        LibXml2Wrapper { _private: () }
    }

    /// Parse an XML schema from a memory buffer
    pub fn parse_schema_from_memory(&self, schema_data: &[u8]) -> LibXml2Result<XmlSchemaPtr> {
        let mut errors = Vec::new();
        self.parse_schema_with_errors(schema_data, &mut errors)
    }

    /// Parse an XML schema from a memory buffer, appending every error libxml2
    /// reports (as `file_0.xsd:...` lines) to `errors`
    pub fn parse_schema_with_errors(
        &self,
        schema_data: &[u8],
        errors: &mut Vec<String>,
    ) -> LibXml2Result<XmlSchemaPtr> {
        let size = input_size(schema_data)?;
        let mut sink = ErrorSink::new(SCHEMA_EXTENSION);
        let _guard = SCHEMA_PARSE_LOCK.lock();

        let result = unsafe {
            let parser_ctxt =
                xmlSchemaNewMemParserCtxt(schema_data.as_ptr() as *const c_char, size);

            if parser_ctxt.is_null() {
                return Err(LibXml2Error::MemoryAllocation);
            }

            let user_data = sink.as_user_data();
            xmlSchemaSetParserStructuredErrors(
                parser_ctxt,
                Some(structured_error_callback),
                user_data,
            );
            // Well-formedness errors of the schema document come through the
            // thread's generic handler on older libxml2 releases
            xmlSetStructuredErrorFunc(user_data, Some(structured_error_callback));

            let schema_ptr = xmlSchemaParse(parser_ctxt);

            xmlSetStructuredErrorFunc(ptr::null_mut(), None);
            xmlSchemaFreeParserCtxt(parser_ctxt);

            XmlSchemaPtr::from_raw(schema_ptr)
        };

        errors.append(&mut sink.lines);
        result
    }

    /// Validate an in-memory XML document against a schema
    ///
    /// A document that is not well-formed yields `Invalid` with its parser
    /// errors. Safe to call concurrently: each call owns its validation context.
    pub fn validate_memory(
        &self,
        schema: &XmlSchemaPtr,
        xml_content: &[u8],
    ) -> LibXml2Result<ValidationResult> {
        let size = input_size(xml_content)?;
        let mut sink = ErrorSink::new(DOCUMENT_EXTENSION);
        let user_data = sink.as_user_data();

        let code = unsafe {
            xmlSetStructuredErrorFunc(user_data, Some(structured_error_callback));
            let doc = xmlReadMemory(
                xml_content.as_ptr() as *const c_char,
                size,
                DOCUMENT_NAME.as_ptr(),
                ptr::null(),
                XML_PARSE_NONET | XML_PARSE_BIG_LINES,
            );
            xmlSetStructuredErrorFunc(ptr::null_mut(), None);

            if doc.is_null() {
                return Ok(ValidationResult::Invalid { errors: sink.lines });
            }

            let valid_ctxt = xmlSchemaNewValidCtxt(schema.as_ptr());
            if valid_ctxt.is_null() {
                xmlFreeDoc(doc);
                return Err(LibXml2Error::ValidationContextCreationFailed);
            }

            xmlSchemaSetValidStructuredErrors(
                valid_ctxt,
                Some(structured_error_callback),
                user_data,
            );

            let code = xmlSchemaValidateDoc(valid_ctxt, doc);

            xmlSchemaFreeValidCtxt(valid_ctxt);
            xmlFreeDoc(doc);
            code
        };

        match ValidationResult::from_code(code, sink.lines) {
            ValidationResult::InternalError { code } => Err(LibXml2Error::InternalError { code }),
            result => Ok(result),
        }
    }
}

impl Default for LibXml2Wrapper {
    fn default() -> Self {
        Self::new()
    }
}
