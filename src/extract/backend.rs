//! PDF backend abstraction layer.
//!
//! Provides a trait-based interface for PDF operations, isolating
//! the concrete PDF library (lopdf) from the content stream interpreter.

use std::collections::{BTreeMap, HashMap};

use lopdf::{Document as LopdfDocument, Object};

use crate::error::{Error, Result};
use crate::model::Metadata;

/// Page identifier: (object number, generation number).
pub type PageId = (u32, u16);

/// Decodes the bytes of a text-showing operator, given the font resource name.
pub type TextDecoder<'a> = Box<dyn Fn(&[u8], &[u8]) -> String + 'a>;

/// Glyph width used when a font declares none, in glyph space (1/1000 em).
pub const DEFAULT_GLYPH_WIDTH: f64 = 500.0;

/// Font information returned by the backend.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontInfo {
    /// Font resource name (key in the page's font dictionary).
    pub name: Vec<u8>,
    /// Base font name (e.g., "Helvetica-Bold").
    pub base_font: String,
    /// First character code covered by `widths`.
    pub first_char: u32,
    /// Glyph widths in glyph space, starting at `first_char`.
    pub widths: Vec<f64>,
    /// Composite (Type0) font: two bytes per character code.
    pub composite: bool,
}

impl FontInfo {
    /// Create font info with no width table.
    pub fn new(name: impl Into<Vec<u8>>, base_font: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            base_font: base_font.into(),
            ..Default::default()
        }
    }

    /// Attach a width table.
    pub fn with_widths(mut self, first_char: u32, widths: Vec<f64>) -> Self {
        self.first_char = first_char;
        self.widths = widths;
        self
    }

    /// Width of a character code in glyph space, if the font declares it.
    pub fn glyph_width(&self, code: u32) -> Option<f64> {
        let index = code.checked_sub(self.first_char)? as usize;
        self.widths.get(index).copied().filter(|w| *w > 0.0)
    }

    /// Number of bytes per character code.
    pub fn code_len(&self) -> usize {
        if self.composite {
            2
        } else {
            1
        }
    }
}

/// A value from a PDF content stream operand.
#[derive(Debug, Clone, PartialEq)]
pub enum PdfValue {
    Integer(i64),
    Real(f32),
    Name(Vec<u8>),
    Str(Vec<u8>),
    Array(Vec<PdfValue>),
    Other,
}

impl PdfValue {
    /// Numeric view of an integer or real operand.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            PdfValue::Integer(i) => Some(*i as f64),
            PdfValue::Real(r) => Some(*r as f64),
            _ => None,
        }
    }
}

/// A single operation from a PDF content stream.
#[derive(Debug, Clone, PartialEq)]
pub struct ContentOp {
    pub operator: String,
    pub operands: Vec<PdfValue>,
}

impl ContentOp {
    /// Create an operation.
    pub fn new(operator: impl Into<String>, operands: Vec<PdfValue>) -> Self {
        Self {
            operator: operator.into(),
            operands,
        }
    }

    /// Numeric operand at `index`.
    pub fn number(&self, index: usize) -> Option<f64> {
        self.operands.get(index).and_then(PdfValue::as_number)
    }
}

/// Abstract interface for PDF document access.
///
/// Implementations provide page enumeration, font info, content stream
/// decoding and text decoding, without exposing any concrete PDF library types.
pub trait PdfBackend: Send + Sync {
    /// Return all pages as (page_number → PageId), 1-indexed.
    fn pages(&self) -> BTreeMap<u32, PageId>;

    /// Return font info for a given page.
    fn page_fonts(&self, page: PageId) -> Result<Vec<FontInfo>>;

    /// Return the raw (decompressed) content stream bytes for a page.
    fn page_content(&self, page: PageId) -> Result<Vec<u8>>;

    /// Parse raw content stream bytes into a sequence of operations.
    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>>;

    /// Build a text decoder for the fonts of a page.
    ///
    /// The decoder falls back to [`decode_text_simple`] when the font or its
    /// encoding is unavailable.
    fn text_decoder(&self, page: PageId) -> Result<TextDecoder<'_>>;

    /// Document information dictionary.
    fn metadata(&self) -> Metadata {
        Metadata::default()
    }
}

/// Simple text decoding fallback when no encoding is available.
pub fn decode_text_simple(bytes: &[u8]) -> String {
    // Try UTF-16BE first (BOM marker)
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let utf16: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|c| u16::from_be_bytes([c[0], c[1]]))
            .collect();
        return String::from_utf16_lossy(&utf16);
    }

    // Try UTF-8
    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    // Fallback: Latin-1
    bytes.iter().map(|&b| b as char).collect()
}

// ---------------------------------------------------------------------------
// LopdfBackend: concrete implementation backed by lopdf
// ---------------------------------------------------------------------------

/// Concrete [`PdfBackend`] backed by `lopdf::Document`.
pub struct LopdfBackend {
    doc: LopdfDocument,
}

impl LopdfBackend {
    /// Load from a file path.
    pub fn load_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let doc = LopdfDocument::load(path)?;
        Ok(Self { doc })
    }

    /// Load from an in-memory byte slice.
    pub fn load_bytes(data: &[u8]) -> Result<Self> {
        let doc = LopdfDocument::load_mem(data)?;
        Ok(Self { doc })
    }

    /// Wrap an already loaded document.
    pub fn from_document(doc: LopdfDocument) -> Self {
        Self { doc }
    }

    /// Check if the document is encrypted.
    pub fn is_encrypted(&self) -> bool {
        self.doc.is_encrypted()
    }

    /// Get PDF version string.
    pub fn version(&self) -> String {
        self.doc.version.to_string()
    }

    /// Follow a reference, if `obj` is one.
    fn resolve<'a>(&'a self, obj: &'a Object) -> Option<&'a Object> {
        match obj {
            Object::Reference(id) => self.doc.get_object(*id).ok(),
            other => Some(other),
        }
    }

    fn font_widths(&self, font_dict: &lopdf::Dictionary) -> (u32, Vec<f64>) {
        let first_char = font_dict
            .get(b"FirstChar")
            .ok()
            .and_then(|o| self.resolve(o))
            .and_then(|o| o.as_i64().ok())
            .and_then(|n| u32::try_from(n).ok())
            .unwrap_or(0);

        let widths = font_dict
            .get(b"Widths")
            .ok()
            .and_then(|o| self.resolve(o))
            .and_then(|o| o.as_array().ok())
            .map(|arr| {
                arr.iter()
                    .map(|w| {
                        self.resolve(w)
                            .and_then(|w| w.as_float().ok())
                            .map_or(0.0, f64::from)
                    })
                    .collect()
            })
            .unwrap_or_default();

        (first_char, widths)
    }
}

impl PdfBackend for LopdfBackend {
    fn pages(&self) -> BTreeMap<u32, PageId> {
        self.doc.get_pages()
    }

    fn page_fonts(&self, page: PageId) -> Result<Vec<FontInfo>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let mut result = Vec::with_capacity(lopdf_fonts.len());
        for (name, font_dict) in &lopdf_fonts {
            let base_font = font_dict
                .get(b"BaseFont")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map(|n| String::from_utf8_lossy(n).to_string())
                .unwrap_or_else(|| "Unknown".to_string());
            let composite = font_dict
                .get(b"Subtype")
                .ok()
                .and_then(|o| o.as_name().ok())
                .map_or(false, |subtype| subtype == b"Type0");
            let (first_char, widths) = if composite {
                (0, Vec::new())
            } else {
                self.font_widths(font_dict)
            };
            result.push(FontInfo {
                name: name.clone(),
                base_font,
                first_char,
                widths,
                composite,
            });
        }
        Ok(result)
    }

    fn page_content(&self, page_id: PageId) -> Result<Vec<u8>> {
        let page_dict = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        // A page without content streams is blank, not broken.
        let Ok(contents) = page_dict.get(b"Contents") else {
            return Ok(Vec::new());
        };

        match contents {
            Object::Reference(r) => {
                if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                    // Unfiltered streams report an error from decompression.
                    return Ok(s
                        .decompressed_content()
                        .unwrap_or_else(|_| s.content.clone()));
                }
                Err(Error::PdfParse("Invalid content stream".to_string()))
            }
            Object::Array(arr) => {
                let mut content = Vec::new();
                for obj in arr {
                    if let Object::Reference(r) = obj {
                        if let Ok(Object::Stream(s)) = self.doc.get_object(*r) {
                            let data = s
                                .decompressed_content()
                                .unwrap_or_else(|_| s.content.clone());
                            content.extend_from_slice(&data);
                            content.push(b' ');
                        }
                    }
                }
                Ok(content)
            }
            _ => Err(Error::PdfParse("Invalid content stream".to_string())),
        }
    }

    fn decode_content(&self, data: &[u8]) -> Result<Vec<ContentOp>> {
        let content =
            lopdf::content::Content::decode(data).map_err(|e| Error::PdfParse(e.to_string()))?;

        Ok(content
            .operations
            .into_iter()
            .map(|op| ContentOp {
                operator: op.operator,
                operands: op.operands.iter().map(convert_object).collect(),
            })
            .collect())
    }

    fn text_decoder(&self, page: PageId) -> Result<TextDecoder<'_>> {
        let lopdf_fonts = self
            .doc
            .get_page_fonts(page)
            .map_err(|e| Error::PdfParse(e.to_string()))?;

        let encodings: HashMap<Vec<u8>, _> = lopdf_fonts
            .into_iter()
            .filter_map(|(name, font_dict)| {
                font_dict
                    .get_font_encoding(&self.doc)
                    .ok()
                    .map(|enc| (name, enc))
            })
            .collect();

        Ok(Box::new(move |font_name: &[u8], bytes: &[u8]| {
            encodings
                .get(font_name)
                .and_then(|enc| LopdfDocument::decode_text(enc, bytes).ok())
                .unwrap_or_else(|| decode_text_simple(bytes))
        }))
    }

    fn metadata(&self) -> Metadata {
        let mut metadata = Metadata::with_version(self.version());

        // Try to get document info dictionary
        if let Ok(info) = self.doc.trailer.get(b"Info") {
            let info_dict = match info {
                Object::Reference(id) => self.doc.get_dictionary(*id).ok(),
                Object::Dictionary(dict) => Some(dict),
                _ => None,
            };
            if let Some(info_dict) = info_dict {
                metadata.title = get_string_from_dict(info_dict, b"Title");
                metadata.author = get_string_from_dict(info_dict, b"Author");
                metadata.subject = get_string_from_dict(info_dict, b"Subject");
                metadata.keywords = get_string_from_dict(info_dict, b"Keywords");
                metadata.creator = get_string_from_dict(info_dict, b"Creator");
                metadata.producer = get_string_from_dict(info_dict, b"Producer");

                if let Some(date_str) = get_string_from_dict(info_dict, b"CreationDate") {
                    metadata.created = parse_pdf_date(&date_str);
                }
                if let Some(date_str) = get_string_from_dict(info_dict, b"ModDate") {
                    metadata.modified = parse_pdf_date(&date_str);
                }
            }
        }

        metadata.page_count = self.doc.get_pages().len() as u32;
        metadata.encrypted = self.doc.is_encrypted();
        metadata
    }
}

/// Convert a `lopdf::Object` to [`PdfValue`].
fn convert_object(obj: &Object) -> PdfValue {
    match obj {
        Object::Integer(i) => PdfValue::Integer(*i),
        Object::Real(r) => PdfValue::Real(*r),
        Object::Name(n) => PdfValue::Name(n.clone()),
        Object::String(b, _) => PdfValue::Str(b.clone()),
        Object::Array(arr) => PdfValue::Array(arr.iter().map(convert_object).collect()),
        _ => PdfValue::Other,
    }
}

/// Helper to get a string from a PDF dictionary.
fn get_string_from_dict(dict: &lopdf::Dictionary, key: &[u8]) -> Option<String> {
    match dict.get(key).ok()? {
        Object::String(bytes, _) => Some(decode_text_simple(bytes)),
        Object::Name(bytes) => String::from_utf8(bytes.clone()).ok(),
        _ => None,
    }
}

/// Parse a PDF date string (D:YYYYMMDDHHmmSSOHH'mm').
pub(crate) fn parse_pdf_date(s: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    let s = s.strip_prefix("D:").unwrap_or(s);

    // At minimum we need YYYY
    if s.len() < 4 {
        return None;
    }

    let year: i32 = s.get(0..4)?.parse().ok()?;
    let month: u32 = s.get(4..6).and_then(|m| m.parse().ok()).unwrap_or(1);
    let day: u32 = s.get(6..8).and_then(|d| d.parse().ok()).unwrap_or(1);
    let hour: u32 = s.get(8..10).and_then(|h| h.parse().ok()).unwrap_or(0);
    let minute: u32 = s.get(10..12).and_then(|m| m.parse().ok()).unwrap_or(0);
    let second: u32 = s.get(12..14).and_then(|s| s.parse().ok()).unwrap_or(0);

    chrono::NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_opt(hour, minute, second))
        .map(|dt| chrono::DateTime::from_naive_utc_and_offset(dt, chrono::Utc))
}
