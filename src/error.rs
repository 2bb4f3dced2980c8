//! Error types for pdfdown.

use std::io;
use thiserror::Error;

use crate::schema::FieldType;

/// Result type alias for pdfdown operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur during PDF conversion.
///
/// Every variant is terminal for the conversion call that raised it.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error when reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The file format is not recognized as PDF.
    #[error("Unknown file format: not a valid PDF")]
    UnknownFormat,

    /// The PDF version is not supported.
    #[error("Unsupported PDF version: {0}")]
    UnsupportedVersion(String),

    /// Error parsing PDF structure.
    #[error("PDF parsing error: {0}")]
    PdfParse(String),

    /// The PDF document is encrypted and cannot be decoded.
    #[error("Document is encrypted")]
    Encrypted,

    /// The content extractor failed on a page.
    #[error("Extraction error on page {page}: {message}")]
    Extract {
        /// 0-based page index
        page: usize,
        /// What went wrong
        message: String,
    },

    /// An extracted item does not conform to the item schema.
    #[error("Schema violation on field '{field}': expected {expected}, found {}", display_actual(.actual))]
    SchemaViolation {
        /// Offending field name
        field: String,
        /// Type the schema declares
        expected: FieldType,
        /// Type actually present (`None` when the field is missing)
        actual: Option<FieldType>,
    },

    /// The document model builder received zero pages.
    #[error("Cannot build a document from zero pages")]
    EmptyDocument,

    /// A transformer failed; the whole pipeline run is discarded.
    #[error("Transformer '{transformer}' failed{}: {message}", display_order(.order))]
    Transform {
        /// Name of the failing transformer
        transformer: String,
        /// Order of the item being processed, if any
        order: Option<u64>,
        /// What went wrong
        message: String,
    },

    /// The converter has no rendering rule for an item type and no fallback.
    #[error("No rendering rule for item type '{item_type}' (item order {order})")]
    UnhandledItemType {
        /// The unmapped item type tag
        item_type: String,
        /// Order of the offending item
        order: u64,
    },

    /// A document violates the model invariants.
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    /// A transformer identifier did not name a built-in transformer.
    #[error("Unknown transformer: {0}")]
    UnknownTransformer(String),

    /// Page number is out of range.
    #[error("Page {0} is out of range (document has {1} pages)")]
    PageOutOfRange(u32, u32),

    /// Invalid page range specification.
    #[error("Invalid page range: {0}")]
    InvalidPageRange(String),

    /// Error while serializing output.
    #[error("Rendering error: {0}")]
    Render(String),
}

impl Error {
    /// Build a transformer error attributed to a specific item.
    pub fn transform_at(
        transformer: impl Into<String>,
        order: u64,
        message: impl Into<String>,
    ) -> Self {
        Error::Transform {
            transformer: transformer.into(),
            order: Some(order),
            message: message.into(),
        }
    }

    /// Build a transformer error about the document as a whole.
    pub fn transform(transformer: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Transform {
            transformer: transformer.into(),
            order: None,
            message: message.into(),
        }
    }
}

fn display_actual(actual: &Option<FieldType>) -> String {
    match actual {
        Some(ty) => ty.to_string(),
        None => "nothing (field missing)".to_string(),
    }
}

fn display_order(order: &Option<u64>) -> String {
    match order {
        Some(order) => format!(" at item {}", order),
        None => String::new(),
    }
}

impl From<lopdf::Error> for Error {
    fn from(err: lopdf::Error) -> Self {
        match err {
            lopdf::Error::IO(e) => Error::Io(e),
            lopdf::Error::Decryption(_) => Error::Encrypted,
            _ => Error::PdfParse(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::EmptyDocument;
        assert_eq!(err.to_string(), "Cannot build a document from zero pages");

        let err = Error::PageOutOfRange(10, 5);
        assert_eq!(
            err.to_string(),
            "Page 10 is out of range (document has 5 pages)"
        );
    }

    #[test]
    fn test_schema_violation_display() {
        let err = Error::SchemaViolation {
            field: "str".to_string(),
            expected: FieldType::String,
            actual: None,
        };
        assert_eq!(
            err.to_string(),
            "Schema violation on field 'str': expected string, found nothing (field missing)"
        );

        let err = Error::SchemaViolation {
            field: "x".to_string(),
            expected: FieldType::Number,
            actual: Some(FieldType::String),
        };
        assert!(err.to_string().ends_with("expected number, found string"));
    }

    #[test]
    fn test_transform_display() {
        let err = Error::transform_at("line-join", 7, "bad bbox");
        assert_eq!(
            err.to_string(),
            "Transformer 'line-join' failed at item 7: bad bbox"
        );

        let err = Error::transform("classify", "no items");
        assert_eq!(err.to_string(), "Transformer 'classify' failed: no items");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
