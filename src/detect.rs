//! PDF header sniffing.
//!
//! Runs before the content extractor so that non-PDF payloads fail fast with
//! [`Error::UnknownFormat`] instead of a deep parser error.

use crate::error::{Error, Result};
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Information read from a PDF file header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfHeader {
    /// PDF version (e.g., "1.7", "2.0")
    pub version: String,
    /// Byte offset of `%PDF-` in the payload (readers tolerate leading junk)
    pub offset: usize,
    /// Whether the header is followed by a binary marker comment line
    pub has_binary_marker: bool,
}

impl std::fmt::Display for PdfHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "PDF {}", self.version)
    }
}

const PDF_MAGIC: &[u8] = b"%PDF-";
const VERSION_LEN: usize = 3;

/// How far into the payload the header may start.
const HEADER_SEARCH_WINDOW: usize = 1024;

/// Sniff the PDF header of a file on disk.
pub fn sniff_path<P: AsRef<Path>>(path: P) -> Result<PdfHeader> {
    let file = File::open(path)?;
    let mut head = Vec::with_capacity(HEADER_SEARCH_WINDOW + 16);
    file.take((HEADER_SEARCH_WINDOW + 16) as u64)
        .read_to_end(&mut head)?;
    sniff_bytes(&head)
}

/// Sniff the PDF header of an in-memory payload.
///
/// # Returns
/// * `Ok(PdfHeader)` if a `%PDF-x.y` header starts within the first 1 KiB
/// * `Err(Error::UnknownFormat)` otherwise
pub fn sniff_bytes(data: &[u8]) -> Result<PdfHeader> {
    let window = &data[..data.len().min(HEADER_SEARCH_WINDOW + PDF_MAGIC.len())];
    let offset = window
        .windows(PDF_MAGIC.len())
        .position(|w| w == PDF_MAGIC)
        .ok_or(Error::UnknownFormat)?;

    let version_start = offset + PDF_MAGIC.len();
    let version_bytes = data
        .get(version_start..version_start + VERSION_LEN)
        .ok_or(Error::UnknownFormat)?;
    let version = String::from_utf8_lossy(version_bytes).to_string();

    if !is_valid_version(&version) {
        return Err(Error::UnsupportedVersion(version));
    }

    Ok(PdfHeader {
        version,
        offset,
        has_binary_marker: has_binary_marker(&data[version_start + VERSION_LEN..]),
    })
}

/// Check if bytes start (or nearly start) with a PDF header.
pub fn is_pdf_bytes(data: &[u8]) -> bool {
    sniff_bytes(data).is_ok()
}

fn is_valid_version(version: &str) -> bool {
    let bytes = version.as_bytes();
    bytes.len() == VERSION_LEN
        && matches!(bytes[0], b'1' | b'2')
        && bytes[1] == b'.'
        && bytes[2].is_ascii_digit()
}

/// A `%` comment of high-bit bytes on the line after the header.
fn has_binary_marker(rest: &[u8]) -> bool {
    let rest = match rest.iter().position(|b| *b != b'\r' && *b != b'\n') {
        Some(start) => &rest[start..],
        None => return false,
    };
    rest.first() == Some(&b'%') && rest.iter().skip(1).take(4).filter(|b| **b >= 0x80).count() == 4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_valid_pdf() {
        let data = b"%PDF-1.7\n%\xe2\xe3\xcf\xd3\n";
        let header = sniff_bytes(data).unwrap();
        assert_eq!(header.version, "1.7");
        assert_eq!(header.offset, 0);
        assert!(header.has_binary_marker);
    }

    #[test]
    fn test_sniff_leading_junk() {
        let data = b"\xef\xbb\xbf  %PDF-2.0\n1 0 obj";
        let header = sniff_bytes(data).unwrap();
        assert_eq!(header.version, "2.0");
        assert_eq!(header.offset, 5);
        assert!(!header.has_binary_marker);
    }

    #[test]
    fn test_sniff_invalid_format() {
        assert!(matches!(
            sniff_bytes(b"<!DOCTYPE html>"),
            Err(Error::UnknownFormat)
        ));
        assert!(matches!(sniff_bytes(b""), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_sniff_truncated_version() {
        assert!(matches!(sniff_bytes(b"%PDF-1"), Err(Error::UnknownFormat)));
    }

    #[test]
    fn test_sniff_bad_version() {
        assert!(matches!(
            sniff_bytes(b"%PDF-x.y\n"),
            Err(Error::UnsupportedVersion(v)) if v == "x.y"
        ));
    }

    #[test]
    fn test_is_pdf_bytes() {
        assert!(is_pdf_bytes(b"%PDF-1.4\n"));
        assert!(!is_pdf_bytes(b"Not a PDF"));
    }
}
