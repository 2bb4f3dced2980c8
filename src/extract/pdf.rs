//! PDF content extractor.

use std::path::Path;

use crate::detect;
use crate::error::{Error, Result};
use crate::model::{Metadata, RawItem};

use super::backend::{LopdfBackend, PageId, PdfBackend};
use super::interpreter::TextInterpreter;
use super::options::ExtractOptions;
use super::ContentExtractor;

/// Extracts positioned text runs from a PDF through a [`PdfBackend`].
pub struct PdfExtractor<B: PdfBackend = LopdfBackend> {
    backend: B,
    pages: Vec<PageId>,
}

/// The default extractor, backed by lopdf.
pub type LopdfExtractor = PdfExtractor<LopdfBackend>;

impl<B: PdfBackend> PdfExtractor<B> {
    /// Wrap a backend. Pages are indexed in document order.
    pub fn new(backend: B) -> Self {
        let pages = backend.pages().into_values().collect();
        Self { backend, pages }
    }

    /// The underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn page_id(&self, index: usize) -> Result<PageId> {
        self.pages.get(index).copied().ok_or_else(|| {
            Error::PageOutOfRange(
                u32::try_from(index + 1).unwrap_or(u32::MAX),
                self.pages.len() as u32,
            )
        })
    }

    fn interpret(&self, index: usize, page: PageId) -> Result<Vec<RawItem>> {
        let fonts = self.backend.page_fonts(page)?;
        let content = self.backend.page_content(page)?;
        let ops = self.backend.decode_content(&content)?;
        let decoder = self.backend.text_decoder(page)?;
        Ok(TextInterpreter::new(index, &fonts, &*decoder).run(&ops))
    }
}

impl LopdfExtractor {
    /// Open a PDF file.
    pub fn open<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> Result<Self> {
        let path = path.as_ref();

        // Verify it's a PDF before handing it to lopdf
        detect::sniff_path(path)?;

        let backend = LopdfBackend::load_file(path)?;
        Ok(Self::with_backend(backend, options))
    }

    /// Load a PDF from bytes.
    pub fn from_bytes(data: &[u8], options: &ExtractOptions) -> Result<Self> {
        detect::sniff_bytes(data)?;

        let backend = LopdfBackend::load_bytes(data)?;
        Ok(Self::with_backend(backend, options))
    }

    fn with_backend(backend: LopdfBackend, options: &ExtractOptions) -> Self {
        // Note: lopdf 0.34 only decrypts documents with an empty user password
        if options.password.is_some() && backend.is_encrypted() {
            log::warn!("Password was provided but lopdf 0.34 doesn't support decryption");
        }
        Self::new(backend)
    }
}

impl<B: PdfBackend> ContentExtractor for PdfExtractor<B> {
    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn extract_page(&self, index: usize) -> Result<Vec<RawItem>> {
        let page = self.page_id(index)?;
        self.interpret(index, page).map_err(|e| match e {
            Error::Extract { .. } => e,
            other => Error::Extract {
                page: index,
                message: other.to_string(),
            },
        })
    }

    fn metadata(&self) -> Metadata {
        let mut metadata = self.backend.metadata();
        metadata.page_count = self.pages.len() as u32;
        metadata
    }
}
