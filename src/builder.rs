//! Document model builder.
//!
//! Turns validated per-page extractor output into a [`Document`], assigning
//! the global `order` sequence. This step is always sequential, even when
//! extraction itself ran pages in parallel.

use crate::error::{Error, Result};
use crate::model::{Document, Metadata, Page, RawItem};

/// Validated items of one page, as handed over by the extraction stage.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// 0-based page index in the source document
    pub index: usize,
    /// Items in extraction order
    pub items: Vec<RawItem>,
}

impl ExtractedPage {
    /// Create an extracted page.
    pub fn new(index: usize, items: Vec<RawItem>) -> Self {
        Self { index, items }
    }
}

/// Assembles a [`Document`] from extracted pages.
#[derive(Debug, Clone, Default)]
pub struct DocumentBuilder {
    metadata: Metadata,
    first_order: u64,
}

impl DocumentBuilder {
    /// Create a builder with empty metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach document metadata.
    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Start the `order` sequence at a value other than 0.
    pub fn with_first_order(mut self, first: u64) -> Self {
        self.first_order = first;
        self
    }

    /// Build the document.
    ///
    /// `order` values increase strictly across the whole document and are
    /// never reset per page. Zero pages is a usage error
    /// ([`Error::EmptyDocument`]); a page with zero items is kept.
    pub fn build(self, pages: Vec<ExtractedPage>) -> Result<Document> {
        if pages.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let mut next_order = self.first_order;
        let mut built = Vec::with_capacity(pages.len());
        for page in pages {
            let items = page
                .items
                .into_iter()
                .map(|raw| {
                    let item = raw.into_item(next_order);
                    next_order += 1;
                    item
                })
                .collect();
            built.push(Page::new(page.index, items));
        }

        log::debug!(
            "Built document: {} pages, {} items",
            built.len(),
            next_order - self.first_order
        );

        Document::from_pages(self.metadata, built)
    }
}
