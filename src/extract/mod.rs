//! Content extraction.
//!
//! A [`ContentExtractor`] turns one decoded page into positioned items.
//! [`extract_document`] drives it over the selected pages, validates every
//! item against the extractor's schema and hands the result to the
//! [`DocumentBuilder`].

mod backend;
mod interpreter;
mod options;
mod pdf;

pub use backend::{
    decode_text_simple, ContentOp, FontInfo, LopdfBackend, PageId, PdfBackend, PdfValue,
    TextDecoder,
};
pub use options::{ErrorMode, ExtractOptions, PageSelection};
pub use pdf::{LopdfExtractor, PdfExtractor};

use rayon::prelude::*;

use crate::builder::{DocumentBuilder, ExtractedPage};
use crate::error::Result;
use crate::model::{Document, Metadata, RawItem};
use crate::schema::ItemSchema;

/// Source of positioned content items, one page at a time.
///
/// Implementations must be safe to call from several threads at once:
/// pages may be extracted in parallel.
pub trait ContentExtractor: Sync {
    /// Number of pages in the source.
    fn page_count(&self) -> usize;

    /// Extract the items of one page (0-based index), in content order.
    fn extract_page(&self, index: usize) -> Result<Vec<RawItem>>;

    /// Document-level metadata.
    fn metadata(&self) -> Metadata {
        Metadata {
            page_count: self.page_count() as u32,
            ..Default::default()
        }
    }

    /// Shape every extracted item must have.
    fn schema(&self) -> ItemSchema {
        ItemSchema::text_run()
    }
}

/// Extract and validate the selected pages, in page order.
pub fn extract_pages<E>(extractor: &E, options: &ExtractOptions) -> Result<Vec<ExtractedPage>>
where
    E: ContentExtractor + ?Sized,
{
    let schema = extractor.schema();
    let indices: Vec<usize> = (0..extractor.page_count())
        .filter(|index| options.pages.includes_index(*index))
        .collect();

    let extract_one = |index: usize| -> Result<ExtractedPage> {
        let items = match extractor.extract_page(index) {
            Ok(items) => items,
            Err(e) if options.error_mode == ErrorMode::Lenient => {
                log::warn!("Failed to extract page {}: {}", index + 1, e);
                Vec::new()
            }
            Err(e) => return Err(e),
        };
        let items = schema.validate_all(items)?;
        Ok(ExtractedPage::new(index, items))
    };

    log::debug!(
        "Extracting {} of {} pages ({})",
        indices.len(),
        extractor.page_count(),
        if options.parallel { "parallel" } else { "sequential" }
    );

    if options.parallel && indices.len() > 1 {
        indices.into_par_iter().map(extract_one).collect()
    } else {
        indices.into_iter().map(extract_one).collect()
    }
}

/// Extract, validate and build a [`Document`].
pub fn extract_document<E>(extractor: &E, options: &ExtractOptions) -> Result<Document>
where
    E: ContentExtractor + ?Sized,
{
    let pages = extract_pages(extractor, options)?;
    DocumentBuilder::new()
        .with_metadata(extractor.metadata())
        .build(pages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::{field, Item};

    /// Pages of literal text runs; `None` marks a page that fails to decode.
    struct StaticExtractor {
        pages: Vec<Option<Vec<&'static str>>>,
    }

    impl ContentExtractor for StaticExtractor {
        fn page_count(&self) -> usize {
            self.pages.len()
        }

        fn extract_page(&self, index: usize) -> Result<Vec<RawItem>> {
            let texts = self.pages[index].as_ref().ok_or(Error::Extract {
                page: index,
                message: "bad stream".to_string(),
            })?;
            Ok(texts
                .iter()
                .enumerate()
                .map(|(i, t)| {
                    let y = 700.0 - 14.0 * i as f64;
                    RawItem::text_run(*t, index, 72.0, y, 20.0, 12.0, 12.0, "Times")
                })
                .collect())
        }
    }

    #[test]
    fn test_extract_document_sequential_and_parallel_agree() {
        let extractor = StaticExtractor {
            pages: vec![Some(vec!["a", "b"]), Some(vec![]), Some(vec!["c"])],
        };

        let sequential =
            extract_document(&extractor, &ExtractOptions::new().sequential()).unwrap();
        let parallel = extract_document(&extractor, &ExtractOptions::new()).unwrap();
        assert_eq!(sequential, parallel);

        let orders: Vec<u64> = parallel.items().map(Item::order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(parallel.page_count(), 3);
        assert_eq!(parallel.metadata().page_count, 3);
    }

    #[test]
    fn test_page_selection() {
        let extractor = StaticExtractor {
            pages: vec![Some(vec!["a"]), Some(vec!["b"]), Some(vec!["c"])],
        };
        let options = ExtractOptions::new().with_pages(PageSelection::Pages(vec![1, 3]));
        let doc = extract_document(&extractor, &options).unwrap();

        let indices: Vec<usize> = doc.pages().iter().map(|p| p.index()).collect();
        assert_eq!(indices, vec![0, 2]);
        assert_eq!(doc.plain_text(), "a\n\nc");
    }

    #[test]
    fn test_empty_selection_is_empty_document() {
        let extractor = StaticExtractor {
            pages: vec![Some(vec!["a"])],
        };
        let options = ExtractOptions::new().with_pages(PageSelection::Range(5..=9));
        let result = extract_document(&extractor, &options);
        assert!(matches!(result, Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_strict_mode_fails_on_bad_page() {
        let extractor = StaticExtractor {
            pages: vec![Some(vec!["a"]), None],
        };
        let result = extract_document(&extractor, &ExtractOptions::new());
        assert!(matches!(result, Err(Error::Extract { page: 1, .. })));
    }

    #[test]
    fn test_lenient_mode_keeps_bad_page_empty() {
        let extractor = StaticExtractor {
            pages: vec![Some(vec!["a"]), None],
        };
        let doc = extract_document(&extractor, &ExtractOptions::new().lenient()).unwrap();
        assert_eq!(doc.page_count(), 2);
        assert!(doc.pages()[1].is_empty());
    }

    #[test]
    fn test_schema_violation_aborts() {
        struct Untyped;
        impl ContentExtractor for Untyped {
            fn page_count(&self) -> usize {
                1
            }
            fn extract_page(&self, _index: usize) -> Result<Vec<RawItem>> {
                Ok(vec![RawItem::new("text-run").with_field(field::STR, "no layout")])
            }
        }

        // Lenient mode only covers decoding failures, never malformed items
        let result = extract_document(&Untyped, &ExtractOptions::new().lenient());
        assert!(matches!(
            result,
            Err(Error::SchemaViolation { ref field, .. }) if field == "page"
        ));
    }
}
