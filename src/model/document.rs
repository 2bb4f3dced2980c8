//! Document-level types.

use super::{Item, Page};
use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// An immutable, validated document.
///
/// Invariants, checked by [`Document::from_pages`]:
/// - at least one page,
/// - page indices strictly increasing,
/// - item `order` values unique across the whole document,
/// - items within a page sorted by `order`.
///
/// There are no mutating accessors: a transformer takes a `Document` by value
/// and builds a new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Document {
    metadata: Metadata,
    pages: Vec<Page>,
}

impl Document {
    /// Assemble a document, checking the model invariants.
    pub fn from_pages(metadata: Metadata, pages: Vec<Page>) -> Result<Self> {
        if pages.is_empty() {
            return Err(Error::EmptyDocument);
        }

        let mut seen = HashSet::new();
        let mut last_index = None;
        for page in &pages {
            if let Some(last) = last_index {
                if page.index() <= last {
                    return Err(Error::InvalidDocument(format!(
                        "page index {} follows page index {}",
                        page.index(),
                        last
                    )));
                }
            }
            last_index = Some(page.index());

            for item in page.items() {
                if !seen.insert(item.order()) {
                    return Err(Error::InvalidDocument(format!(
                        "duplicate item order {}",
                        item.order()
                    )));
                }
            }
        }

        Ok(Self { metadata, pages })
    }

    /// Document metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Pages in index order.
    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    /// Split into metadata and pages.
    pub fn into_parts(self) -> (Metadata, Vec<Page>) {
        (self.metadata, self.pages)
    }

    /// Get the number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Total number of items across all pages.
    pub fn item_count(&self) -> usize {
        self.pages.iter().map(Page::len).sum()
    }

    /// All items in reading order (page index, then `order`).
    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.pages.iter().flat_map(|p| p.items().iter())
    }

    /// Rebuild the document page by page.
    ///
    /// The result goes through [`Document::from_pages`] again, so a closure
    /// that breaks an invariant yields an error instead of a bad document.
    pub fn try_map_pages<F>(self, mut f: F) -> Result<Self>
    where
        F: FnMut(Page) -> Result<Page>,
    {
        let (metadata, pages) = self.into_parts();
        let pages = pages.into_iter().map(&mut f).collect::<Result<Vec<_>>>()?;
        Self::from_pages(metadata, pages)
    }

    /// Rebuild the document item by item, keeping page boundaries.
    pub fn try_map_items<F>(self, mut f: F) -> Result<Self>
    where
        F: FnMut(Item) -> Result<Item>,
    {
        self.try_map_pages(|page| {
            let index = page.index();
            let items = page
                .into_items()
                .into_iter()
                .map(&mut f)
                .collect::<Result<Vec<_>>>()?;
            Ok(Page::new(index, items))
        })
    }

    /// Get plain text content of the entire document.
    pub fn plain_text(&self) -> String {
        self.pages
            .iter()
            .map(Page::plain_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Document metadata.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Metadata {
    /// Document title
    pub title: Option<String>,

    /// Document author
    pub author: Option<String>,

    /// Document subject
    pub subject: Option<String>,

    /// Keywords
    pub keywords: Option<String>,

    /// Creator application
    pub creator: Option<String>,

    /// PDF producer
    pub producer: Option<String>,

    /// Creation date
    pub created: Option<DateTime<Utc>>,

    /// Last modification date
    pub modified: Option<DateTime<Utc>>,

    /// PDF version (e.g., "1.7")
    pub pdf_version: String,

    /// Total number of pages in the source file
    pub page_count: u32,

    /// Whether the document is encrypted
    pub encrypted: bool,
}

impl Metadata {
    /// Create new metadata with PDF version.
    pub fn with_version(version: impl Into<String>) -> Self {
        Self {
            pdf_version: version.into(),
            ..Default::default()
        }
    }

    /// Convert metadata to YAML frontmatter format.
    pub fn to_yaml_frontmatter(&self) -> String {
        let mut lines = vec!["---".to_string()];

        let text_fields = [
            ("title", &self.title),
            ("author", &self.author),
            ("subject", &self.subject),
            ("keywords", &self.keywords),
            ("creator", &self.creator),
            ("producer", &self.producer),
        ];
        for (key, value) in text_fields {
            if let Some(value) = value {
                lines.push(format!("{}: \"{}\"", key, escape_yaml(value)));
            }
        }
        if let Some(ref created) = self.created {
            lines.push(format!("created: {}", created.to_rfc3339()));
        }
        if let Some(ref modified) = self.modified {
            lines.push(format!("modified: {}", modified.to_rfc3339()));
        }

        if !self.pdf_version.is_empty() {
            lines.push(format!("pdf_version: \"{}\"", self.pdf_version));
        }
        lines.push(format!("pages: {}", self.page_count));

        lines.push("---".to_string());
        lines.push(String::new());

        lines.join("\n")
    }
}

/// Escape special characters for YAML strings.
fn escape_yaml(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RawItem;

    fn page(index: usize, orders: &[u64]) -> Page {
        Page::new(
            index,
            orders
                .iter()
                .map(|o| {
                    RawItem::new("text-run")
                        .with_field("str", format!("#{}", o))
                        .into_item(*o)
                })
                .collect(),
        )
    }

    #[test]
    fn test_from_pages_valid() {
        let doc = Document::from_pages(Metadata::default(), vec![page(0, &[0, 1]), page(2, &[2])])
            .unwrap();
        assert_eq!(doc.page_count(), 2);
        assert_eq!(doc.item_count(), 3);
        let orders: Vec<u64> = doc.items().map(Item::order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[test]
    fn test_from_pages_rejects_empty() {
        let result = Document::from_pages(Metadata::default(), vec![]);
        assert!(matches!(result, Err(Error::EmptyDocument)));
    }

    #[test]
    fn test_from_pages_rejects_duplicate_order() {
        let result =
            Document::from_pages(Metadata::default(), vec![page(0, &[0, 1]), page(1, &[1])]);
        assert!(matches!(result, Err(Error::InvalidDocument(_))));
    }

    #[test]
    fn test_from_pages_rejects_unsorted_pages() {
        let result = Document::from_pages(Metadata::default(), vec![page(1, &[0]), page(0, &[1])]);
        assert!(matches!(result, Err(Error::InvalidDocument(_))));
    }

    #[test]
    fn test_try_map_items() {
        let doc = Document::from_pages(Metadata::default(), vec![page(0, &[0, 1])]).unwrap();
        let doc = doc
            .try_map_items(|item| Ok(item.retag("paragraph")))
            .unwrap();
        assert!(doc.items().all(|i| i.is("paragraph")));
    }

    #[test]
    fn test_metadata_frontmatter() {
        let mut metadata = Metadata::with_version("1.7");
        metadata.title = Some("Test \"Document\"".to_string());
        metadata.author = Some("Jane Roe".to_string());
        metadata.page_count = 10;

        let yaml = metadata.to_yaml_frontmatter();
        assert!(yaml.starts_with("---\n"));
        assert!(yaml.contains("title: \"Test \\\"Document\\\"\""));
        assert!(yaml.contains("author: \"Jane Roe\""));
        assert!(yaml.contains("pdf_version: \"1.7\""));
        assert!(yaml.contains("pages: 10"));
        assert!(yaml.ends_with("---\n"));
    }
}
