//! Page-level types.

use super::Item;
use serde::Serialize;

/// A single page: its 0-based index and its items in reading order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page {
    index: usize,
    items: Vec<Item>,
}

impl Page {
    /// Create a page. Items are sorted by `order`.
    pub fn new(index: usize, mut items: Vec<Item>) -> Self {
        items.sort_by_key(Item::order);
        Self { index, items }
    }

    /// 0-based page index.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Items in `order` sequence.
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Take ownership of the items.
    pub fn into_items(self) -> Vec<Item> {
        self.items
    }

    /// Build a page with the same index and new items.
    pub fn with_items(&self, items: Vec<Item>) -> Self {
        Self::new(self.index, items)
    }

    /// Check if the page has no items.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of items on the page.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Get plain text content of the page, one item per line.
    pub fn plain_text(&self) -> String {
        self.items
            .iter()
            .map(Item::text)
            .filter(|t| !t.is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
