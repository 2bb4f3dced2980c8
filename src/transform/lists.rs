//! List item detection.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::Result;
use crate::model::{field, item_type, Document, Item, Page};

use super::Transformer;

/// Bullet or enumerator, then whitespace, then the entry text.
static LIST_MARKER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)^\s*([•●○■▪◦*\-–]|\d{1,3}[.)]|[a-zA-Z][.)])\s+(\S.*)$")
        .expect("valid list marker regex")
});

/// Horizontal distance of one nesting level, in points.
const INDENT_STEP: f64 = 18.0;
const MAX_LEVEL: f64 = 6.0;

/// Re-tags `paragraph` items that start with a list marker as `list-item`.
///
/// The marker is moved from `str` into the `marker` field, `ordered` is set
/// for enumerators, and `level` (1-6) is derived from the indentation
/// relative to the leftmost text line of the page.
#[derive(Debug, Clone, Default)]
pub struct ListDetector;

impl ListDetector {
    /// Create a detector.
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for ListDetector {
    fn name(&self) -> &str {
        "detect-lists"
    }

    fn apply(&self, doc: Document) -> Result<Document> {
        doc.try_map_pages(|page| Ok(detect_page(page)))
    }
}

fn detect_page(page: Page) -> Page {
    let margin = page
        .items()
        .iter()
        .filter(|i| i.is(item_type::PARAGRAPH) || i.is(item_type::LIST_ITEM))
        .filter_map(|i| i.number(field::X))
        .reduce(f64::min);
    let Some(margin) = margin else {
        return page;
    };

    let index = page.index();
    let items = page
        .into_items()
        .into_iter()
        .map(|item| {
            if item.is(item_type::PARAGRAPH) {
                as_list_item(item, margin)
            } else {
                item
            }
        })
        .collect();
    Page::new(index, items)
}

fn as_list_item(item: Item, margin: f64) -> Item {
    let Some(caps) = LIST_MARKER.captures(item.text()) else {
        return item;
    };
    let marker = caps[1].to_string();
    let text = caps[2].to_string();
    let ordered = marker.ends_with(['.', ')']);
    let level = 1.0 + ((item.x() - margin).max(0.0) / INDENT_STEP).floor();

    item.retag(item_type::LIST_ITEM)
        .with_field(field::STR, text)
        .with_field(field::MARKER, marker)
        .with_field(field::ORDERED, ordered)
        .with_field(field::LEVEL, level.min(MAX_LEVEL) as i64)
}
