//! Serialization of a [`Document`] into text.
//!
//! Conversion is data driven: a [`ConversionStrategy`] is a lookup table
//! from item type tag to render function, plus an optional fallback and the
//! separator placed between rendered items. Adding an output format means
//! building a new table, not touching the converter.
//!
//! # Example
//!
//! ```
//! use pdfdown::convert::{ConversionStrategy, Converter};
//! use pdfdown::model::{Document, Metadata, Page, RawItem};
//!
//! fn main() -> pdfdown::Result<()> {
//!     let item = RawItem::new("heading")
//!         .with_field("str", "Intro")
//!         .with_field("level", 2i64)
//!         .into_item(0);
//!     let doc = Document::from_pages(Metadata::default(), vec![Page::new(0, vec![item])])?;
//!
//!     let markdown = Converter::convert(&doc, &ConversionStrategy::markdown())?;
//!     assert_eq!(markdown, "## Intro");
//!     Ok(())
//! }
//! ```

mod json;

pub use json::{to_json, JsonFormat};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{field, item_type, Document, Item};

/// Renders one item to text. An empty string means "render nothing".
pub type RenderFn = Arc<dyn Fn(&Item) -> String + Send + Sync>;

/// Lookup table driving the [`Converter`].
#[derive(Clone)]
pub struct ConversionStrategy {
    renderers: HashMap<String, RenderFn>,
    fallback: Option<RenderFn>,
    separator: String,
}

impl ConversionStrategy {
    /// An empty table: no rules, no fallback, items joined by `"\n"`.
    pub fn new() -> Self {
        Self {
            renderers: HashMap::new(),
            fallback: None,
            separator: "\n".to_string(),
        }
    }

    /// Every item renders its `str` field, one per line.
    pub fn plain_text() -> Self {
        Self::new().with_fallback(|item: &Item| item.text().to_string())
    }

    /// CommonMark output.
    ///
    /// Headings become `#` lines, list items `-` or `N.` entries indented two
    /// spaces per nesting level, and text items are emitted with Markdown
    /// syntax characters escaped. Items of any other type render nothing.
    /// Blocks are separated by a blank line.
    pub fn markdown() -> Self {
        Self::new()
            .with_renderer(item_type::TEXT_RUN, |item: &Item| escape_markdown(item.text()))
            .with_renderer(item_type::PARAGRAPH, |item: &Item| escape_markdown(item.text()))
            .with_renderer(item_type::HEADING, render_heading)
            .with_renderer(item_type::LIST_ITEM, render_list_item)
            .with_fallback(|_: &Item| String::new())
            .with_separator("\n\n")
    }

    /// Set the render function for an item type, replacing any existing one.
    pub fn with_renderer<F>(mut self, item_type: impl Into<String>, render: F) -> Self
    where
        F: Fn(&Item) -> String + Send + Sync + 'static,
    {
        self.renderers.insert(item_type.into(), Arc::new(render));
        self
    }

    /// Set the render function used for unmapped item types.
    pub fn with_fallback<F>(mut self, render: F) -> Self
    where
        F: Fn(&Item) -> String + Send + Sync + 'static,
    {
        self.fallback = Some(Arc::new(render));
        self
    }

    /// Remove the fallback: unmapped item types become an error.
    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    /// Set the separator placed between rendered items.
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// The separator placed between rendered items.
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Check if an item type has its own rule.
    pub fn handles(&self, item_type: &str) -> bool {
        self.renderers.contains_key(item_type)
    }

    /// Item types with a rule, sorted.
    pub fn item_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.renderers.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    fn renderer_for(&self, item_type: &str) -> Option<&RenderFn> {
        self.renderers.get(item_type).or(self.fallback.as_ref())
    }
}

/// The Markdown rules joined by the converter's default `"\n"` separator.
///
/// Use [`ConversionStrategy::markdown`] to keep blocks apart with blank lines.
impl Default for ConversionStrategy {
    fn default() -> Self {
        Self::markdown().with_separator("\n")
    }
}

impl fmt::Debug for ConversionStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConversionStrategy")
            .field("item_types", &self.item_types())
            .field("fallback", &self.fallback.is_some())
            .field("separator", &self.separator)
            .finish()
    }
}

/// Walks a document and renders it through a [`ConversionStrategy`].
pub struct Converter;

impl Converter {
    /// Render every item, pages by index and items by `order`.
    ///
    /// Empty renders are skipped so they never produce a doubled separator.
    /// An item type with no rule fails with [`Error::UnhandledItemType`]
    /// unless the strategy has a fallback.
    pub fn convert(doc: &Document, strategy: &ConversionStrategy) -> Result<String> {
        let mut parts: Vec<String> = Vec::with_capacity(doc.item_count());

        for item in doc.items() {
            let render = strategy
                .renderer_for(item.item_type())
                .ok_or_else(|| Error::UnhandledItemType {
                    item_type: item.item_type().to_string(),
                    order: item.order(),
                })?;

            let text = render(item);
            if !text.is_empty() {
                parts.push(text);
            }
        }

        Ok(parts.join(&strategy.separator))
    }
}

fn render_heading(item: &Item) -> String {
    let text = escape_markdown(item.text().trim());
    if text.is_empty() {
        return String::new();
    }
    let level = item.integer(field::LEVEL).unwrap_or(1).clamp(1, 6) as usize;
    format!("{} {}", "#".repeat(level), text)
}

fn render_list_item(item: &Item) -> String {
    let text = escape_markdown(item.text().trim());
    let level = item.integer(field::LEVEL).unwrap_or(1).clamp(1, 6) as usize;
    let indent = "  ".repeat(level - 1);

    let number = item
        .string(field::MARKER)
        .map(|m| m.trim_end_matches(['.', ')']))
        .filter(|m| !m.is_empty() && m.chars().all(|c| c.is_ascii_digit()));
    match number {
        Some(n) if item.boolean(field::ORDERED).unwrap_or(false) => {
            format!("{}{}. {}", indent, n, text)
        }
        _ => format!("{}- {}", indent, text),
    }
}

/// Only escape characters that could be misinterpreted as Markdown syntax.
fn escape_markdown(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '`' | '*' | '_' | '[' | ']' | '|' => {
                result.push('\\');
                result.push(c);
            }
            _ => result.push(c),
        }
    }
    result
}
