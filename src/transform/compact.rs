//! Compaction of words into lines.

use crate::error::Result;
use crate::model::{field, item_type, Document, Item, Page};
use crate::text::join_words;

use super::Transformer;

/// Baseline difference allowed, as a fraction of the font size.
const BASELINE_FACTOR: f64 = 0.3;
/// Widest gap still treated as a word space (wider gaps are column gutters).
const MAX_WORD_GAP_FACTOR: f64 = 2.0;
/// Horizontal overlap allowed, as a fraction of the font size.
const OVERLAP_FACTOR: f64 = 0.5;

/// Merges the `text-run` items left on one baseline into a single line,
/// separated by single spaces.
///
/// Runs after [`LineJoiner`](super::LineJoiner): what remains on a baseline
/// is separated by real word gaps.
#[derive(Debug, Clone, Default)]
pub struct LineCompactor;

impl LineCompactor {
    /// Create a compactor.
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for LineCompactor {
    fn name(&self) -> &str {
        "compact-lines"
    }

    fn apply(&self, doc: Document) -> Result<Document> {
        doc.try_map_pages(|page| Ok(compact_page(page)))
    }
}

fn compact_page(page: Page) -> Page {
    let index = page.index();
    let mut lines: Vec<Item> = Vec::with_capacity(page.len());

    for item in page.into_items() {
        match lines.pop() {
            Some(prev) if same_line(&prev, &item) => {
                let text = join_words(prev.text(), item.text());
                let left = prev.x().min(item.x());
                let right = prev.right().max(item.right());
                lines.push(
                    prev.with_field(field::STR, text)
                        .with_field(field::X, left)
                        .with_field(field::WIDTH, right - left),
                );
            }
            Some(prev) => {
                lines.push(prev);
                lines.push(item);
            }
            None => lines.push(item),
        }
    }

    Page::new(index, lines)
}

fn same_line(prev: &Item, next: &Item) -> bool {
    if !prev.is(item_type::TEXT_RUN) || !next.is(item_type::TEXT_RUN) {
        return false;
    }
    let (Some(prev_y), Some(next_y)) = (prev.number(field::Y), next.number(field::Y)) else {
        return false;
    };

    let font_size = prev.font_size().max(next.font_size());
    let gap = next.x() - prev.right();
    (prev_y - next_y).abs() <= BASELINE_FACTOR * font_size
        && next.x() >= prev.x()
        && gap >= -OVERLAP_FACTOR * font_size
        && gap <= MAX_WORD_GAP_FACTOR * font_size
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, RawItem};

    fn doc(runs: &[(&str, f64, f64, f64)]) -> Document {
        let items = runs
            .iter()
            .enumerate()
            .map(|(i, &(text, x, y, width))| {
                RawItem::text_run(text, 0, x, y, width, 12.0, 12.0, "Times").into_item(i as u64)
            })
            .collect();
        Document::from_pages(Metadata::default(), vec![Page::new(0, items)]).unwrap()
    }

    #[test]
    fn test_words_become_one_line() {
        let doc = doc(&[
            ("Hello", 72.0, 700.0, 30.0),
            ("world", 105.0, 700.0, 30.0),
            ("next", 72.0, 686.0, 24.0),
        ]);
        let doc = LineCompactor::new().apply(doc).unwrap();

        let items = doc.pages()[0].items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text(), "Hello world");
        assert_eq!(items[0].width(), 63.0);
        assert_eq!(items[1].text(), "next");
        assert_eq!(items[1].order(), 2);
    }

    #[test]
    fn test_column_gutter_not_merged() {
        let doc = doc(&[("left", 72.0, 700.0, 24.0), ("right", 320.0, 700.0, 30.0)]);
        let doc = LineCompactor::new().apply(doc).unwrap();
        assert_eq!(doc.item_count(), 2);
    }

    #[test]
    fn test_run_left_of_previous_not_merged() {
        let doc = doc(&[("b", 100.0, 700.0, 2.0), ("a", 97.0, 700.0, 6.0)]);
        let doc = LineCompactor::new().apply(doc).unwrap();
        assert_eq!(doc.item_count(), 2);
    }

    #[test]
    fn test_existing_space_not_doubled() {
        let doc = doc(&[("Hello ", 72.0, 700.0, 33.0), ("world", 108.0, 700.0, 30.0)]);
        let doc = LineCompactor::new().apply(doc).unwrap();
        assert_eq!(doc.plain_text(), "Hello world");
    }
}
