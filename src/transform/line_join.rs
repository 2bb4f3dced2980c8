//! Joining of line fragments.
//!
//! PDF producers often emit one logical line as several text-showing
//! operators (kerning, font switches, per-glyph positioning). This stage
//! merges such fragments back together before any statistics are taken.

use crate::error::{Error, Result};
use crate::model::{field, item_type, Document, Item, Page};

use super::{require_number, Transformer};

/// Baseline difference allowed, as a fraction of the font size.
const BASELINE_FACTOR: f64 = 0.3;
/// Horizontal gap allowed, as a fraction of the font size.
const GAP_FACTOR: f64 = 0.25;
/// Horizontal overlap allowed, as a fraction of the font size.
///
/// Advance widths are estimates when a font declares no widths.
const OVERLAP_FACTOR: f64 = 0.5;

const NAME: &str = "line-join";

/// Merges adjacent `text-run` fragments of one logical line.
///
/// Two consecutive runs on a page merge when their baselines are within
/// `tolerance × 0.3 × font_size`, the second does not start left of the
/// first, and it starts no more than `tolerance × 0.25 × font_size` to the
/// right of the first one's end.
/// Text is concatenated with no separator; the merged item keeps the
/// first fragment's `order` and fields, with the union of both extents.
#[derive(Debug, Clone)]
pub struct LineJoiner {
    tolerance: f64,
}

impl LineJoiner {
    /// Create a joiner with tolerance 1.0.
    pub fn new() -> Self {
        Self { tolerance: 1.0 }
    }

    /// Scale every distance threshold.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// The configured tolerance.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    fn joins(&self, prev: &Item, next: &Item) -> Result<bool> {
        if !prev.is(item_type::TEXT_RUN) || !next.is(item_type::TEXT_RUN) {
            return Ok(false);
        }

        let font_size = require_number(NAME, prev, field::FONT_SIZE)?
            .max(require_number(NAME, next, field::FONT_SIZE)?);
        let baseline =
            (require_number(NAME, prev, field::Y)? - require_number(NAME, next, field::Y)?).abs();
        let prev_x = require_number(NAME, prev, field::X)?;
        let next_x = require_number(NAME, next, field::X)?;
        let gap = next_x - (prev_x + require_number(NAME, prev, field::WIDTH)?);

        // Fragments only merge in left-to-right reading order
        let scale = self.tolerance * font_size;
        Ok(baseline <= BASELINE_FACTOR * scale
            && next_x >= prev_x
            && gap <= GAP_FACTOR * scale
            && gap >= -OVERLAP_FACTOR * scale)
    }

    fn join_page(&self, page: Page) -> Result<Page> {
        let index = page.index();
        let mut joined: Vec<Item> = Vec::with_capacity(page.len());

        for item in page.into_items() {
            match joined.pop() {
                Some(prev) if self.joins(&prev, &item)? => {
                    log::trace!(
                        "line-join: {:?} + {:?} (orders {} + {})",
                        prev.text(),
                        item.text(),
                        prev.order(),
                        item.order()
                    );
                    joined.push(merge(prev, &item));
                }
                Some(prev) => {
                    joined.push(prev);
                    joined.push(item);
                }
                None => joined.push(item),
            }
        }

        Ok(Page::new(index, joined))
    }
}

impl Default for LineJoiner {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for LineJoiner {
    fn name(&self) -> &str {
        NAME
    }

    fn apply(&self, doc: Document) -> Result<Document> {
        if !self.tolerance.is_finite() || self.tolerance < 0.0 {
            return Err(Error::transform(
                NAME,
                format!("tolerance must be a non-negative number, got {}", self.tolerance),
            ));
        }
        doc.try_map_pages(|page| self.join_page(page))
    }
}

/// Concatenate `next` onto `prev`, keeping `prev`'s order.
fn merge(prev: Item, next: &Item) -> Item {
    let text = format!("{}{}", prev.text(), next.text());
    let left = prev.x().min(next.x());
    let right = prev.right().max(next.right());
    let height = prev
        .number(field::HEIGHT)
        .unwrap_or(0.0)
        .max(next.number(field::HEIGHT).unwrap_or(0.0));

    prev.with_field(field::STR, text)
        .with_field(field::X, left)
        .with_field(field::WIDTH, right - left)
        .with_field(field::HEIGHT, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, RawItem};

    fn run(text: &str, x: f64, y: f64, width: f64, size: f64) -> RawItem {
        RawItem::text_run(text, 0, x, y, width, size, size, "Helvetica")
    }

    fn doc(runs: Vec<RawItem>) -> Document {
        let items = runs
            .into_iter()
            .enumerate()
            .map(|(i, r)| r.into_item(10 + i as u64))
            .collect();
        Document::from_pages(Metadata::default(), vec![Page::new(0, items)]).unwrap()
    }

    #[test]
    fn test_joins_fragments_without_separator() {
        let doc = doc(vec![
            run("Hel", 72.0, 700.0, 18.0, 12.0),
            run("lo", 90.0, 700.0, 12.0, 12.0),
        ]);

        let doc = LineJoiner::new().apply(doc).unwrap();
        let items = doc.pages()[0].items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text(), "Hello");
        assert_eq!(items[0].order(), 10);
        assert_eq!(items[0].x(), 72.0);
        assert_eq!(items[0].width(), 30.0);
    }

    #[test]
    fn test_chain_of_fragments() {
        let doc = doc(vec![
            run("a", 0.0, 100.0, 5.0, 10.0),
            run("b", 5.0, 100.5, 5.0, 10.0),
            run("c", 11.0, 100.0, 5.0, 10.0),
        ]);
        let doc = LineJoiner::new().apply(doc).unwrap();
        assert_eq!(doc.plain_text(), "abc");
    }

    #[test]
    fn test_keeps_separate_lines_apart() {
        let doc = doc(vec![
            run("first line", 72.0, 700.0, 60.0, 12.0),
            run("second line", 72.0, 686.0, 66.0, 12.0),
        ]);
        let doc = LineJoiner::new().apply(doc).unwrap();
        assert_eq!(doc.item_count(), 2);
    }

    #[test]
    fn test_word_gap_is_not_joined() {
        // A 6pt gap at 12pt exceeds 0.25 em
        let doc = doc(vec![
            run("Hello", 72.0, 700.0, 30.0, 12.0),
            run("world", 108.0, 700.0, 30.0, 12.0),
        ]);
        let joined = LineJoiner::new().apply(doc.clone()).unwrap();
        assert_eq!(joined.item_count(), 2);

        // A larger tolerance accepts it
        let joined = LineJoiner::new().with_tolerance(2.5).apply(doc).unwrap();
        assert_eq!(joined.plain_text(), "Helloworld");
    }

    #[test]
    fn test_leftward_fragment_is_not_joined() {
        // "b" starts left of "a" though within the overlap allowance
        let doc = doc(vec![
            run("a", 100.0, 700.0, 2.0, 12.0),
            run("b", 96.0, 700.0, 6.0, 12.0),
        ]);
        let doc = LineJoiner::new().apply(doc).unwrap();
        let texts: Vec<&str> = doc.items().map(Item::text).collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn test_never_joins_across_pages() {
        let pages = vec![
            Page::new(0, vec![run("Hel", 72.0, 700.0, 18.0, 12.0).into_item(0)]),
            Page::new(1, vec![run("lo", 90.0, 700.0, 12.0, 12.0).into_item(1)]),
        ];
        let doc = Document::from_pages(Metadata::default(), pages).unwrap();
        let doc = LineJoiner::new().apply(doc).unwrap();
        assert_eq!(doc.item_count(), 2);
    }

    #[test]
    fn test_only_text_runs_are_joined() {
        let items = vec![
            run("Hel", 72.0, 700.0, 18.0, 12.0).into_item(0),
            run("lo", 90.0, 700.0, 12.0, 12.0)
                .into_item(1)
                .retag(item_type::HEADING),
        ];
        let doc = Document::from_pages(Metadata::default(), vec![Page::new(0, items)]).unwrap();

        let doc = LineJoiner::new().apply(doc).unwrap();
        assert_eq!(doc.item_count(), 2);
    }

    #[test]
    fn test_missing_geometry_is_a_transform_error() {
        let doc = doc(vec![
            run("Hel", 72.0, 700.0, 18.0, 12.0),
            RawItem::new(item_type::TEXT_RUN).with_field(field::STR, "lo"),
        ]);
        let err = LineJoiner::new().apply(doc).unwrap_err();
        assert!(matches!(
            err,
            Error::Transform { ref transformer, order: Some(11), .. } if transformer == "line-join"
        ));
    }

    #[test]
    fn test_negative_tolerance_rejected() {
        let doc = doc(vec![run("a", 0.0, 0.0, 5.0, 10.0)]);
        assert!(LineJoiner::new().with_tolerance(-1.0).apply(doc).is_err());
    }
}
