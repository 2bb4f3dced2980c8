//! Gathering of lines into paragraphs.

use crate::error::Result;
use crate::model::{field, item_type, Document, Item, Page};
use crate::text::join_lines;

use super::Transformer;

/// Line spacing assumed when a page has fewer than two lines.
const DEFAULT_LINE_SPACING: f64 = 12.0;
/// Spacing above this multiple of the average starts a new paragraph.
const SPACING_FACTOR: f64 = 1.5;
/// Font size change (pt) that starts a new paragraph.
const FONT_SIZE_DELTA: f64 = 1.0;
/// Left margin shift (pt) that starts a new paragraph.
const MARGIN_DELTA: f64 = 20.0;

/// Merges consecutive `paragraph` lines of a page into one paragraph.
///
/// A new paragraph starts when the vertical spacing to the previous line
/// exceeds 1.5 times the page's average line spacing, when the font size
/// changes by more than 1pt, or when the left margin shifts by more than
/// 20pt. Lines are joined with a space and words hyphenated across the
/// line break are repaired. The merged item keeps the first line's order.
#[derive(Debug, Clone, Default)]
pub struct ParagraphGatherer;

impl ParagraphGatherer {
    /// Create a gatherer.
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for ParagraphGatherer {
    fn name(&self) -> &str {
        "gather-paragraphs"
    }

    fn apply(&self, doc: Document) -> Result<Document> {
        doc.try_map_pages(|page| Ok(gather_page(page)))
    }
}

/// A paragraph being built and the last line appended to it.
struct Open {
    paragraph: Item,
    first_height: f64,
    last: Item,
}

impl Open {
    fn start(line: Item) -> Self {
        Self {
            paragraph: line.clone(),
            first_height: line.number(field::HEIGHT).unwrap_or(0.0),
            last: line,
        }
    }

    fn append(self, line: Item) -> Self {
        let paragraph = &self.paragraph;
        let text = join_lines(paragraph.text(), line.text());
        let left = paragraph.x().min(line.x());
        let right = paragraph.right().max(line.right());
        // From the top of the first line down to the last baseline
        let height = self.first_height + (paragraph.y() - line.y()).abs();

        Self {
            paragraph: self
                .paragraph
                .with_field(field::STR, text)
                .with_field(field::X, left)
                .with_field(field::WIDTH, right - left)
                .with_field(field::HEIGHT, height),
            first_height: self.first_height,
            last: line,
        }
    }
}

fn gather_page(page: Page) -> Page {
    let avg_spacing = average_line_spacing(page.items());
    let index = page.index();
    let mut out: Vec<Item> = Vec::with_capacity(page.len());
    let mut open: Option<Open> = None;

    for item in page.into_items() {
        if !item.is(item_type::PARAGRAPH) {
            if let Some(done) = open.take() {
                out.push(done.paragraph);
            }
            out.push(item);
            continue;
        }

        open = Some(match open.take() {
            Some(current) if !should_break(&current.last, &item, avg_spacing) => {
                current.append(item)
            }
            Some(done) => {
                out.push(done.paragraph);
                Open::start(item)
            }
            None => Open::start(item),
        });
    }
    if let Some(done) = open {
        out.push(done.paragraph);
    }

    Page::new(index, out)
}

/// Average distance between consecutive paragraph baselines.
fn average_line_spacing(items: &[Item]) -> f64 {
    let lines: Vec<&Item> = items.iter().filter(|i| i.is(item_type::PARAGRAPH)).collect();
    let spacings: Vec<f64> = lines
        .windows(2)
        .map(|w| (w[0].y() - w[1].y()).abs())
        .filter(|s| *s > 0.1) // same-baseline pairs say nothing about leading
        .collect();

    if spacings.is_empty() {
        return DEFAULT_LINE_SPACING;
    }
    spacings.iter().sum::<f64>() / spacings.len() as f64
}

fn should_break(prev: &Item, curr: &Item, avg_spacing: f64) -> bool {
    let spacing = (prev.y() - curr.y()).abs();
    if spacing > avg_spacing * SPACING_FACTOR {
        return true;
    }

    if (prev.font_size() - curr.font_size()).abs() > FONT_SIZE_DELTA {
        return true;
    }

    (prev.x() - curr.x()).abs() > MARGIN_DELTA
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, RawItem};

    fn line(text: &str, x: f64, y: f64, size: f64, order: u64) -> Item {
        RawItem::text_run(text, 0, x, y, 200.0, size, size, "Times")
            .into_item(order)
            .retag(item_type::PARAGRAPH)
    }

    fn doc(items: Vec<Item>) -> Document {
        Document::from_pages(Metadata::default(), vec![Page::new(0, items)]).unwrap()
    }

    #[test]
    fn test_lines_gathered_until_gap() {
        let doc = doc(vec![
            line("The quick brown", 72.0, 700.0, 12.0, 0),
            line("fox jumps.", 72.0, 686.0, 12.0, 1),
            line("A new para-", 72.0, 650.0, 12.0, 2),
            line("graph starts here.", 72.0, 636.0, 12.0, 3),
        ]);

        let doc = ParagraphGatherer::new().apply(doc).unwrap();
        let items = doc.pages()[0].items();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].text(), "The quick brown fox jumps.");
        assert_eq!(items[0].order(), 0);
        assert_eq!(items[0].number(field::HEIGHT), Some(26.0));
        assert_eq!(items[1].text(), "A new paragraph starts here.");
        assert_eq!(items[1].order(), 2);
    }

    #[test]
    fn test_inline_hyphens_survive_gathering() {
        let doc = doc(vec![
            line("Both pre- and post-processing apply", 72.0, 700.0, 12.0, 0),
            line("to the data.", 72.0, 686.0, 12.0, 1),
        ]);

        let doc = ParagraphGatherer::new().apply(doc).unwrap();
        assert_eq!(doc.item_count(), 1);
        assert_eq!(
            doc.items().next().unwrap().text(),
            "Both pre- and post-processing apply to the data."
        );
    }

    #[test]
    fn test_font_size_and_margin_break_paragraphs() {
        let doc = doc(vec![
            line("body", 72.0, 700.0, 12.0, 0),
            line("small print", 72.0, 686.0, 9.0, 1),
            line("indented quote", 120.0, 672.0, 9.0, 2),
        ]);
        let doc = ParagraphGatherer::new().apply(doc).unwrap();
        assert_eq!(doc.item_count(), 3);
    }

    #[test]
    fn test_other_items_interrupt_paragraphs() {
        let heading = RawItem::text_run("Title", 0, 72.0, 686.0, 50.0, 12.0, 12.0, "Times")
            .into_item(1)
            .retag(item_type::HEADING);
        let doc = doc(vec![
            line("before", 72.0, 700.0, 12.0, 0),
            heading,
            line("after", 72.0, 672.0, 12.0, 2),
        ]);
        let doc = ParagraphGatherer::new().apply(doc).unwrap();
        let types: Vec<&str> = doc.items().map(Item::item_type).collect();
        assert_eq!(types, vec!["paragraph", "heading", "paragraph"]);
    }

    #[test]
    fn test_average_spacing_default() {
        assert_eq!(average_line_spacing(&[]), DEFAULT_LINE_SPACING);
        let same_baseline = vec![line("a", 0.0, 100.0, 12.0, 0), line("b", 50.0, 100.0, 12.0, 1)];
        assert_eq!(average_line_spacing(&same_baseline), DEFAULT_LINE_SPACING);
    }
}
