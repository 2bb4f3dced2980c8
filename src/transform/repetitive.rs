//! Removal of running headers, footers and page numbers.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::model::{Document, Item};

use super::Transformer;

/// Fewest pages on which repetition can be told apart from coincidence.
const MIN_PAGES: usize = 3;

/// Drops the top-most and bottom-most line of a page when the same line
/// (ignoring digits and case) sits at that position on at least two thirds
/// of the pages.
///
/// Digits are ignored so that "Page 3 of 10" and a bare "7" count as
/// repetitions of "Page 4 of 10" and "8". Documents with fewer than three
/// pages are left unchanged.
#[derive(Debug, Clone)]
pub struct RepetitiveRemover {
    min_pages: usize,
}

impl RepetitiveRemover {
    /// Create a remover.
    pub fn new() -> Self {
        Self {
            min_pages: MIN_PAGES,
        }
    }
}

impl Default for RepetitiveRemover {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Edge {
    Top,
    Bottom,
}

impl Transformer for RepetitiveRemover {
    fn name(&self) -> &str {
        "remove-repetitive"
    }

    fn apply(&self, doc: Document) -> Result<Document> {
        let page_count = doc.page_count();
        if page_count < self.min_pages {
            return Ok(doc);
        }

        // Per page: (edge, key, order) of the edge lines
        let edges: Vec<Vec<(Edge, String, u64)>> = doc
            .pages()
            .iter()
            .map(|page| edge_lines(page.items()))
            .collect();

        let mut counts: HashMap<(Edge, &str), usize> = HashMap::new();
        for page_edges in &edges {
            for (edge, key, _) in page_edges {
                *counts.entry((*edge, key.as_str())).or_insert(0) += 1;
            }
        }

        // Repeats on at least 2/3 of the pages
        let threshold = (2 * page_count).div_ceil(3);
        let remove: HashSet<u64> = edges
            .iter()
            .flatten()
            .filter(|(edge, key, _)| counts[&(*edge, key.as_str())] >= threshold)
            .map(|(_, _, order)| *order)
            .collect();

        if remove.is_empty() {
            return Ok(doc);
        }
        log::debug!("remove-repetitive: dropping {} header/footer items", remove.len());

        doc.try_map_pages(|page| {
            let items = page
                .items()
                .iter()
                .filter(|item| !remove.contains(&item.order()))
                .cloned()
                .collect();
            Ok(page.with_items(items))
        })
    }
}

/// The top-most and bottom-most non-empty lines of a page.
fn edge_lines(items: &[Item]) -> Vec<(Edge, String, u64)> {
    let candidates: Vec<&Item> = items.iter().filter(|i| !i.text().trim().is_empty()).collect();
    // One line is no header/footer pair; it is the page's content
    if candidates.len() < 2 {
        return Vec::new();
    }

    let by_y = |a: &&&Item, b: &&&Item| a.y().total_cmp(&b.y());
    let top = candidates.iter().max_by(by_y);
    let bottom = candidates.iter().min_by(by_y);

    [(Edge::Top, top), (Edge::Bottom, bottom)]
        .into_iter()
        .filter_map(|(edge, item)| item.map(|i| (edge, repetition_key(i.text()), i.order())))
        .collect()
}

/// Lowercased text with digits removed and whitespace collapsed.
fn repetition_key(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_ascii_digit())
        .flat_map(char::to_lowercase)
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, Page, RawItem};

    fn page(index: usize, order: &mut u64, lines: &[(&str, f64)]) -> Page {
        let items = lines
            .iter()
            .map(|&(text, y)| {
                let item = RawItem::text_run(text, index, 72.0, y, 100.0, 12.0, 12.0, "Times")
                    .into_item(*order);
                *order += 1;
                item
            })
            .collect();
        Page::new(index, items)
    }

    fn document(pages: &[Vec<(&str, f64)>]) -> Document {
        let mut order = 0;
        let pages = pages
            .iter()
            .enumerate()
            .map(|(i, lines)| page(i, &mut order, lines))
            .collect();
        Document::from_pages(Metadata::default(), pages).unwrap()
    }

    #[test]
    fn test_removes_header_and_page_numbers() {
        let doc = document(&[
            vec![("Annual Report", 780.0), ("Intro text", 700.0), ("1", 30.0)],
            vec![("Annual Report", 780.0), ("More text", 700.0), ("2", 30.0)],
            vec![("Annual Report", 780.0), ("Final text", 700.0), ("3", 30.0)],
        ]);

        let doc = RepetitiveRemover::new().apply(doc).unwrap();
        assert_eq!(doc.plain_text(), "Intro text\n\nMore text\n\nFinal text");
    }

    #[test]
    fn test_two_of_three_pages_is_enough() {
        let doc = document(&[
            vec![("Page 1 of 3", 780.0), ("a", 700.0)],
            vec![("Page 2 of 3", 780.0), ("b", 700.0)],
            vec![("Chapter heading", 780.0), ("c", 700.0)],
        ]);

        let doc = RepetitiveRemover::new().apply(doc).unwrap();
        let first: Vec<&str> = doc.pages().iter().map(|p| p.items()[0].text()).collect();
        assert_eq!(first, vec!["a", "b", "Chapter heading"]);
    }

    #[test]
    fn test_short_documents_untouched() {
        let doc = document(&[
            vec![("Header", 780.0), ("a", 700.0)],
            vec![("Header", 780.0), ("b", 700.0)],
        ]);
        let out = RepetitiveRemover::new().apply(doc.clone()).unwrap();
        assert_eq!(out, doc);
    }

    #[test]
    fn test_body_text_kept() {
        let doc = document(&[
            vec![("One", 780.0), ("same body", 700.0), ("x", 30.0)],
            vec![("Two", 780.0), ("same body", 700.0), ("y", 30.0)],
            vec![("Three", 780.0), ("same body", 700.0), ("z", 30.0)],
        ]);
        let out = RepetitiveRemover::new().apply(doc.clone()).unwrap();
        assert_eq!(out, doc);
    }

    #[test]
    fn test_repetition_key() {
        assert_eq!(repetition_key("Page 12  of 40"), "page of");
        assert_eq!(repetition_key(" 7 "), "");
    }
}
