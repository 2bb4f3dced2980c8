//! Font size statistics for heading detection.

use std::collections::BTreeMap;

use crate::model::{item_type, Document, Item};

/// Body size assumed when a document has no sized text.
const DEFAULT_BODY_SIZE: f64 = 12.0;

/// Font size histogram of a document, keyed in tenths of a point.
///
/// Each item counts once, whatever its length: a line split into three
/// fragments weighs three times as much as the same line joined.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FontStatistics {
    size_histogram: BTreeMap<i64, usize>,
}

impl FontStatistics {
    /// Collect the sizes of every classifiable item.
    pub fn collect(doc: &Document) -> Self {
        let mut stats = Self::default();
        for item in doc.items().filter(|i| is_classifiable(i)) {
            stats.add_size(item.font_size());
        }
        stats
    }

    /// Add a font size observation.
    pub fn add_size(&mut self, size: f64) {
        if size > 0.0 && size.is_finite() {
            *self.size_histogram.entry(size_key(size)).or_insert(0) += 1;
        }
    }

    /// Number of observations.
    pub fn total(&self) -> usize {
        self.size_histogram.values().sum()
    }

    /// Number of observations of a size.
    pub fn count(&self, size: f64) -> usize {
        self.size_histogram.get(&size_key(size)).copied().unwrap_or(0)
    }

    /// The most common font size; ties go to the smaller size.
    pub fn body_size(&self) -> f64 {
        let mut best: Option<(i64, usize)> = None;
        for (&key, &count) in &self.size_histogram {
            // Ascending keys: only a strictly higher count replaces the best
            if best.map_or(true, |(_, c)| count > c) {
                best = Some((key, count));
            }
        }
        best.map_or(DEFAULT_BODY_SIZE, |(key, _)| key as f64 / 10.0)
    }

    /// Distinct sizes at least `min_delta` above the body size, largest first.
    pub fn heading_sizes(&self, min_delta: f64) -> Vec<f64> {
        let threshold = size_key(self.body_size() + min_delta);
        self.size_histogram
            .keys()
            .rev()
            .filter(|k| **k >= threshold)
            .map(|k| *k as f64 / 10.0)
            .collect()
    }

    /// Heading level (1-6) of a font size, or `None` for body text.
    ///
    /// The level is the rank of the size among the distinct heading sizes:
    /// the largest size is level 1.
    pub fn heading_level(&self, font_size: f64, min_delta: f64) -> Option<u8> {
        let threshold = size_key(self.body_size() + min_delta);
        let key = size_key(font_size);
        if key < threshold {
            return None;
        }

        let larger = self
            .size_histogram
            .keys()
            .filter(|k| **k >= threshold && **k > key)
            .count();
        Some((larger + 1).min(6) as u8)
    }
}

/// Items whose type the classifier may rewrite.
pub(crate) fn is_classifiable(item: &Item) -> bool {
    item.is(item_type::TEXT_RUN) || item.is(item_type::PARAGRAPH) || item.is(item_type::HEADING)
}

fn size_key(size: f64) -> i64 {
    (size * 10.0).round() as i64 // 0.1pt precision
}
