//! Heading classification by font size.

use crate::error::Result;
use crate::model::{field, item_type, Document};

use super::stats::{is_classifiable, FontStatistics};
use super::Transformer;

/// Minimum size difference (in points) between body text and a heading.
const DEFAULT_MIN_DELTA: f64 = 1.5;

/// Two-pass classifier.
///
/// The first pass builds [`FontStatistics`] over the whole document; the
/// most frequent font size is the body size. The second pass re-tags every
/// `text-run`, `paragraph` or `heading` item: sizes at least `min_delta`
/// above the body size become `heading` items with a `level` (1 for the
/// largest size), everything else becomes `paragraph`. Other item types
/// pass through untouched.
#[derive(Debug, Clone)]
pub struct HeadingClassifier {
    min_delta: f64,
}

impl HeadingClassifier {
    /// Create a classifier with the default 1.5pt threshold.
    pub fn new() -> Self {
        Self {
            min_delta: DEFAULT_MIN_DELTA,
        }
    }

    /// Set the heading size threshold.
    pub fn with_min_delta(mut self, min_delta: f64) -> Self {
        self.min_delta = min_delta;
        self
    }
}

impl Default for HeadingClassifier {
    fn default() -> Self {
        Self::new()
    }
}

impl Transformer for HeadingClassifier {
    fn name(&self) -> &str {
        "classify"
    }

    fn apply(&self, doc: Document) -> Result<Document> {
        let stats = FontStatistics::collect(&doc);
        log::debug!(
            "classify: body size {:.1}pt, heading sizes {:?}",
            stats.body_size(),
            stats.heading_sizes(self.min_delta)
        );

        doc.try_map_items(|item| {
            if !is_classifiable(&item) {
                return Ok(item);
            }
            Ok(match stats.heading_level(item.font_size(), self.min_delta) {
                Some(level) => item
                    .retag(item_type::HEADING)
                    .with_field(field::LEVEL, level),
                None => item.retag(item_type::PARAGRAPH).without_field(field::LEVEL),
            })
        })
    }
}
