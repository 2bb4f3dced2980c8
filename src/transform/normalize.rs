//! Unicode cleanup of item text.

use crate::error::Result;
use crate::model::{field, Document};
use crate::text;

use super::Transformer;

/// Rewrites every `str` field: NFC normalization, ligature expansion
/// (ﬁ → fi) and removal of U+FFFD replacement characters.
///
/// Items keep their type and order; an item whose text becomes empty is kept
/// with an empty `str`.
#[derive(Debug, Clone, Default)]
pub struct TextNormalizer;

impl TextNormalizer {
    /// Create a normalizer.
    pub fn new() -> Self {
        Self
    }
}

impl Transformer for TextNormalizer {
    fn name(&self) -> &str {
        "normalize-text"
    }

    fn apply(&self, doc: Document) -> Result<Document> {
        doc.try_map_items(|item| match item.string(field::STR) {
            Some(s) => {
                let normalized = text::normalize(s);
                if normalized == s {
                    Ok(item)
                } else {
                    Ok(item.with_field(field::STR, normalized))
                }
            }
            None => Ok(item),
        })
    }
}
