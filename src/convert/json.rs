//! JSON dump of a document.

use crate::error::{Error, Result};
use crate::model::Document;

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize a document, its metadata and every item with its fields.
pub fn to_json(doc: &Document, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(doc),
        JsonFormat::Compact => serde_json::to_string(doc),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Metadata, Page, RawItem};

    fn doc() -> Document {
        let metadata = Metadata {
            title: Some("Test".to_string()),
            ..Default::default()
        };
        let item = RawItem::new("paragraph").with_field("str", "Hello").into_item(7);
        Document::from_pages(metadata, vec![Page::new(0, vec![item])]).unwrap()
    }

    #[test]
    fn test_to_json_pretty() {
        let json = to_json(&doc(), JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"title\""));
        assert!(json.contains("Test"));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_to_json_compact() {
        let json = to_json(&doc(), JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        let item = &value["pages"][0]["items"][0];
        assert_eq!(item["type"], "paragraph");
        assert_eq!(item["order"], 7);
        assert_eq!(item["fields"]["str"], "Hello");
    }
}
