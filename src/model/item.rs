//! Positioned content items.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::schema::FieldType;

/// Well-known item type tags.
pub mod item_type {
    /// A raw positioned text run, as extracted.
    pub const TEXT_RUN: &str = "text-run";
    /// Body text.
    pub const PARAGRAPH: &str = "paragraph";
    /// A heading; carries a `level` field (1-6).
    pub const HEADING: &str = "heading";
    /// A list entry; carries `level`, `ordered` and `marker` fields.
    pub const LIST_ITEM: &str = "list-item";
}

/// Well-known field names.
pub mod field {
    /// Extracted text.
    pub const STR: &str = "str";
    /// 0-based page index.
    pub const PAGE: &str = "page";
    /// Left edge in PDF user space.
    pub const X: &str = "x";
    /// Baseline in PDF user space (grows upwards).
    pub const Y: &str = "y";
    /// Advance width of the run.
    pub const WIDTH: &str = "width";
    /// Line height of the run.
    pub const HEIGHT: &str = "height";
    /// Effective font size in points.
    pub const FONT_SIZE: &str = "font_size";
    /// Base font name (e.g. "Helvetica-Bold").
    pub const FONT_NAME: &str = "font_name";
    /// Heading level or list nesting depth.
    pub const LEVEL: &str = "level";
    /// Whether a list item is numbered.
    pub const ORDERED: &str = "ordered";
    /// Original list marker text ("•", "3.", ...).
    pub const MARKER: &str = "marker";
}

/// A single field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Boolean flag
    Bool(bool),
    /// Whole number
    Integer(i64),
    /// Floating point number
    Number(f64),
    /// Text
    Str(String),
}

impl FieldValue {
    /// The schema type of this value.
    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::Bool(_) => FieldType::Bool,
            FieldValue::Integer(_) => FieldType::Integer,
            FieldValue::Number(_) => FieldType::Number,
            FieldValue::Str(_) => FieldType::String,
        }
    }

    /// Numeric view; integers widen to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Integer(i) => Some(*i as f64),
            _ => None,
        }
    }

    /// Integer view.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            FieldValue::Integer(i) => Some(*i),
            _ => None,
        }
    }

    /// String view.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean view.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            FieldValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Str(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Str(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<f32> for FieldValue {
    fn from(n: f32) -> Self {
        FieldValue::Number(n as f64)
    }
}

impl From<i64> for FieldValue {
    fn from(i: i64) -> Self {
        FieldValue::Integer(i)
    }
}

impl From<usize> for FieldValue {
    fn from(i: usize) -> Self {
        FieldValue::Integer(i as i64)
    }
}

impl From<u8> for FieldValue {
    fn from(i: u8) -> Self {
        FieldValue::Integer(i as i64)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        FieldValue::Bool(b)
    }
}

/// An extracted item that has not been assigned an `order` yet.
///
/// This is the boundary type between a content extractor and the
/// document model builder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawItem {
    /// Item type tag
    #[serde(rename = "type")]
    pub item_type: String,
    /// Field name to value
    pub fields: BTreeMap<String, FieldValue>,
}

impl RawItem {
    /// Create an item with no fields.
    pub fn new(item_type: impl Into<String>) -> Self {
        Self {
            item_type: item_type.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Create a positioned text run carrying every standard layout field.
    #[allow(clippy::too_many_arguments)]
    pub fn text_run(
        text: impl Into<String>,
        page: usize,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        font_size: f64,
        font_name: impl Into<String>,
    ) -> Self {
        Self::new(item_type::TEXT_RUN)
            .with_field(field::STR, text.into())
            .with_field(field::PAGE, page)
            .with_field(field::X, x)
            .with_field(field::Y, y)
            .with_field(field::WIDTH, width)
            .with_field(field::HEIGHT, height)
            .with_field(field::FONT_SIZE, font_size)
            .with_field(field::FONT_NAME, font_name.into())
    }

    /// Set a field.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Attach a reading-order sequence number.
    pub fn into_item(self, order: u64) -> Item {
        Item {
            item_type: self.item_type,
            fields: self.fields,
            order,
        }
    }
}

/// One positioned content unit inside a [`Document`](super::Document).
///
/// Items are values: rewriting one (`retag`, `with_field`) consumes it and
/// returns the new version with the same `order`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    #[serde(rename = "type")]
    item_type: String,
    fields: BTreeMap<String, FieldValue>,
    order: u64,
}

impl Item {
    /// Create an item directly (test fixtures, custom transformers).
    pub fn new(
        item_type: impl Into<String>,
        fields: BTreeMap<String, FieldValue>,
        order: u64,
    ) -> Self {
        Self {
            item_type: item_type.into(),
            fields,
            order,
        }
    }

    /// Item type tag at the current pipeline stage.
    pub fn item_type(&self) -> &str {
        &self.item_type
    }

    /// Check the type tag.
    pub fn is(&self, item_type: &str) -> bool {
        self.item_type == item_type
    }

    /// Reading-order sequence number.
    pub fn order(&self) -> u64 {
        self.order
    }

    /// All fields.
    pub fn fields(&self) -> &BTreeMap<String, FieldValue> {
        &self.fields
    }

    /// A single field.
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    /// A numeric field (integers widen).
    pub fn number(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(FieldValue::as_f64)
    }

    /// An integer field.
    pub fn integer(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(FieldValue::as_i64)
    }

    /// A string field.
    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str)
    }

    /// A boolean field.
    pub fn boolean(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(FieldValue::as_bool)
    }

    /// The `str` field, or `""` when absent.
    pub fn text(&self) -> &str {
        self.string(field::STR).unwrap_or_default()
    }

    /// Left edge.
    pub fn x(&self) -> f64 {
        self.number(field::X).unwrap_or(0.0)
    }

    /// Baseline.
    pub fn y(&self) -> f64 {
        self.number(field::Y).unwrap_or(0.0)
    }

    /// Advance width.
    pub fn width(&self) -> f64 {
        self.number(field::WIDTH).unwrap_or(0.0)
    }

    /// Right edge.
    pub fn right(&self) -> f64 {
        self.x() + self.width()
    }

    /// Font size in points.
    pub fn font_size(&self) -> f64 {
        self.number(field::FONT_SIZE).unwrap_or(0.0)
    }

    /// Return this item with a new type tag.
    pub fn retag(mut self, item_type: impl Into<String>) -> Self {
        self.item_type = item_type.into();
        self
    }

    /// Return this item with a field set.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Return this item with a field removed.
    pub fn without_field(mut self, name: &str) -> Self {
        self.fields.remove(name);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_run_fields() {
        let item = RawItem::text_run("Hi", 2, 10.0, 20.0, 8.0, 12.0, 12.0, "Courier").into_item(5);
        assert!(item.is(item_type::TEXT_RUN));
        assert_eq!(item.order(), 5);
        assert_eq!(item.text(), "Hi");
        assert_eq!(item.integer(field::PAGE), Some(2));
        assert_eq!(item.right(), 18.0);
        assert_eq!(item.string(field::FONT_NAME), Some("Courier"));
    }

    #[test]
    fn test_retag_keeps_order() {
        let item = RawItem::new(item_type::TEXT_RUN).into_item(3);
        let item = item.retag(item_type::HEADING).with_field(field::LEVEL, 1u8);
        assert_eq!(item.order(), 3);
        assert_eq!(item.item_type(), "heading");
        assert_eq!(item.integer(field::LEVEL), Some(1));
    }

    #[test]
    fn test_number_widens_integer() {
        let item = RawItem::new("x").with_field("n", 4i64).into_item(0);
        assert_eq!(item.number("n"), Some(4.0));
        assert_eq!(item.integer("n"), Some(4));
        assert_eq!(item.string("n"), None);
    }

    #[test]
    fn test_raw_item_json_shape() {
        let raw = RawItem::new("text-run").with_field("str", "Hello");
        let json = serde_json::to_string(&raw).unwrap();
        assert_eq!(json, r#"{"type":"text-run","fields":{"str":"Hello"}}"#);

        let back: RawItem = serde_json::from_str(&json).unwrap();
        assert_eq!(back, raw);
    }
}
