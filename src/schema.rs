//! Item schema validation.
//!
//! Every item produced by a [`ContentExtractor`](crate::extract::ContentExtractor)
//! is checked against an [`ItemSchema`] exactly once, before the document
//! model is built. Transformers run after this point and are trusted to keep
//! the fields they touch well-formed.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::model::{field, FieldValue, RawItem};

/// Value type a schema can require for a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    /// UTF-8 text
    String,
    /// Floating point number (integers are accepted too)
    Number,
    /// Whole number
    Integer,
    /// Boolean flag
    Bool,
}

impl FieldType {
    /// Whether a value of type `actual` satisfies a requirement of `self`.
    pub fn accepts(self, actual: FieldType) -> bool {
        self == actual || (self == FieldType::Number && actual == FieldType::Integer)
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Integer => "integer",
            FieldType::Bool => "bool",
        };
        f.write_str(name)
    }
}

/// One required field of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Field name
    pub name: String,
    /// Expected value type
    pub ty: FieldType,
}

impl FieldSpec {
    /// Create a field requirement.
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }
}

/// Declared shape of an extracted item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSchema {
    /// Fields every item must carry
    pub required: Vec<FieldSpec>,
}

impl ItemSchema {
    /// Create an empty schema (accepts every item).
    pub fn new() -> Self {
        Self::default()
    }

    /// Schema for positioned text runs, as produced by the lopdf extractor.
    pub fn text_run() -> Self {
        Self::new()
            .require(field::STR, FieldType::String)
            .require(field::PAGE, FieldType::Integer)
            .require(field::X, FieldType::Number)
            .require(field::Y, FieldType::Number)
            .require(field::WIDTH, FieldType::Number)
            .require(field::HEIGHT, FieldType::Number)
            .require(field::FONT_SIZE, FieldType::Number)
            .require(field::FONT_NAME, FieldType::String)
    }

    /// Add a required field.
    pub fn require(mut self, name: impl Into<String>, ty: FieldType) -> Self {
        self.required.push(FieldSpec::new(name, ty));
        self
    }

    /// Validate an item, returning it unchanged when it conforms.
    ///
    /// Fails with [`Error::SchemaViolation`] on the first required field
    /// that is missing or has the wrong type.
    pub fn validate(&self, item: RawItem) -> Result<RawItem> {
        for spec in &self.required {
            let actual = item.fields.get(&spec.name).map(FieldValue::field_type);
            match actual {
                Some(ty) if spec.ty.accepts(ty) => {}
                _ => {
                    return Err(Error::SchemaViolation {
                        field: spec.name.clone(),
                        expected: spec.ty,
                        actual,
                    })
                }
            }
        }
        Ok(item)
    }

    /// Validate a whole page worth of items.
    pub fn validate_all(&self, items: Vec<RawItem>) -> Result<Vec<RawItem>> {
        items.into_iter().map(|item| self.validate(item)).collect()
    }
}
