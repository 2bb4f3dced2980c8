//! Document model flowing through the conversion pipeline.
//!
//! The model is deliberately flat: a [`Document`] is an ordered list of
//! [`Page`]s, each holding [`Item`]s keyed by a global `order`. Structure
//! (paragraphs, headings, lists) lives in item type tags and fields rather
//! than in a tree, so every transformer can rewrite it with the same tools.

mod document;
mod item;
mod page;

pub use document::{Document, Metadata};
pub use item::{field, item_type, FieldValue, Item, RawItem};
pub use page::Page;
