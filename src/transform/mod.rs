//! Transform pipeline.
//!
//! A [`Transformer`] consumes a [`Document`] and returns a new one. A
//! [`Pipeline`] runs an ordered list of transformers, each stage seeing the
//! complete output of the previous one. Order matters: running `classify`
//! before `line-join` sees different font-size statistics than running it
//! after.
//!
//! # Example
//!
//! ```
//! use pdfdown::transform::{transformer_fn, Pipeline, TransformerId};
//!
//! let pipeline = Pipeline::new()
//!     .then(TransformerId::LineJoin.build(1.0))
//!     .then(transformer_fn("noop", |doc| Ok(doc)));
//! assert_eq!(pipeline.names(), vec!["line-join", "noop"]);
//! ```

mod classify;
mod compact;
mod line_join;
mod lists;
mod normalize;
mod paragraphs;
mod repetitive;
mod stats;

pub use classify::HeadingClassifier;
pub use compact::LineCompactor;
pub use line_join::LineJoiner;
pub use lists::ListDetector;
pub use normalize::TextNormalizer;
pub use paragraphs::ParagraphGatherer;
pub use repetitive::RepetitiveRemover;
pub use stats::FontStatistics;

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::model::{Document, Item};

/// One stage of the pipeline.
pub trait Transformer: Send + Sync {
    /// Stable identifier, used in error messages and traces.
    fn name(&self) -> &str;

    /// Consume a document and produce the next one.
    fn apply(&self, doc: Document) -> Result<Document>;
}

/// A transformer backed by a closure.
pub struct FnTransformer<F> {
    name: String,
    f: F,
}

impl<F> FnTransformer<F>
where
    F: Fn(Document) -> Result<Document> + Send + Sync,
{
    /// Wrap a closure.
    pub fn new(name: impl Into<String>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }
}

impl<F> Transformer for FnTransformer<F>
where
    F: Fn(Document) -> Result<Document> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, doc: Document) -> Result<Document> {
        (self.f)(doc)
    }
}

/// Build a shareable transformer from a closure.
pub fn transformer_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn Transformer>
where
    F: Fn(Document) -> Result<Document> + Send + Sync + 'static,
{
    Arc::new(FnTransformer::new(name, f))
}

/// Built-in transformers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformerId {
    /// NFC normalization, ligature expansion, U+FFFD removal
    NormalizeText,
    /// Merge fragments of one logical line without a separator
    LineJoin,
    /// Merge same-baseline runs into one line, separated by spaces
    CompactLines,
    /// Drop running headers, footers and page numbers
    RemoveRepetitive,
    /// Re-tag items as headings or paragraphs by font size
    Classify,
    /// Re-tag bulleted and numbered paragraphs as list items
    DetectLists,
    /// Merge consecutive paragraph lines into paragraphs
    GatherParagraphs,
}

impl TransformerId {
    /// Every built-in, in default pipeline order.
    pub const ALL: [TransformerId; 7] = [
        TransformerId::NormalizeText,
        TransformerId::LineJoin,
        TransformerId::CompactLines,
        TransformerId::RemoveRepetitive,
        TransformerId::Classify,
        TransformerId::DetectLists,
        TransformerId::GatherParagraphs,
    ];

    /// Kebab-case identifier.
    pub fn as_str(self) -> &'static str {
        match self {
            TransformerId::NormalizeText => "normalize-text",
            TransformerId::LineJoin => "line-join",
            TransformerId::CompactLines => "compact-lines",
            TransformerId::RemoveRepetitive => "remove-repetitive",
            TransformerId::Classify => "classify",
            TransformerId::DetectLists => "detect-lists",
            TransformerId::GatherParagraphs => "gather-paragraphs",
        }
    }

    /// One-line description.
    pub fn description(self) -> &'static str {
        match self {
            TransformerId::NormalizeText => "NFC-normalize text, expand ligatures, drop U+FFFD",
            TransformerId::LineJoin => "join fragments of one logical line",
            TransformerId::CompactLines => "merge words on the same baseline into lines",
            TransformerId::RemoveRepetitive => "drop running headers, footers and page numbers",
            TransformerId::Classify => "tag headings and paragraphs by font size",
            TransformerId::DetectLists => "tag bulleted and numbered lines as list items",
            TransformerId::GatherParagraphs => "merge consecutive lines into paragraphs",
        }
    }

    /// Instantiate the transformer.
    ///
    /// `line_join_tolerance` scales the line joiner's distance thresholds and
    /// is ignored by the other built-ins.
    pub fn build(self, line_join_tolerance: f32) -> Arc<dyn Transformer> {
        match self {
            TransformerId::NormalizeText => Arc::new(TextNormalizer::new()),
            TransformerId::LineJoin => {
                Arc::new(LineJoiner::new().with_tolerance(f64::from(line_join_tolerance)))
            }
            TransformerId::CompactLines => Arc::new(LineCompactor::new()),
            TransformerId::RemoveRepetitive => Arc::new(RepetitiveRemover::new()),
            TransformerId::Classify => Arc::new(HeadingClassifier::new()),
            TransformerId::DetectLists => Arc::new(ListDetector::new()),
            TransformerId::GatherParagraphs => Arc::new(ParagraphGatherer::new()),
        }
    }
}

impl fmt::Display for TransformerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TransformerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        TransformerId::ALL
            .into_iter()
            .find(|id| id.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| Error::UnknownTransformer(s.to_string()))
    }
}

/// A pipeline stage as configured by the caller.
#[derive(Clone)]
pub enum TransformerSpec {
    /// A built-in transformer
    Builtin(TransformerId),
    /// A caller-supplied transformer
    Custom(Arc<dyn Transformer>),
}

impl TransformerSpec {
    /// Name of the stage.
    pub fn name(&self) -> &str {
        match self {
            TransformerSpec::Builtin(id) => id.as_str(),
            TransformerSpec::Custom(t) => t.name(),
        }
    }

    /// Instantiate the stage.
    pub fn build(&self, line_join_tolerance: f32) -> Arc<dyn Transformer> {
        match self {
            TransformerSpec::Builtin(id) => id.build(line_join_tolerance),
            TransformerSpec::Custom(t) => Arc::clone(t),
        }
    }

    /// Parse a comma-separated list of built-in names ("line-join,classify").
    pub fn parse_list(s: &str) -> Result<Vec<TransformerSpec>> {
        s.split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| name.parse().map(TransformerSpec::Builtin))
            .collect()
    }
}

impl From<TransformerId> for TransformerSpec {
    fn from(id: TransformerId) -> Self {
        TransformerSpec::Builtin(id)
    }
}

impl From<Arc<dyn Transformer>> for TransformerSpec {
    fn from(t: Arc<dyn Transformer>) -> Self {
        TransformerSpec::Custom(t)
    }
}

impl fmt::Debug for TransformerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransformerSpec::Builtin(id) => write!(f, "Builtin({})", id),
            TransformerSpec::Custom(t) => write!(f, "Custom({})", t.name()),
        }
    }
}

/// Default pipeline stages.
pub fn default_transformers() -> Vec<TransformerSpec> {
    TransformerId::ALL.into_iter().map(TransformerSpec::Builtin).collect()
}

/// An ordered list of transformers.
#[derive(Clone, Default)]
pub struct Pipeline {
    stages: Vec<Arc<dyn Transformer>>,
}

impl Pipeline {
    /// Create an empty pipeline (the identity transformation).
    pub fn new() -> Self {
        Self::default()
    }

    /// The default built-in pipeline.
    pub fn with_defaults() -> Self {
        Self::from_specs(&default_transformers(), 1.0)
    }

    /// Instantiate a pipeline from stage specs.
    pub fn from_specs(specs: &[TransformerSpec], line_join_tolerance: f32) -> Self {
        Self {
            stages: specs.iter().map(|s| s.build(line_join_tolerance)).collect(),
        }
    }

    /// Append a stage.
    pub fn push(&mut self, stage: Arc<dyn Transformer>) {
        self.stages.push(stage);
    }

    /// Append a stage, builder style.
    pub fn then(mut self, stage: Arc<dyn Transformer>) -> Self {
        self.push(stage);
        self
    }

    /// Stages in execution order.
    pub fn stages(&self) -> &[Arc<dyn Transformer>] {
        &self.stages
    }

    /// Stage names in execution order.
    pub fn names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    /// Check if the pipeline has no stages.
    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order.
    ///
    /// The first failure aborts the run; no partial document is returned.
    pub fn run(&self, doc: Document) -> Result<Document> {
        self.stages
            .iter()
            .try_fold(doc, |doc, stage| run_stage(stage.as_ref(), doc))
    }

    /// Run every stage, keeping each intermediate document.
    pub fn run_traced(&self, doc: Document) -> Result<PipelineTrace> {
        let mut trace = PipelineTrace {
            input: doc.clone(),
            stages: Vec::with_capacity(self.stages.len()),
        };
        let mut current = doc;
        for stage in &self.stages {
            current = run_stage(stage.as_ref(), current)?;
            trace.stages.push((stage.name().to_string(), current.clone()));
        }
        Ok(trace)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Intermediate documents of a traced pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineTrace {
    /// The document before the first stage
    pub input: Document,
    /// (stage name, document after that stage), in execution order
    pub stages: Vec<(String, Document)>,
}

impl PipelineTrace {
    /// The document after the last stage.
    pub fn output(&self) -> &Document {
        self.stages.last().map_or(&self.input, |(_, doc)| doc)
    }

    /// The document after the named stage (first occurrence).
    pub fn after(&self, stage: &str) -> Option<&Document> {
        self.stages
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, doc)| doc)
    }
}

fn run_stage(stage: &dyn Transformer, doc: Document) -> Result<Document> {
    let before = doc.item_count();
    let doc = stage.apply(doc).map_err(|e| match e {
        Error::Transform { .. } => e,
        other => Error::transform(stage.name(), other.to_string()),
    })?;
    log::debug!(
        "Transformer '{}': {} -> {} items",
        stage.name(),
        before,
        doc.item_count()
    );
    Ok(doc)
}

/// A numeric field a transformer cannot work without.
pub(crate) fn require_number(stage: &str, item: &Item, name: &str) -> Result<f64> {
    item.number(name).ok_or_else(|| {
        Error::transform_at(
            stage,
            item.order(),
            format!("missing numeric field '{}' on {} item", name, item.item_type()),
        )
    })
}
