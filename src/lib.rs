//! # pdfdown
//!
//! PDF to Markdown conversion through a pipeline of structure-recovering
//! transformers.
//!
//! A conversion runs five stages:
//!
//! 1. a [`ContentExtractor`] turns each page into positioned text runs,
//! 2. every run is checked against the extractor's [`ItemSchema`],
//! 3. the [`DocumentBuilder`] assigns the global reading `order`,
//! 4. a [`Pipeline`] of [`Transformer`]s recovers lines, headings, lists and
//!    paragraphs,
//! 5. the [`Converter`] renders the result through a [`ConversionStrategy`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use pdfdown::{convert_file, ConversionOptions};
//!
//! fn main() -> pdfdown::Result<()> {
//!     let markdown = convert_file("document.pdf", &ConversionOptions::default())?;
//!     println!("{}", markdown);
//!     Ok(())
//! }
//! ```
//!
//! ## Custom pipelines
//!
//! ```no_run
//! use pdfdown::{transformer_fn, ConversionOptions, TransformerId};
//!
//! let options = ConversionOptions::new()
//!     .with_transformers(vec![TransformerId::LineJoin.into(), TransformerId::Classify.into()])
//!     .add_transformer(transformer_fn("drop-empty", |doc| {
//!         doc.try_map_pages(|page| {
//!             let items = page.items().iter().filter(|i| !i.text().is_empty()).cloned().collect();
//!             Ok(page.with_items(items))
//!         })
//!     }));
//! let markdown = pdfdown::convert_file("document.pdf", &options)?;
//! # Ok::<(), pdfdown::Error>(())
//! ```

pub mod builder;
pub mod convert;
pub mod detect;
pub mod error;
pub mod extract;
pub mod model;
pub mod schema;
pub mod transform;

mod text;

// Re-export commonly used types
pub use builder::{DocumentBuilder, ExtractedPage};
pub use convert::{to_json, ConversionStrategy, Converter, JsonFormat, RenderFn};
pub use detect::{is_pdf_bytes, sniff_bytes, sniff_path, PdfHeader};
pub use error::{Error, Result};
pub use extract::{
    extract_document, ContentExtractor, ErrorMode, ExtractOptions, LopdfExtractor, PageSelection,
};
pub use model::{field, item_type, Document, FieldValue, Item, Metadata, Page, RawItem};
pub use schema::{FieldType, ItemSchema};
pub use transform::{
    default_transformers, transformer_fn, Pipeline, PipelineTrace, Transformer, TransformerId,
    TransformerSpec,
};

use std::path::Path;
use std::sync::Arc;

/// Everything that shapes one conversion.
#[derive(Debug, Clone)]
pub struct ConversionOptions {
    /// Pipeline stages, in execution order
    pub transformers: Vec<TransformerSpec>,

    /// Tolerance handed to the built-in `line-join` stage
    pub line_join_tolerance: f32,

    /// Output rendering rules
    pub strategy: ConversionStrategy,

    /// Extraction behavior
    pub extract: ExtractOptions,

    /// Prefix the output with YAML frontmatter built from the metadata
    pub include_frontmatter: bool,
}

impl Default for ConversionOptions {
    fn default() -> Self {
        Self {
            transformers: default_transformers(),
            line_join_tolerance: 1.0,
            strategy: ConversionStrategy::default(),
            extract: ExtractOptions::default(),
            include_frontmatter: false,
        }
    }
}

impl ConversionOptions {
    /// Default options: the built-in pipeline and Markdown output, one block
    /// per line.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the pipeline.
    pub fn with_transformers(mut self, transformers: Vec<TransformerSpec>) -> Self {
        self.transformers = transformers;
        self
    }

    /// Append a stage to the pipeline.
    pub fn add_transformer(mut self, transformer: impl Into<TransformerSpec>) -> Self {
        self.transformers.push(transformer.into());
        self
    }

    /// Set the `line-join` tolerance.
    pub fn with_line_join_tolerance(mut self, tolerance: f32) -> Self {
        self.line_join_tolerance = tolerance;
        self
    }

    /// Set the rendering rules.
    pub fn with_strategy(mut self, strategy: ConversionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Set extraction options.
    pub fn with_extract_options(mut self, extract: ExtractOptions) -> Self {
        self.extract = extract;
        self
    }

    /// Enable or disable YAML frontmatter.
    pub fn with_frontmatter(mut self, include: bool) -> Self {
        self.include_frontmatter = include;
        self
    }

    /// Instantiate the configured pipeline.
    pub fn pipeline(&self) -> Pipeline {
        Pipeline::from_specs(&self.transformers, self.line_join_tolerance)
    }
}

/// Convert PDF bytes.
///
/// # Example
///
/// ```no_run
/// use pdfdown::{convert, ConversionOptions};
///
/// let data = std::fs::read("document.pdf")?;
/// let markdown = convert(&data, &ConversionOptions::default())?;
/// # Ok::<(), pdfdown::Error>(())
/// ```
pub fn convert(data: &[u8], options: &ConversionOptions) -> Result<String> {
    let extractor = LopdfExtractor::from_bytes(data, &options.extract)?;
    convert_with_extractor(&extractor, options)
}

/// Convert a PDF file.
pub fn convert_file<P: AsRef<Path>>(path: P, options: &ConversionOptions) -> Result<String> {
    let extractor = LopdfExtractor::open(path, &options.extract)?;
    convert_with_extractor(&extractor, options)
}

/// Run extraction through any [`ContentExtractor`], then transform and
/// render.
pub fn convert_with_extractor(
    extractor: &dyn ContentExtractor,
    options: &ConversionOptions,
) -> Result<String> {
    let doc = extract_document(extractor, &options.extract)?;
    convert_document(doc, options)
}

/// Transform and render an already-built document.
pub fn convert_document(doc: Document, options: &ConversionOptions) -> Result<String> {
    let doc = options.pipeline().run(doc)?;
    render(&doc, options)
}

/// Extract a PDF file into an untransformed document.
pub fn extract_file<P: AsRef<Path>>(path: P, options: &ExtractOptions) -> Result<Document> {
    let extractor = LopdfExtractor::open(path, options)?;
    extract_document(&extractor, options)
}

/// Extract PDF bytes into an untransformed document.
pub fn extract_bytes(data: &[u8], options: &ExtractOptions) -> Result<Document> {
    let extractor = LopdfExtractor::from_bytes(data, options)?;
    extract_document(&extractor, options)
}

/// Convert PDF bytes without blocking the async runtime.
///
/// Extraction runs on tokio's blocking pool; transformation and rendering
/// follow synchronously.
#[cfg(feature = "async")]
pub async fn convert_async(data: Vec<u8>, options: ConversionOptions) -> Result<String> {
    let extract = options.extract.clone();
    let doc = tokio::task::spawn_blocking(move || extract_bytes(&data, &extract))
        .await
        .map_err(|e| Error::Io(std::io::Error::other(e)))??;
    convert_document(doc, &options)
}

fn render(doc: &Document, options: &ConversionOptions) -> Result<String> {
    let body = Converter::convert(doc, &options.strategy)?;
    if options.include_frontmatter {
        Ok(format!("{}\n{}", doc.metadata().to_yaml_frontmatter(), body))
    } else {
        Ok(body)
    }
}

/// Builder for converting PDF documents.
///
/// # Example
///
/// ```no_run
/// use pdfdown::Pdfdown;
///
/// let markdown = Pdfdown::new()
///     .with_frontmatter()
///     .with_line_join_tolerance(1.5)
///     .lenient()
///     .convert_file("document.pdf")?;
/// # Ok::<(), pdfdown::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct Pdfdown {
    options: ConversionOptions,
}

impl Pdfdown {
    /// Create a builder with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable lenient extraction.
    pub fn lenient(mut self) -> Self {
        self.options.extract = self.options.extract.lenient();
        self
    }

    /// Disable parallel extraction.
    pub fn sequential(mut self) -> Self {
        self.options.extract = self.options.extract.sequential();
        self
    }

    /// Restrict extraction to some pages.
    pub fn with_pages(mut self, pages: PageSelection) -> Self {
        self.options.extract = self.options.extract.with_pages(pages);
        self
    }

    /// Set document password.
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.options.extract = self.options.extract.with_password(password);
        self
    }

    /// Enable frontmatter in output.
    pub fn with_frontmatter(mut self) -> Self {
        self.options.include_frontmatter = true;
        self
    }

    /// Replace the pipeline.
    pub fn with_transformers(mut self, transformers: Vec<TransformerSpec>) -> Self {
        self.options.transformers = transformers;
        self
    }

    /// Append a custom stage.
    pub fn add_transformer(mut self, transformer: Arc<dyn Transformer>) -> Self {
        self.options.transformers.push(TransformerSpec::Custom(transformer));
        self
    }

    /// Set the `line-join` tolerance.
    pub fn with_line_join_tolerance(mut self, tolerance: f32) -> Self {
        self.options.line_join_tolerance = tolerance;
        self
    }

    /// Render plain text instead of Markdown.
    pub fn plain_text(mut self) -> Self {
        self.options.strategy = ConversionStrategy::plain_text();
        self
    }

    /// Set the rendering rules.
    pub fn with_strategy(mut self, strategy: ConversionStrategy) -> Self {
        self.options.strategy = strategy;
        self
    }

    /// The accumulated options.
    pub fn options(&self) -> &ConversionOptions {
        &self.options
    }

    /// Convert a PDF file.
    pub fn convert_file<P: AsRef<Path>>(&self, path: P) -> Result<String> {
        convert_file(path, &self.options)
    }

    /// Convert PDF bytes.
    pub fn convert_bytes(&self, data: &[u8]) -> Result<String> {
        convert(data, &self.options)
    }

    /// Extract a PDF file and run the pipeline, keeping every intermediate
    /// document.
    pub fn trace_file<P: AsRef<Path>>(&self, path: P) -> Result<PipelineTrace> {
        let doc = extract_file(path, &self.options.extract)?;
        self.options.pipeline().run_traced(doc)
    }
}
