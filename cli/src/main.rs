//! pdfdown CLI - PDF to Markdown conversion tool

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};

use pdfdown::extract::ContentExtractor;
use pdfdown::{
    to_json, ConversionOptions, ConversionStrategy, Converter, ExtractOptions, JsonFormat,
    LopdfExtractor, PageSelection, Pdfdown, TransformerId, TransformerSpec,
};

#[derive(Parser)]
#[command(name = "pdfdown")]
#[command(version)]
#[command(about = "Convert PDF documents to Markdown", long_about = None)]
struct Cli {
    /// Input PDF file
    #[arg(value_name = "FILE")]
    input: Option<PathBuf>,

    /// Output file (stdout if not specified)
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    #[command(flatten)]
    pipeline: PipelineArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Flags shared by every converting command.
#[derive(Args)]
struct PipelineArgs {
    /// Comma-separated transformer list (see `pdfdown transformers`)
    #[arg(long, value_name = "LIST", env = "PDFDOWN_TRANSFORMERS")]
    transformers: Option<String>,

    /// Line-join distance tolerance
    #[arg(long, value_name = "FACTOR")]
    tolerance: Option<f32>,

    /// Page range (e.g., "1-10", "1,3,5")
    #[arg(long)]
    pages: Option<String>,

    /// Skip undecodable pages instead of failing
    #[arg(long)]
    lenient: bool,

    /// Extract pages one at a time
    #[arg(long)]
    sequential: bool,
}

impl PipelineArgs {
    fn builder(&self) -> Result<Pdfdown, Box<dyn std::error::Error>> {
        let mut builder = Pdfdown::new().with_strategy(ConversionStrategy::markdown());

        if let Some(ref list) = self.transformers {
            builder = builder.with_transformers(TransformerSpec::parse_list(list)?);
        }
        if let Some(tolerance) = self.tolerance {
            builder = builder.with_line_join_tolerance(tolerance);
        }
        if let Some(ref pages) = self.pages {
            builder = builder.with_pages(PageSelection::parse(pages)?);
        }
        if self.lenient {
            builder = builder.lenient();
        }
        if self.sequential {
            builder = builder.sequential();
        }

        Ok(builder)
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert PDF to Markdown, plain text and JSON in one directory
    Convert {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, value_name = "DIR")]
        output: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Convert PDF to Markdown
    #[command(alias = "md")]
    Markdown {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Include YAML frontmatter
        #[arg(short, long)]
        frontmatter: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Convert PDF to plain text
    Text {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Dump the document model as JSON
    Json {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output file (stdout if not specified)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Dump the document after this stage ("extract" for raw extraction)
        #[arg(long, value_name = "NAME")]
        stage: Option<String>,

        /// Output compact JSON
        #[arg(long)]
        compact: bool,

        #[command(flatten)]
        pipeline: PipelineArgs,
    },

    /// Show document information
    Info {
        /// Input PDF file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the built-in transformers
    Transformers,

    /// Show version information
    Version,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let result = match cli.command {
        Some(Commands::Convert {
            input,
            output,
            pipeline,
        }) => cmd_convert(&input, output.as_deref(), &pipeline),
        Some(Commands::Markdown {
            input,
            output,
            frontmatter,
            pipeline,
        }) => cmd_markdown(&input, output.as_deref(), frontmatter, &pipeline),
        Some(Commands::Text {
            input,
            output,
            pipeline,
        }) => cmd_text(&input, output.as_deref(), &pipeline),
        Some(Commands::Json {
            input,
            output,
            stage,
            compact,
            pipeline,
        }) => cmd_json(&input, output.as_deref(), stage.as_deref(), compact, &pipeline),
        Some(Commands::Info { input, json }) => cmd_info(&input, json),
        Some(Commands::Transformers) => {
            cmd_transformers();
            Ok(())
        }
        Some(Commands::Version) => {
            cmd_version();
            Ok(())
        }
        None => {
            // Default behavior: Markdown if input is provided
            if let Some(input) = cli.input {
                cmd_markdown(&input, cli.output.as_deref(), false, &cli.pipeline)
            } else {
                println!("{}", "Usage: pdfdown <FILE> [-o OUTPUT]".yellow());
                println!("       pdfdown --help for more information");
                Ok(())
            }
        }
    };

    if let Err(e) = result {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn write_output(output: Option<&Path>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(path) = output {
        fs::write(path, content)?;
        log::info!("wrote {} bytes to {}", content.len(), path.display());
        println!("{} {}", "Saved to".green(), path.display());
    } else {
        println!("{}", content);
    }
    Ok(())
}

fn cmd_convert(
    input: &Path,
    output: Option<&Path>,
    pipeline: &PipelineArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let output_dir = output.map(|p| p.to_path_buf()).unwrap_or_else(|| {
        let stem = input.file_stem().unwrap_or_default().to_string_lossy();
        PathBuf::from(format!("{}_output", stem))
    });

    fs::create_dir_all(&output_dir)?;

    let pb = ProgressBar::new(4);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {msg}")?
            .progress_chars("#>-"),
    );

    pb.set_message("Extracting and transforming...");
    let builder = pipeline.builder()?;
    let trace = builder.trace_file(input)?;
    let doc = trace.output();
    pb.inc(1);

    pb.set_message("Generating Markdown...");
    let markdown = Converter::convert(doc, &builder.options().strategy)?;
    let markdown = format!("{}\n{}", doc.metadata().to_yaml_frontmatter(), markdown);
    fs::write(output_dir.join("extract.md"), &markdown)?;
    pb.inc(1);

    pb.set_message("Generating text...");
    let text = Converter::convert(doc, &ConversionStrategy::plain_text())?;
    fs::write(output_dir.join("extract.txt"), &text)?;
    pb.inc(1);

    pb.set_message("Generating JSON...");
    let json = to_json(doc, JsonFormat::Pretty)?;
    fs::write(output_dir.join("content.json"), &json)?;
    pb.inc(1);

    pb.finish_with_message("Done!");

    println!("\n{}", "Output files:".green().bold());
    println!("  {} extract.md", "├─".dimmed());
    println!("  {} extract.txt", "├─".dimmed());
    println!("  {} content.json", "└─".dimmed());

    Ok(())
}

fn cmd_markdown(
    input: &Path,
    output: Option<&Path>,
    frontmatter: bool,
    pipeline: &PipelineArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut builder = pipeline.builder()?;
    if frontmatter {
        builder = builder.with_frontmatter();
    }

    let markdown = builder.convert_file(input)?;
    write_output(output, &markdown)
}

fn cmd_text(
    input: &Path,
    output: Option<&Path>,
    pipeline: &PipelineArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = pipeline.builder()?.plain_text().convert_file(input)?;
    write_output(output, &text)
}

fn cmd_json(
    input: &Path,
    output: Option<&Path>,
    stage: Option<&str>,
    compact: bool,
    pipeline: &PipelineArgs,
) -> Result<(), Box<dyn std::error::Error>> {
    let trace = pipeline.builder()?.trace_file(input)?;

    let doc = match stage {
        None => trace.output(),
        Some("extract") => &trace.input,
        Some(name) => trace.after(name).ok_or_else(|| {
            let stages: Vec<&str> = trace.stages.iter().map(|(n, _)| n.as_str()).collect();
            format!(
                "stage '{}' is not part of the pipeline (stages: extract, {})",
                name,
                stages.join(", ")
            )
        })?,
    };

    let format = if compact {
        JsonFormat::Compact
    } else {
        JsonFormat::Pretty
    };

    let json = to_json(doc, format)?;
    write_output(output, &json)
}

fn cmd_info(input: &Path, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    // Lenient: metadata is still worth showing when some pages fail to decode
    let extract = ExtractOptions::new().lenient();
    let extractor = LopdfExtractor::open(input, &extract)?;
    let metadata = extractor.metadata();
    let doc = pdfdown::extract_document(&extractor, &extract)?;
    let text = pdfdown::convert_document(
        doc.clone(),
        &ConversionOptions::new().with_strategy(ConversionStrategy::plain_text()),
    )?;
    let words = text.split_whitespace().count();

    if json {
        let info = serde_json::json!({
            "file": input.display().to_string(),
            "metadata": metadata,
            "text_runs": doc.item_count(),
            "words": words,
            "characters": text.chars().count(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    println!("{}", "Document Information".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "File".bold(), input.display());
    println!("{}: PDF {}", "Format".bold(), metadata.pdf_version);
    println!("{}: {}", "Pages".bold(), metadata.page_count);
    println!(
        "{}: {}",
        "Encrypted".bold(),
        if metadata.encrypted { "Yes" } else { "No" }
    );

    if let Some(ref title) = metadata.title {
        println!("{}: {}", "Title".bold(), title);
    }
    if let Some(ref author) = metadata.author {
        println!("{}: {}", "Author".bold(), author);
    }
    if let Some(ref creator) = metadata.creator {
        println!("{}: {}", "Creator".bold(), creator);
    }
    if let Some(ref producer) = metadata.producer {
        println!("{}: {}", "Producer".bold(), producer);
    }
    if let Some(ref created) = metadata.created {
        println!("{}: {}", "Created".bold(), created);
    }
    if let Some(ref modified) = metadata.modified {
        println!("{}: {}", "Modified".bold(), modified);
    }

    println!();
    println!("{}", "Content Statistics".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());

    println!("{}: {}", "Text runs".bold(), doc.item_count());
    println!("{}: {}", "Words".bold(), words);
    println!("{}: {}", "Characters".bold(), text.chars().count());

    Ok(())
}

fn cmd_transformers() {
    println!("{}", "Built-in transformers (default order)".cyan().bold());
    println!("{}", "─".repeat(40).dimmed());
    for id in TransformerId::ALL {
        println!("  {:<20} {}", id.as_str().bold(), id.description());
    }
}

fn cmd_version() {
    println!("{} {}", "pdfdown".cyan().bold(), env!("CARGO_PKG_VERSION"));
    println!("PDF to Markdown conversion tool");
    println!();
    println!("License: MIT");
}
