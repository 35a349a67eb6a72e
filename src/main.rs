//! PDF Manager CLI Application.
//!
//! Each subcommand loads its inputs in order, applies one operation to the
//! collection and writes the result.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use log::LevelFilter;
use std::path::{Path, PathBuf};

use pdf_manager::{
    ContentQuery, ManagerConfig, PdfManager, Selection, DEFAULT_OUTPUT, DEFAULT_ROTATION,
    DEFAULT_SHRINK_QUALITY,
};

/// PDF Manager
///
/// Split, rotate, shrink, redact and merge PDF documents.
#[derive(Parser)]
#[command(name = "pdf-manager")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Input PDFs and the merged output file.
#[derive(Args)]
struct IoArgs {
    /// Input PDF files, in collection order
    #[arg(required = true, value_name = "FILE")]
    inputs: Vec<PathBuf>,

    /// Output PDF file path
    #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
}

/// Which documents an operation targets.
#[derive(Args)]
struct SelectArgs {
    /// Positions of the targeted documents (default: all)
    #[arg(long, value_name = "INDEX", num_args = 1..)]
    only: Vec<usize>,

    /// Drop documents that are not targeted
    #[arg(long)]
    drop_others: bool,
}

impl SelectArgs {
    fn selection(&self) -> Selection {
        if self.only.is_empty() {
            Selection::All
        } else {
            Selection::from(self.only.clone())
        }
    }

    fn keep_others(&self) -> bool {
        !self.drop_others
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Merge all inputs into one PDF
    Merge {
        #[command(flatten)]
        io: IoArgs,

        /// Positions to merge, in merge order (default: all)
        #[arg(long, value_name = "INDEX", num_args = 1..)]
        only: Vec<usize>,
    },

    /// Split documents into single-page PDFs written to a directory
    Split {
        /// Input PDF files, in collection order
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<PathBuf>,

        /// Directory receiving one file per resulting document
        #[arg(short, long, value_name = "DIR")]
        output_dir: PathBuf,

        /// File name stem for the written documents
        #[arg(long, default_value = "page")]
        stem: String,

        #[command(flatten)]
        select: SelectArgs,
    },

    /// Rotate pages clockwise
    Rotate {
        #[command(flatten)]
        io: IoArgs,

        /// Clockwise rotation in degrees (multiple of 90)
        #[arg(short, long, default_value_t = DEFAULT_ROTATION, allow_hyphen_values = true)]
        angle: i64,

        #[command(flatten)]
        select: SelectArgs,
    },

    /// Reduce the quality of embedded images
    Shrink {
        #[command(flatten)]
        io: IoArgs,

        /// JPEG quality, 0-100
        #[arg(short, long, default_value_t = DEFAULT_SHRINK_QUALITY)]
        quality: u8,

        #[command(flatten)]
        select: SelectArgs,
    },

    /// Black out content matching a regular expression
    Hide {
        #[command(flatten)]
        io: IoArgs,

        /// Regular expression; the first match of each line is redacted
        #[arg(short, long, value_name = "REGEX")]
        pattern: String,

        /// Start scanning at the line containing this text
        #[arg(long, value_name = "TEXT")]
        start: Option<String>,

        /// Stop scanning after the line containing this text
        #[arg(long, value_name = "TEXT")]
        end: Option<String>,

        /// Matches to leave visible (can be specified multiple times)
        #[arg(long, value_name = "TEXT")]
        skip: Vec<String>,

        /// Compare skip entries with whole matches instead of substrings
        #[arg(long)]
        skip_exact: bool,

        #[command(flatten)]
        select: SelectArgs,
    },

    /// Build a PDF with one page per image
    FromImages {
        /// Image files, one page each, in page order
        #[arg(required = true, value_name = "IMAGE")]
        images: Vec<PathBuf>,

        /// Output PDF file path
        #[arg(short, long, value_name = "FILE", default_value = DEFAULT_OUTPUT)]
        output: PathBuf,
    },

    /// Keep only the selected documents and merge them
    Keep {
        #[command(flatten)]
        io: IoArgs,

        /// Positions to keep
        #[arg(long, required = true, value_name = "INDEX", num_args = 1..)]
        only: Vec<usize>,
    },

    /// Drop the selected documents and merge the rest
    Drop {
        #[command(flatten)]
        io: IoArgs,

        /// Positions to drop
        #[arg(long, required = true, value_name = "INDEX", num_args = 1..)]
        only: Vec<usize>,
    },

    /// Extract text from a PDF (for debugging and verification)
    Extract {
        /// Input PDF file path
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output text file (optional, defaults to stdout)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,
    },

    /// Show page counts and page sizes
    Info {
        /// Input PDF files
        #[arg(required = true, value_name = "FILE")]
        inputs: Vec<PathBuf>,
    },
}

/// Command handler owning the manager for one invocation.
struct ManagerHandler {
    manager: PdfManager,
    verbose: bool,
}

impl ManagerHandler {
    fn new(verbose: bool) -> Self {
        Self {
            manager: PdfManager::with_config(ManagerConfig::default()),
            verbose,
        }
    }

    fn load(&mut self, inputs: &[PathBuf]) -> Result<()> {
        self.manager
            .add(inputs)
            .with_context(|| "Failed to load input PDFs")?;
        if self.verbose {
            println!("Loaded {} document(s)", self.manager.len());
        }
        Ok(())
    }

    fn save(&mut self, output: &Path) -> Result<()> {
        self.manager
            .save(Some(output))
            .with_context(|| format!("Failed to write {}", output.display()))?;
        let pages: usize = self
            .manager
            .documents()
            .iter()
            .map(|d| d.page_count())
            .sum();
        println!("✓ Wrote {} page(s) → {}", pages, output.display());
        Ok(())
    }

    fn hide(&mut self, io: &IoArgs, query: &ContentQuery, select: &SelectArgs) -> Result<()> {
        self.load(&io.inputs)?;
        self.manager
            .hide_content(query, select.selection(), select.keep_others())
            .with_context(|| "Redaction failed")?;

        if let Some(result) = self.manager.last_redaction() {
            if self.verbose {
                println!("\nRedaction Summary:");
                println!("  Pages processed: {}", result.pages_processed);
                println!("  Pages modified:  {}", result.pages_modified);
                println!("  Instances redacted: {}", result.instances_redacted);
            }
            if !result.has_redactions() {
                println!("⚠ No instances found to redact");
            }
        }
        self.save(&io.output)
    }

    fn split(
        &mut self,
        inputs: &[PathBuf],
        output_dir: &Path,
        stem: &str,
        select: &SelectArgs,
    ) -> Result<()> {
        self.load(inputs)?;
        self.manager
            .split(select.selection(), select.keep_others())
            .with_context(|| "Split failed")?;
        let written = self
            .manager
            .save_each(output_dir, stem)
            .with_context(|| format!("Failed to write into {}", output_dir.display()))?;
        println!(
            "✓ Wrote {} document(s) → {}",
            written.len(),
            output_dir.display()
        );
        Ok(())
    }

    fn extract(&self, input: &Path, output: Option<&Path>) -> Result<()> {
        let manager = PdfManager::open(input).with_context(|| "Failed to load input PDF")?;
        let document = manager
            .get(0)
            .ok_or_else(|| anyhow::anyhow!("No document loaded from {}", input.display()))?;
        let text = document
            .extract_text()
            .with_context(|| "Text extraction failed")?;

        if let Some(output_path) = output {
            std::fs::write(output_path, &text)
                .with_context(|| format!("Failed to write to {}", output_path.display()))?;
            println!(
                "✓ Extracted {} characters → {}",
                text.len(),
                output_path.display()
            );
        } else {
            println!("{}", text);
        }
        Ok(())
    }

    fn info(&mut self, inputs: &[PathBuf]) -> Result<()> {
        self.load(inputs)?;
        for (index, document) in self.manager.documents().iter().enumerate() {
            let label = document
                .source()
                .map_or_else(|| "<in-memory>".to_string(), |p| p.display().to_string());
            println!("[{}] {}: {} page(s)", index, label, document.page_count());
            if self.verbose {
                for (page, (width, height)) in document.page_sizes().iter().enumerate() {
                    println!("    page {}: {:.0} x {:.0} pt", page + 1, width, height);
                }
            }
        }
        Ok(())
    }
}

/// Builds the scanner configuration from command-line flags.
fn build_query(
    pattern: &str,
    start: Option<&str>,
    end: Option<&str>,
    skip: &[String],
    skip_exact: bool,
) -> Result<ContentQuery> {
    let mut query = ContentQuery::new(pattern)
        .with_context(|| format!("Invalid pattern '{}'", pattern))?
        .skipping(skip.iter().cloned())
        .skip_exact(skip_exact);
    if let Some(start) = start {
        query = query.starting_at(start);
    }
    if let Some(end) = end {
        query = query.ending_at(end);
    }
    Ok(query)
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Warn
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let mut handler = ManagerHandler::new(cli.verbose);

    match &cli.command {
        Commands::Merge { io, only } => {
            handler.load(&io.inputs)?;
            let selection = if only.is_empty() {
                Selection::All
            } else {
                Selection::from(only.clone())
            };
            handler.manager.merge(selection).with_context(|| "Merge failed")?;
            handler.save(&io.output)?;
        }
        Commands::Split {
            inputs,
            output_dir,
            stem,
            select,
        } => {
            handler.split(inputs, output_dir, stem, select)?;
        }
        Commands::Rotate { io, angle, select } => {
            handler.load(&io.inputs)?;
            handler
                .manager
                .rotate(*angle, select.selection(), select.keep_others())
                .with_context(|| "Rotation failed")?;
            handler.save(&io.output)?;
        }
        Commands::Shrink {
            io,
            quality,
            select,
        } => {
            handler.load(&io.inputs)?;
            handler
                .manager
                .shrink(*quality, select.selection(), select.keep_others())
                .with_context(|| "Shrink failed")?;
            handler.save(&io.output)?;
        }
        Commands::Hide {
            io,
            pattern,
            start,
            end,
            skip,
            skip_exact,
            select,
        } => {
            let query = build_query(
                pattern,
                start.as_deref(),
                end.as_deref(),
                skip,
                *skip_exact,
            )?;
            handler.hide(io, &query, select)?;
        }
        Commands::FromImages { images, output } => {
            handler
                .manager
                .add_from_images(images)
                .with_context(|| "Failed to build PDF from images")?;
            handler.save(output)?;
        }
        Commands::Keep { io, only } => {
            handler.load(&io.inputs)?;
            handler.manager.keep(only.clone())?;
            handler.save(&io.output)?;
        }
        Commands::Drop { io, only } => {
            handler.load(&io.inputs)?;
            handler.manager.drop(only.clone())?;
            handler.save(&io.output)?;
        }
        Commands::Extract { input, output } => {
            handler.extract(input, output.as_deref())?;
        }
        Commands::Info { inputs } => {
            handler.info(inputs)?;
        }
    }

    Ok(())
}
