//! slidetree CLI - PowerPoint slide extraction tool
//!
//! A command-line tool for dumping PPTX slides and shape trees as JSON.

use clap::{Parser, Subcommand};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use slidetree::render::{self, JsonFormat, SerializeOptions};
use slidetree::{checked_index, DocumentKind, Presentation};
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// PowerPoint slide and shape-tree extraction to JSON
#[derive(Parser)]
#[command(
    name = "slidetree",
    author = "iyulab",
    version,
    about = "Extract slides from PowerPoint presentations as JSON",
    long_about = "slidetree - PowerPoint (PPTX) slide extraction tool.\n\n\
                  Serializes whole slides or their shape trees to ordered JSON."
)]
struct Cli {
    /// Enable debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Output flags shared by the JSON-producing commands
#[derive(clap::Args)]
struct OutputArgs {
    /// Remove namespace prefixes from element and attribute names
    #[arg(long)]
    strip_namespaces: bool,

    /// Output compact JSON (no indentation)
    #[arg(long)]
    compact: bool,
}

impl OutputArgs {
    fn options(&self) -> SerializeOptions {
        SerializeOptions::new()
            .with_strip_namespaces(self.strip_namespaces)
            .with_format(if self.compact {
                JsonFormat::Compact
            } else {
                JsonFormat::Pretty
            })
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Show presentation information
    Info {
        /// Input file path
        input: PathBuf,

        /// Print the information as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert one slide to JSON
    Slide {
        /// Input file path
        input: PathBuf,

        /// Zero-based slide index
        #[arg(allow_negative_numbers = true)]
        index: i64,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        format: OutputArgs,
    },

    /// Convert one slide's shape tree to JSON
    Shapes {
        /// Input file path
        input: PathBuf,

        /// Zero-based slide index
        #[arg(allow_negative_numbers = true)]
        index: i64,

        /// Output file path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        format: OutputArgs,
    },

    /// Write every slide to output{i}.json in a directory
    Dump {
        /// Input file path
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Write shape trees instead of full slides
        #[arg(long)]
        shapes: bool,

        #[command(flatten)]
        format: OutputArgs,
    },

    /// Show version information
    Version,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli.command) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn run(command: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Info { input, json } => {
            let pb = create_spinner("Reading presentation...");

            let presentation = Presentation::open(&input)?;
            let titles: Vec<Option<String>> = (0..presentation.slide_count())
                .map(|i| {
                    presentation
                        .slide(i)
                        .and_then(|slide| slide.title())
                        .unwrap_or_else(|e| {
                            tracing::warn!(index = i, error = %e, "cannot read slide title");
                            None
                        })
                })
                .collect();

            pb.finish_and_clear();

            if json {
                let info = serde_json::json!({
                    "file": input.display().to_string(),
                    "slides": presentation.slide_count(),
                    "size": presentation.slide_size(),
                    "titles": titles,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
                return Ok(());
            }

            println!("{}", "Presentation Information".cyan().bold());
            println!("{}", "─".repeat(40));
            println!(
                "{}: {}",
                "File".bold(),
                input.file_name().unwrap_or_default().to_string_lossy()
            );
            println!("{}: {}", "Slides".bold(), presentation.slide_count());
            if let Some(size) = presentation.slide_size() {
                println!(
                    "{}: {} x {} cm ({} x {} EMU)",
                    "Size".bold(),
                    size.width_cm(),
                    size.height_cm(),
                    size.cx,
                    size.cy
                );
            }

            if !titles.is_empty() {
                println!("\n{}", "Slides".cyan().bold());
                println!("{}", "─".repeat(40));
                for (i, title) in titles.iter().enumerate() {
                    match title {
                        Some(title) => println!("{:>4}  {}", i, title),
                        None => println!("{:>4}  {}", i, "(untitled)".dimmed()),
                    }
                }
            }
        }

        Commands::Slide {
            input,
            index,
            output,
            format,
        } => {
            let pb = create_spinner("Reading presentation...");

            let presentation = Presentation::open(&input)?;
            let index = checked_index(index, presentation.slide_count())?;
            pb.set_message("Rendering slide...");

            let json = presentation.slide_json(index, &format.options())?;

            pb.finish_and_clear();
            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                println!(
                    "{} Slide {} written to {}",
                    "✓".green().bold(),
                    index,
                    path.display()
                );
            }
        }

        Commands::Shapes {
            input,
            index,
            output,
            format,
        } => {
            let pb = create_spinner("Reading presentation...");

            let presentation = Presentation::open(&input)?;
            let index = checked_index(index, presentation.slide_count())?;
            pb.set_message("Walking shape tree...");

            let options = format.options();
            let doc = presentation.slide(index)?.shape_tree_document(&options)?;
            let json = render::to_json(&doc, options.format)?;

            pb.finish_and_clear();
            write_output(output.as_ref(), &json)?;

            if let Some(path) = output {
                println!(
                    "{} Shape tree of slide {} written to {}",
                    "✓".green().bold(),
                    index,
                    path.display()
                );
            }
        }

        Commands::Dump {
            input,
            output,
            shapes,
            format,
        } => {
            let pb = create_spinner("Reading presentation...");

            let presentation = Presentation::open(&input)?;
            fs::create_dir_all(&output)?;

            pb.set_message(format!(
                "Serializing {} slides...",
                presentation.slide_count()
            ));
            let options = format.options();
            let kind = if shapes {
                DocumentKind::ShapeTree
            } else {
                DocumentKind::Slide
            };
            let results = presentation.serialize_all(kind, &options);

            pb.finish_and_clear();

            let mut written = 0;
            let mut failed = 0;
            for (i, result) in results.into_iter().enumerate() {
                match result.and_then(|doc| render::to_json(&doc, options.format)) {
                    Ok(json) => {
                        fs::write(output.join(format!("output{}.json", i)), json)?;
                        written += 1;
                    }
                    Err(e) => {
                        eprintln!("{} {}", "!".yellow().bold(), e);
                        failed += 1;
                    }
                }
            }

            println!(
                "{} Wrote {} slides to {}",
                "✓".green().bold(),
                written,
                output.display()
            );
            if failed > 0 {
                println!("{} {} slides skipped", "!".yellow().bold(), failed);
            }
        }

        Commands::Version => {
            print_version();
        }
    }

    Ok(())
}

fn print_version() {
    println!("{} {}", "slidetree".green().bold(), env!("CARGO_PKG_VERSION"));
    println!("PowerPoint slide and shape-tree extraction to JSON");
    println!();
    println!("Supported formats: PPTX");
    println!("Repository: https://github.com/iyulab/slidetree");
}

fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"])
            .template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

fn write_output(path: Option<&PathBuf>, content: &str) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}
