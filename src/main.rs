//! readalong - inspect parsed documents and try out alignment

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use readalong::{DocumentParser, ParseOptions, ProgressiveAligner, StructuredDocument};

#[derive(Parser)]
#[command(name = "readalong")]
#[command(version, about = "Parse documents into sections and align reference text", long_about = None)]
#[command(after_help = "EXAMPLES:
    readalong info book.epub                 Show format, title and counts
    readalong sections notes.docx --json     List sections as JSON
    readalong align book.epub \"It was\" \"It was the best\"")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Log parser progress (repeat for more detail)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Target section length for text and word documents
    #[arg(long, value_name = "CHARS", global = true)]
    max_section_chars: Option<usize>,

    /// Target part length when splitting long book chapters
    #[arg(long, value_name = "CHARS", global = true)]
    max_chapter_chars: Option<usize>,

    /// Length of section previews
    #[arg(long, value_name = "CHARS", global = true)]
    preview_chars: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Show format, title and size of a document
    Info {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List the sections of a document
    Sections {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Print sections as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the plain text of a document
    Text {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Feed reference texts, in order, to one aligner and print each fragment
    Align {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(value_name = "REFERENCE", required = true)]
        references: Vec<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let parser = DocumentParser::new().with_options(options(&cli));
    let result = match &cli.command {
        Command::Info { file } => with_document(&parser, file, show_info),
        Command::Sections { file, json } => {
            with_document(&parser, file, |doc| show_sections(doc, *json))
        }
        Command::Text { file } => with_document(&parser, file, |doc| {
            println!("{}", doc.full_text);
            Ok(())
        }),
        Command::Align { file, references } => {
            with_document(&parser, file, |doc| align(doc, references))
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn options(cli: &Cli) -> ParseOptions {
    let mut options = ParseOptions::default();
    if let Some(chars) = cli.max_section_chars {
        options = options.with_max_section_chars(chars);
    }
    if let Some(chars) = cli.max_chapter_chars {
        options = options.with_max_chapter_chars(chars);
    }
    if let Some(chars) = cli.preview_chars {
        options = options.with_preview_chars(chars);
    }
    options
}

/// Parse `path`, run `f`, and release the document's resources either way.
fn with_document<F>(parser: &DocumentParser, path: &Path, f: F) -> Result<(), String>
where
    F: FnOnce(&StructuredDocument) -> Result<(), String>,
{
    let mut doc = parser.parse_path(path).map_err(|e| e.to_string())?;
    let result = f(&doc);
    doc.release(parser.store().as_ref());
    result
}

fn show_info(doc: &StructuredDocument) -> Result<(), String> {
    let format = match doc.source_format {
        readalong::SourceFormat::PlainText => "plain text",
        readalong::SourceFormat::WordProcessor => "word processor",
        readalong::SourceFormat::Paginated => "paginated",
        readalong::SourceFormat::PackagedBook => "packaged book",
    };
    println!("Format: {format}");
    if let Some(title) = &doc.title {
        println!("Title: {title}");
    }
    println!("Characters: {}", doc.char_len());
    println!("Sections: {}", doc.sections.len());
    if let Some(rich) = &doc.rich_content {
        println!("Rich content: {} bytes", rich.len());
    }
    if !doc.resources.is_empty() {
        println!("Resources: {}", doc.resources.len());
    }
    Ok(())
}

fn show_sections(doc: &StructuredDocument, json: bool) -> Result<(), String> {
    if json {
        let out = serde_json::to_string_pretty(&doc.sections).map_err(|e| e.to_string())?;
        println!("{out}");
        return Ok(());
    }

    for section in &doc.sections {
        println!(
            "{:>8}..{:<8} {:<24} {}",
            section.start, section.end, section.label, section.preview
        );
    }
    Ok(())
}

fn align(doc: &StructuredDocument, references: &[String]) -> Result<(), String> {
    let rich = doc
        .rich_content
        .as_deref()
        .ok_or("document has no rich rendering")?;
    let mut aligner = ProgressiveAligner::from_markup(rich);

    for reference in references {
        let fragment = aligner.slice_by_reference(reference);
        if fragment.is_empty() {
            println!("[no match] {reference}");
        } else {
            println!(
                "[{}..{}] {}",
                fragment.stream_range.start, fragment.stream_range.end, fragment.markup
            );
        }
    }
    Ok(())
}
