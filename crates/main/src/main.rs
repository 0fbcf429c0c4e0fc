use std::error::Error;
use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Table of contents generation and newspaper layout from the command line.
///
/// Rendering needs the LiberationSans family under `assets/fonts` of the `pdf_toc` crate, or in
/// the directory named by `PDF_TOC_FONTS_DIR`. Set `RUST_LOG=debug` to follow layout decisions.
#[derive(Parser)]
#[command(author, version, about = "Prepend a linked table of contents to a bookmarked PDF")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Prepend a table of contents built from the outline of `--source`.
    Toc {
        /// Bookmarked PDF to read.
        #[arg(long)]
        source: PathBuf,
        /// Where to write the merged document.
        #[arg(long, default_value = "FinalWithTOC.pdf")]
        output: PathBuf,
        /// Leading outline entries left out of the table.
        #[arg(long, default_value_t = pdf_toc::toc::DEFAULT_SKIP_BOOKMARKS)]
        skip_bookmarks: usize,
    },

    /// Render the newspaper front page.
    Newspaper {
        #[arg(long, default_value = "newspaper.pdf")]
        output: PathBuf,
        /// Image for the two-thirds article; a placeholder is generated when omitted.
        #[arg(long)]
        left_image: Option<PathBuf>,
        /// Image for the one-third article; a placeholder is generated when omitted.
        #[arg(long)]
        right_image: Option<PathBuf>,
    },

    /// Write an outlined sample PDF to feed into `toc`.
    Sample {
        #[arg(long, default_value = "sample_outline.pdf")]
        output: PathBuf,
    },

    /// Render every demo under `target/run_all_examples`.
    #[command(name = "run-all", aliases = ["run_all", "all"])]
    RunAll,
}

fn main() {
    env_logger::init();
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Toc {
            source,
            output,
            skip_bookmarks,
        } => pdf_toc::demos::run_toc(&source, &output, skip_bookmarks),
        Commands::Newspaper {
            output,
            left_image,
            right_image,
        } => pdf_toc::demos::run_newspaper(&output, left_image, right_image),
        Commands::Sample { output } => pdf_toc::demos::run_sample(&output),
        Commands::RunAll => pdf_toc::demos::run_all_demos(),
    };

    if let Err(err) = result {
        log::debug!("command failed: {:?}", err);
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
