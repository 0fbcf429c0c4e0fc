use std::error::Error;
use std::fs;
use std::path::Path;

use crate::sample::build_sample_pdf;
use crate::toc::{TocGenerator, TocOptions};

/// Prepends a table of contents to `source` and writes the result to `output`.
///
/// Rendering needs the font family described in [`crate::fonts`].
pub fn run(source: &Path, output: &Path, skip_bookmarks: usize) -> Result<(), Box<dyn Error>> {
    let generator = TocGenerator::new(TocOptions::default().with_skip_bookmarks(skip_bookmarks));
    let generated = generator.generate_file(source, output)?;
    println!(
        "Generated {} ({} bytes): {} TOC page(s), {} row(s)",
        output.display(),
        generated.bytes.len(),
        generated.toc_pages,
        generated.rows.len()
    );
    Ok(())
}

/// Writes the bundled outlined sample document to `output`.
pub fn run_sample(output: &Path) -> Result<(), Box<dyn Error>> {
    let bytes = build_sample_pdf()?;
    fs::write(output, &bytes)?;
    println!("Generated {} ({} bytes)", output.display(), bytes.len());
    Ok(())
}
