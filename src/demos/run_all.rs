use std::error::Error;
use std::fs;
use std::path::Path;

const OUTPUT_DIR: &str = "target/run_all_examples";

/// Writes the sample document, its TOC-prefixed version and the newspaper page to
/// `target/run_all_examples`.
pub fn run() -> Result<(), Box<dyn Error>> {
    let output_dir = Path::new(OUTPUT_DIR);
    fs::create_dir_all(output_dir)?;

    let sample = output_dir.join("sample_outline.pdf");
    super::toc::run_sample(&sample)?;
    super::toc::run(
        &sample,
        &output_dir.join("FinalWithTOC.pdf"),
        crate::toc::DEFAULT_SKIP_BOOKMARKS,
    )?;
    super::newspaper::run(&output_dir.join("newspaper.pdf"), None, None)?;

    println!("All renders completed successfully.");
    Ok(())
}
