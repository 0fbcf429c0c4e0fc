use std::error::Error;
use std::path::{Path, PathBuf};

use crate::newspaper::{render_newspaper_file, ImageSource, NewspaperOptions};

/// Renders the newspaper page to `output`, using generated placeholders for missing images.
pub fn run(
    output: &Path,
    left_image: Option<PathBuf>,
    right_image: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    let mut options = NewspaperOptions::default();
    if let Some(path) = left_image {
        options = options.with_lead_image(ImageSource::Path(path));
    }
    if let Some(path) = right_image {
        options = options.with_side_image(ImageSource::Path(path));
    }

    let written = render_newspaper_file(&options, output)?;
    println!("Generated {} ({} bytes)", output.display(), written);
    Ok(())
}
