//! A newspaper-style front page: headline, subtitle and two articles side by side.

use std::fs;
use std::path::{Path, PathBuf};

use genpdf::elements::{LinearLayout, Paragraph};
use genpdf::error::Error;
use genpdf::{Alignment, Element as _, Margins, PaperSize};
use image::{DynamicImage, ImageBuffer, Rgb};
use log::{debug, info};

use crate::builder::DocumentBuilder;
use crate::elements::{FullWidthImage, SideBySide, TextColumns};
use crate::style::TextStyle;

/// Body text used when an article does not bring its own.
pub const LOREM_IPSUM: &str = "Lorem ipsum dolor sit amet, consectetur adipiscing elit. Sed \
efficitur sem lectus, in tincidunt lectus suscipit id.

Suspendisse id dignissim nisl, in commodo justo. Donec cursus interdum euismod. Nullam eget urna \
libero. Donec dictum sodales urna, ac pellentesque ex pellentesque non.

Cras et tellus et augue egestas tincidunt. Aenean elit nisl, volutpat vitae dictum vitae, \
consequat at risus";

const HEADLINE_STYLE: TextStyle = TextStyle::new(50).bold();
const SUBTITLE_STYLE: TextStyle = TextStyle::new(30).bold();
const ARTICLE_HEADLINE_STYLE: TextStyle = TextStyle::new(20).bold();
const BODY_STYLE: TextStyle = TextStyle::new(14);

/// Where an article image comes from.
#[derive(Clone, Debug, PartialEq)]
pub enum ImageSource {
    Path(PathBuf),
    Bytes(Vec<u8>),
    /// A generated gradient of the given pixel size and base color.
    Placeholder {
        width: u32,
        height: u32,
        color: (u8, u8, u8),
    },
}

impl ImageSource {
    fn load(&self) -> Result<FullWidthImage, Error> {
        match self {
            Self::Path(path) => FullWidthImage::from_path(path),
            Self::Bytes(bytes) => FullWidthImage::from_bytes(bytes),
            Self::Placeholder {
                width,
                height,
                color,
            } => FullWidthImage::from_dynamic_image(placeholder_image(*width, *height, *color)),
        }
    }
}

/// Builds a vertical gradient fading from `color` to white.
pub fn placeholder_image(width: u32, height: u32, color: (u8, u8, u8)) -> DynamicImage {
    let height = height.max(1);
    let buffer = ImageBuffer::from_fn(width.max(1), height, |_, y| {
        let t = y as f32 / height as f32;
        let blend = |channel: u8| (f32::from(channel) + (255.0 - f32::from(channel)) * t) as u8;
        Rgb([blend(color.0), blend(color.1), blend(color.2)])
    });
    DynamicImage::ImageRgb8(buffer)
}

/// One column of the page.
#[derive(Clone, Debug, PartialEq)]
pub struct Article {
    pub headline: String,
    pub body: String,
    pub image: ImageSource,
    /// Number of text columns the body flows through.
    pub columns: usize,
}

impl Article {
    pub fn new(headline: impl Into<String>, image: ImageSource, columns: usize) -> Self {
        Self {
            headline: headline.into(),
            body: LOREM_IPSUM.to_owned(),
            image,
            columns,
        }
    }

    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    fn into_element(self, gutter_mm: f64) -> Result<LinearLayout, Error> {
        let mut layout = LinearLayout::vertical();
        layout.push(self.image.load()?);
        layout.push(
            Paragraph::new(self.headline)
                .aligned(Alignment::Center)
                .styled(ARTICLE_HEADLINE_STYLE.to_genpdf()),
        );
        layout.push(
            TextColumns::new(self.body, self.columns, gutter_mm).styled(BODY_STYLE.to_genpdf()),
        );
        Ok(layout)
    }
}

/// Content and geometry of the page.
#[derive(Clone, Debug, PartialEq)]
pub struct NewspaperOptions {
    pub headline: String,
    pub subtitle: String,
    pub margin_mm: f64,
    /// Space between the two articles.
    pub article_gutter_mm: f64,
    /// Space between the text columns of an article.
    pub column_gutter_mm: f64,
    /// Takes two thirds of the width.
    pub lead: Article,
    /// Takes the remaining third.
    pub side: Article,
}

impl Default for NewspaperOptions {
    fn default() -> Self {
        Self {
            headline: "HEADLINE".to_owned(),
            subtitle: "SUBTITLE HERE".to_owned(),
            margin_mm: 10.0,
            article_gutter_mm: 2.0,
            column_gutter_mm: 1.0,
            lead: Article::new(
                "This is the first article's headline",
                ImageSource::Placeholder {
                    width: 1200,
                    height: 800,
                    color: (70, 110, 160),
                },
                2,
            ),
            side: Article::new(
                "This is the second article's headline",
                ImageSource::Placeholder {
                    width: 600,
                    height: 800,
                    color: (160, 90, 60),
                },
                1,
            ),
        }
    }
}

impl NewspaperOptions {
    pub fn with_lead_image(mut self, image: ImageSource) -> Self {
        self.lead.image = image;
        self
    }

    pub fn with_side_image(mut self, image: ImageSource) -> Self {
        self.side.image = image;
        self
    }
}

/// Renders the page into PDF bytes.
pub fn render_newspaper(options: &NewspaperOptions) -> Result<Vec<u8>, Error> {
    render_newspaper_with(options, DocumentBuilder::new())
}

/// Renders the page with a caller-provided document builder (fonts, hyphenation).
pub fn render_newspaper_with(
    options: &NewspaperOptions,
    builder: DocumentBuilder,
) -> Result<Vec<u8>, Error> {
    let margin = crate::elements::mm_from_f64(options.margin_mm);
    let (mut document, counter) = builder
        .with_title(options.headline.as_str())
        .with_paper_size(PaperSize::A4)
        .with_margins(Margins::all(margin))
        .build()?;

    document.push(
        Paragraph::new(options.headline.as_str())
            .aligned(Alignment::Center)
            .styled(HEADLINE_STYLE.to_genpdf()),
    );
    document.push(
        Paragraph::new(options.subtitle.as_str())
            .aligned(Alignment::Center)
            .styled(SUBTITLE_STYLE.to_genpdf()),
    );

    let lead = options.lead.clone().into_element(options.column_gutter_mm)?;
    let side = options.side.clone().into_element(options.column_gutter_mm)?;
    document.push(
        SideBySide::new(options.article_gutter_mm)
            .with_column(2.0 / 3.0, lead)
            .with_column(1.0 / 3.0, side),
    );

    let mut buffer = Vec::new();
    document.render(&mut buffer)?;
    debug!("newspaper rendered on {} page(s)", counter.pages());
    Ok(buffer)
}

/// Renders the page and writes it to `path`, returning the number of bytes written.
pub fn render_newspaper_file(
    options: &NewspaperOptions,
    path: impl AsRef<Path>,
) -> Result<usize, Error> {
    let path = path.as_ref();
    let bytes = render_newspaper(options)?;
    fs::write(path, &bytes)
        .map_err(|err| Error::new(format!("Failed to write {}", path.display()), err))?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(bytes.len())
}

#[cfg(test)]
mod tests {
    use image::GenericImageView;

    use super::{placeholder_image, Article, ImageSource, NewspaperOptions, LOREM_IPSUM};

    fn png_bytes() -> Vec<u8> {
        let mut bytes = Vec::new();
        placeholder_image(8, 8, (10, 20, 30))
            .write_to(&mut bytes, image::ImageOutputFormat::Png)
            .unwrap();
        bytes
    }

    #[test]
    fn placeholder_fades_to_white() {
        let image = placeholder_image(4, 100, (0, 0, 0));
        assert_eq!(image.dimensions(), (4, 100));
        let top = image.get_pixel(0, 0);
        let bottom = image.get_pixel(0, 99);
        assert_eq!(top[0], 0);
        assert!(bottom[0] > 240);
    }

    #[test]
    fn defaults_split_the_page_into_two_and_one_columns() {
        let options = NewspaperOptions::default();
        assert_eq!(options.lead.columns, 2);
        assert_eq!(options.side.columns, 1);
        assert_eq!(options.lead.body, LOREM_IPSUM);
        assert_eq!(LOREM_IPSUM.split("\n\n").count(), 3);
    }

    #[test]
    fn images_load_from_encoded_bytes() {
        assert!(ImageSource::Bytes(png_bytes()).load().is_ok());
        assert!(ImageSource::Bytes(b"not an image".to_vec()).load().is_err());
    }

    #[test]
    fn articles_take_their_own_body() {
        let article = Article::new("Local news", ImageSource::Bytes(png_bytes()), 3)
            .with_body("First paragraph.\n\nSecond paragraph.");
        assert_eq!(article.body, "First paragraph.\n\nSecond paragraph.");
        assert_eq!(article.columns, 3);
        assert!(article.into_element(1.0).is_ok());
    }
}
