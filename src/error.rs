//! Error type shared by the outline, merge and TOC pipeline code.

use std::fmt;

/// Errors that can occur while reading outlines, rendering the TOC, or merging documents.
#[derive(Debug)]
pub enum TocError {
    /// The PDF bytes could not be parsed or written by `lopdf`.
    Pdf(lopdf::Error),
    /// `genpdf` failed to load fonts or render the generated pages.
    Render(genpdf::error::Error),
    /// Reading the source or writing the destination failed.
    Io(std::io::Error),
    /// A required catalog entry was missing from the document trailer.
    MissingCatalog,
    /// The catalog object was not a dictionary.
    InvalidCatalog,
    /// The catalog does not point at a usable `/Pages` tree.
    MissingPageTree,
    /// A named destination refers to a page that does not exist in the source document.
    MissingPage {
        /// Name of the destination being registered.
        destination: String,
        /// The requested zero-based page index.
        page_index: usize,
    },
}

impl From<lopdf::Error> for TocError {
    fn from(err: lopdf::Error) -> Self {
        Self::Pdf(err)
    }
}

impl From<genpdf::error::Error> for TocError {
    fn from(err: genpdf::error::Error) -> Self {
        Self::Render(err)
    }
}

impl From<std::io::Error> for TocError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl fmt::Display for TocError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pdf(err) => write!(f, "Failed to process PDF objects: {err}"),
            Self::Render(err) => write!(f, "Failed to render PDF pages: {err}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
            Self::MissingCatalog => write!(f, "PDF catalog entry is missing"),
            Self::InvalidCatalog => write!(f, "PDF catalog entry is not a dictionary"),
            Self::MissingPageTree => write!(f, "PDF catalog has no usable /Pages tree"),
            Self::MissingPage {
                destination,
                page_index,
            } => write!(
                f,
                "Destination {} refers to missing page index {}",
                destination, page_index
            ),
        }
    }
}

impl std::error::Error for TocError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Pdf(err) => Some(err),
            Self::Render(err) => Some(err),
            Self::Io(err) => Some(err),
            Self::MissingCatalog
            | Self::InvalidCatalog
            | Self::MissingPageTree
            | Self::MissingPage { .. } => None,
        }
    }
}
