//! Core entry point for the pdf_toc crate.
//!
//! The crate reads the bookmark outline of an existing PDF, lays out a table of
//! contents with dot leaders and linked page numbers, and prepends it to the
//! original document. It also ships a small newspaper layout built from the same
//! `genpdf` primitives.

pub mod builder;
pub mod demos;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod merge;
pub mod newspaper;
pub mod outline;
pub mod sample;
pub mod style;
pub mod toc;

pub use error::TocError;
pub use outline::Bookmark;
pub use toc::{GeneratedToc, TocGenerator, TocOptions};
