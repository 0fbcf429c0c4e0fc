//! Document construction helpers shared by the TOC renderer and the newspaper layout.

use std::cell::Cell;
use std::rc::Rc;

use genpdf::error::Error;
use genpdf::fonts::{FontData, FontFamily};
use genpdf::style;
use genpdf::{self, Margins, PageDecorator, Size};

#[cfg(feature = "hyphenation")]
use genpdf::hyphenation;

use crate::fonts;

/// Builder for `genpdf::Document` instances pre-configured with the crate defaults.
#[derive(Default)]
pub struct DocumentBuilder {
    title: Option<String>,
    paper_size: Option<Size>,
    margins: Option<Margins>,
    font_family: Option<FontFamily<FontData>>,
    #[cfg(feature = "hyphenation")]
    hyphenator: Option<hyphenation::Standard>,
}

/// Shared counter of the pages a document has started while rendering.
#[derive(Clone, Debug, Default)]
pub struct PageCounter(Rc<Cell<usize>>);

impl PageCounter {
    /// Number of pages decorated so far.
    pub fn pages(&self) -> usize {
        self.0.get()
    }

    fn increment(&self) -> usize {
        let next = self.0.get() + 1;
        self.0.set(next);
        next
    }
}

impl DocumentBuilder {
    /// Creates a new builder instance with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title stored in the PDF metadata.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the paper size used for newly created documents.
    pub fn with_paper_size(mut self, paper_size: impl Into<Size>) -> Self {
        self.paper_size = Some(paper_size.into());
        self
    }

    /// Sets the margins applied through the page decorator.
    pub fn with_margins(mut self, margins: impl Into<Margins>) -> Self {
        self.margins = Some(margins.into());
        self
    }

    /// Uses an already loaded font family instead of resolving the default one.
    pub fn with_font_family(mut self, family: FontFamily<FontData>) -> Self {
        self.font_family = Some(family);
        self
    }

    /// Enables hyphenation using the provided hyphenation dictionary.
    #[cfg(feature = "hyphenation")]
    pub fn with_hyphenator(mut self, hyphenator: hyphenation::Standard) -> Self {
        self.hyphenator = Some(hyphenator);
        self
    }

    /// Builds a configured `genpdf::Document` together with a counter of its rendered pages.
    pub fn build(self) -> Result<(genpdf::Document, PageCounter), Error> {
        let font_family = match self.font_family {
            Some(family) => family,
            None => fonts::default_font_family()?,
        };
        let mut document = genpdf::Document::new(font_family);

        if let Some(title) = self.title {
            document.set_title(title);
        }

        if let Some(paper_size) = self.paper_size {
            document.set_paper_size(paper_size);
        }

        let counter = PageCounter::default();
        document.set_page_decorator(CountingPageDecorator {
            margins: self.margins,
            counter: counter.clone(),
        });

        #[cfg(feature = "hyphenation")]
        if let Some(hyphenator) = self.hyphenator {
            document.set_hyphenator(hyphenator);
        }

        Ok((document, counter))
    }
}

struct CountingPageDecorator {
    margins: Option<Margins>,
    counter: PageCounter,
}

impl PageDecorator for CountingPageDecorator {
    fn decorate_page<'a>(
        &mut self,
        _context: &genpdf::Context,
        mut area: genpdf::render::Area<'a>,
        _style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        let page = self.counter.increment();
        log::trace!("decorating page {}", page);

        if let Some(margins) = self.margins {
            area.add_margins(margins);
        }

        Ok(area)
    }
}
