//! Top-level document type for opening PDFs and extracting pages.

use pdfpage_core::{ExtractOptions, PageModel, PdfError};
use pdfpage_parse::lopdf;
use pdfpage_parse::{PageIndex, PageLoader, load_document};
use tracing::debug;

use crate::Page;

/// Iterator over pages of a document, yielding each page on demand.
///
/// Created by [`Document::pages()`]. Each call to [`next()`](Iterator::next)
/// interprets one page; pages are not retained after being yielded. Fonts,
/// images and forms parsed for one page are reused by the next.
pub struct PagesIter<'a> {
    doc: &'a Document,
    loader: Option<PageLoader<'a>>,
    current: usize,
    count: usize,
}

impl Iterator for PagesIter<'_> {
    type Item = Result<Page, PdfError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current >= self.count {
            return None;
        }
        let result = match self.loader.as_mut() {
            Some(loader) => loader
                .load(self.current)
                .map_err(PdfError::from)
                .and_then(|model| Page::from_model(model, &self.doc.options)),
            None => self.doc.page(self.current),
        };
        self.current += 1;
        Some(result)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.count - self.current;
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for PagesIter<'_> {}

/// Where page models come from.
enum Source {
    /// Built from the parsed file on each [`Document::page`] call.
    Pdf {
        doc: lopdf::Document,
        index: PageIndex,
    },
    /// Supplied by the caller.
    Models(Vec<PageModel>),
}

/// A document opened for extraction.
///
/// # Example
///
/// ```ignore
/// let doc = Document::open(&bytes, None)?;
/// let page = doc.page(0)?;
/// println!("{}", page.text());
/// ```
pub struct Document {
    source: Source,
    page_count: usize,
    options: ExtractOptions,
}

impl Document {
    /// Open a PDF from bytes.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::ParseError`] if the bytes are not a readable PDF
    /// or the document is encrypted.
    pub fn open(bytes: &[u8], options: Option<ExtractOptions>) -> Result<Self, PdfError> {
        let doc = load_document(bytes)?;
        Ok(Self::from_lopdf(doc, options))
    }

    /// Open a PDF from a file path.
    pub fn open_file(
        path: impl AsRef<std::path::Path>,
        options: Option<ExtractOptions>,
    ) -> Result<Self, PdfError> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| PdfError::IoError(e.to_string()))?;
        Self::open(&bytes, options)
    }

    /// Wrap an already parsed lopdf document.
    pub fn from_lopdf(doc: lopdf::Document, options: Option<ExtractOptions>) -> Self {
        let index = PageIndex::new(&doc);
        let page_count = index.len();
        debug!(pages = page_count, "document opened");
        Self {
            source: Source::Pdf { doc, index },
            page_count,
            options: options.unwrap_or_default(),
        }
    }

    /// A document over caller-built page models, in page order.
    pub fn from_page_models(models: Vec<PageModel>, options: Option<ExtractOptions>) -> Self {
        Self {
            page_count: models.len(),
            source: Source::Models(models),
            options: options.unwrap_or_default(),
        }
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn options(&self) -> &ExtractOptions {
        &self.options
    }

    /// Interpret the page at 0-based `index`.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::PageIndexOutOfRange`] for a bad index, and the
    /// page-level errors of [`Page::from_model`].
    pub fn page(&self, index: usize) -> Result<Page, PdfError> {
        Page::from_model(self.page_model(index)?, &self.options)
    }

    /// The model of the page at `index`, without interpreting it.
    pub fn page_model(&self, index: usize) -> Result<PageModel, PdfError> {
        if index >= self.page_count {
            return Err(PdfError::PageIndexOutOfRange {
                index,
                count: self.page_count,
            });
        }
        match &self.source {
            Source::Pdf { doc, index: pages } => {
                Ok(PageLoader::with_index(doc, pages.clone()).load(index)?)
            }
            Source::Models(models) => Ok(models[index].clone()),
        }
    }

    /// Iterate over the pages, interpreting each on demand.
    pub fn pages(&self) -> PagesIter<'_> {
        let loader = match &self.source {
            Source::Pdf { doc, index } => Some(PageLoader::with_index(doc, index.clone())),
            Source::Models(_) => None,
        };
        PagesIter {
            doc: self,
            loader,
            current: 0,
            count: self.page_count,
        }
    }

    /// Interpret every page on the rayon thread pool.
    ///
    /// Results are in page order.
    #[cfg(feature = "parallel")]
    pub fn pages_parallel(&self) -> Vec<Result<Page, PdfError>> {
        use rayon::prelude::*;

        (0..self.page_count)
            .into_par_iter()
            .map(|i| self.page(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfpage_core::{FontDescriptor, ResourceTable};

    fn models() -> Vec<PageModel> {
        let font = FontDescriptor::new("F1").with_widths(65, vec![500.0; 26]);
        let resources = ResourceTable::new().with_font("F1", font);
        ["AB", "CD", "EF"]
            .iter()
            .enumerate()
            .map(|(i, text)| {
                PageModel::new(i, 612.0, 792.0, format!("BT /F1 10 Tf ({text}) Tj ET"))
                    .with_resources(resources.clone())
            })
            .collect()
    }

    #[test]
    fn pages_in_order() {
        let doc = Document::from_page_models(models(), None);
        assert_eq!(doc.page_count(), 3);
        let texts: Vec<String> = doc
            .pages()
            .map(|p| p.unwrap().text().to_string())
            .collect();
        assert_eq!(texts, vec!["AB", "CD", "EF"]);
        assert_eq!(doc.pages().len(), 3);
    }

    #[test]
    fn page_index_out_of_range() {
        let doc = Document::from_page_models(models(), None);
        assert!(matches!(
            doc.page(3),
            Err(PdfError::PageIndexOutOfRange { index: 3, count: 3 })
        ));
    }

    #[test]
    fn open_rejects_garbage() {
        assert!(matches!(
            Document::open(b"%PDF-1.7 nothing else", None),
            Err(PdfError::ParseError(_))
        ));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn pages_parallel_matches_sequential() {
        let doc = Document::from_page_models(models(), None);
        let parallel: Vec<String> = doc
            .pages_parallel()
            .into_iter()
            .map(|p| p.unwrap().text().to_string())
            .collect();
        let sequential: Vec<String> = doc
            .pages()
            .map(|p| p.unwrap().text().to_string())
            .collect();
        assert_eq!(parallel, sequential);
    }
}
