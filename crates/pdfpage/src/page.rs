//! Page type for accessing extracted content from a PDF page.

use std::sync::Arc;

use pdfpage_core::{
    ExtractOptions, ExtractWarning, ImagePlacement, PageModel, PdfError, Rectangle,
    TextAttributes, TextEl, merge_text_layout_and_attrs,
};
use pdfpage_parse::{AdvanceLookup, ContentHandler, FontTableAdvances, interpret_page_with};
use tracing::debug;

use crate::collector::PageCollector;

/// A single interpreted page.
///
/// Holds the page text, its attribute runs, one rectangle per codepoint and
/// the image placements, all computed once when the page is built. The page
/// owns its [`PageModel`]; image placements keep only a weak reference to
/// it, so [`ImagePlacement::decode_with`] fails with
/// [`PdfError::PageClosed`] after [`Page::close`] or drop.
pub struct Page {
    model: Arc<PageModel>,
    advances: Arc<dyn AdvanceLookup>,
    text: String,
    attributes: Vec<TextAttributes>,
    layout: Vec<Rectangle>,
    images: Vec<ImagePlacement>,
    warnings: Vec<ExtractWarning>,
}

impl Page {
    /// Interpret `model` with advances from the fonts' width tables.
    ///
    /// # Errors
    ///
    /// Returns [`PdfError::UnreadableContentStream`] for an empty or wholly
    /// unreadable content stream, [`PdfError::ResourceLimitExceeded`] for an
    /// oversized one, and the first warning as an error in strict mode.
    pub fn from_model(model: PageModel, options: &ExtractOptions) -> Result<Self, PdfError> {
        Self::from_model_with(model, Arc::new(FontTableAdvances), options)
    }

    /// Interpret `model`, asking `advances` for glyph widths.
    ///
    /// The page keeps `advances` so [`render`](Page::render) lays glyphs
    /// out the same way.
    pub fn from_model_with(
        model: PageModel,
        advances: Arc<dyn AdvanceLookup>,
        options: &ExtractOptions,
    ) -> Result<Self, PdfError> {
        let model = Arc::new(model);
        let mut collector = PageCollector::new(&model, options);
        interpret_page_with(&model, advances.as_ref(), &mut collector, options)?;
        let collected = collector.finish()?;

        debug!(
            page = model.index,
            chars = collected.text.layout.len(),
            runs = collected.text.attributes.len(),
            images = collected.images.len(),
            warnings = collected.warnings.len(),
            "page extracted"
        );
        Ok(Self {
            model,
            advances,
            text: collected.text.text,
            attributes: collected.text.attributes,
            layout: collected.text.layout,
            images: collected.images,
            warnings: collected.warnings,
        })
    }

    /// The page text, in content stream order.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Attribute runs covering `[0, text().chars().count())` without gaps.
    pub fn text_attributes(&self) -> &[TextAttributes] {
        &self.attributes
    }

    /// One page-space rectangle per codepoint of [`text()`](Page::text).
    pub fn text_layout(&self) -> &[Rectangle] {
        &self.layout
    }

    /// Codepoints joined with their run and rectangle.
    pub fn text_layout_and_attrs(&self) -> Vec<TextEl> {
        merge_text_layout_and_attrs(&self.text, &self.attributes, &self.layout)
    }

    /// Image XObjects in paint order. Inline images are not included.
    pub fn images(&self) -> &[ImagePlacement] {
        &self.images
    }

    /// `(width, height)` in points.
    pub fn size(&self) -> (f64, f64) {
        self.model.size
    }

    /// 0-based page index.
    pub fn index(&self) -> usize {
        self.model.index
    }

    pub fn label(&self) -> &str {
        &self.model.label
    }

    /// Display duration in seconds for presentations, if set.
    pub fn duration(&self) -> Option<f64> {
        self.model.duration
    }

    /// Non-fatal problems met while interpreting the page.
    pub fn warnings(&self) -> &[ExtractWarning] {
        &self.warnings
    }

    /// The page model the outputs were computed from.
    pub fn model(&self) -> &PageModel {
        &self.model
    }

    /// Replay the content stream into another handler, e.g. a renderer.
    pub fn render(
        &self,
        handler: &mut dyn ContentHandler,
        options: &ExtractOptions,
    ) -> Result<(), PdfError> {
        interpret_page_with(&self.model, self.advances.as_ref(), handler, options)?;
        Ok(())
    }

    /// Release the page model.
    ///
    /// Dropping the page has the same effect.
    pub fn close(self) {
        debug!(page = self.model.index, "page closed");
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("index", &self.model.index)
            .field("label", &self.model.label)
            .field("size", &self.model.size)
            .field("chars", &self.layout.len())
            .field("images", &self.images.len())
            .finish()
    }
}
