//! Content handler feeding the text assembler and image collector.

use std::sync::Arc;

use pdfpage_core::{
    AssembledText, ExtractOptions, ExtractWarning, ImageCollector, ImagePlacement, PageModel,
    PdfError, TextAssembler,
};
use pdfpage_parse::{ContentHandler, GlyphEvent, ImageEvent};

/// Internal handler that collects one page's outputs during interpretation.
pub(crate) struct PageCollector {
    text: TextAssembler,
    images: ImageCollector,
    warnings: Vec<ExtractWarning>,
    collect_warnings: bool,
    strict_mode: bool,
    /// First failure: an escalated warning in strict mode, or an
    /// accumulator error.
    error: Option<PdfError>,
}

/// Everything extracted from one page.
pub(crate) struct Collected {
    pub text: AssembledText,
    pub images: Vec<ImagePlacement>,
    pub warnings: Vec<ExtractWarning>,
}

impl PageCollector {
    pub(crate) fn new(page: &Arc<PageModel>, options: &ExtractOptions) -> Self {
        Self {
            text: TextAssembler::with_normalization(options.unicode_norm),
            images: ImageCollector::for_page(page),
            warnings: Vec::new(),
            collect_warnings: options.collect_warnings,
            strict_mode: options.strict_mode,
            error: None,
        }
    }

    fn fail(&mut self, err: PdfError) {
        if self.error.is_none() {
            self.error = Some(err);
        }
    }

    /// Close both accumulators.
    pub(crate) fn finish(mut self) -> Result<Collected, PdfError> {
        if let Some(err) = self.error.take() {
            return Err(err);
        }
        Ok(Collected {
            text: self.text.finalize()?,
            images: self.images.finalize()?,
            warnings: self.warnings,
        })
    }
}

impl ContentHandler for PageCollector {
    fn on_glyph(&mut self, event: GlyphEvent) {
        if let Err(err) = self.text.on_glyph(&event.text, &event.style, event.rect) {
            self.fail(err);
        }
    }

    fn on_image(&mut self, event: ImageEvent) {
        if let Err(err) = self.images.on_image(event.id, event.name, event.area) {
            self.fail(err);
        }
    }

    fn on_warning(&mut self, warning: ExtractWarning) {
        if self.strict_mode {
            self.fail(warning.to_error());
        }
        if self.collect_warnings {
            self.warnings.push(warning);
        }
    }
}
