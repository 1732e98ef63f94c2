//! Accumulators that turn interpreter events into page results.
//!
//! [`TextAssembler`] keeps three outputs aligned codepoint by codepoint: the
//! text, the attribute runs and one layout rectangle per codepoint.
//! [`ImageCollector`] records image placements in paint order. Both are
//! single-use: a second `finalize` fails with [`PdfError::AlreadyFinalized`].

use std::sync::{Arc, Weak};

use crate::error::PdfError;
use crate::geometry::Rectangle;
use crate::images::ImagePlacement;
use crate::page_model::PageModel;
use crate::painting::Color;
use crate::text::TextAttributes;
use crate::unicode_norm::UnicodeNorm;

/// Formatting of a shown glyph, as seen by the assembler.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphStyle {
    pub font_name: String,
    pub font_size: f64,
    pub is_underlined: bool,
    pub color: Color,
}

impl GlyphStyle {
    fn matches(&self, run: &TextAttributes) -> bool {
        self.font_name == run.font_name
            && self.font_size == run.font_size
            && self.is_underlined == run.is_underlined
            && self.color == run.color
    }
}

/// The three aligned text outputs of a page.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AssembledText {
    pub text: String,
    pub attributes: Vec<TextAttributes>,
    /// One rectangle per codepoint of `text`.
    pub layout: Vec<Rectangle>,
}

/// Accumulates glyph events into text, attribute runs and layout.
#[derive(Debug, Default)]
pub struct TextAssembler {
    norm: UnicodeNorm,
    text: String,
    char_count: usize,
    runs: Vec<TextAttributes>,
    layout: Vec<Rectangle>,
    finalized: bool,
}

impl TextAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assembler applying `norm` to each glyph's text before appending it.
    pub fn with_normalization(norm: UnicodeNorm) -> Self {
        Self {
            norm,
            ..Self::default()
        }
    }

    /// Number of codepoints appended so far.
    pub fn len(&self) -> usize {
        self.char_count
    }

    pub fn is_empty(&self) -> bool {
        self.char_count == 0
    }

    /// Append the codepoints of one glyph.
    ///
    /// Every codepoint gets a copy of `rect`. The current run is extended
    /// when `style` matches it, otherwise a new run starts.
    pub fn on_glyph(
        &mut self,
        text: &str,
        style: &GlyphStyle,
        rect: Rectangle,
    ) -> Result<(), PdfError> {
        if self.finalized {
            return Err(PdfError::AlreadyFinalized);
        }
        let normalized;
        let text = if self.norm == UnicodeNorm::None {
            text
        } else {
            normalized = self.norm.normalize(text);
            normalized.as_str()
        };
        let n = text.chars().count();
        if n == 0 {
            return Ok(());
        }

        let start = self.char_count;
        let end = start + n;
        match self.runs.last_mut() {
            Some(run) if style.matches(run) => run.end_index = end,
            _ => self.runs.push(TextAttributes {
                font_name: style.font_name.clone(),
                font_size: style.font_size,
                is_underlined: style.is_underlined,
                start_index: start,
                end_index: end,
                color: style.color,
            }),
        }
        self.text.push_str(text);
        self.layout.extend(std::iter::repeat_n(rect, n));
        self.char_count = end;
        Ok(())
    }

    /// Hand out the accumulated outputs.
    pub fn finalize(&mut self) -> Result<AssembledText, PdfError> {
        if self.finalized {
            return Err(PdfError::AlreadyFinalized);
        }
        self.finalized = true;
        self.char_count = 0;
        Ok(AssembledText {
            text: std::mem::take(&mut self.text),
            attributes: std::mem::take(&mut self.runs),
            layout: std::mem::take(&mut self.layout),
        })
    }
}

/// Accumulates image placements in paint order. No deduplication.
#[derive(Debug, Default)]
pub struct ImageCollector {
    page: Weak<PageModel>,
    placements: Vec<ImagePlacement>,
    finalized: bool,
}

impl ImageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Collector whose placements refer back to `page` for pixel decode.
    pub fn for_page(page: &Arc<PageModel>) -> Self {
        Self {
            page: Arc::downgrade(page),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn on_image(
        &mut self,
        id: u32,
        name: impl Into<String>,
        area: Rectangle,
    ) -> Result<(), PdfError> {
        if self.finalized {
            return Err(PdfError::AlreadyFinalized);
        }
        let mut placement = ImagePlacement::new(id, name, area);
        if let Some(page) = self.page.upgrade() {
            placement = placement.on_page(&page);
        }
        self.placements.push(placement);
        Ok(())
    }

    pub fn finalize(&mut self) -> Result<Vec<ImagePlacement>, PdfError> {
        if self.finalized {
            return Err(PdfError::AlreadyFinalized);
        }
        self.finalized = true;
        Ok(std::mem::take(&mut self.placements))
    }
}
