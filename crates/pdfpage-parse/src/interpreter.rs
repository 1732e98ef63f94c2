//! Content stream interpreter.
//!
//! Reads tokens from a [`ContentStreamLexer`], assembles operands and
//! dispatches each operator to a graphics state transition or to a
//! [`ContentHandler`] callback. Form XObjects are interpreted recursively
//! within a raised stack floor. Every per-operator problem is recovered
//! from and reported as an [`ExtractWarning`]; only an empty or wholly
//! unreadable page stream fails the call.

use std::collections::HashSet;
use std::sync::Arc;

use pdfpage_core::{
    ColorSpace, Ctm, ExtractOptions, ExtractWarning, ExtractWarningCode, FillRule,
    FontDescriptor, FormXObject, GlyphStyle, ImageDescriptor, PageModel, PathBuilder, PdfError,
    ResourceTable, XObject, image_area_from_ctm,
};
use tracing::{debug, trace, warn};

use crate::color_space::resolve_color_space_name;
use crate::error::BackendError;
use crate::font::{AdvanceLookup, FontTableAdvances};
use crate::graphics_state::{GraphicsState, GraphicsStateStack};
use crate::handler::{ContentHandler, GlyphEvent, ImageEvent, InlineImageEvent, PaintOp, PathEvent};
use crate::lexer::{ContentStreamLexer, InlineImage, Token};
use crate::operand::{Operand, OperandStack};
use crate::operator::Op;
use crate::text_renderer::{
    ShownGlyph, TjElement, double_quote_show_string, quote_show_string, show_string,
    show_string_with_positioning,
};
use crate::text_state::TextRenderMode;

/// Interpret a page's content stream with advances from the fonts' width
/// tables.
pub fn interpret_page(
    page: &PageModel,
    handler: &mut dyn ContentHandler,
    options: &ExtractOptions,
) -> Result<(), BackendError> {
    interpret_page_with(page, &FontTableAdvances, handler, options)
}

/// Interpret a page's content stream, asking `advances` for glyph widths.
///
/// Fails only when the page stream is empty, larger than
/// `options.max_stream_bytes`, or not a single token could be read from it.
pub fn interpret_page_with(
    page: &PageModel,
    advances: &dyn AdvanceLookup,
    handler: &mut dyn ContentHandler,
    options: &ExtractOptions,
) -> Result<(), BackendError> {
    if page.content.is_empty() {
        warn!(page = page.index, "empty content stream");
        return Err(BackendError::UnreadableStream(format!(
            "page {} has an empty content stream",
            page.index
        )));
    }
    if page.content.len() > options.max_stream_bytes {
        warn!(page = page.index, bytes = page.content.len(), "content stream too large");
        return Err(PdfError::ResourceLimitExceeded {
            limit_name: "max_stream_bytes".to_string(),
            limit_value: options.max_stream_bytes,
            actual_value: page.content.len(),
        }
        .into());
    }

    let mut interpreter =
        ContentStreamInterpreter::new(handler, advances, options).for_page(page.index);
    let scope = Scope::root(&page.resources);
    let stats = interpreter.run(&page.content, &scope);

    if stats.valid_tokens == 0 && stats.lexer_errors > 0 {
        warn!(page = page.index, errors = stats.lexer_errors, "no valid token in content stream");
        return Err(BackendError::UnreadableStream(format!(
            "page {}: {} syntax errors and no valid token",
            page.index, stats.lexer_errors
        )));
    }
    Ok(())
}

/// Resource tables visible to the stream being interpreted: a form's own
/// table first, then the enclosing scope.
struct Scope<'r> {
    table: &'r ResourceTable,
    parent: Option<&'r Scope<'r>>,
}

impl<'r> Scope<'r> {
    fn root(table: &'r ResourceTable) -> Self {
        Self { table, parent: None }
    }

    fn font(&self, name: &str) -> Option<&'r Arc<FontDescriptor>> {
        self.table
            .font(name)
            .or_else(|| self.parent.and_then(|p| p.font(name)))
    }

    fn xobject(&self, name: &str) -> Option<&'r XObject> {
        self.table
            .xobject(name)
            .or_else(|| self.parent.and_then(|p| p.xobject(name)))
    }

    fn color_space(&self, name: &str) -> Option<ColorSpace> {
        resolve_color_space_name(name, self.table)
            .or_else(|| self.parent.and_then(|p| p.color_space(name)))
    }
}

/// Token counts of one stream.
#[derive(Debug, Default, Clone, Copy)]
struct StreamStats {
    valid_tokens: usize,
    lexer_errors: usize,
}

/// Operator dispatcher over a graphics state stack.
///
/// One interpreter handles one page; nested forms reuse it.
pub struct ContentStreamInterpreter<'a> {
    handler: &'a mut dyn ContentHandler,
    advances: &'a dyn AdvanceLookup,
    options: &'a ExtractOptions,
    page_index: Option<usize>,
    stack: GraphicsStateStack,
    in_text_object: bool,
    path: PathBuilder,
    depth: usize,
    tokens_read: usize,
    operator_index: usize,
    halted: bool,
    fallback_fonts: HashSet<String>,
}

impl<'a> ContentStreamInterpreter<'a> {
    pub fn new(
        handler: &'a mut dyn ContentHandler,
        advances: &'a dyn AdvanceLookup,
        options: &'a ExtractOptions,
    ) -> Self {
        Self {
            handler,
            advances,
            options,
            page_index: None,
            stack: GraphicsStateStack::new(GraphicsState::default()),
            in_text_object: false,
            path: PathBuilder::new(),
            depth: 0,
            tokens_read: 0,
            operator_index: 0,
            halted: false,
            fallback_fonts: HashSet::new(),
        }
    }

    /// Tag warnings with `index` (builder pattern).
    pub fn for_page(mut self, index: usize) -> Self {
        self.page_index = Some(index);
        self
    }

    /// Start from `state` instead of the default graphics state (builder pattern).
    pub fn with_initial_state(mut self, state: GraphicsState) -> Self {
        self.stack = GraphicsStateStack::new(state);
        self
    }

    /// The current graphics state.
    pub fn state(&self) -> &GraphicsState {
        self.stack.current()
    }

    /// Interpret `content` against `resources` without page-level checks.
    pub fn interpret(&mut self, content: &[u8], resources: &ResourceTable) {
        let scope = Scope::root(resources);
        self.run(content, &scope);
    }

    fn run(&mut self, content: &[u8], scope: &Scope<'_>) -> StreamStats {
        let mut stats = StreamStats::default();
        let mut lexer = ContentStreamLexer::new(content);
        let mut operands = OperandStack::new();

        loop {
            if self.halted {
                break;
            }
            let offset = lexer.offset();
            let Some(item) = lexer.next() else {
                break;
            };

            self.tokens_read += 1;
            if self.tokens_read > self.options.max_tokens {
                self.halted = true;
                warn!(limit = self.options.max_tokens, "token ceiling reached");
                self.report(ExtractWarning::with_code(
                    ExtractWarningCode::ResourceLimitReached,
                    format!(
                        "token ceiling of {} reached; interpretation stopped",
                        self.options.max_tokens
                    ),
                ));
                break;
            }

            match item {
                Err(err) => {
                    stats.lexer_errors += 1;
                    debug!(%err, "lexer error");
                    self.report_error(&err, None);
                }
                Ok(Token::Operator(keyword)) => {
                    stats.valid_tokens += 1;
                    let (args, unterminated) = operands.take();
                    if let Some(err) = unterminated {
                        debug!(%err, "unterminated container");
                        self.report_error(&err, None);
                    }
                    self.execute(&keyword, &args, scope);
                    self.operator_index += 1;
                }
                Ok(Token::InlineImage(image)) => {
                    stats.valid_tokens += 1;
                    operands.clear();
                    self.inline_image(&image);
                    self.operator_index += 1;
                }
                Ok(token) => {
                    stats.valid_tokens += 1;
                    if let Err(err) = operands.push(token, offset) {
                        debug!(%err, "stray delimiter");
                        self.report_error(&err, None);
                    }
                }
            }
        }

        if !operands.is_empty() && !self.halted {
            debug!(count = operands.len(), "operands left without an operator");
        }
        stats
    }

    fn execute(&mut self, keyword: &str, operands: &[Operand], scope: &Scope<'_>) {
        let Some(op) = Op::from_keyword(keyword) else {
            debug!(operator = keyword, "unknown operator");
            self.report_error(&BackendError::UnknownOperator(keyword.to_string()), None);
            return;
        };

        if op.needs_text_object() && !self.in_text_object {
            debug!(operator = keyword, "text operator outside BT/ET ignored");
            return;
        }
        let operands = match op.arity() {
            Some(n) if operands.len() > n => &operands[operands.len() - n..],
            _ => operands,
        };

        match op {
            // --- Graphics state operators ---
            Op::Save => self.stack.save(),
            Op::Restore => {
                if !self.stack.restore() {
                    debug!("Q with no saved state ignored");
                    self.report(ExtractWarning::with_code(
                        ExtractWarningCode::UnbalancedRestore,
                        "Q without matching q",
                    ));
                }
            }
            Op::ConcatMatrix => {
                if let Some(m) = get_matrix(operands) {
                    self.gs().concat_matrix(&m);
                }
            }
            Op::LineWidth => {
                if let Some(w) = get_f64(operands, 0) {
                    self.gs().line_width = w;
                }
            }
            Op::LineCap
            | Op::LineJoin
            | Op::MiterLimit
            | Op::Dash
            | Op::RenderingIntent
            | Op::Flatness
            | Op::ExtGState => {}

            // --- Color operators ---
            Op::StrokeGray => {
                if let Some(g) = get_f64(operands, 0) {
                    self.gs().set_stroke_gray(g);
                }
            }
            Op::FillGray => {
                if let Some(g) = get_f64(operands, 0) {
                    self.gs().set_fill_gray(g);
                }
            }
            Op::StrokeRgb => {
                if let Some([r, g, b]) = get_numbers::<3>(operands) {
                    self.gs().set_stroke_rgb(r, g, b);
                }
            }
            Op::FillRgb => {
                if let Some([r, g, b]) = get_numbers::<3>(operands) {
                    self.gs().set_fill_rgb(r, g, b);
                }
            }
            Op::StrokeCmyk => {
                if let Some([c, m, y, k]) = get_numbers::<4>(operands) {
                    self.gs().set_stroke_cmyk(c, m, y, k);
                }
            }
            Op::FillCmyk => {
                if let Some([c, m, y, k]) = get_numbers::<4>(operands) {
                    self.gs().set_fill_cmyk(c, m, y, k);
                }
            }
            Op::StrokeColorSpace | Op::FillColorSpace => {
                let Some(name) = operands.first().and_then(Operand::as_name) else {
                    return;
                };
                let cs = self.lookup_color_space(name, scope);
                if op == Op::StrokeColorSpace {
                    self.gs().set_stroke_color_space(cs);
                } else {
                    self.gs().set_fill_color_space(cs);
                }
            }
            Op::StrokeColor | Op::StrokeColorN => {
                let components = numbers(operands);
                if !self.gs().set_stroke_color(&components) {
                    debug!("stroke color unresolved, using black");
                }
            }
            Op::FillColor | Op::FillColorN => {
                let components = numbers(operands);
                if !self.gs().set_fill_color(&components) {
                    debug!("fill color unresolved, using black");
                }
            }

            // --- Text object and state operators ---
            Op::BeginText => {
                self.in_text_object = true;
                self.gs().text.begin_text();
            }
            Op::EndText => self.in_text_object = false,
            Op::CharSpacing => {
                if let Some(v) = get_f64(operands, 0) {
                    self.gs().text.char_spacing = v;
                }
            }
            Op::WordSpacing => {
                if let Some(v) = get_f64(operands, 0) {
                    self.gs().text.word_spacing = v;
                }
            }
            Op::HorizScale => {
                if let Some(v) = get_f64(operands, 0) {
                    self.gs().text.h_scaling = v;
                }
            }
            Op::Leading => {
                if let Some(v) = get_f64(operands, 0) {
                    self.gs().text.leading = v;
                }
            }
            Op::RenderMode => {
                match get_f64(operands, 0).and_then(|v| TextRenderMode::from_i64(v as i64)) {
                    Some(mode) => self.gs().text.render_mode = mode,
                    None => debug!("invalid text render mode ignored"),
                }
            }
            Op::Rise => {
                if let Some(v) = get_f64(operands, 0) {
                    self.gs().text.rise = v;
                }
            }
            Op::Font => self.set_font(operands, scope),

            // --- Text positioning operators ---
            Op::MoveText => {
                if let Some([tx, ty]) = get_numbers::<2>(operands) {
                    self.gs().text.move_text_position(tx, ty);
                }
            }
            Op::MoveTextSetLeading => {
                if let Some([tx, ty]) = get_numbers::<2>(operands) {
                    self.gs().text.move_text_position_and_set_leading(tx, ty);
                }
            }
            Op::TextMatrix => {
                if let Some(m) = get_matrix(operands) {
                    self.gs().text.set_text_matrix(m);
                }
            }
            Op::NextLine => self.gs().text.move_to_next_line(),

            // --- Text showing operators ---
            Op::ShowText => {
                if let Some(bytes) = operands.first().and_then(Operand::as_bytes) {
                    self.show_text(|gs, font, advances| {
                        show_string(&mut gs.text, &gs.ctm, font, bytes, advances)
                    });
                }
            }
            Op::ShowTextArray => {
                if let Some(items) = operands.first().and_then(Operand::as_array) {
                    let elements = TjElement::from_operands(items);
                    self.show_text(|gs, font, advances| {
                        show_string_with_positioning(&mut gs.text, &gs.ctm, font, &elements, advances)
                    });
                }
            }
            Op::NextLineShowText => {
                if let Some(bytes) = operands.first().and_then(Operand::as_bytes) {
                    self.show_text(|gs, font, advances| {
                        quote_show_string(&mut gs.text, &gs.ctm, font, bytes, advances)
                    });
                }
            }
            Op::NextLineShowTextSpaced => {
                let (Some(aw), Some(ac), Some(bytes)) = (
                    get_f64(operands, 0),
                    get_f64(operands, 1),
                    operands.get(2).and_then(Operand::as_bytes),
                ) else {
                    return;
                };
                self.show_text(|gs, font, advances| {
                    double_quote_show_string(&mut gs.text, &gs.ctm, font, aw, ac, bytes, advances)
                });
            }

            // --- XObjects ---
            Op::PaintXObject => {
                if let Some(name) = operands.first().and_then(Operand::as_name) {
                    self.paint_xobject(name, scope);
                }
            }
            // a complete BI ... EI arrives as one token; stray keywords are dropped
            Op::BeginInlineImage | Op::InlineImageData | Op::EndInlineImage => {}
            Op::Shading => {}

            // --- Path construction operators ---
            Op::MoveTo => {
                if let Some([x, y]) = get_numbers::<2>(operands) {
                    let ctm = self.stack.current().ctm;
                    self.path.move_to(&ctm, x, y);
                }
            }
            Op::LineTo => {
                if let Some([x, y]) = get_numbers::<2>(operands) {
                    let ctm = self.stack.current().ctm;
                    self.path.line_to(&ctm, x, y);
                }
            }
            Op::CurveTo => {
                if let Some([x1, y1, x2, y2, x3, y3]) = get_numbers::<6>(operands) {
                    let ctm = self.stack.current().ctm;
                    self.path.curve_to(&ctm, x1, y1, x2, y2, x3, y3);
                }
            }
            Op::CurveToV => {
                if let Some([x2, y2, x3, y3]) = get_numbers::<4>(operands) {
                    let ctm = self.stack.current().ctm;
                    self.path.curve_to_v(&ctm, x2, y2, x3, y3);
                }
            }
            Op::CurveToY => {
                if let Some([x1, y1, x3, y3]) = get_numbers::<4>(operands) {
                    let ctm = self.stack.current().ctm;
                    self.path.curve_to_y(&ctm, x1, y1, x3, y3);
                }
            }
            Op::ClosePath => self.path.close_path(),
            Op::Rectangle => {
                if let Some([x, y, w, h]) = get_numbers::<4>(operands) {
                    let ctm = self.stack.current().ctm;
                    self.path.rectangle(&ctm, x, y, w, h);
                }
            }

            // --- Path painting operators ---
            Op::Stroke => self.paint_path(PaintOp::Stroke, None),
            Op::CloseStroke => {
                self.path.close_path();
                self.paint_path(PaintOp::Stroke, None);
            }
            Op::Fill | Op::FillObsolete => {
                self.paint_path(PaintOp::Fill, Some(FillRule::NonZeroWinding))
            }
            Op::FillEvenOdd => self.paint_path(PaintOp::Fill, Some(FillRule::EvenOdd)),
            Op::FillStroke => {
                self.paint_path(PaintOp::FillAndStroke, Some(FillRule::NonZeroWinding))
            }
            Op::FillStrokeEvenOdd => {
                self.paint_path(PaintOp::FillAndStroke, Some(FillRule::EvenOdd))
            }
            Op::CloseFillStroke => {
                self.path.close_path();
                self.paint_path(PaintOp::FillAndStroke, Some(FillRule::NonZeroWinding));
            }
            Op::CloseFillStrokeEvenOdd => {
                self.path.close_path();
                self.paint_path(PaintOp::FillAndStroke, Some(FillRule::EvenOdd));
            }
            Op::EndPath => {
                self.path.take();
            }

            // --- Clipping, marked content, compatibility, Type3 metrics ---
            Op::Clip | Op::ClipEvenOdd => {}
            Op::MarkPoint
            | Op::MarkPointProps
            | Op::BeginMarked
            | Op::BeginMarkedProps
            | Op::EndMarked => {}
            Op::BeginCompat | Op::EndCompat => {}
            Op::GlyphWidth | Op::GlyphWidthBBox => {}
        }
    }

    fn gs(&mut self) -> &mut GraphicsState {
        self.stack.current_mut()
    }

    // --- Fonts and text ---

    fn set_font(&mut self, operands: &[Operand], scope: &Scope<'_>) {
        let (Some(name), Some(size)) = (
            operands.first().and_then(Operand::as_name),
            get_f64(operands, 1),
        ) else {
            debug!("Tf without font name and size ignored");
            return;
        };

        let font = match scope.font(name) {
            Some(font) => Arc::clone(font),
            None => {
                debug!(font = name, "font not found, using fallback");
                self.report_error(
                    &BackendError::ResourceNotFound {
                        kind: "font",
                        name: name.to_string(),
                    },
                    Some(name),
                );
                Arc::new(FontDescriptor::fallback(name))
            }
        };
        self.gs().text.set_font(font, size);
    }

    /// Run a text-showing operator and emit one glyph event per glyph.
    fn show_text<F>(&mut self, show: F)
    where
        F: FnOnce(&mut GraphicsState, &FontDescriptor, &dyn AdvanceLookup) -> Vec<ShownGlyph>,
    {
        let font = match self.stack.current().text.font.clone() {
            Some(font) => font,
            None => {
                debug!("text shown before any Tf, using fallback font");
                self.report(ExtractWarning::with_code(
                    ExtractWarningCode::ResourceNotFound,
                    "text shown with no font selected",
                ));
                let fallback = Arc::new(FontDescriptor::fallback(""));
                self.gs().text.font = Some(Arc::clone(&fallback));
                fallback
            }
        };

        let advances = self.advances;
        let shown = show(self.stack.current_mut(), font.as_ref(), advances);

        let gs = self.stack.current();
        let render_mode = gs.text.render_mode;
        let style = GlyphStyle {
            font_name: font.display_name().to_string(),
            font_size: gs.text.font_size,
            is_underlined: font.flags.underline,
            color: if render_mode.is_stroke_only() {
                gs.stroke_color
            } else {
                gs.fill_color
            },
        };

        let mut unmapped = false;
        for glyph in shown {
            unmapped |= glyph.glyph.unmapped;
            self.handler.on_glyph(GlyphEvent {
                code: glyph.glyph.code,
                text: glyph.glyph.text,
                style: style.clone(),
                rect: glyph.rect,
                rendering_matrix: glyph.rendering_matrix,
                advance: glyph.advance,
                render_mode,
            });
        }

        if unmapped && self.fallback_fonts.insert(font.name.clone()) {
            debug!(font = %font.name, "codes without Unicode mapping, Latin-1 used");
            self.report(
                ExtractWarning::with_code(
                    ExtractWarningCode::EncodingFallback,
                    "character codes without Unicode mapping decoded as Latin-1",
                )
                .for_resource(font.name.clone()),
            );
        }
    }

    // --- XObjects ---

    fn paint_xobject(&mut self, name: &str, scope: &Scope<'_>) {
        match scope.xobject(name) {
            None => {
                debug!(xobject = name, "XObject not found, Do skipped");
                self.report_error(
                    &BackendError::ResourceNotFound {
                        kind: "XObject",
                        name: name.to_string(),
                    },
                    Some(name),
                );
            }
            Some(XObject::Image(image)) => self.paint_image(name, image),
            Some(XObject::Form(form)) => self.paint_form(name, form, scope),
        }
    }

    fn paint_image(&mut self, name: &str, image: &ImageDescriptor) {
        let ctm = self.stack.current().ctm;
        self.handler.on_image(ImageEvent {
            id: image.id,
            name: name.to_string(),
            area: image_area_from_ctm(&ctm),
            ctm,
            width: image.width,
            height: image.height,
        });
    }

    fn paint_form(&mut self, name: &str, form: &FormXObject, scope: &Scope<'_>) {
        if self.depth >= self.options.max_recursion_depth {
            warn!(
                xobject = name,
                limit = self.options.max_recursion_depth,
                "form nesting limit reached, Do skipped"
            );
            self.report_error(
                &BackendError::RecursionLimitExceeded {
                    depth: self.depth + 1,
                    limit: self.options.max_recursion_depth,
                },
                Some(name),
            );
            return;
        }

        trace!(xobject = name, depth = self.depth + 1, "entering form");
        let previous_floor = self.stack.begin_scope();
        self.gs().concat_matrix(&form.matrix);
        let saved_text_object = std::mem::replace(&mut self.in_text_object, false);
        let saved_path = std::mem::take(&mut self.path);
        self.depth += 1;

        match form.resources.as_deref() {
            Some(table) => {
                let inner = Scope {
                    table,
                    parent: Some(scope),
                };
                self.run(&form.content, &inner);
            }
            None => {
                self.run(&form.content, scope);
            }
        }

        self.depth -= 1;
        self.path = saved_path;
        self.in_text_object = saved_text_object;
        self.stack.end_scope(previous_floor);
        trace!(xobject = name, depth = self.depth, "left form");
    }

    fn inline_image(&mut self, image: &InlineImage) {
        let dimension = |key: &str, abbrev: &str| {
            image
                .get(key, abbrev)
                .and_then(Operand::as_f64)
                .map_or(0, |v| v.max(0.0) as u32)
        };
        let ctm = self.stack.current().ctm;
        self.handler.on_inline_image(InlineImageEvent {
            area: image_area_from_ctm(&ctm),
            ctm,
            width: dimension("Width", "W"),
            height: dimension("Height", "H"),
            data: image.data.clone(),
        });
    }

    // --- Paths ---

    fn paint_path(&mut self, paint_op: PaintOp, fill_rule: Option<FillRule>) {
        let path = self.path.take();
        if path.is_empty() {
            return;
        }
        let gs = self.stack.current();
        self.handler.on_path(PathEvent {
            path,
            paint_op,
            fill_rule,
            line_width: gs.line_width,
            stroke_color: gs.stroke_color,
            fill_color: gs.fill_color,
        });
    }

    // --- Color spaces ---

    fn lookup_color_space(&mut self, name: &str, scope: &Scope<'_>) -> ColorSpace {
        match scope.color_space(name) {
            Some(cs) => cs,
            None => {
                debug!(color_space = name, "color space not found, using black");
                self.report_error(
                    &BackendError::ResourceNotFound {
                        kind: "color space",
                        name: name.to_string(),
                    },
                    Some(name),
                );
                ColorSpace::Unsupported(name.to_string())
            }
        }
    }

    // --- Warnings ---

    fn report_error(&mut self, err: &BackendError, resource: Option<&str>) {
        let mut warning = ExtractWarning::with_code(err.warning_code(), err.to_string());
        if let Some(name) = resource {
            warning = warning.for_resource(name);
        }
        self.report(warning);
    }

    fn report(&mut self, warning: ExtractWarning) {
        // strict mode needs the warning even when nothing is collected
        if !self.options.collect_warnings && !self.options.strict_mode {
            return;
        }
        let mut warning = warning.at_operator(self.operator_index);
        if let Some(page) = self.page_index {
            warning = warning.on_page(page);
        }
        self.handler.on_warning(warning);
    }
}

// --- Operand extraction helpers ---

fn get_f64(operands: &[Operand], index: usize) -> Option<f64> {
    operands.get(index).and_then(Operand::as_f64)
}

/// The first `N` operands as numbers, or `None` if any is missing or not
/// a number.
fn get_numbers<const N: usize>(operands: &[Operand]) -> Option<[f64; N]> {
    let mut out = [0.0; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = get_f64(operands, i)?;
    }
    Some(out)
}

fn get_matrix(operands: &[Operand]) -> Option<Ctm> {
    get_numbers::<6>(operands).map(Ctm::from_array)
}

/// Every numeric operand, in order; `scn` may end with a pattern name.
fn numbers(operands: &[Operand]) -> Vec<f64> {
    operands.iter().filter_map(Operand::as_f64).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pdfpage_core::{Color, FontFlags, ImageFilter, Rectangle};

    #[derive(Default)]
    struct Recorder {
        glyphs: Vec<GlyphEvent>,
        images: Vec<ImageEvent>,
        inline_images: Vec<InlineImageEvent>,
        paths: Vec<PathEvent>,
        warnings: Vec<ExtractWarning>,
    }

    impl ContentHandler for Recorder {
        fn on_glyph(&mut self, event: GlyphEvent) {
            self.glyphs.push(event);
        }
        fn on_image(&mut self, event: ImageEvent) {
            self.images.push(event);
        }
        fn on_inline_image(&mut self, event: InlineImageEvent) {
            self.inline_images.push(event);
        }
        fn on_path(&mut self, event: PathEvent) {
            self.paths.push(event);
        }
        fn on_warning(&mut self, warning: ExtractWarning) {
            self.warnings.push(warning);
        }
    }

    impl Recorder {
        fn text(&self) -> String {
            self.glyphs.iter().map(|g| g.text.as_str()).collect()
        }

        fn codes(&self) -> Vec<&ExtractWarningCode> {
            self.warnings.iter().map(|w| &w.code).collect()
        }
    }

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    /// F1 with H = 10 and i = 6 glyph units.
    fn hi_font() -> FontDescriptor {
        let mut widths = vec![500.0; 128 - 32];
        widths[usize::from(b'H' - 32)] = 10.0;
        widths[usize::from(b'i' - 32)] = 6.0;
        FontDescriptor::new("F1").with_widths(32, widths)
    }

    fn resources() -> ResourceTable {
        ResourceTable::new().with_font("F1", hi_font())
    }

    fn run_page(page: &PageModel) -> (Recorder, Result<(), BackendError>) {
        let mut rec = Recorder::default();
        let result = interpret_page(page, &mut rec, &ExtractOptions::default());
        (rec, result)
    }

    fn run(content: &str) -> Recorder {
        let page = PageModel::new(0, 612.0, 792.0, content.as_bytes()).with_resources(resources());
        let (rec, result) = run_page(&page);
        result.unwrap();
        rec
    }

    // --- text showing ---

    #[test]
    fn hi_example() {
        let rec = run("BT /F1 12 Tf 100 700 Td (Hi) Tj ET");
        assert_eq!(rec.text(), "Hi");
        assert_eq!(rec.glyphs.len(), 2);
        assert_eq!(rec.glyphs[0].style.font_name, "F1");
        assert_eq!(rec.glyphs[0].style.font_size, 12.0);
        assert_approx(rec.glyphs[0].rect.x1, 100.0);
        assert_approx(rec.glyphs[1].rect.x1, 100.12);
        assert_approx(rec.glyphs[0].advance, 0.12);
        assert_approx(rec.glyphs[1].advance, 0.072);
        assert!(rec.warnings.is_empty());
    }

    #[test]
    fn tj_array_and_quotes() {
        let rec = run("BT /F1 10 Tf 12 TL 0 100 Td [(H) -1000 (i)] TJ (H) ' 1 2 (i) \" ET");
        assert_eq!(rec.text(), "HiHi");
        assert_approx(rec.glyphs[1].rect.x1, 10.1);
        assert_approx(rec.glyphs[2].rect.y1, 88.0 - 2.5);
        assert_approx(rec.glyphs[3].rect.y1, 76.0 - 2.5);
    }

    #[test]
    fn text_outside_text_object_is_ignored() {
        let rec = run("/F1 12 Tf (Hi) Tj 100 700 Td");
        assert!(rec.glyphs.is_empty());
        assert!(rec.warnings.is_empty());
    }

    #[test]
    fn color_and_underline_reach_style() {
        let underlined = hi_font().with_flags(FontFlags {
            underline: true,
            ..FontFlags::default()
        });
        let page = PageModel::new(0, 612.0, 792.0, &b"1 0 0 rg 0 0 1 RG BT /U 10 Tf (H) Tj 1 Tr (i) Tj ET"[..])
            .with_resources(ResourceTable::new().with_font("U", underlined));
        let (rec, result) = run_page(&page);
        result.unwrap();
        assert!(rec.glyphs[0].style.is_underlined);
        assert_eq!(rec.glyphs[0].style.color, Color::new(1.0, 0.0, 0.0));
        // stroke-only rendering reports the stroke color
        assert_eq!(rec.glyphs[1].style.color, Color::new(0.0, 0.0, 1.0));
        assert_eq!(rec.glyphs[1].render_mode, TextRenderMode::Stroke);
    }

    #[test]
    fn missing_font_uses_fallback_and_warns() {
        let rec = run("BT /F9 12 Tf 5 5 Td (ab) Tj ET");
        assert_eq!(rec.text(), "ab");
        assert_eq!(rec.glyphs[0].style.font_name, "F9");
        // zero advance
        assert_approx(rec.glyphs[1].rect.x1, 5.0);
        assert_eq!(rec.codes(), vec![&ExtractWarningCode::ResourceNotFound]);
        assert_eq!(rec.warnings[0].resource.as_deref(), Some("F9"));
    }

    #[test]
    fn text_without_font_uses_fallback() {
        let rec = run("BT (x) Tj ET");
        assert_eq!(rec.text(), "x");
        assert_eq!(rec.codes(), vec![&ExtractWarningCode::ResourceNotFound]);
    }

    #[test]
    fn unmapped_codes_warn_once_per_font() {
        let mut font = hi_font();
        font.to_unicode.insert(u32::from(b'H'), "H".to_string());
        let page = PageModel::new(0, 612.0, 792.0, &b"BT /F1 10 Tf (Hi) Tj (ii) Tj ET"[..])
            .with_resources(ResourceTable::new().with_font("F1", font));
        let (rec, result) = run_page(&page);
        result.unwrap();
        assert_eq!(rec.text(), "Hiii");
        assert_eq!(rec.codes(), vec![&ExtractWarningCode::EncodingFallback]);
    }

    // --- graphics state ---

    #[test]
    fn save_restore_pairs_produce_nothing() {
        let rec = run("q Q q Q");
        assert!(rec.glyphs.is_empty());
        assert!(rec.images.is_empty());
        assert!(rec.warnings.is_empty());
    }

    #[test]
    fn text_matrix_is_restored_by_q() {
        let rec = run("BT /F1 10 Tf 100 100 Td q 50 50 Td Q (H) Tj ET");
        assert_approx(rec.glyphs[0].rect.x1, 100.0);
    }

    #[test]
    fn extra_restore_is_ignored_and_reported() {
        let rec = run("q 2 0 0 2 0 0 cm Q Q BT /F1 10 Tf (H) Tj ET");
        assert_eq!(rec.codes(), vec![&ExtractWarningCode::UnbalancedRestore]);
        assert_approx(rec.glyphs[0].rendering_matrix.a, 10.0);
    }

    #[test]
    fn cm_scales_glyphs() {
        let rec = run("2 0 0 2 10 20 cm BT /F1 10 Tf (H) Tj ET");
        let r = rec.glyphs[0].rect;
        assert_approx(r.x1, 10.0);
        assert_approx(r.x2, 10.0 + 0.2);
        assert_approx(r.y1, 20.0 - 5.0);
    }

    #[test]
    fn color_space_operators() {
        let mut rec = Recorder::default();
        let options = ExtractOptions::default();
        let table = ResourceTable::new().with_color_space(
            "CS0",
            ColorSpace::Indexed {
                base: Box::new(ColorSpace::DeviceRgb),
                hival: 1,
                lookup: vec![0, 0, 0, 0, 255, 0],
            },
        );
        let mut interp = ContentStreamInterpreter::new(&mut rec, &FontTableAdvances, &options);
        interp.interpret(b"/CS0 cs 1 sc /DeviceCMYK CS 0 0 0 1 SC", &table);
        assert_eq!(interp.state().fill_color, Color::new(0.0, 1.0, 0.0));
        assert_eq!(interp.state().stroke_color, Color::black());

        interp.interpret(b"/Pattern cs /P0 scn", &table);
        assert_eq!(interp.state().fill_color, Color::black());

        interp.interpret(b"/Nope cs", &table);
        assert!(matches!(
            interp.state().fill_color_space,
            ColorSpace::Unsupported(_)
        ));
        drop(interp);
        assert_eq!(rec.codes(), vec![&ExtractWarningCode::ResourceNotFound]);
    }

    // --- recovery ---

    #[test]
    fn unknown_operator_changes_nothing() {
        let plain = run("BT /F1 12 Tf 100 700 Td (Hi) Tj ET");
        let noisy = run("BT /F1 12 Tf 100 700 Td XY 1 2 3 (Hi) Tj ET");
        assert_eq!(plain.glyphs, noisy.glyphs);
        assert_eq!(noisy.codes(), vec![&ExtractWarningCode::UnknownOperator]);

        let postfix = run("BT /F1 12 Tf 100 700 Td 1 2 3 XY (Hi) Tj ET");
        assert_eq!(plain.glyphs, postfix.glyphs);
    }

    #[test]
    fn operator_takes_trailing_operands() {
        // 1 2 3 are left behind by XY; Td uses the last two
        let rec = run("BT /F1 10 Tf XY 1 2 3 40 50 Td (H) Tj ET");
        assert_approx(rec.glyphs[0].rect.x1, 40.0);
    }

    #[test]
    fn operands_of_unknown_operator_are_dropped() {
        // "1 2 3" belong to XY; Td must not see them
        let rec = run("BT /F1 10 Tf 1 2 XY Td (H) Tj ET");
        assert_approx(rec.glyphs[0].rect.x1, 0.0);
    }

    #[test]
    fn lexer_errors_are_recovered() {
        let rec = run("BT /F1 10 Tf <4G> Tj (H) Tj ET");
        assert_eq!(rec.text(), "H");
        assert_eq!(rec.codes(), vec![&ExtractWarningCode::MalformedStream]);
    }

    #[test]
    fn warnings_carry_page_and_operator_index() {
        let page = PageModel::new(3, 612.0, 792.0, &b"q XY Q"[..]);
        let (rec, result) = run_page(&page);
        result.unwrap();
        assert_eq!(rec.warnings[0].page, Some(3));
        assert_eq!(rec.warnings[0].operator_index, Some(1));
    }

    #[test]
    fn warnings_can_be_disabled() {
        let page = PageModel::new(0, 612.0, 792.0, &b"XY"[..]);
        let mut rec = Recorder::default();
        let options = ExtractOptions {
            collect_warnings: false,
            ..ExtractOptions::default()
        };
        interpret_page(&page, &mut rec, &options).unwrap();
        assert!(rec.warnings.is_empty());
    }

    // --- page-level failures ---

    #[test]
    fn empty_stream_is_unreadable() {
        let page = PageModel::new(0, 612.0, 792.0, Vec::new());
        let (_, result) = run_page(&page);
        assert!(matches!(result, Err(BackendError::UnreadableStream(_))));
    }

    #[test]
    fn whitespace_only_stream_is_empty_output() {
        let page = PageModel::new(0, 612.0, 792.0, &b"  \n% comment\n"[..]);
        let (rec, result) = run_page(&page);
        assert!(result.is_ok());
        assert!(rec.glyphs.is_empty());
    }

    #[test]
    fn garbage_stream_is_unreadable() {
        let page = PageModel::new(0, 612.0, 792.0, &b") ) }"[..]);
        let (_, result) = run_page(&page);
        assert!(matches!(result, Err(BackendError::UnreadableStream(_))));
    }

    #[test]
    fn oversized_stream_is_rejected() {
        let page = PageModel::new(0, 612.0, 792.0, &b"q Q q Q"[..]);
        let mut rec = Recorder::default();
        let options = ExtractOptions {
            max_stream_bytes: 4,
            ..ExtractOptions::default()
        };
        let err = interpret_page(&page, &mut rec, &options).unwrap_err();
        assert!(matches!(
            PdfError::from(err),
            PdfError::ResourceLimitExceeded { actual_value: 7, .. }
        ));
    }

    #[test]
    fn token_ceiling_stops_and_keeps_output() {
        let page = PageModel::new(0, 612.0, 792.0, &b"BT /F1 10 Tf (H) Tj (i) Tj ET"[..])
            .with_resources(resources());
        let mut rec = Recorder::default();
        let options = ExtractOptions {
            max_tokens: 6,
            ..ExtractOptions::default()
        };
        interpret_page(&page, &mut rec, &options).unwrap();
        assert_eq!(rec.text(), "H");
        assert_eq!(rec.codes(), vec![&ExtractWarningCode::ResourceLimitReached]);
    }

    // --- XObjects ---

    fn image(id: u32) -> ImageDescriptor {
        ImageDescriptor {
            id,
            width: 2,
            height: 1,
            bits_per_component: 8,
            color_space: ColorSpace::DeviceGray,
            filter: ImageFilter::Raw,
            data: vec![0, 255],
        }
    }

    #[test]
    fn image_area_is_unit_square_through_ctm() {
        let page = PageModel::new(0, 612.0, 792.0, &b"q 200 0 0 100 50 60 cm /Im0 Do Q"[..])
            .with_resources(ResourceTable::new().with_image("Im0", image(7)));
        let (rec, result) = run_page(&page);
        result.unwrap();
        assert_eq!(rec.images.len(), 1);
        assert_eq!(rec.images[0].id, 7);
        assert_eq!(rec.images[0].area, Rectangle::new(50.0, 60.0, 250.0, 160.0));
    }

    #[test]
    fn missing_xobject_is_skipped() {
        let rec = run("/Im9 Do q Q");
        assert!(rec.images.is_empty());
        assert_eq!(rec.codes(), vec![&ExtractWarningCode::ResourceNotFound]);
    }

    #[test]
    fn form_applies_matrix_and_own_resources() {
        let mut form = FormXObject::new(&b"/Im0 Do BT /F1 10 Tf (H) Tj ET"[..]);
        form.matrix = Ctm::new(1.0, 0.0, 0.0, 1.0, 100.0, 0.0);
        form.resources = Some(Arc::new(ResourceTable::new().with_image("Im0", image(2))));
        let page = PageModel::new(0, 612.0, 792.0, &b"/Fm0 Do /Im0 Do"[..]).with_resources(
            resources()
                .with_form("Fm0", form)
                .with_image("Im0", image(1)),
        );
        let (rec, result) = run_page(&page);
        result.unwrap();

        // the form's own Im0 shadows the page's; F1 comes from the page
        assert_eq!(rec.images[0].id, 2);
        assert_approx(rec.images[0].area.x1, 100.0);
        assert_approx(rec.glyphs[0].rect.x1, 100.0);
        // state restored after the form
        assert_eq!(rec.images[1].id, 1);
        assert_approx(rec.images[1].area.x1, 0.0);
        assert!(rec.warnings.is_empty());
    }

    #[test]
    fn unbalanced_q_in_form_cannot_pop_callers_state() {
        let form = FormXObject::new(&b"Q Q 5 0 0 5 0 0 cm"[..]);
        let page = PageModel::new(0, 612.0, 792.0, &b"q 2 0 0 2 0 0 cm /Fm0 Do /Im0 Do Q"[..])
            .with_resources(
                ResourceTable::new()
                    .with_form("Fm0", form)
                    .with_image("Im0", image(1)),
            );
        let (rec, result) = run_page(&page);
        result.unwrap();
        assert_eq!(rec.images[0].area, Rectangle::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(
            rec.codes(),
            vec![
                &ExtractWarningCode::UnbalancedRestore,
                &ExtractWarningCode::UnbalancedRestore
            ]
        );
    }

    #[test]
    fn self_invoking_form_terminates() {
        let form = FormXObject::new(&b"/Fm0 Do"[..]);
        let page = PageModel::new(0, 612.0, 792.0, &b"/Fm0 Do"[..])
            .with_resources(ResourceTable::new().with_form("Fm0", form));
        let (rec, result) = run_page(&page);
        result.unwrap();
        assert_eq!(
            rec.codes(),
            vec![&ExtractWarningCode::RecursionLimitExceeded]
        );
    }

    #[test]
    fn recursion_limit_is_configurable() {
        let inner = FormXObject::new(&b"/Im0 Do"[..]);
        let mut outer = FormXObject::new(&b"/Fm1 Do"[..]);
        outer.resources = Some(Arc::new(ResourceTable::new().with_form("Fm1", inner)));
        let page = PageModel::new(0, 612.0, 792.0, &b"/Fm0 Do"[..]).with_resources(
            ResourceTable::new()
                .with_form("Fm0", outer)
                .with_image("Im0", image(1)),
        );
        let mut rec = Recorder::default();
        let options = ExtractOptions {
            max_recursion_depth: 1,
            ..ExtractOptions::default()
        };
        interpret_page(&page, &mut rec, &options).unwrap();
        assert!(rec.images.is_empty());
        assert_eq!(rec.codes(), vec![&ExtractWarningCode::RecursionLimitExceeded]);
    }

    // --- paths and inline images ---

    #[test]
    fn painted_paths_are_emitted() {
        let rec = run("0 1 0 RG 3 w 10 10 m 20 10 l S 0 0 5 5 re f* 1 1 m 2 2 l n");
        assert_eq!(rec.paths.len(), 2);
        assert_eq!(rec.paths[0].paint_op, PaintOp::Stroke);
        assert_eq!(rec.paths[0].line_width, 3.0);
        assert_eq!(rec.paths[0].stroke_color, Color::new(0.0, 1.0, 0.0));
        assert_eq!(rec.paths[1].fill_rule, Some(FillRule::EvenOdd));
        assert_eq!(
            rec.paths[1].path.bounds(),
            Some(Rectangle::new(0.0, 0.0, 5.0, 5.0))
        );
    }

    #[test]
    fn inline_image_is_reported_separately() {
        let page = PageModel::new(
            0,
            612.0,
            792.0,
            &b"q 10 0 0 20 0 0 cm BI /W 2 /H 1 /BPC 8 /CS /G ID \x00\xff EI Q"[..],
        );
        let (rec, result) = run_page(&page);
        result.unwrap();
        assert_eq!(rec.inline_images.len(), 1);
        assert_eq!(rec.inline_images[0].width, 2);
        assert_eq!(rec.inline_images[0].data, vec![0x00, 0xff]);
        assert_eq!(rec.inline_images[0].area, Rectangle::new(0.0, 0.0, 10.0, 20.0));
        assert!(rec.images.is_empty());
    }
}
