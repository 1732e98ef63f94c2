//! Graphics state and its save/restore stack.
//!
//! Implements the PDF graphics state model: a stack of states managed by
//! `q` (save) and `Q` (restore), CTM management via `cm`, and color
//! setting via G/g, RG/rg, K/k, CS/cs and SC/SCN/sc/scn.

use pdfpage_core::{Color, ColorSpace, Ctm};

use crate::text_state::TextState;

/// A complete graphics state snapshot.
///
/// Cloning is cheap: the font is shared through an `Arc`, everything else
/// is plain values.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphicsState {
    /// Current transformation matrix.
    pub ctm: Ctm,
    /// Text parameters and text matrices.
    pub text: TextState,
    pub fill_color: Color,
    pub stroke_color: Color,
    pub fill_color_space: ColorSpace,
    pub stroke_color_space: ColorSpace,
    pub line_width: f64,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            ctm: Ctm::identity(),
            text: TextState::new(),
            fill_color: Color::black(),
            stroke_color: Color::black(),
            fill_color_space: ColorSpace::DeviceGray,
            stroke_color_space: ColorSpace::DeviceGray,
            line_width: 1.0,
        }
    }
}

impl GraphicsState {
    // --- cm operator ---

    /// `cm`: `CTM' = M × CTM`.
    pub fn concat_matrix(&mut self, m: &Ctm) {
        self.ctm = m.concat(&self.ctm);
    }

    // --- Color operators ---

    /// `G`
    pub fn set_stroke_gray(&mut self, gray: f64) {
        self.stroke_color_space = ColorSpace::DeviceGray;
        self.stroke_color = Color::from_gray(gray);
    }

    /// `g`
    pub fn set_fill_gray(&mut self, gray: f64) {
        self.fill_color_space = ColorSpace::DeviceGray;
        self.fill_color = Color::from_gray(gray);
    }

    /// `RG`
    pub fn set_stroke_rgb(&mut self, r: f64, g: f64, b: f64) {
        self.stroke_color_space = ColorSpace::DeviceRgb;
        self.stroke_color = Color::new(r, g, b);
    }

    /// `rg`
    pub fn set_fill_rgb(&mut self, r: f64, g: f64, b: f64) {
        self.fill_color_space = ColorSpace::DeviceRgb;
        self.fill_color = Color::new(r, g, b);
    }

    /// `K`
    pub fn set_stroke_cmyk(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.stroke_color_space = ColorSpace::DeviceCmyk;
        self.stroke_color = Color::from_cmyk(c, m, y, k);
    }

    /// `k`
    pub fn set_fill_cmyk(&mut self, c: f64, m: f64, y: f64, k: f64) {
        self.fill_color_space = ColorSpace::DeviceCmyk;
        self.fill_color = Color::from_cmyk(c, m, y, k);
    }

    /// `CS`: select the stroke color space and its initial color.
    pub fn set_stroke_color_space(&mut self, cs: ColorSpace) {
        self.stroke_color = cs.initial_color();
        self.stroke_color_space = cs;
    }

    /// `cs`: select the fill color space and its initial color.
    pub fn set_fill_color_space(&mut self, cs: ColorSpace) {
        self.fill_color = cs.initial_color();
        self.fill_color_space = cs;
    }

    /// `SC`/`SCN`. Returns `false` when the components could not be
    /// resolved, in which case the color falls back to black.
    pub fn set_stroke_color(&mut self, components: &[f64]) -> bool {
        let resolved = self.stroke_color_space.resolve(components);
        self.stroke_color = resolved.unwrap_or_default();
        resolved.is_some()
    }

    /// `sc`/`scn`. Returns `false` when the components could not be
    /// resolved, in which case the color falls back to black.
    pub fn set_fill_color(&mut self, components: &[f64]) -> bool {
        let resolved = self.fill_color_space.resolve(components);
        self.fill_color = resolved.unwrap_or_default();
        resolved.is_some()
    }
}

/// Array-backed graphics state stack.
///
/// The stack never drops below its floor: the depth at the start of the
/// current content stream. A `Q` at the floor is ignored.
#[derive(Debug, Clone, Default)]
pub struct GraphicsStateStack {
    current: GraphicsState,
    saved: Vec<GraphicsState>,
    floor: usize,
}

impl GraphicsStateStack {
    pub fn new(initial: GraphicsState) -> Self {
        Self {
            current: initial,
            saved: Vec::new(),
            floor: 0,
        }
    }

    pub fn current(&self) -> &GraphicsState {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut GraphicsState {
        &mut self.current
    }

    // --- q/Q operators ---

    /// `q`: push a copy of the current state.
    pub fn save(&mut self) {
        self.saved.push(self.current.clone());
    }

    /// `Q`: pop the most recently saved state.
    ///
    /// Returns `false`, leaving the state untouched, at the floor.
    pub fn restore(&mut self) -> bool {
        if self.saved.len() <= self.floor {
            return false;
        }
        match self.saved.pop() {
            Some(state) => {
                self.current = state;
                true
            }
            None => false,
        }
    }

    // --- nested content streams ---

    /// Save the state and raise the floor for a nested content stream.
    ///
    /// Returns the previous floor, to be passed to [`end_scope`](Self::end_scope).
    pub fn begin_scope(&mut self) -> usize {
        self.save();
        std::mem::replace(&mut self.floor, self.saved.len())
    }

    /// Discard states the nested stream left saved, lower the floor and
    /// restore the state saved by [`begin_scope`](Self::begin_scope).
    pub fn end_scope(&mut self, previous_floor: usize) {
        self.saved.truncate(self.floor);
        self.floor = previous_floor;
        self.restore();
    }
}
