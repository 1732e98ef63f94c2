//! Colors, color spaces and fill rules.
//!
//! Colors are always normalized to RGB: gray and CMYK operands are converted
//! when they are set, and color spaces the engine does not model resolve to
//! black.

/// RGB color with components in `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    /// Create a new RGB color. Components are clamped to `[0.0, 1.0]`.
    pub fn new(r: f64, g: f64, b: f64) -> Self {
        Self {
            r: clamp_unit(r),
            g: clamp_unit(g),
            b: clamp_unit(b),
        }
    }

    /// Black color (0, 0, 0).
    pub fn black() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
        }
    }

    /// DeviceGray level to RGB.
    pub fn from_gray(gray: f64) -> Self {
        Self::new(gray, gray, gray)
    }

    /// Naive DeviceCMYK to RGB conversion (no ICC profile).
    pub fn from_cmyk(c: f64, m: f64, y: f64, k: f64) -> Self {
        let k = clamp_unit(k);
        Self::new(
            (1.0 - clamp_unit(c)) * (1.0 - k),
            (1.0 - clamp_unit(m)) * (1.0 - k),
            (1.0 - clamp_unit(y)) * (1.0 - k),
        )
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::black()
    }
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) }
}

/// Fill rule for path painting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FillRule {
    /// Nonzero winding number rule (default).
    #[default]
    NonZeroWinding,
    /// Even-odd rule.
    EvenOdd,
}

/// A color space as far as color resolution is concerned.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ColorSpace {
    /// DeviceGray, CalGray, or an ICC profile with one component.
    #[default]
    DeviceGray,
    /// DeviceRGB, CalRGB, or an ICC profile with three components.
    DeviceRgb,
    /// DeviceCMYK or an ICC profile with four components.
    DeviceCmyk,
    /// Indexed color space: `hival + 1` entries of `base` components each.
    Indexed {
        base: Box<ColorSpace>,
        hival: u8,
        lookup: Vec<u8>,
    },
    /// Pattern, Separation, DeviceN, Lab and anything else; resolves to black.
    Unsupported(String),
}

impl ColorSpace {
    /// Number of color components an `sc`/`scn` operator supplies.
    pub fn components(&self) -> usize {
        match self {
            ColorSpace::DeviceGray => 1,
            ColorSpace::DeviceRgb => 3,
            ColorSpace::DeviceCmyk => 4,
            ColorSpace::Indexed { .. } => 1,
            ColorSpace::Unsupported(_) => 0,
        }
    }

    /// The initial color selected by `cs`/`CS` for this space.
    pub fn initial_color(&self) -> Color {
        match self {
            ColorSpace::Indexed { .. } => self.resolve(&[0.0]).unwrap_or_default(),
            _ => Color::black(),
        }
    }

    /// Resolve operand components to an RGB color.
    ///
    /// Returns `None` when the space is unsupported or too few components
    /// were supplied.
    pub fn resolve(&self, components: &[f64]) -> Option<Color> {
        match self {
            ColorSpace::DeviceGray => components.first().map(|&g| Color::from_gray(g)),
            ColorSpace::DeviceRgb => match components {
                [r, g, b, ..] => Some(Color::new(*r, *g, *b)),
                _ => None,
            },
            ColorSpace::DeviceCmyk => match components {
                [c, m, y, k, ..] => Some(Color::from_cmyk(*c, *m, *y, *k)),
                _ => None,
            },
            ColorSpace::Indexed {
                base,
                hival,
                lookup,
            } => {
                let index = components.first()?.round().clamp(0.0, f64::from(*hival)) as usize;
                let n = base.components();
                let entry = lookup.get(index * n..index * n + n)?;
                let comps: Vec<f64> = entry.iter().map(|&b| f64::from(b) / 255.0).collect();
                base.resolve(&comps)
            }
            ColorSpace::Unsupported(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_approx(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {expected}, got {actual}"
        );
    }

    // --- Color ---

    #[test]
    fn default_color_is_black() {
        assert_eq!(Color::default(), Color::black());
    }

    #[test]
    fn gray_to_rgb() {
        assert_eq!(Color::from_gray(0.5), Color::new(0.5, 0.5, 0.5));
    }

    #[test]
    fn cmyk_to_rgb() {
        let c = Color::from_cmyk(1.0, 0.0, 0.0, 0.0);
        assert_approx(c.r, 0.0);
        assert_approx(c.g, 1.0);
        assert_approx(c.b, 1.0);

        let black = Color::from_cmyk(0.0, 0.0, 0.0, 1.0);
        assert_eq!(black, Color::black());
    }

    #[test]
    fn components_are_clamped() {
        let c = Color::new(1.5, -0.2, f64::NAN);
        assert_eq!(c, Color::new(1.0, 0.0, 0.0));
    }

    // --- ColorSpace ---

    #[test]
    fn device_spaces_resolve() {
        assert_eq!(
            ColorSpace::DeviceRgb.resolve(&[1.0, 0.0, 0.0]),
            Some(Color::new(1.0, 0.0, 0.0))
        );
        assert_eq!(
            ColorSpace::DeviceGray.resolve(&[0.25]),
            Some(Color::from_gray(0.25))
        );
        assert_eq!(
            ColorSpace::DeviceCmyk.resolve(&[0.0, 0.0, 0.0, 1.0]),
            Some(Color::black())
        );
    }

    #[test]
    fn too_few_components_do_not_resolve() {
        assert_eq!(ColorSpace::DeviceRgb.resolve(&[1.0]), None);
        assert_eq!(ColorSpace::DeviceGray.resolve(&[]), None);
    }

    #[test]
    fn unsupported_space_does_not_resolve() {
        let cs = ColorSpace::Unsupported("Pattern".to_string());
        assert_eq!(cs.resolve(&[0.3]), None);
        assert_eq!(cs.components(), 0);
        assert_eq!(cs.initial_color(), Color::black());
    }

    #[test]
    fn indexed_space_looks_up_palette() {
        let cs = ColorSpace::Indexed {
            base: Box::new(ColorSpace::DeviceRgb),
            hival: 1,
            lookup: vec![255, 0, 0, 0, 0, 255],
        };
        assert_eq!(cs.resolve(&[1.0]), Some(Color::new(0.0, 0.0, 1.0)));
        assert_eq!(cs.initial_color(), Color::new(1.0, 0.0, 0.0));
        // out of range index is clamped to hival
        assert_eq!(cs.resolve(&[7.0]), Some(Color::new(0.0, 0.0, 1.0)));
    }
}
