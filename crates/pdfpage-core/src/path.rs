//! Path construction for the `m l c v y h re` operators.
//!
//! Points are transformed through the CTM active when each segment is
//! appended, so a finished [`Path`] is already in page space.

use crate::geometry::{Ctm, Point, Rectangle};

/// A segment of a PDF path, in page space.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PathSegment {
    MoveTo(Point),
    LineTo(Point),
    /// Cubic Bezier curve.
    CurveTo { cp1: Point, cp2: Point, end: Point },
    ClosePath,
}

/// A complete path.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Path {
    pub segments: Vec<PathSegment>,
}

impl Path {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Bounding box of all segment points, control points included.
    pub fn bounds(&self) -> Option<Rectangle> {
        let points: Vec<Point> = self
            .segments
            .iter()
            .flat_map(|seg| match seg {
                PathSegment::MoveTo(p) | PathSegment::LineTo(p) => vec![*p],
                PathSegment::CurveTo { cp1, cp2, end } => vec![*cp1, *cp2, *end],
                PathSegment::ClosePath => Vec::new(),
            })
            .collect();
        if points.is_empty() {
            None
        } else {
            Some(Rectangle::enclosing(&points))
        }
    }
}

/// Accumulates path segments between construction and painting operators.
#[derive(Debug, Clone, Default)]
pub struct PathBuilder {
    segments: Vec<PathSegment>,
    current: Option<Point>,
    subpath_start: Option<Point>,
}

impl PathBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Current point, already in page space.
    pub fn current_point(&self) -> Option<Point> {
        self.current
    }

    /// `m`
    pub fn move_to(&mut self, ctm: &Ctm, x: f64, y: f64) {
        let p = ctm.transform_point(Point::new(x, y));
        self.segments.push(PathSegment::MoveTo(p));
        self.current = Some(p);
        self.subpath_start = Some(p);
    }

    /// `l`; ignored without a current point.
    pub fn line_to(&mut self, ctm: &Ctm, x: f64, y: f64) {
        if self.current.is_none() {
            return;
        }
        let p = ctm.transform_point(Point::new(x, y));
        self.segments.push(PathSegment::LineTo(p));
        self.current = Some(p);
    }

    /// `c`
    #[allow(clippy::too_many_arguments)]
    pub fn curve_to(&mut self, ctm: &Ctm, x1: f64, y1: f64, x2: f64, y2: f64, x3: f64, y3: f64) {
        if self.current.is_none() {
            return;
        }
        let cp1 = ctm.transform_point(Point::new(x1, y1));
        self.push_curve(ctm, cp1, x2, y2, x3, y3);
    }

    /// `v`: the first control point is the current point.
    pub fn curve_to_v(&mut self, ctm: &Ctm, x2: f64, y2: f64, x3: f64, y3: f64) {
        let Some(cp1) = self.current else {
            return;
        };
        self.push_curve(ctm, cp1, x2, y2, x3, y3);
    }

    /// `y`: the second control point is the end point.
    pub fn curve_to_y(&mut self, ctm: &Ctm, x1: f64, y1: f64, x3: f64, y3: f64) {
        if self.current.is_none() {
            return;
        }
        let cp1 = ctm.transform_point(Point::new(x1, y1));
        self.push_curve(ctm, cp1, x3, y3, x3, y3);
    }

    fn push_curve(&mut self, ctm: &Ctm, cp1: Point, x2: f64, y2: f64, x3: f64, y3: f64) {
        let cp2 = ctm.transform_point(Point::new(x2, y2));
        let end = ctm.transform_point(Point::new(x3, y3));
        self.segments.push(PathSegment::CurveTo { cp1, cp2, end });
        self.current = Some(end);
    }

    /// `h`
    pub fn close_path(&mut self) {
        if self.current.is_none() {
            return;
        }
        self.segments.push(PathSegment::ClosePath);
        self.current = self.subpath_start;
    }

    /// `re`: moveto, three linetos and a closepath.
    pub fn rectangle(&mut self, ctm: &Ctm, x: f64, y: f64, width: f64, height: f64) {
        self.move_to(ctm, x, y);
        self.line_to(ctm, x + width, y);
        self.line_to(ctm, x + width, y + height);
        self.line_to(ctm, x, y + height);
        self.close_path();
    }

    /// Take the accumulated path and reset the builder, as every painting
    /// operator (including `n`) does.
    pub fn take(&mut self) -> Path {
        self.current = None;
        self.subpath_start = None;
        Path {
            segments: std::mem::take(&mut self.segments),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_point_approx(p: Point, x: f64, y: f64) {
        assert!((p.x - x).abs() < 1e-10, "x: expected {x}, got {}", p.x);
        assert!((p.y - y).abs() < 1e-10, "y: expected {y}, got {}", p.y);
    }

    #[test]
    fn new_builder_is_empty() {
        let builder = PathBuilder::new();
        assert!(builder.is_empty());
        assert!(builder.current_point().is_none());
    }

    #[test]
    fn move_and_line_are_transformed() {
        let ctm = Ctm::new(2.0, 0.0, 0.0, 2.0, 10.0, 10.0);
        let mut builder = PathBuilder::new();
        builder.move_to(&ctm, 1.0, 1.0);
        builder.line_to(&ctm, 5.0, 1.0);
        let path = builder.take();
        assert_eq!(path.segments.len(), 2);
        assert_eq!(path.segments[0], PathSegment::MoveTo(Point::new(12.0, 12.0)));
        assert_eq!(path.segments[1], PathSegment::LineTo(Point::new(20.0, 12.0)));
    }

    #[test]
    fn line_without_current_point_is_ignored() {
        let mut builder = PathBuilder::new();
        builder.line_to(&Ctm::identity(), 5.0, 5.0);
        builder.close_path();
        assert!(builder.is_empty());
    }

    #[test]
    fn close_returns_to_subpath_start() {
        let ctm = Ctm::identity();
        let mut builder = PathBuilder::new();
        builder.move_to(&ctm, 10.0, 20.0);
        builder.line_to(&ctm, 30.0, 40.0);
        builder.close_path();
        assert_point_approx(builder.current_point().unwrap(), 10.0, 20.0);
    }

    #[test]
    fn v_and_y_curves_reuse_points() {
        let ctm = Ctm::identity();
        let mut builder = PathBuilder::new();
        builder.move_to(&ctm, 0.0, 0.0);
        builder.curve_to_v(&ctm, 5.0, 10.0, 10.0, 0.0);
        builder.curve_to_y(&ctm, 15.0, 5.0, 20.0, 0.0);
        let path = builder.take();
        assert_eq!(
            path.segments[1],
            PathSegment::CurveTo {
                cp1: Point::new(0.0, 0.0),
                cp2: Point::new(5.0, 10.0),
                end: Point::new(10.0, 0.0),
            }
        );
        assert_eq!(
            path.segments[2],
            PathSegment::CurveTo {
                cp1: Point::new(15.0, 5.0),
                cp2: Point::new(20.0, 0.0),
                end: Point::new(20.0, 0.0),
            }
        );
    }

    #[test]
    fn rectangle_produces_closed_subpath_and_bounds() {
        let mut builder = PathBuilder::new();
        builder.rectangle(&Ctm::identity(), 10.0, 20.0, 100.0, 50.0);
        let path = builder.take();
        assert_eq!(path.segments.len(), 5);
        assert_eq!(path.segments[4], PathSegment::ClosePath);
        assert_eq!(path.bounds(), Some(Rectangle::new(10.0, 20.0, 110.0, 70.0)));
    }

    #[test]
    fn take_resets_builder() {
        let mut builder = PathBuilder::new();
        builder.move_to(&Ctm::identity(), 1.0, 1.0);
        let _ = builder.take();
        assert!(builder.is_empty());
        assert!(builder.current_point().is_none());
        assert!(builder.take().bounds().is_none());
    }
}
