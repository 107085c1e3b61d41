//! Line-segment geometry and the plain-text drawing format
//!
//! A drawing file holds one segment per line: four whitespace-separated
//! floats `x0 y0 x1 y1`. Coordinates may be pre-scaled on load so a drawing
//! authored at display resolution can be rendered supersampled.

use anyhow::{bail, ensure, Context, Result};
use std::fs;
use std::path::Path;

/// Built-in sample drawing (closed leaf outline, 900x600 display space)
pub const LEAF: &str = include_str!("../assets/leaf-fill.txt");

/// A point in 2D space
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    pub x: f64,
    pub y: f64,
}

impl Point2 {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Nearest integer pixel (halves round away from zero)
    #[inline]
    pub fn round(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    #[inline]
    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.x * factor, self.y * factor)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Straight segment between two points
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSegment {
    pub a: Point2,
    pub b: Point2,
}

impl LineSegment {
    pub const fn new(a: Point2, b: Point2) -> Self {
        Self { a, b }
    }

    pub fn from_coords(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Self::new(Point2::new(x0, y0), Point2::new(x1, y1))
    }

    /// Endpoints rounded to pixels: `((x0, y0), (x1, y1))`
    pub fn rounded(&self) -> ((i32, i32), (i32, i32)) {
        (self.a.round(), self.b.round())
    }

    /// Both endpoints are finite (no NaN or infinity)
    pub fn is_finite(&self) -> bool {
        self.a.is_finite() && self.b.is_finite()
    }

    pub fn scaled(&self, factor: f64) -> Self {
        Self::new(self.a.scaled(factor), self.b.scaled(factor))
    }
}

/// Ordered collection of segments, possibly several closed contours
#[derive(Debug, Clone, Default)]
pub struct Drawing {
    lines: Vec<LineSegment>,
}

impl Drawing {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn add_line(&mut self, line: LineSegment) {
        self.lines.push(line);
    }

    pub fn lines(&self) -> &[LineSegment] {
        &self.lines
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Bounding box (min_x, min_y, max_x, max_y), or None when empty
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.lines.first()?;
        let init = (first.a.x, first.a.y, first.a.x, first.a.y);
        Some(
            self.lines
                .iter()
                .flat_map(|l| [l.a, l.b])
                .fold(init, |(x0, y0, x1, y1), p| {
                    (x0.min(p.x), y0.min(p.y), x1.max(p.x), y1.max(p.y))
                }),
        )
    }

    /// Parse the `x0 y0 x1 y1` text format, multiplying every coordinate by
    /// `scale`. Blank lines are skipped.
    pub fn parse(text: &str, scale: f64) -> Result<Self> {
        let mut dwg = Self::new();
        for (n, line) in text.lines().enumerate() {
            let line_no = n + 1;
            if line.trim().is_empty() {
                continue;
            }
            let fields = line
                .split_whitespace()
                .map(|w| -> Result<f64> {
                    let v = w
                        .parse::<f64>()
                        .with_context(|| format!("line {}: invalid number {:?}", line_no, w))?;
                    ensure!(v.is_finite(), "line {}: non-finite coordinate {:?}", line_no, w);
                    Ok(v)
                })
                .collect::<Result<Vec<_>>>()?;
            let &[x0, y0, x1, y1] = fields.as_slice() else {
                bail!("line {}: expected 4 coordinates, found {}", line_no, fields.len());
            };
            let seg = LineSegment::from_coords(x0, y0, x1, y1).scaled(scale);
            ensure!(seg.is_finite(), "line {}: coordinates overflow at scale {}", line_no, scale);
            dwg.add_line(seg);
        }
        Ok(dwg)
    }

    /// Load and parse a drawing file
    pub fn load(path: impl AsRef<Path>, scale: f64) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read drawing {}", path.display()))?;
        Self::parse(&text, scale).with_context(|| format!("failed to parse drawing {}", path.display()))
    }

    /// The built-in leaf drawing
    pub fn leaf(scale: f64) -> Result<Self> {
        Self::parse(LEAF, scale).context("built-in leaf drawing")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scales_coordinates() {
        let dwg = Drawing::parse("1 2 3 4\n\n0.5 0.5 1.5 2\n", 10.0).unwrap();
        assert_eq!(dwg.len(), 2);
        assert_eq!(dwg.lines()[0], LineSegment::from_coords(10.0, 20.0, 30.0, 40.0));
        assert_eq!(dwg.lines()[1].rounded(), ((5, 5), (15, 20)));
    }

    #[test]
    fn test_parse_reports_line_number() {
        let err = Drawing::parse("1 2 3 4\n1 2 3\n", 1.0).unwrap_err();
        assert!(err.to_string().contains("line 2"), "{}", err);

        let err = Drawing::parse("1 2 x 4\n", 1.0).unwrap_err();
        assert!(format!("{:#}", err).contains("invalid number"), "{:#}", err);
    }

    #[test]
    fn test_parse_rejects_non_finite() {
        let text = "nan 40 120 40\n120 40 120 80\n120 80 40 80\n40 80 40 40\n";
        let err = Drawing::parse(text, 1.0).unwrap_err();
        assert!(err.to_string().contains("line 1: non-finite"), "{}", err);

        for word in ["inf", "-inf", "NaN", "infinity"] {
            let text = format!("1 2 3 4\n1 {} 3 4\n", word);
            let err = Drawing::parse(&text, 1.0).unwrap_err();
            assert!(err.to_string().contains("line 2"), "{}: {}", word, err);
        }

        // Finite on disk, infinite once scaled
        assert!(Drawing::parse("1e308 0 0 1\n", 16.0).is_err());
        assert!(LineSegment::from_coords(0.0, 1.0, 2.0, 3.0).is_finite());
    }

    #[test]
    fn test_point_round_half_away_from_zero() {
        assert_eq!(Point2::new(2.5, -2.5).round(), (3, -3));
        assert_eq!(Point2::new(2.49, 7.51).round(), (2, 8));
    }

    #[test]
    fn test_bounds() {
        let mut dwg = Drawing::new();
        assert!(dwg.bounds().is_none());
        dwg.add_line(LineSegment::from_coords(3.0, 9.0, -1.0, 4.0));
        dwg.add_line(LineSegment::from_coords(5.0, 2.0, 0.0, 0.0));
        assert_eq!(dwg.bounds(), Some((-1.0, 0.0, 5.0, 9.0)));
    }

    #[test]
    fn test_leaf_is_closed() {
        // Every endpoint of a closed contour is shared by exactly two segments
        let dwg = Drawing::leaf(1.0).unwrap();
        assert!(dwg.len() >= 8);
        for line in dwg.lines() {
            for p in [line.a, line.b] {
                let uses = dwg.lines().iter().filter(|l| l.a == p || l.b == p).count();
                assert_eq!(uses, 2, "open vertex at {:?}", p);
            }
        }
    }
}
