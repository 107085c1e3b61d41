//! Thick strokes as filled outlines
//!
//! A segment of width `w` becomes an 8-vertex outline: the two long edges
//! offset by w/2 on either side, closed at each end by a chamfered cap that
//! reaches cos 30° x w/2 past the endpoint.

use super::{GrayBmp, PolyFill};

/// cos 30°: how far a cap reaches past its endpoint, relative to half width
const CAP_REACH: f64 = 0.86602;

/// One stroke segment with a pixel width
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThickLine {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
    pub width: u32,
}

impl ThickLine {
    pub fn new(x0: i32, y0: i32, x1: i32, y1: i32, width: u32) -> Self {
        Self {
            x0,
            y0,
            x1,
            y1,
            width,
        }
    }

    /// Outline vertices in ring order, or None for a zero-length or
    /// zero-width stroke
    pub fn outline(&self) -> Option<[(i32, i32); 8]> {
        if self.width == 0 || (self.x0, self.y0) == (self.x1, self.y1) {
            return None;
        }
        // Orient left to right so the same stroke always rounds the same way
        let (x0, y0, x1, y1) = if self.x0 > self.x1 {
            (self.x1, self.y1, self.x0, self.y0)
        } else {
            (self.x0, self.y0, self.x1, self.y1)
        };
        let (x0, y0, x1, y1) = (x0 as f64, y0 as f64, x1 as f64, y1 as f64);
        let (dx, dy) = (x1 - x0, y1 - y0);
        let length = (dx * dx + dy * dy).sqrt();

        // Perpendicular offset scaled to w/2, and half of it for the caps
        let inv = self.width as f64 / (2.0 * length);
        let (px, py) = (dy * inv, dx * inv);
        let (hpx, hpy) = (px * 0.5, py * 0.5);
        // Cap tips sit CAP_REACH * w/2 beyond each endpoint
        let (ex, ey) = (dx * CAP_REACH * inv, dy * CAP_REACH * inv);

        let pt = |x: f64, y: f64| ((x + 0.5).floor() as i32, (y + 0.5).floor() as i32);
        let (bx, by) = (x0 - ex, y0 - ey);
        let (fx, fy) = (x1 + ex, y1 + ey);

        Some([
            pt(x0 - px, y0 + py),
            pt(x1 - px, y1 + py),
            pt(fx - hpx, fy + hpy),
            pt(fx + hpx, fy - hpy),
            pt(x1 + px, y1 - py),
            pt(x0 + px, y0 - py),
            pt(bx + hpx, by - hpy),
            pt(bx - hpx, by + hpy),
        ])
    }

    /// Append the outline's 8 edges to `pf`
    pub fn add_to(&self, pf: &mut PolyFill) {
        let Some(ring) = self.outline() else {
            return;
        };
        for (i, &(x0, y0)) in ring.iter().enumerate() {
            let (x1, y1) = ring[(i + 1) % ring.len()];
            pf.add_line(x0, y0, x1, y1);
        }
    }
}

impl GrayBmp {
    /// Draw a segment `width` pixels wide, centred on the line
    ///
    /// # Panics
    /// Panics if any part of the outline falls outside the bitmap.
    #[track_caller]
    pub fn draw_thick_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, width: u32, gray: u8) {
        let mut pf = PolyFill::with_capacity(8);
        ThickLine::new(x0, y0, x1, y1, width).add_to(&mut pf);
        pf.fill(self, gray);
    }
}
