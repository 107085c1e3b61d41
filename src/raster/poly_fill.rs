//! Scanline polygon fill with the parity (even-odd) rule
//!
//! Segments are accumulated into a [`PolyFill`] builder; a fill pass then
//! intersects every row's centre line (y + 0.5) with every segment, sorts the
//! crossings and paints alternate spans. Rows are independent, which is what
//! lets [`PolyFill::fill_parallel`] hand them out to worker threads.

use std::num::NonZeroUsize;
use std::ops::Range;
use std::sync::{Mutex, PoisonError};
use std::thread;

use tracing::debug;

use super::GrayBmp;
use crate::geometry::{Drawing, LineSegment, Point2};

/// Accumulated segments for one fill pass
#[derive(Debug, Clone, Default)]
pub struct PolyFill {
    lines: Vec<LineSegment>,
}

impl PolyFill {
    pub fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            lines: Vec::with_capacity(capacity),
        }
    }

    /// Forget all segments, keeping the allocation
    pub fn reset(&mut self) {
        self.lines.clear();
    }

    /// Add a segment; zero-length segments are dropped
    pub fn add_line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32) {
        if (x0, y0) == (x1, y1) {
            return;
        }
        self.lines.push(LineSegment::new(
            Point2::new(x0 as f64, y0 as f64),
            Point2::new(x1 as f64, y1 as f64),
        ));
    }

    /// Add a segment with its endpoints rounded to pixels
    pub fn add_segment(&mut self, line: &LineSegment) {
        let ((x0, y0), (x1, y1)) = line.rounded();
        self.add_line(x0, y0, x1, y1);
    }

    pub fn add_drawing(&mut self, dwg: &Drawing) {
        self.lines.reserve(dwg.len());
        for line in dwg.lines() {
            self.add_segment(line);
        }
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

    /// Fill every closed contour on the calling thread
    ///
    /// # Panics
    /// Panics if a filled span falls outside the bitmap.
    #[track_caller]
    pub fn fill(&self, bmp: &mut GrayBmp, color: u8) {
        let Some(rows) = self.row_range(bmp.height()) else {
            return;
        };
        let mut s = bmp.session();
        let mut xs = Vec::with_capacity(self.lines.len());
        for y in rows {
            let y = y as i32;
            self.row_spans(y, &mut xs, |x0, x1| s.draw_horizontal_line(x0, x1, y, color));
        }
    }

    /// [`PolyFill::fill`] spread over one worker per available hardware thread
    pub fn fill_parallel(&self, bmp: &mut GrayBmp, color: u8) {
        let workers = thread::available_parallelism().map_or(1, NonZeroUsize::get);
        self.fill_parallel_with(bmp, color, workers);
    }

    /// [`PolyFill::fill`] spread over `workers` threads
    ///
    /// Rows are pulled one at a time from a shared queue, so each row is
    /// written by exactly one worker and the output does not depend on the
    /// worker count. Workers write straight into row memory; the whole
    /// bitmap is marked dirty once they have all finished.
    ///
    /// # Panics
    /// Panics if `workers` is zero or a filled span falls outside the bitmap.
    #[track_caller]
    pub fn fill_parallel_with(&self, bmp: &mut GrayBmp, color: u8, workers: usize) {
        assert!(workers > 0, "fill_parallel_with needs at least one worker");
        let Some(rows) = self.row_range(bmp.height()) else {
            return;
        };
        let (width, stride) = (bmp.width() as i32, bmp.stride());
        debug!(workers, rows = rows.len(), lines = self.lines.len(), "parallel fill");

        let mut s = bmp.session();
        {
            let queue = Mutex::new(
                s.buffer_mut()
                    .chunks_mut(stride)
                    .enumerate()
                    .skip(rows.start)
                    .take(rows.len()),
            );

            // The scope joins every worker before returning and re-raises a
            // worker panic on this thread.
            thread::scope(|scope| {
                for _ in 0..workers {
                    scope.spawn(|| {
                        let mut xs = Vec::with_capacity(self.lines.len());
                        loop {
                            let next = queue.lock().unwrap_or_else(PoisonError::into_inner).next();
                            let Some((y, row)) = next else {
                                break;
                            };
                            let y = y as i32;
                            self.row_spans(y, &mut xs, |x0, x1| {
                                if x0 < 0 || x1 >= width {
                                    panic!(
                                        "Pixel location out of range: ({},{}) in fill span",
                                        if x0 < 0 { x0 } else { x1 },
                                        y
                                    );
                                }
                                row[x0 as usize..=x1 as usize].fill(color);
                            });
                        }
                    });
                }
            });
        }
        s.dirty_all();
    }

    /// Rows whose centre line can meet any segment, clipped to the bitmap
    fn row_range(&self, height: u32) -> Option<Range<usize>> {
        let (lo, hi) = self.lines.iter().fold((f64::MAX, f64::MIN), |(lo, hi), l| {
            (lo.min(l.a.y).min(l.b.y), hi.max(l.a.y).max(l.b.y))
        });
        if lo > hi {
            return None;
        }
        let start = lo.floor().max(0.0) as usize;
        let end = (hi.ceil().max(0.0) as usize).min(height as usize);
        (start < end).then_some(start..end)
    }

    /// Compute row `y`'s crossings and emit its filled spans `(x0, x1)`,
    /// inclusive. Rows with an odd crossing count are open or degenerate
    /// geometry and emit nothing.
    fn row_spans(&self, y: i32, xs: &mut Vec<f64>, mut emit: impl FnMut(i32, i32)) {
        let sy = y as f64 + 0.5;
        xs.clear();
        xs.extend(self.lines.iter().filter_map(|l| scan_intersection(l, sy)));
        if xs.is_empty() || xs.len() % 2 != 0 {
            return;
        }
        xs.sort_unstable_by(f64::total_cmp);
        for pair in xs.chunks_exact(2) {
            // Pixels whose centre lies in [pair[0], pair[1])
            let first = (pair[0] - 0.5).ceil() as i32;
            let last = (pair[1] - 0.5).ceil() as i32 - 1;
            if first <= last {
                emit(first, last);
            }
        }
    }
}

/// X where the horizontal line at `sy` crosses `line`
///
/// The vertical test is half-open (`lo <= sy < hi`) so a crossing exactly at
/// a vertex shared by two segments counts once, and horizontal segments never
/// intersect.
#[inline]
fn scan_intersection(line: &LineSegment, sy: f64) -> Option<f64> {
    let (a, b) = (line.a, line.b);
    let (lo, hi) = if a.y <= b.y { (a.y, b.y) } else { (b.y, a.y) };
    if sy < lo || sy >= hi {
        return None;
    }
    let x = a.x + (sy - a.y) * (b.x - a.x) / (b.y - a.y);
    x.is_finite().then_some(x)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(pf: &mut PolyFill, x0: i32, y0: i32, x1: i32, y1: i32) {
        pf.add_line(x0, y0, x1, y0);
        pf.add_line(x1, y0, x1, y1);
        pf.add_line(x1, y1, x0, y1);
        pf.add_line(x0, y1, x0, y0);
    }

    #[test]
    fn test_zero_length_segment_dropped() {
        let mut pf = PolyFill::new();
        pf.add_line(4, 4, 4, 4);
        assert!(pf.is_empty());
        pf.add_line(4, 4, 5, 4);
        assert_eq!(pf.len(), 1);
        pf.reset();
        assert!(pf.is_empty());
    }

    #[test]
    fn test_intersection_rejects_horizontal() {
        let l = LineSegment::from_coords(0.0, 3.0, 10.0, 3.0);
        assert_eq!(scan_intersection(&l, 3.0), None);
        assert_eq!(scan_intersection(&l, 3.5), None);
    }

    #[test]
    fn test_intersection_interpolates() {
        let l = LineSegment::from_coords(0.0, 0.0, 10.0, 20.0);
        assert_eq!(scan_intersection(&l, 10.5), Some(5.25));
        // Swapped endpoints give the same crossing
        let r = LineSegment::from_coords(10.0, 20.0, 0.0, 0.0);
        assert_eq!(scan_intersection(&r, 10.5), Some(5.25));
        assert_eq!(scan_intersection(&l, 20.5), None);
        assert_eq!(scan_intersection(&l, -0.5), None);
    }

    #[test]
    fn test_shared_vertex_counted_once() {
        // Two edges meeting at y=5: the half-open test keeps exactly one
        let upper = LineSegment::from_coords(0.0, 0.0, 0.0, 5.0);
        let lower = LineSegment::from_coords(0.0, 5.0, 0.0, 10.0);
        let hits = [&upper, &lower]
            .iter()
            .filter(|l| scan_intersection(l, 5.0).is_some())
            .count();
        assert_eq!(hits, 1);
    }

    #[test]
    fn test_fill_square_rows_and_columns() {
        let mut pf = PolyFill::new();
        square(&mut pf, 10, 10, 20, 20);
        let mut bmp = GrayBmp::new(32, 32);
        pf.fill(&mut bmp, 255);
        for y in 0..32 {
            for x in 0..32 {
                let inside = (10..20).contains(&x) && (10..20).contains(&y);
                assert_eq!(bmp.pixel(x, y) == 255, inside, "pixel ({}, {})", x, y);
            }
        }
    }

    #[test]
    fn test_fill_hole_by_parity() {
        let mut pf = PolyFill::new();
        square(&mut pf, 0, 0, 12, 12);
        square(&mut pf, 4, 4, 8, 8);
        let mut bmp = GrayBmp::new(12, 12);
        pf.fill(&mut bmp, 9);
        assert_eq!(bmp.pixel(1, 6), 9);
        assert_eq!(bmp.pixel(5, 5), 0);
        assert_eq!(bmp.pixel(10, 6), 9);
    }

    #[test]
    fn test_open_contour_skips_rows() {
        // A lone slanted edge gives one crossing per row: nothing is filled
        let mut pf = PolyFill::new();
        pf.add_line(2, 0, 6, 9);
        let mut bmp = GrayBmp::new(10, 10);
        pf.fill(&mut bmp, 255);
        assert!((0..10).all(|y| bmp.row(y).iter().all(|&p| p == 0)));
        assert_eq!(bmp.take_committed(), None);
    }

    #[test]
    fn test_row_range_clipped() {
        let mut pf = PolyFill::new();
        assert_eq!(pf.row_range(10), None);
        square(&mut pf, 0, -5, 4, 30);
        assert_eq!(pf.row_range(10), Some(0..10));
        pf.reset();
        square(&mut pf, 0, 12, 4, 30);
        assert_eq!(pf.row_range(10), None);
    }

    #[test]
    fn test_parallel_marks_whole_buffer_dirty() {
        let mut pf = PolyFill::new();
        square(&mut pf, 2, 2, 4, 4);
        let mut bmp = GrayBmp::new(16, 8);
        pf.fill_parallel_with(&mut bmp, 255, 3);
        assert_eq!(
            bmp.take_committed(),
            Some(crate::raster::DirtyRect::from_corners(0, 0, 15, 7))
        );
        assert_eq!(bmp.pixel(3, 3), 255);
        assert_eq!(bmp.pixel(4, 3), 0);
    }

    #[test]
    #[should_panic(expected = "at least one worker")]
    fn test_parallel_zero_workers() {
        let mut pf = PolyFill::new();
        square(&mut pf, 2, 2, 4, 4);
        pf.fill_parallel_with(&mut GrayBmp::new(8, 8), 255, 0);
    }
}
