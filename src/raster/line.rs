//! Line primitives: bulk horizontal runs and integer Bresenham

use super::GrayBmp;

impl GrayBmp {
    /// Draw the inclusive run [x1, x2] on row `y` (endpoints in any order)
    ///
    /// # Panics
    /// Panics if either endpoint lies outside the bitmap.
    #[track_caller]
    pub fn draw_horizontal_line(&mut self, x1: i32, x2: i32, y: i32, gray: u8) {
        self.check(x1, y);
        self.check(x2, y);
        let (x1, x2) = if x1 <= x2 { (x1, x2) } else { (x2, x1) };

        let mut s = self.session();
        s.dirty_region(x1, y, x2, y);
        let start = s.offset(x1, y);
        let end = start + (x2 - x1) as usize;
        s.pixels[start..=end].fill(gray);
    }

    /// Draw a one-pixel line between two endpoints
    ///
    /// Horizontal lines take the bulk-run path; everything else is plain
    /// integer Bresenham, so the pixel set is deterministic.
    ///
    /// # Panics
    /// Panics if either endpoint lies outside the bitmap.
    #[track_caller]
    pub fn draw_line(&mut self, x1: i32, y1: i32, x2: i32, y2: i32, gray: u8) {
        if y1 == y2 {
            self.draw_horizontal_line(x1, x2, y1, gray);
            return;
        }
        self.check(x1, y1);
        self.check(x2, y2);

        let mut s = self.session();
        s.dirty_region(x1, y1, x2, y2);

        let dx = (x2 - x1).abs();
        let dy = -(y2 - y1).abs();
        let step_x: i32 = if x1 < x2 { 1 } else { -1 };
        let step_y: i32 = if y1 < y2 { 1 } else { -1 };
        let step_row = step_y as isize * s.stride as isize;
        let mut err = dx + dy;
        let (mut x, mut y) = (x1, y1);
        let mut idx = s.offset(x1, y1) as isize;

        loop {
            // Safety: both endpoints passed check(), and every step stays
            // inside their bounding box, so idx addresses a visible pixel.
            unsafe {
                *s.pixels.get_unchecked_mut(idx as usize) = gray;
            }
            if x == x2 && y == y2 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                if x == x2 {
                    break;
                }
                err += dy;
                x += step_x;
                idx += step_x as isize;
            }
            if e2 <= dx {
                if y == y2 {
                    break;
                }
                err += dx;
                y += step_y;
                idx += step_row;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::DirtyRect;

    fn lit(bmp: &GrayBmp) -> Vec<(i32, i32)> {
        let mut out = Vec::new();
        for y in 0..bmp.height() as i32 {
            for x in 0..bmp.width() as i32 {
                if bmp.pixel(x, y) != 0 {
                    out.push((x, y));
                }
            }
        }
        out
    }

    #[test]
    fn test_hline_reversed_endpoints() {
        let mut bmp = GrayBmp::new(10, 3);
        bmp.draw_horizontal_line(7, 2, 1, 40);
        assert_eq!(lit(&bmp), (2..=7).map(|x| (x, 1)).collect::<Vec<_>>());
        assert_eq!(bmp.take_committed(), Some(DirtyRect::from_corners(2, 1, 7, 1)));
    }

    #[test]
    fn test_single_point_line() {
        let mut bmp = GrayBmp::new(5, 5);
        bmp.draw_line(2, 3, 2, 3, 255);
        assert_eq!(lit(&bmp), vec![(2, 3)]);
    }

    #[test]
    fn test_vertical_line() {
        let mut bmp = GrayBmp::new(5, 6);
        bmp.draw_line(1, 5, 1, 1, 255);
        assert_eq!(lit(&bmp), vec![(1, 1), (1, 2), (1, 3), (1, 4), (1, 5)]);
    }

    #[test]
    fn test_shallow_line_pixel_set() {
        // dx=4, dy=2: the first step is diagonal because err starts at dx+dy
        let mut bmp = GrayBmp::new(6, 4);
        bmp.draw_line(0, 0, 4, 2, 255);
        assert_eq!(lit(&bmp), vec![(0, 0), (1, 1), (2, 1), (3, 2), (4, 2)]);
    }

    #[test]
    fn test_x_major_line_one_pixel_per_column() {
        let mut bmp = GrayBmp::new(20, 20);
        bmp.draw_line(17, 2, 3, 11, 255);
        let pts = lit(&bmp);
        // Exactly one pixel per column for an x-major line
        assert_eq!(pts.len(), 15);
        assert!(pts.contains(&(17, 2)));
        assert!(pts.contains(&(3, 11)));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_line_endpoint_out_of_range() {
        let mut bmp = GrayBmp::new(5, 5);
        bmp.draw_line(0, 0, 5, 3, 255);
    }
}
