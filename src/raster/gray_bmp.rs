//! Grayscale (8 bits per pixel) bitmap with a reentrant write session
//! and dirty-rectangle tracking

use std::ops::{Deref, DerefMut};
use tracing::trace;

// ============================================================================
// DirtyRect
// ============================================================================

/// Inclusive pixel rectangle. `x0 > x1` (or `y0 > y1`) means empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirtyRect {
    pub x0: i32,
    pub y0: i32,
    pub x1: i32,
    pub y1: i32,
}

impl DirtyRect {
    /// The sentinel empty rectangle: absorbs nothing, contributes nothing to a union
    pub const fn empty() -> Self {
        Self {
            x0: i32::MAX,
            y0: i32::MAX,
            x1: i32::MIN,
            y1: i32::MIN,
        }
    }

    /// Rectangle spanning two corners given in any order
    pub fn from_corners(x1: i32, y1: i32, x2: i32, y2: i32) -> Self {
        Self {
            x0: x1.min(x2),
            y0: y1.min(y2),
            x1: x1.max(x2),
            y1: y1.max(y2),
        }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x0 > self.x1 || self.y0 > self.y1
    }

    /// Grow to include a single pixel
    #[inline]
    pub fn include_point(&mut self, x: i32, y: i32) {
        self.x0 = self.x0.min(x);
        self.x1 = self.x1.max(x);
        self.y0 = self.y0.min(y);
        self.y1 = self.y1.max(y);
    }

    /// Smallest rectangle covering both
    pub fn union(self, other: Self) -> Self {
        if other.is_empty() {
            return self;
        }
        if self.is_empty() {
            return other;
        }
        Self {
            x0: self.x0.min(other.x0),
            y0: self.y0.min(other.y0),
            x1: self.x1.max(other.x1),
            y1: self.y1.max(other.y1),
        }
    }

    pub fn width(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.x1 - self.x0 + 1) as u32
        }
    }

    pub fn height(&self) -> u32 {
        if self.is_empty() {
            0
        } else {
            (self.y1 - self.y0 + 1) as u32
        }
    }
}

impl Default for DirtyRect {
    fn default() -> Self {
        Self::empty()
    }
}

// ============================================================================
// GrayBmp
// ============================================================================

/// Writable grayscale bitmap
///
/// Memory is row-major with an explicit `stride` (bytes per row, >= width).
/// Writes happen inside a session opened by [`GrayBmp::begin`] (or the scoped
/// [`GrayBmp::session`] guard). Sessions nest; the dirty rectangle is reset
/// when the outermost one opens and committed when it closes. Committed
/// rectangles accumulate until the presenting host drains them with
/// [`GrayBmp::take_committed`].
#[derive(Debug, Clone)]
pub struct GrayBmp {
    pub(super) pixels: Vec<u8>,
    pub(super) width: u32,
    pub(super) height: u32,
    pub(super) stride: usize,
    locks: usize,
    dirty: DirtyRect,
    committed: DirtyRect,
}

impl GrayBmp {
    /// Create a black bitmap, stride rounded up to a 4-byte boundary
    #[track_caller]
    pub fn new(width: u32, height: u32) -> Self {
        let stride = (width as usize + 3) & !3;
        Self::with_stride(width, height, stride)
    }

    /// Create a black bitmap with a host-chosen stride
    #[track_caller]
    pub fn with_stride(width: u32, height: u32, stride: usize) -> Self {
        assert!(
            width > 0 && height > 0,
            "GrayBmp dimensions must be non-zero, got {}x{}",
            width,
            height
        );
        assert!(
            stride >= width as usize,
            "GrayBmp stride {} is smaller than width {}",
            stride,
            width
        );
        Self {
            pixels: vec![0; stride * height as usize],
            width,
            height,
            stride,
            locks: 0,
            dirty: DirtyRect::empty(),
            committed: DirtyRect::empty(),
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row
    #[inline]
    pub fn stride(&self) -> usize {
        self.stride
    }

    /// Number of unmatched `begin()` calls
    #[inline]
    pub fn lock_depth(&self) -> usize {
        self.locks
    }

    #[inline]
    pub fn is_locked(&self) -> bool {
        self.locks > 0
    }

    /// Dirty rectangle accumulated by the session currently open
    pub fn dirty_rect(&self) -> DirtyRect {
        self.dirty
    }

    // ========================================================================
    // Session
    // ========================================================================

    /// Open (or join) a write session and return the raw buffer.
    ///
    /// The outermost `begin()` resets the dirty rectangle.
    pub fn begin(&mut self) -> &mut [u8] {
        if self.locks == 0 {
            self.dirty = DirtyRect::empty();
        }
        self.locks += 1;
        &mut self.pixels
    }

    /// Close one level of session. The outermost `end()` commits the dirty
    /// rectangle, if any.
    ///
    /// # Panics
    /// Panics when called without a matching `begin()`.
    #[track_caller]
    pub fn end(&mut self) {
        assert!(self.locks > 0, "Unexpected call to GrayBmp::end() without a matching begin()");
        self.locks -= 1;
        if self.locks == 0 && !self.dirty.is_empty() {
            trace!(
                x = self.dirty.x0,
                y = self.dirty.y0,
                w = self.dirty.width(),
                h = self.dirty.height(),
                "commit dirty rect"
            );
            self.committed = self.committed.union(self.dirty);
            self.dirty = DirtyRect::empty();
        }
    }

    /// Scoped session: `begin()` now, `end()` when the guard drops
    pub fn session(&mut self) -> Session<'_> {
        self.begin();
        Session { bmp: self }
    }

    /// Raw pixel memory (`stride * height` bytes)
    ///
    /// # Panics
    /// Panics outside a session.
    #[track_caller]
    pub fn buffer_mut(&mut self) -> &mut [u8] {
        assert!(self.locks > 0, "Buffer access outside begin() / end()");
        &mut self.pixels
    }

    /// Drain the rectangle committed by closed sessions since the last call
    pub fn take_committed(&mut self) -> Option<DirtyRect> {
        let rect = std::mem::take(&mut self.committed);
        (!rect.is_empty()).then_some(rect)
    }

    // ========================================================================
    // Dirty tracking
    // ========================================================================

    /// Tag a pixel as dirty
    #[inline]
    pub fn dirty(&mut self, x: i32, y: i32) {
        self.dirty.include_point(x, y);
    }

    /// Tag a rectangle as dirty (corners need not be ordered)
    pub fn dirty_region(&mut self, x1: i32, y1: i32, x2: i32, y2: i32) {
        self.dirty(x1, y1);
        self.dirty(x2, y2);
    }

    /// Tag the entire bitmap as dirty
    pub fn dirty_all(&mut self) {
        self.dirty_region(0, 0, self.width as i32 - 1, self.height as i32 - 1);
    }

    // ========================================================================
    // Pixel access
    // ========================================================================

    /// Fill every byte of the bitmap (stride padding included) with one gray
    pub fn clear(&mut self, gray: u8) {
        let mut s = self.session();
        s.pixels.fill(gray);
        s.dirty_all();
    }

    /// Set a single pixel
    ///
    /// # Panics
    /// Panics if (x, y) lies outside the bitmap.
    #[track_caller]
    pub fn set_pixel(&mut self, x: i32, y: i32, gray: u8) {
        self.check(x, y);
        let mut s = self.session();
        s.dirty(x, y);
        let idx = s.offset(x, y);
        s.pixels[idx] = gray;
    }

    /// Read a single pixel (no session needed)
    #[track_caller]
    pub fn pixel(&self, x: i32, y: i32) -> u8 {
        self.check(x, y);
        self.pixels[self.offset(x, y)]
    }

    /// The `width` visible bytes of row `y` (no session needed)
    #[track_caller]
    pub fn row(&self, y: u32) -> &[u8] {
        assert!(y < self.height, "Row {} out of range for height {}", y, self.height);
        let start = y as usize * self.stride;
        &self.pixels[start..start + self.width as usize]
    }

    /// Fatal on out-of-range pixel coordinates
    #[inline]
    #[track_caller]
    pub(super) fn check(&self, x: i32, y: i32) {
        if x < 0 || x >= self.width as i32 || y < 0 || y >= self.height as i32 {
            panic!(
                "Pixel location out of range: ({},{}) in {}x{} bitmap",
                x, y, self.width, self.height
            );
        }
    }

    /// Byte offset of an in-range pixel
    #[inline]
    pub(super) fn offset(&self, x: i32, y: i32) -> usize {
        y as usize * self.stride + x as usize
    }
}

// ============================================================================
// Session guard
// ============================================================================

/// Open write session on a [`GrayBmp`]; ends the session on drop, including
/// while unwinding from a fatal error.
pub struct Session<'a> {
    bmp: &'a mut GrayBmp,
}

impl Deref for Session<'_> {
    type Target = GrayBmp;

    fn deref(&self) -> &GrayBmp {
        self.bmp
    }
}

impl DerefMut for Session<'_> {
    fn deref_mut(&mut self) -> &mut GrayBmp {
        self.bmp
    }
}

impl Drop for Session<'_> {
    fn drop(&mut self) {
        self.bmp.end();
    }
}
