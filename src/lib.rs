//! Grayscale software rasterizer
//!
//! [`GrayBmp`] is an 8-bit bitmap with a reentrant write session and
//! dirty-rectangle tracking. On top of it sit integer Bresenham lines,
//! a parity-rule scanline [`PolyFill`] (serial or row-parallel), thick
//! strokes built as filled outlines, and a box-filter [`downsample`] for
//! supersampled anti-aliasing. Presenting the bitmap is left to the host.

pub mod config;
#[cfg(feature = "display")]
pub mod display;
pub mod geometry;
pub mod logging;
pub mod raster;
pub mod render;
pub mod util;

pub use config::RenderConfig;
pub use geometry::{Drawing, LineSegment, Point2};
pub use raster::{downsample, DirtyRect, GrayBmp, PolyFill, Session, ThickLine};
