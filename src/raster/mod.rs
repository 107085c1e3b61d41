//! Software rasterization core: grayscale bitmap, lines, polygon fill

mod downsample;
mod gray_bmp;
mod line;
mod poly_fill;
mod thick_line;

pub use downsample::downsample;
pub use gray_bmp::{DirtyRect, GrayBmp, Session};
pub use poly_fill::PolyFill;
pub use thick_line::ThickLine;
