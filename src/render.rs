//! Supersampled frame pipeline
//!
//! Each frame is drawn into a bitmap `scale` times larger than the display:
//! background clear, parity fill of the whole drawing, every segment stroked
//! as a thick line, and finally a box-filter shrink into the display bitmap.

use anyhow::{ensure, Context, Result};
use std::num::NonZeroUsize;
use std::thread;
use tracing::{debug, info};

use crate::config::RenderConfig;
use crate::geometry::{Drawing, LineSegment};
use crate::raster::{downsample, GrayBmp, PolyFill};

pub struct Renderer {
    config: RenderConfig,
    drawing: Drawing,
    fill: PolyFill,
    hires: GrayBmp,
    display: GrayBmp,
    workers: usize,
}

impl Renderer {
    /// Build from a config, loading its drawing (or the built-in leaf)
    pub fn from_config(config: RenderConfig) -> Result<Self> {
        let scale = config.scale as f64;
        let drawing = match &config.drawing {
            Some(path) => Drawing::load(path, scale)?,
            None => Drawing::leaf(scale)?,
        };
        Self::new(config, drawing)
    }

    /// Build from a config and a drawing already in supersampled coordinates
    pub fn new(config: RenderConfig, drawing: Drawing) -> Result<Self> {
        config.validate()?;
        let (w, h) = config.supersampled_size().context("supersampled size overflows")?;

        ensure!(
            drawing.lines().iter().all(LineSegment::is_finite),
            "drawing has non-finite coordinates"
        );
        // Strokes must stay inside the bitmap: out-of-range pixels are fatal
        if let Some((x0, y0, x1, y1)) = drawing.bounds() {
            let margin = config.stroke_width() as f64;
            ensure!(
                x0 - margin >= 0.0 && y0 - margin >= 0.0 && x1 + margin < w as f64 && y1 + margin < h as f64,
                "drawing bounds ({:.1}, {:.1})-({:.1}, {:.1}) plus stroke {} exceed {}x{}",
                x0,
                y0,
                x1,
                y1,
                margin,
                w,
                h
            );
        }

        let workers = config
            .workers
            .unwrap_or_else(|| thread::available_parallelism().map_or(1, NonZeroUsize::get));
        info!(
            width = config.width,
            height = config.height,
            scale = config.scale,
            lines = drawing.len(),
            workers,
            parallel = config.parallel,
            "renderer ready"
        );

        Ok(Self {
            fill: PolyFill::with_capacity(drawing.len()),
            hires: GrayBmp::new(w, h),
            display: GrayBmp::new(config.width, config.height),
            config,
            drawing,
            workers,
        })
    }

    /// Draw one frame into the supersampled bitmap and shrink it for display
    pub fn render_frame(&mut self) {
        let c = &self.config;
        {
            let mut hi = self.hires.session();
            hi.clear(c.background);

            self.fill.reset();
            self.fill.add_drawing(&self.drawing);
            if c.parallel {
                self.fill.fill_parallel_with(&mut hi, c.fill_gray, self.workers);
            } else {
                self.fill.fill(&mut hi, c.fill_gray);
            }

            let stroke = c.stroke_width();
            for line in self.drawing.lines() {
                let ((x0, y0), (x1, y1)) = line.rounded();
                hi.draw_thick_line(x0, y0, x1, y1, stroke, c.stroke_gray);
            }
        }
        downsample(&self.hires, &mut self.display, c.scale);
        debug!(lines = self.drawing.len(), "frame rendered");
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// The display-resolution bitmap, ready to present
    pub fn display(&self) -> &GrayBmp {
        &self.display
    }

    /// Mutable access for the presenting host (to drain committed rects)
    pub fn display_mut(&mut self) -> &mut GrayBmp {
        &mut self.display
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_config() -> RenderConfig {
        RenderConfig {
            width: 40,
            height: 30,
            scale: 4,
            stroke_width: Some(2),
            workers: Some(2),
            ..RenderConfig::default()
        }
    }

    fn box_drawing(x0: f64, y0: f64, x1: f64, y1: f64) -> Drawing {
        let mut dwg = Drawing::new();
        dwg.add_line(LineSegment::from_coords(x0, y0, x1, y0));
        dwg.add_line(LineSegment::from_coords(x1, y0, x1, y1));
        dwg.add_line(LineSegment::from_coords(x1, y1, x0, y1));
        dwg.add_line(LineSegment::from_coords(x0, y1, x0, y0));
        dwg
    }

    #[test]
    fn test_frame_fills_inside_and_keeps_background() {
        let mut r = Renderer::new(small_config(), box_drawing(40.0, 40.0, 120.0, 80.0)).unwrap();
        r.render_frame();
        let d = r.display();
        // Box covers display pixels 10..30 x 10..20
        assert_eq!(d.pixel(20, 15), 255);
        assert_eq!(d.pixel(2, 2), 192);
        assert_eq!(d.pixel(35, 25), 192);
        // Edge pixels are darkened by the stroke
        assert!(d.pixel(10, 15) < 192);
        assert_eq!(r.display_mut().take_committed().map(|c| c.width()), Some(40));
    }

    #[test]
    fn test_serial_and_parallel_frames_match() {
        let dwg = box_drawing(12.0, 20.0, 140.0, 100.0);
        let mut a = Renderer::new(RenderConfig { parallel: false, ..small_config() }, dwg.clone()).unwrap();
        let mut b = Renderer::new(small_config(), dwg).unwrap();
        a.render_frame();
        b.render_frame();
        for y in 0..30 {
            assert_eq!(a.display().row(y), b.display().row(y), "row {}", y);
        }
    }

    #[test]
    fn test_rejects_drawing_outside_bitmap() {
        let err = Renderer::new(small_config(), box_drawing(0.0, 10.0, 50.0, 50.0)).err().unwrap();
        assert!(err.to_string().contains("exceed"), "{}", err);
    }

    #[test]
    fn test_rejects_non_finite_drawing() {
        let mut dwg = box_drawing(40.0, 40.0, 120.0, 80.0);
        dwg.add_line(LineSegment::from_coords(f64::NAN, 40.0, 120.0, 40.0));
        let err = Renderer::new(small_config(), dwg).err().unwrap();
        assert!(err.to_string().contains("non-finite"), "{}", err);
    }

    #[test]
    fn test_builtin_leaf_at_default_size() {
        let config = RenderConfig {
            scale: 2,
            stroke_width: Some(3),
            ..RenderConfig::default()
        };
        let mut r = Renderer::from_config(config).unwrap();
        r.render_frame();
        // Centre of the leaf is filled, corner is background
        assert_eq!(r.display().pixel(300, 300), 255);
        assert_eq!(r.display().pixel(5, 5), 192);
    }
}
