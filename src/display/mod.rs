//! SDL2 presentation host for a [`GrayBmp`]
//!
//! Only the rectangle committed since the last present is uploaded to the
//! streaming texture.

use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;
use tracing::trace;

use crate::raster::{DirtyRect, GrayBmp};

pub struct Display {
    canvas: Canvas<Window>,
    event_pump: EventPump,
}

pub struct RenderTarget<'a> {
    texture: Texture<'a>,
    staging: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Quit,
    KeyDown(Keycode),
}

impl Display {
    /// Open a window of the given size
    pub fn with_size(
        title: &str,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>), String> {
        let sdl_context = sdl2::init()?;
        let video_subsystem = sdl_context.video()?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(|e| e.to_string())?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump()?;

        Ok((
            Self { canvas, event_pump },
            texture_creator,
        ))
    }

    /// Upload the bitmap's committed dirty rectangle (if any) and present
    pub fn present(&mut self, target: &mut RenderTarget, bmp: &mut GrayBmp) -> Result<(), String> {
        if let Some(rect) = bmp.take_committed() {
            target.upload(bmp, rect)?;
        }
        self.canvas.copy(&target.texture, None, None)?;
        self.canvas.present();
        Ok(())
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(k)),
                _ => {},
            }
        }

        events
    }
}

impl<'a> RenderTarget<'a> {
    pub fn with_size(
        texture_creator: &'a TextureCreator<WindowContext>,
        width: u32,
        height: u32,
    ) -> Result<Self, String> {
        let texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::RGBA8888, width, height)
            .map_err(|e| e.to_string())?;
        Ok(Self {
            texture,
            staging: Vec::with_capacity((width * height * 4) as usize),
        })
    }

    /// Expand gray to RGBA8888 for one rectangle and push it to the texture
    fn upload(&mut self, bmp: &GrayBmp, rect: DirtyRect) -> Result<(), String> {
        let (w, h) = (rect.width(), rect.height());
        trace!(x = rect.x0, y = rect.y0, w, h, "texture upload");
        self.staging.clear();
        for y in rect.y0..=rect.y1 {
            let row = &bmp.row(y as u32)[rect.x0 as usize..=rect.x1 as usize];
            for &g in row {
                // RGBA8888 little-endian byte order: A, B, G, R
                self.staging.extend_from_slice(&[255, g, g, g]);
            }
        }
        self.texture
            .update(Rect::new(rect.x0, rect.y0, w, h), &self.staging, (w * 4) as usize)
            .map_err(|e| e.to_string())
    }
}
