use nibble_core::gfx::{Pixel, SCREEN_HEIGHT, SCREEN_WIDTH};
use sdl2::pixels::PixelFormatEnum;
use sdl2::rect::Rect;
use sdl2::render::{Canvas, TextureCreator};
use sdl2::video::{Window, WindowContext};

use crate::config::VideoConfig;

/// Native pixel value for a 16-bit surface.
pub fn rgb565(r: u8, g: u8, b: u8) -> u16 {
    ((r as u16 & 0xF8) << 8) | ((g as u16 & 0xFC) << 3) | (b as u16 >> 3)
}

/// Native pixel value for a 32-bit surface.
pub fn argb8888(r: u8, g: u8, b: u8) -> u32 {
    u32::from_be_bytes([0xFF, r, g, b])
}

/// Largest centered square-pixel rectangle for the frame inside the window.
pub fn fit_rect(window_width: u32, window_height: u32) -> Rect {
    let scale = (window_width as f32 / SCREEN_WIDTH as f32)
        .min(window_height as f32 / SCREEN_HEIGHT as f32);
    let w = (SCREEN_WIDTH as f32 * scale) as u32;
    let h = (SCREEN_HEIGHT as f32 * scale) as u32;
    Rect::new(
        ((window_width - w) / 2) as i32,
        ((window_height - h) / 2) as i32,
        w,
        h,
    )
}

pub struct Video {
    canvas: Canvas<Window>,
    texture_creator: TextureCreator<WindowContext>,
    format: PixelFormatEnum,
    target: Rect,
}

impl Video {
    /// Create the window and renderer described by `config`.
    pub fn new(
        sdl_video: &sdl2::VideoSubsystem,
        title: &str,
        config: &VideoConfig,
    ) -> Result<Self, String> {
        let window = sdl_video
            .window(title, config.width, config.height)
            .position_centered()
            .build()
            .map_err(|e| e.to_string())?;

        let mut builder = window.into_canvas().accelerated();
        if config.vsync {
            builder = builder.present_vsync();
        }
        let canvas = builder.build().map_err(|e| e.to_string())?;
        let texture_creator = canvas.texture_creator();

        let format = match config.pixel_depth {
            32 => PixelFormatEnum::ARGB8888,
            _ => PixelFormatEnum::RGB565,
        };
        log::info!(
            "video {}x{} {format:?}{}",
            config.width,
            config.height,
            if config.vsync { " vsync" } else { "" }
        );

        Ok(Self {
            canvas,
            texture_creator,
            format,
            target: fit_rect(config.width, config.height),
        })
    }

    /// Upload a composed 128x128 frame and present it scaled to the window.
    pub fn present<P: Pixel + bytemuck::Pod>(&mut self, frame: &[P]) -> Result<(), String> {
        let mut texture = self
            .texture_creator
            .create_texture_streaming(self.format, SCREEN_WIDTH as u32, SCREEN_HEIGHT as u32)
            .map_err(|e| e.to_string())?;

        texture
            .update(
                None,
                bytemuck::cast_slice(frame),
                SCREEN_WIDTH * std::mem::size_of::<P>(),
            )
            .map_err(|e| e.to_string())?;

        self.canvas.clear();
        self.canvas.copy(&texture, None, self.target)?;
        self.canvas.present();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_formats() {
        assert_eq!(rgb565(0xFF, 0xFF, 0xFF), 0xFFFF);
        assert_eq!(rgb565(0xFF, 0, 0), 0xF800);
        assert_eq!(rgb565(0, 0xFF, 0), 0x07E0);
        assert_eq!(argb8888(0x12, 0x34, 0x56), 0xFF12_3456);
    }

    #[test]
    fn frame_is_letterboxed() {
        let r = fit_rect(320, 240);
        assert_eq!((r.width(), r.height()), (240, 240));
        assert_eq!((r.x(), r.y()), (40, 0));

        let r = fit_rect(128, 128);
        assert_eq!((r.x(), r.y(), r.width(), r.height()), (0, 0, 128, 128));
    }
}
