//! Decoding carrier images into flat RGBA pixel data.

use png::{BitDepth, ColorType, Decoder, Transformations};

use super::LoadError;

/// A decoded carrier image.
pub struct RgbaImage {
    pub width: u32,
    pub height: u32,
    /// `width * height` pixels, 4 bytes each.
    pub pixels: Vec<u8>,
}

/// Decode PNG bytes to RGBA8, expanding palette, grayscale and RGB images.
pub fn decode_png(bytes: &[u8]) -> Result<RgbaImage, LoadError> {
    let mut decoder = Decoder::new(bytes);
    decoder.set_transformations(Transformations::normalize_to_color8());
    let mut reader = decoder.read_info()?;
    let mut buffer = vec![0; reader.output_buffer_size()];
    let frame = reader.next_frame(&mut buffer)?;
    buffer.truncate(frame.buffer_size());

    if frame.bit_depth != BitDepth::Eight {
        return Err(LoadError::UnsupportedImage(format!(
            "bit depth {:?}",
            frame.bit_depth
        )));
    }

    let pixels = match frame.color_type {
        ColorType::Rgba => buffer,
        ColorType::Rgb => buffer
            .chunks_exact(3)
            .flat_map(|px| [px[0], px[1], px[2], 0xFF])
            .collect(),
        ColorType::GrayscaleAlpha => buffer
            .chunks_exact(2)
            .flat_map(|px| [px[0], px[0], px[0], px[1]])
            .collect(),
        ColorType::Grayscale => buffer.iter().flat_map(|&v| [v, v, v, 0xFF]).collect(),
        ColorType::Indexed => {
            return Err(LoadError::UnsupportedImage(
                "indexed image was not expanded".into(),
            ));
        }
    };

    Ok(RgbaImage {
        width: frame.width,
        height: frame.height,
        pixels,
    })
}
