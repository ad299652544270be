use nibble_core::gfx::Pixel;

/// 4x5 bitmap font for the FPS readout. Bits are MSB-left, top 4 used.
const GLYPHS: &[(&[u8; 5], u8)] = &[
    (&[0x60, 0x90, 0x90, 0x90, 0x60], b'0'),
    (&[0x20, 0x60, 0x20, 0x20, 0x70], b'1'),
    (&[0x60, 0x90, 0x20, 0x40, 0xF0], b'2'),
    (&[0x60, 0x90, 0x20, 0x90, 0x60], b'3'),
    (&[0x90, 0x90, 0xF0, 0x10, 0x10], b'4'),
    (&[0xF0, 0x80, 0xE0, 0x10, 0xE0], b'5'),
    (&[0x60, 0x80, 0xE0, 0x90, 0x60], b'6'),
    (&[0xF0, 0x10, 0x20, 0x40, 0x40], b'7'),
    (&[0x60, 0x90, 0x60, 0x90, 0x60], b'8'),
    (&[0x60, 0x90, 0x70, 0x10, 0x60], b'9'),
    (&[0x00, 0x00, 0x00, 0x00, 0x40], b'.'),
];

const BLANK: [u8; 5] = [0; 5];
const GLYPH_W: usize = 4;
const ORIGIN: usize = 1;

fn glyph_for(ch: u8) -> &'static [u8; 5] {
    GLYPHS
        .iter()
        .find(|&&(_, c)| c == ch)
        .map_or(&BLANK, |&(data, _)| data)
}

/// Draw `text` in the top-left corner of a composed frame.
/// Pixels falling outside `buffer` are skipped.
pub fn draw_fps<P: Pixel>(buffer: &mut [P], pitch: usize, text: &str, color: P) {
    for (ci, ch) in text.bytes().enumerate() {
        let gx = ORIGIN + ci * (GLYPH_W + 1);
        for (row, &bits) in glyph_for(ch).iter().enumerate() {
            for col in 0..GLYPH_W {
                if bits & (0x80 >> col) == 0 || gx + col >= pitch {
                    continue;
                }
                if let Some(px) = buffer.get_mut((ORIGIN + row) * pitch + gx + col) {
                    *px = color;
                }
            }
        }
    }
}
