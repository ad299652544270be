//! Frame composition: packed 4bpp screen → screen palette → color table →
//! native pixels, in raster order.

use super::color::{ColorTable, Pixel};
use super::palette::{ColorByte, Palette};
use super::{BYTES_PER_SCREEN, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::machine::Memory;

/// The output surface cannot hold a full frame at the given pitch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComposeError {
    pub len: usize,
    pub pitch: usize,
}

impl std::fmt::Display for ComposeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "surface of {} pixels with pitch {} cannot hold a {SCREEN_WIDTH}x{SCREEN_HEIGHT} frame",
            self.len, self.pitch
        )
    }
}

impl std::error::Error for ComposeError {}

/// Expands the machine's screen into native pixels.
///
/// Holds only the immutable [`ColorTable`]; every call is a pure function
/// of the memory it is given.
pub struct FrameCompositor<P: Pixel> {
    colors: ColorTable<P>,
}

impl<P: Pixel> FrameCompositor<P> {
    pub fn new(colors: ColorTable<P>) -> Self {
        Self { colors }
    }

    pub fn colors(&self) -> &ColorTable<P> {
        &self.colors
    }

    /// Compose the current screen of `memory` into `out`.
    ///
    /// `pitch` is the distance in pixels between the starts of two rows.
    pub fn compose(&self, memory: &Memory, out: &mut [P], pitch: usize) -> Result<(), ComposeError> {
        self.compose_screen(memory.screen_data(), memory.screen_palette(), out, pitch)
    }

    /// Compose an explicit screen buffer through `palette`.
    pub fn compose_screen(
        &self,
        screen: &[u8; BYTES_PER_SCREEN],
        palette: Palette<'_>,
        out: &mut [P],
        pitch: usize,
    ) -> Result<(), ComposeError> {
        let needed = pitch
            .checked_mul(SCREEN_HEIGHT - 1)
            .and_then(|rows| rows.checked_add(SCREEN_WIDTH));
        match needed {
            Some(needed) if pitch >= SCREEN_WIDTH && out.len() >= needed => {}
            _ => {
                return Err(ComposeError {
                    len: out.len(),
                    pitch,
                });
            }
        }

        let row_bytes = SCREEN_WIDTH / 2;
        for (src_row, dst_row) in screen.chunks_exact(row_bytes).zip(out.chunks_mut(pitch)) {
            for (&byte, pair) in src_row.iter().zip(dst_row[..SCREEN_WIDTH].chunks_exact_mut(2)) {
                let byte = ColorByte(byte);
                pair[0] = self.colors.get(palette.get(byte.low()));
                pair[1] = self.colors.get(palette.get(byte.high()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::palette::IDENTITY_PALETTE;

    /// Table whose native pixel for system color `i` is `i` itself.
    fn index_table() -> ColorTable<u8> {
        let next = std::cell::Cell::new(0u8);
        ColorTable::new(|_, _, _| {
            let v = next.get();
            next.set(v + 1);
            v
        })
    }

    #[test]
    fn low_nibble_is_left_pixel() {
        let compositor = FrameCompositor::new(index_table());
        let mut screen = [0u8; BYTES_PER_SCREEN];
        screen[0] = 0x21; // left = 1, right = 2
        screen[BYTES_PER_SCREEN - 1] = 0xF3; // bottom-right pair: 3, 15
        let mut out = vec![0xEEu8; SCREEN_WIDTH * SCREEN_HEIGHT];

        compositor
            .compose_screen(&screen, Palette::new(&IDENTITY_PALETTE), &mut out, SCREEN_WIDTH)
            .unwrap();

        assert_eq!(&out[..3], &[1, 2, 0]);
        assert_eq!(&out[out.len() - 2..], &[3, 15]);
    }

    #[test]
    fn palette_remaps_before_color_table() {
        let compositor = FrameCompositor::new(index_table());
        let screen = [0x11u8; BYTES_PER_SCREEN];
        let mut entries = IDENTITY_PALETTE;
        entries[1] = 0x88; // extended color 8 → system index 24
        let mut out = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT];

        compositor
            .compose_screen(&screen, Palette::new(&entries), &mut out, SCREEN_WIDTH)
            .unwrap();

        assert!(out.iter().all(|&p| p == 24));
    }

    #[test]
    fn respects_pitch_and_leaves_padding_alone() {
        let compositor = FrameCompositor::new(index_table());
        let screen = [0x77u8; BYTES_PER_SCREEN];
        let pitch = SCREEN_WIDTH + 8;
        let mut out = vec![0xEEu8; pitch * SCREEN_HEIGHT];

        compositor
            .compose_screen(&screen, Palette::new(&IDENTITY_PALETTE), &mut out, pitch)
            .unwrap();

        for row in out.chunks(pitch) {
            assert!(row[..SCREEN_WIDTH].iter().all(|&p| p == 7));
            assert!(row[SCREEN_WIDTH..].iter().all(|&p| p == 0xEE));
        }
    }

    #[test]
    fn undersized_surface_is_rejected() {
        let compositor = FrameCompositor::new(index_table());
        let screen = [0u8; BYTES_PER_SCREEN];
        let mut out = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT - 1];
        let err = compositor
            .compose_screen(&screen, Palette::new(&IDENTITY_PALETTE), &mut out, SCREEN_WIDTH)
            .unwrap_err();
        assert_eq!(err.pitch, SCREEN_WIDTH);

        let mut narrow = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT];
        assert!(
            compositor
                .compose_screen(&screen, Palette::new(&IDENTITY_PALETTE), &mut narrow, 64)
                .is_err()
        );
    }

    #[test]
    fn huge_pitch_is_rejected() {
        let compositor = FrameCompositor::new(index_table());
        let screen = [0u8; BYTES_PER_SCREEN];
        let mut out = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT];
        let err = compositor
            .compose_screen(&screen, Palette::new(&IDENTITY_PALETTE), &mut out, usize::MAX / 2)
            .unwrap_err();
        assert_eq!(err.pitch, usize::MAX / 2);
    }

    #[test]
    fn arbitrary_palettes_never_panic() {
        let compositor = FrameCompositor::new(index_table());
        let screen: Vec<u8> = (0..BYTES_PER_SCREEN).map(|i| i as u8).collect();
        let screen: &[u8; BYTES_PER_SCREEN] = screen.as_slice().try_into().unwrap();
        let mut out = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT];
        for value in 0..=255u8 {
            let entries = [value; 16];
            compositor
                .compose_screen(screen, Palette::new(&entries), &mut out, SCREEN_WIDTH)
                .unwrap();
        }
    }
}
