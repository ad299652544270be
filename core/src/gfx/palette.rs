use super::color::SYSTEM_COLOR_COUNT;

/// A screen byte holding two horizontally adjacent 4-bit pixels.
///
/// The low nibble is the left pixel, the high nibble the right one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ColorByte(pub u8);

impl ColorByte {
    #[inline]
    pub fn low(self) -> u8 {
        self.0 & 0x0F
    }

    #[inline]
    pub fn high(self) -> u8 {
        self.0 >> 4
    }

    pub fn from_pair(left: u8, right: u8) -> Self {
        Self((left & 0x0F) | (right << 4))
    }
}

/// View over a 16-entry palette in machine memory.
///
/// Each entry is a system palette reference: the low nibble picks a color
/// and bit 7 switches to the extended half of the system palette.
#[derive(Debug, Clone, Copy)]
pub struct Palette<'a> {
    entries: &'a [u8; 16],
}

impl<'a> Palette<'a> {
    pub fn new(entries: &'a [u8; 16]) -> Self {
        Self { entries }
    }

    /// Resolve a logical color to a system palette index in `0..32`.
    ///
    /// Any entry value resolves in bounds; bits 4-6 are ignored.
    #[inline]
    pub fn get(&self, color: u8) -> usize {
        let entry = self.entries[(color & 0x0F) as usize];
        let index = (entry & 0x0F) as usize | if entry & 0x80 != 0 { 16 } else { 0 };
        debug_assert!(index < SYSTEM_COLOR_COUNT);
        index
    }

    pub fn raw(&self) -> &[u8; 16] {
        self.entries
    }
}

/// The palette every draw state starts with: each color maps to itself.
pub const IDENTITY_PALETTE: [u8; 16] = [
    0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0A, 0x0B, 0x0C, 0x0D, 0x0E,
    0x0F,
];
