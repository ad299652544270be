/// Number of entries in the system palette (16 base + 16 extended colors).
pub const SYSTEM_COLOR_COUNT: usize = 32;

/// Fixed RGB values of the system palette.
///
/// Entries 0-15 are the base colors; 16-31 are the extended colors that a
/// screen palette selects by setting bit 7 of an entry.
pub const SYSTEM_PALETTE: [(u8, u8, u8); SYSTEM_COLOR_COUNT] = [
    (0x00, 0x00, 0x00),
    (0x1D, 0x2B, 0x53),
    (0x7E, 0x25, 0x53),
    (0x00, 0x87, 0x51),
    (0xAB, 0x52, 0x36),
    (0x5F, 0x57, 0x4F),
    (0xC2, 0xC3, 0xC7),
    (0xFF, 0xF1, 0xE8),
    (0xFF, 0x00, 0x4D),
    (0xFF, 0xA3, 0x00),
    (0xFF, 0xEC, 0x27),
    (0x00, 0xE4, 0x36),
    (0x29, 0xAD, 0xFF),
    (0x83, 0x76, 0x9C),
    (0xFF, 0x77, 0xA8),
    (0xFF, 0xCC, 0xAA),
    // Extended
    (0x29, 0x18, 0x14),
    (0x11, 0x1D, 0x35),
    (0x42, 0x21, 0x36),
    (0x12, 0x53, 0x59),
    (0x74, 0x2F, 0x29),
    (0x49, 0x33, 0x3B),
    (0xA2, 0x88, 0x79),
    (0xF3, 0xEF, 0x7D),
    (0xBE, 0x12, 0x50),
    (0xFF, 0x6C, 0x24),
    (0xA8, 0xE7, 0x2E),
    (0x00, 0xB5, 0x43),
    (0x06, 0x5A, 0xB5),
    (0x75, 0x46, 0x65),
    (0xFF, 0x6E, 0x59),
    (0xFF, 0x9D, 0x81),
];

/// A native display pixel value (e.g. `u16` for RGB565, `u32` for ARGB8888).
pub trait Pixel: Copy + Default + PartialEq + std::fmt::Debug + Send + 'static {}

impl Pixel for u8 {}
impl Pixel for u16 {}
impl Pixel for u32 {}

/// Precomputed mapping from system palette index to native pixel value.
///
/// Built once from a caller-supplied RGB mapper and never mutated afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorTable<P: Pixel> {
    entries: [P; SYSTEM_COLOR_COUNT],
}

impl<P: Pixel> ColorTable<P> {
    /// Build the table by running `mapper` over every system palette color.
    pub fn new(mapper: impl Fn(u8, u8, u8) -> P) -> Self {
        let mut entries = [P::default(); SYSTEM_COLOR_COUNT];
        for (entry, &(r, g, b)) in entries.iter_mut().zip(SYSTEM_PALETTE.iter()) {
            *entry = mapper(r, g, b);
        }
        Self { entries }
    }

    /// Native pixel for a system palette index.
    ///
    /// `index` must be below [`SYSTEM_COLOR_COUNT`]; callers resolve it
    /// through [`Palette::get`](super::Palette::get), which guarantees that.
    #[inline]
    pub fn get(&self, index: usize) -> P {
        self.entries[index]
    }

    pub fn entries(&self) -> &[P; SYSTEM_COLOR_COUNT] {
        &self.entries
    }
}
