//! Display pipeline: system palette, screen palette indirection, and the
//! compositor that expands the packed 4bpp screen into native pixels.

pub mod color;
pub mod compose;
pub mod palette;

pub use color::{ColorTable, Pixel, SYSTEM_COLOR_COUNT, SYSTEM_PALETTE};
pub use compose::{ComposeError, FrameCompositor};
pub use palette::{ColorByte, Palette};

/// Emulated screen width in pixels.
pub const SCREEN_WIDTH: usize = 128;
/// Emulated screen height in pixels.
pub const SCREEN_HEIGHT: usize = 128;
/// Size of the packed screen buffer: two 4-bit pixels per byte.
pub const BYTES_PER_SCREEN: usize = SCREEN_WIDTH * SCREEN_HEIGHT / 2;
