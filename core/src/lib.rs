pub mod audio;
pub mod cart;
pub mod console;
pub mod gfx;
pub mod input;
pub mod machine;
pub mod pacer;

pub mod prelude {
    pub use crate::audio::{AudioBridge, SAMPLE_RATE};
    pub use crate::cart::{Cartridge, CartridgeLoader, LoadError};
    pub use crate::console::Console;
    pub use crate::gfx::{ColorTable, FrameCompositor, Pixel, SCREEN_HEIGHT, SCREEN_WIDTH};
    pub use crate::input::{Button, InputManager, PLAYER_COUNT};
    pub use crate::machine::{Code, Machine, SoundGenerator, SoundHandle};
    pub use crate::pacer::{Clock, FrameRate, FramePacer, FrameTiming, SystemClock};
}
