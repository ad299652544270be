//! Servicing audio-device sample requests from the machine's synthesizer.

use crate::machine::SoundHandle;
use crate::machine::sound;

pub use crate::machine::sound::SAMPLE_RATE;

/// Samples requested per device callback unless configured otherwise.
pub const DEFAULT_BUFFER_SAMPLES: u16 = 2048;

/// Renders samples for the host audio context.
///
/// Holds its own handle to the synthesizer and nothing else, so it can live
/// on the audio thread while the main loop owns the rest of the console.
/// The synthesizer lock is only held while rendering; the main loop never
/// holds it across a frame.
#[derive(Clone)]
pub struct AudioBridge {
    sound: SoundHandle,
}

impl AudioBridge {
    pub fn new(sound: SoundHandle) -> Self {
        Self { sound }
    }

    /// Fill `out` with exactly `out.len()` mono samples.
    pub fn render(&self, out: &mut [i16]) {
        sound::lock(&self.sound).render_sounds(out);
    }
}
