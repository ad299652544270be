use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use nibble_core::audio::{AudioBridge, SAMPLE_RATE};
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

/// Number of samples over which to fade in/out (~5.8 ms at 44.1 kHz).
const FADE_SAMPLES: u32 = 256;

/// Gain ramp applied on top of the rendered samples at startup and
/// shutdown, so opening and closing the device does not click.
struct Fade {
    in_pos: u32,
    fading_out: FadeOut,
    out_pos: u32,
}

impl Fade {
    fn apply(&mut self, out: &mut [i16]) {
        for sample in out.iter_mut() {
            if self.in_pos < FADE_SAMPLES {
                let gain = self.in_pos as f32 / FADE_SAMPLES as f32;
                *sample = (*sample as f32 * gain) as i16;
                self.in_pos += 1;
            } else if self.fading_out.load(Ordering::Relaxed) {
                if self.out_pos < FADE_SAMPLES {
                    let gain = 1.0 - (self.out_pos as f32 / FADE_SAMPLES as f32);
                    *sample = (*sample as f32 * gain) as i16;
                    self.out_pos += 1;
                } else {
                    *sample = 0;
                }
            }
        }
    }
}

pub struct AudioPlayer {
    bridge: AudioBridge,
    fade: Fade,
}

impl AudioCallback for AudioPlayer {
    type Channel = i16;
    fn callback(&mut self, out: &mut [i16]) {
        self.bridge.render(out);
        self.fade.apply(out);
    }
}

/// Handle for signalling the audio callback to fade out before shutdown.
pub type FadeOut = Arc<AtomicBool>;

/// Open mono 16-bit playback at [`SAMPLE_RATE`] pulling from `bridge`.
///
/// The device starts paused; the caller resumes it once the loop is ready.
pub fn init(
    sdl_audio: &sdl2::AudioSubsystem,
    bridge: AudioBridge,
    buffer_samples: u16,
) -> Result<(AudioDevice<AudioPlayer>, FadeOut), String> {
    let fade_out: FadeOut = Arc::new(AtomicBool::new(false));

    let desired_spec = AudioSpecDesired {
        freq: Some(SAMPLE_RATE as i32),
        channels: Some(1),
        samples: Some(buffer_samples),
    };

    let device = sdl_audio.open_playback(None, &desired_spec, |spec| {
        log::info!(
            "audio device: {} Hz, {} channel(s), {} samples per buffer",
            spec.freq,
            spec.channels,
            spec.samples
        );
        if spec.freq != SAMPLE_RATE as i32 {
            log::warn!("audio device runs at {} Hz, expected {SAMPLE_RATE}", spec.freq);
        }
        AudioPlayer {
            bridge,
            fade: Fade {
                in_pos: 0,
                fading_out: Arc::clone(&fade_out),
                out_pos: 0,
            },
        }
    })?;

    Ok((device, fade_out))
}

/// Time to wait after signalling fade-out so the callback can ramp down
/// before the device is paused.
pub fn fade_out_duration() -> std::time::Duration {
    std::time::Duration::from_millis(10)
}
