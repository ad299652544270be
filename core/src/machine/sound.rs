//! Sound generation: the synthesizer seam shared with the audio context,
//! and the built-in 4-channel SFX synthesizer.
//!
//! An sfx record is 68 bytes: 32 little-endian note words followed by
//! editor mode, speed, loop start and loop end. A note word packs
//! pitch (bits 0-5), waveform (6-8), volume (9-11), effect (12-14) and a
//! custom-instrument flag (15).

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::memory::SFX_BANK_SIZE;

/// Output sample rate of every synthesizer, in Hz.
pub const SAMPLE_RATE: u32 = 44_100;

/// Number of mixer channels.
pub const CHANNEL_COUNT: usize = 4;

pub const SFX_COUNT: usize = 64;
pub const SFX_RECORD_SIZE: usize = 68;
pub const NOTES_PER_SFX: usize = 32;

/// One sfx speed unit: 183 samples at 22,050 Hz.
const SAMPLES_PER_TICK: u32 = 183 * SAMPLE_RATE / 22_050;

/// Frequency of pitch 0 (C2).
const BASE_FREQUENCY: f32 = 65.406;

/// Peak amplitude of one channel at full volume. Four channels sum to
/// half of the i16 range.
const CHANNEL_AMPLITUDE: f32 = 4096.0;

/// A sound generator the machine drives and the audio context renders.
pub trait SoundGenerator: Send {
    /// Reset all channels and take the sfx definitions to play from.
    fn init(&mut self, sfx_bank: &[u8; SFX_BANK_SIZE]);

    /// Start `sfx` on `channel`, or on the first idle channel when `None`.
    fn play(&mut self, sfx: u8, channel: Option<usize>);

    fn stop(&mut self, channel: usize);

    /// Render exactly `out.len()` mono samples.
    fn render_sounds(&mut self, out: &mut [i16]);
}

/// Synthesizer shared between the main loop and the audio callback.
pub type SoundHandle = Arc<Mutex<dyn SoundGenerator>>;

/// Lock the synthesizer, recovering the guard if a previous holder panicked.
pub fn lock(handle: &SoundHandle) -> MutexGuard<'_, dyn SoundGenerator + 'static> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Note {
    pub pitch: u8,
    pub waveform: u8,
    pub volume: u8,
    pub effect: u8,
    pub custom: bool,
}

impl Note {
    pub fn from_word(word: u16) -> Self {
        Self {
            pitch: (word & 0x3F) as u8,
            waveform: ((word >> 6) & 0x07) as u8,
            volume: ((word >> 9) & 0x07) as u8,
            effect: ((word >> 12) & 0x07) as u8,
            custom: word & 0x8000 != 0,
        }
    }

    pub fn to_word(self) -> u16 {
        (self.pitch as u16 & 0x3F)
            | (self.waveform as u16 & 0x07) << 6
            | (self.volume as u16 & 0x07) << 9
            | (self.effect as u16 & 0x07) << 12
            | if self.custom { 0x8000 } else { 0 }
    }

    fn frequency(self) -> f32 {
        BASE_FREQUENCY * 2f32.powf(self.pitch as f32 / 12.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Sfx {
    pub notes: [Note; NOTES_PER_SFX],
    pub speed: u8,
    pub loop_start: u8,
    pub loop_end: u8,
}

impl Sfx {
    pub fn from_record(record: &[u8]) -> Self {
        let mut notes = [Note::default(); NOTES_PER_SFX];
        for (note, bytes) in notes.iter_mut().zip(record.chunks_exact(2)) {
            *note = Note::from_word(u16::from_le_bytes([bytes[0], bytes[1]]));
        }
        Self {
            notes,
            speed: record[65],
            loop_start: record[66],
            loop_end: record[67],
        }
    }

    fn loops(&self) -> bool {
        self.loop_end > self.loop_start
    }

    fn samples_per_note(&self) -> u32 {
        self.speed.max(1) as u32 * SAMPLES_PER_TICK
    }
}

#[derive(Default)]
struct Channel {
    sfx: Option<usize>,
    note: usize,
    elapsed: u32,
    phase: f32,
    detuned_phase: f32,
    noise: u32,
    noise_level: f32,
}

impl Channel {
    fn start(&mut self, sfx: usize) {
        *self = Self {
            sfx: Some(sfx),
            noise: self.noise.max(1),
            ..Self::default()
        };
    }

    fn next_sample(&mut self, bank: &[Sfx; SFX_COUNT]) -> f32 {
        let Some(index) = self.sfx else {
            return 0.0;
        };
        let sfx = &bank[index];
        let note = sfx.notes[self.note];

        let step = note.frequency() / SAMPLE_RATE as f32;
        let value = self.waveform(note.waveform, step);
        let sample = value * note.volume as f32 / 7.0;

        self.elapsed += 1;
        if self.elapsed >= sfx.samples_per_note() {
            self.elapsed = 0;
            self.note += 1;
            if sfx.loops() && self.note >= sfx.loop_end as usize {
                self.note = sfx.loop_start as usize;
            }
            if self.note >= NOTES_PER_SFX {
                self.sfx = None;
            }
        }
        sample
    }

    fn waveform(&mut self, waveform: u8, step: f32) -> f32 {
        let t = self.phase;
        self.phase = (self.phase + step).fract();
        match waveform {
            0 => triangle(t),
            1 => {
                if t < 0.875 {
                    t / 0.875 * 2.0 - 1.0
                } else {
                    (1.0 - t) / 0.125 * 2.0 - 1.0
                }
            }
            2 => t * 2.0 - 1.0,
            3 => square(t, 0.5),
            4 => square(t, 0.3125),
            5 => (triangle(t) + triangle((t * 2.0).fract())) * 0.5,
            6 => {
                // Resample the LFSR once per waveform period fraction.
                if self.phase < t || step > 0.25 || self.noise_level == 0.0 {
                    self.noise ^= self.noise << 13;
                    self.noise ^= self.noise >> 17;
                    self.noise ^= self.noise << 5;
                    self.noise_level = (self.noise & 0xFFFF) as f32 / 32_768.0 - 1.0;
                }
                self.noise_level
            }
            _ => {
                let d = self.detuned_phase;
                self.detuned_phase = (self.detuned_phase + step * 1.0098).fract();
                (triangle(t) + triangle(d)) * 0.5
            }
        }
    }
}

fn triangle(t: f32) -> f32 {
    1.0 - (t - 0.5).abs() * 4.0
}

fn square(t: f32, duty: f32) -> f32 {
    if t < duty { 1.0 } else { -1.0 }
}

/// Four-channel SFX synthesizer.
pub struct Apu {
    bank: Box<[Sfx; SFX_COUNT]>,
    channels: [Channel; CHANNEL_COUNT],
}

impl Apu {
    pub fn new() -> Self {
        Self {
            bank: Box::new([Sfx::default(); SFX_COUNT]),
            channels: Default::default(),
        }
    }

    /// Index of the sfx playing on `channel`, if any.
    pub fn playing(&self, channel: usize) -> Option<usize> {
        self.channels.get(channel).and_then(|c| c.sfx)
    }
}

impl Default for Apu {
    fn default() -> Self {
        Self::new()
    }
}

impl SoundGenerator for Apu {
    fn init(&mut self, sfx_bank: &[u8; SFX_BANK_SIZE]) {
        for (sfx, record) in self.bank.iter_mut().zip(sfx_bank.chunks_exact(SFX_RECORD_SIZE)) {
            *sfx = Sfx::from_record(record);
        }
        self.channels = Default::default();
    }

    fn play(&mut self, sfx: u8, channel: Option<usize>) {
        let sfx = sfx as usize;
        if sfx >= SFX_COUNT {
            return;
        }
        let target = match channel {
            Some(c) if c < CHANNEL_COUNT => Some(c),
            Some(_) => None,
            None => self.channels.iter().position(|c| c.sfx.is_none()),
        };
        match target {
            Some(c) => self.channels[c].start(sfx),
            None => log::debug!("no channel available for sfx {sfx}"),
        }
    }

    fn stop(&mut self, channel: usize) {
        if let Some(c) = self.channels.get_mut(channel) {
            c.sfx = None;
        }
    }

    fn render_sounds(&mut self, out: &mut [i16]) {
        for sample in out.iter_mut() {
            let mix: f32 = self
                .channels
                .iter_mut()
                .map(|c| c.next_sample(&self.bank))
                .sum();
            *sample = (mix * CHANNEL_AMPLITUDE) as i16;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bank_with(index: usize, sfx: &Sfx) -> Box<[u8; SFX_BANK_SIZE]> {
        let mut bank = Box::new([0u8; SFX_BANK_SIZE]);
        let record = &mut bank[index * SFX_RECORD_SIZE..(index + 1) * SFX_RECORD_SIZE];
        for (i, note) in sfx.notes.iter().enumerate() {
            record[i * 2..i * 2 + 2].copy_from_slice(&note.to_word().to_le_bytes());
        }
        record[65] = sfx.speed;
        record[66] = sfx.loop_start;
        record[67] = sfx.loop_end;
        bank
    }

    fn square_sfx(speed: u8) -> Sfx {
        let note = Note {
            pitch: 33,
            waveform: 3,
            volume: 7,
            effect: 0,
            custom: false,
        };
        Sfx {
            notes: [note; NOTES_PER_SFX],
            speed,
            loop_start: 0,
            loop_end: 0,
        }
    }

    #[test]
    fn note_word_fields() {
        let note = Note::from_word(0b1_011_101_110_101010);
        assert_eq!(note.pitch, 0b101010);
        assert_eq!(note.waveform, 0b110);
        assert_eq!(note.volume, 0b101);
        assert_eq!(note.effect, 0b011);
        assert!(note.custom);
        assert_eq!(note.to_word(), 0b1_011_101_110_101010);
    }

    #[test]
    fn pitch_33_is_a440() {
        let note = Note {
            pitch: 33,
            ..Note::default()
        };
        assert!((note.frequency() - 440.0).abs() < 0.5);
    }

    #[test]
    fn idle_apu_renders_silence() {
        let mut apu = Apu::new();
        let mut out = [1i16; 512];
        apu.render_sounds(&mut out);
        assert!(out.iter().all(|&s| s == 0));
    }

    #[test]
    fn playing_sfx_produces_signal_then_stops() {
        let mut apu = Apu::new();
        apu.init(&bank_with(5, &square_sfx(1)));
        apu.play(5, Some(2));
        assert_eq!(apu.playing(2), Some(5));

        let length = NOTES_PER_SFX * SAMPLES_PER_TICK as usize;
        let mut out = vec![0i16; length];
        apu.render_sounds(&mut out);
        assert!(out.iter().any(|&s| s != 0));
        assert_eq!(apu.playing(2), None);

        let mut tail = [1i16; 64];
        apu.render_sounds(&mut tail);
        assert!(tail.iter().all(|&s| s == 0));
    }

    #[test]
    fn looping_sfx_keeps_playing() {
        let mut sfx = square_sfx(1);
        sfx.loop_start = 0;
        sfx.loop_end = 4;
        let mut apu = Apu::new();
        apu.init(&bank_with(0, &sfx));
        apu.play(0, None);

        let mut out = vec![0i16; NOTES_PER_SFX * SAMPLES_PER_TICK as usize * 2];
        apu.render_sounds(&mut out);
        assert_eq!(apu.playing(0), Some(0));
    }

    #[test]
    fn play_picks_first_idle_channel() {
        let mut apu = Apu::new();
        apu.init(&bank_with(1, &square_sfx(4)));
        apu.play(1, None);
        apu.play(1, None);
        assert_eq!(apu.playing(0), Some(1));
        assert_eq!(apu.playing(1), Some(1));
        assert_eq!(apu.playing(2), None);

        apu.stop(0);
        assert_eq!(apu.playing(0), None);
    }

    #[test]
    fn init_silences_all_channels() {
        let mut apu = Apu::new();
        let bank = bank_with(0, &square_sfx(1));
        apu.init(&bank);
        apu.play(0, Some(3));
        apu.init(&bank);
        assert_eq!(apu.playing(3), None);
    }

    #[test]
    fn out_of_range_requests_are_ignored() {
        let mut apu = Apu::new();
        apu.play(64, None);
        apu.play(0, Some(9));
        apu.stop(9);
        assert!((0..CHANNEL_COUNT).all(|c| apu.playing(c).is_none()));
    }

    #[test]
    fn shared_handle_renders_through_lock() {
        let handle: SoundHandle = Arc::new(Mutex::new(Apu::new()));
        let mut out = [5i16; 16];
        lock(&handle).render_sounds(&mut out);
        assert!(out.iter().all(|&s| s == 0));
    }
}
