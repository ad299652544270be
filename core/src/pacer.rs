//! Fixed-rate frame pacing.
//!
//! One logical frame per budget: the loop measures its own work from
//! [`FramePacer::begin_frame`] and sleeps whatever is left of the budget in
//! [`FramePacer::end_frame`]. Overruns are not paid back; the next frame
//! starts immediately.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

/// Logical frame rate declared by a cartridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRate {
    Thirty,
    Sixty,
}

impl FrameRate {
    pub fn from_cartridge(require_60fps: bool) -> Self {
        if require_60fps { Self::Sixty } else { Self::Thirty }
    }

    pub fn fps(self) -> u32 {
        match self {
            Self::Thirty => 30,
            Self::Sixty => 60,
        }
    }

    /// Wall-clock time available to one frame.
    pub fn budget(self) -> Duration {
        Duration::from_secs(1) / self.fps()
    }
}

/// Time source for the pacer.
pub trait Clock {
    fn now(&self) -> Instant;
    fn sleep(&mut self, duration: Duration);
}

/// The real clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }

    fn sleep(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// What happened during one paced frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameTiming {
    /// Time spent on frame work.
    pub work: Duration,
    /// Time slept to fill the budget; zero on overrun.
    pub slept: Duration,
    pub overrun: bool,
}

const FPS_WINDOW: usize = 30;

pub struct FramePacer<C: Clock = SystemClock> {
    clock: C,
    rate: FrameRate,
    frame_start: Option<Instant>,
    /// Start instants of the most recent frames, oldest first.
    history: VecDeque<Instant>,
}

impl FramePacer<SystemClock> {
    pub fn new(rate: FrameRate) -> Self {
        Self::with_clock(rate, SystemClock)
    }
}

impl<C: Clock> FramePacer<C> {
    pub fn with_clock(rate: FrameRate, clock: C) -> Self {
        Self {
            clock,
            rate,
            frame_start: None,
            history: VecDeque::with_capacity(FPS_WINDOW + 1),
        }
    }

    pub fn rate(&self) -> FrameRate {
        self.rate
    }

    /// Mark the start of a frame's work.
    pub fn begin_frame(&mut self) {
        let now = self.clock.now();
        self.frame_start = Some(now);
        self.history.push_back(now);
        if self.history.len() > FPS_WINDOW + 1 {
            self.history.pop_front();
        }
    }

    /// Finish the frame: sleep for whatever is left of the budget.
    ///
    /// Calling this without `begin_frame` treats the frame as having taken
    /// no time.
    pub fn end_frame(&mut self) -> FrameTiming {
        let now = self.clock.now();
        let work = self
            .frame_start
            .take()
            .map_or(Duration::ZERO, |start| now.saturating_duration_since(start));

        let budget = self.rate.budget();
        let slept = budget.saturating_sub(work);
        if !slept.is_zero() {
            self.clock.sleep(slept);
        } else {
            log::trace!("frame overran its budget by {:?}", work - budget);
        }

        FrameTiming {
            work,
            slept,
            overrun: work > budget,
        }
    }

    /// Frames per second measured over the recent frame starts.
    pub fn measured_fps(&self) -> f32 {
        let (Some(first), Some(last)) = (self.history.front(), self.history.back()) else {
            return 0.0;
        };
        let span = last.saturating_duration_since(*first).as_secs_f32();
        if span <= 0.0 {
            return 0.0;
        }
        (self.history.len() - 1) as f32 / span
    }
}
