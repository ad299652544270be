//! The console context: one explicitly constructed owner of the machine,
//! the input state and the frame counter, passed to every component that
//! needs them.

use crate::gfx::{ComposeError, FrameCompositor, Pixel};
use crate::input::InputManager;
use crate::machine::{Machine, SoundHandle};
use crate::pacer::FrameRate;

pub struct Console {
    machine: Machine,
    input: InputManager,
    frame_counter: u64,
}

impl Console {
    pub fn new(machine: Machine) -> Self {
        Self {
            machine,
            input: InputManager::new(),
            frame_counter: 0,
        }
    }

    pub fn machine(&self) -> &Machine {
        &self.machine
    }

    pub fn machine_mut(&mut self) -> &mut Machine {
        &mut self.machine
    }

    pub fn input(&self) -> &InputManager {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut InputManager {
        &mut self.input
    }

    /// Shared synthesizer handle, for the audio context.
    pub fn sound(&self) -> SoundHandle {
        self.machine.sound().clone()
    }

    pub fn frame_counter(&self) -> u64 {
        self.frame_counter
    }

    pub fn reset_frame_counter(&mut self) {
        self.frame_counter = 0;
    }

    /// Logical frame rate of the loaded program.
    pub fn frame_rate(&self) -> FrameRate {
        FrameRate::from_cartridge(self.machine.code().require_60fps())
    }

    /// Run the program's init hook to completion.
    pub fn run_init(&mut self) {
        self.machine.init(&self.input);
    }

    /// Run one logical frame and compose it into `surface`.
    ///
    /// Input events for this frame must already have been relayed with
    /// [`InputManager::manage_key`]. Repeat edges scheduled after the draw
    /// become visible on the next frame's update.
    pub fn step_frame<P: Pixel>(
        &mut self,
        compositor: &FrameCompositor<P>,
        surface: &mut [P],
        pitch: usize,
    ) -> Result<(), ComposeError> {
        self.input.tick();
        self.machine.update(&self.input);
        self.machine.draw(&self.input);
        let composed = compositor.compose(self.machine.memory(), surface, pitch);
        self.input.manage_key_repeat();
        self.frame_counter += 1;
        log::trace!("frame {}", self.frame_counter);
        composed
    }
}

impl Default for Console {
    fn default() -> Self {
        Self::new(Machine::default())
    }
}
