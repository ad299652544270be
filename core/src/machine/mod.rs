//! The emulated machine as seen by the platform layer: memory, the
//! cartridge program's hooks, and the synthesizer.

pub mod code;
pub mod memory;
pub mod sound;

use std::sync::{Arc, Mutex};

pub use code::{Code, DeclaredHooks, ScriptError, Vm};
pub use memory::{MEMORY_SIZE, Memory, ROM_SIZE};
pub use sound::{Apu, SoundGenerator, SoundHandle};

use crate::cart::Cartridge;
use crate::input::InputManager;

pub struct Machine {
    memory: Memory,
    code: Box<dyn Code>,
    sound: SoundHandle,
}

impl Machine {
    pub fn new(code: Box<dyn Code>, sound: SoundHandle) -> Self {
        Self {
            memory: Memory::new(),
            code,
            sound,
        }
    }

    pub fn memory(&self) -> &Memory {
        &self.memory
    }

    pub fn memory_mut(&mut self) -> &mut Memory {
        &mut self.memory
    }

    pub fn code(&self) -> &dyn Code {
        self.code.as_ref()
    }

    pub fn sound(&self) -> &SoundHandle {
        &self.sound
    }

    /// Load the cartridge program, then replace memory with its image.
    ///
    /// Memory is left untouched if the program is rejected.
    pub fn install(&mut self, cartridge: &Cartridge) -> Result<(), ScriptError> {
        self.code.load(&cartridge.code)?;
        self.memory.clear();
        self.memory.install_rom(&cartridge.rom);
        Ok(())
    }

    pub fn init(&mut self, input: &InputManager) {
        let mut vm = Vm {
            memory: &mut self.memory,
            input,
            sound: &self.sound,
        };
        self.code.init(&mut vm);
    }

    pub fn update(&mut self, input: &InputManager) {
        let mut vm = Vm {
            memory: &mut self.memory,
            input,
            sound: &self.sound,
        };
        self.code.update(&mut vm);
    }

    pub fn draw(&mut self, input: &InputManager) {
        let mut vm = Vm {
            memory: &mut self.memory,
            input,
            sound: &self.sound,
        };
        self.code.draw(&mut vm);
    }

    /// Reset the synthesizer against the current sfx bank.
    pub fn init_sound(&mut self) {
        sound::lock(&self.sound).init(self.memory.sfx_bank());
    }
}

impl Default for Machine {
    /// A machine with the declaration-only runtime and the built-in [`Apu`].
    fn default() -> Self {
        let sound: SoundHandle = Arc::new(Mutex::new(Apu::new()));
        Self::new(Box::new(DeclaredHooks::new()), sound)
    }
}
