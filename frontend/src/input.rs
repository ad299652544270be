use std::collections::HashMap;

use nibble_core::input::Button;
use sdl2::keyboard::Scancode;

use crate::config::{Binding, ConfigError};

/// Maps SDL scancodes to a controller and one of its buttons.
///
/// Several scancodes may share a target. Built once at startup.
pub struct KeyMap {
    map: HashMap<Scancode, (usize, Button)>,
}

impl KeyMap {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Bind a scancode to a button on one controller.
    pub fn bind(&mut self, scancode: Scancode, controller: usize, button: Button) {
        self.map.insert(scancode, (controller, button));
    }

    /// Look up the controller and button for a scancode.
    pub fn get(&self, scancode: Scancode) -> Option<(usize, Button)> {
        self.map.get(&scancode).copied()
    }

    /// Add bindings from the config file, replacing defaults for the same key.
    pub fn apply(&mut self, bindings: &[Binding]) -> Result<(), ConfigError> {
        for binding in bindings {
            let scancode = Scancode::from_name(&binding.key).ok_or_else(|| {
                ConfigError::Invalid(format!("unknown key name {:?}", binding.key))
            })?;
            let button: Button = binding.button.parse().map_err(ConfigError::Invalid)?;
            log::debug!(
                "binding {scancode:?} to controller {} {button:?}",
                binding.controller
            );
            self.bind(scancode, binding.controller, button);
        }
        Ok(())
    }
}

/// Default layout: player 1 on the arrows with Z/X, player 2 on A/S.
/// Escape is not bound; the main loop handles it before lookup.
pub fn default_key_map() -> KeyMap {
    const BINDINGS: &[(Scancode, usize, Button)] = &[
        (Scancode::Left, 0, Button::Left),
        (Scancode::Right, 0, Button::Right),
        (Scancode::Up, 0, Button::Up),
        (Scancode::Down, 0, Button::Down),
        (Scancode::Z, 0, Button::O),
        (Scancode::LCtrl, 0, Button::O),
        (Scancode::X, 0, Button::X),
        (Scancode::LAlt, 0, Button::X),
        (Scancode::A, 1, Button::O),
        (Scancode::Space, 1, Button::O),
        (Scancode::S, 1, Button::X),
        (Scancode::LShift, 1, Button::X),
    ];

    let mut km = KeyMap::new();
    for &(scancode, controller, button) in BINDINGS {
        km.bind(scancode, controller, button);
    }
    km
}
