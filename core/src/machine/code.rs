//! The script-runtime seam. A cartridge's program is executed by an
//! implementation of [`Code`]; the machine only drives its hooks.

use super::memory::Memory;
use super::sound::SoundHandle;
use crate::input::InputManager;

/// What a hook may touch while it runs.
pub struct Vm<'a> {
    pub memory: &'a mut Memory,
    pub input: &'a InputManager,
    pub sound: &'a SoundHandle,
}

/// A cartridge program rejected by the runtime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub message: String,
}

impl ScriptError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ScriptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "script error: {}", self.message)
    }
}

impl std::error::Error for ScriptError {}

/// Lifecycle hooks of a loaded cartridge program.
pub trait Code {
    /// Replace the current program with `source`.
    fn load(&mut self, source: &str) -> Result<(), ScriptError>;

    fn has_init(&self) -> bool;

    /// One-time initialization, run to completion before the first frame.
    fn init(&mut self, vm: &mut Vm<'_>);

    fn update(&mut self, vm: &mut Vm<'_>);

    fn draw(&mut self, vm: &mut Vm<'_>);

    /// Whether the program asks for 60 logical frames per second.
    fn require_60fps(&self) -> bool;
}

/// Runtime used when no interpreter is embedded.
///
/// Records which hooks the program declares so the frame rate and init
/// contract are known, but executes nothing.
#[derive(Debug, Default, Clone)]
pub struct DeclaredHooks {
    init: bool,
    update: bool,
    update60: bool,
    draw: bool,
}

impl DeclaredHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declares_update(&self) -> bool {
        self.update || self.update60
    }

    pub fn declares_draw(&self) -> bool {
        self.draw
    }

    fn declare(&mut self, name: &str) {
        match name {
            "_init" => self.init = true,
            "_update" => self.update = true,
            "_update60" => self.update60 = true,
            "_draw" => self.draw = true,
            _ => {}
        }
    }
}

impl Code for DeclaredHooks {
    fn load(&mut self, source: &str) -> Result<(), ScriptError> {
        *self = Self::default();
        for line in source.lines() {
            let line = line.split("--").next().unwrap_or_default().trim();
            if let Some(rest) = line.strip_prefix("function") {
                self.declare(identifier(rest.trim_start()));
            } else if let Some((lhs, rhs)) = line.split_once('=') {
                if rhs.trim_start().starts_with("function") {
                    self.declare(lhs.trim());
                }
            }
        }
        log::debug!("declared hooks: {self:?}");
        if !self.declares_update() && !self.declares_draw() {
            log::info!("program declares neither _update() nor _draw(), frames will be static");
        }
        Ok(())
    }

    fn has_init(&self) -> bool {
        self.init
    }

    fn init(&mut self, _vm: &mut Vm<'_>) {}

    fn update(&mut self, _vm: &mut Vm<'_>) {}

    fn draw(&mut self, _vm: &mut Vm<'_>) {}

    fn require_60fps(&self) -> bool {
        self.update60
    }
}

fn identifier(text: &str) -> &str {
    let end = text
        .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_'))
        .unwrap_or(text.len());
    &text[..end]
}
