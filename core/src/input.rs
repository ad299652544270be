//! Controller state with edge detection and key repeat.
//!
//! Physical events are queued per button by [`InputManager::manage_key`] and
//! released one transition per [`InputManager::tick`], so a press and release
//! that arrive within a single frame are still both observed.

/// Number of controllers.
pub const PLAYER_COUNT: usize = 2;
/// Logical buttons per controller.
pub const BUTTON_COUNT: usize = 6;

/// Frames a button must be held before the first repeat edge.
pub const REPEAT_DELAY: u32 = 15;
/// Frames between repeat edges once repeating.
pub const REPEAT_INTERVAL: u32 = 4;

/// Queued transitions kept per button; older pairs are dropped.
const MAX_PENDING: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Button {
    Left = 0,
    Right = 1,
    Up = 2,
    Down = 3,
    O = 4,
    X = 5,
}

impl Button {
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::Left,
        Button::Right,
        Button::Up,
        Button::Down,
        Button::O,
        Button::X,
    ];

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::str::FromStr for Button {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "left" => Ok(Button::Left),
            "right" => Ok(Button::Right),
            "up" => Ok(Button::Up),
            "down" => Ok(Button::Down),
            "o" | "action1" => Ok(Button::O),
            "x" | "action2" => Ok(Button::X),
            other => Err(format!("unknown button: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct ButtonState {
    /// Last physical state reported.
    raw: bool,
    /// Transitions not yet released to the machine.
    pending: u8,
    /// State the machine sees this frame.
    held: bool,
    pressed: bool,
    released: bool,
    repeat_timer: u32,
    repeat_due: bool,
}

impl ButtonState {
    fn record(&mut self, down: bool) {
        if down == self.raw {
            return;
        }
        self.raw = down;
        self.pending += 1;
        if self.pending > MAX_PENDING {
            // Dropping a press/release pair keeps the queue alternating.
            self.pending -= 2;
        }
    }

    fn tick(&mut self) {
        self.pressed = false;
        self.released = false;
        if self.pending > 0 {
            self.pending -= 1;
            self.held = !self.held;
            if self.held {
                self.pressed = true;
                self.repeat_timer = 0;
            } else {
                self.released = true;
            }
        } else if self.repeat_due && self.held {
            self.pressed = true;
        }
        self.repeat_due = false;
    }

    fn repeat(&mut self) {
        if !self.held {
            self.repeat_timer = 0;
            return;
        }
        self.repeat_timer += 1;
        if self.repeat_timer >= REPEAT_DELAY
            && (self.repeat_timer - REPEAT_DELAY) % REPEAT_INTERVAL == 0
        {
            self.repeat_due = true;
        }
    }
}

/// Per-controller button state consumed once per frame.
#[derive(Debug, Clone, Default)]
pub struct InputManager {
    buttons: [[ButtonState; BUTTON_COUNT]; PLAYER_COUNT],
}

impl InputManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every button and timer.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Record the physical state of one button. Out-of-range controllers
    /// are ignored.
    pub fn manage_key(&mut self, controller: usize, button: Button, down: bool) {
        if let Some(buttons) = self.buttons.get_mut(controller) {
            buttons[button.index()].record(down);
        }
    }

    /// Advance one frame: release at most one queued transition per button
    /// and deliver any repeat edge scheduled by the previous frame.
    pub fn tick(&mut self) {
        for state in self.buttons.iter_mut().flatten() {
            state.tick();
        }
    }

    /// Count held frames and schedule repeat edges for the next [`tick`].
    ///
    /// [`tick`]: Self::tick
    pub fn manage_key_repeat(&mut self) {
        for state in self.buttons.iter_mut().flatten() {
            state.repeat();
        }
    }

    pub fn is_held(&self, controller: usize, button: Button) -> bool {
        self.state(controller, button).is_some_and(|s| s.held)
    }

    /// True on the frame a button goes down and on each repeat edge.
    pub fn is_pressed(&self, controller: usize, button: Button) -> bool {
        self.state(controller, button).is_some_and(|s| s.pressed)
    }

    pub fn is_released(&self, controller: usize, button: Button) -> bool {
        self.state(controller, button).is_some_and(|s| s.released)
    }

    /// Held buttons of a controller as a bitmask in [`Button`] order.
    pub fn held_mask(&self, controller: usize) -> u8 {
        Button::ALL
            .iter()
            .filter(|&&b| self.is_held(controller, b))
            .fold(0, |mask, &b| mask | 1 << b.index())
    }

    fn state(&self, controller: usize, button: Button) -> Option<&ButtonState> {
        self.buttons.get(controller).map(|b| &b[button.index()])
    }
}
