#![allow(dead_code)]

use std::cell::Cell;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use nibble_core::cart::stegano;
use nibble_core::machine::{Code, DeclaredHooks, ScriptError, Vm};
use nibble_core::pacer::Clock;

/// A path in the temp dir unique to this test process.
pub fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("nibble-{}-{name}", std::process::id()))
}

/// Encode `payload` into a `width`x`height` RGBA PNG carrier.
pub fn carrier_png(payload: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut rgba = vec![0x80u8; (width * height * 4) as usize];
    stegano::embed(payload, &mut rgba).unwrap();

    let mut bytes = Vec::new();
    let mut encoder = png::Encoder::new(&mut bytes, width, height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let mut writer = encoder.write_header().unwrap();
    writer.write_image_data(&rgba).unwrap();
    writer.finish().unwrap();
    bytes
}

/// Program whose hooks log their calls; declarations come from the source.
pub struct Recorder {
    hooks: DeclaredHooks,
    pub calls: Arc<Mutex<Vec<&'static str>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self {
            hooks: DeclaredHooks::new(),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }
}

impl Code for Recorder {
    fn load(&mut self, source: &str) -> Result<(), ScriptError> {
        self.hooks.load(source)
    }

    fn has_init(&self) -> bool {
        self.hooks.has_init()
    }

    fn init(&mut self, _vm: &mut Vm<'_>) {
        self.calls.lock().unwrap().push("init");
    }

    fn update(&mut self, _vm: &mut Vm<'_>) {
        self.calls.lock().unwrap().push("update");
    }

    fn draw(&mut self, _vm: &mut Vm<'_>) {
        self.calls.lock().unwrap().push("draw");
    }

    fn require_60fps(&self) -> bool {
        self.hooks.require_60fps()
    }
}

/// Clock that only moves when slept on or advanced by hand.
#[derive(Clone)]
pub struct ManualClock {
    start: Instant,
    elapsed: Rc<Cell<Duration>>,
    pub slept: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            elapsed: Rc::new(Cell::new(Duration::ZERO)),
            slept: Rc::new(Cell::new(Duration::ZERO)),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.elapsed.set(self.elapsed.get() + by);
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed.get()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed.get()
    }

    fn sleep(&mut self, duration: Duration) {
        self.slept.set(self.slept.get() + duration);
        self.advance(duration);
    }
}
