use std::time::Duration;

use nibble_core::console::Console;
use nibble_core::gfx::{ColorTable, FrameCompositor, SCREEN_HEIGHT, SCREEN_WIDTH};
use nibble_core::pacer::{FramePacer, FrameRate};
mod common;
use common::ManualClock;

#[test]
fn hundred_frames_at_thirty_fps_take_at_least_the_budget() {
    let clock = ManualClock::new();
    let mut pacer = FramePacer::with_clock(FrameRate::Thirty, clock.clone());
    let mut console = Console::default();
    let compositor = FrameCompositor::new(ColorTable::new(|r, _, _| r));
    let mut surface = vec![0u8; SCREEN_WIDTH * SCREEN_HEIGHT];

    for _ in 0..100 {
        pacer.begin_frame();
        console.step_frame(&compositor, &mut surface, SCREEN_WIDTH).unwrap();
        pacer.end_frame();
    }

    assert!(clock.elapsed() >= Duration::from_millis(3333), "{:?}", clock.elapsed());
    assert_eq!(console.frame_counter(), 100);
}

#[test]
fn slow_frames_never_sleep_negative_or_catch_up() {
    let clock = ManualClock::new();
    let mut pacer = FramePacer::with_clock(FrameRate::Thirty, clock.clone());
    let budget = FrameRate::Thirty.budget();

    for _ in 0..10 {
        pacer.begin_frame();
        clock.advance(budget * 2);
        let timing = pacer.end_frame();
        assert!(timing.overrun);
        assert_eq!(timing.slept, Duration::ZERO);
    }
    assert_eq!(clock.slept.get(), Duration::ZERO);

    // Back to fast frames: each sleeps a full budget, no shortened frames.
    pacer.begin_frame();
    assert_eq!(pacer.end_frame().slept, budget);
}

#[test]
fn sixty_fps_cartridge_halves_the_budget() {
    let clock = ManualClock::new();
    let mut pacer = FramePacer::with_clock(FrameRate::Sixty, clock.clone());
    for _ in 0..60 {
        pacer.begin_frame();
        pacer.end_frame();
    }
    let elapsed = clock.elapsed();
    assert!(elapsed >= Duration::from_millis(999) && elapsed <= Duration::from_secs(1));
}
