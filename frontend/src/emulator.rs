use nibble_core::audio::AudioBridge;
use nibble_core::console::Console;
use nibble_core::gfx::{ColorTable, FrameCompositor, Pixel, SCREEN_HEIGHT, SCREEN_WIDTH};
use nibble_core::pacer::FramePacer;
use sdl2::EventPump;
use sdl2::event::Event;
use sdl2::keyboard::Scancode;

use crate::audio;
use crate::config::Config;
use crate::input::KeyMap;
use crate::overlay;
use crate::video::{self, Video};

/// System palette index of the overlay text.
const OVERLAY_COLOR: usize = 7;

/// Open the window and audio device and run the loaded cartridge until the
/// player quits.
pub fn run(console: &mut Console, config: &Config, key_map: &KeyMap) -> Result<(), String> {
    let sdl_context = sdl2::init()?;
    let sdl_video = sdl_context.video()?;
    sdl_context.mouse().show_cursor(false);
    let mut video = Video::new(&sdl_video, "nibble", &config.video)?;
    let mut event_pump = sdl_context.event_pump()?;

    let sdl_audio = if config.audio.enabled {
        Some(sdl_context.audio()?)
    } else {
        log::info!("audio disabled");
        None
    };
    let audio = match &sdl_audio {
        Some(subsystem) => Some(audio::init(
            subsystem,
            AudioBridge::new(console.sound()),
            config.audio.buffer_samples,
        )?),
        None => None,
    };
    if let Some((device, _)) = &audio {
        device.resume();
    }

    let show_fps = config.video.show_fps;
    let result = match config.video.pixel_depth {
        32 => frames::<u32>(console, &mut video, &mut event_pump, key_map, video::argb8888, show_fps),
        _ => frames::<u16>(console, &mut video, &mut event_pump, key_map, video::rgb565, show_fps),
    };

    // Audio goes quiet and stops before the window is torn down.
    if let Some((device, fade_out)) = audio {
        fade_out.store(true, std::sync::atomic::Ordering::Relaxed);
        std::thread::sleep(audio::fade_out_duration());
        device.pause();
        log::debug!("audio paused");
    }
    drop(video);
    log::info!("shut down after {} frames", console.frame_counter());
    result
}

/// The paced loop: relay input, step, present, sleep.
fn frames<P: Pixel + bytemuck::Pod>(
    console: &mut Console,
    video: &mut Video,
    event_pump: &mut EventPump,
    key_map: &KeyMap,
    mapper: fn(u8, u8, u8) -> P,
    show_fps: bool,
) -> Result<(), String> {
    let compositor = FrameCompositor::new(ColorTable::new(mapper));
    let mut surface = vec![P::default(); SCREEN_WIDTH * SCREEN_HEIGHT];
    let mut pacer = FramePacer::new(console.frame_rate());
    log::info!("running at {} fps", pacer.rate().fps());

    'main: loop {
        pacer.begin_frame();

        for event in event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => break 'main,

                Event::KeyDown {
                    scancode: Some(Scancode::Escape),
                    ..
                } => break 'main,

                Event::KeyDown {
                    scancode: Some(sc),
                    repeat: false,
                    ..
                } => {
                    if let Some((controller, button)) = key_map.get(sc) {
                        console.input_mut().manage_key(controller, button, true);
                    }
                }

                Event::KeyUp {
                    scancode: Some(sc), ..
                } => {
                    if let Some((controller, button)) = key_map.get(sc) {
                        console.input_mut().manage_key(controller, button, false);
                    }
                }

                _ => {}
            }
        }

        console
            .step_frame(&compositor, &mut surface, SCREEN_WIDTH)
            .map_err(|e| e.to_string())?;

        if show_fps {
            let text = format!("{:.1}", pacer.measured_fps());
            overlay::draw_fps(&mut surface, SCREEN_WIDTH, &text, compositor.colors().get(OVERLAY_COLOR));
        }

        video.present(&surface)?;
        pacer.end_frame();
    }

    Ok(())
}
