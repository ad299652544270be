use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use nibble_core::cart::CartridgeLoader;
use nibble_core::console::Console;

mod audio;
mod config;
mod emulator;
mod input;
mod overlay;
mod video;

#[derive(Parser)]
#[command(name = "nibble", version, about = "Runs a fantasy console cartridge")]
struct Args {
    /// Cartridge to run: a `.p8` text file, a `.png` carrier image or a
    /// raw binary image
    cartridge: PathBuf,
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let config = match config::load() {
        Ok(config) => config,
        Err(e) => {
            log::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let mut key_map = input::default_key_map();
    if let Err(e) = key_map.apply(&config.input.bindings) {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    let mut console = Console::default();
    if let Err(e) = CartridgeLoader::new().load(&args.cartridge, &mut console) {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }

    if let Err(e) = emulator::run(&mut console, &config, &key_map) {
        log::error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
