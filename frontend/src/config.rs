//! Optional TOML configuration.
//!
//! Looked up at `$NIBBLE_CONFIG`, then `<config dir>/nibble/config.toml`.
//! Every key is optional; a missing file means defaults.

use std::path::PathBuf;

use nibble_core::gfx::{SCREEN_HEIGHT, SCREEN_WIDTH};
use nibble_core::input::PLAYER_COUNT;
use serde::Deserialize;

pub const CONFIG_ENV: &str = "NIBBLE_CONFIG";

#[derive(Debug)]
pub enum ConfigError {
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Read { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Parse { path, source } => write!(f, "invalid config {}: {source}", path.display()),
            Self::Invalid(msg) => write!(f, "invalid config: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Read { source, .. } => Some(source),
            Self::Parse { source, .. } => Some(source),
            Self::Invalid(_) => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub video: VideoConfig,
    pub audio: AudioConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VideoConfig {
    /// Window size; the 128x128 frame is scaled to fit.
    pub width: u32,
    pub height: u32,
    /// Bits per native pixel: 16 (RGB565) or 32 (ARGB8888).
    pub pixel_depth: u8,
    pub vsync: bool,
    pub show_fps: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            width: 320,
            height: 240,
            pixel_depth: 16,
            vsync: false,
            show_fps: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AudioConfig {
    pub enabled: bool,
    /// Samples per device callback.
    pub buffer_samples: u16,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            buffer_samples: nibble_core::audio::DEFAULT_BUFFER_SAMPLES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct InputConfig {
    /// Extra key bindings, added on top of the defaults.
    pub bindings: Vec<Binding>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Binding {
    /// SDL scancode name, e.g. `"Return"` or `"W"`.
    pub key: String,
    pub controller: usize,
    /// `left`, `right`, `up`, `down`, `o` or `x`.
    pub button: String,
}

impl Config {
    /// Parse and validate config text. `path` is only used in errors.
    pub fn from_toml(text: &str, path: PathBuf) -> Result<Self, ConfigError> {
        let config: Config =
            toml::from_str(text).map_err(|source| ConfigError::Parse { path, source })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let video = &self.video;
        if !matches!(video.pixel_depth, 16 | 32) {
            return Err(ConfigError::Invalid(format!(
                "pixel_depth must be 16 or 32, got {}",
                video.pixel_depth
            )));
        }
        if video.width < SCREEN_WIDTH as u32 || video.height < SCREEN_HEIGHT as u32 {
            return Err(ConfigError::Invalid(format!(
                "window {}x{} is smaller than {SCREEN_WIDTH}x{SCREEN_HEIGHT}",
                video.width, video.height
            )));
        }
        if self.audio.buffer_samples == 0 {
            return Err(ConfigError::Invalid("buffer_samples must be positive".into()));
        }
        if let Some(b) = self.input.bindings.iter().find(|b| b.controller >= PLAYER_COUNT) {
            return Err(ConfigError::Invalid(format!(
                "binding for {:?} names controller {}, only {PLAYER_COUNT} exist",
                b.key, b.controller
            )));
        }
        Ok(())
    }
}

/// Where the config file is looked for, if anywhere.
pub fn config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("nibble").join("config.toml"))
}

/// Load the config file, falling back to defaults when there is none.
pub fn load() -> Result<Config, ConfigError> {
    let Some(path) = config_path() else {
        log::debug!("no config directory, using defaults");
        return Ok(Config::default());
    };
    match std::fs::read_to_string(&path) {
        Ok(text) => {
            let config = Config::from_toml(&text, path.clone())?;
            log::info!("loaded config from {}", path.display());
            Ok(config)
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("no config at {}, using defaults", path.display());
            Ok(Config::default())
        }
        Err(source) => Err(ConfigError::Read { path, source }),
    }
}
