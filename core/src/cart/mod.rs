//! Cartridge ingestion: text cartridges, binary images, and images hidden
//! in the pixels of a PNG carrier.
//!
//! Parsing produces a [`Cartridge`] value first; the machine is only
//! touched once the whole cartridge has been read successfully.

pub mod carrier;
pub mod compress;
pub mod p8;
pub mod stegano;

use std::path::{Path, PathBuf};

use crate::console::Console;
use crate::machine::{ROM_SIZE, ScriptError};

pub use compress::CompressionError;
pub use p8::P8Error;
pub use stegano::SteganoError;

/// Offset of the code region in a binary cartridge image.
pub const CODE_OFFSET: usize = ROM_SIZE;
/// End of the code region (exclusive).
pub const CODE_END: usize = 0x8000;
/// Offset of the format version byte in a binary cartridge image.
pub const VERSION_OFFSET: usize = 0x8000;
/// Bytes of a full binary cartridge image, including the trailer.
pub const CART_DATA_SIZE: usize = 0x8020;
/// Smallest raw binary image accepted: the full memory image.
pub const MIN_BINARY_SIZE: usize = CODE_END;

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";
const UTF8_BOM: &[u8; 3] = b"\xEF\xBB\xBF";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum LoadError {
    /// The cartridge file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The carrier image is not a valid PNG.
    Image(png::DecodingError),
    /// The carrier image decoded to a layout we cannot extract from.
    UnsupportedImage(String),
    /// A raw binary image is not the size of a cartridge image.
    BadImageSize { len: usize },
    Stegano(SteganoError),
    Format(P8Error),
    Compression(CompressionError),
    Script(ScriptError),
}

impl std::fmt::Display for LoadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io { path, source } => write!(f, "cannot read {}: {source}", path.display()),
            Self::Image(e) => write!(f, "invalid carrier image: {e}"),
            Self::UnsupportedImage(what) => write!(f, "unsupported carrier image: {what}"),
            Self::BadImageSize { len } => write!(
                f,
                "binary image of {len} bytes, expected {MIN_BINARY_SIZE} to {CART_DATA_SIZE}"
            ),
            Self::Stegano(e) => write!(f, "cannot extract cartridge: {e}"),
            Self::Format(e) => write!(f, "malformed cartridge: {e}"),
            Self::Compression(e) => write!(f, "malformed cartridge code: {e}"),
            Self::Script(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Image(e) => Some(e),
            Self::UnsupportedImage(_) | Self::BadImageSize { .. } => None,
            Self::Stegano(e) => Some(e),
            Self::Format(e) => Some(e),
            Self::Compression(e) => Some(e),
            Self::Script(e) => Some(e),
        }
    }
}

impl From<png::DecodingError> for LoadError {
    fn from(e: png::DecodingError) -> Self {
        Self::Image(e)
    }
}

impl From<SteganoError> for LoadError {
    fn from(e: SteganoError) -> Self {
        Self::Stegano(e)
    }
}

impl From<P8Error> for LoadError {
    fn from(e: P8Error) -> Self {
        Self::Format(e)
    }
}

impl From<CompressionError> for LoadError {
    fn from(e: CompressionError) -> Self {
        Self::Compression(e)
    }
}

impl From<ScriptError> for LoadError {
    fn from(e: ScriptError) -> Self {
        Self::Script(e)
    }
}

// ---------------------------------------------------------------------------
// Cartridge
// ---------------------------------------------------------------------------

/// A parsed cartridge, ready to install.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cartridge {
    /// Initial contents of memory `0..ROM_SIZE`.
    pub rom: Vec<u8>,
    /// Program source.
    pub code: String,
    pub version: Option<u8>,
    /// 128x128 system-color indices, when the cartridge carries a label.
    pub label: Option<Vec<u8>>,
}

impl Cartridge {
    /// Build a cartridge from a binary image laid out like memory: ROM data,
    /// then the code region, then the version byte. Short images are padded
    /// with zeros.
    pub fn from_image(image: &[u8]) -> Result<Self, CompressionError> {
        let mut rom = vec![0u8; ROM_SIZE];
        let rom_len = image.len().min(ROM_SIZE);
        rom[..rom_len].copy_from_slice(&image[..rom_len]);

        let code_region = image
            .get(CODE_OFFSET..image.len().min(CODE_END))
            .unwrap_or_default();
        let code = compress::decode_code(code_region)?;

        Ok(Self {
            rom,
            code,
            version: image.get(VERSION_OFFSET).copied(),
            label: None,
        })
    }
}

/// How a cartridge file is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartridgeKind {
    /// PNG whose pixels carry the binary image.
    Carrier,
    /// `.p8` text.
    Text,
    /// Raw binary image.
    Binary,
}

impl CartridgeKind {
    pub fn detect(path: &Path, bytes: &[u8]) -> Self {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match extension.as_deref() {
            Some("png") => Self::Carrier,
            Some("p8") => Self::Text,
            _ if bytes.starts_with(PNG_SIGNATURE) => Self::Carrier,
            _ if bytes
                .strip_prefix(UTF8_BOM)
                .unwrap_or(bytes)
                .starts_with(b"pico-8 cartridge") =>
            {
                Self::Text
            }
            _ => Self::Binary,
        }
    }
}

// ---------------------------------------------------------------------------
// Loader
// ---------------------------------------------------------------------------

/// Reads cartridges from storage and boots them on a [`Console`].
#[derive(Debug, Default, Clone, Copy)]
pub struct CartridgeLoader;

impl CartridgeLoader {
    pub fn new() -> Self {
        Self
    }

    /// Read and parse a cartridge without touching any machine state.
    pub fn read(&self, path: &Path) -> Result<Cartridge, LoadError> {
        let bytes = std::fs::read(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse(path, &bytes)
    }

    /// Parse cartridge bytes; `path` only guides format detection.
    pub fn parse(&self, path: &Path, bytes: &[u8]) -> Result<Cartridge, LoadError> {
        let kind = CartridgeKind::detect(path, bytes);
        log::debug!("{} is a {kind:?} cartridge", path.display());
        match kind {
            CartridgeKind::Carrier => {
                let image = carrier::decode_png(bytes)?;
                log::debug!("carrier image is {}x{}", image.width, image.height);
                let mut payload = stegano::extract(&image.pixels)?;
                payload.truncate(CART_DATA_SIZE);
                Ok(Cartridge::from_image(&payload)?)
            }
            CartridgeKind::Text => Ok(p8::decode(bytes)?),
            CartridgeKind::Binary => {
                if !(MIN_BINARY_SIZE..=CART_DATA_SIZE).contains(&bytes.len()) {
                    return Err(LoadError::BadImageSize { len: bytes.len() });
                }
                Ok(Cartridge::from_image(bytes)?)
            }
        }
    }

    /// Load the cartridge at `path` and boot it.
    ///
    /// On failure the console is left exactly as it was.
    pub fn load(&self, path: &Path, console: &mut Console) -> Result<(), LoadError> {
        let cartridge = self.read(path)?;
        self.install(&cartridge, console)?;
        log::info!("loaded cartridge {}", path.display());
        Ok(())
    }

    /// Install a parsed cartridge: copy it into memory, snapshot it, run the
    /// program's init hook to completion, then reset input, sound and the
    /// frame counter.
    pub fn install(&self, cartridge: &Cartridge, console: &mut Console) -> Result<(), LoadError> {
        console.machine_mut().install(cartridge)?;
        console.machine_mut().memory_mut().backup_cartridge();

        if console.machine().code().has_init() {
            log::info!("cartridge has _init(), calling it");
            console.run_init();
            log::info!("_init() completed");
        }

        console.input_mut().reset();
        console.machine_mut().init_sound();
        console.reset_frame_counter();
        Ok(())
    }
}
