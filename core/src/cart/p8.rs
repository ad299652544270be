//! Parser for the textual `.p8` cartridge format.

use super::Cartridge;
use crate::machine::ROM_SIZE;
use crate::machine::memory::address;
use crate::machine::sound::{NOTES_PER_SFX, SFX_COUNT, SFX_RECORD_SIZE};

const HEADER: &str = "pico-8 cartridge";
const BOM: char = '\u{feff}';

const GFX_ROWS: usize = 128;
const GFX_ROW_DIGITS: usize = 128;
const GFF_ROWS: usize = 2;
const MAP_ROWS: usize = 32;
const WIDE_ROW_DIGITS: usize = 256;
const SFX_ROW_DIGITS: usize = 8 + NOTES_PER_SFX * 5;
const MUSIC_ROWS: usize = 64;
const LABEL_SIZE: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum P8ErrorKind {
    /// The file is not valid UTF-8.
    InvalidText,
    MissingHeader,
    InvalidDigit(char),
    RowTooLong { len: usize, max: usize },
    RowLength { len: usize, expected: usize },
    TooManyRows { section: &'static str, max: usize },
    UnknownSection(String),
}

/// A `.p8` parse failure at a 1-based line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct P8Error {
    pub line: usize,
    pub kind: P8ErrorKind,
}

impl std::fmt::Display for P8Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "line {}: ", self.line)?;
        match &self.kind {
            P8ErrorKind::InvalidText => write!(f, "not valid UTF-8 text"),
            P8ErrorKind::MissingHeader => write!(f, "missing \"{HEADER}\" header"),
            P8ErrorKind::InvalidDigit(c) => write!(f, "invalid digit {c:?}"),
            P8ErrorKind::RowTooLong { len, max } => {
                write!(f, "row of {len} digits exceeds {max}")
            }
            P8ErrorKind::RowLength { len, expected } => {
                write!(f, "row of {len} digits, expected {expected}")
            }
            P8ErrorKind::TooManyRows { section, max } => {
                write!(f, "more than {max} rows in __{section}__")
            }
            P8ErrorKind::UnknownSection(name) => write!(f, "unknown section {name}"),
        }
    }
}

impl std::error::Error for P8Error {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Lua,
    Gfx,
    Gff,
    Map,
    Sfx,
    Music,
    Label,
    Ignored,
}

impl Section {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "lua" => Self::Lua,
            "gfx" => Self::Gfx,
            "gff" => Self::Gff,
            "map" => Self::Map,
            "sfx" => Self::Sfx,
            "music" => Self::Music,
            "label" => Self::Label,
            _ if name.starts_with("meta:") => Self::Ignored,
            _ => return None,
        })
    }

    fn name(self) -> &'static str {
        match self {
            Self::Preamble => "preamble",
            Self::Lua => "lua",
            Self::Gfx => "gfx",
            Self::Gff => "gff",
            Self::Map => "map",
            Self::Sfx => "sfx",
            Self::Music => "music",
            Self::Label => "label",
            Self::Ignored => "meta",
        }
    }

    fn max_rows(self) -> usize {
        match self {
            Self::Gfx | Self::Label => GFX_ROWS,
            Self::Gff => GFF_ROWS,
            Self::Map => MAP_ROWS,
            Self::Sfx => SFX_COUNT,
            Self::Music => MUSIC_ROWS,
            Self::Preamble | Self::Lua | Self::Ignored => usize::MAX,
        }
    }
}

/// Parse the raw contents of a `.p8` file, which must be UTF-8.
pub fn decode(bytes: &[u8]) -> Result<Cartridge, P8Error> {
    let text = std::str::from_utf8(bytes).map_err(|e| P8Error {
        line: bytes[..e.valid_up_to()].iter().filter(|&&b| b == b'\n').count() + 1,
        kind: P8ErrorKind::InvalidText,
    })?;
    parse(text)
}

/// Parse a `.p8` text cartridge.
pub fn parse(text: &str) -> Result<Cartridge, P8Error> {
    let mut lines = text.lines().enumerate().map(|(i, l)| (i + 1, l));
    match lines.next() {
        Some((_, first)) if first.trim_start_matches(BOM).starts_with(HEADER) => {}
        _ => {
            return Err(P8Error {
                line: 1,
                kind: P8ErrorKind::MissingHeader,
            });
        }
    }

    let mut rom = vec![0u8; ROM_SIZE];
    let mut code = String::new();
    let mut version = None;
    let mut label: Option<Vec<u8>> = None;
    let mut section = Section::Preamble;
    let mut row = 0;

    for (line_no, line) in lines {
        let err = |kind| P8Error {
            line: line_no,
            kind,
        };

        if let Some(name) = section_name(line) {
            section = Section::parse(name)
                .ok_or_else(|| err(P8ErrorKind::UnknownSection(line.trim().to_string())))?;
            row = 0;
            if section == Section::Label {
                label = Some(vec![0; LABEL_SIZE * LABEL_SIZE]);
            }
            continue;
        }

        match section {
            Section::Preamble => {
                if let Some(v) = line.trim().strip_prefix("version ") {
                    version = v.trim().parse().ok();
                }
                continue;
            }
            Section::Lua => {
                code.push_str(line);
                code.push('\n');
                continue;
            }
            Section::Ignored => continue,
            _ => {}
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if row >= section.max_rows() {
            return Err(err(P8ErrorKind::TooManyRows {
                section: section.name(),
                max: section.max_rows(),
            }));
        }

        let parsed = match section {
            Section::Gfx => {
                let base = address::GFX + row * GFX_ROW_DIGITS / 2;
                parse_pixels(line, GFX_ROW_DIGITS, &mut rom[base..base + GFX_ROW_DIGITS / 2])
            }
            Section::Gff => {
                let base = address::GFX_FLAGS + row * WIDE_ROW_DIGITS / 2;
                parse_bytes(line, WIDE_ROW_DIGITS, &mut rom[base..base + WIDE_ROW_DIGITS / 2])
            }
            Section::Map => {
                let base = address::MAP + row * WIDE_ROW_DIGITS / 2;
                parse_bytes(line, WIDE_ROW_DIGITS, &mut rom[base..base + WIDE_ROW_DIGITS / 2])
            }
            Section::Sfx => {
                let base = address::SFX + row * SFX_RECORD_SIZE;
                parse_sfx(line, &mut rom[base..base + SFX_RECORD_SIZE])
            }
            Section::Music => {
                let base = address::MUSIC + row * 4;
                parse_music(line, &mut rom[base..base + 4])
            }
            Section::Label => match label.as_mut() {
                Some(pixels) => {
                    let base = row * LABEL_SIZE;
                    parse_label(line, &mut pixels[base..base + LABEL_SIZE])
                }
                None => Ok(()),
            },
            Section::Preamble | Section::Lua | Section::Ignored => Ok(()),
        };
        parsed.map_err(err)?;
        row += 1;
    }

    Ok(Cartridge {
        rom,
        code,
        version,
        label,
    })
}

fn section_name(line: &str) -> Option<&str> {
    let line = line.trim_end();
    line.strip_prefix("__")?
        .strip_suffix("__")
        .filter(|name| !name.is_empty())
}

fn digit(c: char, radix: u32) -> Result<u8, P8ErrorKind> {
    c.to_digit(radix)
        .map(|d| d as u8)
        .ok_or(P8ErrorKind::InvalidDigit(c))
}

fn check_len(line: &str, max: usize) -> Result<(), P8ErrorKind> {
    if line.len() > max {
        return Err(P8ErrorKind::RowTooLong {
            len: line.len(),
            max,
        });
    }
    Ok(())
}

/// One hex digit per pixel; the left pixel of a pair is the low nibble.
fn parse_pixels(line: &str, max: usize, out: &mut [u8]) -> Result<(), P8ErrorKind> {
    check_len(line, max)?;
    for (i, c) in line.chars().enumerate() {
        let value = digit(c, 16)?;
        out[i / 2] |= if i % 2 == 0 { value } else { value << 4 };
    }
    Ok(())
}

/// Two hex digits per byte, high nibble first.
fn parse_bytes(line: &str, max: usize, out: &mut [u8]) -> Result<(), P8ErrorKind> {
    check_len(line, max)?;
    for (i, c) in line.chars().enumerate() {
        let value = digit(c, 16)?;
        out[i / 2] |= if i % 2 == 0 { value << 4 } else { value };
    }
    Ok(())
}

fn hex_byte(digits: &[u8]) -> Result<u8, P8ErrorKind> {
    let mut value = 0;
    for &d in digits {
        value = value << 4 | digit(d as char, 16)?;
    }
    Ok(value)
}

/// Header bytes (editor mode, speed, loop start, loop end), then 32 notes of
/// pitch (2 digits), waveform, volume and effect.
fn parse_sfx(line: &str, out: &mut [u8]) -> Result<(), P8ErrorKind> {
    if line.len() != SFX_ROW_DIGITS || !line.is_ascii() {
        return Err(P8ErrorKind::RowLength {
            len: line.len(),
            expected: SFX_ROW_DIGITS,
        });
    }
    let digits = line.as_bytes();
    for (i, byte) in out[64..68].iter_mut().enumerate() {
        *byte = hex_byte(&digits[i * 2..i * 2 + 2])?;
    }
    for (n, note) in digits[8..].chunks_exact(5).enumerate() {
        let pitch = hex_byte(&note[0..2])? as u16;
        let waveform = hex_byte(&note[2..3])? as u16;
        let volume = hex_byte(&note[3..4])? as u16;
        let effect = hex_byte(&note[4..5])? as u16;
        let word = (pitch & 0x3F)
            | (waveform & 0x07) << 6
            | (volume & 0x07) << 9
            | (effect & 0x07) << 12
            | (waveform & 0x08) << 12;
        out[n * 2..n * 2 + 2].copy_from_slice(&word.to_le_bytes());
    }
    Ok(())
}

/// `ff 01020304`: loop/stop flags, then four channel bytes. Flag bit `i`
/// lands in bit 7 of channel `i`.
fn parse_music(line: &str, out: &mut [u8]) -> Result<(), P8ErrorKind> {
    let compact: String = line.split_whitespace().collect();
    if compact.len() != 10 || !compact.is_ascii() {
        return Err(P8ErrorKind::RowLength {
            len: compact.len(),
            expected: 10,
        });
    }
    let digits = compact.as_bytes();
    let flags = hex_byte(&digits[0..2])?;
    for (i, byte) in out.iter_mut().enumerate() {
        let channel = hex_byte(&digits[2 + i * 2..4 + i * 2])?;
        *byte = channel | ((flags >> i) & 1) << 7;
    }
    Ok(())
}

/// Label pixels use base-32 digits so extended colors are representable.
fn parse_label(line: &str, out: &mut [u8]) -> Result<(), P8ErrorKind> {
    check_len(line, LABEL_SIZE)?;
    for (pixel, c) in out.iter_mut().zip(line.chars()) {
        *pixel = digit(c, 32)?;
    }
    Ok(())
}
