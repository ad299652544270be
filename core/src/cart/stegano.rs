//! Cartridge bytes hidden in the low bits of a carrier image.
//!
//! Every RGBA pixel carries one payload byte: the two low bits of each
//! channel, assembled as `A<<6 | R<<4 | G<<2 | B`.

/// Bytes per RGBA pixel.
const PIXEL_SIZE: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SteganoError {
    /// The carrier holds no pixels.
    Empty,
    /// The RGBA buffer is not a whole number of pixels.
    Malformed { len: usize },
    /// The payload does not fit in the carrier.
    Capacity { payload: usize, capacity: usize },
}

impl std::fmt::Display for SteganoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "carrier image has no pixels"),
            Self::Malformed { len } => {
                write!(f, "carrier buffer of {len} bytes is not whole RGBA pixels")
            }
            Self::Capacity { payload, capacity } => write!(
                f,
                "payload of {payload} bytes exceeds carrier capacity of {capacity} bytes"
            ),
        }
    }
}

impl std::error::Error for SteganoError {}

/// Payload bytes a carrier of `rgba_len` bytes can hold.
pub fn capacity(rgba_len: usize) -> usize {
    rgba_len / PIXEL_SIZE
}

/// Recover one payload byte per pixel from a flat RGBA buffer.
pub fn extract(rgba: &[u8]) -> Result<Vec<u8>, SteganoError> {
    check_carrier(rgba)?;
    Ok(rgba
        .chunks_exact(PIXEL_SIZE)
        .map(|px| (px[3] & 3) << 6 | (px[0] & 3) << 4 | (px[1] & 3) << 2 | (px[2] & 3))
        .collect())
}

/// Hide `payload` in the first pixels of `rgba`, leaving the high six bits
/// of every channel and all later pixels untouched.
pub fn embed(payload: &[u8], rgba: &mut [u8]) -> Result<(), SteganoError> {
    check_carrier(rgba)?;
    let capacity = capacity(rgba.len());
    if payload.len() > capacity {
        return Err(SteganoError::Capacity {
            payload: payload.len(),
            capacity,
        });
    }
    for (&byte, px) in payload.iter().zip(rgba.chunks_exact_mut(PIXEL_SIZE)) {
        px[0] = (px[0] & !3) | (byte >> 4) & 3;
        px[1] = (px[1] & !3) | (byte >> 2) & 3;
        px[2] = (px[2] & !3) | byte & 3;
        px[3] = (px[3] & !3) | (byte >> 6) & 3;
    }
    Ok(())
}

fn check_carrier(rgba: &[u8]) -> Result<(), SteganoError> {
    if rgba.is_empty() {
        return Err(SteganoError::Empty);
    }
    if rgba.len() % PIXEL_SIZE != 0 {
        return Err(SteganoError::Malformed { len: rgba.len() });
    }
    Ok(())
}
