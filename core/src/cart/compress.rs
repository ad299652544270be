//! Decoding of the code region of a binary cartridge image.
//!
//! The region holds plain text, the legacy `:c:` compressed format, or the
//! PXA bit-stream format.

const LEGACY_HEADER: &[u8; 4] = b":c:\0";
const PXA_HEADER: &[u8; 4] = b"\0pxa";
const HEADER_SIZE: usize = 8;

/// Literal table for legacy codes 0x01..=0x3B.
const LEGACY_LUT: &[u8] = b"\n 0123456789abcdefghijklmnopqrstuvwxyz!#%(){}[]<>+=/*:;.,~_";

/// Largest unary prefix that still yields a move-to-front index below 256.
const MAX_UNARY: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompressionError {
    /// The stream ended before the declared length was produced.
    Truncated { produced: usize, expected: usize },
    /// A back reference points before the start of the output.
    BadReference { offset: usize, position: usize },
    /// A move-to-front literal index is out of range.
    BadLiteral { index: usize },
    /// The declared compressed size does not fit the code region.
    LengthMismatch { declared: usize, available: usize },
}

impl std::fmt::Display for CompressionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Truncated { produced, expected } => write!(
                f,
                "compressed code ended after {produced} of {expected} bytes"
            ),
            Self::BadReference { offset, position } => write!(
                f,
                "back reference {offset} bytes behind output position {position}"
            ),
            Self::BadLiteral { index } => write!(f, "literal index {index} out of range"),
            Self::LengthMismatch {
                declared,
                available,
            } => write!(
                f,
                "compressed size {declared} exceeds code region of {available} bytes"
            ),
        }
    }
}

impl std::error::Error for CompressionError {}

/// Decode a code region into program text.
///
/// Bytes map one-to-one onto chars so the machine's 8-bit charset survives.
pub fn decode_code(region: &[u8]) -> Result<String, CompressionError> {
    let bytes = if region.starts_with(LEGACY_HEADER) {
        decompress_legacy(region)?
    } else if region.starts_with(PXA_HEADER) {
        decompress_pxa(region)?
    } else {
        let end = region.iter().position(|&b| b == 0).unwrap_or(region.len());
        region[..end].to_vec()
    };
    Ok(bytes.iter().map(|&b| b as char).collect())
}

fn declared_length(region: &[u8], at: usize) -> Result<usize, CompressionError> {
    match region.get(at..at + 2) {
        Some(&[hi, lo]) => Ok(u16::from_be_bytes([hi, lo]) as usize),
        _ => Err(CompressionError::Truncated {
            produced: 0,
            expected: HEADER_SIZE,
        }),
    }
}

fn copy_back(out: &mut Vec<u8>, offset: usize, length: usize) -> Result<(), CompressionError> {
    if offset == 0 || offset > out.len() {
        return Err(CompressionError::BadReference {
            offset,
            position: out.len(),
        });
    }
    let start = out.len() - offset;
    for i in 0..length {
        out.push(out[start + i]);
    }
    Ok(())
}

fn decompress_legacy(region: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let expected = declared_length(region, 4)?;
    let mut out = Vec::with_capacity(expected);
    let mut input = region.iter().skip(HEADER_SIZE).copied();
    let truncated = |out: &Vec<u8>| CompressionError::Truncated {
        produced: out.len(),
        expected,
    };

    while out.len() < expected {
        let byte = input.next().ok_or_else(|| truncated(&out))?;
        match byte {
            0x00 => {
                let literal = input.next().ok_or_else(|| truncated(&out))?;
                out.push(literal);
            }
            0x01..=0x3B => out.push(LEGACY_LUT[(byte - 1) as usize]),
            _ => {
                let next = input.next().ok_or_else(|| truncated(&out))?;
                let offset = (byte - 0x3C) as usize * 16 + (next & 0x0F) as usize;
                let length = (next >> 4) as usize + 2;
                copy_back(&mut out, offset, length)?;
            }
        }
    }
    out.truncate(expected);
    Ok(out)
}

/// LSB-first bit reader over a byte slice.
struct BitReader<'a> {
    data: &'a [u8],
    bit: usize,
}

impl<'a> BitReader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, bit: 0 }
    }

    fn bit(&mut self) -> Option<u32> {
        let byte = *self.data.get(self.bit / 8)?;
        let value = (byte >> (self.bit % 8)) & 1;
        self.bit += 1;
        Some(value as u32)
    }

    fn bits(&mut self, count: u32) -> Option<u32> {
        let mut value = 0;
        for i in 0..count {
            value |= self.bit()? << i;
        }
        Some(value)
    }
}

fn decompress_pxa(region: &[u8]) -> Result<Vec<u8>, CompressionError> {
    let expected = declared_length(region, 4)?;
    let compressed = declared_length(region, 6)?;
    if compressed > region.len() || compressed < HEADER_SIZE {
        return Err(CompressionError::LengthMismatch {
            declared: compressed,
            available: region.len(),
        });
    }

    let mut reader = BitReader::new(&region[HEADER_SIZE..compressed]);
    let mut mtf: Vec<u8> = (0..=255).collect();
    let mut out = Vec::with_capacity(expected);

    while out.len() < expected {
        let produced = out.len();
        let truncated = || CompressionError::Truncated { produced, expected };

        if reader.bit().ok_or_else(truncated)? == 1 {
            let mut unary = 0;
            while reader.bit().ok_or_else(truncated)? == 1 {
                unary += 1;
                if unary > MAX_UNARY {
                    return Err(CompressionError::BadLiteral { index: usize::MAX });
                }
            }
            let index = reader.bits(4 + unary).ok_or_else(truncated)? as usize
                + (((1usize << unary) - 1) << 4);
            if index >= mtf.len() {
                return Err(CompressionError::BadLiteral { index });
            }
            let c = mtf.remove(index);
            mtf.insert(0, c);
            out.push(c);
        } else {
            let offset_bits = if reader.bit().ok_or_else(truncated)? == 1 {
                if reader.bit().ok_or_else(truncated)? == 1 { 5 } else { 10 }
            } else {
                15
            };
            let offset = reader.bits(offset_bits).ok_or_else(truncated)? as usize + 1;

            if offset_bits == 10 && offset == 1 {
                // Raw block, NUL terminated.
                loop {
                    let c = reader.bits(8).ok_or_else(truncated)? as u8;
                    if c == 0 {
                        break;
                    }
                    out.push(c);
                }
            } else {
                let mut length = 3;
                loop {
                    let part = reader.bits(3).ok_or_else(truncated)? as usize;
                    length += part;
                    if part != 7 {
                        break;
                    }
                }
                copy_back(&mut out, offset, length)?;
            }
        }
    }
    out.truncate(expected);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// LSB-first bit writer producing PXA streams for the decoder.
    #[derive(Default)]
    struct BitWriter {
        bytes: Vec<u8>,
        bit: usize,
    }

    impl BitWriter {
        fn bits(&mut self, value: u32, count: u32) {
            for i in 0..count {
                if self.bit % 8 == 0 {
                    self.bytes.push(0);
                }
                let last = self.bytes.len() - 1;
                self.bytes[last] |= (((value >> i) & 1) as u8) << (self.bit % 8);
                self.bit += 1;
            }
        }

        fn literal(&mut self, mtf: &mut Vec<u8>, c: u8) {
            let index = mtf.iter().position(|&m| m == c).unwrap();
            let c = mtf.remove(index);
            mtf.insert(0, c);

            self.bits(1, 1);
            let mut unary = 0u32;
            while index >= (((1usize << (unary + 1)) - 1) << 4) {
                unary += 1;
            }
            for _ in 0..unary {
                self.bits(1, 1);
            }
            self.bits(0, 1);
            let base = ((1usize << unary) - 1) << 4;
            self.bits((index - base) as u32, 4 + unary);
        }

        fn back_reference(&mut self, offset: u32, length: u32) {
            self.bits(0, 1);
            self.bits(1, 1);
            self.bits(1, 1); // 5-bit offset
            self.bits(offset - 1, 5);
            let mut rest = length - 3;
            loop {
                let part = rest.min(7);
                self.bits(part, 3);
                rest -= part;
                if part != 7 {
                    break;
                }
            }
        }

        fn raw_block(&mut self, data: &[u8]) {
            self.bits(0, 1);
            self.bits(1, 1);
            self.bits(0, 1); // 10-bit offset
            self.bits(0, 10);
            for &c in data {
                self.bits(c as u32, 8);
            }
            self.bits(0, 8);
        }

        fn into_region(self, decompressed: usize) -> Vec<u8> {
            let mut region = PXA_HEADER.to_vec();
            region.extend_from_slice(&(decompressed as u16).to_be_bytes());
            region.extend_from_slice(&((self.bytes.len() + HEADER_SIZE) as u16).to_be_bytes());
            region.extend(self.bytes);
            region
        }
    }

    fn legacy_region(length: u16, body: &[u8]) -> Vec<u8> {
        let mut region = LEGACY_HEADER.to_vec();
        region.extend_from_slice(&length.to_be_bytes());
        region.extend_from_slice(&[0, 0]);
        region.extend_from_slice(body);
        region
    }

    #[test]
    fn plain_text_stops_at_nul() {
        let region = b"print(1)\0garbage";
        assert_eq!(decode_code(region).unwrap(), "print(1)");
        assert_eq!(decode_code(b"").unwrap(), "");
    }

    #[test]
    fn high_bytes_map_to_chars() {
        assert_eq!(decode_code(&[0x41, 0x8B]).unwrap(), "A\u{8B}");
    }

    #[test]
    fn legacy_lut_has_59_entries() {
        assert_eq!(LEGACY_LUT.len(), 0x3B);
    }

    #[test]
    fn legacy_literals_and_table() {
        // 0x00 escapes a raw byte; 0x0D is LUT index 12 → 'a'.
        let region = legacy_region(3, &[0x00, b'X', 0x0D, 0x01]);
        assert_eq!(decode_code(&region).unwrap(), "Xa\n");
    }

    #[test]
    fn legacy_back_reference() {
        // "ab", then 0x3C 0x22: offset = 0 * 16 + 2, length = 2 + 2.
        let region = legacy_region(6, &[0x0D, 0x0E, 0x3C, 0x22]);
        assert_eq!(decode_code(&region).unwrap(), "ababab");
    }

    #[test]
    fn legacy_errors() {
        let truncated = legacy_region(10, &[0x0D]);
        assert!(matches!(
            decode_code(&truncated),
            Err(CompressionError::Truncated { produced: 1, expected: 10 })
        ));

        let bad_ref = legacy_region(4, &[0x0D, 0x3C, 0x25]);
        assert!(matches!(
            decode_code(&bad_ref),
            Err(CompressionError::BadReference { offset: 5, .. })
        ));
    }

    #[test]
    fn pxa_literals_and_back_reference() {
        let text = b"abcabcabc!";
        let mut mtf: Vec<u8> = (0..=255).collect();
        let mut w = BitWriter::default();
        for &c in b"abc" {
            w.literal(&mut mtf, c);
        }
        w.back_reference(3, 6);
        w.literal(&mut mtf, b'!');

        let region = w.into_region(text.len());
        assert_eq!(decode_code(&region).unwrap().as_bytes(), text);
    }

    #[test]
    fn pxa_long_back_reference_extends_length() {
        let mut mtf: Vec<u8> = (0..=255).collect();
        let mut w = BitWriter::default();
        w.literal(&mut mtf, b'z');
        w.back_reference(1, 20);
        let region = w.into_region(21);
        assert_eq!(decode_code(&region).unwrap(), "z".repeat(21));
    }

    #[test]
    fn pxa_raw_block() {
        let mut w = BitWriter::default();
        w.raw_block(b"raw!");
        let region = w.into_region(4);
        assert_eq!(decode_code(&region).unwrap(), "raw!");
    }

    #[test]
    fn pxa_errors() {
        let mut mtf: Vec<u8> = (0..=255).collect();
        let mut w = BitWriter::default();
        w.literal(&mut mtf, b'q');
        let region = w.into_region(5);
        assert!(matches!(
            decode_code(&region),
            Err(CompressionError::Truncated { produced: 1, expected: 5 })
        ));

        let mut w = BitWriter::default();
        w.back_reference(4, 3);
        let region = w.into_region(3);
        assert!(matches!(
            decode_code(&region),
            Err(CompressionError::BadReference { offset: 4, position: 0 })
        ));

        let mut region = BitWriter::default().into_region(0);
        region[6..8].copy_from_slice(&0x4000u16.to_be_bytes());
        assert!(matches!(
            decode_code(&region),
            Err(CompressionError::LengthMismatch { declared: 0x4000, .. })
        ));
    }
}
