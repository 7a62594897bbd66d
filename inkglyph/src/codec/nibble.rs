//! 16 gray levels over inverted grayscale (`255 - red`), prefix coded.
//!
//! Level 15 is background and level 0 full ink. Codes: `15` → `0`, `0` → `10`, anything else →
//! `11` followed by the 4-bit level.

use crate::bits::{BitReader, BitWriter};
use crate::error::DecodeError;
use crate::plane::GrayPlane;

pub const BACKGROUND: u8 = 15;
pub const INK: u8 = 0;

/// `value < white` → 15, `value > black` → 0, otherwise `(black - value) / 14` clamped to 0..=15.
#[inline]
pub fn quantize_value(value: u8, white: u8, black: u8) -> u8 {
  if value < white {
    BACKGROUND
  } else if value > black {
    INK
  } else {
    ((i32::from(black) - i32::from(value)).div_euclid(14)).clamp(0, 15) as u8
  }
}

pub fn quantize(region: &GrayPlane, white: u8, black: u8) -> Vec<u8> {
  region.as_slice().iter().map(|&v| quantize_value(v, white, black)).collect()
}

pub fn encode(levels: &[u8]) -> Vec<u8> {
  let mut bits = BitWriter::new();
  for &level in levels {
    match level {
      BACKGROUND => bits.push(false),
      INK => bits.push_bits(0b10, 2),
      v => {
        bits.push_bits(0b11, 2);
        bits.push_bits(u32::from(v & 0x0F), 4);
      }
    }
  }
  bits.finish()
}

pub fn decode(bytes: &[u8], w: usize, h: usize) -> Result<Vec<u8>, DecodeError> {
  let expected = w * h;
  let mut bits = BitReader::new(bytes);
  let mut out = Vec::with_capacity(expected);
  while out.len() < expected {
    let truncated = DecodeError::Truncated { decoded: out.len(), expected };
    let level = match bits.read().ok_or(truncated)? {
      false => BACKGROUND,
      true => match bits.read().ok_or(truncated)? {
        false => INK,
        true => bits.read_bits(4).ok_or(truncated)? as u8,
      },
    };
    out.push(level);
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn encodes_documented_sample() {
    assert_eq!(encode(&[15, 0, 7]), vec![0x5B, 0x80]);
    assert_eq!(decode(&[0x5B, 0x80], 3, 1).unwrap(), vec![15, 0, 7]);
  }

  #[test]
  fn quantize_boundaries() {
    let (white, black) = (32, 223);
    assert_eq!(quantize_value(31, white, black), 15);
    assert_eq!(quantize_value(32, white, black), 13);
    assert_eq!(quantize_value(223, white, black), 0);
    assert_eq!(quantize_value(224, white, black), 0);
    assert_eq!(quantize_value(209, white, black), 1);
    assert_eq!(quantize_value(210, white, black), 0);
  }

  #[test]
  fn mid_levels_never_exceed_fifteen() {
    // a wide window would exceed 15 without the clamp
    assert_eq!(quantize_value(0, 0, 239), 15);
  }

  #[test]
  fn truncated_escape_is_an_error() {
    // six background pixels, then `11` with no level bits left
    assert_eq!(decode(&[0b0000_0011], 9, 1), Err(DecodeError::Truncated { decoded: 6, expected: 9 }));
    assert_eq!(decode(&[], 1, 1), Err(DecodeError::Truncated { decoded: 0, expected: 1 }));
  }
}
