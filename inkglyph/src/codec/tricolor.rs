//! White / gray / black levels with a prefix code: `0` → `0`, `1` → `10`, `2` → `11`.

use crate::bits::{BitReader, BitWriter};
use crate::error::DecodeError;
use crate::plane::GrayPlane;

pub const WHITE: u8 = 0;
pub const GRAY: u8 = 1;
pub const BLACK: u8 = 2;

/// `gray >= white` → white, else `gray >= gray_cutoff` → gray, else black.
///
/// The two cutoffs are applied in that order as given; nothing forces `gray_cutoff < white`.
pub fn quantize(region: &GrayPlane, white: u8, gray_cutoff: u8) -> Vec<u8> {
  region
    .as_slice()
    .iter()
    .map(|&g| {
      if g >= white {
        WHITE
      } else if g >= gray_cutoff {
        GRAY
      } else {
        BLACK
      }
    })
    .collect()
}

/// Majority vote over the 3×3 neighborhood (self included). A level seen fewer than twice is
/// replaced by the most frequent level; ties go to the lowest level.
pub fn denoise(levels: &[u8], w: usize, h: usize) -> Vec<u8> {
  let mut out = vec![0u8; levels.len()];
  for y in 0..h {
    for x in 0..w {
      let mut count = [0u8; 3];
      for yy in y.saturating_sub(1)..=(y + 1).min(h - 1) {
        for xx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
          count[levels[yy * w + xx].min(BLACK) as usize] += 1;
        }
      }
      let own = levels[y * w + x];
      out[y * w + x] = if count[own.min(BLACK) as usize] < 2 {
        let mut best = WHITE;
        for level in [GRAY, BLACK] {
          if count[level as usize] > count[best as usize] {
            best = level;
          }
        }
        best
      } else {
        own
      };
    }
  }
  out
}

pub fn encode(levels: &[u8]) -> Vec<u8> {
  let mut bits = BitWriter::new();
  for &level in levels {
    match level {
      WHITE => bits.push(false),
      GRAY => bits.push_bits(0b10, 2),
      _ => bits.push_bits(0b11, 2),
    }
  }
  bits.finish()
}

pub fn decode(bytes: &[u8], w: usize, h: usize) -> Result<Vec<u8>, DecodeError> {
  let expected = w * h;
  let mut bits = BitReader::new(bytes);
  let mut out = Vec::with_capacity(expected);
  let truncated = |decoded| DecodeError::Truncated { decoded, expected };
  while out.len() < expected {
    let level = match bits.read().ok_or_else(|| truncated(out.len()))? {
      false => WHITE,
      true => match bits.read().ok_or_else(|| truncated(out.len()))? {
        false => GRAY,
        true => BLACK,
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
  fn decodes_three_by_three_exactly() {
    let levels = [0, 0, 0, 1, 1, 1, 2, 2, 2];
    let bytes = encode(&levels);
    // 000 101010 111111 → 0001_0101 0111_1110 + padding
    assert_eq!(bytes, vec![0x15, 0x7E]);
    assert_eq!(decode(&bytes, 3, 3).unwrap(), levels);
  }

  #[test]
  fn thresholds_are_inclusive_at_cutoffs() {
    let region = GrayPlane::from_vec(5, 1, vec![200, 199, 120, 119, 0]).unwrap();
    assert_eq!(quantize(&region, 200, 120), vec![WHITE, GRAY, GRAY, BLACK, BLACK]);
  }

  #[test]
  fn inverted_cutoffs_are_not_reordered() {
    // gray cutoff above white: nothing can land on gray
    let region = GrayPlane::from_vec(3, 1, vec![255, 150, 50]).unwrap();
    assert_eq!(quantize(&region, 100, 200), vec![WHITE, WHITE, BLACK]);
  }

  #[test]
  fn denoise_replaces_isolated_levels() {
    #[rustfmt::skip]
    let levels = [
      0, 0, 0,
      0, 2, 0,
      0, 0, 0,
    ];
    assert_eq!(denoise(&levels, 3, 3), vec![0; 9]);
  }

  #[test]
  fn denoise_ties_go_to_lowest_level() {
    // every pixel sees {gray, white, black, black}; the lone white and gray flip to black
    let levels = [1, 0, 2, 2];
    let out = denoise(&levels, 2, 2);
    assert_eq!(out, vec![2, 2, 2, 2]);

    // one of each level plus nothing else: white wins the tie
    let levels = [0, 1, 2];
    assert_eq!(denoise(&levels, 3, 1), vec![0, 0, 1]);
  }

  #[test]
  fn truncated_stream_is_an_error() {
    assert_eq!(decode(&[0xFF], 5, 1), Err(DecodeError::Truncated { decoded: 4, expected: 5 }));
  }
}
