//! 1 bit per pixel with inverted packing: a stored `0` bit is ink.
//!
//! Rows are packed MSB-first and padded to whole bytes. After packing, every byte is inverted and
//! the unused trailing bits of each row's last byte are cleared again.

use crate::error::DecodeError;
use crate::plane::GrayPlane;

/// Ink (`1`) where `gray < white`.
pub fn quantize(region: &GrayPlane, white: u8) -> Vec<u8> {
  region.as_slice().iter().map(|&g| (g < white) as u8).collect()
}

fn neighborhood_sum(bin: &[u8], w: usize, h: usize, x: usize, y: usize) -> u8 {
  let mut sum = 0;
  for yy in y.saturating_sub(1)..=(y + 1).min(h - 1) {
    for xx in x.saturating_sub(1)..=(x + 1).min(w - 1) {
      sum += bin[yy * w + xx];
    }
  }
  sum
}

/// One conservative cleanup pass over the 3×3 neighborhood sum (self included): ink survives only
/// with sum ≥ 2, blank turns into ink only with sum ≥ 7.
pub fn cleanup_pass(bin: &[u8], w: usize, h: usize) -> Vec<u8> {
  let mut out = vec![0u8; bin.len()];
  for y in 0..h {
    for x in 0..w {
      let sum = neighborhood_sum(bin, w, h, x, y);
      let i = y * w + x;
      out[i] = if bin[i] != 0 { (sum >= 2) as u8 } else { (sum >= 7) as u8 };
    }
  }
  out
}

/// Any pixel 8-adjacent to ink becomes ink.
pub fn dilate(bin: &[u8], w: usize, h: usize) -> Vec<u8> {
  let mut out = vec![0u8; bin.len()];
  for y in 0..h {
    for x in 0..w {
      out[y * w + x] = (neighborhood_sum(bin, w, h, x, y) > 0) as u8;
    }
  }
  out
}

#[inline]
pub fn row_bytes(width: usize) -> usize {
  width.div_ceil(8)
}

/// Mask selecting the meaningful bits of a row's last byte.
#[inline]
fn last_byte_mask(width: usize) -> u8 {
  match width % 8 {
    0 => 0xFF,
    bits => (((1u16 << bits) - 1) << (8 - bits)) as u8,
  }
}

pub fn pack(bin: &[u8], w: usize, h: usize) -> Vec<u8> {
  let stride = row_bytes(w);
  let mut out = vec![0u8; stride * h];
  for y in 0..h {
    for x in 0..w {
      if bin[y * w + x] != 0 {
        out[y * stride + x / 8] |= 0x80 >> (x % 8);
      }
    }
  }
  let mask = last_byte_mask(w);
  for row in out.chunks_exact_mut(stride.max(1)) {
    let last = row.len() - 1;
    for (i, b) in row.iter_mut().enumerate() {
      *b = !*b & if i == last { mask } else { 0xFF };
    }
  }
  out
}

/// Levels per pixel: `1` for ink, `0` for background.
pub fn decode(bytes: &[u8], w: usize, h: usize) -> Result<Vec<u8>, DecodeError> {
  let stride = row_bytes(w);
  let expected = stride * h;
  if bytes.len() != expected {
    return Err(DecodeError::Length { expected, got: bytes.len() });
  }
  let mut out = Vec::with_capacity(w * h);
  for y in 0..h {
    for x in 0..w {
      let bit = bytes[y * stride + x / 8] & (0x80 >> (x % 8));
      out.push((bit == 0) as u8);
    }
  }
  Ok(out)
}
