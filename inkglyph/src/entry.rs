//! The per-glyph table and the concatenated bitmap buffer a batch produces.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::metrics::{clamp_offset, truncate_u16, truncate_u8, Placement};

/// One row of the glyph table, in storage widths.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlyphEntry {
  pub codepoint: u16,
  pub advance_width: u16,
  pub bitmap_width: u8,
  pub bitmap_height: u8,
  pub x_offset: i8,
  pub y_offset: i8,
  pub encoded_length: u32,
  pub missing: bool,
  /// Codepoint, advance or a bitmap dimension did not fit and was masked to its low bits.
  #[serde(default)]
  pub truncated: bool,
}

impl GlyphEntry {
  /// Narrow raw values to storage widths: offsets saturate, the rest keep their low bits.
  pub fn new(ch: char, placement: Placement, width: usize, height: usize, encoded_length: usize) -> Self {
    let (codepoint, cp_lost) = truncate_u16(u64::from(u32::from(ch)));
    let (advance_width, adv_lost) = truncate_u16(placement.advance.max(0) as u64);
    let (bitmap_width, w_lost) = truncate_u8(width as u64);
    let (bitmap_height, h_lost) = truncate_u8(height as u64);
    let truncated = cp_lost || adv_lost || w_lost || h_lost;
    if truncated {
      warn!(
        "U+{:04X}: stored fields truncated (advance {}, bitmap {}x{})",
        u32::from(ch),
        placement.advance,
        width,
        height
      );
    }
    Self {
      codepoint,
      advance_width,
      bitmap_width,
      bitmap_height,
      x_offset: clamp_offset(placement.x_offset),
      y_offset: clamp_offset(placement.y_offset),
      encoded_length: encoded_length as u32,
      missing: false,
      truncated,
    }
  }

  /// Entry for a codepoint the font has no glyph for: nothing stored but the fallback `yo`.
  pub fn missing(ch: char, placement: Placement) -> Self {
    Self { missing: true, ..Self::new(ch, Placement { advance: 0, ..placement }, 0, 0, 0) }
  }
}

/// One conversion result: the table and the buffer whose slices it delimits.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BatchOutput {
  pub entries: Vec<GlyphEntry>,
  #[serde(skip)]
  pub bitmap: Vec<u8>,
  pub diagnostics: crate::batch::Diagnostics,
}

impl BatchOutput {
  pub fn push(&mut self, entry: GlyphEntry, bytes: &[u8]) {
    debug_assert_eq!(entry.encoded_length as usize, bytes.len());
    self.entries.push(entry);
    self.bitmap.extend_from_slice(bytes);
  }

  /// `(entry, encoded bytes)` in request order.
  pub fn glyphs(&self) -> impl Iterator<Item = (&GlyphEntry, &[u8])> + '_ {
    let mut offset = 0usize;
    self.entries.iter().map(move |e| {
      let len = e.encoded_length as usize;
      let bytes = &self.bitmap[offset..offset + len];
      offset += len;
      (e, bytes)
    })
  }

  pub fn missing_count(&self) -> usize {
    self.entries.iter().filter(|e| e.missing).count()
  }

  /// Drop every missing entry. They stored no bytes, so the buffer is unchanged.
  pub fn strip_missing(&mut self) -> usize {
    let before = self.entries.len();
    self.entries.retain(|e| !e.missing);
    before - self.entries.len()
  }

  /// `true` when the entry lengths add up to exactly the buffer.
  pub fn is_consistent(&self) -> bool {
    self.entries.iter().map(|e| e.encoded_length as usize).sum::<usize>() == self.bitmap.len()
  }
}
