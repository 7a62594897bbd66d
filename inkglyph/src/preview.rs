//! Decoded previews of a batch: single glyphs, a contact sheet, and a line of text laid out with
//! the firmware's placement arithmetic.

use std::collections::HashMap;

use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, GrayImage, ImageEncoder as _, Luma};

use crate::codec;
use crate::entry::{BatchOutput, GlyphEntry};
use crate::error::Result;
use crate::options::FirmwareMode;

/// Decode one glyph into an L8 image (`bitmap_width × bitmap_height`).
pub fn glyph_image(mode: FirmwareMode, entry: &GlyphEntry, bytes: &[u8]) -> Result<GrayImage> {
  let (w, h) = (u32::from(entry.bitmap_width), u32::from(entry.bitmap_height));
  let levels = codec::decode(mode, bytes, w as usize, h as usize)?;
  let pixels = levels.into_iter().map(|l| mode.level_to_gray(l)).collect();
  // the decoders always yield exactly w*h levels
  Ok(GrayImage::from_raw(w, h, pixels).unwrap_or_else(|| GrayImage::new(w, h)))
}

/// Darkest-wins blit so neighbouring glyphs never erase each other.
fn blit(dst: &mut GrayImage, src: &GrayImage, x: i64, y: i64) {
  for (sx, sy, px) in src.enumerate_pixels() {
    let (dx, dy) = (x + i64::from(sx), y + i64::from(sy));
    if dx < 0 || dy < 0 || dx >= i64::from(dst.width()) || dy >= i64::from(dst.height()) {
      continue;
    }
    let d = dst.get_pixel_mut(dx as u32, dy as u32);
    d.0[0] = d.0[0].min(px.0[0]);
  }
}

/// Every stored glyph in a grid, `columns` per row, each in a cell sized for the largest bitmap.
pub fn contact_sheet(out: &BatchOutput, mode: FirmwareMode, columns: u32) -> Result<GrayImage> {
  const PAD: u32 = 2;
  let glyphs: Vec<_> = out.glyphs().filter(|(e, _)| !e.missing && e.bitmap_width > 0).collect();
  let cell_w = glyphs.iter().map(|(e, _)| u32::from(e.bitmap_width)).max().unwrap_or(0) + 2 * PAD;
  let cell_h = glyphs.iter().map(|(e, _)| u32::from(e.bitmap_height)).max().unwrap_or(0) + 2 * PAD;
  let columns = columns.max(1);
  let used = columns.min(glyphs.len() as u32).max(1);
  let rows = (glyphs.len() as u32).div_ceil(columns).max(1);

  let mut sheet = GrayImage::from_pixel(cell_w * used, cell_h * rows, Luma([255]));
  for (i, (entry, bytes)) in glyphs.into_iter().enumerate() {
    let (col, row) = (i as u32 % columns, i as u32 / columns);
    let img = glyph_image(mode, entry, bytes)?;
    blit(&mut sheet, &img, i64::from(col * cell_w + PAD), i64::from(row * cell_h + PAD));
  }
  Ok(sheet)
}

/// Lay `text` out the way the device does: each glyph's bitmap goes at `(pen + xo, line_top +
/// yo)` and the pen moves by its advance. `\n` starts a new line `line_height` rows down.
/// Characters without a stored glyph are skipped.
pub fn render_text(out: &BatchOutput, mode: FirmwareMode, text: &str, line_height: u32) -> Result<GrayImage> {
  const MARGIN: i64 = 4;
  let mut index: HashMap<u16, (&GlyphEntry, &[u8])> = HashMap::new();
  for (e, bytes) in out.glyphs() {
    if !e.missing && !e.truncated {
      index.entry(e.codepoint).or_insert((e, bytes));
    }
  }
  let lookup = |ch: char| u16::try_from(u32::from(ch)).ok().and_then(|cp| index.get(&cp).copied());

  let lines: Vec<&str> = text.split('\n').collect();
  let width = lines
    .iter()
    .map(|l| l.chars().filter_map(lookup).map(|(e, _)| i64::from(e.advance_width)).sum::<i64>())
    .max()
    .unwrap_or(0);
  let line_height = i64::from(line_height.max(1));
  let w = (width + 2 * MARGIN) as u32;
  let h = (lines.len() as i64 * line_height + 2 * MARGIN) as u32;

  let mut canvas = GrayImage::from_pixel(w, h, Luma([255]));
  for (row, line) in lines.iter().enumerate() {
    let top = MARGIN + row as i64 * line_height;
    let mut pen = MARGIN;
    for (entry, bytes) in line.chars().filter_map(lookup) {
      if entry.bitmap_width > 0 {
        let img = glyph_image(mode, entry, bytes)?;
        blit(&mut canvas, &img, pen + i64::from(entry.x_offset), top + i64::from(entry.y_offset));
      }
      pen += i64::from(entry.advance_width);
    }
  }
  Ok(canvas)
}

pub fn encode_png(img: &GrayImage) -> Result<Vec<u8>> {
  let mut out = Vec::new();
  PngEncoder::new(&mut out).write_image(img.as_raw(), img.width(), img.height(), ExtendedColorType::L8)?;
  Ok(out)
}
