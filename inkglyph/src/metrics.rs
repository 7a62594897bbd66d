//! Advance width and placement offsets, computed with the device renderer's integer arithmetic.
//!
//! Placement is independent of the quantizer: it only looks at the font's horizontal metrics,
//! the canvas geometry and the content bounds found on the raster.

use serde::Serialize;

use crate::bounds::ContentBounds;
use crate::font::{FontMetrics, FontSource};
use crate::options::{ConvertOptions, FirmwareMode};
use crate::raster::Canvas;

/// Offsets before clamping, plus the advance in pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Placement {
  pub advance: i64,
  pub x_offset: i64,
  pub y_offset: i64,
}

#[derive(Copy, Clone, Debug)]
pub struct Calibrator {
  mode: FirmwareMode,
  units_per_em: f64,
  scale: f64,
  pen_x: i64,
  baseline_y: i64,
  calibrated_ascender: i64,
}

impl Calibrator {
  pub fn new(metrics: &FontMetrics, canvas: &Canvas, opts: &ConvertOptions) -> Self {
    let units_per_em = f64::from(metrics.units_per_em.max(1));
    Self {
      mode: opts.mode,
      units_per_em,
      scale: opts.size / units_per_em,
      pen_x: canvas.pen_x,
      baseline_y: canvas.baseline_y,
      calibrated_ascender: opts.calibration.calibrated_ascender(opts.size),
    }
  }

  #[inline]
  pub fn calibrated_ascender(&self) -> i64 {
    self.calibrated_ascender
  }

  /// `floor(advance * size / upem)`, with half an em standing in for a zero advance, and never
  /// below the mode's minimum.
  pub fn advance(&self, advance_units: f32) -> i64 {
    let units = f64::from(advance_units);
    let units = if units.is_finite() && units != 0.0 { units } else { self.units_per_em * 0.5 };
    ((units * self.scale).floor() as i64).max(self.mode.min_advance())
  }

  /// Distance from the pen to the content's left edge; the scaled left side bearing for a blank
  /// raster.
  pub fn x_offset(&self, bounds: Option<&ContentBounds>, lsb_units: f32) -> i64 {
    match bounds {
      Some(b) => b.min_x as i64 - self.pen_x,
      None => {
        let lsb = f64::from(lsb_units);
        if lsb.is_finite() {
          (lsb * self.scale).floor() as i64
        } else {
          0
        }
      }
    }
  }

  /// Rows from the calibrated line top to the content's top edge, plus one. Blank glyphs sit at
  /// `calibrated_ascender + 1`.
  pub fn y_offset(&self, bounds: Option<&ContentBounds>) -> i64 {
    match bounds {
      Some(b) => b.min_y as i64 - (self.baseline_y - self.calibrated_ascender) + 1,
      None => self.calibrated_ascender + 1,
    }
  }

  pub fn measure<F: FontSource + ?Sized>(&self, font: &F, glyph_id: u16, bounds: Option<&ContentBounds>) -> Placement {
    Placement {
      advance: self.advance(font.advance_width(glyph_id)),
      x_offset: self.x_offset(bounds, font.left_side_bearing(glyph_id)),
      y_offset: self.y_offset(bounds),
    }
  }

  /// A codepoint the font cannot map.
  pub fn missing(&self) -> Placement {
    Placement { advance: 0, x_offset: 0, y_offset: self.y_offset(None) }
  }
}

/// Saturate into the signed byte the firmware stores offsets in.
#[inline]
pub fn clamp_offset(v: i64) -> i8 {
  v.clamp(i64::from(i8::MIN), i64::from(i8::MAX)) as i8
}

/// Keep the low 16 bits; `true` when anything was lost.
#[inline]
pub fn truncate_u16(v: u64) -> (u16, bool) {
  ((v & 0xFFFF) as u16, v > 0xFFFF)
}

/// Keep the low 8 bits; `true` when anything was lost.
#[inline]
pub fn truncate_u8(v: u64) -> (u8, bool) {
  ((v & 0xFF) as u8, v > 0xFF)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::options::Calibration;

  fn calibrator(size: f64, mode: FirmwareMode) -> Calibrator {
    let m = FontMetrics { units_per_em: 1000, ascender: 800.0, descender: 200.0 };
    let opts = ConvertOptions::new(size, mode);
    let canvas = Canvas::new(&m, size, &Calibration::default());
    Calibrator::new(&m, &canvas, &opts)
  }

  #[test]
  fn advance_floors_and_respects_minimum() {
    let c = calibrator(32.0, FirmwareMode::Binary);
    assert_eq!(c.advance(500.0), 16);
    assert_eq!(c.advance(531.0), 16);
    // zero falls back to half an em
    assert_eq!(c.advance(0.0), 16);
    assert_eq!(c.advance(10.0), 1);
    assert_eq!(calibrator(32.0, FirmwareMode::Nibble).advance(10.0), 0);
  }

  #[test]
  fn offsets_at_32px() {
    // pen 19, baseline 32, calibrated ascender 28
    let c = calibrator(32.0, FirmwareMode::Binary);
    assert_eq!(c.calibrated_ascender(), 28);
    let b = ContentBounds { min_x: 21, min_y: 10, max_x: 30, max_y: 31 };
    assert_eq!(c.x_offset(Some(&b), 0.0), 2);
    assert_eq!(c.y_offset(Some(&b)), 10 - (32 - 28) + 1);
    assert_eq!(c.y_offset(None), 29);
  }

  #[test]
  fn blank_x_offset_uses_side_bearing() {
    let c = calibrator(32.0, FirmwareMode::Binary);
    assert_eq!(c.x_offset(None, 100.0), 3);
    assert_eq!(c.x_offset(None, -100.0), -4);
  }

  #[test]
  fn missing_placement() {
    let c = calibrator(20.0, FirmwareMode::Tricolor);
    assert_eq!(c.missing(), Placement { advance: 0, x_offset: 0, y_offset: 18 });
  }

  #[test]
  fn offsets_saturate() {
    assert_eq!(clamp_offset(500), 127);
    assert_eq!(clamp_offset(128), 127);
    assert_eq!(clamp_offset(-129), -128);
    assert_eq!(clamp_offset(-3), -3);
  }

  #[test]
  fn truncation_is_flagged() {
    assert_eq!(truncate_u16(0x1F600), (0xF600, true));
    assert_eq!(truncate_u16(0x4E2D), (0x4E2D, false));
    assert_eq!(truncate_u8(300), (44, true));
    assert_eq!(truncate_u8(255), (255, false));
  }
}
