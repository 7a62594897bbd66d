//! Canvas geometry and per-glyph rasterization.

use serde::Serialize;

use crate::error::GlyphDrawError;
use crate::font::{FontMetrics, FontSource};
use crate::options::Calibration;
use crate::surface::RasterSurface;

/// Fixed canvas every glyph of a batch is drawn on.
///
/// All arithmetic runs in `f64` so the floors and ceilings land where the device's placement
/// code puts them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Canvas {
  pub width: u32,
  pub height: u32,
  pub ascender_px: i64,
  pub descender_px: i64,
  pub baseline_y: i64,
  pub pen_x: i64,
}

impl Canvas {
  pub fn new(metrics: &FontMetrics, size: f64, cal: &Calibration) -> Self {
    let upem = f64::from(metrics.units_per_em.max(1));
    let ascender_px = (f64::from(metrics.ascender) * size / upem).ceil() as i64;
    let descender_px = (f64::from(metrics.descender).abs() * size / upem).ceil() as i64;

    let width = (size * cal.canvas_width_ratio).ceil();
    let by_metrics = ((ascender_px + descender_px) as f64 * cal.metrics_height_ratio).ceil();
    let height = by_metrics.max((size * cal.canvas_min_height_ratio).ceil());

    let baseline_y = (ascender_px as f64 * cal.baseline_ascender_ratio).floor() as i64
      + (size * cal.baseline_pad_ratio).floor() as i64;
    let pen_x = (size * cal.pen_x_ratio).floor() as i64;

    Self {
      width: width.clamp(0.0, u32::MAX as f64) as u32,
      height: height.clamp(0.0, u32::MAX as f64) as u32,
      ascender_px,
      descender_px,
      baseline_y,
      pen_x,
    }
  }
}

/// Clear `surface` to white and draw glyph `glyph_id` at the canvas pen and baseline.
///
/// A glyph without an outline leaves the surface blank. On a draw failure the surface is cleared
/// again so the caller always reads back either the glyph or a blank raster.
pub fn rasterize<F, S>(
  font: &mut F,
  surface: &mut S,
  canvas: &Canvas,
  glyph_id: u16,
  size: f64,
) -> Result<(), GlyphDrawError>
where
  F: FontSource + ?Sized,
  S: RasterSurface + ?Sized,
{
  surface.clear(255);
  let Some(outline) = font.outline(glyph_id, size as f32) else {
    return Ok(());
  };
  let drawn = surface.fill_outline(glyph_id, &outline, canvas.pen_x as f32, canvas.baseline_y as f32);
  if drawn.is_err() {
    surface.clear(255);
  }
  drawn
}
