//! 2D raster surface capability: fill, draw a glyph path, read back RGBA.
//!
//! A batch acquires one surface for its canvas size and clears it before every glyph; the
//! surface never leaves the batch loop. [`SkiaSurface`] is the `tiny-skia` implementation.

use tiny_skia::{Color, FillRule, Paint, PathBuilder, Pixmap, Transform};

use crate::error::{Error, GlyphDrawError, Result};
use crate::font::{GlyphOutline, PathCommand};

pub trait RasterSurface {
  fn width(&self) -> u32;
  fn height(&self) -> u32;

  /// Fill the whole surface with an opaque gray level.
  fn clear(&mut self, gray: u8);

  /// Fill `outline` in black with its origin at `(pen_x, baseline_y)` (surface y grows down).
  fn fill_outline(
    &mut self,
    glyph_id: u16,
    outline: &GlyphOutline,
    pen_x: f32,
    baseline_y: f32,
  ) -> Result<(), GlyphDrawError>;

  /// Row-major RGBA samples, `width * height * 4` bytes.
  fn rgba(&self) -> &[u8];
}

/// Allocates surfaces. Failing to allocate is fatal for the batch.
pub trait SurfaceProvider {
  type Surface: RasterSurface;

  fn acquire(&mut self, width: u32, height: u32) -> Result<Self::Surface>;
}

// ──────────────────────────────────────────────────────────────────────────────
// tiny-skia
// ──────────────────────────────────────────────────────────────────────────────

pub struct SkiaSurface {
  pixmap: Pixmap,
  paint: Paint<'static>,
}

impl SkiaSurface {
  pub fn new(width: u32, height: u32) -> Result<Self> {
    let pixmap = Pixmap::new(width, height).ok_or(Error::EnvironmentUnsupported { width, height })?;
    let mut paint = Paint::default();
    paint.set_color(Color::BLACK);
    paint.anti_alias = true;
    Ok(Self { pixmap, paint })
  }
}

impl RasterSurface for SkiaSurface {
  fn width(&self) -> u32 {
    self.pixmap.width()
  }

  fn height(&self) -> u32 {
    self.pixmap.height()
  }

  fn clear(&mut self, gray: u8) {
    self.pixmap.fill(Color::from_rgba8(gray, gray, gray, 255));
  }

  fn fill_outline(
    &mut self,
    glyph_id: u16,
    outline: &GlyphOutline,
    pen_x: f32,
    baseline_y: f32,
  ) -> Result<(), GlyphDrawError> {
    if !outline.is_finite() || !pen_x.is_finite() || !baseline_y.is_finite() {
      return Err(GlyphDrawError { glyph_id, reason: "non-finite outline coordinate" });
    }
    let mut pb = PathBuilder::new();
    for cmd in &outline.commands {
      match *cmd {
        PathCommand::MoveTo(x, y) => pb.move_to(pen_x + x, baseline_y - y),
        PathCommand::LineTo(x, y) => pb.line_to(pen_x + x, baseline_y - y),
        PathCommand::QuadTo(cx, cy, x, y) => pb.quad_to(pen_x + cx, baseline_y - cy, pen_x + x, baseline_y - y),
        PathCommand::CurveTo(c0x, c0y, c1x, c1y, x, y) => pb.cubic_to(
          pen_x + c0x,
          baseline_y - c0y,
          pen_x + c1x,
          baseline_y - c1y,
          pen_x + x,
          baseline_y - y,
        ),
        PathCommand::Close => pb.close(),
      }
    }
    // An empty or degenerate path (space, zero-area contour) draws nothing.
    if let Some(path) = pb.finish() {
      self.pixmap.fill_path(&path, &self.paint, FillRule::Winding, Transform::identity(), None);
    }
    Ok(())
  }

  fn rgba(&self) -> &[u8] {
    self.pixmap.data()
  }
}

/// Provides [`SkiaSurface`]s.
#[derive(Debug, Default, Clone, Copy)]
pub struct SkiaSurfaces;

impl SurfaceProvider for SkiaSurfaces {
  type Surface = SkiaSurface;

  fn acquire(&mut self, width: u32, height: u32) -> Result<SkiaSurface> {
    SkiaSurface::new(width, height)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn red_at(s: &SkiaSurface, x: u32, y: u32) -> u8 {
    s.rgba()[((y * s.width() + x) * 4) as usize]
  }

  #[test]
  fn zero_sized_surface_is_unsupported() {
    let err = SkiaSurface::new(0, 10).err().expect("must fail");
    assert!(matches!(err, Error::EnvironmentUnsupported { width: 0, height: 10 }));
  }

  #[test]
  fn fills_rect_below_baseline_origin() {
    let mut s = SkiaSurface::new(20, 20).unwrap();
    s.clear(255);
    // 4x4 square whose bottom sits on the baseline
    s.fill_outline(1, &GlyphOutline::rect(0.0, 0.0, 4.0, 4.0), 5.0, 10.0).unwrap();
    assert_eq!(red_at(&s, 6, 7), 0);
    assert_eq!(red_at(&s, 2, 2), 255);
    assert_eq!(red_at(&s, 15, 15), 255);
  }

  #[test]
  fn rejects_nan_outline() {
    let mut s = SkiaSurface::new(8, 8).unwrap();
    let bad = GlyphOutline { commands: vec![PathCommand::MoveTo(f32::NAN, 1.0), PathCommand::LineTo(2.0, 2.0)] };
    assert!(s.fill_outline(3, &bad, 0.0, 4.0).is_err());
  }

  #[test]
  fn empty_outline_draws_nothing() {
    let mut s = SkiaSurface::new(8, 8).unwrap();
    s.clear(255);
    s.fill_outline(3, &GlyphOutline::default(), 2.0, 4.0).unwrap();
    assert!(s.rgba().iter().all(|&v| v == 255));
  }
}
