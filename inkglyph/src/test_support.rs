//! In-memory font and surface doubles for unit tests.

use std::collections::HashMap;

use crate::error::{GlyphDrawError, Result};
use crate::font::{FontMetrics, FontSource, GlyphOutline};
use crate::surface::{RasterSurface, SurfaceProvider};

/// A TrueType font with three glyphs at 1024 units per em:
///
/// - `.notdef` and `space` (gid 1, advance 256) are empty
/// - `H` (gid 2, advance 512, lsb 64) is the single rectangle from (64, 0) to (448, 704)
///
/// `hhea` says ascender 1024 / descender -256, while `OS/2` has sTypoAscender 832 and
/// sTypoDescender -256 with USE_TYPO_METRICS clear. At 16px every outline edge is on a pixel
/// boundary.
pub const BLOCKS_TTF: &[u8] = include_bytes!("../testdata/blocks.ttf");

struct FakeGlyph {
  advance: f32,
  lsb: f32,
  /// `(x0, y0, x1, y1)` in pixel units, y up.
  rect: Option<(f32, f32, f32, f32)>,
}

/// A font whose glyphs are axis-aligned rectangles, independent of the requested size.
pub struct FakeFont {
  metrics: FontMetrics,
  cmap: HashMap<char, u16>,
  glyphs: HashMap<u16, FakeGlyph>,
}

impl FakeFont {
  pub fn new(units_per_em: u16) -> Self {
    Self {
      metrics: FontMetrics { units_per_em, ascender: 800.0, descender: 200.0 },
      cmap: HashMap::new(),
      glyphs: HashMap::new(),
    }
  }

  pub fn with_glyph(mut self, ch: char, gid: u16, advance: f32, lsb: f32, rect: Option<(f32, f32, f32, f32)>) -> Self {
    self.cmap.insert(ch, gid);
    self.glyphs.insert(gid, FakeGlyph { advance, lsb, rect });
    self
  }
}

impl FontSource for FakeFont {
  fn metrics(&self) -> FontMetrics {
    self.metrics
  }

  fn glyph_id(&self, ch: char) -> u16 {
    self.cmap.get(&ch).copied().unwrap_or(0)
  }

  fn advance_width(&self, glyph_id: u16) -> f32 {
    self.glyphs.get(&glyph_id).map_or(0.0, |g| g.advance)
  }

  fn left_side_bearing(&self, glyph_id: u16) -> f32 {
    self.glyphs.get(&glyph_id).map_or(0.0, |g| g.lsb)
  }

  fn outline(&mut self, glyph_id: u16, _size: f32) -> Option<GlyphOutline> {
    let (x0, y0, x1, y1) = self.glyphs.get(&glyph_id)?.rect?;
    Some(GlyphOutline::rect(x0, y0, x1, y1))
  }
}

/// Fills the outline's bounding box with solid black: a pixel is ink when its centre lies inside.
pub struct FakeSurface {
  width: u32,
  height: u32,
  data: Vec<u8>,
  fail: bool,
}

impl FakeSurface {
  pub fn new(width: u32, height: u32) -> Self {
    Self { width, height, data: vec![255; (width * height * 4) as usize], fail: false }
  }

  /// Every draw reports an error after scribbling over the surface.
  pub fn failing(mut self) -> Self {
    self.fail = true;
    self
  }
}

impl RasterSurface for FakeSurface {
  fn width(&self) -> u32 {
    self.width
  }

  fn height(&self) -> u32 {
    self.height
  }

  fn clear(&mut self, gray: u8) {
    for px in self.data.chunks_exact_mut(4) {
      px.copy_from_slice(&[gray, gray, gray, 255]);
    }
  }

  fn fill_outline(
    &mut self,
    glyph_id: u16,
    outline: &GlyphOutline,
    pen_x: f32,
    baseline_y: f32,
  ) -> Result<(), GlyphDrawError> {
    if self.fail {
      self.clear(0);
      return Err(GlyphDrawError { glyph_id, reason: "test surface refuses to draw" });
    }
    let mut pts = outline.points();
    let Some(first) = pts.next() else { return Ok(()) };
    let (mut x0, mut y0, mut x1, mut y1) = (first.0, first.1, first.0, first.1);
    for (x, y) in pts {
      x0 = x0.min(x);
      x1 = x1.max(x);
      y0 = y0.min(y);
      y1 = y1.max(y);
    }
    let (left, right) = (pen_x + x0, pen_x + x1);
    let (top, bottom) = (baseline_y - y1, baseline_y - y0);
    for py in 0..self.height {
      for px in 0..self.width {
        let (cx, cy) = (px as f32 + 0.5, py as f32 + 0.5);
        if cx > left && cx < right && cy > top && cy < bottom {
          let i = ((py * self.width + px) * 4) as usize;
          self.data[i..i + 3].fill(0);
        }
      }
    }
    Ok(())
  }

  fn rgba(&self) -> &[u8] {
    &self.data
  }
}

/// Hands out [`FakeSurface`]s and counts acquisitions.
#[derive(Default)]
pub struct FakeSurfaces {
  pub acquired: usize,
  pub failing_draws: bool,
  pub refuse: bool,
}

impl SurfaceProvider for FakeSurfaces {
  type Surface = FakeSurface;

  fn acquire(&mut self, width: u32, height: u32) -> Result<FakeSurface> {
    if self.refuse {
      return Err(crate::Error::EnvironmentUnsupported { width, height });
    }
    self.acquired += 1;
    let s = FakeSurface::new(width, height);
    Ok(if self.failing_draws { s.failing() } else { s })
  }
}
