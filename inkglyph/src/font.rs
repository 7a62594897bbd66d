//! Font-parsing capability consumed by the rasterizer and the metrics calibrator.
//!
//! The core only needs glyph lookup, horizontal metrics in font units, the typographic
//! ascender/descender and a scaled outline. [`SwashFont`] provides them from a TTF/OTF/TTC blob.

use swash::scale::ScaleContext;
use swash::zeno::{Command, PathData};
use swash::{tag_from_bytes, FontRef, NormalizedCoord};

use crate::error::{Error, Result};

/// One outline segment in pixel units: origin at the pen position on the baseline, y pointing up.
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum PathCommand {
  MoveTo(f32, f32),
  LineTo(f32, f32),
  QuadTo(f32, f32, f32, f32),
  CurveTo(f32, f32, f32, f32, f32, f32),
  Close,
}

impl From<Command> for PathCommand {
  fn from(cmd: Command) -> Self {
    match cmd {
      Command::MoveTo(p) => PathCommand::MoveTo(p.x, p.y),
      Command::LineTo(p) => PathCommand::LineTo(p.x, p.y),
      Command::QuadTo(c, p) => PathCommand::QuadTo(c.x, c.y, p.x, p.y),
      Command::CurveTo(c0, c1, p) => PathCommand::CurveTo(c0.x, c0.y, c1.x, c1.y, p.x, p.y),
      Command::Close => PathCommand::Close,
    }
  }
}

/// A glyph outline already scaled to the target pixel size.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlyphOutline {
  pub commands: Vec<PathCommand>,
}

impl GlyphOutline {
  /// Axis-aligned rectangle from `(x0, y0)` to `(x1, y1)`, y up.
  pub fn rect(x0: f32, y0: f32, x1: f32, y1: f32) -> Self {
    Self {
      commands: vec![
        PathCommand::MoveTo(x0, y0),
        PathCommand::LineTo(x1, y0),
        PathCommand::LineTo(x1, y1),
        PathCommand::LineTo(x0, y1),
        PathCommand::Close,
      ],
    }
  }

  /// Every coordinate in the outline is finite.
  pub fn is_finite(&self) -> bool {
    self.points().all(|(x, y)| x.is_finite() && y.is_finite())
  }

  /// All on- and off-curve points in command order.
  pub fn points(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
    self.commands.iter().flat_map(|cmd| {
      let pts: [Option<(f32, f32)>; 3] = match *cmd {
        PathCommand::MoveTo(x, y) | PathCommand::LineTo(x, y) => [Some((x, y)), None, None],
        PathCommand::QuadTo(cx, cy, x, y) => [Some((cx, cy)), Some((x, y)), None],
        PathCommand::CurveTo(c0x, c0y, c1x, c1y, x, y) => [Some((c0x, c0y)), Some((c1x, c1y)), Some((x, y))],
        PathCommand::Close => [None, None, None],
      };
      pts.into_iter().flatten()
    })
  }
}

/// Font-wide metrics in font units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FontMetrics {
  pub units_per_em: u16,
  /// Typographic ascender, positive above the baseline.
  pub ascender: f32,
  /// Typographic descender as a positive distance below the baseline.
  pub descender: f32,
}

/// What the converter needs from a parsed font.
pub trait FontSource {
  fn metrics(&self) -> FontMetrics;

  /// Glyph index for `ch`; `0` means the font has no glyph for it.
  fn glyph_id(&self, ch: char) -> u16;

  /// Horizontal advance in font units.
  fn advance_width(&self, glyph_id: u16) -> f32;

  /// Left side bearing in font units.
  fn left_side_bearing(&self, glyph_id: u16) -> f32;

  /// Unhinted outline scaled to `size` pixels per em, or `None` if the glyph cannot be outlined.
  fn outline(&mut self, glyph_id: u16, size: f32) -> Option<GlyphOutline>;
}

// ──────────────────────────────────────────────────────────────────────────────
// swash-backed implementation
// ──────────────────────────────────────────────────────────────────────────────

pub struct SwashFont<'a> {
  font: FontRef<'a>,
  scale_ctx: ScaleContext,
}

impl<'a> SwashFont<'a> {
  pub fn parse(data: &'a [u8], face_index: usize) -> Result<Self> {
    let font = FontRef::from_index(data, face_index).ok_or_else(|| Error::FontParse {
      face_index,
      reason: format!("not a TrueType/OpenType font or missing face ({} bytes)", data.len()),
    })?;
    if font.metrics(&[] as &[NormalizedCoord]).units_per_em == 0 {
      return Err(Error::FontParse { face_index, reason: "unitsPerEm is zero".into() });
    }
    Ok(Self { font, scale_ctx: ScaleContext::new() })
  }
}

impl FontSource for SwashFont<'_> {
  fn metrics(&self) -> FontMetrics {
    let m = self.font.metrics(&[] as &[NormalizedCoord]);
    let (ascender, descender) = match self.font.table(tag_from_bytes(b"OS/2")).and_then(typo_line_metrics) {
      Some((asc, desc)) => (f32::from(asc), f32::from(desc)),
      None => (m.ascent, m.descent),
    };
    FontMetrics { units_per_em: m.units_per_em, ascender, descender: descender.abs() }
  }

  fn glyph_id(&self, ch: char) -> u16 {
    self.font.charmap().map(ch)
  }

  fn advance_width(&self, glyph_id: u16) -> f32 {
    self.font.glyph_metrics(&[] as &[NormalizedCoord]).advance_width(glyph_id)
  }

  fn left_side_bearing(&self, glyph_id: u16) -> f32 {
    self.font.glyph_metrics(&[] as &[NormalizedCoord]).lsb(glyph_id)
  }

  fn outline(&mut self, glyph_id: u16, size: f32) -> Option<GlyphOutline> {
    // No hinting: placement must match the unhinted device renderer.
    let mut scaler = self.scale_ctx.builder(self.font).size(size).hint(false).build();
    let outline = scaler.scale_outline(glyph_id)?;
    let commands = outline.path().commands().map(PathCommand::from).collect();
    Some(GlyphOutline { commands })
  }
}

/// `sTypoAscender`/`sTypoDescender` from a raw `OS/2` table, regardless of USE_TYPO_METRICS.
fn typo_line_metrics(os2: &[u8]) -> Option<(i16, i16)> {
  let raw = os2.get(68..72)?;
  Some((i16::from_be_bytes([raw[0], raw[1]]), i16::from_be_bytes([raw[2], raw[3]])))
}
