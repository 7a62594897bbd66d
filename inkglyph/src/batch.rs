//! The batch conversion loop.
//!
//! For every requested character, in order: resolve the glyph, rasterize it on the batch's
//! surface, find the content bounds, encode the crop and measure its placement. Each character
//! contributes exactly one entry and its bytes to the output.

use log::{debug, info, warn};
use serde::Serialize;

use crate::bounds::{self, ContentBounds};
use crate::codec::{Encoded, GlyphCodec};
use crate::entry::{BatchOutput, GlyphEntry};
use crate::error::{Error, Result};
use crate::font::{FontSource, SwashFont};
use crate::metrics::{Calibrator, Placement};
use crate::options::{ConvertOptions, FirmwareMode, ResolvedThresholds};
use crate::plane::GrayPlane;
use crate::raster::{rasterize, Canvas};
use crate::surface::{RasterSurface, SkiaSurfaces, SurfaceProvider};

/// Progress is reported each time this many glyphs have been processed.
pub const PROGRESS_INTERVAL: usize = 200;
/// Per-glyph snapshots kept in [`Diagnostics::glyphs`].
pub const DIAGNOSTIC_LIMIT: usize = 40;
/// Otsu thresholds kept in [`Diagnostics::otsu`].
pub const OTSU_SAMPLE_LIMIT: usize = 80;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct GlyphDiagnostic {
  pub codepoint: u32,
  pub glyph_id: u16,
  pub bounds: Option<ContentBounds>,
  pub placement: Placement,
  pub encoded_length: usize,
  /// Effective white cutoff; differs from [`Diagnostics::thresholds`] when Otsu picked it.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub white_threshold: Option<u8>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub draw_error: Option<String>,
  #[serde(skip_serializing_if = "Vec::is_empty")]
  pub filter_errors: Vec<String>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OtsuSample {
  pub codepoint: u32,
  pub threshold: u8,
}

/// Advisory, bounded record of how a batch went.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Diagnostics {
  pub mode: FirmwareMode,
  pub canvas: Option<Canvas>,
  pub thresholds: Option<ResolvedThresholds>,
  pub calibrated_ascender: i64,
  pub glyphs: Vec<GlyphDiagnostic>,
  pub otsu: Vec<OtsuSample>,
  pub missing: usize,
  pub draw_failures: usize,
  pub filter_failures: usize,
  pub truncated: usize,
}

/// Everything a batch needs, owned so it can move onto a worker thread.
#[derive(Clone, Debug)]
pub struct BatchRequest {
  pub font_data: Vec<u8>,
  /// Requested characters in order; each item is reduced to its first scalar value.
  pub charset: Vec<String>,
  pub options: ConvertOptions,
}

/// Reduce each item to its leading scalar value, so e.g. a trailing variation selector does not
/// turn into a missing glyph. Duplicates are kept.
pub fn leading_scalars<S: AsRef<str>>(items: &[S]) -> Result<Vec<char>> {
  items
    .iter()
    .enumerate()
    .map(|(i, s)| {
      s.as_ref().chars().next().ok_or_else(|| Error::InvalidRequest(format!("charset item {i} is empty")))
    })
    .collect()
}

/// Parse the font, then run [`convert`] on `tiny-skia` surfaces.
pub fn convert_request(req: &BatchRequest, progress: impl FnMut(usize)) -> Result<BatchOutput> {
  req.options.validate()?;
  let charset = leading_scalars(&req.charset)?;
  let mut font = SwashFont::parse(&req.font_data, req.options.face_index)?;
  convert(&mut font, &mut SkiaSurfaces, &charset, &req.options, progress)
}

/// Convert `charset` in order. `progress` receives the processed count every
/// [`PROGRESS_INTERVAL`] glyphs.
///
/// Only surface allocation and invalid options fail the batch; draw and filter failures degrade
/// the affected glyph and are counted in the diagnostics.
pub fn convert<F, P>(
  font: &mut F,
  surfaces: &mut P,
  charset: &[char],
  opts: &ConvertOptions,
  mut progress: impl FnMut(usize),
) -> Result<BatchOutput>
where
  F: FontSource + ?Sized,
  P: SurfaceProvider + ?Sized,
{
  opts.validate()?;
  let metrics = font.metrics();
  let canvas = Canvas::new(&metrics, opts.size, &opts.calibration);
  let calibrator = Calibrator::new(&metrics, &canvas, opts);
  let codec = GlyphCodec::new(opts);
  let polarity = codec.polarity();
  info!(
    "converting {} glyphs at {}px ({}), canvas {}x{}, baseline {}",
    charset.len(),
    opts.size,
    opts.mode,
    canvas.width,
    canvas.height,
    canvas.baseline_y
  );

  let mut out = BatchOutput::default();
  out.diagnostics.mode = opts.mode;
  out.diagnostics.canvas = Some(canvas);
  out.diagnostics.thresholds = Some(opts.thresholds.resolve(opts.mode));
  out.diagnostics.calibrated_ascender = calibrator.calibrated_ascender();

  // acquired on the first drawable glyph, reused (cleared) for all later ones
  let mut arena: Option<P::Surface> = None;

  for (i, &ch) in charset.iter().enumerate() {
    let codepoint = u32::from(ch);
    let glyph_id = font.glyph_id(ch);

    if glyph_id == 0 {
      let placement = calibrator.missing();
      debug!("U+{codepoint:04X}: missing");
      out.diagnostics.missing += 1;
      let entry = GlyphEntry::missing(ch, placement);
      let processed = Processed { glyph_id, bounds: None, placement, encoded: Encoded::default(), draw_error: None };
      record(&mut out, ch, entry, processed);
    } else {
      let surface = match arena.as_mut() {
        Some(s) => s,
        None => arena.insert(surfaces.acquire(canvas.width, canvas.height)?),
      };
      let draw_error = match rasterize(font, surface, &canvas, glyph_id, opts.size) {
        Ok(()) => None,
        Err(e) => {
          warn!("U+{codepoint:04X}: {e}; continuing with a blank raster");
          out.diagnostics.draw_failures += 1;
          Some(e.to_string())
        }
      };

      let plane = GrayPlane::from_rgba(
        surface.rgba(),
        surface.width() as usize,
        surface.height() as usize,
        polarity.inverts(),
      );
      let found = bounds::detect(&plane, polarity);
      let placement = calibrator.measure(font, glyph_id, found.as_ref());
      let (width, height, encoded) = match found {
        Some(b) => (b.width(), b.height(), codec.encode(b.crop(&plane))),
        None => (0, 0, Encoded::default()),
      };
      if let Some(threshold) = encoded.otsu {
        if out.diagnostics.otsu.len() < OTSU_SAMPLE_LIMIT {
          out.diagnostics.otsu.push(OtsuSample { codepoint, threshold });
        }
      }
      out.diagnostics.filter_failures += encoded.filter_failures.len();

      let entry = GlyphEntry::new(ch, placement, width, height, encoded.bytes.len());
      debug!(
        "U+{codepoint:04X}: {width}x{height} adv {} xo {} yo {} len {}",
        entry.advance_width, entry.x_offset, entry.y_offset, entry.encoded_length
      );
      record(&mut out, ch, entry, Processed { glyph_id, bounds: found, placement, encoded, draw_error });
    }

    let processed = i + 1;
    if processed % PROGRESS_INTERVAL == 0 {
      progress(processed);
    }
  }

  info!(
    "converted {} glyphs ({} missing, {} draw failures), {} bitmap bytes",
    out.entries.len(),
    out.diagnostics.missing,
    out.diagnostics.draw_failures,
    out.bitmap.len()
  );
  Ok(out)
}

struct Processed {
  glyph_id: u16,
  bounds: Option<ContentBounds>,
  placement: Placement,
  encoded: Encoded,
  draw_error: Option<String>,
}

fn record(out: &mut BatchOutput, ch: char, entry: GlyphEntry, p: Processed) {
  if entry.truncated {
    out.diagnostics.truncated += 1;
  }
  if out.diagnostics.glyphs.len() < DIAGNOSTIC_LIMIT {
    out.diagnostics.glyphs.push(GlyphDiagnostic {
      codepoint: u32::from(ch),
      glyph_id: p.glyph_id,
      bounds: p.bounds,
      placement: p.placement,
      encoded_length: p.encoded.bytes.len(),
      white_threshold: p.encoded.white,
      draw_error: p.draw_error,
      filter_errors: p.encoded.filter_failures.iter().map(ToString::to_string).collect(),
    });
  }
  out.push(entry, &p.encoded.bytes);
}
