use thiserror::Error;

/// Fatal and boundary errors surfaced by the library.
///
/// Only `EnvironmentUnsupported` and `FontParse` can terminate a running batch; the
/// request and decode variants are raised before a batch starts or by preview tooling.
#[derive(Debug, Error)]
pub enum Error {
  /// The raster surface could not be allocated for the requested canvas.
  #[error("raster surface unavailable for a {width}x{height} canvas")]
  EnvironmentUnsupported { width: u32, height: u32 },

  /// The font blob could not be parsed (or the face index does not exist).
  #[error("failed to parse font (face {face_index}): {reason}")]
  FontParse { face_index: usize, reason: String },

  /// A request field failed validation before any glyph was processed.
  #[error("invalid request: {0}")]
  InvalidRequest(String),

  #[error(transparent)]
  Decode(#[from] DecodeError),

  /// A preview image could not be encoded.
  #[error("preview encoding failed: {0}")]
  Image(#[from] image::ImageError),

  /// The background conversion thread could not be started.
  #[error("failed to start conversion thread: {0}")]
  Spawn(#[source] std::io::Error),
}

/// Errors from the preview-side decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DecodeError {
  /// The bit stream ended before `width * height` pixels were read.
  #[error("stream truncated after {decoded} of {expected} pixels")]
  Truncated { decoded: usize, expected: usize },

  /// A fixed-size stream (binary) has the wrong byte count.
  #[error("expected {expected} bytes, got {got}")]
  Length { expected: usize, got: usize },
}

/// A per-glyph outline drawing failure. Recovered locally as a blank raster.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("glyph {glyph_id} could not be drawn: {reason}")]
pub struct GlyphDrawError {
  pub glyph_id: u16,
  pub reason: &'static str,
}

/// A preprocessing filter failure. Recovered locally by keeping the unfiltered region.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FilterError {
  #[error("region buffer holds {got} samples, expected {expected}")]
  Shape { expected: usize, got: usize },
  #[error("non-finite {0} parameter")]
  Parameter(&'static str),
  #[error("filter produced a non-finite sample")]
  NonFinite,
}

pub type Result<T, E = Error> = core::result::Result<T, E>;
