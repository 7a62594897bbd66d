//! Glyph bitmap converter for e-paper reader firmware.
//!
//! A batch renders each requested character of a TTF/OTF font onto a fixed canvas, crops it to
//! its content, quantizes and encodes the crop in one of three firmware formats, and measures the
//! placement offsets the device renderer expects:
//!
//! - `binary`: 1 bit per pixel, inverted packing (a stored `0` is ink)
//! - `tricolor`: white/gray/black, prefix code `0` / `10` / `11`
//! - `nibble`: 16 gray levels, prefix code `0` / `10` / `11xxxx`
//!
//! The result is a table of [`GlyphEntry`] rows plus one concatenated bitmap buffer that each
//! entry's `encoded_length` delimits.
//!
//! ```no_run
//! use inkglyph::{BatchRequest, ConvertOptions, FirmwareMode};
//!
//! let request = BatchRequest {
//!   font_data: std::fs::read("font.ttf")?,
//!   charset: (' '..='~').map(String::from).collect(),
//!   options: ConvertOptions::new(24.0, FirmwareMode::Tricolor),
//! };
//! let out = inkglyph::task::spawn(request)?.wait(|n| eprintln!("{n} glyphs"))?;
//! assert_eq!(out.entries.iter().map(|e| e.encoded_length as usize).sum::<usize>(), out.bitmap.len());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod batch;
pub mod bits;
pub mod bounds;
pub mod codec;
pub mod entry;
pub mod error;
pub mod filter;
pub mod font;
pub mod metrics;
pub mod options;
pub mod otsu;
pub mod plane;
pub mod preview;
pub mod raster;
pub mod surface;
pub mod task;

#[cfg(test)]
mod test_support;

pub use batch::{convert, convert_request, leading_scalars, BatchRequest, Diagnostics};
pub use codec::{decode, GlyphCodec};
pub use entry::{BatchOutput, GlyphEntry};
pub use error::{DecodeError, Error, FilterError, GlyphDrawError, Result};
pub use font::{FontMetrics, FontSource, GlyphOutline, PathCommand, SwashFont};
pub use options::{Calibration, ConvertOptions, FilterOptions, FirmwareMode, Thresholds};
pub use surface::{RasterSurface, SkiaSurface, SkiaSurfaces, SurfaceProvider};
