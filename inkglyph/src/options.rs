//! Conversion options: firmware mode, thresholds, filters and the empirical calibration.
//!
//! Every struct deserializes with `#[serde(default)]`, so a JSON config only needs the fields it
//! overrides:
//!
//! ```json
//! { "size": 28, "mode": "tricolor", "thresholds": { "white": 190 }, "filters": { "denoise": true } }
//! ```

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Firmware family that selects the encoder, thresholds and pixel polarity.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FirmwareMode {
  /// 1 bit per pixel, inverted packing.
  #[default]
  #[serde(alias = "readpaper")]
  Binary,
  /// White / gray / black with a 1–2 bit prefix code.
  #[serde(alias = "readpaper_v3")]
  Tricolor,
  /// 16 gray levels with a 1/2/6 bit prefix code over inverted grayscale.
  #[serde(alias = "edc")]
  Nibble,
}

impl FirmwareMode {
  pub const ALL: [FirmwareMode; 3] = [FirmwareMode::Binary, FirmwareMode::Tricolor, FirmwareMode::Nibble];

  pub fn as_str(self) -> &'static str {
    match self {
      FirmwareMode::Binary => "binary",
      FirmwareMode::Tricolor => "tricolor",
      FirmwareMode::Nibble => "nibble",
    }
  }

  /// Smallest advance width the firmware accepts for a rendered glyph.
  #[inline]
  pub fn min_advance(self) -> i64 {
    match self {
      FirmwareMode::Nibble => 0,
      FirmwareMode::Binary | FirmwareMode::Tricolor => 1,
    }
  }

  /// Map a decoded level back to an 8-bit intensity (0 = black, 255 = white).
  pub fn level_to_gray(self, level: u8) -> u8 {
    match self {
      FirmwareMode::Binary => {
        if level != 0 {
          0
        } else {
          255
        }
      }
      FirmwareMode::Tricolor => match level {
        0 => 255,
        1 => 0x88,
        _ => 0,
      },
      FirmwareMode::Nibble => ((level.min(15) as u32 * 255) / 15) as u8,
    }
  }
}

impl fmt::Display for FirmwareMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for FirmwareMode {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.to_ascii_lowercase().as_str() {
      "binary" | "readpaper" => Ok(FirmwareMode::Binary),
      "tricolor" | "readpaper_v3" => Ok(FirmwareMode::Tricolor),
      "nibble" | "edc" => Ok(FirmwareMode::Nibble),
      other => Err(Error::InvalidRequest(format!("unknown firmware mode {other:?}"))),
    }
  }
}

// ──────────────────────────────────────────────────────────────────────────────
// thresholds
// ──────────────────────────────────────────────────────────────────────────────

/// Threshold parameters as requested. Unset cutoffs fall back to the mode's defaults.
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Thresholds {
  pub white: Option<u8>,
  pub gray: Option<u8>,
  pub black: Option<u8>,
  /// Binary mode: pick the white cutoff per glyph with Otsu's method.
  pub use_otsu: bool,
  /// Added to the Otsu threshold before clamping to 0..=255.
  pub otsu_bias: i16,
}

/// Cutoffs after per-mode defaults and clamps were applied.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ResolvedThresholds {
  pub white: u8,
  pub gray: u8,
  pub black: u8,
}

impl Thresholds {
  pub fn resolve(&self, mode: FirmwareMode) -> ResolvedThresholds {
    match mode {
      FirmwareMode::Binary => ResolvedThresholds { white: self.white.unwrap_or(160), gray: 0, black: 0 },
      FirmwareMode::Tricolor => {
        ResolvedThresholds { white: self.white.unwrap_or(200), gray: self.gray.unwrap_or(120), black: 0 }
      }
      FirmwareMode::Nibble => {
        let white = self.white.unwrap_or(32);
        // black stays strictly above white and at most 239
        let black = self.black.unwrap_or(223).min(239).max(white.saturating_add(1));
        ResolvedThresholds { white, gray: 0, black }
      }
    }
  }
}

// ──────────────────────────────────────────────────────────────────────────────
// filters
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GaussianOptions {
  pub enabled: bool,
  pub radius: u32,
  /// Defaults to the radius when unset or non-positive.
  pub sigma: Option<f32>,
}

impl Default for GaussianOptions {
  fn default() -> Self {
    Self { enabled: false, radius: 1, sigma: None }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BilateralOptions {
  pub enabled: bool,
  pub radius: u32,
  pub sigma_space: f32,
  pub sigma_range: f32,
}

impl Default for BilateralOptions {
  fn default() -> Self {
    Self { enabled: false, radius: 2, sigma_space: 2.0, sigma_range: 25.0 }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
  /// Binary: morphological cleanup pre-pass. Tricolor: majority-vote denoise.
  pub denoise: bool,
  pub gaussian: GaussianOptions,
  pub bilateral: BilateralOptions,
  /// Binary: dilation passes, clamped to 0..=3.
  pub stroke_dilation: u8,
  /// Binary: safe smoothing passes.
  pub smoothing_passes: u32,
}

impl Default for FilterOptions {
  fn default() -> Self {
    Self {
      denoise: false,
      gaussian: GaussianOptions::default(),
      bilateral: BilateralOptions::default(),
      stroke_dilation: 0,
      smoothing_passes: 1,
    }
  }
}

// ──────────────────────────────────────────────────────────────────────────────
// calibration
// ──────────────────────────────────────────────────────────────────────────────

/// Empirical canvas and placement constants.
///
/// `ascender_ratio` stands in for the ascender the device's FreeType-based renderer computes;
/// it is tuned against that renderer's output, not derived from font tables.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Calibration {
  pub canvas_width_ratio: f64,
  pub canvas_min_height_ratio: f64,
  pub metrics_height_ratio: f64,
  pub baseline_ascender_ratio: f64,
  pub baseline_pad_ratio: f64,
  pub pen_x_ratio: f64,
  pub ascender_ratio: f64,
}

pub const DEFAULT_ASCENDER_RATIO: f64 = 0.875;

impl Default for Calibration {
  fn default() -> Self {
    Self {
      canvas_width_ratio: 3.0,
      canvas_min_height_ratio: 2.5,
      metrics_height_ratio: 1.3,
      baseline_ascender_ratio: 1.15,
      baseline_pad_ratio: 0.1,
      pen_x_ratio: 0.6,
      ascender_ratio: DEFAULT_ASCENDER_RATIO,
    }
  }
}

impl Calibration {
  /// The device-side ascender, `floor(size * ascender_ratio)`.
  #[inline]
  pub fn calibrated_ascender(&self, size: f64) -> i64 {
    (size * self.ascender_ratio).floor() as i64
  }
}

// ──────────────────────────────────────────────────────────────────────────────
// top-level options
// ──────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConvertOptions {
  /// Target pixel size (em height in pixels).
  pub size: f64,
  pub mode: FirmwareMode,
  /// Face within a font collection.
  pub face_index: usize,
  pub thresholds: Thresholds,
  pub filters: FilterOptions,
  pub calibration: Calibration,
}

impl Default for ConvertOptions {
  fn default() -> Self {
    Self {
      size: 32.0,
      mode: FirmwareMode::Binary,
      face_index: 0,
      thresholds: Thresholds::default(),
      filters: FilterOptions::default(),
      calibration: Calibration::default(),
    }
  }
}

impl ConvertOptions {
  pub fn new(size: f64, mode: FirmwareMode) -> Self {
    Self { size, mode, ..Self::default() }
  }

  /// Parse a JSON config; unspecified fields keep their defaults.
  pub fn from_json(text: &str) -> Result<Self> {
    serde_json::from_str(text).map_err(|e| Error::InvalidRequest(format!("bad options JSON: {e}")))
  }

  pub fn validate(&self) -> Result<()> {
    if !self.size.is_finite() || self.size <= 0.0 {
      return Err(Error::InvalidRequest(format!("pixel size must be positive, got {}", self.size)));
    }
    let c = &self.calibration;
    let ratios = [
      ("canvas_width_ratio", c.canvas_width_ratio),
      ("canvas_min_height_ratio", c.canvas_min_height_ratio),
      ("metrics_height_ratio", c.metrics_height_ratio),
      ("baseline_ascender_ratio", c.baseline_ascender_ratio),
      ("baseline_pad_ratio", c.baseline_pad_ratio),
      ("pen_x_ratio", c.pen_x_ratio),
      ("ascender_ratio", c.ascender_ratio),
    ];
    for (name, v) in ratios {
      if !v.is_finite() {
        return Err(Error::InvalidRequest(format!("calibration.{name} must be finite")));
      }
    }
    Ok(())
  }
}
