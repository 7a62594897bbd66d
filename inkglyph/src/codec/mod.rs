//! Firmware bitmap codecs.
//!
//! [`GlyphCodec`] is the per-batch strategy: it is built once from the options, tells the bounds
//! detector which polarity to scan with, then turns each cropped region into its encoded stream.
//! [`decode`] reverses any stream into per-pixel levels for previews and checks.

pub mod binary;
pub mod nibble;
pub mod tricolor;

use log::debug;

use crate::bounds::Polarity;
use crate::error::{DecodeError, FilterError};
use crate::filter;
use crate::options::{ConvertOptions, FilterOptions, FirmwareMode};
use crate::otsu;
use crate::plane::GrayPlane;

pub const MAX_STROKE_DILATION: u8 = 3;

#[derive(Clone, Debug, PartialEq)]
pub struct BinaryCodec {
  pub white: u8,
  /// `Some(bias)` picks the cutoff per glyph with Otsu's method.
  pub otsu_bias: Option<i16>,
  pub filters: FilterOptions,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TricolorCodec {
  pub white: u8,
  pub gray: u8,
  pub filters: FilterOptions,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NibbleCodec {
  pub white: u8,
  pub black: u8,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GlyphCodec {
  Binary(BinaryCodec),
  Tricolor(TricolorCodec),
  Nibble(NibbleCodec),
}

/// One encoded glyph plus what happened on the way.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Encoded {
  pub bytes: Vec<u8>,
  /// Otsu threshold before bias, when it was computed.
  pub otsu: Option<u8>,
  /// White cutoff the quantizer applied to this glyph.
  pub white: Option<u8>,
  pub filter_failures: Vec<FilterError>,
}

impl GlyphCodec {
  pub fn new(opts: &ConvertOptions) -> Self {
    let t = opts.thresholds.resolve(opts.mode);
    match opts.mode {
      FirmwareMode::Binary => GlyphCodec::Binary(BinaryCodec {
        white: t.white,
        otsu_bias: opts.thresholds.use_otsu.then_some(opts.thresholds.otsu_bias),
        filters: opts.filters,
      }),
      FirmwareMode::Tricolor => {
        GlyphCodec::Tricolor(TricolorCodec { white: t.white, gray: t.gray, filters: opts.filters })
      }
      FirmwareMode::Nibble => GlyphCodec::Nibble(NibbleCodec { white: t.white, black: t.black }),
    }
  }

  pub fn polarity(&self) -> Polarity {
    match self {
      GlyphCodec::Binary(c) => Polarity::DarkInk { white_threshold: c.white },
      GlyphCodec::Tricolor(c) => Polarity::DarkInk { white_threshold: c.white },
      GlyphCodec::Nibble(_) => Polarity::Inverted,
    }
  }

  /// Encode a region cropped from a plane built with [`Self::polarity`].
  pub fn encode(&self, region: GrayPlane) -> Encoded {
    match self {
      GlyphCodec::Binary(c) => c.encode(region),
      GlyphCodec::Tricolor(c) => c.encode(region),
      GlyphCodec::Nibble(c) => Encoded { bytes: c.encode(&region), white: Some(c.white), ..Encoded::default() },
    }
  }
}

impl BinaryCodec {
  pub fn encode(&self, mut region: GrayPlane) -> Encoded {
    let (w, h) = (region.width(), region.height());
    // Otsu looks at the unfiltered crop
    let otsu = self.otsu_bias.map(|_| otsu::threshold(region.as_slice()));
    let white = match (otsu, self.otsu_bias) {
      (Some(t), Some(bias)) => otsu::biased(t, bias),
      _ => self.white,
    };
    let filter_failures = filter::preprocess(&mut region, &self.filters);

    let mut bin = binary::quantize(&region, white);
    if self.filters.denoise {
      bin = binary::cleanup_pass(&bin, w, h);
    }
    for _ in 0..self.filters.smoothing_passes {
      let next = binary::cleanup_pass(&bin, w, h);
      if next == bin {
        break;
      }
      bin = next;
    }
    for _ in 0..self.filters.stroke_dilation.min(MAX_STROKE_DILATION) {
      bin = binary::dilate(&bin, w, h);
    }
    if otsu.is_some() {
      debug!("binary cutoff {white} ({w}x{h})");
    }
    Encoded { bytes: binary::pack(&bin, w, h), otsu, white: Some(white), filter_failures }
  }
}

impl TricolorCodec {
  pub fn encode(&self, mut region: GrayPlane) -> Encoded {
    let (w, h) = (region.width(), region.height());
    let filter_failures = filter::preprocess(&mut region, &self.filters);
    let mut levels = tricolor::quantize(&region, self.white, self.gray);
    if self.filters.denoise {
      levels = tricolor::denoise(&levels, w, h);
    }
    Encoded { bytes: tricolor::encode(&levels), otsu: None, white: Some(self.white), filter_failures }
  }
}

impl NibbleCodec {
  pub fn encode(&self, region: &GrayPlane) -> Vec<u8> {
    nibble::encode(&nibble::quantize(region, self.white, self.black))
  }
}

/// Per-pixel levels of a `width × height` stream in `mode`'s format.
///
/// Binary yields 1 for ink; tricolor 0/1/2 for white/gray/black; nibble 0..=15 with 15 as
/// background. [`FirmwareMode::level_to_gray`] maps them to intensities.
pub fn decode(mode: FirmwareMode, bytes: &[u8], width: usize, height: usize) -> Result<Vec<u8>, DecodeError> {
  match mode {
    FirmwareMode::Binary => binary::decode(bytes, width, height),
    FirmwareMode::Tricolor => tricolor::decode(bytes, width, height),
    FirmwareMode::Nibble => nibble::decode(bytes, width, height),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::options::Thresholds;
  use proptest::prelude::*;

  fn opts(mode: FirmwareMode) -> ConvertOptions {
    ConvertOptions::new(16.0, mode)
  }

  #[test]
  fn polarity_follows_mode() {
    assert_eq!(GlyphCodec::new(&opts(FirmwareMode::Binary)).polarity(), Polarity::DarkInk { white_threshold: 160 });
    assert_eq!(GlyphCodec::new(&opts(FirmwareMode::Nibble)).polarity(), Polarity::Inverted);
  }

  #[test]
  fn binary_threshold_boundary_single_pixels() {
    let codec = GlyphCodec::new(&opts(FirmwareMode::Binary));
    // smoothing would erase a lone pixel; run without it
    let GlyphCodec::Binary(mut c) = codec else { unreachable!() };
    c.filters.smoothing_passes = 0;
    let ink = c.encode(GrayPlane::filled(1, 1, 159));
    let blank = c.encode(GrayPlane::filled(1, 1, 160));
    assert_eq!(ink.bytes, vec![0x00]);
    assert_eq!(blank.bytes, vec![0x80]);
  }

  #[test]
  fn default_smoothing_erases_lone_speck() {
    let codec = GlyphCodec::new(&opts(FirmwareMode::Binary));
    let out = codec.encode(GrayPlane::filled(1, 1, 0));
    assert_eq!(decode(FirmwareMode::Binary, &out.bytes, 1, 1).unwrap(), vec![0]);
  }

  #[test]
  fn dilation_is_capped() {
    let mut o = opts(FirmwareMode::Binary);
    o.filters.smoothing_passes = 0;
    o.filters.stroke_dilation = 9;
    let mut px = vec![255u8; 11 * 11];
    px[5 * 11 + 5] = 0;
    let out = GlyphCodec::new(&o).encode(GrayPlane::from_vec(11, 11, px).unwrap());
    let levels = decode(FirmwareMode::Binary, &out.bytes, 11, 11).unwrap();
    // three passes grow a 7x7 block
    assert_eq!(levels.iter().filter(|&&v| v == 1).count(), 49);
  }

  #[test]
  fn otsu_overrides_white_cutoff() {
    let mut o = opts(FirmwareMode::Binary);
    o.thresholds = Thresholds { use_otsu: true, otsu_bias: 0, ..Thresholds::default() };
    o.filters.smoothing_passes = 0;
    // 200 would be blank under the default 160 cutoff
    let mut px = vec![250u8; 16];
    px[..8].fill(200);
    let out = GlyphCodec::new(&o).encode(GrayPlane::from_vec(4, 4, px).unwrap());
    assert_eq!(out.otsu, Some(200));
    // cutoff 200 is strict, so nothing is ink yet; a positive bias would pull 200 in
    let levels = decode(FirmwareMode::Binary, &out.bytes, 4, 4).unwrap();
    assert!(levels.iter().all(|&v| v == 0));

    o.thresholds.otsu_bias = 1;
    let out = GlyphCodec::new(&o).encode(GrayPlane::from_vec(4, 4, [vec![200u8; 8], vec![250; 8]].concat()).unwrap());
    let levels = decode(FirmwareMode::Binary, &out.bytes, 4, 4).unwrap();
    assert_eq!(&levels[..8], &[1; 8]);
    assert_eq!(&levels[8..], &[0; 8]);
  }

  #[test]
  fn tricolor_threshold_boundary_single_pixels() {
    let codec = GlyphCodec::new(&opts(FirmwareMode::Tricolor));
    let level = |g| decode(FirmwareMode::Tricolor, &codec.encode(GrayPlane::filled(1, 1, g)).bytes, 1, 1).unwrap()[0];
    assert_eq!(level(200), 0);
    assert_eq!(level(199), 1);
    assert_eq!(level(120), 1);
    assert_eq!(level(119), 2);
  }

  #[test]
  fn nibble_ignores_filters() {
    let mut o = opts(FirmwareMode::Nibble);
    o.filters.gaussian.enabled = true;
    o.filters.gaussian.sigma = Some(f32::NAN);
    let out = GlyphCodec::new(&o).encode(GrayPlane::filled(2, 1, 255));
    assert!(out.filter_failures.is_empty());
    assert_eq!(decode(FirmwareMode::Nibble, &out.bytes, 2, 1).unwrap(), vec![0, 0]);
  }

  #[test]
  fn failed_filter_keeps_encoding() {
    let mut o = opts(FirmwareMode::Tricolor);
    o.filters.gaussian.enabled = true;
    o.filters.gaussian.sigma = Some(f32::INFINITY);
    let out = GlyphCodec::new(&o).encode(GrayPlane::filled(3, 1, 0));
    assert_eq!(out.filter_failures.len(), 1);
    assert_eq!(decode(FirmwareMode::Tricolor, &out.bytes, 3, 1).unwrap(), vec![2, 2, 2]);
  }

  proptest! {
    #[test]
    fn binary_pack_round_trips(w in 1usize..24, h in 1usize..6, seed in any::<u64>()) {
      let bin: Vec<u8> = (0..w * h).map(|i| ((seed >> (i % 64)) & 1) as u8).collect();
      let bytes = binary::pack(&bin, w, h);
      prop_assert_eq!(bytes.len(), binary::row_bytes(w) * h);
      prop_assert_eq!(binary::decode(&bytes, w, h).unwrap(), bin);
    }

    #[test]
    fn tricolor_round_trips(levels in prop::collection::vec(0u8..3, 1..80)) {
      let bytes = tricolor::encode(&levels);
      prop_assert_eq!(tricolor::decode(&bytes, levels.len(), 1).unwrap(), levels);
    }

    #[test]
    fn nibble_round_trips(levels in prop::collection::vec(0u8..16, 1..80)) {
      let bytes = nibble::encode(&levels);
      prop_assert_eq!(nibble::decode(&bytes, 1, levels.len()).unwrap(), levels);
    }
  }
}
