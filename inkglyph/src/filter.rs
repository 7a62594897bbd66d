//! Optional grayscale smoothing applied to a cropped glyph region before quantization.
//!
//! Both filters compute into a scratch buffer and only write back once every sample is known to
//! be valid, so a failing filter leaves the region exactly as it was.

use log::warn;

use crate::error::FilterError;
use crate::options::{BilateralOptions, FilterOptions, GaussianOptions};
use crate::plane::GrayPlane;

pub const MAX_GAUSSIAN_RADIUS: u32 = 10;
pub const MAX_BILATERAL_RADIUS: u32 = 8;

fn check_shape(gray: &[u8], width: usize, height: usize) -> Result<(), FilterError> {
  let expected = width * height;
  if gray.len() != expected {
    return Err(FilterError::Shape { expected, got: gray.len() });
  }
  Ok(())
}

fn write_back(gray: &mut [u8], out: &[f32]) -> Result<(), FilterError> {
  if out.iter().any(|v| !v.is_finite()) {
    return Err(FilterError::NonFinite);
  }
  for (dst, &v) in gray.iter_mut().zip(out) {
    *dst = v.round().clamp(0.0, 255.0) as u8;
  }
  Ok(())
}

/// Separable Gaussian blur, in place.
///
/// `radius` is clamped to `1..=10`, so 0 blurs like 1. `sigma` defaults to the radius. Taps falling outside the region are skipped and the kernel is not renormalized, so
/// edges darken towards the background.
pub fn gaussian_blur(
  gray: &mut [u8],
  width: usize,
  height: usize,
  radius: u32,
  sigma: Option<f32>,
) -> Result<(), FilterError> {
  check_shape(gray, width, height)?;
  let r = radius.clamp(1, MAX_GAUSSIAN_RADIUS) as isize;
  let sigma = match sigma {
    Some(s) if s.is_nan() || s.is_infinite() => return Err(FilterError::Parameter("gaussian sigma")),
    Some(s) if s > 0.0 => s,
    _ => r as f32,
  };

  let two_sigma2 = 2.0 * sigma * sigma;
  let mut kernel: Vec<f32> = (-r..=r).map(|i| (-((i * i) as f32) / two_sigma2).exp()).collect();
  let ksum: f32 = kernel.iter().sum();
  kernel.iter_mut().for_each(|k| *k /= ksum);

  let (w, h) = (width as isize, height as isize);
  let mut tmp = vec![0f32; gray.len()];
  for y in 0..h {
    for x in 0..w {
      let mut acc = 0f32;
      for k in -r..=r {
        let xx = x + k;
        if (0..w).contains(&xx) {
          acc += f32::from(gray[(y * w + xx) as usize]) * kernel[(k + r) as usize];
        }
      }
      tmp[(y * w + x) as usize] = acc;
    }
  }

  let mut out = vec![0f32; gray.len()];
  for y in 0..h {
    for x in 0..w {
      let mut acc = 0f32;
      for k in -r..=r {
        let yy = y + k;
        if (0..h).contains(&yy) {
          acc += tmp[(yy * w + x) as usize] * kernel[(k + r) as usize];
        }
      }
      out[(y * w + x) as usize] = acc;
    }
  }
  write_back(gray, &out)
}

/// Edge-preserving bilateral filter, in place.
///
/// Weight is spatial Gaussian times range Gaussian over the `(2r+1)²` window, normalized by the
/// weights actually sampled; a pixel with no sampled weight keeps its value. `radius` is clamped to
/// `1..=8`.
pub fn bilateral_filter(
  gray: &mut [u8],
  width: usize,
  height: usize,
  radius: u32,
  sigma_space: f32,
  sigma_range: f32,
) -> Result<(), FilterError> {
  check_shape(gray, width, height)?;
  let r = radius.clamp(1, MAX_BILATERAL_RADIUS) as isize;
  if !sigma_space.is_finite() {
    return Err(FilterError::Parameter("bilateral sigma_space"));
  }
  if !sigma_range.is_finite() {
    return Err(FilterError::Parameter("bilateral sigma_range"));
  }
  let sigma_space = if sigma_space > 0.0 { sigma_space } else { (r as f32).max(1.0) };
  let sigma_range = if sigma_range > 0.0 { sigma_range } else { 25.0 };

  let two_space2 = 2.0 * sigma_space * sigma_space;
  let two_range2 = 2.0 * sigma_range * sigma_range;
  let side = (2 * r + 1) as usize;
  let mut spatial = Vec::with_capacity(side * side);
  for oy in -r..=r {
    for ox in -r..=r {
      spatial.push((-((ox * ox + oy * oy) as f32) / two_space2).exp());
    }
  }

  let (w, h) = (width as isize, height as isize);
  let mut out = vec![0f32; gray.len()];
  for y in 0..h {
    for x in 0..w {
      let center = f32::from(gray[(y * w + x) as usize]);
      let (mut acc, mut wsum) = (0f32, 0f32);
      for oy in -r..=r {
        let yy = y + oy;
        if !(0..h).contains(&yy) {
          continue;
        }
        for ox in -r..=r {
          let xx = x + ox;
          if !(0..w).contains(&xx) {
            continue;
          }
          let val = f32::from(gray[(yy * w + xx) as usize]);
          let d = val - center;
          let weight = spatial[((oy + r) as usize) * side + (ox + r) as usize] * (-(d * d) / two_range2).exp();
          acc += val * weight;
          wsum += weight;
        }
      }
      out[(y * w + x) as usize] = if wsum > 0.0 { acc / wsum } else { center };
    }
  }
  write_back(gray, &out)
}

fn run_gaussian(plane: &mut GrayPlane, opts: &GaussianOptions) -> Result<(), FilterError> {
  let (w, h) = (plane.width(), plane.height());
  gaussian_blur(plane.as_mut_slice(), w, h, opts.radius, opts.sigma)
}

fn run_bilateral(plane: &mut GrayPlane, opts: &BilateralOptions) -> Result<(), FilterError> {
  let (w, h) = (plane.width(), plane.height());
  bilateral_filter(plane.as_mut_slice(), w, h, opts.radius, opts.sigma_space, opts.sigma_range)
}

/// Apply the enabled filters (Gaussian first, then bilateral).
///
/// Failures are logged and returned; the region keeps whatever the last successful filter
/// produced.
pub fn preprocess(plane: &mut GrayPlane, filters: &FilterOptions) -> Vec<FilterError> {
  let mut failures = Vec::new();
  if filters.gaussian.enabled {
    if let Err(e) = run_gaussian(plane, &filters.gaussian) {
      warn!("gaussian blur skipped: {e}");
      failures.push(e);
    }
  }
  if filters.bilateral.enabled {
    if let Err(e) = run_bilateral(plane, &filters.bilateral) {
      warn!("bilateral filter skipped: {e}");
      failures.push(e);
    }
  }
  failures
}
