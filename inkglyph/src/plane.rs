/// A row-major 8-bit grayscale plane.
///
/// Built from the red channel of a surface readback, optionally inverted (`255 - red`) for the
/// ink-is-light polarity, then cropped to the content bounds for filtering and encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GrayPlane {
  width: usize,
  height: usize,
  data: Vec<u8>,
}

impl GrayPlane {
  /// Returns `None` when `data.len() != width * height`.
  pub fn from_vec(width: usize, height: usize, data: Vec<u8>) -> Option<Self> {
    if data.len() != width.checked_mul(height)? {
      return None;
    }
    Some(Self { width, height, data })
  }

  pub fn filled(width: usize, height: usize, value: u8) -> Self {
    Self { width, height, data: vec![value; width * height] }
  }

  /// Red channel of an RGBA buffer; `invert` stores `255 - red` instead.
  pub fn from_rgba(rgba: &[u8], width: usize, height: usize, invert: bool) -> Self {
    let n = width * height;
    let mut data = Vec::with_capacity(n);
    for px in rgba.chunks_exact(4).take(n) {
      data.push(if invert { 255 - px[0] } else { px[0] });
    }
    // short readbacks count as background
    data.resize(n, if invert { 0 } else { 255 });
    Self { width, height, data }
  }

  #[inline]
  pub fn width(&self) -> usize {
    self.width
  }

  #[inline]
  pub fn height(&self) -> usize {
    self.height
  }

  #[inline]
  pub fn row(&self, y: usize) -> &[u8] {
    &self.data[y * self.width..(y + 1) * self.width]
  }

  #[inline]
  pub fn as_slice(&self) -> &[u8] {
    &self.data
  }

  #[inline]
  pub fn as_mut_slice(&mut self) -> &mut [u8] {
    &mut self.data
  }

  /// Copy out the inclusive rectangle `[x0..=x1] × [y0..=y1]`.
  pub fn crop(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> GrayPlane {
    let w = x1 + 1 - x0;
    let h = y1 + 1 - y0;
    let mut data = Vec::with_capacity(w * h);
    for y in y0..=y1 {
      data.extend_from_slice(&self.row(y)[x0..=x1]);
    }
    GrayPlane { width: w, height: h, data }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn reads_red_channel() {
    let rgba = [10, 99, 99, 255, 200, 0, 0, 255];
    let p = GrayPlane::from_rgba(&rgba, 2, 1, false);
    assert_eq!(p.as_slice(), &[10, 200]);
    let inv = GrayPlane::from_rgba(&rgba, 2, 1, true);
    assert_eq!(inv.as_slice(), &[245, 55]);
  }

  #[test]
  fn crop_is_inclusive() {
    let p = GrayPlane::from_vec(3, 3, (0..9).collect()).unwrap();
    let c = p.crop(1, 1, 2, 2);
    assert_eq!((c.width(), c.height()), (2, 2));
    assert_eq!(c.as_slice(), &[4, 5, 7, 8]);
  }

  #[test]
  fn from_vec_checks_shape() {
    assert!(GrayPlane::from_vec(2, 2, vec![0; 3]).is_none());
  }
}
