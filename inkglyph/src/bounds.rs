//! Content bounding box detection.

use serde::Serialize;

use crate::plane::GrayPlane;

/// How ink is recognised in a grayscale plane.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Polarity {
  /// Raw red channel; content when `value < 255 - white_threshold`.
  DarkInk { white_threshold: u8 },
  /// Pre-inverted plane; any value above 0 is content so antialiased edges are kept.
  Inverted,
}

impl Polarity {
  /// Whether the plane must be built as `255 - red`.
  #[inline]
  pub fn inverts(self) -> bool {
    matches!(self, Polarity::Inverted)
  }

  #[inline]
  fn is_content(self, v: u8) -> bool {
    match self {
      Polarity::DarkInk { white_threshold } => v < 255 - white_threshold,
      Polarity::Inverted => v > 0,
    }
  }
}

/// Inclusive bounding box of content pixels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ContentBounds {
  pub min_x: usize,
  pub min_y: usize,
  pub max_x: usize,
  pub max_y: usize,
}

impl ContentBounds {
  #[inline]
  pub fn width(&self) -> usize {
    self.max_x - self.min_x + 1
  }

  #[inline]
  pub fn height(&self) -> usize {
    self.max_y - self.min_y + 1
  }

  pub fn crop(&self, plane: &GrayPlane) -> GrayPlane {
    plane.crop(self.min_x, self.min_y, self.max_x, self.max_y)
  }
}

/// Scan the whole plane; `None` when no pixel counts as content.
pub fn detect(plane: &GrayPlane, polarity: Polarity) -> Option<ContentBounds> {
  let mut found: Option<ContentBounds> = None;
  for y in 0..plane.height() {
    for (x, &v) in plane.row(y).iter().enumerate() {
      if !polarity.is_content(v) {
        continue;
      }
      found = Some(match found {
        None => ContentBounds { min_x: x, min_y: y, max_x: x, max_y: y },
        Some(b) => ContentBounds { min_x: b.min_x.min(x), min_y: b.min_y, max_x: b.max_x.max(x), max_y: y },
      });
    }
  }
  found
}

#[cfg(test)]
mod tests {
  use super::*;

  fn plane(w: usize, h: usize, px: &[(usize, usize, u8)], bg: u8) -> GrayPlane {
    let mut p = GrayPlane::filled(w, h, bg);
    for &(x, y, v) in px {
      p.as_mut_slice()[y * w + x] = v;
    }
    p
  }

  #[test]
  fn dark_ink_threshold_is_strict() {
    // white_threshold 160 → content below 95
    let pol = Polarity::DarkInk { white_threshold: 160 };
    let p = plane(6, 4, &[(1, 1, 95), (4, 2, 94)], 255);
    assert_eq!(detect(&p, pol), Some(ContentBounds { min_x: 4, min_y: 2, max_x: 4, max_y: 2 }));
  }

  #[test]
  fn inverted_keeps_faint_edges() {
    let p = plane(8, 5, &[(2, 1, 1), (6, 3, 200)], 0);
    let b = detect(&p, Polarity::Inverted).unwrap();
    assert_eq!(b, ContentBounds { min_x: 2, min_y: 1, max_x: 6, max_y: 3 });
    assert_eq!((b.width(), b.height()), (5, 3));
  }

  #[test]
  fn blank_plane_has_no_bounds() {
    assert_eq!(detect(&GrayPlane::filled(4, 4, 255), Polarity::DarkInk { white_threshold: 0 }), None);
    assert_eq!(detect(&GrayPlane::filled(4, 4, 0), Polarity::Inverted), None);
  }
}
