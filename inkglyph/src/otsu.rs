//! Otsu's threshold over an 8-bit histogram.

/// Threshold maximizing the between-class variance.
///
/// An empty region yields 128. A degenerate histogram (single value, or the optimum at an end of
/// the range) is pulled into `1..=254`, with 0 mapping to 128.
pub fn threshold(samples: &[u8]) -> u8 {
  if samples.is_empty() {
    return 128;
  }
  let mut hist = [0u64; 256];
  for &s in samples {
    hist[s as usize] += 1;
  }
  let n = samples.len() as f64;
  let sum: f64 = hist.iter().enumerate().map(|(t, &c)| t as f64 * c as f64).sum();

  let (mut sum_b, mut w_b) = (0f64, 0f64);
  let mut max_var = -1f64;
  let mut thresh = 0usize;
  for (t, &c) in hist.iter().enumerate() {
    w_b += c as f64;
    if w_b == 0.0 {
      continue;
    }
    let w_f = n - w_b;
    if w_f == 0.0 {
      break;
    }
    sum_b += t as f64 * c as f64;
    let m_b = sum_b / w_b;
    let m_f = (sum - sum_b) / w_f;
    let between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
    if between > max_var {
      max_var = between;
      thresh = t;
    }
  }
  match thresh {
    0 => 128,
    t if t >= 255 => 254,
    t => t as u8,
  }
}

/// `threshold + bias`, clamped to a valid cutoff.
pub fn biased(threshold: u8, bias: i16) -> u8 {
  (i32::from(threshold) + i32::from(bias)).clamp(0, 255) as u8
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn splits_bimodal_histogram() {
    let mut s = vec![20u8; 50];
    s.extend(vec![230u8; 50]);
    let t = threshold(&s);
    assert!((20..230).contains(&t), "threshold {t}");
  }

  #[test]
  fn degenerate_inputs_fall_back() {
    assert_eq!(threshold(&[]), 128);
    assert_eq!(threshold(&[77; 10]), 128);
  }

  #[test]
  fn bias_saturates() {
    assert_eq!(biased(250, 20), 255);
    assert_eq!(biased(5, -20), 0);
    assert_eq!(biased(100, -10), 90);
  }
}
