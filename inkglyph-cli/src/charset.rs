use anyhow::{Result, anyhow, bail};

/// Parse `START:END` ranges (inclusive, single scalars each side).
pub fn parse_ranges(ranges: &[String]) -> Result<Vec<(char, char)>> {
  let mut out = Vec::with_capacity(ranges.len());
  for s in ranges {
    // split on the middle colon so ":" itself can be a bound ("!::" or "::@")
    let chars: Vec<char> = s.chars().collect();
    let (a, b) = match chars.as_slice() {
      [a, ':', b] => (*a, *b),
      _ => {
        let mut parts = s.split(':');
        let a = parts.next().ok_or_else(|| anyhow!("bad --range: {s}"))?;
        let b = parts.next().ok_or_else(|| anyhow!("bad --range (missing end): {s}"))?;
        if parts.next().is_some() {
          bail!("bad --range (too many colons): {s}");
        }
        (single(a, "start", s)?, single(b, "end", s)?)
      }
    };
    if b < a {
      bail!("range end < start: {s}");
    }
    out.push((a, b));
  }
  Ok(out)
}

fn single(part: &str, which: &str, whole: &str) -> Result<char> {
  let mut it = part.chars();
  let c = it.next().ok_or_else(|| anyhow!("empty {which} in --range: {whole}"))?;
  if it.next().is_some() {
    bail!("{which} must be a single scalar: {whole}");
  }
  Ok(c)
}

/// Ranges first, then the characters of `extra` in file order (line breaks dropped).
///
/// With neither ranges nor a charset file, printable ASCII including space is used.
/// Duplicates are kept: the batch emits one entry per requested character.
pub fn build(ranges: &[(char, char)], extra: &str, has_file: bool) -> Vec<String> {
  let default = [(' ', '~')];
  let ranges = if ranges.is_empty() && !has_file { &default[..] } else { ranges };
  let mut out: Vec<String> = ranges.iter().flat_map(|&(a, b)| a..=b).map(String::from).collect();
  out.extend(extra.chars().filter(|c| !matches!(c, '\n' | '\r' | '\u{FEFF}')).map(String::from));
  out
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_ranges() {
    let r = parse_ranges(&["0:9".into(), "A:C".into(), "!::".into()]).unwrap();
    assert_eq!(r, vec![('0', '9'), ('A', 'C'), ('!', ':')]);
    assert!(parse_ranges(&["z:a".into()]).is_err());
    assert!(parse_ranges(&["ab:c".into()]).is_err());
    assert!(parse_ranges(&["a".into()]).is_err());
  }

  #[test]
  fn default_is_printable_ascii() {
    let set = build(&[], "", false);
    assert_eq!(set.len(), 95);
    assert_eq!(set.first().map(String::as_str), Some(" "));
  }

  #[test]
  fn file_characters_follow_ranges() {
    let set = build(&[('a', 'b')], "中\r\n文中\n", true);
    assert_eq!(set, vec!["a", "b", "中", "文", "中"]);
    assert!(build(&[], "", true).is_empty());
  }
}
