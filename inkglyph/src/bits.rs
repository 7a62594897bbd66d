//! MSB-first bit streams shared by the prefix-coded formats.

#[derive(Default, Debug)]
pub struct BitWriter {
  bytes: Vec<u8>,
  cur: u8,
  used: u8,
}

impl BitWriter {
  pub fn new() -> Self {
    Self::default()
  }

  #[inline]
  pub fn push(&mut self, bit: bool) {
    self.cur = (self.cur << 1) | bit as u8;
    self.used += 1;
    if self.used == 8 {
      self.bytes.push(self.cur);
      self.cur = 0;
      self.used = 0;
    }
  }

  /// Write the low `n` bits of `value`, most significant first.
  pub fn push_bits(&mut self, value: u32, n: u8) {
    for i in (0..n).rev() {
      self.push((value >> i) & 1 != 0);
    }
  }

  /// Zero-pad the trailing partial byte and return the stream.
  pub fn finish(mut self) -> Vec<u8> {
    if self.used > 0 {
      self.bytes.push(self.cur << (8 - self.used));
    }
    self.bytes
  }
}

pub struct BitReader<'a> {
  bytes: &'a [u8],
  pos: usize,
}

impl<'a> BitReader<'a> {
  pub fn new(bytes: &'a [u8]) -> Self {
    Self { bytes, pos: 0 }
  }

  #[inline]
  pub fn read(&mut self) -> Option<bool> {
    let byte = *self.bytes.get(self.pos / 8)?;
    let bit = (byte >> (7 - self.pos % 8)) & 1 != 0;
    self.pos += 1;
    Some(bit)
  }

  pub fn read_bits(&mut self, n: u8) -> Option<u32> {
    let mut v = 0u32;
    for _ in 0..n {
      v = (v << 1) | self.read()? as u32;
    }
    Some(v)
  }
}
