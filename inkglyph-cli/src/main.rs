mod charset;

use anyhow::{Context, Result, anyhow, bail};
use clap::{ArgAction, Parser};
use inkglyph::{BatchRequest, ConvertOptions, FirmwareMode, preview};
use log::info;
use std::ffi::OsString;
use std::{fs, path::Path, path::PathBuf};

// ---------------------------------------------
// inkglyph: e-paper glyph bitmap builder
//   --font <ttf> --size <px> [--range A:B]* [--charset-file <txt>] --output <base>
// Produces <base>.bitmap (concatenated glyph streams) and <base>.entries.json (glyph table).
// ---------------------------------------------
#[derive(Parser, Debug)]
#[command(
  name = "inkglyph",
  author,
  version,
  about = "inkglyph: convert a TTF/OTF font into e-paper firmware glyph bitmaps",
  long_about = None
)]
struct Cli {
  /// Path to a TrueType/OpenType font or collection
  #[arg(long = "font")]
  font: PathBuf,

  /// Face within a font collection
  #[arg(long = "face-index")]
  face_index: Option<usize>,

  /// Pixel size to render at (overrides --config)
  #[arg(long = "size")]
  size: Option<f64>,

  /// Firmware format: binary (readpaper), tricolor (readpaper_v3) or nibble (edc)
  #[arg(long = "mode")]
  mode: Option<FirmwareMode>,

  /// Character range(s), inclusive, format START:END (single scalars). Repeatable.
  /// Examples:
  ///   --range " :~"     (printable ASCII incl. space)
  ///   --range "0:9" --range "A:Z" --range "a:z"
  #[arg(long = "range", action = ArgAction::Append)]
  ranges: Vec<String>,

  /// Text file whose characters are appended to the charset (line breaks ignored)
  #[arg(long = "charset-file")]
  charset_file: Option<PathBuf>,

  /// JSON file with conversion options; flags below override it
  #[arg(long = "config")]
  config: Option<PathBuf>,

  /// White cutoff
  #[arg(long = "white")]
  white: Option<u8>,

  /// Gray cutoff (tricolor)
  #[arg(long = "gray")]
  gray: Option<u8>,

  /// Black cutoff (nibble)
  #[arg(long = "black")]
  black: Option<u8>,

  /// Pick the white cutoff per glyph with Otsu's method (binary)
  #[arg(long = "otsu", default_value_t = false)]
  otsu: bool,

  /// Added to the Otsu threshold
  #[arg(long = "otsu-bias", allow_hyphen_values = true)]
  otsu_bias: Option<i16>,

  /// Morphological (binary) or majority-vote (tricolor) denoising
  #[arg(long = "denoise", default_value_t = false)]
  denoise: bool,

  /// Enable the Gaussian blur with this radius (1-10, 0 counts as 1)
  #[arg(long = "gaussian-radius")]
  gaussian_radius: Option<u32>,

  #[arg(long = "gaussian-sigma")]
  gaussian_sigma: Option<f32>,

  /// Enable the bilateral filter with this radius (1-8, 0 counts as 1)
  #[arg(long = "bilateral-radius")]
  bilateral_radius: Option<u32>,

  #[arg(long = "bilateral-sigma-space")]
  bilateral_sigma_space: Option<f32>,

  #[arg(long = "bilateral-sigma-range")]
  bilateral_sigma_range: Option<f32>,

  /// Stroke dilation passes (binary, 0-3)
  #[arg(long = "dilate")]
  dilate: Option<u8>,

  /// Safe smoothing passes (binary)
  #[arg(long = "smoothing")]
  smoothing: Option<u32>,

  /// Keep entries for characters the font has no glyph for
  #[arg(long = "keep-missing", default_value_t = false)]
  keep_missing: bool,

  /// Also write <output>.sheet.png and <output>.diagnostics.json
  #[arg(long = "preview", default_value_t = false)]
  preview: bool,

  /// Render this text with the converted glyphs to <output>.demo.png
  #[arg(long = "demo")]
  demo: Option<String>,

  /// Output base path
  #[arg(short, long)]
  output: PathBuf,
}

impl Cli {
  fn options(&self) -> Result<ConvertOptions> {
    let mut opts = match &self.config {
      Some(path) => {
        let text = fs::read_to_string(path).with_context(|| format!("read config {:?}", path))?;
        ConvertOptions::from_json(&text).with_context(|| format!("parse config {:?}", path))?
      }
      None => ConvertOptions::default(),
    };
    if self.config.is_none() && self.size.is_none() {
      bail!("--size is required unless --config provides it");
    }
    if let Some(size) = self.size {
      opts.size = size;
    }
    if let Some(mode) = self.mode {
      opts.mode = mode;
    }
    if let Some(i) = self.face_index {
      opts.face_index = i;
    }

    let t = &mut opts.thresholds;
    t.white = self.white.or(t.white);
    t.gray = self.gray.or(t.gray);
    t.black = self.black.or(t.black);
    t.use_otsu |= self.otsu;
    t.otsu_bias = self.otsu_bias.unwrap_or(t.otsu_bias);

    let f = &mut opts.filters;
    f.denoise |= self.denoise;
    if let Some(r) = self.gaussian_radius {
      f.gaussian.enabled = true;
      f.gaussian.radius = r;
    }
    f.gaussian.sigma = self.gaussian_sigma.or(f.gaussian.sigma);
    if let Some(r) = self.bilateral_radius {
      f.bilateral.enabled = true;
      f.bilateral.radius = r;
    }
    f.bilateral.sigma_space = self.bilateral_sigma_space.unwrap_or(f.bilateral.sigma_space);
    f.bilateral.sigma_range = self.bilateral_sigma_range.unwrap_or(f.bilateral.sigma_range);
    f.stroke_dilation = self.dilate.unwrap_or(f.stroke_dilation);
    f.smoothing_passes = self.smoothing.unwrap_or(f.smoothing_passes);

    opts.validate().context("invalid options")?;
    Ok(opts)
  }
}

/// `<base>.<suffix>` without touching an extension already on `base`.
fn sidecar(base: &Path, suffix: &str) -> PathBuf {
  let mut s: OsString = base.as_os_str().to_owned();
  s.push(".");
  s.push(suffix);
  PathBuf::from(s)
}

fn write(path: &Path, bytes: &[u8]) -> Result<()> {
  fs::write(path, bytes).with_context(|| format!("write {:?}", path))
}

fn main() -> Result<()> {
  env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
  let cli = Cli::parse();

  let opts = cli.options()?;
  let ranges = charset::parse_ranges(&cli.ranges)?;
  let extra = match &cli.charset_file {
    Some(path) => fs::read_to_string(path).with_context(|| format!("read charset {:?}", path))?,
    None => String::new(),
  };
  let chars = charset::build(&ranges, &extra, cli.charset_file.is_some());
  if chars.is_empty() {
    bail!("charset is empty");
  }

  let font_data = fs::read(&cli.font).with_context(|| format!("read font {:?}", cli.font))?;
  let mode = opts.mode;
  let request = BatchRequest { font_data, charset: chars, options: opts };

  let task = inkglyph::task::spawn(request).context("start conversion")?;
  let mut out = task
    .wait(|processed| info!("{processed} glyphs processed"))
    .map_err(|msg| anyhow!(msg))
    .context("convert font")?;

  if cli.keep_missing {
    info!("kept {} entries for characters missing from the font", out.missing_count());
  } else {
    let dropped = out.strip_missing();
    if dropped > 0 {
      info!("dropped {dropped} characters missing from the font");
    }
  }

  let bitmap_path = sidecar(&cli.output, "bitmap");
  let entries_path = sidecar(&cli.output, "entries.json");
  write(&bitmap_path, &out.bitmap)?;
  write(&entries_path, serde_json::to_string_pretty(&out.entries)?.as_bytes())?;

  if cli.preview {
    let sheet = preview::contact_sheet(&out, mode, 16).context("build contact sheet")?;
    write(&sidecar(&cli.output, "sheet.png"), &preview::encode_png(&sheet)?)?;
    write(
      &sidecar(&cli.output, "diagnostics.json"),
      serde_json::to_string_pretty(&out.diagnostics)?.as_bytes(),
    )?;
  }

  if let Some(text) = &cli.demo {
    let line_height = out.diagnostics.canvas.map_or(32, |c| (c.ascender_px + c.descender_px).max(1) as u32);
    let img = preview::render_text(&out, mode, text, line_height).context("render demo text")?;
    write(&sidecar(&cli.output, "demo.png"), &preview::encode_png(&img)?)?;
  }

  eprintln!(
    "wrote {} glyphs, {} bitmap bytes to {}",
    out.entries.len(),
    out.bitmap.len(),
    bitmap_path.display()
  );
  Ok(())
}
