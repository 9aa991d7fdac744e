use std::path::PathBuf;
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use env_logger::Env;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    Dxt1,
    Dxt1a,
    Dxt3,
    Dxt5,
}

impl From<FormatArg> for dxtc::Format {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Dxt1 => dxtc::Format::Dxt1,
            FormatArg::Dxt1a => dxtc::Format::Dxt1a,
            FormatArg::Dxt3 => dxtc::Format::Dxt3,
            FormatArg::Dxt5 => dxtc::Format::Dxt5,
        }
    }
}

/// Decode a raw DXTC payload and save it as an image.
///
/// The output image format is chosen from the output file extension.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// File containing the compressed blocks
    input: PathBuf,
    /// Image file to write
    output: PathBuf,
    /// Width of the surface in pixels
    #[arg(long)]
    width: u32,
    /// Height of the surface in pixels
    #[arg(long)]
    height: u32,
    #[arg(long, value_enum)]
    format: FormatArg,
    /// Raise color channels to this power before saving
    #[arg(long)]
    gamma: Option<f64>,
    /// Number of header bytes to skip before the first block
    #[arg(long, default_value_t = 0)]
    offset: usize,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let format = dxtc::Format::from(cli.format);

    let bytes = std::fs::read(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let size = dxtc::dxtc_size(cli.width, cli.height, format)
        .ok_or_else(|| anyhow!("{}x{} surface is too large", cli.width, cli.height))?;
    let data = payload(&bytes, cli.offset, size)?;
    if bytes.len() > cli.offset + size {
        log::warn!(
            "Ignoring {} trailing bytes after the base level",
            bytes.len() - cli.offset - size
        );
    }

    let start = Instant::now();
    let rgba = match cli.gamma {
        Some(gamma) => {
            let raster = dxtc::rgbaf32_from_dxtc(cli.width, cli.height, data, format, gamma)
                .context("failed to decode surface")?;
            quantize(&raster.data)
        }
        None => dxtc::rgba8_from_dxtc(cli.width, cli.height, data, format)
            .context("failed to decode surface")?,
    };
    log::info!("Decompressed {format} data in {:?}", start.elapsed());

    let image = image::RgbaImage::from_raw(cli.width, cli.height, rgba)
        .ok_or_else(|| anyhow!("decoded data does not match the image dimensions"))?;
    image
        .save(&cli.output)
        .with_context(|| format!("failed to save {}", cli.output.display()))?;
    log::info!("Saved {}", cli.output.display());

    Ok(())
}

fn payload(bytes: &[u8], offset: usize, size: usize) -> Result<&[u8]> {
    offset
        .checked_add(size)
        .and_then(|end| bytes.get(offset..end))
        .ok_or_else(|| {
            anyhow!(
                "expected {size} bytes after offset {offset} but the file has {} bytes",
                bytes.len()
            )
        })
}

fn quantize(rgba: &[f32]) -> Vec<u8> {
    rgba.iter()
        .map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8)
        .collect()
}
