//! Decode DXTC (S3TC) block compressed texture data to uncompressed RGBA.
//!
//! The input is a single mipmap of compressed blocks without any file header.
//! Container formats like DDS should be parsed by the caller.
//!
//! ```rust
//! # fn main() -> Result<(), dxtc::DecompressError> {
//! // A single DXT1 block with both reference colors set to white.
//! let block = [0xFF, 0xFF, 0xFF, 0xFF, 0, 0, 0, 0];
//! let raster = dxtc::decompress(&block, 3, 3, 1)?;
//! assert_eq!(vec![255u8; 3 * 3 * 4], raster.data);
//! # Ok(())
//! # }
//! ```
pub mod block;
pub mod color;
mod decode;
mod error;

pub use color::{Color16, DEFAULT_GAMMA};
pub use decode::*;
pub use error::DecompressError;

/// The compression variant for all blocks in a surface.
///
/// The discriminant is the format tag used by asset formats and [decompress].
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, strum::EnumIter, strum::Display)]
pub enum Format {
    /// Opaque RGB color with 8 bytes per block.
    #[strum(serialize = "DXT1")]
    Dxt1 = 1,
    /// RGB color with 1 bit punch-through alpha and 8 bytes per block.
    #[strum(serialize = "DXT1A")]
    Dxt1a = 2,
    /// RGB color with explicit 4 bit alpha and 16 bytes per block.
    #[strum(serialize = "DXT3")]
    Dxt3 = 3,
    /// RGB color with interpolated alpha and 16 bytes per block.
    #[strum(serialize = "DXT5")]
    Dxt5 = 4,
}

impl Format {
    pub fn block_size_in_bytes(&self) -> usize {
        match self {
            Format::Dxt1 => 8,
            Format::Dxt1a => 8,
            Format::Dxt3 => 16,
            Format::Dxt5 => 16,
        }
    }

    pub fn tag(&self) -> u32 {
        *self as u32
    }
}

impl TryFrom<u32> for Format {
    type Error = DecompressError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Format::Dxt1),
            2 => Ok(Format::Dxt1a),
            3 => Ok(Format::Dxt3),
            4 => Ok(Format::Dxt5),
            _ => Err(DecompressError::UnsupportedFormat { format: value }),
        }
    }
}

/// The number of compressed bytes for a `width` x `height` surface in the given `format`.
///
/// Partial blocks at the right and bottom edges are counted as full blocks.
/// Returns [None] if the size would overflow.
pub fn dxtc_size(width: u32, height: u32, format: Format) -> Option<usize> {
    div_round_up(width as usize, block::BLOCK_WIDTH)
        .checked_mul(div_round_up(height as usize, block::BLOCK_HEIGHT))?
        .checked_mul(format.block_size_in_bytes())
}

fn div_round_up(x: usize, d: usize) -> usize {
    x.div_ceil(d)
}
