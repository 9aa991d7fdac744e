use thiserror::Error;

#[derive(Debug, PartialEq, Eq, Error)]
pub enum DecompressError {
    #[error("surface dimensions {width} x {height} contain no pixels")]
    InvalidDimensions { width: u32, height: u32 },

    #[error("format tag {format} is not a supported DXTC format")]
    UnsupportedFormat { format: u32 },

    #[error("surface byte count for {width} x {height} would overflow")]
    PixelCountWouldOverflow { width: u32, height: u32 },

    #[error("expected compressed data to have exactly {expected} bytes but found {actual}")]
    InvalidBufferSize { expected: usize, actual: usize },

    #[error("expected output raster to have exactly {expected} bytes but found {actual}")]
    InvalidRasterSize { expected: usize, actual: usize },
}
