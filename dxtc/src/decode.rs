use bytemuck::Pod;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

use crate::{
    block::{Dxt1, Dxt1a, Dxt3, Dxt5, DxtcDecode, Texel, BLOCK_HEIGHT, BLOCK_WIDTH},
    error::DecompressError,
    Format, DEFAULT_GAMMA,
};

const CHANNELS: usize = 4;

/// An uncompressed RGBA8 raster with 4 bytes per pixel.
#[derive(Debug, PartialEq, Eq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RasterRgba8 {
    /// The width of the raster in pixels.
    pub width: u32,
    /// The height of the raster in pixels.
    pub height: u32,
    /// Row-major pixel data without padding.
    pub data: Vec<u8>,
}

/// An uncompressed RGBA raster with 4 floats per pixel in the range `0.0` to `1.0`.
#[derive(Debug, PartialEq, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RasterRgbaf32 {
    /// The width of the raster in pixels.
    pub width: u32,
    /// The height of the raster in pixels.
    pub height: u32,
    /// Row-major pixel data without padding.
    pub data: Vec<f32>,
}

/// Decompress `data` for a `width` x `height` surface with the given format tag.
///
/// See [Format] for the supported tags.
/// All inputs are validated before any blocks are decoded.
pub fn decompress(
    data: &[u8],
    width: u32,
    height: u32,
    format: u32,
) -> Result<RasterRgba8, DecompressError> {
    validate_dimensions(width, height)?;
    let format = Format::try_from(format)?;
    let data = rgba8_from_dxtc(width, height, data, format)?;
    Ok(RasterRgba8 {
        width,
        height,
        data,
    })
}

/// Decompress the bytes in `data` to the uncompressed RGBA8 format.
pub fn rgba8_from_dxtc(
    width: u32,
    height: u32,
    data: &[u8],
    format: Format,
) -> Result<Vec<u8>, DecompressError> {
    validate(width, height, data, format)?;

    let mut rgba = vec![0u8; raster_len(width, height)?];
    decode_format(width, height, data, format, DEFAULT_GAMMA, &mut rgba)?;
    Ok(rgba)
}

/// Decompress the bytes in `data` into the caller owned RGBA8 buffer `rgba`.
///
/// The buffer must have exactly `width * height * 4` bytes.
pub fn decode_into_rgba8(
    width: u32,
    height: u32,
    data: &[u8],
    format: Format,
    rgba: &mut [u8],
) -> Result<(), DecompressError> {
    validate(width, height, data, format)?;

    let expected = raster_len(width, height)?;
    if rgba.len() != expected {
        return Err(DecompressError::InvalidRasterSize {
            expected,
            actual: rgba.len(),
        });
    }

    decode_format(width, height, data, format, DEFAULT_GAMMA, rgba)
}

/// Decompress the bytes in `data` to RGBAF32 with color channels raised to the power `gamma`.
///
/// Use [DEFAULT_GAMMA] to match the historical display correction.
pub fn rgbaf32_from_dxtc(
    width: u32,
    height: u32,
    data: &[u8],
    format: Format,
    gamma: f64,
) -> Result<RasterRgbaf32, DecompressError> {
    validate(width, height, data, format)?;

    let mut rgba = vec![0.0f32; raster_len(width, height)?];
    decode_format(width, height, data, format, gamma, &mut rgba)?;
    Ok(RasterRgbaf32 {
        width,
        height,
        data: rgba,
    })
}

/// Decompress a single 4x4 block to RGBA8 pixels in row-major order.
pub fn decode_block_rgba8(
    block: &[u8],
    format: Format,
) -> Result<[[[u8; CHANNELS]; BLOCK_WIDTH]; BLOCK_HEIGHT], DecompressError> {
    let width = BLOCK_WIDTH as u32;
    let height = BLOCK_HEIGHT as u32;
    validate(width, height, block, format)?;

    let mut pixels = [[[0u8; CHANNELS]; BLOCK_WIDTH]; BLOCK_HEIGHT];
    decode_format(
        width,
        height,
        block,
        format,
        DEFAULT_GAMMA,
        bytemuck::cast_slice_mut::<_, u8>(&mut pixels),
    )?;
    Ok(pixels)
}

fn validate_dimensions(width: u32, height: u32) -> Result<(), DecompressError> {
    if width == 0 || height == 0 {
        return Err(DecompressError::InvalidDimensions { width, height });
    }
    Ok(())
}

fn validate(width: u32, height: u32, data: &[u8], format: Format) -> Result<(), DecompressError> {
    validate_dimensions(width, height)?;

    // Surface dimensions may cause overflow on 32-bit platforms.
    let expected = crate::dxtc_size(width, height, format)
        .ok_or(DecompressError::PixelCountWouldOverflow { width, height })?;

    // Extra trailing data likely means the width or height is wrong.
    if data.len() != expected {
        return Err(DecompressError::InvalidBufferSize {
            expected,
            actual: data.len(),
        });
    }

    Ok(())
}

fn raster_len(width: u32, height: u32) -> Result<usize, DecompressError> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(CHANNELS))
        .ok_or(DecompressError::PixelCountWouldOverflow { width, height })
}

// Output channel types for decoded texels.
trait Channel: Pod + Send {
    fn from_texel(texel: Texel, gamma: f64) -> [Self; CHANNELS];
}

impl Channel for u8 {
    fn from_texel(texel: Texel, _gamma: f64) -> [Self; CHANNELS] {
        texel.color.true_color(texel.alpha)
    }
}

impl Channel for f32 {
    fn from_texel(texel: Texel, gamma: f64) -> [Self; CHANNELS] {
        texel.color.calibrated_color(texel.alpha, gamma)
    }
}

fn decode_format<T: Channel>(
    width: u32,
    height: u32,
    data: &[u8],
    format: Format,
    gamma: f64,
    rgba: &mut [T],
) -> Result<(), DecompressError> {
    log::debug!(
        "decoding {width}x{height} {format} surface from {} bytes",
        data.len()
    );

    // The format is constant for the surface, so only dispatch once.
    let width = width as usize;
    match format {
        Format::Dxt1 => decode_surface::<Dxt1, T>(width, data, gamma, rgba),
        Format::Dxt1a => decode_surface::<Dxt1a, T>(width, data, gamma, rgba),
        Format::Dxt3 => decode_surface::<Dxt3, T>(width, data, gamma, rgba),
        Format::Dxt5 => decode_surface::<Dxt5, T>(width, data, gamma, rgba),
    }
}

fn decode_surface<F, T>(
    width: usize,
    data: &[u8],
    gamma: f64,
    rgba: &mut [T],
) -> Result<(), DecompressError>
where
    F: DxtcDecode,
    T: Channel,
{
    // validate guarantees a whole number of blocks, so the cast always succeeds.
    let blocks: &[F::CompressedBlock] =
        bytemuck::try_cast_slice(data).map_err(|_| DecompressError::InvalidBufferSize {
            expected: data.len() - data.len() % std::mem::size_of::<F::CompressedBlock>(),
            actual: data.len(),
        })?;

    // DXTC formats lay out blocks in row-major order.
    // A row of blocks updates up to 4 rows of the RGBA surface.
    let blocks_per_row = width.div_ceil(BLOCK_WIDTH);
    let surface_row_size = width * CHANNELS * BLOCK_HEIGHT;

    #[cfg(not(feature = "rayon"))]
    blocks
        .chunks_exact(blocks_per_row)
        .zip(rgba.chunks_mut(surface_row_size))
        .for_each(|(blocks, rows)| decode_block_row::<F, T>(blocks, rows, width, gamma));

    // Each row of blocks writes to a disjoint range of surface rows.
    #[cfg(feature = "rayon")]
    {
        log::trace!(
            "decoding {} block rows in parallel",
            blocks.len() / blocks_per_row
        );
        blocks
            .par_chunks_exact(blocks_per_row)
            .zip(rgba.par_chunks_mut(surface_row_size))
            .for_each(|(blocks, rows)| decode_block_row::<F, T>(blocks, rows, width, gamma));
    }

    Ok(())
}

fn decode_block_row<F, T>(blocks: &[F::CompressedBlock], rows: &mut [T], width: usize, gamma: f64)
where
    F: DxtcDecode,
    T: Channel,
{
    // The last row of blocks may cover fewer than 4 rows of pixels.
    let height = rows.len() / (width * CHANNELS);

    for (i, block) in blocks.iter().enumerate() {
        let pixels = F::decompress_block(block).map(|row| row.map(|t| T::from_texel(t, gamma)));
        put_rgba_block(rows, pixels, i * BLOCK_WIDTH, 0, width, height);
    }
}

fn put_rgba_block<T: Pod>(
    surface: &mut [T],
    pixels: [[[T; CHANNELS]; BLOCK_WIDTH]; BLOCK_HEIGHT],
    x: usize,
    y: usize,
    width: usize,
    height: usize,
) {
    // Blocks at the right and bottom edges are clipped to the surface.
    let elements_per_row = CHANNELS * BLOCK_WIDTH.min(width - x);

    for (row, row_pixels) in pixels.iter().enumerate().take(BLOCK_HEIGHT.min(height - y)) {
        let surface_index = ((y + row) * width + x) * CHANNELS;
        surface[surface_index..surface_index + elements_per_row]
            .copy_from_slice(&bytemuck::cast_slice(row_pixels)[..elements_per_row]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    fn color_block(c0: u16, c1: u16, codes: u32) -> Vec<u8> {
        let mut block = Vec::new();
        block.extend_from_slice(&c0.to_le_bytes());
        block.extend_from_slice(&c1.to_le_bytes());
        block.extend_from_slice(&codes.to_le_bytes());
        block
    }

    fn pixel(rgba: &[u8], width: usize, x: usize, y: usize) -> [u8; 4] {
        let i = (y * width + x) * 4;
        rgba[i..i + 4].try_into().unwrap()
    }

    #[test]
    fn decompress_zero_width() {
        let result = decompress(&[], 0, 4, 1);
        assert_eq!(
            Err(DecompressError::InvalidDimensions {
                width: 0,
                height: 4
            }),
            result
        );
    }

    #[test]
    fn decompress_zero_height() {
        let result = decompress(&[0u8; 8], 4, 0, 1);
        assert!(matches!(
            result,
            Err(DecompressError::InvalidDimensions {
                width: 4,
                height: 0
            })
        ));
    }

    #[test]
    fn decompress_unsupported_format() {
        for tag in [0, 5] {
            let result = decompress(&[0u8; 8], 4, 4, tag);
            assert_eq!(
                Err(DecompressError::UnsupportedFormat { format: tag }),
                result
            );
        }
    }

    #[test]
    fn decompress_one_byte_short() {
        for format in Format::iter() {
            let expected = crate::dxtc_size(5, 7, format).unwrap();
            let data = vec![0u8; expected - 1];
            let result = decompress(&data, 5, 7, format.tag());
            assert_eq!(
                Err(DecompressError::InvalidBufferSize {
                    expected,
                    actual: expected - 1
                }),
                result
            );
        }
    }

    #[test]
    fn decompress_one_byte_long() {
        let result = decompress(&[0u8; 17], 4, 4, Format::Dxt5.tag());
        assert_eq!(
            Err(DecompressError::InvalidBufferSize {
                expected: 16,
                actual: 17
            }),
            result
        );
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn decompress_dimensions_overflow() {
        let result = rgba8_from_dxtc(u32::MAX, u32::MAX, &[], Format::Dxt3);
        assert_eq!(
            Err(DecompressError::PixelCountWouldOverflow {
                width: u32::MAX,
                height: u32::MAX
            }),
            result
        );
    }

    #[test]
    fn decompress_all_formats_zeros() {
        for format in Format::iter() {
            let data = vec![0u8; crate::dxtc_size(9, 3, format).unwrap()];
            let raster = decompress(&data, 9, 3, format.tag()).unwrap();
            assert_eq!(9, raster.width);
            assert_eq!(3, raster.height);
            assert_eq!(9 * 3 * 4, raster.data.len());
        }
    }

    #[test]
    fn decompress_dxt1_uniform_block() {
        // Equal reference colors give the same color for every code.
        let data = color_block(0xF800, 0xF800, 0x1B9CE4E1);
        let raster = decompress(&data, 4, 4, Format::Dxt1.tag()).unwrap();
        assert_eq!([255u8, 0, 0, 255].repeat(16), raster.data);
    }

    #[test]
    fn decompress_dxt1a_punch_through() {
        // Codes 3, 2, 1, 0 repeated in each row.
        let data = color_block(0x001F, 0xF800, 0x1B1B1B1B);
        let raster = decompress(&data, 4, 4, Format::Dxt1a.tag()).unwrap();
        for y in 0..4 {
            assert_eq!(0, pixel(&raster.data, 4, 0, y)[3]);
            assert_eq!(255, pixel(&raster.data, 4, 1, y)[3]);
            assert_eq!([255, 0, 0, 255], pixel(&raster.data, 4, 2, y));
            assert_eq!([0, 0, 255, 255], pixel(&raster.data, 4, 3, y));
        }
    }

    #[test]
    fn decompress_dxt1_punch_through_opaque() {
        let data = color_block(0x001F, 0xF800, 0xFFFFFFFF);
        let raster = decompress(&data, 4, 4, Format::Dxt1.tag()).unwrap();
        assert!(raster.data.chunks_exact(4).all(|p| p[3] == 255));
    }

    #[test]
    fn decompress_clipped_5x5() {
        // Each of the 2x2 blocks uses a different solid color.
        let colors = [0xF800, 0x07E0, 0x001F, 0xFFFF];
        let data: Vec<_> = colors
            .iter()
            .flat_map(|c| color_block(*c, *c, 0))
            .collect();

        let raster = decompress(&data, 5, 5, Format::Dxt1.tag()).unwrap();
        assert_eq!(5 * 5 * 4, raster.data.len());

        let expected = [
            [255, 0, 0, 255],
            [0, 255, 0, 255],
            [0, 0, 255, 255],
            [255, 255, 255, 255],
        ];
        for y in 0..5 {
            for x in 0..5 {
                let block = (y / 4) * 2 + x / 4;
                assert_eq!(expected[block], pixel(&raster.data, 5, x, y), "{x},{y}");
            }
        }
    }

    #[test]
    fn decode_into_rgba8_overwrites_raster() {
        let data: Vec<_> = (0..4).flat_map(|_| color_block(0, 0, 0)).collect();
        let mut rgba = vec![7u8; 5 * 5 * 4];
        decode_into_rgba8(5, 5, &data, Format::Dxt1, &mut rgba).unwrap();
        assert_eq!([0u8, 0, 0, 255].repeat(25), rgba);
    }

    #[test]
    fn decode_into_rgba8_invalid_raster() {
        let mut rgba = vec![7u8; 4 * 4 * 4 + 1];
        let result = decode_into_rgba8(4, 4, &[0u8; 8], Format::Dxt1, &mut rgba);
        assert_eq!(
            Err(DecompressError::InvalidRasterSize {
                expected: 64,
                actual: 65
            }),
            result
        );
        // Nothing is written on error.
        assert_eq!(vec![7u8; 65], rgba);
    }

    #[test]
    fn decompress_dxt3_alpha() {
        let mut data = vec![0u8; 8];
        data[0] = 0x5A;
        data.extend_from_slice(&color_block(0xFFFF, 0x0000, 0));
        let raster = decompress(&data, 4, 4, Format::Dxt3.tag()).unwrap();
        assert_eq!([255, 255, 255, 0xAA], pixel(&raster.data, 4, 0, 0));
        assert_eq!([255, 255, 255, 0x55], pixel(&raster.data, 4, 1, 0));
        assert_eq!([255, 255, 255, 0x00], pixel(&raster.data, 4, 2, 0));
    }

    #[test]
    fn decompress_dxt5_sentinel_alpha() {
        // alpha_0 <= alpha_1 and codes 6 and 7 for the first two pixels.
        let mut data = vec![0u8, 255, 0b00_111_110, 0, 0, 0, 0, 0];
        data.extend_from_slice(&color_block(0xFFFF, 0x0000, 0));
        let raster = decompress(&data, 4, 4, Format::Dxt5.tag()).unwrap();
        assert_eq!(0, pixel(&raster.data, 4, 0, 0)[3]);
        assert_eq!(255, pixel(&raster.data, 4, 1, 0)[3]);
        assert_eq!(0, pixel(&raster.data, 4, 2, 0)[3]);
    }

    #[test]
    fn decompress_multiple_block_rows() {
        // Blocks are stored in row-major order.
        let data: Vec<_> = [0xF800, 0x07E0, 0x001F]
            .iter()
            .flat_map(|c| color_block(*c, *c, 0))
            .collect();
        let raster = decompress(&data, 4, 12, Format::Dxt1a.tag()).unwrap();
        assert_eq!([255, 0, 0, 255], pixel(&raster.data, 4, 3, 3));
        assert_eq!([0, 255, 0, 255], pixel(&raster.data, 4, 0, 4));
        assert_eq!([0, 0, 255, 255], pixel(&raster.data, 4, 2, 11));
    }

    #[test]
    fn rgbaf32_from_dxtc_gamma() {
        let data = color_block(0xFFFF, 0xFFFF, 0);
        let raster = rgbaf32_from_dxtc(2, 2, &data, Format::Dxt1, DEFAULT_GAMMA).unwrap();
        assert_eq!([1.0f32; 4].repeat(4), raster.data);

        // Black stays black and alpha is not corrected.
        let mut data = vec![0x88u8; 8];
        data.extend_from_slice(&color_block(0, 0, 0));
        let raster = rgbaf32_from_dxtc(1, 1, &data, Format::Dxt3, 2.2).unwrap();
        assert_eq!(vec![0.0, 0.0, 0.0, 0x88 as f32 / 255.0], raster.data);
    }

    #[test]
    fn decode_block_rgba8_single_block() {
        let pixels = decode_block_rgba8(&color_block(0x07E0, 0x07E0, 0), Format::Dxt1).unwrap();
        assert_eq!([[[0, 255, 0, 255]; 4]; 4], pixels);
    }

    #[test]
    fn decode_block_rgba8_matches_surface_decode() {
        for format in Format::iter() {
            let mut block = vec![0x5Au8; format.block_size_in_bytes()];
            let len = block.len();
            block[len - 8..].copy_from_slice(&color_block(0x001F, 0xF800, 0x4E4E4E4E));

            let pixels = decode_block_rgba8(&block, format).unwrap();
            let rgba = rgba8_from_dxtc(4, 4, &block, format).unwrap();
            assert_eq!(rgba, bytemuck::cast_slice::<_, u8>(&pixels[..]));
        }
    }

    #[test]
    fn decode_surface_partial_trailing_block() {
        let mut rgba = vec![0u8; 4 * 4 * 4];
        let result = decode_surface::<Dxt5, u8>(4, &[0u8; 20], DEFAULT_GAMMA, &mut rgba);
        assert_eq!(
            Err(DecompressError::InvalidBufferSize {
                expected: 16,
                actual: 20
            }),
            result
        );
    }

    #[test]
    fn decode_block_rgba8_wrong_size() {
        let result = decode_block_rgba8(&[0u8; 8], Format::Dxt5);
        assert_eq!(
            Err(DecompressError::InvalidBufferSize {
                expected: 16,
                actual: 8
            }),
            result
        );
    }

    #[test]
    fn put_rgba_block_4x4() {
        // Write an entire block.
        let mut surface = vec![0u8; 4 * 4 * 4];
        put_rgba_block(
            &mut surface,
            [[[1u8; 4]; BLOCK_WIDTH]; BLOCK_HEIGHT],
            0,
            0,
            4,
            4,
        );
        assert_eq!(vec![1u8; 4 * 4 * 4], surface);
    }

    #[test]
    fn put_rgba_block_3x2() {
        // Only the top left 3x2 pixels fit in the surface.
        let mut surface = vec![0u8; 3 * 2 * 4];
        put_rgba_block(
            &mut surface,
            [[[2u8; 4]; BLOCK_WIDTH]; BLOCK_HEIGHT],
            0,
            0,
            3,
            2,
        );
        assert_eq!(vec![2u8; 3 * 2 * 4], surface);
    }

    #[test]
    fn put_rgba_block_5x5() {
        // Test that block xy offsets work properly.
        let mut surface = vec![0u8; 5 * 5 * 4];

        put_rgba_block(
            &mut surface,
            [[[1u8; 4]; BLOCK_WIDTH]; BLOCK_HEIGHT],
            0,
            0,
            5,
            5,
        );
        put_rgba_block(
            &mut surface,
            [[[2u8; 4]; BLOCK_WIDTH]; BLOCK_HEIGHT],
            4,
            4,
            5,
            5,
        );

        assert_eq!(
            [
                [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0],
                [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0],
                [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0],
                [1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0],
                [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 2, 2, 2],
            ]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>(),
            surface
        );
    }
}
