//! Decoders for individual 4x4 DXTC blocks.
use bytemuck::Pod;

use crate::color::Color16;

pub const BLOCK_WIDTH: usize = 4;
pub const BLOCK_HEIGHT: usize = 4;

/// A decoded pixel that has not yet been converted to an output channel type.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Default)]
pub struct Texel {
    pub color: Color16,
    pub alpha: u8,
}

impl Texel {
    const fn opaque(color: Color16) -> Self {
        Self { color, alpha: 255 }
    }
}

/// Decoded pixels for a single block in row-major order.
pub type TexelBlock = [[Texel; BLOCK_WIDTH]; BLOCK_HEIGHT];

pub trait DxtcDecode {
    /// The raw bytes of one compressed block.
    type CompressedBlock: Pod + Sync;

    fn decompress_block(block: &Self::CompressedBlock) -> TexelBlock;
}

pub struct Dxt1;
pub struct Dxt1a;
pub struct Dxt3;
pub struct Dxt5;

impl DxtcDecode for Dxt1 {
    type CompressedBlock = [u8; 8];

    fn decompress_block(block: &[u8; 8]) -> TexelBlock {
        color_block(block, ColorMode::Opaque)
    }
}

impl DxtcDecode for Dxt1a {
    type CompressedBlock = [u8; 8];

    fn decompress_block(block: &[u8; 8]) -> TexelBlock {
        color_block(block, ColorMode::PunchThrough)
    }
}

impl DxtcDecode for Dxt3 {
    type CompressedBlock = [u8; 16];

    fn decompress_block(block: &[u8; 16]) -> TexelBlock {
        // The alpha block comes before the color block.
        let [alpha, color]: &[[u8; 8]; 2] = bytemuck::cast_ref(block);
        with_alpha(color_block(color, ColorMode::FourColor), sharp_alpha_block(alpha))
    }
}

impl DxtcDecode for Dxt5 {
    type CompressedBlock = [u8; 16];

    fn decompress_block(block: &[u8; 16]) -> TexelBlock {
        let [alpha, color]: &[[u8; 8]; 2] = bytemuck::cast_ref(block);
        with_alpha(color_block(color, ColorMode::FourColor), smooth_alpha_block(alpha))
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
enum ColorMode {
    /// DXT1 may use the three color palette, but every entry is opaque.
    Opaque,
    /// DXT1A makes entry 3 of the three color palette transparent.
    PunchThrough,
    /// DXT3 and DXT5 always use the four color palette.
    FourColor,
}

fn color_palette(c0: Color16, c1: Color16, mode: ColorMode) -> [Texel; 4] {
    if c0.packed() > c1.packed() || mode == ColorMode::FourColor {
        // color_2 = 2/3*color_0 + 1/3*color_1
        // color_3 = 1/3*color_0 + 2/3*color_1
        [
            Texel::opaque(c0),
            Texel::opaque(c1),
            Texel::opaque(c0.linear_interpolation(c1)),
            Texel::opaque(c1.linear_interpolation(c0)),
        ]
    } else {
        // color_2 = 1/2*color_0 + 1/2*color_1
        // color_3 keeps the blended color and only changes alpha.
        let blend = c0.linear_blend(c1);
        let alpha = match mode {
            ColorMode::PunchThrough => 0,
            _ => 255,
        };
        [
            Texel::opaque(c0),
            Texel::opaque(c1),
            Texel::opaque(blend),
            Texel {
                color: blend,
                alpha,
            },
        ]
    }
}

fn color_block(block: &[u8; 8], mode: ColorMode) -> TexelBlock {
    let c0 = Color16::from_packed(u16::from_le_bytes([block[0], block[1]]));
    let c1 = Color16::from_packed(u16::from_le_bytes([block[2], block[3]]));
    let palette = color_palette(c0, c1, mode);

    // Sixteen 2-bit codes starting from the least significant bits.
    let codes = u32::from_le_bytes([block[4], block[5], block[6], block[7]]);
    std::array::from_fn(|y| {
        std::array::from_fn(|x| {
            let i = y * BLOCK_WIDTH + x;
            palette[((codes >> (2 * i)) & 0x3) as usize]
        })
    })
}

fn with_alpha(mut texels: TexelBlock, alpha: [[u8; BLOCK_WIDTH]; BLOCK_HEIGHT]) -> TexelBlock {
    for (texel_row, alpha_row) in texels.iter_mut().zip(alpha) {
        for (texel, a) in texel_row.iter_mut().zip(alpha_row) {
            texel.alpha = a;
        }
    }
    texels
}

fn sharp_alpha_block(block: &[u8; 8]) -> [[u8; BLOCK_WIDTH]; BLOCK_HEIGHT] {
    std::array::from_fn(|y| {
        let row = u16::from_le_bytes([block[y * 2], block[y * 2 + 1]]);
        std::array::from_fn(|x| {
            let a = ((row >> (4 * x)) & 0x0F) as u8;
            a | (a << 4)
        })
    })
}

/// The 8 alpha values selectable by the 3-bit codes of a DXT5 alpha block.
pub fn smooth_alpha_palette(alpha0: u8, alpha1: u8) -> [u8; 8] {
    let mut alpha = [alpha0, alpha1, 0, 0, 0, 0, 0, 0];

    if alpha0 > alpha1 {
        // 6 interpolated alpha values from 6/7*alpha_0 + 1/7*alpha_1 to 1/7*alpha_0 + 6/7*alpha_1.
        for (i, weight) in (1..=6).rev().enumerate() {
            alpha[i + 2] = interpolate_alpha(alpha0, alpha1, weight, 7);
        }
    } else {
        // 4 interpolated alpha values from 4/5*alpha_0 + 1/5*alpha_1 to 1/5*alpha_0 + 4/5*alpha_1.
        for (i, weight) in (1..=4).rev().enumerate() {
            alpha[i + 2] = interpolate_alpha(alpha0, alpha1, weight, 5);
        }
        alpha[6] = 0x00;
        alpha[7] = 0xFF;
    }

    alpha
}

fn interpolate_alpha(alpha0: u8, alpha1: u8, weight: u32, divisor: u32) -> u8 {
    ((weight * alpha0 as u32 + (divisor - weight) * alpha1 as u32 + 1) / divisor) as u8
}

fn smooth_alpha_block(block: &[u8; 8]) -> [[u8; BLOCK_WIDTH]; BLOCK_HEIGHT] {
    let alpha = smooth_alpha_palette(block[0], block[1]);

    // Sixteen 3-bit codes in the 48 bits after the reference alphas.
    let codes = u64::from_le_bytes(*block) >> 16;
    std::array::from_fn(|y| {
        std::array::from_fn(|x| {
            let i = y * BLOCK_WIDTH + x;
            alpha[((codes >> (3 * i)) & 0x07) as usize]
        })
    })
}
