//! The 16-bit 5:6:5 color model used for DXTC reference colors.
use std::ops::Add;

/// The display gamma historically applied to calibrated output on macOS.
pub const DEFAULT_GAMMA: f64 = 1.2;

const R_MAX: u16 = 0x1F;
const G_MAX: u16 = 0x3F;
const B_MAX: u16 = 0x1F;

/// A high color value with 5 bits of red, 6 bits of green, and 5 bits of blue.
///
/// Red occupies bits 15 to 11, green bits 10 to 5, and blue bits 4 to 0.
/// Arithmetic operates on the raw component values and always returns a new color.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Color16(u16);

impl Color16 {
    pub const fn from_packed(color: u16) -> Self {
        Self(color)
    }

    /// Packs raw component values, clamping each one to its bit range.
    pub fn from_components(r5: u8, g6: u8, b5: u8) -> Self {
        Self::pack(
            (r5 as u16).min(R_MAX),
            (g6 as u16).min(G_MAX),
            (b5 as u16).min(B_MAX),
        )
    }

    pub const fn packed(self) -> u16 {
        self.0
    }

    pub const fn r5(self) -> u8 {
        ((self.0 >> 11) & R_MAX) as u8
    }

    pub const fn g6(self) -> u8 {
        ((self.0 >> 5) & G_MAX) as u8
    }

    pub const fn b5(self) -> u8 {
        (self.0 & B_MAX) as u8
    }

    /// Expands the color to 8 bits per channel with the given `alpha`.
    ///
    /// The high bits of each component are replicated into the low bits,
    /// so 0 maps to 0 and the component maximum maps to 255.
    pub const fn true_color(self, alpha: u8) -> [u8; 4] {
        let r = self.r5();
        let g = self.g6();
        let b = self.b5();
        [(r << 3) | (r >> 2), (g << 2) | (g >> 4), (b << 3) | (b >> 2), alpha]
    }

    /// The result of [Color16::true_color] packed as `0xAABBGGRR`.
    pub const fn true_color_packed(self, alpha: u8) -> u32 {
        u32::from_le_bytes(self.true_color(alpha))
    }

    /// Normalizes the 8-bit color to the range `0.0` to `1.0`
    /// and raises each color channel to the power `gamma`.
    ///
    /// Alpha is normalized but not gamma corrected.
    pub fn calibrated_color(self, alpha: u8, gamma: f64) -> [f32; 4] {
        let [r, g, b, a] = self.true_color(alpha);
        let correct = |c: u8| (c as f64 / 255.0).powf(gamma) as f32;
        [correct(r), correct(g), correct(b), a as f32 / 255.0]
    }

    /// Multiplies each component by `factor`.
    pub fn scale(self, factor: f64) -> Self {
        self.combine(self, |c, _| c * factor)
    }

    /// `0.5 * self + 0.5 * other`
    pub fn linear_blend(self, other: Self) -> Self {
        self.combine(other, |a, b| 0.5 * a + 0.5 * b)
    }

    /// `2/3 * self + 1/3 * other`
    pub fn linear_interpolation(self, other: Self) -> Self {
        self.combine(other, |a, b| (2.0 * a + b) / 3.0)
    }

    // Weighted sums are evaluated in full precision and only rounded once.
    fn combine(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        Self::pack(
            quantize(f(self.r5() as f64, other.r5() as f64), R_MAX),
            quantize(f(self.g6() as f64, other.g6() as f64), G_MAX),
            quantize(f(self.b5() as f64, other.b5() as f64), B_MAX),
        )
    }

    const fn pack(r5: u16, g6: u16, b5: u16) -> Self {
        Self((r5 << 11) | (g6 << 5) | b5)
    }
}

/// Adds the components pairwise and clamps each sum to its component range.
impl Add for Color16 {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        self.combine(other, |a, b| a + b)
    }
}

impl From<u16> for Color16 {
    fn from(value: u16) -> Self {
        Self::from_packed(value)
    }
}

impl From<Color16> for u16 {
    fn from(value: Color16) -> Self {
        value.packed()
    }
}

fn quantize(value: f64, max: u16) -> u16 {
    // Halves round away from zero and NaN becomes 0 after the cast.
    value.round().clamp(0.0, max as f64) as u16
}
