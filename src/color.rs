//! Color type definitions and conversions.

use crate::error::{Error, Result};

/// Interleaved sample layouts, keyed by component count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ColorType {
    /// Grayscale, 1 component.
    Gray = 1,
    /// Grayscale with alpha, 2 components.
    GrayAlpha = 2,
    /// RGB, 3 components.
    Rgb = 3,
    /// RGBA, 4 components.
    Rgba = 4,
}

impl ColorType {
    /// Layout for a component count in `1..=4`.
    pub fn from_components(components: usize) -> Result<Self> {
        match components {
            1 => Ok(ColorType::Gray),
            2 => Ok(ColorType::GrayAlpha),
            3 => Ok(ColorType::Rgb),
            4 => Ok(ColorType::Rgba),
            other => Err(Error::InvalidComponents(other)),
        }
    }

    /// Number of samples (bytes at 8 bits) per pixel.
    #[inline]
    pub const fn components(self) -> usize {
        self as usize
    }

    /// Whether the last component is alpha.
    #[inline]
    pub const fn has_alpha(self) -> bool {
        matches!(self, ColorType::GrayAlpha | ColorType::Rgba)
    }

    /// Whether there are separate red, green and blue samples.
    #[inline]
    pub const fn has_color(self) -> bool {
        matches!(self, ColorType::Rgb | ColorType::Rgba)
    }

    /// PNG IHDR color type byte.
    #[inline]
    pub(crate) const fn png_color_type(self) -> u8 {
        match self {
            ColorType::Gray => 0,
            ColorType::GrayAlpha => 4,
            ColorType::Rgb => 2,
            ColorType::Rgba => 6,
        }
    }

    /// Offsets of the green and blue samples from the start of a pixel.
    ///
    /// Gray layouts read the gray sample three times.
    #[inline]
    pub(crate) const fn rgb_offsets(self) -> (usize, usize) {
        if self.has_color() {
            (1, 2)
        } else {
            (0, 0)
        }
    }
}

impl TryFrom<u8> for ColorType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        ColorType::from_components(value as usize)
    }
}

impl From<ColorType> for u8 {
    fn from(color: ColorType) -> Self {
        color as u8
    }
}

/// Convert RGB to level-shifted YCbCr (used by JPEG).
///
/// Single-precision BT.601 matrix. Y is centered on zero by subtracting 128;
/// Cb and Cr are already centered.
#[inline]
pub fn rgb_to_ycbcr(r: f32, g: f32, b: f32) -> (f32, f32, f32) {
    let y = 0.29900 * r + 0.58700 * g + 0.11400 * b - 128.0;
    let cb = -0.16874 * r - 0.33126 * g + 0.50000 * b;
    let cr = 0.50000 * r - 0.41869 * g - 0.08131 * b;
    (y, cb, cr)
}

/// Append one pixel in blue-green-red order, as BMP and TGA store it.
///
/// Gray samples are written once, or three times with `expand_gray`.
/// The trailing alpha sample is kept only when `keep_alpha` is set.
pub(crate) fn push_bgr(pixel: &[u8], expand_gray: bool, keep_alpha: bool, out: &mut Vec<u8>) {
    match pixel.len() {
        1 | 2 if expand_gray => out.extend_from_slice(&[pixel[0]; 3]),
        1 | 2 => out.push(pixel[0]),
        _ => out.extend_from_slice(&[pixel[2], pixel[1], pixel[0]]),
    }
    if keep_alpha && pixel.len() % 2 == 0 {
        out.push(pixel[pixel.len() - 1]);
    }
}
