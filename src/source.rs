//! Row-on-demand pixel sources.
//!
//! Encoders never see the whole image. They ask a [`PixelSource`] for one
//! row at a time, top to bottom, into a scratch buffer they own.

use crate::color::ColorType;
use crate::error::{Error, Result};

/// Supplies image geometry and materializes rows on request.
///
/// Rows hold `width * components` interleaved samples, left to right.
/// Row 0 is the top of the image. Implementations must tolerate the same
/// row being requested more than once.
pub trait PixelSource {
    /// Image width in pixels.
    fn width(&self) -> u32;

    /// Image height in pixels.
    fn height(&self) -> u32;

    /// Samples per pixel. Encoders reject anything outside `1..=4`.
    fn components(&self) -> usize;

    /// Fill `dst` (exactly `width * components` bytes) with row `y`.
    fn row_bytes(&self, y: u32, dst: &mut [u8]);

    /// Fill `dst` with row `y` as floats.
    ///
    /// The default scales the byte row into `0.0..=1.0`. It allocates a
    /// byte row per call, so sources that encode often should override it.
    fn row_floats(&self, y: u32, dst: &mut [f32]) {
        let mut bytes = vec![0u8; dst.len()];
        self.row_bytes(y, &mut bytes);
        for (d, &b) in dst.iter_mut().zip(&bytes) {
            *d = b as f32 / 255.0;
        }
    }
}

impl<T: PixelSource + ?Sized> PixelSource for &T {
    fn width(&self) -> u32 {
        (**self).width()
    }
    fn height(&self) -> u32 {
        (**self).height()
    }
    fn components(&self) -> usize {
        (**self).components()
    }
    fn row_bytes(&self, y: u32, dst: &mut [u8]) {
        (**self).row_bytes(y, dst)
    }
    fn row_floats(&self, y: u32, dst: &mut [f32]) {
        (**self).row_floats(y, dst)
    }
}

/// Reject empty or oversized geometry and resolve the sample layout.
///
/// Runs before an encoder writes anything.
pub(crate) fn validate<S: PixelSource + ?Sized>(source: &S, max: u32) -> Result<ColorType> {
    let width = source.width();
    let height = source.height();
    if width == 0 || height == 0 {
        return Err(Error::InvalidDimensions { width, height });
    }
    if width > max || height > max {
        return Err(Error::ImageTooLarge { width, height, max });
    }
    ColorType::from_components(source.components())
}

fn expected_len(width: u32, height: u32, color: ColorType) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|n| n.checked_mul(color.components()))
        .ok_or(Error::ImageTooLarge {
            width,
            height,
            max: u32::MAX,
        })
}

/// Borrowed, tightly packed 8-bit image.
#[derive(Debug, Clone, Copy)]
pub struct ImageRef<'a> {
    data: &'a [u8],
    width: u32,
    height: u32,
    color: ColorType,
}

impl<'a> ImageRef<'a> {
    /// Wrap `data`, which must hold exactly `width * height * components` bytes.
    pub fn new(data: &'a [u8], width: u32, height: u32, color: ColorType) -> Result<Self> {
        let expected = expected_len(width, height, color)?;
        if data.len() != expected {
            return Err(Error::InvalidDataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            color,
        })
    }

    /// Sample layout.
    pub fn color_type(&self) -> ColorType {
        self.color
    }

    fn stride(&self) -> usize {
        self.width as usize * self.color.components()
    }
}

impl PixelSource for ImageRef<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn components(&self) -> usize {
        self.color.components()
    }

    fn row_bytes(&self, y: u32, dst: &mut [u8]) {
        let stride = self.stride();
        let start = y as usize * stride;
        dst.copy_from_slice(&self.data[start..start + stride]);
    }

    fn row_floats(&self, y: u32, dst: &mut [f32]) {
        let stride = self.stride();
        let start = y as usize * stride;
        for (d, &b) in dst.iter_mut().zip(&self.data[start..start + stride]) {
            *d = b as f32 / 255.0;
        }
    }
}

/// Borrowed, tightly packed floating-point image (linear, nominally `0.0..=1.0`).
#[derive(Debug, Clone, Copy)]
pub struct FloatImageRef<'a> {
    data: &'a [f32],
    width: u32,
    height: u32,
    color: ColorType,
}

impl<'a> FloatImageRef<'a> {
    /// Wrap `data`, which must hold exactly `width * height * components` floats.
    pub fn new(data: &'a [f32], width: u32, height: u32, color: ColorType) -> Result<Self> {
        let expected = expected_len(width, height, color)?;
        if data.len() != expected {
            return Err(Error::InvalidDataLength {
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            data,
            width,
            height,
            color,
        })
    }

    fn row(&self, y: u32) -> &[f32] {
        let stride = self.width as usize * self.color.components();
        let start = y as usize * stride;
        &self.data[start..start + stride]
    }
}

impl PixelSource for FloatImageRef<'_> {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn components(&self) -> usize {
        self.color.components()
    }

    fn row_bytes(&self, y: u32, dst: &mut [u8]) {
        for (d, &v) in dst.iter_mut().zip(self.row(y)) {
            *d = (v * 255.0 + 0.5).clamp(0.0, 255.0) as u8;
        }
    }

    fn row_floats(&self, y: u32, dst: &mut [f32]) {
        dst.copy_from_slice(self.row(y));
    }
}
