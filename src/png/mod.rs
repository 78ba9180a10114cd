//! PNG encoder implementation.
//!
//! Implements streaming PNG encoding according to the PNG specification
//! (RFC 2083). Rows are pulled from a [`PixelSource`] one at a time,
//! filtered, pushed through a zlib stream, and cut into `IDAT` chunks as
//! the compressed bytes arrive. Only two rows of pixels and one chunk
//! window are held in memory at any time.

pub mod chunk;
pub mod filter;

use std::io::Write;
use std::mem;

use tracing::{debug, trace};

use crate::bits::ByteSink;
use crate::color::ColorType;
use crate::compress::{CompressionLevel, ZlibWriter};
use crate::context::EncodeContext;
use crate::error::{Error, Result};
use crate::source::{self, ImageRef, PixelSource};

pub use chunk::DEFAULT_CHUNK_SIZE;
pub use filter::FilterType;

/// PNG file signature (magic bytes).
pub const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Maximum supported image dimension (PNG stores dimensions as 31-bit values).
const MAX_DIMENSION: u32 = (1 << 31) - 1;

/// PNG encoding options.
#[derive(Debug, Clone)]
pub struct PngOptions {
    /// DEFLATE effort.
    pub compression: CompressionLevel,
    /// Filter selection strategy.
    pub filter_strategy: FilterStrategy,
    /// Emit the source's rows bottom-up.
    pub flip_vertically: bool,
    /// Maximum body size of each `IDAT` chunk.
    pub idat_chunk_size: usize,
}

impl Default for PngOptions {
    fn default() -> Self {
        Self {
            compression: CompressionLevel::Optimal,
            filter_strategy: FilterStrategy::Adaptive,
            flip_vertically: false,
            idat_chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

impl PngOptions {
    /// Speed-focused preset: fastest DEFLATE and a single fixed filter.
    pub fn fast() -> Self {
        Self {
            compression: CompressionLevel::Fastest,
            filter_strategy: FilterStrategy::Sub,
            ..Self::default()
        }
    }

    /// Balanced preset (the default).
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Highest compression preset; slowest.
    pub fn max_compression() -> Self {
        Self {
            compression: CompressionLevel::SmallestSize,
            filter_strategy: FilterStrategy::Adaptive,
            ..Self::default()
        }
    }
}

/// PNG filter selection strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterStrategy {
    /// Always use no filter (fastest encoding).
    None,
    /// Always use Sub filter.
    Sub,
    /// Always use Up filter.
    Up,
    /// Always use Average filter.
    Average,
    /// Always use Paeth filter.
    Paeth,
    /// Try all five filters per row and keep the cheapest.
    #[default]
    Adaptive,
}

impl FilterStrategy {
    /// Map a numeric override: `0..=4` forces that filter, anything else is adaptive.
    pub fn from_override(value: i32) -> Self {
        match value {
            0 => FilterStrategy::None,
            1 => FilterStrategy::Sub,
            2 => FilterStrategy::Up,
            3 => FilterStrategy::Average,
            4 => FilterStrategy::Paeth,
            _ => FilterStrategy::Adaptive,
        }
    }

    /// The filter applied to every row, if one is forced.
    pub fn forced(self) -> Option<FilterType> {
        match self {
            FilterStrategy::None => Some(FilterType::None),
            FilterStrategy::Sub => Some(FilterType::Sub),
            FilterStrategy::Up => Some(FilterType::Up),
            FilterStrategy::Average => Some(FilterType::Average),
            FilterStrategy::Paeth => Some(FilterType::Paeth),
            FilterStrategy::Adaptive => None,
        }
    }
}

impl From<FilterType> for FilterStrategy {
    fn from(filter: FilterType) -> Self {
        FilterStrategy::from_override(filter.tag() as i32)
    }
}

/// Encode raw pixel data as PNG.
///
/// # Arguments
/// * `data` - Raw pixel data (row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `color_type` - Color type of the input data
///
/// # Returns
/// Complete PNG file as bytes.
pub fn encode(data: &[u8], width: u32, height: u32, color_type: ColorType) -> Result<Vec<u8>> {
    encode_with_options(data, width, height, color_type, &PngOptions::default())
}

/// Encode raw pixel data as PNG with custom options.
pub fn encode_with_options(
    data: &[u8],
    width: u32,
    height: u32,
    color_type: ColorType,
    options: &PngOptions,
) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    encode_into(&mut output, data, width, height, color_type, options)?;
    Ok(output)
}

/// Encode raw pixel data as PNG into a caller-provided buffer.
///
/// The `output` buffer will be cleared before writing. This API allows callers
/// to reuse an allocation across multiple encodes.
pub fn encode_into(
    output: &mut Vec<u8>,
    data: &[u8],
    width: u32,
    height: u32,
    color_type: ColorType,
    options: &PngOptions,
) -> Result<()> {
    output.clear();
    let image = ImageRef::new(data, width, height, color_type)?;
    write_image(&image, output, options)
}

/// Stream `source` as PNG into `writer`.
pub fn write_image<S, W>(source: &S, writer: W, options: &PngOptions) -> Result<()>
where
    S: PixelSource + ?Sized,
    W: Write,
{
    write_image_with_context(source, writer, options, &mut EncodeContext::new())
}

/// Stream `source` as PNG into `writer`, polling `ctx` for cancellation and progress.
///
/// Preconditions are checked before the first byte is written. On any
/// error the writer holds a truncated stream that the caller should discard.
pub fn write_image_with_context<S, W>(
    source: &S,
    writer: W,
    options: &PngOptions,
    ctx: &mut EncodeContext<'_>,
) -> Result<()>
where
    S: PixelSource + ?Sized,
    W: Write,
{
    let color_type = source::validate(source, MAX_DIMENSION)?;
    let width = source.width();
    let height = source.height();
    let bpp = color_type.components();
    let stride = width as usize * bpp;
    let forced = options.filter_strategy.forced();

    debug!(
        width,
        height,
        components = bpp,
        compression = ?options.compression,
        filter = ?options.filter_strategy,
        "encoding png"
    );

    ctx.check()?;
    ctx.begin(width as u64 * height as u64);

    let mut sink = ByteSink::new(writer);
    sink.write_bytes(&PNG_SIGNATURE)?;
    write_ihdr(&mut sink, width, height, color_type)?;

    // Two pixel rows swapped each scanline, plus tag-prefixed output rows.
    let mut prev_row = vec![0u8; stride];
    let mut row = vec![0u8; stride];
    let mut line = vec![0u8; stride + 1];
    let mut trial = if forced.is_none() {
        vec![0u8; stride + 1]
    } else {
        Vec::new()
    };

    let framer = chunk::ChunkWriter::new(&mut sink, *b"IDAT", options.idat_chunk_size);
    let mut zlib = ZlibWriter::new(framer, options.compression)?;

    for y in 0..height {
        ctx.check()?;

        let source_y = if options.flip_vertically {
            height - 1 - y
        } else {
            y
        };
        source.row_bytes(source_y, &mut row);

        let first_row = y == 0;
        let filter = match forced {
            Some(filter) => {
                filter::filter_row(filter, first_row, &row, &prev_row, bpp, &mut line[1..]);
                line[0] = filter.tag();
                filter
            }
            None => filter::adaptive_filter(
                &row, &prev_row, bpp, first_row, &mut line, &mut trial, ctx,
            )?,
        };
        trace!(y, filter = ?filter, "png row");

        zlib.write_all(&line)?;
        mem::swap(&mut prev_row, &mut row);
        ctx.advance(width as u64, (y + 1) as f32 / height as f32);
    }

    zlib.finish()?.finish()?;
    write_iend(&mut sink)?;
    sink.flush()?;
    ctx.finish();

    debug!(bytes = sink.bytes_written(), "png encoded");
    Ok(())
}

/// Write IHDR (image header) chunk.
fn write_ihdr<W: Write>(
    output: &mut ByteSink<W>,
    width: u32,
    height: u32,
    color_type: ColorType,
) -> Result<()> {
    let mut ihdr_data = [0u8; 13];

    // Width, height (4 bytes each, big-endian)
    ihdr_data[0..4].copy_from_slice(&width.to_be_bytes());
    ihdr_data[4..8].copy_from_slice(&height.to_be_bytes());

    // Bit depth
    ihdr_data[8] = 8;

    // Color type
    ihdr_data[9] = color_type.png_color_type();

    // Compression, filter and interlace methods stay 0:
    // DEFLATE, adaptive filtering, no interlace.

    chunk::write_chunk(output, b"IHDR", &ihdr_data)?;
    Ok(())
}

/// Write IEND (image end) chunk.
fn write_iend<W: Write>(output: &mut ByteSink<W>) -> Result<()> {
    chunk::write_chunk(output, b"IEND", &[])?;
    Ok(())
}
