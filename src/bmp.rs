//! BMP encoder.
//!
//! Uncompressed Windows bitmaps: 24-bit BGR for one to three components,
//! 32-bit BGRA with a V4 header and channel masks for four. Gray is
//! expanded to three channels and a gray alpha channel is dropped. Rows are
//! stored bottom-up and padded to four bytes.

use std::io::Write;

use tracing::debug;

use crate::bits::ByteSink;
use crate::color::{push_bgr, ColorType};
use crate::context::EncodeContext;
use crate::error::{Error, Result};
use crate::source::{self, ImageRef, PixelSource};

/// BMP stores dimensions as signed 32-bit values.
const MAX_DIMENSION: u32 = i32::MAX as u32;

const FILE_HEADER_LEN: u32 = 14;
const INFO_HEADER_LEN: u32 = 40;
const V4_HEADER_LEN: u32 = 108;

const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;

/// `LCS_WINDOWS_COLOR_SPACE`, the four-character code `'Win '`.
const LCS_WINDOWS_COLOR_SPACE: u32 = 0x5769_6E20;

/// Encode raw pixel data as BMP.
pub fn encode(data: &[u8], width: u32, height: u32, color_type: ColorType) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    encode_into(&mut output, data, width, height, color_type)?;
    Ok(output)
}

/// Encode raw pixel data as BMP into a caller-provided buffer, clearing it first.
pub fn encode_into(
    output: &mut Vec<u8>,
    data: &[u8],
    width: u32,
    height: u32,
    color_type: ColorType,
) -> Result<()> {
    output.clear();
    let image = ImageRef::new(data, width, height, color_type)?;
    write_image(&image, output)
}

/// Stream `source` as BMP into `writer`.
pub fn write_image<S, W>(source: &S, writer: W) -> Result<()>
where
    S: PixelSource + ?Sized,
    W: Write,
{
    write_image_with_context(source, writer, &mut EncodeContext::new())
}

/// Stream `source` as BMP into `writer`, polling `ctx` between rows.
pub fn write_image_with_context<S, W>(
    source: &S,
    writer: W,
    ctx: &mut EncodeContext<'_>,
) -> Result<()>
where
    S: PixelSource + ?Sized,
    W: Write,
{
    let color_type = source::validate(source, MAX_DIMENSION)?;
    let width = source.width();
    let height = source.height();

    let has_alpha = color_type == ColorType::Rgba;
    let bytes_per_pixel: u64 = if has_alpha { 4 } else { 3 };
    let row_len = width as u64 * bytes_per_pixel;
    let pad = (row_len.wrapping_neg() & 3) as usize;
    let header_len = if has_alpha { V4_HEADER_LEN } else { INFO_HEADER_LEN };
    let data_offset = FILE_HEADER_LEN + header_len;

    let data_size = (row_len + pad as u64) * height as u64;
    let file_size = data_size + data_offset as u64;
    if file_size > u32::MAX as u64 {
        return Err(Error::ImageTooLarge {
            width,
            height,
            max: MAX_DIMENSION,
        });
    }

    debug!(width, height, components = color_type.components(), "encoding bmp");

    ctx.check()?;
    ctx.begin(width as u64 * height as u64);

    let mut sink = ByteSink::new(writer);

    // BITMAPFILEHEADER
    sink.write_bytes(b"BM")?;
    sink.write_u32_le(file_size as u32)?;
    sink.write_u32_le(0)?; // reserved
    sink.write_u32_le(data_offset)?;

    // BITMAPINFOHEADER
    sink.write_u32_le(header_len)?;
    sink.write_u32_le(width)?;
    sink.write_u32_le(height)?; // positive: bottom-up
    sink.write_u16_le(1)?; // planes
    sink.write_u16_le(bytes_per_pixel as u16 * 8)?;
    sink.write_u32_le(if has_alpha { BI_BITFIELDS } else { BI_RGB })?;
    sink.write_u32_le(data_size as u32)?;
    sink.write_bytes(&[0; 16])?; // resolution, palette counts

    if has_alpha {
        // V4 extension: R, G, B, A masks, color space, endpoints, gamma
        for mask in [0x00FF_0000u32, 0x0000_FF00, 0x0000_00FF, 0xFF00_0000] {
            sink.write_u32_le(mask)?;
        }
        sink.write_u32_le(LCS_WINDOWS_COLOR_SPACE)?;
        sink.write_bytes(&[0; 48])?;
    }

    let components = color_type.components();
    let mut row = vec![0u8; width as usize * components];
    let mut line = Vec::with_capacity(row_len as usize + pad);

    for (done, y) in (0..height).rev().enumerate() {
        ctx.check()?;
        source.row_bytes(y, &mut row);

        line.clear();
        for pixel in row.chunks_exact(components) {
            push_bgr(pixel, true, has_alpha, &mut line);
        }
        line.resize(line.len() + pad, 0);
        sink.write_bytes(&line)?;

        ctx.advance(width as u64, (done + 1) as f32 / height as f32);
    }

    sink.flush()?;
    ctx.finish();

    debug!(bytes = sink.bytes_written(), "bmp encoded");
    Ok(())
}
