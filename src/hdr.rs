//! Radiance HDR encoder.
//!
//! Writes `32-bit_rle_rgbe` files from the float rows of a
//! [`PixelSource`]. Scanlines between 8 and 32767 pixels wide use the
//! adaptive run-length scheme with each RGBE channel coded separately;
//! others are written as flat RGBE quadruples.

use std::io::Write;

use tracing::debug;

use crate::bits::ByteSink;
use crate::color::ColorType;
use crate::context::EncodeContext;
use crate::error::Result;
use crate::source::{self, FloatImageRef, PixelSource};

/// Widths the run-length scanline format can express.
const MIN_RLE_WIDTH: usize = 8;
const MAX_RLE_WIDTH: usize = 32767;

/// Longest run packet.
const MAX_RUN: usize = 127;
/// Longest literal packet.
const MAX_DUMP: usize = 128;

/// Encode linear float pixel data as Radiance HDR.
pub fn encode(data: &[f32], width: u32, height: u32, color_type: ColorType) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let image = FloatImageRef::new(data, width, height, color_type)?;
    write_image(&image, &mut output)?;
    Ok(output)
}

/// Stream `source` as Radiance HDR into `writer`.
pub fn write_image<S, W>(source: &S, writer: W) -> Result<()>
where
    S: PixelSource + ?Sized,
    W: Write,
{
    write_image_with_context(source, writer, &mut EncodeContext::new())
}

/// Stream `source` as Radiance HDR into `writer`, polling `ctx` between rows.
pub fn write_image_with_context<S, W>(
    source: &S,
    writer: W,
    ctx: &mut EncodeContext<'_>,
) -> Result<()>
where
    S: PixelSource + ?Sized,
    W: Write,
{
    let color_type = source::validate(source, i32::MAX as u32)?;
    let width = source.width();
    let height = source.height();

    debug!(width, height, components = color_type.components(), "encoding hdr");

    ctx.check()?;
    ctx.begin(width as u64 * height as u64);

    let mut sink = ByteSink::new(writer);
    sink.write_bytes(b"#?RADIANCE\nFORMAT=32-bit_rle_rgbe\n")?;
    sink.write_bytes(format!("EXPOSURE=1.0\n\n-Y {height} +X {width}\n").as_bytes())?;

    let w = width as usize;
    let components = color_type.components();
    let (g, b) = color_type.rgb_offsets();
    let rle = (MIN_RLE_WIDTH..=MAX_RLE_WIDTH).contains(&w);

    let mut row = vec![0.0f32; w * components];
    // Channel-planar RGBE for the run-length path, interleaved otherwise.
    let mut rgbe = vec![0u8; w * 4];

    for y in 0..height {
        ctx.check()?;
        source.row_floats(y, &mut row);

        for (x, pixel) in row.chunks_exact(components).enumerate() {
            let quad = linear_to_rgbe(pixel[0], pixel[g], pixel[b]);
            if rle {
                for (c, &v) in quad.iter().enumerate() {
                    rgbe[c * w + x] = v;
                }
            } else {
                rgbe[x * 4..x * 4 + 4].copy_from_slice(&quad);
            }
        }

        if rle {
            sink.write_bytes(&[2, 2, (w >> 8) as u8, (w & 0xFF) as u8])?;
            for channel in rgbe.chunks_exact(w) {
                write_rle_channel(&mut sink, channel)?;
            }
        } else {
            sink.write_bytes(&rgbe)?;
        }

        ctx.advance(width as u64, (y + 1) as f32 / height as f32);
    }

    sink.flush()?;
    ctx.finish();

    debug!(bytes = sink.bytes_written(), "hdr encoded");
    Ok(())
}

/// Run-length code one channel of a scanline.
///
/// Runs need at least three equal bytes; everything else goes out in
/// literal packets.
fn write_rle_channel<W: Write>(sink: &mut ByteSink<W>, data: &[u8]) -> Result<()> {
    let width = data.len();
    let mut x = 0;
    while x < width {
        // Find the start of the next run of three.
        let mut r = x;
        while r + 2 < width {
            if data[r] == data[r + 1] && data[r] == data[r + 2] {
                break;
            }
            r += 1;
        }
        if r + 2 >= width {
            r = width;
        }

        while x < r {
            let len = (r - x).min(MAX_DUMP);
            sink.write_byte(len as u8)?;
            sink.write_bytes(&data[x..x + len])?;
            x += len;
        }

        if r + 2 < width {
            while r < width && data[r] == data[x] {
                r += 1;
            }
            while x < r {
                let len = (r - x).min(MAX_RUN);
                sink.write_bytes(&[(len + 128) as u8, data[x]])?;
                x += len;
            }
        }
    }
    Ok(())
}

/// `frexp`: split `value` into a mantissa in `[0.5, 1)` and a power of two.
fn frexp(value: f64) -> (f64, i32) {
    if value == 0.0 || !value.is_finite() {
        return (value, 0);
    }
    let bits = value.to_bits();
    let exp = ((bits >> 52) & 0x7FF) as i32;
    if exp == 0 {
        // Subnormal: scale into the normal range first.
        let (m, e) = frexp(value * f64::from_bits(0x4350_0000_0000_0000)); // 2^54
        return (m, e - 54);
    }
    let mantissa = f64::from_bits((bits & !(0x7FF << 52)) | (1022 << 52));
    (mantissa, exp - 1022)
}

/// Convert linear RGB to shared-exponent RGBE.
pub fn linear_to_rgbe(r: f32, g: f32, b: f32) -> [u8; 4] {
    let max = r.max(g).max(b);
    if max < 1e-32 {
        return [0; 4];
    }
    let (mantissa, exponent) = frexp(max as f64);
    let normalize = (mantissa * 256.0 / max as f64) as f32;
    [
        (r * normalize) as u8,
        (g * normalize) as u8,
        (b * normalize) as u8,
        (exponent + 128).clamp(0, 255) as u8,
    ]
}
