//! TGA encoder.
//!
//! Truecolor (type 2) or grayscale (type 3) Targa files, optionally run-length
//! encoded (types 10 and 11). Samples are stored bottom-up in BGR(A) order;
//! gray stays a single sample and alpha is kept.

use std::io::Write;

use tracing::debug;

use crate::bits::ByteSink;
use crate::color::{push_bgr, ColorType};
use crate::context::EncodeContext;
use crate::error::Result;
use crate::source::{self, ImageRef, PixelSource};

/// TGA stores dimensions as unsigned 16-bit values.
const MAX_DIMENSION: u32 = u16::MAX as u32;

/// Longest run or literal packet.
const MAX_PACKET: usize = 128;

/// TGA encoding options.
#[derive(Debug, Clone, Copy)]
pub struct TgaOptions {
    /// Run-length encode each scanline.
    pub rle: bool,
}

impl Default for TgaOptions {
    fn default() -> Self {
        Self { rle: true }
    }
}

/// Encode raw pixel data as RLE-compressed TGA.
pub fn encode(data: &[u8], width: u32, height: u32, color_type: ColorType) -> Result<Vec<u8>> {
    encode_with_options(data, width, height, color_type, &TgaOptions::default())
}

/// Encode raw pixel data as TGA with custom options.
pub fn encode_with_options(
    data: &[u8],
    width: u32,
    height: u32,
    color_type: ColorType,
    options: &TgaOptions,
) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    let image = ImageRef::new(data, width, height, color_type)?;
    write_image(&image, &mut output, options)?;
    Ok(output)
}

/// Stream `source` as TGA into `writer`.
pub fn write_image<S, W>(source: &S, writer: W, options: &TgaOptions) -> Result<()>
where
    S: PixelSource + ?Sized,
    W: Write,
{
    write_image_with_context(source, writer, options, &mut EncodeContext::new())
}

/// Stream `source` as TGA into `writer`, polling `ctx` between rows.
pub fn write_image_with_context<S, W>(
    source: &S,
    writer: W,
    options: &TgaOptions,
    ctx: &mut EncodeContext<'_>,
) -> Result<()>
where
    S: PixelSource + ?Sized,
    W: Write,
{
    let color_type = source::validate(source, MAX_DIMENSION)?;
    let width = source.width();
    let height = source.height();
    let components = color_type.components();
    let has_alpha = color_type.has_alpha();

    debug!(width, height, components, rle = options.rle, "encoding tga");

    ctx.check()?;
    ctx.begin(width as u64 * height as u64);

    let mut image_type = if color_type.has_color() { 2 } else { 3 };
    if options.rle {
        image_type += 8;
    }

    let mut sink = ByteSink::new(writer);
    sink.write_bytes(&[0, 0, image_type])?; // id length, no color map
    sink.write_bytes(&[0; 5])?; // color map spec
    sink.write_u16_le(0)?; // x origin
    sink.write_u16_le(0)?; // y origin
    sink.write_u16_le(width as u16)?;
    sink.write_u16_le(height as u16)?;
    sink.write_byte(components as u8 * 8)?;
    sink.write_byte(if has_alpha { 8 } else { 0 })?; // alpha bits, bottom-left origin

    let mut row = vec![0u8; width as usize * components];
    let mut line = Vec::with_capacity(row.len() + row.len() / MAX_PACKET + 1);

    for (done, y) in (0..height).rev().enumerate() {
        ctx.check()?;
        source.row_bytes(y, &mut row);

        line.clear();
        if options.rle {
            rle_row(&row, components, has_alpha, &mut line);
        } else {
            for pixel in row.chunks_exact(components) {
                push_bgr(pixel, false, has_alpha, &mut line);
            }
        }
        sink.write_bytes(&line)?;

        ctx.advance(width as u64, (done + 1) as f32 / height as f32);
    }

    sink.flush()?;
    ctx.finish();

    debug!(bytes = sink.bytes_written(), "tga encoded");
    Ok(())
}

/// Run-length encode one row of `components`-byte pixels.
///
/// A run packet is one header byte `len + 127` and one pixel; a literal
/// packet is `len - 1` followed by `len` pixels. A literal stretch stops
/// when a pixel equals the one two positions back, which leaves the next
/// packet free to start a run.
fn rle_row(row: &[u8], components: usize, has_alpha: bool, out: &mut Vec<u8>) {
    let pixel = |i: usize| &row[i * components..(i + 1) * components];
    let width = row.len() / components;

    let mut x = 0;
    while x < width {
        let mut len = 1;
        let mut repeat = false;

        if x + 1 < width {
            len = 2;
            repeat = pixel(x) == pixel(x + 1);
            if repeat {
                let mut k = x + 2;
                while k < width && len < MAX_PACKET && pixel(k) == pixel(x) {
                    len += 1;
                    k += 1;
                }
            } else {
                let mut prev = x;
                let mut k = x + 2;
                while k < width && len < MAX_PACKET {
                    if pixel(prev) != pixel(k) {
                        prev += 1;
                        len += 1;
                    } else {
                        len -= 1;
                        break;
                    }
                    k += 1;
                }
            }
        }

        if repeat {
            out.push((len + 127) as u8);
            push_bgr(pixel(x), false, has_alpha, out);
        } else {
            out.push((len - 1) as u8);
            for i in x..x + len {
                push_bgr(pixel(i), false, has_alpha, out);
            }
        }
        x += len;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uncompressed_header_and_order() {
        let pixels = [1, 2, 3, 4, 5, 6];
        let tga =
            encode_with_options(&pixels, 1, 2, ColorType::Rgb, &TgaOptions { rle: false }).unwrap();
        assert_eq!(
            &tga[..18],
            &[0, 0, 2, 0, 0, 0, 0, 0, 0, 0, 0, 0, 1, 0, 2, 0, 24, 0]
        );
        // Bottom row first, BGR
        assert_eq!(&tga[18..], &[6, 5, 4, 3, 2, 1]);
    }

    #[test]
    fn test_gray_alpha_header() {
        let tga = encode(&[9, 200], 1, 1, ColorType::GrayAlpha).unwrap();
        assert_eq!(tga[2], 11);
        assert_eq!(tga[16], 16);
        assert_eq!(tga[17], 8);
        // One literal packet: gray then alpha
        assert_eq!(&tga[18..], &[0, 9, 200]);
    }

    #[test]
    fn test_rle_run() {
        let mut out = Vec::new();
        rle_row(&[7; 5], 1, false, &mut out);
        assert_eq!(out, vec![128 + 4, 7]);
    }

    #[test]
    fn test_rle_literal_then_run() {
        let mut out = Vec::new();
        rle_row(&[1, 2, 3, 3, 3, 3], 1, false, &mut out);
        // The literal ends once row[4] repeats row[2].
        assert_eq!(out, vec![2, 1, 2, 3, 130, 3]);
        assert_eq!(decode_gray(&out), vec![1, 2, 3, 3, 3, 3]);
    }

    #[test]
    fn test_rle_caps_packets() {
        let mut out = Vec::new();
        rle_row(&[5; 300], 1, false, &mut out);
        assert_eq!(out, vec![255, 5, 255, 5, 128 + 43, 5]);
    }

    #[test]
    fn test_rle_rgb_swaps_channels() {
        let mut out = Vec::new();
        rle_row(&[1, 2, 3, 1, 2, 3], 3, false, &mut out);
        assert_eq!(out, vec![129, 3, 2, 1]);
    }

    fn decode_gray(mut data: &[u8]) -> Vec<u8> {
        let mut pixels = Vec::new();
        while let Some((&header, rest)) = data.split_first() {
            let count = (header & 0x7F) as usize + 1;
            if header & 0x80 != 0 {
                pixels.extend(std::iter::repeat(rest[0]).take(count));
                data = &rest[1..];
            } else {
                pixels.extend_from_slice(&rest[..count]);
                data = &rest[count..];
            }
        }
        pixels
    }

    #[test]
    fn test_rle_roundtrips_noise() {
        let row: Vec<u8> = (0..500u32).map(|i| ((i * i) % 7) as u8).collect();
        let mut out = Vec::new();
        rle_row(&row, 1, false, &mut out);
        assert_eq!(decode_gray(&out), row);
    }
}
