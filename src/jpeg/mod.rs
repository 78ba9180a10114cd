//! JPEG encoder implementation.
//!
//! Baseline sequential DCT (SOF0) with the standard Huffman tables and
//! optional 4:2:0 chroma subsampling. Pixels are pulled from a
//! [`PixelSource`] one stripe of 8 (or 16) rows at a time, converted to
//! level-shifted YCbCr, transformed with a float AAN DCT and entropy coded
//! straight into the output sink.

pub mod dct;
pub mod huffman;
pub mod quantize;

use std::io::Write;

use tracing::{debug, trace};

use crate::bits::{BitWriterMsb, ByteSink};
use crate::color::{rgb_to_ycbcr, ColorType};
use crate::context::EncodeContext;
use crate::error::{Error, Result};
use crate::source::{self, ImageRef, PixelSource};

use dct::forward_dct;
use huffman::{
    encode_block, HuffmanTable, AC_CHROMINANCE, AC_LUMINANCE, DC_CHROMINANCE, DC_LUMINANCE,
};
use quantize::{quantize_block, QuantizationTables};

/// Maximum supported image dimension for JPEG.
const MAX_DIMENSION: u32 = 65535;

/// JPEG markers.
const SOI: u16 = 0xFFD8; // Start of Image
const EOI: u16 = 0xFFD9; // End of Image
const APP0: u16 = 0xFFE0; // JFIF marker
const DQT: u16 = 0xFFDB; // Define Quantization Table
const SOF0: u16 = 0xFFC0; // Start of Frame (baseline DCT)
const DHT: u16 = 0xFFC4; // Define Huffman Table
const SOS: u16 = 0xFFDA; // Start of Scan

/// Default quality when none is given.
pub const DEFAULT_QUALITY: u8 = 90;

/// Encode raw RGB pixel data as JPEG.
///
/// # Arguments
/// * `data` - Raw pixel data (RGB, row-major order)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `quality` - Quality level 1-100 (higher = better quality, larger file)
///
/// # Returns
/// Complete JPEG file as bytes.
pub fn encode(data: &[u8], width: u32, height: u32, quality: u8) -> Result<Vec<u8>> {
    encode_with_color(data, width, height, quality, ColorType::Rgb)
}

/// Encode raw pixel data as JPEG with specified color type.
///
/// Gray inputs are written as three-component images with neutral chroma;
/// alpha is ignored.
pub fn encode_with_color(
    data: &[u8],
    width: u32,
    height: u32,
    quality: u8,
    color_type: ColorType,
) -> Result<Vec<u8>> {
    let options = JpegOptions::fast(quality);
    encode_with_options(data, width, height, color_type, &options)
}

/// Chroma subsampling options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Subsampling {
    /// 4:4:4, no subsampling.
    #[default]
    S444,
    /// 4:2:0, 2x2 chroma downsample.
    S420,
}

impl Subsampling {
    /// Edge length of one MCU in pixels.
    fn mcu_size(self) -> usize {
        match self {
            Subsampling::S444 => 8,
            Subsampling::S420 => 16,
        }
    }

    /// Luma sampling factors byte in SOF0.
    fn luma_sampling(self) -> u8 {
        match self {
            Subsampling::S444 => 0x11,
            Subsampling::S420 => 0x22,
        }
    }
}

/// JPEG encoding options.
#[derive(Debug, Clone, Copy)]
pub struct JpegOptions {
    /// Quality level 1-100.
    pub quality: u8,
    /// Subsampling scheme.
    pub subsampling: Subsampling,
    /// Read rows through [`PixelSource::row_floats`] (scaled by 255) instead
    /// of the byte rows. Samples outside `0.0..=1.0` are clamped.
    pub float_input: bool,
}

impl Default for JpegOptions {
    fn default() -> Self {
        Self {
            quality: DEFAULT_QUALITY,
            subsampling: Subsampling::S444,
            float_input: false,
        }
    }
}

impl JpegOptions {
    /// Full-resolution chroma at `quality`.
    pub fn fast(quality: u8) -> Self {
        Self {
            quality,
            ..Self::default()
        }
    }

    /// 4:2:0 chroma at `quality`; smaller output.
    pub fn max(quality: u8) -> Self {
        Self {
            quality,
            subsampling: Subsampling::S420,
            ..Self::default()
        }
    }
}

/// Encode raw pixel data as JPEG with options.
pub fn encode_with_options(
    data: &[u8],
    width: u32,
    height: u32,
    color_type: ColorType,
    options: &JpegOptions,
) -> Result<Vec<u8>> {
    let mut output = Vec::new();
    encode_into(&mut output, data, width, height, color_type, options)?;
    Ok(output)
}

/// Encode raw pixel data as JPEG with options into a caller-provided buffer.
///
/// The `output` buffer will be cleared and reused, allowing callers to avoid
/// repeated allocations across multiple encodes.
pub fn encode_into(
    output: &mut Vec<u8>,
    data: &[u8],
    width: u32,
    height: u32,
    color_type: ColorType,
    options: &JpegOptions,
) -> Result<()> {
    output.clear();
    let image = ImageRef::new(data, width, height, color_type)?;
    write_image(&image, output, options)
}

/// Stream `source` as JPEG into `writer`.
pub fn write_image<S, W>(source: &S, writer: W, options: &JpegOptions) -> Result<()>
where
    S: PixelSource + ?Sized,
    W: Write,
{
    write_image_with_context(source, writer, options, &mut EncodeContext::new())
}

/// Stream `source` as JPEG into `writer`, polling `ctx` for cancellation and progress.
///
/// Preconditions are checked before the first byte is written. On any
/// error the writer holds a truncated stream that the caller should discard.
pub fn write_image_with_context<S, W>(
    source: &S,
    writer: W,
    options: &JpegOptions,
    ctx: &mut EncodeContext<'_>,
) -> Result<()>
where
    S: PixelSource + ?Sized,
    W: Write,
{
    let color_type = validate(source, options)?;
    let width = source.width();
    let height = source.height();

    debug!(
        width,
        height,
        components = color_type.components(),
        quality = options.quality,
        subsampling = ?options.subsampling,
        "encoding jpeg"
    );

    ctx.check()?;
    ctx.begin(width as u64 * height as u64);

    let tables = QuantizationTables::with_quality(options.quality);

    let mut sink = ByteSink::new(writer);
    write_app0(&mut sink)?;
    write_dqt(&mut sink, &tables)?;
    write_sof0(&mut sink, width, height, options.subsampling)?;
    write_dht(&mut sink)?;
    write_sos(&mut sink)?;

    let mut stripe = Stripe::new(
        width as usize,
        options.subsampling.mcu_size(),
        color_type,
        options.float_input,
    );
    {
        let mut bits = BitWriterMsb::new(&mut sink);
        encode_scan(source, &mut bits, &mut stripe, &tables, options.subsampling, ctx)?;
        bits.finish()?;
    }

    sink.write_u16_be(EOI)?;
    sink.flush()?;
    ctx.finish();

    debug!(bytes = sink.bytes_written(), "jpeg encoded");
    Ok(())
}

fn validate<S: PixelSource + ?Sized>(source: &S, options: &JpegOptions) -> Result<ColorType> {
    if options.quality == 0 || options.quality > 100 {
        return Err(Error::InvalidQuality(options.quality));
    }
    source::validate(source, MAX_DIMENSION)
}

/// Write SOI and the APP0 (JFIF) segment.
fn write_app0<W: Write>(output: &mut ByteSink<W>) -> Result<()> {
    output.write_u16_be(SOI)?;
    output.write_u16_be(APP0)?;

    // Length (16 bytes including length field)
    output.write_u16_be(16)?;

    // JFIF identifier
    output.write_bytes(b"JFIF\0")?;

    // Version 1.01
    output.write_bytes(&[1, 1])?;

    // Units: 0 = no units (aspect ratio only)
    output.write_byte(0)?;

    // X and Y density
    output.write_u16_be(1)?;
    output.write_u16_be(1)?;

    // Thumbnail dimensions (0x0 = no thumbnail)
    output.write_bytes(&[0, 0])?;
    Ok(())
}

/// Write one DQT segment carrying both tables.
fn write_dqt<W: Write>(output: &mut ByteSink<W>, tables: &QuantizationTables) -> Result<()> {
    output.write_u16_be(DQT)?;
    // Length: 2 + 2 * (1 + 64)
    output.write_u16_be(132)?;
    output.write_byte(0)?; // Table 0, 8-bit precision
    output.write_bytes(&tables.luminance)?;
    output.write_byte(1)?; // Table 1, 8-bit precision
    output.write_bytes(&tables.chrominance)?;
    Ok(())
}

/// Write SOF0 (Start of Frame - baseline) marker.
///
/// Always three components: Y uses quantization table 0, Cb and Cr use
/// table 1 at 1x1 sampling.
fn write_sof0<W: Write>(
    output: &mut ByteSink<W>,
    width: u32,
    height: u32,
    subsampling: Subsampling,
) -> Result<()> {
    output.write_u16_be(SOF0)?;
    // Length: 8 + 3 * 3
    output.write_u16_be(17)?;
    output.write_byte(8)?; // Precision
    output.write_u16_be(height as u16)?;
    output.write_u16_be(width as u16)?;
    output.write_byte(3)?;

    output.write_bytes(&[1, subsampling.luma_sampling(), 0])?;
    output.write_bytes(&[2, 0x11, 1])?;
    output.write_bytes(&[3, 0x11, 1])?;
    Ok(())
}

/// Write one DHT segment with all four standard tables.
fn write_dht<W: Write>(output: &mut ByteSink<W>) -> Result<()> {
    let tables: [(u8, &HuffmanTable); 4] = [
        (0x00, &DC_LUMINANCE),
        (0x10, &AC_LUMINANCE),
        (0x01, &DC_CHROMINANCE),
        (0x11, &AC_CHROMINANCE),
    ];
    let length: usize = 2 + tables
        .iter()
        .map(|(_, table)| 1 + 16 + table.vals.len())
        .sum::<usize>();

    output.write_u16_be(DHT)?;
    output.write_u16_be(length as u16)?;
    for (class_id, table) in tables {
        output.write_byte(class_id)?;
        output.write_bytes(&table.bits)?;
        output.write_bytes(table.vals)?;
    }
    Ok(())
}

/// Write SOS (Start of Scan) marker for the single interleaved scan.
fn write_sos<W: Write>(output: &mut ByteSink<W>) -> Result<()> {
    output.write_u16_be(SOS)?;
    // Length: 6 + 2 * 3
    output.write_u16_be(12)?;
    output.write_byte(3)?;

    // Y: DC/AC tables 0; Cb and Cr: DC/AC tables 1
    output.write_bytes(&[1, 0x00, 2, 0x11, 3, 0x11])?;

    // Spectral selection 0..63, no successive approximation
    output.write_bytes(&[0, 63, 0])?;
    Ok(())
}

/// A horizontal band of `rows` source rows, converted to YCbCr planes.
///
/// Rows past the bottom edge repeat the last row; columns past the right
/// edge repeat the last column when blocks are gathered.
struct Stripe {
    width: usize,
    rows: usize,
    components: usize,
    offsets: (usize, usize),
    float_input: bool,
    bytes: Vec<u8>,
    floats: Vec<f32>,
    planes: [Vec<f32>; 3],
}

impl Stripe {
    fn new(width: usize, rows: usize, color_type: ColorType, float_input: bool) -> Self {
        let components = color_type.components();
        let stride = width * components;
        let (bytes, floats) = if float_input {
            (Vec::new(), vec![0.0; stride])
        } else {
            (vec![0; stride], Vec::new())
        };
        let plane = vec![0.0f32; width * rows];
        Self {
            width,
            rows,
            components,
            offsets: color_type.rgb_offsets(),
            float_input,
            bytes,
            floats,
            planes: [plane.clone(), plane.clone(), plane],
        }
    }

    fn load<S: PixelSource + ?Sized>(&mut self, source: &S, top: u32, height: u32) {
        let (g, b) = self.offsets;
        for r in 0..self.rows {
            let y = (top + r as u32).min(height - 1);
            if self.float_input {
                source.row_floats(y, &mut self.floats);
            } else {
                source.row_bytes(y, &mut self.bytes);
            }

            let base = r * self.width;
            for x in 0..self.width {
                let p = x * self.components;
                let (red, green, blue) = if self.float_input {
                    (
                        (self.floats[p] * 255.0).clamp(0.0, 255.0),
                        (self.floats[p + g] * 255.0).clamp(0.0, 255.0),
                        (self.floats[p + b] * 255.0).clamp(0.0, 255.0),
                    )
                } else {
                    (
                        self.bytes[p] as f32,
                        self.bytes[p + g] as f32,
                        self.bytes[p + b] as f32,
                    )
                };
                let (luma, cb, cr) = rgb_to_ycbcr(red, green, blue);
                self.planes[0][base + x] = luma;
                self.planes[1][base + x] = cb;
                self.planes[2][base + x] = cr;
            }
        }
    }

    /// Copy a `rows`-square starting at column `left` of `plane` into `out`.
    fn gather(&self, plane: usize, left: usize, out: &mut [f32]) {
        let size = self.rows;
        let src = &self.planes[plane];
        for row in 0..size {
            for col in 0..size {
                let x = (left + col).min(self.width - 1);
                out[row * size + col] = src[row * self.width + x];
            }
        }
    }
}

/// Transform, quantize and entropy-code one block; returns its DC.
fn code_block<W: Write>(
    bits: &mut BitWriterMsb<'_, W>,
    block: &mut [f32; 64],
    scale: &[f32; 64],
    prev_dc: i32,
    dc_table: &HuffmanTable,
    ac_table: &HuffmanTable,
) -> Result<i32> {
    forward_dct(block);
    let quantized = quantize_block(block, scale);
    Ok(encode_block(bits, &quantized, prev_dc, dc_table, ac_table)?)
}

/// Average 2x2 groups of a 16x16 square into an 8x8 block.
fn downsample(square: &[f32; 256], out: &mut [f32; 64]) {
    for yy in 0..8 {
        for xx in 0..8 {
            let j = yy * 32 + xx * 2;
            out[yy * 8 + xx] =
                (square[j] + square[j + 1] + square[j + 16] + square[j + 17]) * 0.25;
        }
    }
}

fn encode_scan<S, W>(
    source: &S,
    bits: &mut BitWriterMsb<'_, W>,
    stripe: &mut Stripe,
    tables: &QuantizationTables,
    subsampling: Subsampling,
    ctx: &mut EncodeContext<'_>,
) -> Result<()>
where
    S: PixelSource + ?Sized,
    W: Write,
{
    let width = source.width();
    let height = source.height();
    let mcu = subsampling.mcu_size();

    // DC predictors for Y, Cb, Cr; reset only here.
    let mut dc = [0i32; 3];
    let mut block = [0.0f32; 64];
    let mut squares = [[0.0f32; 256]; 3];

    for top in (0..height).step_by(mcu) {
        ctx.check()?;
        stripe.load(source, top, height);

        for left in (0..width as usize).step_by(mcu) {
            ctx.check()?;
            match subsampling {
                Subsampling::S444 => {
                    stripe.gather(0, left, &mut block);
                    dc[0] = code_block(
                        bits,
                        &mut block,
                        &tables.luminance_scale,
                        dc[0],
                        &DC_LUMINANCE,
                        &AC_LUMINANCE,
                    )?;
                    for c in 1..3 {
                        stripe.gather(c, left, &mut block);
                        dc[c] = code_block(
                            bits,
                            &mut block,
                            &tables.chrominance_scale,
                            dc[c],
                            &DC_CHROMINANCE,
                            &AC_CHROMINANCE,
                        )?;
                    }
                }
                Subsampling::S420 => {
                    for (c, square) in squares.iter_mut().enumerate() {
                        stripe.gather(c, left, square);
                    }
                    for offset in [0, 8, 128, 136] {
                        for row in 0..8 {
                            let src = offset + row * 16;
                            block[row * 8..row * 8 + 8].copy_from_slice(&squares[0][src..src + 8]);
                        }
                        dc[0] = code_block(
                            bits,
                            &mut block,
                            &tables.luminance_scale,
                            dc[0],
                            &DC_LUMINANCE,
                            &AC_LUMINANCE,
                        )?;
                    }
                    for c in 1..3 {
                        downsample(&squares[c], &mut block);
                        dc[c] = code_block(
                            bits,
                            &mut block,
                            &tables.chrominance_scale,
                            dc[c],
                            &DC_CHROMINANCE,
                            &AC_CHROMINANCE,
                        )?;
                    }
                }
            }
        }

        let rows = (height - top).min(mcu as u32);
        trace!(top, rows, "jpeg stripe");
        ctx.advance(rows as u64 * width as u64, (top + rows) as f32 / height as f32);
    }
    Ok(())
}
