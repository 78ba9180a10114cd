//! # rowenc
//!
//! Streaming raster image encoders.
//!
//! Every encoder pulls pixels one row at a time from a [`PixelSource`] and
//! writes the finished file straight into any [`std::io::Write`], so peak
//! memory is a few rows regardless of image size.
//!
//! ## Features
//!
//! - **PNG** with all five filters, adaptive per-row filter selection and
//!   `IDAT` chunks streamed as the zlib data is produced
//! - **JPEG** baseline with the standard tables and optional 4:2:0 chroma
//!   subsampling
//! - **BMP**, **TGA** (optionally run-length encoded) and **Radiance HDR**
//! - Cooperative cancellation and paced progress reporting through
//!   [`EncodeContext`]
//! - Optional `rowenc` command-line tool via the `cli` feature
//!
//! ## Example
//!
//! ```rust
//! use rowenc::{jpeg, png, ColorType};
//!
//! // Encode as PNG
//! let pixels: Vec<u8> = vec![255, 0, 0, 255]; // 1x1 red RGBA pixel
//! let png_data = png::encode(&pixels, 1, 1, ColorType::Rgba).unwrap();
//!
//! // Encode as JPEG
//! let rgb_pixels: Vec<u8> = vec![255, 0, 0]; // 1x1 red RGB pixel
//! let jpeg_data = jpeg::encode(&rgb_pixels, 1, 1, 85).unwrap();
//! # assert_eq!(&png_data[1..4], b"PNG");
//! # assert_eq!(&jpeg_data[..2], &[0xFF, 0xD8]);
//! ```
//!
//! Streaming from a custom source:
//!
//! ```rust
//! use rowenc::{png, PixelSource};
//!
//! struct Checkerboard;
//!
//! impl PixelSource for Checkerboard {
//!     fn width(&self) -> u32 { 64 }
//!     fn height(&self) -> u32 { 64 }
//!     fn components(&self) -> usize { 1 }
//!     fn row_bytes(&self, y: u32, dst: &mut [u8]) {
//!         for (x, v) in dst.iter_mut().enumerate() {
//!             *v = if (x / 8 + y as usize / 8) % 2 == 0 { 255 } else { 0 };
//!         }
//!     }
//! }
//!
//! let mut file = Vec::new();
//! png::write_image(&Checkerboard, &mut file, &png::PngOptions::default()).unwrap();
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bits;
pub mod bmp;
pub mod color;
pub mod compress;
pub mod context;
pub mod error;
pub mod hdr;
pub mod jpeg;
pub mod png;
pub mod source;
pub mod tga;

pub use color::ColorType;
pub use context::{EncodeContext, Stop, Unstoppable};
pub use error::{Error, Result};
pub use source::{FloatImageRef, ImageRef, PixelSource};
