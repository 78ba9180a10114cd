//! Checksums and zlib framing.

pub mod adler32;
pub mod crc32;
pub mod zlib;

pub use adler32::{adler32, Adler32};
pub use crc32::{crc32, Crc32};
pub use zlib::{CompressionLevel, ZlibWriter};
