//! Zlib (RFC 1950) framing around a raw DEFLATE stream.
//!
//! The DEFLATE blocks themselves come from `flate2`; this module owns the
//! 2-byte CMF/FLG header and the big-endian Adler-32 trailer so the running
//! checksum is computed over exactly the bytes the encoder fed in.

use std::io::{self, Write};

use flate2::write::DeflateEncoder;
use flate2::Compression;

use super::adler32::Adler32;

/// Compression effort for the DEFLATE stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionLevel {
    /// Stored blocks only.
    None,
    /// Fastest compression.
    Fastest,
    /// Balanced speed and size.
    #[default]
    Optimal,
    /// Smallest output, slowest.
    SmallestSize,
}

impl CompressionLevel {
    /// Level handed to the DEFLATE compressor.
    pub fn deflate_level(self) -> Compression {
        match self {
            CompressionLevel::None => Compression::none(),
            CompressionLevel::Fastest => Compression::fast(),
            CompressionLevel::Optimal => Compression::default(),
            CompressionLevel::SmallestSize => Compression::best(),
        }
    }

    /// FLEVEL field of the zlib header (informational only).
    fn flevel(self) -> u8 {
        match self {
            CompressionLevel::None => 0,
            CompressionLevel::Fastest => 1,
            CompressionLevel::Optimal => 2,
            CompressionLevel::SmallestSize => 3,
        }
    }

    /// Two-byte zlib header: deflate with a 32K window, no preset dictionary.
    pub fn zlib_header(self) -> [u8; 2] {
        const CMF: u8 = 0x78;
        let mut flg = self.flevel() << 6;
        // FCHECK makes (CMF * 256 + FLG) a multiple of 31.
        let rem = ((CMF as u16) << 8 | flg as u16) % 31;
        if rem != 0 {
            flg += (31 - rem) as u8;
        }
        [CMF, flg]
    }
}

/// Streaming zlib writer.
///
/// Writes the header to `inner` on construction, compresses everything
/// written to it, and appends the Adler-32 trailer on [`ZlibWriter::finish`].
pub struct ZlibWriter<W: Write> {
    encoder: DeflateEncoder<W>,
    adler: Adler32,
}

impl<W: Write> ZlibWriter<W> {
    /// Start a zlib stream on `inner`.
    pub fn new(mut inner: W, level: CompressionLevel) -> io::Result<Self> {
        inner.write_all(&level.zlib_header())?;
        Ok(Self {
            encoder: DeflateEncoder::new(inner, level.deflate_level()),
            adler: Adler32::new(),
        })
    }

    /// Finish the DEFLATE stream, write the trailer, and hand back the inner writer.
    pub fn finish(self) -> io::Result<W> {
        let checksum = self.adler.finalize();
        let mut inner = self.encoder.finish()?;
        inner.write_all(&checksum.to_be_bytes())?;
        Ok(inner)
    }
}

impl<W: Write> Write for ZlibWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.encoder.write(buf)?;
        self.adler.update(&buf[..n]);
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.encoder.flush()
    }
}
