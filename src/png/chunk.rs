//! PNG chunk handling.

use std::io::{self, Write};

use crate::compress::crc32::Crc32;

/// Default body size of each streamed IDAT chunk.
pub const DEFAULT_CHUNK_SIZE: usize = 256 * 1024;

/// Write a complete PNG chunk (length, type, data, CRC32).
pub fn write_chunk<W: Write>(output: &mut W, chunk_type: &[u8; 4], data: &[u8]) -> io::Result<()> {
    let mut crc = Crc32::new();
    crc.update(chunk_type);
    crc.update(data);

    output.write_all(&(data.len() as u32).to_be_bytes())?;
    output.write_all(chunk_type)?;
    output.write_all(data)?;
    output.write_all(&crc.finalize().to_be_bytes())
}

/// Streaming chunk framer.
///
/// Everything written is collected into a bounded window. Each time the
/// window fills, one chunk of the configured type is emitted with its own
/// length and CRC; [`ChunkWriter::finish`] emits the final partial chunk.
/// The CRC rolls forward as bytes arrive, so emitting a chunk never
/// rescans its body.
pub struct ChunkWriter<W: Write> {
    inner: W,
    chunk_type: [u8; 4],
    window: Vec<u8>,
    limit: usize,
    crc: Crc32,
    chunks: u32,
}

impl<W: Write> ChunkWriter<W> {
    /// Frame bytes into `chunk_type` chunks of at most `limit` body bytes.
    pub fn new(inner: W, chunk_type: [u8; 4], limit: usize) -> Self {
        let limit = limit.clamp(1, i32::MAX as usize);
        Self {
            inner,
            chunk_type,
            window: Vec::with_capacity(limit.min(DEFAULT_CHUNK_SIZE)),
            limit,
            crc: Self::fresh_crc(&chunk_type),
            chunks: 0,
        }
    }

    fn fresh_crc(chunk_type: &[u8; 4]) -> Crc32 {
        let mut crc = Crc32::new();
        crc.update(chunk_type);
        crc
    }

    /// Number of chunks emitted so far.
    pub fn chunks_written(&self) -> u32 {
        self.chunks
    }

    fn emit(&mut self) -> io::Result<()> {
        let crc = std::mem::replace(&mut self.crc, Self::fresh_crc(&self.chunk_type));
        self.inner
            .write_all(&(self.window.len() as u32).to_be_bytes())?;
        self.inner.write_all(&self.chunk_type)?;
        self.inner.write_all(&self.window)?;
        self.inner.write_all(&crc.finalize().to_be_bytes())?;
        self.window.clear();
        self.chunks += 1;
        Ok(())
    }

    /// Emit whatever is buffered as the last chunk and return the inner writer.
    ///
    /// An empty window is only emitted when no chunk has been written yet.
    pub fn finish(mut self) -> io::Result<W> {
        if !self.window.is_empty() || self.chunks == 0 {
            self.emit()?;
        }
        Ok(self.inner)
    }
}

impl<W: Write> Write for ChunkWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let room = self.limit - self.window.len();
        let n = buf.len().min(room);
        self.window.extend_from_slice(&buf[..n]);
        self.crc.update(&buf[..n]);
        if self.window.len() == self.limit {
            self.emit()?;
        }
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
