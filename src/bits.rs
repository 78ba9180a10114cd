//! Byte and bit-level output.
//!
//! [`ByteSink`] is the buffered byte writer every encoder emits through.
//! [`BitWriterMsb`] layers JPEG's MSB-first bit packing with `0xFF 0x00`
//! byte stuffing on top of a borrowed sink.

use std::io::{self, Write};

/// Default size of the sink's internal buffer.
pub const DEFAULT_BUFFER_SIZE: usize = 64 * 1024;

/// Buffered byte sink over any [`Write`].
///
/// Bytes are collected into a fixed-capacity buffer and forwarded to the
/// underlying writer, in emission order, whenever it fills. Writes larger
/// than the buffer bypass it. Call [`ByteSink::flush`] or
/// [`ByteSink::into_inner`] when done; dropping the sink discards
/// whatever is still buffered.
#[derive(Debug)]
pub struct ByteSink<W: Write> {
    inner: W,
    buffer: Vec<u8>,
    capacity: usize,
    written: u64,
}

impl<W: Write> ByteSink<W> {
    /// Create a sink with the default buffer size.
    pub fn new(inner: W) -> Self {
        Self::with_capacity(inner, DEFAULT_BUFFER_SIZE)
    }

    /// Create a sink with a buffer of `capacity` bytes (at least 1).
    pub fn with_capacity(inner: W, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            inner,
            buffer: Vec::with_capacity(capacity),
            capacity,
            written: 0,
        }
    }

    /// Write a byte sequence.
    pub fn write_bytes(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.buffer.len() + bytes.len() > self.capacity {
            self.flush_buffer()?;
            if bytes.len() >= self.capacity {
                self.inner.write_all(bytes)?;
                self.written += bytes.len() as u64;
                return Ok(());
            }
        }
        self.buffer.extend_from_slice(bytes);
        self.written += bytes.len() as u64;
        Ok(())
    }

    /// Write a single byte.
    #[inline]
    pub fn write_byte(&mut self, byte: u8) -> io::Result<()> {
        if self.buffer.len() == self.capacity {
            self.flush_buffer()?;
        }
        self.buffer.push(byte);
        self.written += 1;
        Ok(())
    }

    /// Write a big-endian `u16`.
    pub fn write_u16_be(&mut self, value: u16) -> io::Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Write a big-endian `u32`.
    pub fn write_u32_be(&mut self, value: u32) -> io::Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Write a little-endian `u16`.
    pub fn write_u16_le(&mut self, value: u16) -> io::Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Write a little-endian `u32`.
    pub fn write_u32_le(&mut self, value: u32) -> io::Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    /// Total bytes accepted so far (buffered or forwarded).
    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Forward buffered bytes and flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.flush_buffer()?;
        self.inner.flush()
    }

    /// Flush and return the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.inner)
    }

    fn flush_buffer(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.inner.write_all(&self.buffer)?;
            self.buffer.clear();
        }
        Ok(())
    }
}

impl<W: Write> Write for ByteSink<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        ByteSink::flush(self)
    }
}

/// MSB-first bit packer for JPEG entropy-coded data.
///
/// Pending bits live in the top of a 24-bit window. Every completed byte is
/// emitted to the sink immediately, followed by a stuffed `0x00` when it is
/// `0xFF`. At most 7 bits are ever pending between calls.
pub struct BitWriterMsb<'a, W: Write> {
    sink: &'a mut ByteSink<W>,
    bit_buffer: u32,
    bit_count: u32,
}

impl<'a, W: Write> BitWriterMsb<'a, W> {
    /// Start packing bits into `sink`.
    pub fn new(sink: &'a mut ByteSink<W>) -> Self {
        Self {
            sink,
            bit_buffer: 0,
            bit_count: 0,
        }
    }

    /// Append the low `num_bits` bits of `value` (1..=16), MSB first.
    #[inline]
    pub fn write_bits(&mut self, value: u16, num_bits: u8) -> io::Result<()> {
        debug_assert!((1..=16).contains(&num_bits));

        let num_bits = num_bits as u32;
        let mask = (1u32 << num_bits) - 1;
        self.bit_count += num_bits;
        self.bit_buffer |= (value as u32 & mask) << (24 - self.bit_count);

        while self.bit_count >= 8 {
            let byte = ((self.bit_buffer >> 16) & 0xFF) as u8;
            self.sink.write_byte(byte)?;
            if byte == 0xFF {
                self.sink.write_byte(0x00)?;
            }
            self.bit_buffer <<= 8;
            self.bit_count -= 8;
        }
        Ok(())
    }

    /// Number of bits waiting for a full byte (0..=7).
    pub fn pending_bits(&self) -> u32 {
        self.bit_count
    }

    /// Zero-pad any pending bits to a byte boundary and emit them.
    pub fn flush(&mut self) -> io::Result<()> {
        if self.bit_count > 0 {
            let pad = (8 - self.bit_count) as u8;
            self.write_bits(0, pad)?;
        }
        Ok(())
    }

    /// Pad to a byte boundary with 1-bits, as JPEG requires before a marker.
    pub fn finish(mut self) -> io::Result<()> {
        if self.bit_count > 0 {
            let pad = (8 - self.bit_count) as u8;
            self.write_bits(0x7F, pad)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packed(f: impl FnOnce(&mut BitWriterMsb<'_, Vec<u8>>)) -> Vec<u8> {
        let mut sink = ByteSink::new(Vec::new());
        let mut writer = BitWriterMsb::new(&mut sink);
        f(&mut writer);
        writer.finish().unwrap();
        sink.into_inner().unwrap()
    }

    #[test]
    fn test_sink_buffers_until_flush() {
        let mut sink = ByteSink::with_capacity(Vec::new(), 4);
        sink.write_bytes(&[1, 2, 3]).unwrap();
        sink.write_byte(4).unwrap();
        assert_eq!(sink.bytes_written(), 4);
        sink.write_byte(5).unwrap();
        assert_eq!(sink.into_inner().unwrap(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_sink_large_write_bypasses_buffer() {
        let mut sink = ByteSink::with_capacity(Vec::new(), 4);
        sink.write_byte(9).unwrap();
        sink.write_bytes(&[1, 2, 3, 4, 5, 6]).unwrap();
        sink.write_bytes(&[7]).unwrap();
        assert_eq!(sink.into_inner().unwrap(), vec![9, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_sink_endian_helpers() {
        let mut sink = ByteSink::new(Vec::new());
        sink.write_u16_be(0x0102).unwrap();
        sink.write_u32_be(0x03040506).unwrap();
        sink.write_u16_le(0x0102).unwrap();
        sink.write_u32_le(0x03040506).unwrap();
        assert_eq!(
            sink.into_inner().unwrap(),
            vec![1, 2, 3, 4, 5, 6, 2, 1, 6, 5, 4, 3]
        );
    }

    #[test]
    fn test_bit_writer_msb() {
        let out = packed(|w| w.write_bits(0b1011_0100, 8).unwrap());
        assert_eq!(out, vec![0b1011_0100]);
    }

    #[test]
    fn test_bit_writer_msb_partial_pads_with_ones() {
        let out = packed(|w| w.write_bits(0b101, 3).unwrap());
        assert_eq!(out, vec![0b1011_1111]);
    }

    #[test]
    fn test_bit_writer_msb_cross_byte() {
        let out = packed(|w| {
            w.write_bits(0b1, 1).unwrap();
            w.write_bits(0xABCD, 16).unwrap();
        });
        // 1 1010101111001101 then seven 1-bits
        assert_eq!(out, vec![0b1101_0101, 0b1110_0110, 0b1111_1111, 0x00]);
    }

    #[test]
    fn test_bit_writer_msb_byte_stuffing_0xff() {
        let out = packed(|w| {
            w.write_bits(0xFF, 8).unwrap();
            w.write_bits(0x12, 8).unwrap();
        });
        assert_eq!(out, vec![0xFF, 0x00, 0x12]);
    }

    #[test]
    fn test_bit_writer_msb_flush_with_0xff_pad() {
        // 1111 padded with 1111 is 0xFF and must be stuffed.
        let out = packed(|w| w.write_bits(0xF, 4).unwrap());
        assert_eq!(out, vec![0xFF, 0x00]);
    }

    #[test]
    fn test_bit_writer_msb_aligned_finish_adds_nothing() {
        let out = packed(|w| w.write_bits(0x3C, 8).unwrap());
        assert_eq!(out, vec![0x3C]);
    }

    #[test]
    fn test_bit_writer_msb_masks_high_bits() {
        let out = packed(|w| w.write_bits(0xFFF0, 4).unwrap());
        // Only the low nibble (0000) is taken, then 1111 padding.
        assert_eq!(out, vec![0x0F]);
    }

    #[test]
    fn test_bit_writer_msb_zero_flush() {
        let mut sink = ByteSink::new(Vec::new());
        let mut writer = BitWriterMsb::new(&mut sink);
        writer.write_bits(0b11, 2).unwrap();
        assert_eq!(writer.pending_bits(), 2);
        writer.flush().unwrap();
        assert_eq!(writer.pending_bits(), 0);
        assert_eq!(sink.into_inner().unwrap(), vec![0b1100_0000]);
    }
}
