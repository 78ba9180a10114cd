//! CRC-32 checksum (CRC-32/ISO-HDLC), as used by PNG chunk footers.

/// Byte-at-a-time table for the reflected polynomial 0xEDB88320.
static CRC_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut crc = i as u32;
        let mut k = 0;
        while k < 8 {
            crc = if (crc & 1) != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
            k += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
}

/// Calculate the CRC-32 of `data` in one call.
#[inline]
#[must_use]
pub fn crc32(data: &[u8]) -> u32 {
    let mut crc = Crc32::new();
    crc.update(data);
    crc.finalize()
}

/// Running CRC-32 accumulator.
///
/// PNG chunk CRCs cover the type tag and the body, which are written in
/// separate steps, so the accumulator can be fed any number of times.
#[derive(Debug, Clone, Copy)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new accumulator (all ones).
    pub fn new() -> Self {
        Self { crc: 0xFFFF_FFFF }
    }

    /// Extend the running value with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        let mut crc = self.crc;
        for &byte in data {
            let index = ((crc ^ byte as u32) & 0xFF) as usize;
            crc = (crc >> 8) ^ CRC_TABLE[index];
        }
        self.crc = crc;
    }

    /// One's complement of the accumulator; the value stored on the wire.
    #[inline]
    #[must_use]
    pub fn finalize(self) -> u32 {
        self.crc ^ 0xFFFF_FFFF
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_empty() {
        assert_eq!(crc32(&[]), 0x00000000);
    }

    #[test]
    fn test_crc32_check_value() {
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
    }

    #[test]
    fn test_crc32_table_spot_values() {
        assert_eq!(CRC_TABLE[0], 0);
        assert_eq!(CRC_TABLE[1], 0x77073096);
        assert_eq!(CRC_TABLE[255], 0x2D02EF8D);
    }

    #[test]
    fn test_crc32_incremental() {
        let data = b"123456789";
        let full_crc = crc32(data);

        let mut crc = Crc32::new();
        crc.update(&data[..4]);
        crc.update(&[]);
        crc.update(&data[4..]);

        assert_eq!(full_crc, crc.finalize());
    }

    #[test]
    fn test_crc32_png_iend() {
        // Zero-length IEND: CRC covers the type tag only.
        assert_eq!(crc32(b"IEND"), 0xAE426082);
    }

    #[test]
    fn test_crc32_quick_brown_fox() {
        assert_eq!(
            crc32(b"The quick brown fox jumps over the lazy dog"),
            0x414FA339
        );
    }
}
