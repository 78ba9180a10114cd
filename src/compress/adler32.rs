//! Adler-32 checksum (RFC 1950) used for the zlib trailer.

const MOD_ADLER: u32 = 65_521;
// Largest n such that 255*n*(n+1)/2 + (n+1)*(65520) <= 2^32-1
const NMAX: usize = 5552;

/// Calculate the Adler-32 of `data` in one call.
#[inline]
#[must_use]
pub fn adler32(data: &[u8]) -> u32 {
    let mut adler = Adler32::new();
    adler.update(data);
    adler.finalize()
}

/// Running Adler-32 state.
#[derive(Debug, Clone, Copy)]
pub struct Adler32 {
    s1: u32,
    s2: u32,
}

impl Adler32 {
    /// Create a fresh state (`s1 = 1`, `s2 = 0`).
    pub fn new() -> Self {
        Self { s1: 1, s2: 0 }
    }

    /// Feed more bytes. Modulo reduction is deferred to `NMAX`-sized chunk boundaries.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        let mut s1 = self.s1;
        let mut s2 = self.s2;

        for chunk in data.chunks(NMAX) {
            for &b in chunk {
                s1 += b as u32;
                s2 += s1;
            }
            s1 %= MOD_ADLER;
            s2 %= MOD_ADLER;
        }

        self.s1 = s1;
        self.s2 = s2;
    }

    /// Combined `(s2 << 16) | s1` value.
    #[inline]
    #[must_use]
    pub fn finalize(self) -> u32 {
        (self.s2 << 16) | self.s1
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}
