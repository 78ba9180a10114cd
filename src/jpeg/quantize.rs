//! JPEG quantization tables and functions.

/// Standard JPEG luminance quantization table (natural order, Annex K).
const STD_LUMINANCE_TABLE: [u8; 64] = [
    16, 11, 10, 16, 24, 40, 51, 61, 12, 12, 14, 19, 26, 58, 60, 55, 14, 13, 16, 24, 40, 57, 69, 56,
    14, 17, 22, 29, 51, 87, 80, 62, 18, 22, 37, 56, 68, 109, 103, 77, 24, 35, 55, 64, 81, 104, 113,
    92, 49, 64, 78, 87, 103, 121, 120, 101, 72, 92, 95, 98, 112, 100, 103, 99,
];

/// Standard JPEG chrominance quantization table (natural order, Annex K).
const STD_CHROMINANCE_TABLE: [u8; 64] = [
    17, 18, 24, 47, 99, 99, 99, 99, 18, 21, 26, 66, 99, 99, 99, 99, 24, 26, 56, 99, 99, 99, 99, 99,
    47, 66, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
    99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99, 99,
];

/// Zigzag scan order: `ZIGZAG[k]` is the natural index of the `k`-th coefficient.
pub const ZIGZAG: [usize; 64] = [
    0, 1, 8, 16, 9, 2, 3, 10, 17, 24, 32, 25, 18, 11, 4, 5, 12, 19, 26, 33, 40, 48, 41, 34, 27, 20,
    13, 6, 7, 14, 21, 28, 35, 42, 49, 56, 57, 50, 43, 36, 29, 22, 15, 23, 30, 37, 44, 51, 58, 59,
    52, 45, 38, 31, 39, 46, 53, 60, 61, 54, 47, 55, 62, 63,
];

/// Per-frequency AAN gains, premultiplied by `sqrt(8)`.
const AAN_SCALE: [f32; 8] = [
    1.0 * 2.828427125,
    1.387039845 * 2.828427125,
    1.306562965 * 2.828427125,
    1.175875602 * 2.828427125,
    1.0 * 2.828427125,
    0.785694958 * 2.828427125,
    0.541196100 * 2.828427125,
    0.275899379 * 2.828427125,
];

/// Quantization tables for one image.
#[derive(Debug, Clone)]
pub struct QuantizationTables {
    /// Luminance table in zigzag order, as written to DQT.
    pub luminance: [u8; 64],
    /// Chrominance table in zigzag order, as written to DQT.
    pub chrominance: [u8; 64],
    /// Luminance multipliers in natural order, folding in the DCT gain.
    pub luminance_scale: [f32; 64],
    /// Chrominance multipliers in natural order, folding in the DCT gain.
    pub chrominance_scale: [f32; 64],
}

/// libjpeg's quality-to-percentage mapping.
fn quality_scale(quality: u8) -> u32 {
    let quality = quality.clamp(1, 100) as u32;
    if quality < 50 {
        5000 / quality
    } else {
        200 - 2 * quality
    }
}

fn scaled(base: u8, scale: u32) -> u8 {
    ((base as u32 * scale + 50) / 100).clamp(1, 255) as u8
}

fn multipliers(natural: &[u8; 64]) -> [f32; 64] {
    let mut out = [0.0f32; 64];
    for row in 0..8 {
        for col in 0..8 {
            let k = row * 8 + col;
            out[k] = 1.0 / (natural[k] as f32 * AAN_SCALE[row] * AAN_SCALE[col]);
        }
    }
    out
}

impl QuantizationTables {
    /// Build tables for `quality` (1-100, clamped).
    pub fn with_quality(quality: u8) -> Self {
        let scale = quality_scale(quality);

        let mut lum_natural = [0u8; 64];
        let mut chrom_natural = [0u8; 64];
        for k in 0..64 {
            lum_natural[k] = scaled(STD_LUMINANCE_TABLE[k], scale);
            chrom_natural[k] = scaled(STD_CHROMINANCE_TABLE[k], scale);
        }

        let mut luminance = [0u8; 64];
        let mut chrominance = [0u8; 64];
        for (z, &n) in ZIGZAG.iter().enumerate() {
            luminance[z] = lum_natural[n];
            chrominance[z] = chrom_natural[n];
        }

        Self {
            luminance,
            chrominance,
            luminance_scale: multipliers(&lum_natural),
            chrominance_scale: multipliers(&chrom_natural),
        }
    }
}

/// Quantize a transformed block and return it in zigzag order.
///
/// Rounds to nearest with ties away from zero.
pub fn quantize_block(coeffs: &[f32; 64], scale: &[f32; 64]) -> [i32; 64] {
    let mut out = [0i32; 64];
    for (z, &n) in ZIGZAG.iter().enumerate() {
        let v = coeffs[n] * scale[n];
        out[z] = if v < 0.0 { v - 0.5 } else { v + 0.5 } as i32;
    }
    out
}
