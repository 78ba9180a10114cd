//! Forward DCT for JPEG.
//!
//! Floating-point AAN (Arai, Agui, Nakajima) factorization: the separable
//! 8-point butterfly is run over rows, then columns. Output is scaled by
//! the AAN factors, which the quantizer's per-coefficient divisors fold
//! back out (see [`super::quantize::QuantizationTables`]).

const C4: f32 = 0.707106781; // cos(4*pi/16)
const C6: f32 = 0.382683433; // c6
const C2_MINUS_C6: f32 = 0.541196100;
const C2_PLUS_C6: f32 = 1.306562965;

/// One 8-point butterfly over `block[start + k * step]` for `k` in `0..8`.
#[inline]
fn dct_1d(block: &mut [f32; 64], start: usize, step: usize) {
    let at = |k: usize| start + k * step;
    let d0 = block[at(0)];
    let d1 = block[at(1)];
    let d2 = block[at(2)];
    let d3 = block[at(3)];
    let d4 = block[at(4)];
    let d5 = block[at(5)];
    let d6 = block[at(6)];
    let d7 = block[at(7)];

    let tmp0 = d0 + d7;
    let tmp7 = d0 - d7;
    let tmp1 = d1 + d6;
    let tmp6 = d1 - d6;
    let tmp2 = d2 + d5;
    let tmp5 = d2 - d5;
    let tmp3 = d3 + d4;
    let tmp4 = d3 - d4;

    // Even part
    let tmp10 = tmp0 + tmp3;
    let tmp13 = tmp0 - tmp3;
    let tmp11 = tmp1 + tmp2;
    let tmp12 = tmp1 - tmp2;

    let out0 = tmp10 + tmp11;
    let out4 = tmp10 - tmp11;

    let z1 = (tmp12 + tmp13) * C4;
    let out2 = tmp13 + z1;
    let out6 = tmp13 - z1;

    // Odd part
    let tmp10 = tmp4 + tmp5;
    let tmp11 = tmp5 + tmp6;
    let tmp12 = tmp6 + tmp7;

    let z5 = (tmp10 - tmp12) * C6;
    let z2 = tmp10 * C2_MINUS_C6 + z5;
    let z4 = tmp12 * C2_PLUS_C6 + z5;
    let z3 = tmp11 * C4;

    let z11 = tmp7 + z3;
    let z13 = tmp7 - z3;

    block[at(0)] = out0;
    block[at(1)] = z11 + z4;
    block[at(2)] = out2;
    block[at(3)] = z13 - z2;
    block[at(4)] = out4;
    block[at(5)] = z13 + z2;
    block[at(6)] = out6;
    block[at(7)] = z11 - z4;
}

/// In-place 2D forward DCT of a row-major 8x8 block.
pub fn forward_dct(block: &mut [f32; 64]) {
    for row in 0..8 {
        dct_1d(block, row * 8, 1);
    }
    for col in 0..8 {
        dct_1d(block, col, 8);
    }
}
