//! JPEG Huffman encoding.
//!
//! Baseline JPEG with the Annex K tables only: the four tables are format
//! constants, expanded once at compile time into per-symbol code lookups.

use std::io::{self, Write};

use crate::bits::BitWriterMsb;

/// Standard DC luminance Huffman table (number of codes per bit length).
const DC_LUM_BITS: [u8; 16] = [0, 1, 5, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0, 0, 0];

/// Standard DC luminance Huffman values.
const DC_LUM_VALS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Standard DC chrominance Huffman table.
const DC_CHROM_BITS: [u8; 16] = [0, 3, 1, 1, 1, 1, 1, 1, 1, 1, 1, 0, 0, 0, 0, 0];

/// Standard DC chrominance Huffman values.
const DC_CHROM_VALS: [u8; 12] = [0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11];

/// Standard AC luminance Huffman table.
const AC_LUM_BITS: [u8; 16] = [0, 2, 1, 3, 3, 2, 4, 3, 5, 5, 4, 4, 0, 0, 1, 125];

/// Standard AC luminance Huffman values.
const AC_LUM_VALS: [u8; 162] = [
    0x01, 0x02, 0x03, 0x00, 0x04, 0x11, 0x05, 0x12, 0x21, 0x31, 0x41, 0x06, 0x13, 0x51, 0x61, 0x07,
    0x22, 0x71, 0x14, 0x32, 0x81, 0x91, 0xa1, 0x08, 0x23, 0x42, 0xb1, 0xc1, 0x15, 0x52, 0xd1, 0xf0,
    0x24, 0x33, 0x62, 0x72, 0x82, 0x09, 0x0a, 0x16, 0x17, 0x18, 0x19, 0x1a, 0x25, 0x26, 0x27, 0x28,
    0x29, 0x2a, 0x34, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48, 0x49,
    0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68, 0x69,
    0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x83, 0x84, 0x85, 0x86, 0x87, 0x88, 0x89,
    0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5, 0xa6, 0xa7,
    0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3, 0xc4, 0xc5,
    0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda, 0xe1, 0xe2,
    0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf1, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// Standard AC chrominance Huffman table.
const AC_CHROM_BITS: [u8; 16] = [0, 2, 1, 2, 4, 4, 3, 4, 7, 5, 4, 4, 0, 1, 2, 119];

/// Standard AC chrominance Huffman values.
const AC_CHROM_VALS: [u8; 162] = [
    0x00, 0x01, 0x02, 0x03, 0x11, 0x04, 0x05, 0x21, 0x31, 0x06, 0x12, 0x41, 0x51, 0x07, 0x61, 0x71,
    0x13, 0x22, 0x32, 0x81, 0x08, 0x14, 0x42, 0x91, 0xa1, 0xb1, 0xc1, 0x09, 0x23, 0x33, 0x52, 0xf0,
    0x15, 0x62, 0x72, 0xd1, 0x0a, 0x16, 0x24, 0x34, 0xe1, 0x25, 0xf1, 0x17, 0x18, 0x19, 0x1a, 0x26,
    0x27, 0x28, 0x29, 0x2a, 0x35, 0x36, 0x37, 0x38, 0x39, 0x3a, 0x43, 0x44, 0x45, 0x46, 0x47, 0x48,
    0x49, 0x4a, 0x53, 0x54, 0x55, 0x56, 0x57, 0x58, 0x59, 0x5a, 0x63, 0x64, 0x65, 0x66, 0x67, 0x68,
    0x69, 0x6a, 0x73, 0x74, 0x75, 0x76, 0x77, 0x78, 0x79, 0x7a, 0x82, 0x83, 0x84, 0x85, 0x86, 0x87,
    0x88, 0x89, 0x8a, 0x92, 0x93, 0x94, 0x95, 0x96, 0x97, 0x98, 0x99, 0x9a, 0xa2, 0xa3, 0xa4, 0xa5,
    0xa6, 0xa7, 0xa8, 0xa9, 0xaa, 0xb2, 0xb3, 0xb4, 0xb5, 0xb6, 0xb7, 0xb8, 0xb9, 0xba, 0xc2, 0xc3,
    0xc4, 0xc5, 0xc6, 0xc7, 0xc8, 0xc9, 0xca, 0xd2, 0xd3, 0xd4, 0xd5, 0xd6, 0xd7, 0xd8, 0xd9, 0xda,
    0xe2, 0xe3, 0xe4, 0xe5, 0xe6, 0xe7, 0xe8, 0xe9, 0xea, 0xf2, 0xf3, 0xf4, 0xf5, 0xf6, 0xf7, 0xf8,
    0xf9, 0xfa,
];

/// Huffman code: (code, length in bits).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HuffCode {
    /// Code bits, right-aligned.
    pub code: u16,
    /// Code length in bits; zero for symbols the table does not define.
    pub length: u8,
}

/// One Huffman table in DHT form plus its symbol lookup.
#[derive(Debug)]
pub struct HuffmanTable {
    /// Number of codes of each length 1..=16.
    pub bits: [u8; 16],
    /// Symbols in code order.
    pub vals: &'static [u8],
    codes: [HuffCode; 256],
}

impl HuffmanTable {
    const fn new(bits: [u8; 16], vals: &'static [u8]) -> Self {
        Self {
            bits,
            vals,
            codes: build_code_table(&bits, vals),
        }
    }

    /// Code for `symbol`.
    #[inline]
    pub fn code(&self, symbol: u8) -> HuffCode {
        self.codes[symbol as usize]
    }
}

/// Luminance DC table (class 0, id 0).
pub static DC_LUMINANCE: HuffmanTable = HuffmanTable::new(DC_LUM_BITS, &DC_LUM_VALS);
/// Luminance AC table (class 1, id 0).
pub static AC_LUMINANCE: HuffmanTable = HuffmanTable::new(AC_LUM_BITS, &AC_LUM_VALS);
/// Chrominance DC table (class 0, id 1).
pub static DC_CHROMINANCE: HuffmanTable = HuffmanTable::new(DC_CHROM_BITS, &DC_CHROM_VALS);
/// Chrominance AC table (class 1, id 1).
pub static AC_CHROMINANCE: HuffmanTable = HuffmanTable::new(AC_CHROM_BITS, &AC_CHROM_VALS);

/// Canonical code assignment from JPEG bits/vals.
const fn build_code_table(bits: &[u8; 16], vals: &[u8]) -> [HuffCode; 256] {
    let mut codes = [HuffCode { code: 0, length: 0 }; 256];
    let mut code: u16 = 0;
    let mut k = 0;
    let mut length = 0;
    while length < 16 {
        let mut count = 0;
        while count < bits[length] {
            codes[vals[k] as usize] = HuffCode {
                code,
                length: (length + 1) as u8,
            };
            k += 1;
            code += 1;
            count += 1;
        }
        code <<= 1;
        length += 1;
    }
    codes
}

/// Get the category (number of bits needed) for a value.
#[inline]
pub fn category(value: i32) -> u8 {
    (32 - value.unsigned_abs().leading_zeros()) as u8
}

/// Magnitude bits for a coefficient; negative values are stored as `value - 1`.
#[inline]
pub fn encode_value(value: i32) -> (u16, u8) {
    let cat = category(value);
    if cat == 0 {
        return (0, 0);
    }
    let bits = if value < 0 { value - 1 } else { value };
    ((bits & ((1 << cat) - 1)) as u16, cat)
}

#[inline]
fn put<W: Write>(writer: &mut BitWriterMsb<'_, W>, code: HuffCode) -> io::Result<()> {
    writer.write_bits(code.code, code.length)
}

/// Entropy-code one quantized block given in zigzag order.
///
/// Returns the block's DC value, the predictor for the next block of the
/// same component.
pub fn encode_block<W: Write>(
    writer: &mut BitWriterMsb<'_, W>,
    block: &[i32; 64],
    prev_dc: i32,
    dc_table: &HuffmanTable,
    ac_table: &HuffmanTable,
) -> io::Result<i32> {
    // DC: category code then magnitude bits
    let diff = block[0] - prev_dc;
    let (val_bits, cat) = encode_value(diff);
    put(writer, dc_table.code(cat))?;
    if cat > 0 {
        writer.write_bits(val_bits, cat)?;
    }

    let eob = ac_table.code(0x00);
    let zrl = ac_table.code(0xF0);

    let Some(last) = block.iter().rposition(|&c| c != 0).filter(|&i| i > 0) else {
        put(writer, eob)?;
        return Ok(block[0]);
    };

    let mut i = 1;
    while i <= last {
        let start = i;
        while block[i] == 0 {
            i += 1;
        }
        let mut zeros = i - start;
        while zeros >= 16 {
            put(writer, zrl)?;
            zeros -= 16;
        }
        let (val_bits, cat) = encode_value(block[i]);
        put(writer, ac_table.code(((zeros as u8) << 4) | cat))?;
        writer.write_bits(val_bits, cat)?;
        i += 1;
    }

    if last != 63 {
        put(writer, eob)?;
    }
    Ok(block[0])
}
