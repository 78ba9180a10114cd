//! PNG filtering implementation.
//!
//! PNG uses filtering to improve compression by exploiting correlations
//! between adjacent pixels. Each scanline gets its own filter, chosen
//! independently and recorded in the row's tag byte.

use std::mem;

use crate::context::EncodeContext;
use crate::error::{Error, Result};

/// Filter type bytes as defined by the PNG specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum FilterType {
    /// Raw bytes.
    None = 0,
    /// Difference from the sample one pixel to the left.
    Sub = 1,
    /// Difference from the sample directly above.
    Up = 2,
    /// Difference from the floor-average of left and above.
    Average = 3,
    /// Difference from the Paeth predictor of left, above and upper-left.
    Paeth = 4,
}

impl FilterType {
    /// All filters in tag order; adaptive selection tries them in this order.
    pub const ALL: [FilterType; 5] = [
        FilterType::None,
        FilterType::Sub,
        FilterType::Up,
        FilterType::Average,
        FilterType::Paeth,
    ];

    /// The tag byte written before each filtered row.
    #[inline]
    pub const fn tag(self) -> u8 {
        self as u8
    }
}

impl TryFrom<u8> for FilterType {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(FilterType::None),
            1 => Ok(FilterType::Sub),
            2 => Ok(FilterType::Up),
            3 => Ok(FilterType::Average),
            4 => Ok(FilterType::Paeth),
            other => Err(Error::InvalidFilter(other)),
        }
    }
}

/// Filter `row` into `out` (same length) using `filter`.
///
/// On the first row the row above is all zeros, so the work reduces:
/// Up becomes None, Paeth becomes Sub, and Average only halves the left
/// neighbor. The tag byte is still the requested filter; a decoder
/// reconstructs the same bytes either way.
pub fn filter_row(
    filter: FilterType,
    first_row: bool,
    row: &[u8],
    prev_row: &[u8],
    bpp: usize,
    out: &mut [u8],
) {
    debug_assert_eq!(row.len(), out.len());
    match (filter, first_row) {
        (FilterType::None, _) | (FilterType::Up, true) => out.copy_from_slice(row),
        (FilterType::Sub, _) | (FilterType::Paeth, true) => filter_sub(row, bpp, out),
        (FilterType::Up, false) => filter_up(row, prev_row, out),
        (FilterType::Average, true) => filter_average_first_row(row, bpp, out),
        (FilterType::Average, false) => filter_average(row, prev_row, bpp, out),
        (FilterType::Paeth, false) => filter_paeth(row, prev_row, bpp, out),
    }
}

/// Sub filter: difference from left pixel.
fn filter_sub(row: &[u8], bpp: usize, out: &mut [u8]) {
    let lead = bpp.min(row.len());
    out[..lead].copy_from_slice(&row[..lead]);
    for i in lead..row.len() {
        out[i] = row[i].wrapping_sub(row[i - bpp]);
    }
}

/// Up filter: difference from above pixel.
fn filter_up(row: &[u8], prev_row: &[u8], out: &mut [u8]) {
    for ((o, &byte), &above) in out.iter_mut().zip(row).zip(prev_row) {
        *o = byte.wrapping_sub(above);
    }
}

/// Average filter: difference from average of left and above.
fn filter_average(row: &[u8], prev_row: &[u8], bpp: usize, out: &mut [u8]) {
    for (i, &byte) in row.iter().enumerate() {
        let left = if i >= bpp { row[i - bpp] as u16 } else { 0 };
        let above = prev_row[i] as u16;
        out[i] = byte.wrapping_sub(((left + above) / 2) as u8);
    }
}

/// Average against an all-zero row above.
fn filter_average_first_row(row: &[u8], bpp: usize, out: &mut [u8]) {
    let lead = bpp.min(row.len());
    out[..lead].copy_from_slice(&row[..lead]);
    for i in lead..row.len() {
        out[i] = row[i].wrapping_sub(row[i - bpp] / 2);
    }
}

/// Paeth filter: difference from Paeth predictor.
fn filter_paeth(row: &[u8], prev_row: &[u8], bpp: usize, out: &mut [u8]) {
    for (i, &byte) in row.iter().enumerate() {
        let (left, upper_left) = if i >= bpp {
            (row[i - bpp], prev_row[i - bpp])
        } else {
            (0, 0)
        };
        out[i] = byte.wrapping_sub(paeth_predictor(left, prev_row[i], upper_left));
    }
}

/// Paeth predictor function.
///
/// Selects the value (a, b, or c) closest to p = a + b - c; ties prefer
/// a, then b.
#[inline]
pub(crate) fn paeth_predictor(a: u8, b: u8, c: u8) -> u8 {
    let a_i = a as i16;
    let b_i = b as i16;
    let c_i = c as i16;

    let p = a_i + b_i - c_i;
    let pa = (p - a_i).abs();
    let pb = (p - b_i).abs();
    let pc = (p - c_i).abs();

    if pa <= pb && pa <= pc {
        a
    } else if pb <= pc {
        b
    } else {
        c
    }
}

/// Score a filtered row as the sum of absolute signed deltas.
///
/// Bytes are read as `i8`, so 0xFF (-1) scores 1, not 255. Lower is better.
#[inline]
pub fn score_filter(filtered: &[u8]) -> u64 {
    filtered
        .iter()
        .map(|&b| (b as i8).unsigned_abs() as u64)
        .sum()
}

/// Try all five filters and leave the cheapest result in `best`.
///
/// `best` and `trial` are `row.len() + 1` bytes: a tag byte followed by the
/// filtered samples. On return `best[0]` holds the winning tag. Ties go to
/// the lower tag. The stop signal is polled after every trial.
pub fn adaptive_filter(
    row: &[u8],
    prev_row: &[u8],
    bpp: usize,
    first_row: bool,
    best: &mut Vec<u8>,
    trial: &mut Vec<u8>,
    ctx: &EncodeContext<'_>,
) -> Result<FilterType> {
    let mut best_filter = FilterType::None;
    let mut best_score = u64::MAX;

    for filter in FilterType::ALL {
        filter_row(filter, first_row, row, prev_row, bpp, &mut trial[1..]);
        let score = score_filter(&trial[1..]);
        if score < best_score {
            best_score = score;
            best_filter = filter;
            mem::swap(best, trial);
        }
        ctx.check()?;
    }

    best[0] = best_filter.tag();
    Ok(best_filter)
}
