//! Shared helpers for the integration tests.

#![allow(dead_code)]

pub mod synthetic;

use flate2::read::ZlibDecoder;
use std::io::Read;

use rowenc::compress::crc32;

/// One parsed PNG chunk.
pub struct Chunk<'a> {
    pub kind: [u8; 4],
    pub data: &'a [u8],
}

/// Walk the chunks of a PNG file, checking every CRC along the way.
pub fn png_chunks(png: &[u8]) -> Vec<Chunk<'_>> {
    assert_eq!(&png[..8], &rowenc::png::PNG_SIGNATURE, "bad signature");
    let mut chunks = Vec::new();
    let mut pos = 8;
    while pos < png.len() {
        let len = u32::from_be_bytes(png[pos..pos + 4].try_into().unwrap()) as usize;
        let kind: [u8; 4] = png[pos + 4..pos + 8].try_into().unwrap();
        let data = &png[pos + 8..pos + 8 + len];
        let stored = u32::from_be_bytes(png[pos + 8 + len..pos + 12 + len].try_into().unwrap());
        assert_eq!(
            crc32(&png[pos + 4..pos + 8 + len]),
            stored,
            "CRC mismatch in {}",
            String::from_utf8_lossy(&kind)
        );
        chunks.push(Chunk { kind, data });
        pos += 12 + len;
    }
    assert_eq!(pos, png.len(), "trailing bytes after last chunk");
    chunks
}

/// Concatenate and inflate the IDAT stream, returning the filtered scanlines.
pub fn png_scanlines(png: &[u8]) -> Vec<u8> {
    let idat: Vec<u8> = png_chunks(png)
        .iter()
        .filter(|c| &c.kind == b"IDAT")
        .flat_map(|c| c.data.iter().copied())
        .collect();
    let mut raw = Vec::new();
    ZlibDecoder::new(idat.as_slice())
        .read_to_end(&mut raw)
        .expect("inflate IDAT");
    raw
}
