//! Shared fixtures: hand-built TIFF and JPEG payloads carrying a minimal EXIF IFD0.

#![allow(dead_code)]

/// Little-endian TIFF whose IFD0 holds a single ASCII `Make` entry.
///
/// Layout: 8-byte header, IFD at 8 (1 entry, 18 bytes), string data at 26.
pub fn tiff_with_make(make: &str) -> Vec<u8> {
    let mut value = make.as_bytes().to_vec();
    value.push(0);
    let count = value.len() as u32;

    let mut buf = Vec::new();
    buf.extend_from_slice(b"II");
    buf.extend_from_slice(&42u16.to_le_bytes());
    buf.extend_from_slice(&8u32.to_le_bytes());

    buf.extend_from_slice(&1u16.to_le_bytes());
    buf.extend_from_slice(&0x010Fu16.to_le_bytes()); // Make
    buf.extend_from_slice(&2u16.to_le_bytes()); // ASCII
    buf.extend_from_slice(&count.to_le_bytes());
    if value.len() <= 4 {
        let mut inline = [0u8; 4];
        inline[..value.len()].copy_from_slice(&value);
        buf.extend_from_slice(&inline);
        buf.extend_from_slice(&0u32.to_le_bytes());
    } else {
        buf.extend_from_slice(&26u32.to_le_bytes());
        buf.extend_from_slice(&0u32.to_le_bytes());
        buf.extend_from_slice(&value);
    }
    buf
}

/// The same TIFF inside a JPEG APP1 `Exif` segment.
pub fn jpeg_with_make(make: &str) -> Vec<u8> {
    let tiff = tiff_with_make(make);
    let segment_len = (2 + 6 + tiff.len()) as u16;

    let mut buf = vec![0xFF, 0xD8, 0xFF, 0xE1];
    buf.extend_from_slice(&segment_len.to_be_bytes());
    buf.extend_from_slice(b"Exif\0\0");
    buf.extend_from_slice(&tiff);
    buf.extend_from_slice(&[0xFF, 0xD9]);
    buf
}
