//! Fixture builders shared by the integration tests.

#![allow(dead_code)]

use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

/// JPEG with an APP1 Exif segment carrying `DateTimeOriginal`
pub fn jpeg_with_date(date: &str) -> Vec<u8> {
    assert_eq!(date.len(), 19, "EXIF dates look like 2003:12:14 12:01:44");
    let mut tiff = Vec::new();
    tiff.extend_from_slice(b"II\x2a\x00");
    tiff.extend_from_slice(&8u32.to_le_bytes());
    // IFD0 -> Exif IFD at offset 26
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x8769u16.to_le_bytes());
    tiff.extend_from_slice(&4u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&26u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    // Exif IFD with DateTimeOriginal stored at offset 44
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x9003u16.to_le_bytes());
    tiff.extend_from_slice(&2u16.to_le_bytes());
    tiff.extend_from_slice(&20u32.to_le_bytes());
    tiff.extend_from_slice(&44u32.to_le_bytes());
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff.extend_from_slice(date.as_bytes());
    tiff.push(0);

    let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
    jpeg.extend_from_slice(&((tiff.len() + 8) as u16).to_be_bytes());
    jpeg.extend_from_slice(b"Exif\0\0");
    jpeg.extend_from_slice(&tiff);
    jpeg.extend_from_slice(&[0xFF, 0xD9]);
    jpeg
}

/// JPEG without any metadata
pub fn bare_jpeg() -> Vec<u8> {
    vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, 0xFF, 0xD9]
}

fn mp4_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
    out.extend_from_slice(kind);
    out.extend_from_slice(payload);
    out
}

fn header_payload(seconds: u32) -> Vec<u8> {
    let mut payload = vec![0u8; 4];
    payload.extend_from_slice(&seconds.to_be_bytes());
    payload.extend_from_slice(&seconds.to_be_bytes());
    payload.extend_from_slice(&[0u8; 80]);
    payload
}

/// MP4 whose movie and track headers were both created at `date` (UTC)
pub fn mp4_created_at(date: NaiveDateTime) -> Vec<u8> {
    let seconds = (date.and_utc().timestamp() + 2_082_844_800) as u32;
    let trak = mp4_box(b"trak", &mp4_box(b"tkhd", &header_payload(seconds)));
    let mut moov = mp4_box(b"mvhd", &header_payload(seconds));
    moov.extend_from_slice(&trak);

    let mut file = mp4_box(b"ftyp", b"isom\0\0\0\0isommp41");
    file.extend_from_slice(&mp4_box(b"moov", &moov));
    file.extend_from_slice(&mp4_box(b"mdat", &[0u8; 64]));
    file
}

/// Write `content` at `dir/name`, creating parent folders
pub fn write(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(&path, content).unwrap();
    path
}
