//! # Metadata Module
//!
//! Resolves the creation date of a media file.
//!
//! ## Dispatch
//! Every supported extension maps to one [`MediaKind`]:
//!
//! | Kind             | Extensions                          | Source of the date            |
//! |------------------|-------------------------------------|-------------------------------|
//! | `ExifLike`       | jpg, jpeg, cr2, thm, heic, heif     | EXIF `DateTimeOriginal`       |
//! | `EmbeddedMarkup` | png                                 | XMP-like text chunks          |
//! | `VideoTrack`     | avi, mp4, mov, m4v                  | container/track timestamps    |
//! | `Sidecar`        | aae                                 | filesystem timestamp          |
//!
//! ## Fallback
//! [`resolve`] never falls back on its own (except for sidecars, which carry no
//! date at all). Callers pick a [`DateFallback`] policy and apply it when
//! [`DateError::Readout`] comes back.

mod photo;
mod markup;
mod video;

use crate::error::DateError;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Name of the directory used for files without a readable date
pub const DEFAULT_NO_DATE_BUCKET: &str = "undated";

/// Extensions (lower-case, no dot) this crate knows how to date
pub const SUPPORTED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "cr2", "thm", "png", "avi", "mp4", "mov", "m4v", "aae", "heic", "heif",
];

/// The parser family used to read a creation date
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    /// Photographs, camera thumbnails, raw-with-exif and HEIF containers
    ExifLike,
    /// PNG files carrying XMP or other text metadata
    EmbeddedMarkup,
    /// Video containers (ISO-BMFF or RIFF)
    VideoTrack,
    /// Edit-info companion files without their own capture date
    Sidecar,
}

impl MediaKind {
    /// Look up the parser for a lower-cased extension (without the dot)
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "cr2" | "thm" | "heic" | "heif" => Some(MediaKind::ExifLike),
            "png" => Some(MediaKind::EmbeddedMarkup),
            "avi" | "mp4" | "mov" | "m4v" => Some(MediaKind::VideoTrack),
            "aae" => Some(MediaKind::Sidecar),
            _ => None,
        }
    }

    /// Look up the parser for a path, based on its extension
    pub fn for_path(path: &Path) -> Option<Self> {
        extension_of(path).and_then(|ext| Self::from_extension(&ext))
    }

    /// Read the creation date with this parser
    pub fn resolve(&self, path: &Path) -> Result<NaiveDateTime, DateError> {
        match self {
            MediaKind::ExifLike => photo::read_date_time_original(path),
            MediaKind::EmbeddedMarkup => markup::read_date_created(path),
            MediaKind::VideoTrack => video::read_creation_date(path),
            MediaKind::Sidecar => {
                file_timestamp(path).map_err(|e| DateError::readout(path, e))
            }
        }
    }
}

/// What to do when a file carries no readable date
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateFallback {
    /// Use the filesystem birth time (or modification time)
    FileTimestamp,
    /// File it under a fixed directory name instead of a date-derived one
    Bucket(String),
}

impl Default for DateFallback {
    fn default() -> Self {
        DateFallback::Bucket(DEFAULT_NO_DATE_BUCKET.to_string())
    }
}

/// Lower-cased extension of a path, without the dot
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Check whether the extension of `path` is in the allow-list
pub fn is_supported(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| SUPPORTED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// Resolve the creation date of a media file from its embedded metadata
///
/// # Errors
/// - [`DateError::UnsupportedExtension`] if no parser is registered
/// - [`DateError::Readout`] if the metadata is absent or malformed
pub fn resolve(path: &Path) -> Result<NaiveDateTime, DateError> {
    match MediaKind::for_path(path) {
        Some(kind) => kind.resolve(path),
        None => Err(DateError::UnsupportedExtension {
            path: path.to_path_buf(),
            extension: extension_of(path).unwrap_or_default(),
        }),
    }
}

/// Best filesystem timestamp for a file, in local time
///
/// Uses the platform birth time when available, else the last modification time.
pub fn file_timestamp(path: &Path) -> std::io::Result<NaiveDateTime> {
    let metadata = fs::metadata(path)?;
    let time = match metadata.created() {
        Ok(created) => created,
        Err(_) => metadata.modified()?,
    };
    Ok(DateTime::<Local>::from(time).naive_local())
}

#[cfg(test)]
pub(crate) mod fixtures {
    //! Minimal media files with known embedded dates.

    /// TIFF structure with a single Exif IFD carrying `DateTimeOriginal`
    pub fn tiff_with_date(date: &str) -> Vec<u8> {
        assert_eq!(date.len(), 19);
        let mut tiff = Vec::new();
        tiff.extend_from_slice(b"II\x2a\x00");
        tiff.extend_from_slice(&8u32.to_le_bytes());
        // IFD0: one entry pointing at the Exif IFD
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x8769u16.to_le_bytes());
        tiff.extend_from_slice(&4u16.to_le_bytes());
        tiff.extend_from_slice(&1u32.to_le_bytes());
        tiff.extend_from_slice(&26u32.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());
        // Exif IFD: DateTimeOriginal
        tiff.extend_from_slice(&1u16.to_le_bytes());
        tiff.extend_from_slice(&0x9003u16.to_le_bytes());
        tiff.extend_from_slice(&2u16.to_le_bytes());
        tiff.extend_from_slice(&20u32.to_le_bytes());
        tiff.extend_from_slice(&44u32.to_le_bytes());
        tiff.extend_from_slice(&0u32.to_le_bytes());
        tiff.extend_from_slice(date.as_bytes());
        tiff.push(0);
        tiff
    }

    /// JPEG with an APP1 Exif segment
    pub fn jpeg_with_date(date: &str) -> Vec<u8> {
        let tiff = tiff_with_date(date);
        let mut jpeg = vec![0xFF, 0xD8, 0xFF, 0xE1];
        let length = (tiff.len() + 6 + 2) as u16;
        jpeg.extend_from_slice(&length.to_be_bytes());
        jpeg.extend_from_slice(b"Exif\0\0");
        jpeg.extend_from_slice(&tiff);
        jpeg.extend_from_slice(&[0xFF, 0xD9]);
        jpeg
    }

    /// JPEG without any metadata segment
    pub fn bare_jpeg() -> Vec<u8> {
        vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x04, 0x00, 0x00, 0xFF, 0xD9]
    }

    fn png_chunk(out: &mut Vec<u8>, kind: &[u8; 4], data: &[u8]) {
        out.extend_from_slice(&(data.len() as u32).to_be_bytes());
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        out.extend_from_slice(&[0, 0, 0, 0]);
    }

    /// PNG with an uncompressed iTXt XMP packet
    pub fn png_with_xmp(date: &str) -> Vec<u8> {
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png_chunk(&mut png, b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0]);
        let mut itxt = b"XML:com.adobe.xmp\0\0\0\0\0".to_vec();
        itxt.extend_from_slice(
            format!(
                "<x:xmpmeta><rdf:Description photoshop:DateCreated=\"{}\"/></x:xmpmeta>",
                date
            )
            .as_bytes(),
        );
        png_chunk(&mut png, b"iTXt", &itxt);
        png_chunk(&mut png, b"IEND", &[]);
        png
    }

    /// PNG whose first date sits in a deflated iTXt XMP packet and whose
    /// second sits in a zTXt chunk
    pub fn png_with_compressed_text(date: &str) -> Vec<u8> {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let deflate = |text: &str| {
            let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(text.as_bytes()).unwrap();
            encoder.finish().unwrap()
        };

        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png_chunk(&mut png, b"IHDR", &[0, 0, 0, 1, 0, 0, 0, 1, 8, 2, 0, 0, 0]);
        let mut itxt = b"XML:com.adobe.xmp\0\x01\0\0\0".to_vec();
        itxt.extend_from_slice(&deflate(&format!(
            "<x:xmpmeta><rdf:Description xmp:CreateDate=\"{}\"/></x:xmpmeta>",
            date
        )));
        png_chunk(&mut png, b"iTXt", &itxt);
        let mut ztxt = b"Creation Time\0\0".to_vec();
        ztxt.extend_from_slice(&deflate("2020-02-03T04:05:06"));
        png_chunk(&mut png, b"zTXt", &ztxt);
        png_chunk(&mut png, b"IEND", &[]);
        png
    }

    fn mp4_box(kind: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let mut out = ((payload.len() + 8) as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(payload);
        out
    }

    fn full_box_times(creation: u32) -> Vec<u8> {
        let mut payload = vec![0u8; 4];
        payload.extend_from_slice(&creation.to_be_bytes());
        payload.extend_from_slice(&creation.to_be_bytes());
        payload.extend_from_slice(&[0u8; 80]);
        payload
    }

    /// ISO-BMFF file whose movie header and track header carry the given
    /// creation times (seconds since 1904-01-01)
    pub fn mp4_with_times(movie: u32, track: u32) -> Vec<u8> {
        let mut file = mp4_box(b"ftyp", b"isom\0\0\0\0isommp41");
        let mvhd = mp4_box(b"mvhd", &full_box_times(movie));
        let tkhd = mp4_box(b"tkhd", &full_box_times(track));
        let trak = mp4_box(b"trak", &tkhd);
        let mut moov_payload = mvhd;
        moov_payload.extend_from_slice(&trak);
        file.extend_from_slice(&mp4_box(b"mdat", &[0u8; 32]));
        file.extend_from_slice(&mp4_box(b"moov", &moov_payload));
        file
    }

    /// RIFF AVI with an `IDIT` chunk inside the `hdrl` list
    pub fn avi_with_idit(text: &str) -> Vec<u8> {
        let mut idit = b"IDIT".to_vec();
        let mut body = text.as_bytes().to_vec();
        body.push(0);
        idit.extend_from_slice(&(body.len() as u32).to_le_bytes());
        idit.extend_from_slice(&body);
        if body.len() % 2 == 1 {
            idit.push(0);
        }
        let mut hdrl = b"LIST".to_vec();
        hdrl.extend_from_slice(&((idit.len() + 4) as u32).to_le_bytes());
        hdrl.extend_from_slice(b"hdrl");
        hdrl.extend_from_slice(&idit);
        let mut riff = b"RIFF".to_vec();
        riff.extend_from_slice(&((hdrl.len() + 4) as u32).to_le_bytes());
        riff.extend_from_slice(b"AVI ");
        riff.extend_from_slice(&hdrl);
        riff
    }
}
