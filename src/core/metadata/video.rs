//! Creation dates for video containers.
//!
//! Candidates:
//! - **encoded date**: ISO-BMFF `mvhd` creation time, or the RIFF `IDIT` chunk
//! - **tagged date**: the earliest ISO-BMFF `tkhd`/`mdhd` creation time
//! - **modification time** of the file itself (UTC, plus a local variant)
//!
//! The earliest candidate wins. When the winner is the modification time the
//! local variant is returned instead of the UTC one.

use crate::error::DateError;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use std::fs::{self, File};
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Seconds between 1904-01-01 (QuickTime epoch) and 1970-01-01
const QUICKTIME_EPOCH_OFFSET: i64 = 2_082_844_800;

/// Guard against runaway recursion on corrupted files
const MAX_DEPTH: usize = 8;

/// Every date a video file offers, before selection
#[derive(Debug, Default, Clone, PartialEq)]
struct VideoDates {
    encoded: Option<NaiveDateTime>,
    tagged: Option<NaiveDateTime>,
    modified_utc: Option<NaiveDateTime>,
    modified_local: Option<NaiveDateTime>,
}

impl VideoDates {
    fn tag(&mut self, date: NaiveDateTime) {
        self.tagged = Some(self.tagged.map_or(date, |t| t.min(date)));
    }

    /// Earliest of modification, encoded and tagged dates
    fn select(&self) -> Option<NaiveDateTime> {
        let mut choice = self.modified_utc.map(|d| (d, true));

        for candidate in [self.encoded, self.tagged].into_iter().flatten() {
            match choice {
                Some((current, _)) if candidate >= current => {}
                _ => choice = Some((candidate, false)),
            }
        }

        match choice {
            Some((date, true)) => Some(self.modified_local.unwrap_or(date)),
            Some((date, false)) => Some(date),
            None => None,
        }
    }
}

/// Resolve the creation date of a video file
pub(super) fn read_creation_date(path: &Path) -> Result<NaiveDateTime, DateError> {
    let mut dates = VideoDates::default();

    if let Ok(modified) = fs::metadata(path).and_then(|m| m.modified()) {
        dates.modified_utc = Some(DateTime::<Utc>::from(modified).naive_utc());
        dates.modified_local = Some(DateTime::<Local>::from(modified).naive_local());
    }

    let file = File::open(path).map_err(|e| DateError::readout(path, e))?;
    let mut reader = BufReader::new(file);
    if let Err(e) = read_container_dates(&mut reader, &mut dates) {
        tracing::debug!("container metadata unreadable in {}: {}", path.display(), e);
    }

    dates
        .select()
        .ok_or_else(|| DateError::readout(path, "cannot find date in video metadata"))
}

fn read_container_dates<R: Read + Seek>(reader: &mut R, dates: &mut VideoDates) -> io::Result<()> {
    let end = reader.seek(SeekFrom::End(0))?;
    reader.seek(SeekFrom::Start(0))?;

    let mut magic = [0u8; 12];
    reader.read_exact(&mut magic)?;
    reader.seek(SeekFrom::Start(0))?;

    if &magic[0..4] == b"RIFF" && &magic[8..12] == b"AVI " {
        reader.seek(SeekFrom::Start(12))?;
        walk_riff(reader, 12, end, dates, 0)
    } else {
        walk_boxes(reader, 0, end, dates, 0)
    }
}

fn quicktime_time(seconds: u64) -> Option<NaiveDateTime> {
    if seconds == 0 {
        return None;
    }
    let unix = i64::try_from(seconds).ok()? - QUICKTIME_EPOCH_OFFSET;
    DateTime::from_timestamp(unix, 0).map(|d| d.naive_utc())
}

/// Creation time from a `mvhd`/`tkhd`/`mdhd` full box payload
fn read_header_creation<R: Read>(reader: &mut R) -> io::Result<Option<NaiveDateTime>> {
    let mut version = [0u8; 4];
    reader.read_exact(&mut version)?;
    let seconds = if version[0] == 1 {
        let mut buf = [0u8; 8];
        reader.read_exact(&mut buf)?;
        u64::from_be_bytes(buf)
    } else {
        let mut buf = [0u8; 4];
        reader.read_exact(&mut buf)?;
        u32::from_be_bytes(buf) as u64
    };
    Ok(quicktime_time(seconds))
}

/// Walk ISO-BMFF boxes between `start` and `end`
fn walk_boxes<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
    dates: &mut VideoDates,
    depth: usize,
) -> io::Result<()> {
    if depth > MAX_DEPTH {
        return Ok(());
    }

    let mut offset = start;
    while offset + 8 <= end {
        reader.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let mut size = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as u64;
        let kind = [header[4], header[5], header[6], header[7]];
        let mut payload_start = offset + 8;

        if size == 1 {
            let mut large = [0u8; 8];
            reader.read_exact(&mut large)?;
            size = u64::from_be_bytes(large);
            payload_start += 8;
        } else if size == 0 {
            size = end - offset;
        }

        let box_end = match offset.checked_add(size) {
            Some(box_end) if size >= payload_start - offset && box_end <= end => box_end,
            _ => {
                return Err(io::Error::new(
                    io::ErrorKind::InvalidData,
                    "malformed box size",
                ))
            }
        };

        match &kind {
            b"moov" | b"trak" | b"mdia" => {
                walk_boxes(reader, payload_start, box_end, dates, depth + 1)?;
            }
            b"mvhd" => {
                if let Some(date) = read_header_creation(reader)? {
                    dates.encoded = Some(dates.encoded.map_or(date, |e| e.min(date)));
                }
            }
            b"tkhd" | b"mdhd" => {
                if let Some(date) = read_header_creation(reader)? {
                    dates.tag(date);
                }
            }
            _ => {}
        }

        offset = box_end;
    }

    Ok(())
}

/// Walk RIFF chunks looking for the `IDIT` digitization date
fn walk_riff<R: Read + Seek>(
    reader: &mut R,
    start: u64,
    end: u64,
    dates: &mut VideoDates,
    depth: usize,
) -> io::Result<()> {
    if depth > MAX_DEPTH {
        return Ok(());
    }

    let mut offset = start;
    while offset + 8 <= end {
        reader.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; 8];
        reader.read_exact(&mut header)?;
        let id = [header[0], header[1], header[2], header[3]];
        let size = u32::from_le_bytes([header[4], header[5], header[6], header[7]]) as u64;
        let data_start = offset + 8;
        let data_end = (data_start + size).min(end);

        match &id {
            b"LIST" => {
                walk_riff(reader, data_start + 4, data_end, dates, depth + 1)?;
            }
            b"IDIT" => {
                let mut raw = vec![0u8; (data_end - data_start) as usize];
                reader.read_exact(&mut raw)?;
                let text = String::from_utf8_lossy(&raw);
                if let Some(date) = parse_idit(&text) {
                    dates.encoded = Some(dates.encoded.map_or(date, |e| e.min(date)));
                }
            }
            _ => {}
        }

        // chunks are padded to even sizes
        offset = data_start + size + (size % 2);
    }

    Ok(())
}

/// Parse the free-form `IDIT` text written by cameras
fn parse_idit(text: &str) -> Option<NaiveDateTime> {
    let cleaned = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    const FORMATS: &[&str] = &[
        "%a %b %d %H:%M:%S %Y",
        "%Y:%m:%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M:%S",
    ];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(cleaned, fmt).ok())
}
