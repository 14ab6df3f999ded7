//! EXIF `DateTimeOriginal` reader for JPEG, TIFF-based raw and HEIF containers.

use crate::error::DateError;
use chrono::{NaiveDate, NaiveDateTime};
use exif::{In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Read the original capture time from the primary image's EXIF block
pub(super) fn read_date_time_original(path: &Path) -> Result<NaiveDateTime, DateError> {
    let file = File::open(path).map_err(|e| DateError::readout(path, e))?;
    let mut bufreader = BufReader::new(file);
    let exif = Reader::new()
        .read_from_container(&mut bufreader)
        .map_err(|e| DateError::readout(path, e))?;

    let field = exif
        .get_field(Tag::DateTimeOriginal, In::PRIMARY)
        .ok_or_else(|| DateError::readout(path, "no DateTimeOriginal tag"))?;

    let bytes = match field.value {
        Value::Ascii(ref vec) if !vec.is_empty() => &vec[0],
        _ => return Err(DateError::readout(path, "DateTimeOriginal is not text")),
    };

    // EXIF date format: "YYYY:MM:DD HH:MM:SS"
    let stamp = exif::DateTime::from_ascii(bytes).map_err(|e| DateError::readout(path, e))?;
    NaiveDate::from_ymd_opt(stamp.year as i32, stamp.month as u32, stamp.day as u32)
        .and_then(|d| d.and_hms_opt(stamp.hour as u32, stamp.minute as u32, stamp.second as u32))
        .ok_or_else(|| {
            DateError::readout(path, format!("DateTimeOriginal out of range: {}", stamp))
        })
}
