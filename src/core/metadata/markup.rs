//! Date scraping from text chunks embedded in PNG files.
//!
//! Screenshots from phones and desktops store an XMP packet (or plain text
//! keys) in `tEXt`, `zTXt` or `iTXt` chunks, the latter two possibly
//! deflated. The first ISO-like timestamp wins.

use crate::error::DateError;
use chrono::NaiveDateTime;
use flate2::read::ZlibDecoder;
use regex::Regex;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::OnceLock;

const PNG_SIGNATURE: &[u8; 8] = b"\x89PNG\r\n\x1a\n";

/// Refuse to buffer absurd chunk sizes from corrupted files
const MAX_TEXT_CHUNK: usize = 16 * 1024 * 1024;

fn date_created_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})").expect("static regex is valid")
    })
}

/// Scan the embedded text of a PNG for a `YYYY-MM-DDTHH:MM:SS` stamp
pub(super) fn read_date_created(path: &Path) -> Result<NaiveDateTime, DateError> {
    let file = File::open(path).map_err(|e| DateError::readout(path, e))?;
    let text = collect_text_chunks(BufReader::new(file)).map_err(|e| DateError::readout(path, e))?;

    let found = date_created_pattern()
        .captures(&text)
        .and_then(|c| c.get(1))
        .ok_or_else(|| DateError::readout(path, "no date found in embedded text"))?;

    NaiveDateTime::parse_from_str(found.as_str(), "%Y-%m-%dT%H:%M:%S")
        .map_err(|e| DateError::readout(path, e))
}

/// Concatenate every text chunk payload, lossily decoded
fn collect_text_chunks<R: Read>(mut reader: R) -> std::io::Result<String> {
    let mut signature = [0u8; 8];
    reader.read_exact(&mut signature)?;
    if &signature != PNG_SIGNATURE {
        return Err(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            "not a PNG file",
        ));
    }

    let mut text = String::new();
    loop {
        let mut header = [0u8; 8];
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            // Truncated files still give us whatever came before
            Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(e) => return Err(e),
        }
        let length = u32::from_be_bytes([header[0], header[1], header[2], header[3]]) as usize;
        let kind = [header[4], header[5], header[6], header[7]];

        if &kind == b"IEND" {
            break;
        }

        let is_text = matches!(&kind, b"tEXt" | b"zTXt" | b"iTXt");
        if is_text && length <= MAX_TEXT_CHUNK {
            let mut data = vec![0u8; length];
            reader.read_exact(&mut data)?;
            match chunk_text(&kind, &data) {
                Ok(payload) => {
                    text.push_str(&String::from_utf8_lossy(&payload));
                    text.push('\n');
                }
                Err(e) => tracing::debug!("skipping unreadable text chunk: {}", e),
            }
        } else {
            std::io::copy(&mut (&mut reader).take(length as u64), &mut std::io::sink())?;
        }

        // CRC
        std::io::copy(&mut (&mut reader).take(4), &mut std::io::sink())?;
    }

    Ok(text)
}

/// Payload of a text chunk, inflated when compressed
///
/// `zTXt` is `keyword\0 method data`, `iTXt` is
/// `keyword\0 flag method language\0 translated\0 data`.
fn chunk_text(kind: &[u8; 4], data: &[u8]) -> std::io::Result<Vec<u8>> {
    let after_keyword = |data: &[u8]| {
        data.iter()
            .position(|&b| b == 0)
            .map(|nul| nul + 1)
            .unwrap_or(data.len())
    };

    match kind {
        b"zTXt" => {
            let start = after_keyword(data) + 1;
            inflate(data.get(start..).unwrap_or_default())
        }
        b"iTXt" => {
            let mut start = after_keyword(data);
            let compressed = data.get(start).copied() == Some(1);
            start += 2;
            for _ in 0..2 {
                let rest = data.get(start..).unwrap_or_default();
                start += after_keyword(rest);
            }
            let payload = data.get(start..).unwrap_or_default();
            if compressed {
                inflate(payload)
            } else {
                Ok(payload.to_vec())
            }
        }
        _ => Ok(data.to_vec()),
    }
}

fn inflate(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibDecoder::new(data)
        .take(MAX_TEXT_CHUNK as u64)
        .read_to_end(&mut out)?;
    Ok(out)
}
