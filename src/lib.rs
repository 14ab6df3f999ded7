//! # Media Sorter
//!
//! Files photos and videos dropped into an import folder into a
//! date-structured archive, and finds byte-identical copies across folders.
//!
//! ## Core Philosophy
//! - **Never lose a file** - collisions get a new name, failures stay put
//! - **Trust the metadata** - dates come from EXIF, XMP or container headers
//!   before the filesystem
//! - **Recommend, don't delete** - duplicate handling produces a reviewable
//!   plan
//!
//! ## Architecture
//! - `core` - date resolution, sorting, watching and duplicate search
//! - `events` - progress events for UI layers
//! - `error` - error types
//! - `cli` - command-line interface (binary only)

pub mod core;
pub mod error;
pub mod events;

// Re-export commonly used types at the crate root
pub use error::{MediaSorterError, Result};

/// Initialize tracing for the library
///
/// `RUST_LOG` wins when set; otherwise `verbosity` (the number of `-v` flags)
/// selects warn, info, debug or trace. Calling this twice is harmless.
pub fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
