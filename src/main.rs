//! # media-sort CLI
//!
//! Command-line interface for the media sorter.
//!
//! ## Usage
//! ```bash
//! media-sort watch --source /share/import --dest /share/pictures
//! media-sort dedup ~/Pictures /backup/Pictures --output actions.sh
//! ```

mod cli;

use media_sorter::Result;

fn main() -> Result<()> {
    cli::run()
}
