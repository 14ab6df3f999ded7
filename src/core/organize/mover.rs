//! Moves or copies a file into the archive, fixing ownership and mode.

use super::perms;
use super::types::OperationMode;
use std::fs;
use std::io;
use std::path::Path;

/// Bits every archived file gets regardless of its folder
const OWNER_READ_WRITE: u32 = 0o600;
/// Group/other read and write bits copied from the parent folder
const INHERITED_FILE_BITS: u32 = 0o066;

/// Mode for a file placed inside a directory with `parent_mode`
///
/// Owner always reads and writes; group and others get read/write only where
/// the folder grants it. Execute bits are never set.
pub fn file_mode_for(parent_mode: u32) -> u32 {
    OWNER_READ_WRITE | (parent_mode & INHERITED_FILE_BITS)
}

/// Places files at a planned destination
pub struct SafeMover;

impl SafeMover {
    /// Move or copy `src` to `dst`
    ///
    /// `dst` must not exist yet and its parent must exist. On success the
    /// file belongs to the owner of its new folder and carries
    /// [`file_mode_for`] of that folder's mode.
    pub fn place(src: &Path, dst: &Path, mode: OperationMode, dry_run: bool) -> io::Result<()> {
        tracing::info!("{} {} -> {}", mode, src.display(), dst.display());
        if dry_run {
            return Ok(());
        }

        match mode {
            OperationMode::Move => {
                unlock(src)?;
                Self::rename_or_copy(src, dst)?;
            }
            OperationMode::Copy => {
                fs::copy(src, dst)?;
            }
        }

        Self::adopt_parent(dst)
    }

    fn rename_or_copy(src: &Path, dst: &Path) -> io::Result<()> {
        fs::rename(src, dst).or_else(|rename_error| {
            if !crosses_devices(&rename_error) {
                return Err(rename_error);
            }
            tracing::debug!(
                "{} is on another filesystem ({}), copying instead",
                src.display(),
                rename_error
            );
            let source_size = fs::metadata(src)?.len();
            fs::copy(src, dst)?;

            let dest_size = fs::metadata(dst)?.len();
            if dest_size != source_size {
                let _ = fs::remove_file(dst);
                return Err(io::Error::other(format!(
                    "copy verification failed: source {} bytes, dest {} bytes",
                    source_size, dest_size
                )));
            }

            fs::remove_file(src)
        })
    }

    fn adopt_parent(dst: &Path) -> io::Result<()> {
        let Some(parent) = dst.parent() else {
            return Ok(());
        };
        let parent_info = fs::metadata(parent)?;
        perms::copy_owner(dst, &parent_info)?;
        if let Some(parent_mode) = perms::mode_of(parent)? {
            perms::set_mode(dst, file_mode_for(parent_mode))?;
        }
        Ok(())
    }
}

/// Only a cross-device rename may fall back to copy and delete
fn crosses_devices(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::CrossesDevices
}

/// Clear the immutable and append-only flags so the file can be moved
#[cfg(target_os = "macos")]
fn unlock(path: &Path) -> io::Result<()> {
    use nix::sys::stat::{stat, FileFlag};

    let locks = FileFlag::UF_IMMUTABLE
        | FileFlag::SF_IMMUTABLE
        | FileFlag::UF_APPEND
        | FileFlag::SF_APPEND;
    let current = FileFlag::from_bits_truncate(stat(path)?.st_flags);
    if current.intersects(locks) {
        tracing::info!("chflags nouchg,noschg,nouappnd,nosappnd {}", path.display());
        nix::unistd::chflags(path, current - locks)?;
    }
    Ok(())
}

#[cfg(not(target_os = "macos"))]
fn unlock(_path: &Path) -> io::Result<()> {
    Ok(())
}
