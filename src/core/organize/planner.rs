//! Destination planning: date folders, directory creation and unique names.

use super::perms;
use chrono::NaiveDateTime;
use std::fmt::Write as _;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Inserted before the extension when a destination name is taken
pub const COLLISION_MARKER: char = '~';

/// Computes where files go inside the archive
pub struct PathPlanner;

impl PathPlanner {
    /// Format `date` with the strftime-style `format`, lower-cased
    pub fn folder_name(date: &NaiveDateTime, format: &str) -> io::Result<String> {
        let mut folder = String::new();
        write!(folder, "{}", date.format(format)).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("invalid folder format \"{}\"", format),
            )
        })?;
        Ok(folder.to_lowercase())
    }

    /// Destination directory for a file created at `date`
    pub fn plan(dest_root: &Path, date: &NaiveDateTime, format: &str) -> io::Result<PathBuf> {
        Ok(dest_root.join(Self::folder_name(date, format)?))
    }

    /// Create `target` (a directory below `dest_root`) if needed
    ///
    /// Every directory created on the way gets the mode, owner and group of
    /// `dest_root`. Losing a creation race to another process is not an error.
    pub fn make_dirs(dest_root: &Path, target: &Path, dry_run: bool) -> io::Result<PathBuf> {
        if target.is_dir() {
            return Ok(target.to_path_buf());
        }

        let created = Self::missing_chain(dest_root, target);
        if dry_run {
            tracing::info!("mkdir -p {}/", target.display());
            return Ok(target.to_path_buf());
        }

        let root_info = fs::metadata(dest_root)?;
        match fs::create_dir_all(target) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists && target.is_dir() => {}
            Err(e) => return Err(e),
        }

        for dir in &created {
            // chown may clear the set-group bit, so it goes before chmod
            perms::copy_owner(dir, &root_info)?;
            perms::copy_mode(dir, &root_info)?;
        }

        tracing::info!(
            "mkdir -p {}/ [{} new, inheriting from {}]",
            target.display(),
            created.len(),
            dest_root.display()
        );
        Ok(target.to_path_buf())
    }

    /// Directories between `dest_root` and `target` that do not exist yet,
    /// outermost first
    fn missing_chain(dest_root: &Path, target: &Path) -> Vec<PathBuf> {
        let Ok(relative) = target.strip_prefix(dest_root) else {
            return Vec::new();
        };
        let mut current = dest_root.to_path_buf();
        let mut chain = Vec::new();
        for component in relative.components() {
            current.push(component);
            if !chain.is_empty() || !current.exists() {
                chain.push(current.clone());
            }
        }
        chain
    }

    /// Pick a free file name for `basename` inside `dest_dir`
    ///
    /// The name is lower-cased; while taken, [`COLLISION_MARKER`] is inserted
    /// right before the extension (`a.jpg`, `a~.jpg`, `a~~.jpg`, ...).
    pub fn unique_name(dest_dir: &Path, basename: &str) -> PathBuf {
        let mut name = basename.to_lowercase();
        let mut candidate = dest_dir.join(&name);

        while fs::symlink_metadata(&candidate).is_ok() {
            name = Self::mark(&name);
            candidate = dest_dir.join(&name);
        }

        candidate
    }

    fn mark(name: &str) -> String {
        let path = Path::new(name);
        match (
            path.file_stem().and_then(|s| s.to_str()),
            path.extension().and_then(|e| e.to_str()),
        ) {
            (Some(stem), Some(ext)) => format!("{}{}.{}", stem, COLLISION_MARKER, ext),
            _ => format!("{}{}", name, COLLISION_MARKER),
        }
    }
}
