//! Ownership and mode helpers. Everything here is a no-op off unix.

use std::fs;
use std::io;
use std::path::Path;

/// Give `path` the owner and group recorded in `reference`
///
/// An unprivileged process cannot hand files to another user; that case is
/// logged and tolerated.
#[cfg(unix)]
pub(crate) fn copy_owner(path: &Path, reference: &fs::Metadata) -> io::Result<()> {
    use std::os::unix::fs::MetadataExt;

    let current = fs::symlink_metadata(path)?;
    if current.uid() == reference.uid() && current.gid() == reference.gid() {
        return Ok(());
    }

    tracing::info!(
        "chown {}:{} {}",
        reference.uid(),
        reference.gid(),
        path.display()
    );
    match std::os::unix::fs::chown(path, Some(reference.uid()), Some(reference.gid())) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            tracing::debug!("cannot chown {}: {}", path.display(), e);
            Ok(())
        }
        Err(e) => Err(e),
    }
}

/// Give `path` the permission bits of `reference`
#[cfg(unix)]
pub(crate) fn copy_mode(path: &Path, reference: &fs::Metadata) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    set_mode(path, reference.permissions().mode() & 0o7777)
}

#[cfg(unix)]
pub(crate) fn set_mode(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;

    tracing::info!("chmod {:o} {}", mode, path.display());
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

/// Mode bits of `path`, or `None` where the platform has none
#[cfg(unix)]
pub(crate) fn mode_of(path: &Path) -> io::Result<Option<u32>> {
    use std::os::unix::fs::PermissionsExt;

    Ok(Some(fs::metadata(path)?.permissions().mode()))
}

#[cfg(not(unix))]
pub(crate) fn copy_owner(_path: &Path, _reference: &fs::Metadata) -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn copy_mode(_path: &Path, _reference: &fs::Metadata) -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn set_mode(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(not(unix))]
pub(crate) fn mode_of(_path: &Path) -> io::Result<Option<u32>> {
    Ok(None)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    #[test]
    fn copy_owner_to_self_is_a_no_op() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.jpg");
        fs::write(&file, b"x").unwrap();
        let reference = fs::metadata(temp.path()).unwrap();
        assert!(copy_owner(&file, &reference).is_ok());
    }

    #[test]
    fn copy_mode_applies_reference_bits() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("a.jpg");
        fs::write(&file, b"x").unwrap();
        fs::set_permissions(temp.path(), fs::Permissions::from_mode(0o751)).unwrap();

        let reference = fs::metadata(temp.path()).unwrap();
        copy_mode(&file, &reference).unwrap();

        assert_eq!(mode_of(&file).unwrap().unwrap() & 0o7777, 0o751);
    }
}
