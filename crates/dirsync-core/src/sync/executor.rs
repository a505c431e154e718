//! Destination file operations
//!
//! Every operation is idempotent. A missing path surfaces as an I/O error of
//! kind `NotFound`, which callers treat as "vanished" and skip.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use tracing::debug;

use crate::error::{IoResultExt, Result, SyncError};

/// Copy the contents of regular file `source` over `dest`
///
/// The source is opened before the destination is touched, so a source that
/// has already vanished leaves the destination unchanged. Missing parent
/// directories are created, and a symlink or read-only file at `dest` is
/// replaced rather than written through. The source permissions are carried
/// over. Returns the number of bytes copied.
///
/// # Errors
///
/// Returns an I/O error if the source cannot be read or the destination
/// cannot be written.
pub fn copy_file(source: &Path, dest: &Path) -> Result<u64> {
    let mut reader = File::open(source).at_path(source)?;
    let metadata = reader.metadata().at_path(source)?;

    if !metadata.is_file() {
        return Err(SyncError::io(
            source,
            io::Error::new(io::ErrorKind::InvalidInput, "not a regular file"),
        ));
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent).at_path(parent)?;
    }

    // A read-only copy from an earlier pass cannot be truncated in place
    if fs::symlink_metadata(dest)
        .is_ok_and(|m| m.is_symlink() || (m.is_file() && m.permissions().readonly()))
    {
        fs::remove_file(dest).at_path(dest)?;
    }

    let mut writer = File::create(dest).at_path(dest)?;
    let bytes = io::copy(&mut reader, &mut writer).at_path(dest)?;
    fs::set_permissions(dest, metadata.permissions()).at_path(dest)?;

    Ok(bytes)
}

/// Make sure `dest` is a directory, returning whether it had to be created
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created or a non-directory
/// entry occupies `dest`.
pub fn ensure_dir(dest: &Path) -> Result<bool> {
    match fs::symlink_metadata(dest) {
        Ok(meta) if meta.is_dir() => Ok(false),
        Ok(_) => Err(SyncError::io(
            dest,
            io::Error::new(io::ErrorKind::AlreadyExists, "a non-directory entry is in the way"),
        )),
        Err(_) => {
            fs::create_dir_all(dest).at_path(dest)?;
            Ok(true)
        }
    }
}

/// Remove `dest`, whatever it is
///
/// A direct unlink is tried first; when it fails because `dest` is a
/// directory (or the platform reports that as a permission error) the whole
/// subtree is removed instead.
///
/// # Errors
///
/// Returns an I/O error if the entry cannot be removed. A missing entry
/// reports `NotFound`.
pub fn remove_entry(dest: &Path) -> Result<()> {
    match fs::remove_file(dest) {
        Ok(()) => Ok(()),
        Err(e)
            if matches!(
                e.kind(),
                io::ErrorKind::IsADirectory | io::ErrorKind::PermissionDenied
            ) =>
        {
            debug!("Removing directory tree {}", dest.display());
            fs::remove_dir_all(dest).at_path(dest)
        }
        Err(e) => Err(SyncError::io(dest, e)),
    }
}

/// Rename `from` to `to` within the destination tree
///
/// # Errors
///
/// Returns an I/O error if `from` is missing or the rename fails.
pub fn rename_entry(from: &Path, to: &Path) -> Result<()> {
    fs::symlink_metadata(from).at_path(from)?;

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).at_path(parent)?;
    }

    fs::rename(from, to).at_path(from)
}
