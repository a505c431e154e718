//! Symlink replication by target string
//!
//! Links are recreated pointing at the same relative target; their targets
//! are never dereferenced or copied. Absolute targets are rejected because
//! they would resolve against the wrong root on the destination side.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{IoResultExt, Result, SyncError};

/// Read the target of `link`, rejecting absolute targets
///
/// # Errors
///
/// Returns [`SyncError::AbsoluteSymlink`] for absolute targets and an I/O
/// error if the link cannot be read.
pub fn relative_target(link: &Path) -> Result<PathBuf> {
    let target = fs::read_link(link).at_path(link)?;
    if target.is_absolute() {
        return Err(SyncError::AbsoluteSymlink {
            link: link.to_path_buf(),
            target,
        });
    }
    Ok(target)
}

/// Recreate the symlink `src` at `dest` with the same relative target
///
/// An existing non-directory entry at `dest` is replaced.
///
/// # Errors
///
/// Returns [`SyncError::AbsoluteSymlink`] when `src` points at an absolute
/// path, and an I/O error if the link cannot be read or created.
pub fn replicate_link(src: &Path, dest: &Path) -> Result<()> {
    let target = relative_target(src)?;

    match fs::symlink_metadata(dest) {
        Ok(meta) if !meta.is_dir() => {
            debug!("Replacing {} with a symlink", dest.display());
            fs::remove_file(dest).at_path(dest)?;
        }
        Ok(_) => {
            return Err(SyncError::io(
                dest,
                io::Error::new(
                    io::ErrorKind::AlreadyExists,
                    "a directory is in the way of the symlink",
                ),
            ));
        }
        Err(_) => {}
    }

    create_symlink(&target, dest).at_path(dest)
}

#[cfg(unix)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_symlink(target: &Path, link: &Path) -> io::Result<()> {
    let resolved = link.parent().map_or_else(|| target.to_path_buf(), |p| p.join(target));
    if resolved.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::os::unix::fs as unix_fs;
    use tempfile::TempDir;

    #[test]
    fn test_replicates_relative_target_verbatim() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src_link");
        let dest = tmp.path().join("dest_link");
        unix_fs::symlink("../shared/config.toml", &src).unwrap();

        replicate_link(&src, &dest).unwrap();

        assert!(fs::symlink_metadata(&dest).unwrap().is_symlink());
        assert_eq!(fs::read_link(&dest).unwrap(), PathBuf::from("../shared/config.toml"));
    }

    #[test]
    fn test_rejects_absolute_target() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("abs");
        let dest = tmp.path().join("dest");
        unix_fs::symlink("/etc/hosts", &src).unwrap();

        let err = replicate_link(&src, &dest).unwrap_err();

        assert!(matches!(err, SyncError::AbsoluteSymlink { .. }));
        assert!(err.is_fatal());
        assert!(fs::symlink_metadata(&dest).is_err());
    }

    #[test]
    fn test_replaces_existing_file_and_link() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        unix_fs::symlink("new-target", &src).unwrap();

        let dest_file = tmp.path().join("dest_file");
        fs::write(&dest_file, "stale").unwrap();
        replicate_link(&src, &dest_file).unwrap();
        assert_eq!(fs::read_link(&dest_file).unwrap(), PathBuf::from("new-target"));

        let dest_link = tmp.path().join("dest_link");
        unix_fs::symlink("old-target", &dest_link).unwrap();
        replicate_link(&src, &dest_link).unwrap();
        assert_eq!(fs::read_link(&dest_link).unwrap(), PathBuf::from("new-target"));
    }

    #[test]
    fn test_directory_in_the_way_is_not_fatal() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        unix_fs::symlink("somewhere", &src).unwrap();
        let dest = tmp.path().join("dest");
        fs::create_dir(&dest).unwrap();

        let err = replicate_link(&src, &dest).unwrap_err();
        assert!(!err.is_fatal());
        assert!(dest.is_dir());
    }

    #[test]
    fn test_missing_source_is_vanished() {
        let tmp = TempDir::new().unwrap();
        let err = replicate_link(&tmp.path().join("gone"), &tmp.path().join("dest")).unwrap_err();
        assert!(err.is_vanished());
    }
}
