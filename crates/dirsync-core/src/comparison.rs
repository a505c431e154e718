//! Content equality between a source entry and its destination counterpart
//!
//! Equality is a best-effort optimisation used to skip redundant copies. Any
//! entry that cannot be inspected compares as "not equal", which only ever
//! causes an extra copy.

mod hash;

use std::fs;
use std::path::Path;

pub use hash::{FileHash, FileHasher};

/// Kind of a filesystem entry, determined without following symlinks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Regular file
    File,
    /// Directory
    Directory,
    /// Symbolic link (never followed)
    Symlink,
    /// Anything else (sockets, fifos, devices)
    Other,
}

impl EntryKind {
    /// Classify `path`, testing for a symlink before anything else
    ///
    /// Returns `None` when the path cannot be stat'ed.
    #[must_use]
    pub fn of(path: &Path) -> Option<Self> {
        let metadata = fs::symlink_metadata(path).ok()?;
        let file_type = metadata.file_type();

        let kind = if file_type.is_symlink() {
            Self::Symlink
        } else if file_type.is_dir() {
            Self::Directory
        } else if file_type.is_file() {
            Self::File
        } else {
            Self::Other
        };
        Some(kind)
    }
}

/// Decides whether two entries are already identical
pub struct FileComparator;

impl FileComparator {
    /// Compare `a` and `b`
    ///
    /// - two symlinks are equal iff their target strings are equal;
    /// - a symlink never equals a non-symlink;
    /// - otherwise the SHA-256 digests of both files are compared.
    ///
    /// Missing or unreadable entries compare as unequal.
    #[must_use]
    pub fn is_same(a: &Path, b: &Path) -> bool {
        let (Some(kind_a), Some(kind_b)) = (EntryKind::of(a), EntryKind::of(b)) else {
            return false;
        };

        match (kind_a, kind_b) {
            (EntryKind::Symlink, EntryKind::Symlink) => {
                match (fs::read_link(a), fs::read_link(b)) {
                    (Ok(target_a), Ok(target_b)) => {
                        target_a.as_os_str().as_encoded_bytes()
                            == target_b.as_os_str().as_encoded_bytes()
                    }
                    _ => false,
                }
            }
            (EntryKind::Symlink, _) | (_, EntryKind::Symlink) => false,
            _ => match (FileHasher::hash(a), FileHasher::hash(b)) {
                (Ok(hash_a), Ok(hash_b)) => hash_a == hash_b,
                _ => false,
            },
        }
    }
}
