//! Mapping source paths onto the destination tree
//!
//! The relative component is always carried over verbatim; only the root
//! prefix is substituted.

use std::io;
use std::path::{Component, Path, PathBuf};

/// Substitutes the source root prefix with the destination root prefix
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMapper {
    source_root: PathBuf,
    dest_root: PathBuf,
}

impl PathMapper {
    /// Create a mapper between two roots
    #[must_use]
    pub fn new(source_root: impl Into<PathBuf>, dest_root: impl Into<PathBuf>) -> Self {
        Self {
            source_root: source_root.into(),
            dest_root: dest_root.into(),
        }
    }

    /// Root of the source tree
    #[must_use]
    pub fn source_root(&self) -> &Path {
        &self.source_root
    }

    /// Root of the destination tree
    #[must_use]
    pub fn dest_root(&self) -> &Path {
        &self.dest_root
    }

    /// Path of `source` relative to the source root
    #[must_use]
    pub fn relative<'a>(&self, source: &'a Path) -> Option<&'a Path> {
        source.strip_prefix(&self.source_root).ok()
    }

    /// Destination counterpart of `source`, or `None` if it lies outside the source root
    #[must_use]
    pub fn to_destination(&self, source: &Path) -> Option<PathBuf> {
        self.relative(source).map(|rel| {
            if rel.as_os_str().is_empty() {
                self.dest_root.clone()
            } else {
                self.dest_root.join(rel)
            }
        })
    }
}

/// Absolute, symlink-free form of `path`, which need not exist yet
///
/// The existing part is canonicalised; components below it are appended
/// lexically, with `..` applied to them.
///
/// # Errors
///
/// Returns an error if `path` is relative and the working directory cannot
/// be determined.
pub fn resolve_path(path: &Path) -> io::Result<PathBuf> {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    let mut resolved = PathBuf::new();
    // Trailing components of `resolved` that are not on disk
    let mut missing = 0usize;

    for component in absolute.components() {
        match component {
            Component::Prefix(_) | Component::RootDir => resolved.push(component),
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
                missing = missing.saturating_sub(1);
            }
            Component::Normal(name) => {
                resolved.push(name);
                if missing > 0 {
                    missing += 1;
                } else if let Ok(canonical) = dunce::canonicalize(&resolved) {
                    resolved = canonical;
                } else {
                    missing = 1;
                }
            }
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_maps_nested_path() {
        let mapper = PathMapper::new("/src", "/dst");
        assert_eq!(
            mapper.to_destination(Path::new("/src/a/b.txt")),
            Some(PathBuf::from("/dst/a/b.txt"))
        );
    }

    #[test]
    fn test_root_maps_to_root() {
        let mapper = PathMapper::new("/src", "/dst");
        assert_eq!(mapper.to_destination(Path::new("/src")), Some(PathBuf::from("/dst")));
    }

    #[test]
    fn test_outside_root_is_none() {
        let mapper = PathMapper::new("/src", "/dst");
        assert_eq!(mapper.to_destination(Path::new("/other/a.txt")), None);
        // Component-wise, not string prefix
        assert_eq!(mapper.to_destination(Path::new("/srcfoo/a.txt")), None);
    }

    #[test]
    fn test_relative_component() {
        let mapper = PathMapper::new("/src", "/dst");
        assert_eq!(mapper.relative(Path::new("/src/a/c.txt")), Some(Path::new("a/c.txt")));
    }

    #[test]
    fn test_resolve_existing_path() {
        let tmp = TempDir::new().unwrap();
        let canonical = dunce::canonicalize(tmp.path()).unwrap();
        assert_eq!(resolve_path(tmp.path()).unwrap(), canonical);
    }

    #[test]
    fn test_resolve_parent_through_missing_directory() {
        let tmp = TempDir::new().unwrap();
        let canonical = dunce::canonicalize(tmp.path()).unwrap();
        fs::create_dir(canonical.join("src")).unwrap();

        let tricky = canonical.join("nonexistent/../src/./mirror");
        assert_eq!(resolve_path(&tricky).unwrap(), canonical.join("src/mirror"));
    }

    #[test]
    fn test_resolve_relative_path_against_working_directory() {
        let cwd = dunce::canonicalize(std::env::current_dir().unwrap()).unwrap();
        assert_eq!(
            resolve_path(Path::new("not-there/yet")).unwrap(),
            cwd.join("not-there/yet")
        );
    }

    #[test]
    #[cfg(unix)]
    fn test_resolve_follows_existing_symlink() {
        let tmp = TempDir::new().unwrap();
        let canonical = dunce::canonicalize(tmp.path()).unwrap();
        fs::create_dir(canonical.join("real")).unwrap();
        std::os::unix::fs::symlink("real", canonical.join("alias")).unwrap();

        assert_eq!(
            resolve_path(&canonical.join("alias/new/..")).unwrap(),
            canonical.join("real")
        );
    }
}
