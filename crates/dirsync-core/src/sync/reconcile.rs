//! Depth-first, non-destructive tree reconciliation

use std::path::Path;

use tracing::{debug, warn};
use walkdir::WalkDir;

use super::executor::{copy_file, ensure_dir};
use super::ReconcileReport;
use crate::comparison::FileComparator;
use crate::error::{IoResultExt, Result, SyncError};
use crate::filter::ExclusionSet;
use crate::symlinks::replicate_link;

/// What happened to a single non-directory entry
enum EntryOutcome {
    Unchanged,
    Copied(u64),
    Linked,
}

/// Converges a destination tree toward a source tree
///
/// The reconciler only adds or updates entries; anything present at the
/// destination without a source counterpart is left alone.
pub struct TreeReconciler<'a> {
    exclusions: &'a ExclusionSet,
}

impl<'a> TreeReconciler<'a> {
    /// Create a reconciler honouring `exclusions`
    #[must_use]
    pub const fn new(exclusions: &'a ExclusionSet) -> Self {
        Self { exclusions }
    }

    /// Reconcile `dest_dir` with `source_dir`
    ///
    /// # Errors
    ///
    /// Returns fatal errors (an absolute symlink target) immediately, and an
    /// I/O error if `dest_dir` itself cannot be created. Failures on
    /// individual entries are recorded in the report instead.
    pub fn reconcile(&self, source_dir: &Path, dest_dir: &Path) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();

        if ensure_dir(dest_dir)? {
            report.directories_created += 1;
        }

        let mut walker = WalkDir::new(source_dir)
            .min_depth(1)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter();

        while let Some(next) = walker.next() {
            let entry = match next {
                Ok(entry) => entry,
                Err(err) => {
                    let path = err.path().unwrap_or(source_dir).to_path_buf();
                    let source = err
                        .into_io_error()
                        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
                    Self::record_failure(SyncError::io(path, source), &mut report)?;
                    continue;
                }
            };

            let source = entry.path();
            let Ok(relative) = source.strip_prefix(source_dir) else {
                continue;
            };
            let dest = dest_dir.join(relative);
            let file_type = entry.file_type();

            if self.exclusions.is_excluded(source) {
                debug!("Skipping {}...", source.display());
                report.excluded += 1;
                if file_type.is_dir() {
                    walker.skip_current_dir();
                }
                continue;
            }

            if file_type.is_dir() {
                match ensure_dir(&dest) {
                    Ok(true) => report.directories_created += 1,
                    Ok(false) => {}
                    Err(err) => {
                        walker.skip_current_dir();
                        Self::record_failure(err, &mut report)?;
                    }
                }
                continue;
            }

            if !file_type.is_file() && !file_type.is_symlink() {
                debug!("Not a regular file, skipping {}", source.display());
                report.unsupported += 1;
                continue;
            }

            Self::sync_listed(source, &dest, file_type.is_symlink(), &mut report)?;
        }

        Ok(report)
    }

    /// Sync one listed file or symlink and count the outcome
    ///
    /// The entry may have vanished since it was listed.
    fn sync_listed(
        source: &Path,
        dest: &Path,
        is_symlink: bool,
        report: &mut ReconcileReport,
    ) -> Result<()> {
        match Self::sync_entry(source, dest, is_symlink) {
            Ok(EntryOutcome::Unchanged) => report.unchanged += 1,
            Ok(EntryOutcome::Copied(bytes)) => {
                report.copied += 1;
                report.bytes_copied += bytes;
            }
            Ok(EntryOutcome::Linked) => report.linked += 1,
            Err(err) => Self::record_failure(err, report)?,
        }
        Ok(())
    }

    /// Bring a single file or symlink up to date
    fn sync_entry(source: &Path, dest: &Path, is_symlink: bool) -> Result<EntryOutcome> {
        if FileComparator::is_same(source, dest) {
            debug!("Same already: {}", source.display());
            return Ok(EntryOutcome::Unchanged);
        }

        if is_symlink {
            replicate_link(source, dest)?;
            debug!("Linked {}", dest.display());
            Ok(EntryOutcome::Linked)
        } else {
            let bytes = copy_file(source, dest)?;
            debug!("Copied {} ({bytes} bytes)", source.display());
            Ok(EntryOutcome::Copied(bytes))
        }
    }

    /// Record a per-entry failure, propagating it if it is fatal
    fn record_failure(err: SyncError, report: &mut ReconcileReport) -> Result<()> {
        if err.is_fatal() {
            return Err(err);
        }

        if err.is_vanished() {
            debug!("Vanished before it could be synced: {err}");
            report.vanished += 1;
        } else {
            warn!("Could not sync entry: {err}");
            report.errors.push(err.to_string());
        }
        Ok(())
    }
}

/// Reconcile the subtree rooted at `source` onto `dest`, checking the root itself
///
/// Used for directories that appear after the initial walk.
///
/// # Errors
///
/// See [`TreeReconciler::reconcile`].
pub(crate) fn reconcile_subtree(
    exclusions: &ExclusionSet,
    source: &Path,
    dest: &Path,
) -> Result<ReconcileReport> {
    std::fs::symlink_metadata(source).at_path(source)?;
    TreeReconciler::new(exclusions).reconcile(source, dest)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::*;

    #[test]
    fn test_entry_vanishing_after_listing_is_counted_and_skipped() {
        let tmp = TempDir::new().unwrap();
        let src = tmp.path().join("src");
        let dst = tmp.path().join("dst");
        fs::create_dir(&src).unwrap();
        for name in ["a.txt", "b.txt", "c.txt"] {
            fs::write(src.join(name), name).unwrap();
        }

        let mut listed: Vec<_> = fs::read_dir(&src)
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        listed.sort();
        fs::remove_file(src.join("b.txt")).unwrap();

        let mut report = ReconcileReport::default();
        for source in &listed {
            let dest = dst.join(source.file_name().unwrap());
            TreeReconciler::sync_listed(source, &dest, false, &mut report).unwrap();
        }

        assert_eq!(report.vanished, 1);
        assert!(report.errors.is_empty());
        assert_eq!(report.copied, 2);
        assert_eq!(fs::read_to_string(dst.join("a.txt")).unwrap(), "a.txt");
        assert_eq!(fs::read_to_string(dst.join("c.txt")).unwrap(), "c.txt");
        assert!(!dst.join("b.txt").exists());
    }

    #[test]
    fn test_vanished_failure_is_not_an_error() {
        let mut report = ReconcileReport::default();
        let gone = SyncError::io("/src/gone", std::io::Error::from(std::io::ErrorKind::NotFound));
        let denied = SyncError::io(
            "/src/locked",
            std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        );

        TreeReconciler::record_failure(gone, &mut report).unwrap();
        TreeReconciler::record_failure(denied, &mut report).unwrap();

        assert_eq!(report.vanished, 1);
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].contains("/src/locked"));
    }
}
