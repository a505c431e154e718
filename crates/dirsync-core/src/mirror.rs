//! Event-driven mirroring
//!
//! Each change notification is handled on its own and mapped to an
//! idempotent destination mutation. Handlers tolerate races: the source may
//! have changed again between the notification and its handling, so a path
//! that has vanished is skipped silently and unexpected I/O failures are
//! logged without stopping the watch loop. Only fatal errors are returned.

mod translate;

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::comparison::EntryKind;
use crate::error::Result;
use crate::filter::ExclusionSet;
use crate::paths::PathMapper;
use crate::symlinks::replicate_link;
use crate::sync::{copy_file, reconcile_subtree, remove_entry, rename_entry};

pub use translate::NotificationTranslator;

/// A change observed under the source root
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// An entry appeared
    Created(PathBuf),
    /// File contents or metadata changed
    Modified(PathBuf),
    /// An entry disappeared
    Deleted(PathBuf),
    /// An entry was renamed within the source tree
    Moved {
        /// Old path
        from: PathBuf,
        /// New path
        to: PathBuf,
    },
}

impl ChangeEvent {
    /// The source-side path the event refers to (the old path for moves)
    #[must_use]
    pub fn source_path(&self) -> &Path {
        match self {
            Self::Created(p) | Self::Modified(p) | Self::Deleted(p) => p,
            Self::Moved { from, .. } => from,
        }
    }
}

/// What a handler did with a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MirrorOutcome {
    /// The path matched an exclusion pattern
    Excluded,
    /// Nothing to do for this kind of entry
    Ignored,
    /// Content was copied to the destination
    Copied,
    /// A symlink was replicated
    Linked,
    /// The destination entry was removed
    Removed,
    /// The destination entry was renamed
    Renamed,
    /// The path was gone by the time the event was handled
    Vanished,
    /// A non-fatal error was logged
    Failed,
}

/// Callbacks for the four kinds of change notification
pub trait ChangeHandler {
    /// An entry was created at `path`
    ///
    /// # Errors
    ///
    /// Returns only fatal errors.
    fn on_created(&self, path: &Path) -> Result<MirrorOutcome>;

    /// The entry at `path` was modified
    ///
    /// # Errors
    ///
    /// Returns only fatal errors.
    fn on_modified(&self, path: &Path) -> Result<MirrorOutcome>;

    /// The entry at `path` was deleted
    ///
    /// # Errors
    ///
    /// Returns only fatal errors.
    fn on_deleted(&self, path: &Path) -> Result<MirrorOutcome>;

    /// The entry at `from` was renamed to `to`
    ///
    /// # Errors
    ///
    /// Returns only fatal errors.
    fn on_moved(&self, from: &Path, to: &Path) -> Result<MirrorOutcome>;
}

/// Route one event to the matching callback
///
/// # Errors
///
/// Propagates fatal errors from the handler.
pub fn dispatch<H: ChangeHandler + ?Sized>(handler: &H, event: &ChangeEvent) -> Result<MirrorOutcome> {
    match event {
        ChangeEvent::Created(path) => handler.on_created(path),
        ChangeEvent::Modified(path) => handler.on_modified(path),
        ChangeEvent::Deleted(path) => handler.on_deleted(path),
        ChangeEvent::Moved { from, to } => handler.on_moved(from, to),
    }
}

/// Mirrors source notifications onto the destination tree
pub struct ChangeMirror<'a> {
    mapper: &'a PathMapper,
    exclusions: &'a ExclusionSet,
}

impl<'a> ChangeMirror<'a> {
    /// Create a mirror over the given roots and exclusions
    #[must_use]
    pub const fn new(mapper: &'a PathMapper, exclusions: &'a ExclusionSet) -> Self {
        Self { mapper, exclusions }
    }

    /// Destination for `source`; `None` for the roots themselves and foreign paths
    fn destination_of(&self, source: &Path) -> Option<PathBuf> {
        let relative = self.mapper.relative(source)?;
        if relative.as_os_str().is_empty() {
            return None;
        }
        self.mapper.to_destination(source)
    }

    /// Turn a per-event error into an outcome, keeping only fatal errors
    fn settle(path: &Path, result: Result<MirrorOutcome>) -> Result<MirrorOutcome> {
        match result {
            Ok(outcome) => Ok(outcome),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) if err.is_vanished() => {
                debug!("{} vanished before it could be handled", path.display());
                Ok(MirrorOutcome::Vanished)
            }
            Err(err) => {
                warn!("Could not mirror {}: {err}", path.display());
                Ok(MirrorOutcome::Failed)
            }
        }
    }

    fn copy_entry(&self, path: &Path, dest: &Path) -> Result<MirrorOutcome> {
        match EntryKind::of(path) {
            None => Ok(MirrorOutcome::Vanished),
            Some(EntryKind::Symlink) => {
                replicate_link(path, dest)?;
                Ok(MirrorOutcome::Linked)
            }
            Some(EntryKind::Directory) => {
                let report = reconcile_subtree(self.exclusions, path, dest)?;
                debug!(
                    "Copied directory {} ({} files, {} links)",
                    path.display(),
                    report.copied,
                    report.linked
                );
                Ok(MirrorOutcome::Copied)
            }
            Some(EntryKind::File) => {
                copy_file(path, dest)?;
                Ok(MirrorOutcome::Copied)
            }
            Some(EntryKind::Other) => Ok(MirrorOutcome::Ignored),
        }
    }

    fn rename(&self, from: &Path, to: &Path, dest_from: &Path, dest_to: &Path) -> Result<MirrorOutcome> {
        match rename_entry(dest_from, dest_to) {
            Ok(()) => Ok(MirrorOutcome::Renamed),
            Err(err) if err.is_vanished() && EntryKind::of(to).is_some() => {
                debug!(
                    "{} missing at destination, copying {} instead",
                    from.display(),
                    to.display()
                );
                self.on_created(to)
            }
            Err(err) => Self::settle(from, Err(err)),
        }
    }
}

impl ChangeHandler for ChangeMirror<'_> {
    fn on_created(&self, path: &Path) -> Result<MirrorOutcome> {
        if self.exclusions.is_excluded(path) {
            return Ok(MirrorOutcome::Excluded);
        }
        let Some(dest) = self.destination_of(path) else {
            return Ok(MirrorOutcome::Ignored);
        };

        debug!("Creating {}", path.display());
        Self::settle(path, self.copy_entry(path, &dest))
    }

    fn on_modified(&self, path: &Path) -> Result<MirrorOutcome> {
        if self.exclusions.is_excluded(path) {
            return Ok(MirrorOutcome::Excluded);
        }
        let Some(dest) = self.destination_of(path) else {
            return Ok(MirrorOutcome::Ignored);
        };

        match EntryKind::of(path) {
            None => Ok(MirrorOutcome::Vanished),
            Some(EntryKind::File) => {
                debug!("Updating {}", path.display());
                Self::settle(path, copy_file(path, &dest).map(|_| MirrorOutcome::Copied))
            }
            Some(_) => Ok(MirrorOutcome::Ignored),
        }
    }

    fn on_deleted(&self, path: &Path) -> Result<MirrorOutcome> {
        if self.exclusions.is_excluded(path) {
            return Ok(MirrorOutcome::Excluded);
        }
        let Some(dest) = self.destination_of(path) else {
            return Ok(MirrorOutcome::Ignored);
        };

        debug!("Deleting {}", path.display());
        Self::settle(path, remove_entry(&dest).map(|()| MirrorOutcome::Removed))
    }

    fn on_moved(&self, from: &Path, to: &Path) -> Result<MirrorOutcome> {
        match (self.exclusions.is_excluded(from), self.exclusions.is_excluded(to)) {
            (true, true) => return Ok(MirrorOutcome::Excluded),
            (true, false) => return self.on_created(to),
            (false, true) => return self.on_deleted(from),
            (false, false) => {}
        }

        match (self.destination_of(from), self.destination_of(to)) {
            (Some(dest_from), Some(dest_to)) => {
                debug!("Moving {} to {}", from.display(), to.display());
                self.rename(from, to, &dest_from, &dest_to)
            }
            (None, Some(_)) => self.on_created(to),
            (Some(_), None) => self.on_deleted(from),
            (None, None) => Ok(MirrorOutcome::Ignored),
        }
    }
}
