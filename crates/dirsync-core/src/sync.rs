//! Initial tree reconciliation
//!
//! Brings the destination tree into line with the source tree without ever
//! deleting destination-only content. Per-entry failures are isolated: a
//! vanished or unreadable entry is counted and skipped, and only fatal
//! errors stop the walk.

mod executor;
mod reconcile;
mod reporting;

pub use executor::{copy_file, ensure_dir, remove_entry, rename_entry};
pub(crate) use reconcile::reconcile_subtree;
pub use reconcile::TreeReconciler;
pub use reporting::SyncReporter;

/// Counters collected while reconciling a tree
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Regular files copied
    pub copied: usize,
    /// Bytes written by copies
    pub bytes_copied: u64,
    /// Symlinks replicated
    pub linked: usize,
    /// Entries already identical at the destination
    pub unchanged: usize,
    /// Destination directories created
    pub directories_created: usize,
    /// Entries skipped by exclusion patterns
    pub excluded: usize,
    /// Entries that were neither files, directories nor symlinks
    pub unsupported: usize,
    /// Entries that disappeared while being synced
    pub vanished: usize,
    /// Non-fatal failures, one message per entry
    pub errors: Vec<String>,
}

impl ReconcileReport {
    /// Entries written to the destination
    #[must_use]
    pub const fn total_operations(&self) -> usize {
        self.copied + self.linked + self.directories_created
    }

    /// Whether no entry failed
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    /// Human-readable summary of the run
    #[must_use]
    pub fn summary(&self) -> String {
        SyncReporter::generate_summary(self)
    }

    /// Fold the counters of `other` into `self`
    pub fn absorb(&mut self, other: Self) {
        self.copied += other.copied;
        self.bytes_copied += other.bytes_copied;
        self.linked += other.linked;
        self.unchanged += other.unchanged;
        self.directories_created += other.directories_created;
        self.excluded += other.excluded;
        self.unsupported += other.unsupported;
        self.vanished += other.vanished;
        self.errors.extend(other.errors);
    }
}
