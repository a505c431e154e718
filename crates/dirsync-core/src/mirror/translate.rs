//! Translation of raw `notify` events into [`ChangeEvent`]s
//!
//! inotify reports a rename as `From`, then `To`, then `Both` carrying both
//! paths. `From` is held back until its `Both` arrives; if it never does, the
//! entry left the watched tree and is flushed as a deletion once the
//! stabilisation window has passed.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::Event;
use tracing::trace;

use super::ChangeEvent;

/// Time a lone rename-from is held before it is treated as a deletion
const STABILIZATION_TIMEOUT_MS: u64 = 100;

/// A rename half waiting for its counterpart
#[derive(Debug)]
struct PendingRename {
    from: PathBuf,
    to: Option<PathBuf>,
    tracker: Option<usize>,
    seen: Instant,
}

/// Stateful translator from `notify` events to change events
#[derive(Debug)]
pub struct NotificationTranslator {
    pending: Vec<PendingRename>,
    window: Duration,
}

impl Default for NotificationTranslator {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationTranslator {
    /// Create a translator with the default stabilisation window
    #[must_use]
    pub const fn new() -> Self {
        Self::with_window(Duration::from_millis(STABILIZATION_TIMEOUT_MS))
    }

    /// Create a translator with a custom stabilisation window
    #[must_use]
    pub const fn with_window(window: Duration) -> Self {
        Self {
            pending: Vec::new(),
            window,
        }
    }

    /// Whether rename halves are still waiting for a counterpart
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Translate one raw event
    ///
    /// A held rename source at or above a path in `event` is settled first,
    /// so events for one path keep their delivery order.
    pub fn translate(&mut self, event: Event) -> Vec<ChangeEvent> {
        let tracker = event.tracker();
        let mut paths = event.paths;
        let mut events = Vec::new();

        match event.kind {
            EventKind::Create(_) => {
                for path in paths {
                    events.extend(self.release(&path));
                    events.push(ChangeEvent::Created(path));
                }
            }
            EventKind::Remove(_) => {
                for path in paths {
                    events.extend(self.release(&path));
                    events.push(ChangeEvent::Deleted(path));
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::Both)) if paths.len() == 2 => {
                let to = paths.pop().unwrap_or_default();
                let from = paths.pop().unwrap_or_default();
                self.pending
                    .retain(|p| !(p.from == from || (tracker.is_some() && p.tracker == tracker)));
                events.extend(self.release(&from));
                events.extend(self.release(&to));
                events.push(ChangeEvent::Moved { from, to });
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => {
                for from in paths {
                    events.extend(self.release(&from));
                    trace!("Holding rename source {}", from.display());
                    self.pending.push(PendingRename {
                        from,
                        to: None,
                        tracker,
                        seen: Instant::now(),
                    });
                }
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::To)) => {
                let matched = tracker.and_then(|t| {
                    self.pending.iter_mut().find(|p| p.tracker == Some(t))
                });
                match matched {
                    Some(pending) => {
                        // The paired `Both` event follows
                        pending.to = paths.pop();
                    }
                    None => {
                        for path in paths {
                            events.extend(self.release(&path));
                            events.push(ChangeEvent::Created(path));
                        }
                    }
                }
            }
            EventKind::Modify(ModifyKind::Name(_)) => {
                for path in paths {
                    events.extend(self.release(&path));
                    if std::fs::symlink_metadata(&path).is_ok() {
                        events.push(ChangeEvent::Created(path));
                    } else {
                        events.push(ChangeEvent::Deleted(path));
                    }
                }
            }
            EventKind::Modify(_) => {
                for path in paths {
                    events.extend(self.release(&path));
                    events.push(ChangeEvent::Modified(path));
                }
            }
            EventKind::Access(_) | EventKind::Any | EventKind::Other => {}
        }

        events
    }

    /// Settle held rename sources that `path` equals or lies beneath
    fn release(&mut self, path: &Path) -> Vec<ChangeEvent> {
        if !self.pending.iter().any(|p| path.starts_with(&p.from)) {
            return Vec::new();
        }
        let (overlapping, kept): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| path.starts_with(&p.from));
        self.pending = kept;
        Self::settle(overlapping)
    }

    /// Flush rename halves older than the stabilisation window
    pub fn flush_expired(&mut self) -> Vec<ChangeEvent> {
        let window = self.window;
        let (expired, kept): (Vec<_>, Vec<_>) = self
            .pending
            .drain(..)
            .partition(|p| p.seen.elapsed() >= window);
        self.pending = kept;
        Self::settle(expired)
    }

    /// Flush every pending rename half regardless of age
    pub fn flush_all(&mut self) -> Vec<ChangeEvent> {
        let pending = std::mem::take(&mut self.pending);
        Self::settle(pending)
    }

    fn settle(pending: Vec<PendingRename>) -> Vec<ChangeEvent> {
        let mut events = Vec::new();
        for rename in pending {
            trace!("Rename source {} left the tree", rename.from.display());
            events.push(ChangeEvent::Deleted(rename.from));
            if let Some(to) = rename.to {
                events.push(ChangeEvent::Created(to));
            }
        }
        events
    }
}
