//! Synchronization session
//!
//! A session owns the roots, exclusions and verbosity for one run. It
//! subscribes to recursive change notifications on the source root,
//! reconciles the destination with the source, then mirrors the queued and
//! incoming notifications until the [`CancelToken`] fires.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};

use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::error::{IoResultExt, Result, SyncError};
use crate::filter::ExclusionSet;
use crate::mirror::{dispatch, ChangeEvent, ChangeMirror, MirrorOutcome, NotificationTranslator};
use crate::paths::{resolve_path, PathMapper};
use crate::sync::{ReconcileReport, TreeReconciler};

/// How often the watch loop checks for cancellation
const POLL_INTERVAL_MS: u64 = 200;

/// Cloneable, thread-safe cancellation trigger
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// Create a token that has not fired
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation was requested
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Inputs for a session
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Directory to mirror from
    pub source_root: PathBuf,
    /// Directory to mirror into
    pub dest_root: PathBuf,
    /// Paths containing any of these substrings are skipped
    pub exclusions: ExclusionSet,
    /// Log timing and a summary of the initial reconciliation
    pub verbose: bool,
}

/// Counters for handled notifications
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchStats {
    /// Notifications handled
    pub events: usize,
    /// Copies and symlink replications
    pub written: usize,
    /// Removals
    pub removed: usize,
    /// Renames
    pub renamed: usize,
    /// Excluded notifications
    pub excluded: usize,
    /// Notifications whose path vanished first
    pub vanished: usize,
    /// Notifications that failed with a logged error
    pub failed: usize,
}

impl WatchStats {
    fn record(&mut self, outcome: MirrorOutcome) {
        self.events += 1;
        match outcome {
            MirrorOutcome::Copied | MirrorOutcome::Linked => self.written += 1,
            MirrorOutcome::Removed => self.removed += 1,
            MirrorOutcome::Renamed => self.renamed += 1,
            MirrorOutcome::Excluded => self.excluded += 1,
            MirrorOutcome::Vanished => self.vanished += 1,
            MirrorOutcome::Failed => self.failed += 1,
            MirrorOutcome::Ignored => {}
        }
    }
}

/// A live recursive subscription on the source root
///
/// Dropping it releases the underlying watcher.
pub struct Subscription {
    _watcher: RecommendedWatcher,
    events: Receiver<notify::Result<Event>>,
}

/// One synchronization run
#[derive(Debug)]
pub struct SyncSession {
    mapper: PathMapper,
    exclusions: ExclusionSet,
    verbose: bool,
}

impl SyncSession {
    /// Validate the configuration and create a session
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SourceNotDirectory`] if the source root is not a
    /// readable directory, and [`SyncError::DestinationInsideSource`] if the
    /// destination lies within the source tree.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let is_dir = fs::metadata(&config.source_root).is_ok_and(|m| m.is_dir());
        if !is_dir || fs::read_dir(&config.source_root).is_err() {
            return Err(SyncError::SourceNotDirectory {
                path: config.source_root,
            });
        }

        // Notification paths carry the canonical prefix
        let source_root = dunce::canonicalize(&config.source_root)
            .map_err(|e| SyncError::io(&config.source_root, e))?;

        // The destination may not exist yet; compare resolved forms
        let dest_root = resolve_path(&config.dest_root).at_path(&config.dest_root)?;
        if dest_root.starts_with(&source_root) {
            return Err(SyncError::DestinationInsideSource {
                source_root,
                dest_root,
            });
        }

        Ok(Self {
            mapper: PathMapper::new(source_root, dest_root),
            exclusions: config.exclusions,
            verbose: config.verbose,
        })
    }

    /// Canonical source root
    #[must_use]
    pub fn source_root(&self) -> &Path {
        self.mapper.source_root()
    }

    /// Destination root
    #[must_use]
    pub fn dest_root(&self) -> &Path {
        self.mapper.dest_root()
    }

    /// Exclusion patterns in effect
    #[must_use]
    pub const fn exclusions(&self) -> &ExclusionSet {
        &self.exclusions
    }

    /// Run the initial, non-destructive reconciliation
    ///
    /// # Errors
    ///
    /// Returns fatal errors from the reconciler.
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let started = Instant::now();
        let report = TreeReconciler::new(&self.exclusions)
            .reconcile(self.source_root(), self.dest_root())?;

        if self.verbose {
            debug!("Initial sync took {:.2?}", started.elapsed());
            debug!("{}", report.summary());
        }
        Ok(report)
    }

    /// Subscribe to recursive notifications on the source root
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Watch`] if the watcher cannot be created.
    pub fn subscribe(&self) -> Result<Subscription> {
        let (tx, events) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(tx)?;
        watcher.watch(self.source_root(), RecursiveMode::Recursive)?;
        info!("Watching {}", self.source_root().display());

        Ok(Subscription {
            _watcher: watcher,
            events,
        })
    }

    /// Mirror notifications from `subscription` until `cancel` fires
    ///
    /// The subscription is released before this returns.
    ///
    /// # Errors
    ///
    /// Returns the first fatal error raised while mirroring.
    pub fn mirror_until_cancelled(
        &self,
        subscription: Subscription,
        cancel: &CancelToken,
    ) -> Result<WatchStats> {
        let stats = self.pump(&subscription.events, cancel);
        drop(subscription);
        debug!("Notification subscription released");
        stats
    }

    /// Reconcile, then mirror notifications until cancelled
    ///
    /// The subscription is taken before reconciling, so changes made while
    /// the initial walk runs are queued and mirrored afterwards.
    ///
    /// # Errors
    ///
    /// Returns fatal errors from either phase.
    pub fn run(&self, cancel: &CancelToken) -> Result<ReconcileReport> {
        let subscription = self.subscribe()?;
        let report = self.reconcile()?;
        self.mirror_until_cancelled(subscription, cancel)?;
        Ok(report)
    }

    /// Drain raw notifications into the mirror
    ///
    /// Stops when cancelled or when the sending side disconnects.
    pub(crate) fn pump(
        &self,
        events: &Receiver<notify::Result<Event>>,
        cancel: &CancelToken,
    ) -> Result<WatchStats> {
        let mirror = ChangeMirror::new(&self.mapper, &self.exclusions);
        let mut translator = NotificationTranslator::new();
        let mut stats = WatchStats::default();
        let poll = Duration::from_millis(POLL_INTERVAL_MS);

        while !cancel.is_cancelled() {
            match events.recv_timeout(poll) {
                Ok(Ok(event)) => {
                    for change in translator.translate(event) {
                        Self::apply(&mirror, &change, &mut stats)?;
                    }
                }
                Ok(Err(err)) => warn!("Watcher error: {err}"),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => {
                    for change in translator.flush_all() {
                        Self::apply(&mirror, &change, &mut stats)?;
                    }
                    break;
                }
            }

            for change in translator.flush_expired() {
                Self::apply(&mirror, &change, &mut stats)?;
            }
        }

        Ok(stats)
    }

    fn apply(mirror: &ChangeMirror<'_>, change: &ChangeEvent, stats: &mut WatchStats) -> Result<()> {
        let outcome = dispatch(mirror, change)?;
        debug!("{} -> {outcome:?}", change.source_path().display());
        stats.record(outcome);
        Ok(())
    }
}
