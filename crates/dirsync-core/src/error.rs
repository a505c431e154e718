use std::io;
use std::path::{Path, PathBuf};

/// Result type for sync engine operations
pub type Result<T> = std::result::Result<T, SyncError>;

/// Errors raised by the sync engine
///
/// Variants fall into two groups. Fatal errors invalidate the whole session
/// and are propagated to the top level. Everything else is local to a single
/// entry or event and is logged and skipped by the caller.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Symlinks with absolute targets would point into the wrong root
    #[error("Tool does not handle absolute symlinks: {} -> {}", link.display(), target.display())]
    AbsoluteSymlink {
        /// The symlink found in the source tree
        link: PathBuf,
        /// Its absolute target
        target: PathBuf,
    },

    /// Remote paths using the home-directory shortcut
    #[error("Remote path '{path}' must not contain '~'; use a path relative to the remote home or an absolute path")]
    UnsupportedRemotePath {
        /// The offending remote path
        path: String,
    },

    /// Malformed `host:path` destination
    #[error("Invalid remote destination '{spec}': {reason}")]
    InvalidRemoteSpec {
        /// The destination as given on the command line
        spec: String,
        /// What is wrong with it
        reason: String,
    },

    /// sshfs could not mount the remote directory
    #[error("Failed to create sshfs mount. Does the remote directory exist? Command used: {command}")]
    MountFailed {
        /// The mount command line
        command: String,
    },

    /// The mount exists but writes do not show up on the remote side
    #[error("sshfs mount at {} failed the self-check: {reason}", mount.display())]
    MountCheckFailed {
        /// Local mount point
        mount: PathBuf,
        /// Why the check failed
        reason: String,
    },

    /// The source root is missing or not a directory
    #[error("Source is not a readable directory: {}", path.display())]
    SourceNotDirectory {
        /// The source root as given
        path: PathBuf,
    },

    /// Mirroring into the source tree would feed on its own output
    #[error("Destination {} lies inside source {}", dest_root.display(), source_root.display())]
    DestinationInsideSource {
        /// Canonical source root
        source_root: PathBuf,
        /// Destination root
        dest_root: PathBuf,
    },

    /// The notification subsystem could not be set up
    #[error("Failed to watch source tree: {0}")]
    Watch(#[from] notify::Error),

    /// I/O failure on a single path
    #[error("I/O error at {}: {source}", path.display())]
    Io {
        /// Path the operation was applied to
        path: PathBuf,
        /// Underlying error
        #[source]
        source: io::Error,
    },
}

impl SyncError {
    /// Wrap an I/O error together with the path it happened on
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether this error must terminate the whole session
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Io { .. })
    }

    /// Whether this error means the path disappeared before it was handled
    #[must_use]
    pub fn is_vanished(&self) -> bool {
        matches!(self, Self::Io { source, .. } if source.kind() == io::ErrorKind::NotFound)
    }

    /// The path an I/O error refers to, if any
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Io { path, .. }
            | Self::AbsoluteSymlink { link: path, .. }
            | Self::SourceNotDirectory { path } => Some(path),
            _ => None,
        }
    }
}

/// Extension for attaching a path to raw I/O results
pub trait IoResultExt<T> {
    /// Convert an `io::Result` into a [`Result`] tagged with `path`
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::Io`] when the underlying operation failed.
    fn at_path(self, path: &Path) -> Result<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn at_path(self, path: &Path) -> Result<T> {
        self.map_err(|e| SyncError::io(path, e))
    }
}
