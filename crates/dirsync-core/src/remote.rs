//! Remote destinations
//!
//! A destination of the form `host:path` is mirrored through a local sshfs
//! mount. Everything else is a local path.

mod mount;
mod runner;

use std::fmt;
use std::path::PathBuf;

pub use mount::SshfsMount;
pub use runner::{CommandRunner, SystemRunner};

use crate::error::{Result, SyncError};

/// Where the mirror is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// A directory on this machine
    Local(PathBuf),
    /// A directory on a remote host, reachable over ssh
    Remote {
        /// ssh host (may include `user@`)
        host: String,
        /// Directory on the remote host
        path: String,
    },
}

impl Destination {
    /// Parse a destination argument
    ///
    /// Any `:` marks a remote destination; the host is everything before the
    /// first one.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::InvalidRemoteSpec`] for an empty host and
    /// [`SyncError::UnsupportedRemotePath`] when the remote path uses `~`.
    pub fn parse(spec: &str) -> Result<Self> {
        let Some((host, path)) = spec.split_once(':') else {
            return Ok(Self::Local(PathBuf::from(spec)));
        };

        if host.trim().is_empty() {
            return Err(SyncError::InvalidRemoteSpec {
                spec: spec.to_string(),
                reason: "missing host before ':'".to_string(),
            });
        }

        if path.contains('~') {
            return Err(SyncError::UnsupportedRemotePath {
                path: path.to_string(),
            });
        }

        Ok(Self::Remote {
            host: host.to_string(),
            path: path.to_string(),
        })
    }

    /// Whether the destination lives on another host
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local(path) => write!(f, "{} (local)", path.display()),
            Self::Remote { host, path } => write!(f, "{path} (on {host})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_local() {
        assert_eq!(
            Destination::parse("/backup/work").unwrap(),
            Destination::Local(PathBuf::from("/backup/work"))
        );
        assert!(!Destination::parse("relative/dir").unwrap().is_remote());
    }

    #[test]
    fn test_parse_remote() {
        let dest = Destination::parse("user@box:/srv/mirror").unwrap();
        assert_eq!(
            dest,
            Destination::Remote {
                host: "user@box".to_string(),
                path: "/srv/mirror".to_string(),
            }
        );
        assert!(dest.is_remote());
        assert_eq!(dest.to_string(), "/srv/mirror (on user@box)");
    }

    #[test]
    fn test_parse_remote_relative_to_home() {
        let dest = Destination::parse("box:code/project").unwrap();
        assert_eq!(
            dest,
            Destination::Remote {
                host: "box".to_string(),
                path: "code/project".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_rejects_tilde() {
        let err = Destination::parse("box:~/code").unwrap_err();
        assert!(matches!(err, SyncError::UnsupportedRemotePath { .. }));
        assert!(err.is_fatal());
    }

    #[test]
    fn test_parse_rejects_empty_host() {
        let err = Destination::parse(":/srv").unwrap_err();
        assert!(matches!(err, SyncError::InvalidRemoteSpec { .. }));
    }

    #[test]
    fn test_display_local() {
        let dest = Destination::parse("/tmp/out").unwrap();
        assert_eq!(dest.to_string(), "/tmp/out (local)");
    }
}
