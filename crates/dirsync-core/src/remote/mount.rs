//! sshfs mount lifecycle

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::runner::{CommandRunner, SystemRunner};
use crate::error::{Result, SyncError};

/// Unmount attempts before giving up; some FUSE setups refuse the first one
const UNMOUNT_ATTEMPTS: usize = 2;

/// Pause between unmount attempts
const UNMOUNT_RETRY_DELAY_MS: u64 = 500;

/// Unmount programs, tried in order until one is installed
#[cfg(target_os = "macos")]
const UNMOUNT_TOOLS: &[(&str, &[&str])] = &[("umount", &[])];

#[cfg(not(target_os = "macos"))]
const UNMOUNT_TOOLS: &[(&str, &[&str])] = &[("fusermount3", &["-u"]), ("fusermount", &["-u"])];

/// A remote directory mounted into a local temporary directory
///
/// The mount is torn down on [`SshfsMount::unmount`] or when dropped.
pub struct SshfsMount<R: CommandRunner = SystemRunner> {
    runner: R,
    host: String,
    remote_path: String,
    mount_point: PathBuf,
    mounted: bool,
}

impl<R: CommandRunner> SshfsMount<R> {
    /// Mount `host:remote_path` into a fresh temporary directory
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MountFailed`] if sshfs fails even after trying
    /// to create the remote directory.
    pub fn establish(runner: R, host: &str, remote_path: &str) -> Result<Self> {
        let mount_point = tempfile::Builder::new()
            .prefix("dirsync-")
            .tempdir()
            .map_err(|e| SyncError::io(std::env::temp_dir(), e))?
            // Never removed recursively: it may still be a live mount
            .keep();

        Self::establish_at(runner, host, remote_path, mount_point)
    }

    /// Mount `host:remote_path` at an existing empty directory
    ///
    /// The directory is removed again if mounting fails.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MountFailed`] if sshfs fails even after trying
    /// to create the remote directory.
    pub fn establish_at(
        runner: R,
        host: &str,
        remote_path: &str,
        mount_point: PathBuf,
    ) -> Result<Self> {
        let remote = format!("{host}:{remote_path}");
        let local = mount_point.to_string_lossy().into_owned();

        if !run_quietly(&runner, "sshfs", &[&remote, &local]) {
            // Probably the remote directory does not exist yet
            info!("Creating {remote_path} on {host}");
            let mkdir = format!("mkdir -p {}", shell_quote(remote_path));
            run_quietly(&runner, "ssh", &[host, &mkdir]);

            if !run_quietly(&runner, "sshfs", &[&remote, &local]) {
                if let Err(e) = fs::remove_dir(&mount_point) {
                    debug!("Could not remove {}: {e}", mount_point.display());
                }
                return Err(SyncError::MountFailed {
                    command: format!("sshfs {remote} {local}"),
                });
            }
        }

        debug!("Mounted {remote} at {local}");
        Ok(Self {
            runner,
            host: host.to_string(),
            remote_path: remote_path.to_string(),
            mount_point,
            mounted: true,
        })
    }

    /// Local directory backed by the remote one
    #[must_use]
    pub fn local_path(&self) -> &Path {
        &self.mount_point
    }

    /// Whether the mount is still active
    #[must_use]
    pub const fn is_mounted(&self) -> bool {
        self.mounted
    }

    /// Check that writes through the mount are visible on the remote host
    ///
    /// A uniquely named marker is written locally, looked up over a separate
    /// ssh connection and removed again.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MountCheckFailed`] if the marker cannot be
    /// written or is not visible remotely.
    pub fn verify(&self) -> Result<()> {
        let marker = format!(".dirsync-check-{}", Uuid::new_v4().simple());
        let local_marker = self.mount_point.join(&marker);

        fs::write(&local_marker, b"dirsync mount check").map_err(|e| {
            SyncError::MountCheckFailed {
                mount: self.mount_point.clone(),
                reason: format!("cannot write marker file: {e}"),
            }
        })?;

        let remote_marker = remote_join(&self.remote_path, &marker);
        let test = format!("test -e {}", shell_quote(&remote_marker));
        let visible = run_quietly(&self.runner, "ssh", &[&self.host, &test]);

        if let Err(e) = fs::remove_file(&local_marker) {
            warn!("Could not remove marker {}: {e}", local_marker.display());
        }

        if visible {
            debug!("Mount self-check passed");
            Ok(())
        } else {
            Err(SyncError::MountCheckFailed {
                mount: self.mount_point.clone(),
                reason: format!("{remote_marker} is not visible on {}", self.host),
            })
        }
    }

    /// Unmount and remove the mount point, returning whether it succeeded
    ///
    /// Failures are logged; calling this again retries.
    pub fn unmount(&mut self) -> bool {
        if !self.mounted {
            return true;
        }

        let local = self.mount_point.to_string_lossy().into_owned();
        for attempt in 1..=UNMOUNT_ATTEMPTS {
            match self.try_unmount(&local) {
                Some(true) => {
                    self.mounted = false;
                    if let Err(e) = fs::remove_dir(&self.mount_point) {
                        warn!("Could not remove mount point {local}: {e}");
                    }
                    debug!("Unmounted {local}");
                    return true;
                }
                Some(false) if attempt < UNMOUNT_ATTEMPTS => {
                    debug!("Unmount attempt {attempt} failed, retrying");
                    thread::sleep(Duration::from_millis(UNMOUNT_RETRY_DELAY_MS));
                }
                Some(false) => {}
                None => {
                    warn!("No unmount tool found; {local} is still mounted");
                    return false;
                }
            }
        }

        error!("Failed to clean up sshfs mount at {local}");
        false
    }

    /// One unmount attempt with the first installed tool
    ///
    /// Returns `None` if no tool is installed.
    fn try_unmount(&self, local: &str) -> Option<bool> {
        for (tool, flags) in UNMOUNT_TOOLS {
            let mut args: Vec<&str> = flags.to_vec();
            args.push(local);
            match self.runner.run(tool, &args) {
                Ok(success) => return Some(success),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    debug!("{tool} is not installed");
                }
                Err(e) => {
                    warn!("Could not run {tool}: {e}");
                    return Some(false);
                }
            }
        }
        None
    }
}

impl<R: CommandRunner> Drop for SshfsMount<R> {
    fn drop(&mut self) {
        if self.mounted {
            self.unmount();
        }
    }
}

/// Run a program, treating "could not start" like a failed exit
fn run_quietly<R: CommandRunner>(runner: &R, program: &str, args: &[&str]) -> bool {
    match runner.run(program, args) {
        Ok(success) => success,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("{program} is not installed");
            false
        }
        Err(e) => {
            warn!("Could not run {program}: {e}");
            false
        }
    }
}

/// Quote `s` for a POSIX shell on the remote side
fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn remote_join(dir: &str, name: &str) -> String {
    if dir.is_empty() {
        name.to_string()
    } else if dir.ends_with('/') {
        format!("{dir}{name}")
    } else {
        format!("{dir}/{name}")
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::collections::VecDeque;

    use tempfile::TempDir;

    use super::*;

    /// Replays scripted results and records every invocation
    struct ScriptedRunner {
        calls: RefCell<Vec<String>>,
        results: RefCell<VecDeque<io::Result<bool>>>,
    }

    impl ScriptedRunner {
        fn new(results: Vec<io::Result<bool>>) -> Self {
            Self {
                calls: RefCell::new(Vec::new()),
                results: RefCell::new(results.into()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.borrow().clone()
        }
    }

    impl CommandRunner for &ScriptedRunner {
        fn run(&self, program: &str, args: &[&str]) -> io::Result<bool> {
            self.calls
                .borrow_mut()
                .push(format!("{program} {}", args.join(" ")));
            self.results.borrow_mut().pop_front().unwrap_or(Ok(true))
        }
    }

    fn mount_dir(tmp: &TempDir) -> PathBuf {
        let dir = tmp.path().join("mnt");
        fs::create_dir(&dir).unwrap();
        dir
    }

    #[test]
    fn test_mount_first_try() {
        let tmp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![Ok(true)]);

        let mut mount = SshfsMount::establish_at(&runner, "box", "/srv/m", mount_dir(&tmp)).unwrap();

        assert!(mount.is_mounted());
        let local = mount.local_path().to_string_lossy().into_owned();
        assert_eq!(runner.calls(), vec![format!("sshfs box:/srv/m {local}")]);

        assert!(mount.unmount());
        assert!(!mount.is_mounted());
        assert!(!tmp.path().join("mnt").exists());
    }

    #[test]
    fn test_mount_creates_remote_directory_then_retries() {
        let tmp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![Ok(false), Ok(true), Ok(true)]);

        let mount = SshfsMount::establish_at(&runner, "box", "new dir", mount_dir(&tmp)).unwrap();

        let calls = runner.calls();
        assert_eq!(calls[1], "ssh box mkdir -p 'new dir'");
        assert!(calls[2].starts_with("sshfs box:new dir "));
        drop(mount);
    }

    #[test]
    fn test_mount_failure_is_fatal_and_cleans_up() {
        let tmp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![Ok(false), Ok(true), Ok(false)]);

        let err = SshfsMount::establish_at(&runner, "box", "/srv/m", mount_dir(&tmp))
            .err()
            .unwrap();

        assert!(matches!(err, SyncError::MountFailed { .. }));
        assert!(err.is_fatal());
        assert!(!tmp.path().join("mnt").exists());
    }

    #[test]
    fn test_missing_sshfs_is_mount_failure() {
        let tmp = TempDir::new().unwrap();
        let not_found = || -> io::Result<bool> { Err(io::Error::from(io::ErrorKind::NotFound)) };
        let runner = ScriptedRunner::new(vec![not_found(), Ok(true), not_found()]);

        let result = SshfsMount::establish_at(&runner, "box", "/srv/m", mount_dir(&tmp));
        assert!(matches!(result, Err(SyncError::MountFailed { .. })));
    }

    #[test]
    fn test_verify_checks_marker_remotely_and_removes_it() {
        let tmp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![Ok(true), Ok(true)]);
        let mount = SshfsMount::establish_at(&runner, "box", "/srv/m", mount_dir(&tmp)).unwrap();

        mount.verify().unwrap();

        let calls = runner.calls();
        assert!(calls[1].starts_with("ssh box test -e '/srv/m/.dirsync-check-"));
        assert_eq!(fs::read_dir(mount.local_path()).unwrap().count(), 0);
    }

    #[test]
    fn test_verify_fails_when_marker_not_visible() {
        let tmp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![Ok(true), Ok(false)]);
        let mount = SshfsMount::establish_at(&runner, "box", "/srv/m", mount_dir(&tmp)).unwrap();

        let err = mount.verify().unwrap_err();

        assert!(matches!(err, SyncError::MountCheckFailed { .. }));
        assert_eq!(fs::read_dir(mount.local_path()).unwrap().count(), 0);
    }

    #[test]
    fn test_unmount_retries_once() {
        let tmp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![Ok(true), Ok(false), Ok(true)]);
        let mut mount = SshfsMount::establish_at(&runner, "box", "/srv/m", mount_dir(&tmp)).unwrap();

        assert!(mount.unmount());
        assert_eq!(runner.calls().len(), 3);
    }

    #[test]
    fn test_failed_unmount_keeps_mount_point() {
        let tmp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![Ok(true), Ok(false), Ok(false)]);
        let mut mount = SshfsMount::establish_at(&runner, "box", "/srv/m", mount_dir(&tmp)).unwrap();

        assert!(!mount.unmount());
        assert!(mount.is_mounted());
        assert!(tmp.path().join("mnt").exists());

        // A later attempt may succeed
        assert!(mount.unmount());
        assert!(!tmp.path().join("mnt").exists());
    }

    #[test]
    #[cfg(not(target_os = "macos"))]
    fn test_unmount_falls_back_to_fusermount() {
        let tmp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![
            Ok(true),
            Err(io::Error::from(io::ErrorKind::NotFound)),
            Ok(true),
        ]);
        let mut mount = SshfsMount::establish_at(&runner, "box", "/srv/m", mount_dir(&tmp)).unwrap();

        assert!(mount.unmount());
        let calls = runner.calls();
        assert!(calls[1].starts_with("fusermount3 -u "));
        assert!(calls[2].starts_with("fusermount -u "));
    }

    #[test]
    fn test_drop_unmounts() {
        let tmp = TempDir::new().unwrap();
        let runner = ScriptedRunner::new(vec![Ok(true), Ok(true)]);
        let mount = SshfsMount::establish_at(&runner, "box", "/srv/m", mount_dir(&tmp)).unwrap();

        drop(mount);

        assert_eq!(runner.calls().len(), 2);
        assert!(!tmp.path().join("mnt").exists());
    }

    #[test]
    fn test_shell_quote_and_join() {
        assert_eq!(shell_quote("it's"), r"'it'\''s'");
        assert_eq!(remote_join("", "m"), "m");
        assert_eq!(remote_join("/srv/", "m"), "/srv/m");
        assert_eq!(remote_join("/srv", "m"), "/srv/m");
    }
}
