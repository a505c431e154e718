//! Running external programs

use std::io;
use std::process::Command;

use tracing::debug;

/// Runs an external program to completion
pub trait CommandRunner {
    /// Run `program` with `args`, returning whether it exited successfully
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the program cannot be started; a missing
    /// program reports `NotFound`.
    fn run(&self, program: &str, args: &[&str]) -> io::Result<bool>;
}

/// Runs programs as child processes sharing this terminal
///
/// Standard input is inherited so ssh can prompt for credentials.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> io::Result<bool> {
        debug!("Running {program} {}", args.join(" "));
        let status = Command::new(program).args(args).status()?;
        Ok(status.success())
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_reports_exit_status() {
        assert!(SystemRunner.run("true", &[]).unwrap());
        assert!(!SystemRunner.run("false", &[]).unwrap());
    }

    #[test]
    fn test_missing_program_is_not_found() {
        let err = SystemRunner
            .run("dirsync-definitely-not-installed", &[])
            .unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
