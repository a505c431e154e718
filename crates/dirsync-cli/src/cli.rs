use clap::Parser;
use std::path::PathBuf;

/// Continuous one-way directory mirroring
///
/// Copies SOURCE into DESTINATION once, then keeps DESTINATION in step with
/// every change made under SOURCE until interrupted. DESTINATION may be a
/// local directory or `host:path` on a machine reachable over ssh (mounted
/// with sshfs).
#[derive(Parser, Debug)]
#[command(name = "dirsync")]
#[command(about, long_about = None, version)]
pub struct Cli {
    /// Directory to mirror from
    pub source: PathBuf,

    /// Directory to mirror into, local path or `host:path`
    pub destination: String,

    /// Comma-separated substrings; matching paths are not synced
    #[arg(short = 'x', long = "exclude", value_name = "PATTERNS")]
    pub exclude: Vec<String>,

    /// Log timing, a summary of the initial copy and per-file status
    #[arg(short, long)]
    pub verbose: bool,

    /// Use specific config file
    #[arg(long, value_name = "PATH", conflicts_with = "no_config")]
    pub config: Option<PathBuf>,

    /// Ignore all config files
    #[arg(long, conflicts_with = "config")]
    pub no_config: bool,
}
