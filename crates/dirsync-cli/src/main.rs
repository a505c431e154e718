mod cli;
mod logging;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use tracing::debug;

use cli::Cli;
use dirsync_core::config::{Config, ConfigManager};
use dirsync_core::filter::ExclusionSet;
use dirsync_core::remote::{Destination, SshfsMount, SystemRunner};
use dirsync_core::session::{CancelToken, SessionConfig, SyncSession};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = if cli.no_config {
        Config::default()
    } else {
        ConfigManager::load(cli.config.as_deref(), &cli.source)?
    };
    let verbose = cli.verbose || config.verbose;

    logging::init(verbose).context("Failed to set up logging")?;

    let mut exclusions = ExclusionSet::with_patterns(config.exclude);
    for list in &cli.exclude {
        exclusions.extend(ExclusionSet::from_csv(list).patterns().iter().cloned());
    }
    debug!("Exclusions: {:?}", exclusions.patterns());

    let destination = Destination::parse(&cli.destination)?;

    let cancel = CancelToken::new();
    let on_interrupt = cancel.clone();
    ctrlc::set_handler(move || {
        eprintln!("\n\nInterrupted by user (Ctrl+C)");
        on_interrupt.cancel();
    })
    .context("Failed to set Ctrl+C handler")?;

    match &destination {
        Destination::Local(path) => mirror(
            &cli.source,
            path.clone(),
            &destination,
            exclusions,
            verbose,
            &cancel,
        ),
        Destination::Remote { host, path } => {
            let mount = SshfsMount::establish(SystemRunner, host, path)?;
            mount.verify()?;
            debug!("Mounted {host}:{path} at {}", mount.local_path().display());

            let dest_root = mount.local_path().to_path_buf();
            mirror(&cli.source, dest_root, &destination, exclusions, verbose, &cancel)
            // Dropping the mount unmounts it
        }
    }
}

/// Reconcile `source` into `dest_root`, then follow changes until cancelled
fn mirror(
    source: &Path,
    dest_root: PathBuf,
    destination: &Destination,
    exclusions: ExclusionSet,
    verbose: bool,
    cancel: &CancelToken,
) -> anyhow::Result<()> {
    let session = SyncSession::new(SessionConfig {
        source_root: source.to_path_buf(),
        dest_root,
        exclusions,
        verbose,
    })?;

    // Changes made during the initial copy are queued, not lost
    let subscription = session.subscribe()?;

    println!("{}", "[!] Initializing...".blue());
    let report = session.reconcile()?;
    println!("{}", "[!] Copy finished...".blue());
    if !report.is_success() {
        eprintln!(
            "{}",
            format!("[!] {} entries could not be copied", report.errors.len()).yellow()
        );
    }

    // Printed after the initial copy, which can take a while
    println!(
        "{}",
        format!("[+] Syncing from {} to {destination}", session.source_root().display()).green()
    );

    let stats = session.mirror_until_cancelled(subscription, cancel)?;
    debug!("Mirrored {} notifications: {stats:?}", stats.events);
    Ok(())
}
