//! # dirsync-core
//!
//! Core library for continuous one-way directory mirroring.
//!
//! A [`session::SyncSession`] first reconciles the destination tree with the
//! source tree, then keeps it up to date by translating filesystem change
//! notifications into idempotent destination mutations.

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Error taxonomy for the sync engine
pub mod error;

/// Substring-based exclusion of paths
pub mod filter;

/// Content equality checks between source and destination entries
pub mod comparison;

/// Relative symlink replication
pub mod symlinks;

/// Source to destination path mapping
pub mod paths;

/// Configuration file discovery, parsing and merging
pub mod config;

/// Initial tree reconciliation and file operations
pub mod sync;

/// Event-driven mirroring of change notifications
pub mod mirror;

/// Remote destinations mounted over sshfs
pub mod remote;

/// Session orchestration and cancellation
pub mod session;
