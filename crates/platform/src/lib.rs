//! Platform implementations for hassist.
//!
//! The agent only talks to the host platform through
//! `hassist_core::Platform`. This crate provides the snapshot-backed
//! implementation used by the CLI, the HTTP gateway and the test suites.

pub mod snapshot;

pub use snapshot::{Snapshot, SnapshotPlatform};

/// A small example home, written by `hassist init`.
pub const SAMPLE_SNAPSHOT: &str = include_str!("../sample_snapshot.yaml");
