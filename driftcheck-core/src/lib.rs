//! Embeddable core library for driftcheck.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into a larger host process.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`SnapshotSource`](ports::SnapshotSource): read the state snapshot
//! - [`CommandRunner`](ports::CommandRunner): run one remediation command
//! - [`SnapshotPublisher`](ports::SnapshotPublisher): publish the updated snapshot
//! - [`ArtifactWriter`]: write-once backup and report files
//!
//! The [`adapters`] module provides default filesystem and process-backed
//! implementations.
//!
//! # Entry points
//!
//! - [`run_reconcile`](pipeline::run_reconcile): decode, verify, classify,
//!   optionally remediate, and write the run's artifacts

pub mod adapters;
pub mod context;
pub mod exec;
pub mod inventory;
pub mod pipeline;
pub mod ports;
pub mod settings;

pub use driftcheck_artifacts::{ArtifactWriter, FsArtifactWriter, PublishGate};
pub use driftcheck_domain::VerifierRegistry;
pub use driftcheck_state::{DecodeError, LoadedSnapshot};
