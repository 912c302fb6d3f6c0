//! Shared DTOs (schemas-as-code) for the driftcheck workspace.
//!
//! # Design constraints
//! - Report types are serialized to disk and stdout.
//! - Be conservative with breaking changes.
//! - Prefer adding optional fields over changing semantics.

pub mod artifact;
pub mod category;
pub mod exec;
pub mod item;
pub mod outcome;
pub mod report;

pub use category::Category;
pub use item::{AttributeMap, ResourceMode, WorkItem};
pub use outcome::{ClassifiedResult, VerificationOutcome};

/// Schema identifiers.
pub mod schema {
    pub const DRIFTCHECK_REPORT_V1: &str = "driftcheck.report.v1";
}
