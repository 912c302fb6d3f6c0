//! Domain logic: turn a decoded snapshot into deterministic, classified drift results.
//!
//! This crate owns *what* each declared resource's status is and why. It does not own
//! *how* live inventory is queried; that sits behind the [`Verifier`] port.

mod aggregate;
mod classify;
mod dispatch;
mod enumerate;
pub mod kinds;
mod ports;
pub mod region;
mod registry;

pub use aggregate::Aggregation;
pub use classify::{Assessment, classify};
pub use dispatch::{DispatchOutcome, Dispatcher};
pub use enumerate::enumerate;
pub use kinds::{LookupSpec, Requirement, WhenMissing};
pub use ports::{Lookup, Verifier, VerifyError};
pub use registry::{Resolution, VerifierRegistry};
