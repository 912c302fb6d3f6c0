//! Decoding of versioned Terraform state snapshots.
//!
//! Only format version 4 is understood. Earlier JSON versions, the pre-JSON
//! binary format and future versions are rejected with a typed
//! [`DecodeError`] before any reconciliation work starts.

mod decode;
mod load;
mod model;

pub use decode::{DecodeError, SUPPORTED_FORMAT_VERSION, decode_snapshot};
pub use load::{LoadedSnapshot, load_snapshot};
pub use model::{
    CheckObject, CheckResult, IndexKey, InstanceRecord, OutputValue, RawAttributes,
    ResourceRecord, StateSnapshot,
};
