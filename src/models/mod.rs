//! Persistence models
//!
//! Serializable DTOs written to and read from snapshot files.

pub mod snapshot;

pub use snapshot::{PersistedEntry, Snapshot};
