//! Domain models and collaborator contracts for the Hazina offline sync queue.

pub mod errors;
pub mod sync;

pub use errors::{Result, SyncError};
