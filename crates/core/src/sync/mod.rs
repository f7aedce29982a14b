//! Sync domain models and collaborator contracts.

mod sync_collaborators;
mod sync_item_model;
mod sync_queue_constants;
mod sync_run_model;

pub use sync_collaborators::*;
pub use sync_item_model::*;
pub use sync_queue_constants::*;
pub use sync_run_model::*;
