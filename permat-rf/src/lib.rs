//! permat-rf library - Role/Feature permission admin surface
//!
//! Maintains the role -> feature -> menu -> action grant tree together with
//! the entity catalogs it is keyed by, persisting the tree as one JSON blob
//! in the shared admin database.

pub mod admin;
pub mod csv;

pub use admin::{RoleAdminState, STATE_BLOB_KEY};
