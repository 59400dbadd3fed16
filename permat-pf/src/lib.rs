//! permat-pf library - Package/Feature assignment admin surface
//!
//! Maintains the package -> feature assignment map together with the
//! package and feature catalogs, persisting all three as one JSON blob in
//! the shared admin database.

pub mod admin;
pub mod csv;

pub use admin::{PackageAdminState, STATE_BLOB_KEY};
