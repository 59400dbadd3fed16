//! # permat common library
//!
//! Shared code for the permat permission admin surfaces including:
//! - Entity model and ordered entity stores
//! - Mapping engine (nested grant trees, clone-on-write operations)
//! - Persistence codec for the state blobs (legacy shape migration)
//! - CSV parsing/writing primitives
//! - Blob store access, configuration, search and seed data

pub mod config;
pub mod csv;
pub mod db;
pub mod entities;
pub mod error;
pub mod grants;
pub mod search;
pub mod seed;
pub mod store;
pub mod time;

pub use error::{Error, Result};
