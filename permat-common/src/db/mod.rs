//! Database access layer

pub mod init;
pub mod state;

pub use init::{ensure_schema, init_database};
pub use state::{delete_state_blob, load_state_blob, save_state_blob};
