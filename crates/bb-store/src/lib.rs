//! SQLite-backed persistence for bb-core: the profile key-value store, the
//! notification outbox and JSON import/export.

pub mod error;
pub mod json_bridge;
pub mod paths;
pub mod schema;
pub mod store;

pub use error::{Result, StoreError};
pub use paths::{PROFILE_DB, default_base_dir, profile_db_path};
pub use schema::SCHEMA_VERSION;
pub use store::{PendingNotification, Store};
