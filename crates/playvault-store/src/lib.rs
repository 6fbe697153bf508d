// ABOUTME: Persistence layer for playvault, backed by a single SQLite file.
// ABOUTME: Provides the connection manager, retry under contention, per-user and admin repositories.

pub mod admin;
pub mod config;
mod documents;
pub mod error;
pub mod favorites;
pub mod groups;
pub mod password;
pub mod play_records;
pub mod retry;
pub mod schema;
pub mod search_history;
pub mod skip_configs;
pub mod sources;
pub mod storage;
pub mod users;

pub use config::{ConfigError, OwnerCredentials, StoreConfig};
pub use error::StoreError;
pub use retry::{RetryPolicy, with_retry};
pub use search_history::SEARCH_HISTORY_LIMIT;
pub use storage::Storage;
