// ABOUTME: Core library for playvault, containing the domain types persisted by the store.
// ABOUTME: Defines users, per-user documents, content sources, categories and the admin config.

pub mod admin;
pub mod document;
pub mod error;
pub mod source;
pub mod user;

pub use admin::{AdminConfig, ConfigSubscription, SiteConfig};
pub use document::{Favorite, PlayRecord, SkipConfig, SkipKey};
pub use error::CoreError;
pub use source::{Category, CategoryType, ContentSource, LiveSource, Origin};
pub use user::{Role, StoredUser, UserGroup, UserRecord};
