//! Postboard: a stateless CRUD API over users, profiles, posts, and
//! comments, backed by PostgreSQL or by an embedded entity-link store.

pub mod config;
pub mod error;
pub mod handlers;
pub mod migration;
pub mod model;
pub mod response;
pub mod routes;
pub mod service;
pub mod sql;
pub mod state;
pub mod sync;

pub use config::{BackendConfig, Config};
pub use error::{AppError, ConfigError};
pub use migration::{apply_schema, ensure_database_exists};
pub use response::{success_many, success_one};
pub use routes::{api_routes, common_routes, common_routes_with_ready};
pub use state::AppState;
pub use sync::{sync_routes, SyncState, SyncStore};
