//! Alternate backing store: entity records and named links in an embedded
//! database, with string identifiers. Serves an overlapping subset of the
//! HTTP surface.

pub mod handlers;
pub mod schema;
pub mod store;

pub use handlers::{sync_routes, SyncState};
pub use store::{SyncComment, SyncPost, SyncStore, SyncUser};
