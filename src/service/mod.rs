//! Data-access helpers: typed CRUD per entity plus request validation.

pub mod comments;
pub mod posts;
pub mod users;
pub mod validation;

/// Bulk writes share one transaction and one size cap.
pub const BULK_LIMIT: usize = 100;
