//! Database adapter boundary.
//!
//! The mapper never talks to a database directly: every read, create, replace
//! and query goes through a `DocumentAdapter`. This keeps the entity lifecycle
//! free of client, connection and credential concerns.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::{AdapterCalls, InMemoryAdapter};
pub use r#trait::{
    AdapterError, ConnectAdapter, DocumentAdapter, FeedResponse, ItemResponse, ReadResponse,
    STATUS_CREATED, STATUS_NOT_FOUND, STATUS_OK, StatusCode,
};
