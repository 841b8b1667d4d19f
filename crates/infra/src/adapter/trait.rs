use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use docmapper_core::{DocumentId, PartitionKey, Query, Record};

use crate::config::AdapterConfig;

/// HTTP-style status code returned by the database.
pub type StatusCode = u16;

pub const STATUS_OK: StatusCode = 200;
pub const STATUS_CREATED: StatusCode = 201;
pub const STATUS_NOT_FOUND: StatusCode = 404;

/// Result of a point read. A missing document is a status, not an error.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadResponse {
    pub status_code: StatusCode,
    pub resource: Option<Record>,
}

/// Result of a create or replace: the record as stored (including the assigned id).
#[derive(Debug, Clone, PartialEq)]
pub struct ItemResponse {
    pub status_code: StatusCode,
    pub resource: Record,
}

/// Result of a query, in the order the database returned them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedResponse {
    pub resources: Vec<Record>,
}

/// Adapter failure (network, auth, throttling, storage conflicts).
///
/// The mapper never retries or swallows these; they reach the caller unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdapterError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("resource not found: {0}")]
    NotFound(String),

    #[error("request throttled (retry after {retry_after_ms} ms)")]
    Throttled { retry_after_ms: u64 },

    #[error("unsupported operation: {0}")]
    Unsupported(String),
}

/// Stateless façade over a partitioned document database.
///
/// Implementations must be safe to share across concurrently running entity
/// lifecycles; the mapper holds no locks around adapter calls.
#[async_trait]
pub trait DocumentAdapter: Send + Sync {
    /// Point read by id and partition key.
    async fn read(
        &self,
        database: &str,
        container: &str,
        id: &DocumentId,
        partition_key: &PartitionKey,
    ) -> Result<ReadResponse, AdapterError>;

    /// Create a new document. The response carries the assigned id.
    async fn write(
        &self,
        database: &str,
        container: &str,
        document: Record,
    ) -> Result<ItemResponse, AdapterError>;

    /// Replace an existing document unconditionally (last write wins).
    async fn replace(
        &self,
        database: &str,
        container: &str,
        id: &DocumentId,
        partition_key: Option<&PartitionKey>,
        document: Record,
    ) -> Result<ItemResponse, AdapterError>;

    /// Run a parameterized query across the container.
    async fn execute(
        &self,
        database: &str,
        container: &str,
        query: &Query,
    ) -> Result<FeedResponse, AdapterError>;
}

/// Construction seam: adapters are built from explicitly injected configuration.
///
/// Construct once and share (e.g. behind an `Arc`); the lifecycle of the
/// resulting adapter belongs to the caller.
pub trait ConnectAdapter: DocumentAdapter + Sized {
    fn connect(config: &AdapterConfig) -> Result<Self, AdapterError>;
}

#[async_trait]
impl<S> DocumentAdapter for Arc<S>
where
    S: DocumentAdapter + ?Sized,
{
    async fn read(
        &self,
        database: &str,
        container: &str,
        id: &DocumentId,
        partition_key: &PartitionKey,
    ) -> Result<ReadResponse, AdapterError> {
        (**self).read(database, container, id, partition_key).await
    }

    async fn write(
        &self,
        database: &str,
        container: &str,
        document: Record,
    ) -> Result<ItemResponse, AdapterError> {
        (**self).write(database, container, document).await
    }

    async fn replace(
        &self,
        database: &str,
        container: &str,
        id: &DocumentId,
        partition_key: Option<&PartitionKey>,
        document: Record,
    ) -> Result<ItemResponse, AdapterError> {
        (**self)
            .replace(database, container, id, partition_key, document)
            .await
    }

    async fn execute(
        &self,
        database: &str,
        container: &str,
        query: &Query,
    ) -> Result<FeedResponse, AdapterError> {
        (**self).execute(database, container, query).await
    }
}
