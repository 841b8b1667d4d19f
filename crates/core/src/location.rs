//! Logical location of a document (database + container).

use serde::{Deserialize, Serialize};

/// Where a document lives. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    database: String,
    container: String,
    partition_key_path: Option<String>,
}

impl Location {
    pub fn new(database: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            container: container.into(),
            partition_key_path: None,
        }
    }

    /// Declare the container's partition key path (e.g. `/tenantId`).
    ///
    /// Query helpers use it to recover partition keys from raw records, which
    /// lets documents materialized from a query use point reads afterwards.
    pub fn with_partition_key_path(mut self, path: impl Into<String>) -> Self {
        self.partition_key_path = Some(path.into());
        self
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn partition_key_path(&self) -> Option<&str> {
        self.partition_key_path.as_deref()
    }
}

impl core::fmt::Display for Location {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}/{}", self.database, self.container)
    }
}
