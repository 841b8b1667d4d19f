use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::info;

use docmapper_core::record::{ID_FIELD, record_id, record_partition_key};
use docmapper_core::{DocumentId, Location, PartitionKey, Query, Record};

use super::r#trait::{
    AdapterError, ConnectAdapter, DocumentAdapter, FeedResponse, ItemResponse, ReadResponse,
    STATUS_CREATED, STATUS_NOT_FOUND, STATUS_OK,
};
use crate::config::AdapterConfig;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ContainerKey {
    database: String,
    container: String,
}

impl ContainerKey {
    fn new(database: &str, container: &str) -> Self {
        Self {
            database: database.to_string(),
            container: container.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct ContainerState {
    partition_key_path: Option<String>,
    /// Insertion order doubles as query return order.
    items: Vec<Record>,
}

impl ContainerState {
    fn in_partition(&self, record: &Record, partition_key: Option<&PartitionKey>) -> bool {
        match (&self.partition_key_path, partition_key) {
            (Some(path), Some(pk)) => record_partition_key(record, path).as_ref() == Some(pk),
            _ => true,
        }
    }

    fn position(&self, id: &DocumentId, partition_key: Option<&PartitionKey>) -> Option<usize> {
        self.items.iter().position(|r| {
            record_id(r).as_ref() == Some(id) && self.in_partition(r, partition_key)
        })
    }
}

/// Number of calls made to each adapter primitive.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct AdapterCalls {
    pub reads: usize,
    pub writes: usize,
    pub replaces: usize,
    pub executes: usize,
}

impl AdapterCalls {
    pub fn total(&self) -> usize {
        self.reads + self.writes + self.replaces + self.executes
    }
}

/// In-memory document database.
///
/// Intended for tests/dev. Mirrors the observable behaviour of a partitioned
/// store closely enough to exercise every read and write path: ids are assigned
/// on create, `_ts`/`_etag` system fields are stamped, missing documents read as
/// 404, and every call is counted.
#[derive(Debug, Default)]
pub struct InMemoryAdapter {
    containers: RwLock<HashMap<ContainerKey, ContainerState>>,
    calls: Mutex<AdapterCalls>,
    queries: Mutex<Vec<Query>>,
    fail_next: Mutex<Option<AdapterError>>,
}

impl InMemoryAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a container's partition key path so reads and replaces are
    /// routed by partition. Containers not registered ignore partition keys.
    pub fn register_container(&self, location: &Location) -> Result<(), AdapterError> {
        let mut containers = self.containers.write().map_err(|_| poisoned())?;
        let state = containers
            .entry(ContainerKey::new(location.database(), location.container()))
            .or_default();
        state.partition_key_path = location.partition_key_path().map(str::to_string);
        Ok(())
    }

    /// Store a record as-is, bypassing call accounting (test fixtures).
    pub fn seed(&self, location: &Location, record: Record) -> Result<(), AdapterError> {
        self.containers
            .write()
            .map_err(|_| poisoned())?
            .entry(ContainerKey::new(location.database(), location.container()))
            .or_default()
            .items
            .push(record);
        Ok(())
    }

    /// Make the next adapter call fail with `error`.
    pub fn fail_next(&self, error: AdapterError) -> Result<(), AdapterError> {
        *self.fail_next.lock().map_err(|_| poisoned())? = Some(error);
        Ok(())
    }

    pub fn calls(&self) -> AdapterCalls {
        self.calls.lock().map(|c| *c).unwrap_or_default()
    }

    /// Queries executed so far, oldest first.
    pub fn executed_queries(&self) -> Vec<Query> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }

    /// Snapshot of the records stored in a container, in insertion order.
    pub fn records(&self, location: &Location) -> Vec<Record> {
        self.containers
            .read()
            .ok()
            .and_then(|c| {
                c.get(&ContainerKey::new(location.database(), location.container()))
                    .map(|s| s.items.clone())
            })
            .unwrap_or_default()
    }

    fn begin(&self, count: impl FnOnce(&mut AdapterCalls)) -> Result<(), AdapterError> {
        let mut calls = self.calls.lock().map_err(|_| poisoned())?;
        count(&mut calls);
        drop(calls);

        let mut slot = self.fail_next.lock().map_err(|_| poisoned())?;
        match slot.take() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn poisoned() -> AdapterError {
    AdapterError::Transport("lock poisoned".to_string())
}

fn stamp(record: &mut Record) {
    record.insert("_ts".to_string(), Value::from(Utc::now().timestamp()));
    record.insert(
        "_etag".to_string(),
        Value::String(format!("\"{}\"", DocumentId::generate())),
    );
}

#[async_trait]
impl DocumentAdapter for InMemoryAdapter {
    async fn read(
        &self,
        database: &str,
        container: &str,
        id: &DocumentId,
        partition_key: &PartitionKey,
    ) -> Result<ReadResponse, AdapterError> {
        self.begin(|c| c.reads += 1)?;

        let containers = self.containers.read().map_err(|_| poisoned())?;
        let found = containers
            .get(&ContainerKey::new(database, container))
            .and_then(|state| {
                state
                    .position(id, Some(partition_key))
                    .map(|idx| state.items[idx].clone())
            });

        Ok(match found {
            Some(resource) => ReadResponse {
                status_code: STATUS_OK,
                resource: Some(resource),
            },
            None => ReadResponse {
                status_code: STATUS_NOT_FOUND,
                resource: None,
            },
        })
    }

    async fn write(
        &self,
        database: &str,
        container: &str,
        mut document: Record,
    ) -> Result<ItemResponse, AdapterError> {
        self.begin(|c| c.writes += 1)?;

        let id = match record_id(&document) {
            Some(id) => id,
            None => {
                let id = DocumentId::generate();
                document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
                id
            }
        };

        let mut containers = self.containers.write().map_err(|_| poisoned())?;
        let state = containers
            .entry(ContainerKey::new(database, container))
            .or_default();

        let partition_key = state
            .partition_key_path
            .as_deref()
            .and_then(|path| record_partition_key(&document, path));
        if state.position(&id, partition_key.as_ref()).is_some() {
            return Err(AdapterError::Conflict(format!(
                "document '{id}' already exists in {database}/{container}"
            )));
        }

        stamp(&mut document);
        state.items.push(document.clone());

        Ok(ItemResponse {
            status_code: STATUS_CREATED,
            resource: document,
        })
    }

    async fn replace(
        &self,
        database: &str,
        container: &str,
        id: &DocumentId,
        partition_key: Option<&PartitionKey>,
        mut document: Record,
    ) -> Result<ItemResponse, AdapterError> {
        self.begin(|c| c.replaces += 1)?;

        let mut containers = self.containers.write().map_err(|_| poisoned())?;
        let state = containers
            .get_mut(&ContainerKey::new(database, container))
            .ok_or_else(|| AdapterError::NotFound(format!("{database}/{container}/{id}")))?;
        let idx = state
            .position(id, partition_key)
            .ok_or_else(|| AdapterError::NotFound(format!("{database}/{container}/{id}")))?;

        document.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        stamp(&mut document);
        state.items[idx] = document.clone();

        Ok(ItemResponse {
            status_code: STATUS_OK,
            resource: document,
        })
    }

    async fn execute(
        &self,
        database: &str,
        container: &str,
        query: &Query,
    ) -> Result<FeedResponse, AdapterError> {
        // Logged before the failure check so the log always matches `executes`.
        self.queries.lock().map_err(|_| poisoned())?.push(query.clone());
        self.begin(|c| c.executes += 1)?;

        let containers = self.containers.read().map_err(|_| poisoned())?;
        let resources = containers
            .get(&ContainerKey::new(database, container))
            .map(|state| query.apply(state.items.iter().cloned()))
            .unwrap_or_default();

        Ok(FeedResponse { resources })
    }
}

impl ConnectAdapter for InMemoryAdapter {
    fn connect(config: &AdapterConfig) -> Result<Self, AdapterError> {
        info!(
            endpoint = %config.endpoint(),
            endpoint_discovery = config.enable_endpoint_discovery(),
            "using in-memory document adapter"
        );
        Ok(Self::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn location() -> Location {
        Location::new("db", "items").with_partition_key_path("/tenant")
    }

    #[tokio::test]
    async fn write_assigns_id_and_system_fields() {
        let adapter = InMemoryAdapter::new();
        let resp = adapter
            .write("db", "items", record(json!({ "name": "a" })))
            .await
            .unwrap();

        assert_eq!(resp.status_code, STATUS_CREATED);
        assert!(record_id(&resp.resource).is_some());
        assert!(resp.resource.contains_key("_ts"));
        assert!(resp.resource.contains_key("_etag"));
        assert_eq!(adapter.calls().writes, 1);
    }

    #[tokio::test]
    async fn duplicate_ids_conflict_within_a_partition() {
        let adapter = InMemoryAdapter::new();
        adapter.register_container(&location()).unwrap();

        let doc = record(json!({ "id": "x", "tenant": "t1" }));
        adapter.write("db", "items", doc.clone()).await.unwrap();
        let err = adapter.write("db", "items", doc).await.unwrap_err();
        assert!(matches!(err, AdapterError::Conflict(_)));

        // Same id in another partition is a different document.
        adapter
            .write("db", "items", record(json!({ "id": "x", "tenant": "t2" })))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn read_routes_by_partition() {
        let adapter = InMemoryAdapter::new();
        adapter.register_container(&location()).unwrap();
        adapter
            .seed(&location(), record(json!({ "id": "x", "tenant": "t1" })))
            .unwrap();

        let id: DocumentId = "x".parse().unwrap();
        let hit = adapter
            .read("db", "items", &id, &"t1".parse().unwrap())
            .await
            .unwrap();
        let miss = adapter
            .read("db", "items", &id, &"t2".parse().unwrap())
            .await
            .unwrap();

        assert_eq!(hit.status_code, STATUS_OK);
        assert_eq!(miss.status_code, STATUS_NOT_FOUND);
        assert!(miss.resource.is_none());
        assert_eq!(adapter.calls().reads, 2);
    }

    #[tokio::test]
    async fn replace_of_missing_document_fails() {
        let adapter = InMemoryAdapter::new();
        let err = adapter
            .replace("db", "items", &"nope".parse().unwrap(), None, Record::new())
            .await
            .unwrap_err();
        assert!(matches!(err, AdapterError::NotFound(_)));
    }

    #[tokio::test]
    async fn fail_next_affects_exactly_one_call() {
        let adapter = InMemoryAdapter::new();
        adapter
            .fail_next(AdapterError::Throttled { retry_after_ms: 10 })
            .unwrap();

        let first = adapter.execute("db", "items", &Query::select_all()).await;
        let second = adapter.execute("db", "items", &Query::select_all()).await;

        assert_eq!(first, Err(AdapterError::Throttled { retry_after_ms: 10 }));
        assert_eq!(second, Ok(FeedResponse::default()));
        assert_eq!(adapter.calls().executes, 2);
        assert_eq!(adapter.executed_queries().len(), 2);
    }

    #[test]
    fn fixture_setup_reports_poisoned_locks() {
        let adapter = InMemoryAdapter::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _guard = adapter.containers.write().unwrap();
            panic!("poison the container map");
        }));

        assert!(matches!(
            adapter.register_container(&location()),
            Err(AdapterError::Transport(_))
        ));
        assert!(matches!(
            adapter.seed(&location(), Record::new()),
            Err(AdapterError::Transport(_))
        ));
    }
}
