//! Persisted entity with a hookable create/update/load lifecycle.
//!
//! A `Document<A>` pairs domain attributes `A` with the metadata needed to
//! locate them (id, partition key, database/container). Only the attributes
//! are durable; `Durable::to_record` decides which of them reach storage.
//!
//! ## Write path
//!
//! `write` routes to create when the document has no id (or when forced) and
//! to replace otherwise. Hooks can veto either route; a veto is reported as
//! `WriteOutcome::Aborted`, never as an error, and performs no I/O.
//!
//! ## Read path
//!
//! `load` picks the cheapest way to find the stored record:
//! - id + partition key: point read
//! - id only: query by id, first match wins
//! - no id: not found, without touching the adapter

pub mod error;
pub mod hooks;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, info};

use docmapper_core::record::{ID_FIELD, record_id, record_partition_key, strip_reserved};
use docmapper_core::{DocumentId, Durable, Location, PartitionKey, Query, Record};

use crate::adapter::DocumentAdapter;
use crate::adapter::r#trait::{STATUS_NOT_FOUND, STATUS_OK};

pub use error::DocumentError;
pub use hooks::{LifecycleHooks, NoHooks};

/// Maps a raw stored record to typed attributes.
pub type Deserializer<A> = Arc<dyn Fn(&Record) -> Result<A, DocumentError> + Send + Sync>;

/// Deserializer backed by the attribute type's `serde` implementation.
///
/// Unknown fields (e.g. `_ts`, `_etag`, `id`) are ignored unless the type
/// opts into `deny_unknown_fields`.
pub fn serde_deserializer<A>() -> Deserializer<A>
where
    A: DeserializeOwned + 'static,
{
    Arc::new(|record: &Record| {
        serde_json::from_value(Value::Object(record.clone()))
            .map_err(|e| DocumentError::Deserialize(e.to_string()))
    })
}

/// Which gate stopped a write.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AbortStage {
    BeforeWrite,
    BeforeCreate,
    BeforeUpdate,
}

/// What `Document::write` did.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Created,
    Updated,
    /// A hook returned `false`; nothing was sent to the adapter.
    Aborted(AbortStage),
}

impl WriteOutcome {
    pub fn is_aborted(self) -> bool {
        matches!(self, Self::Aborted(_))
    }
}

pub struct Document<A>
where
    A: Send + Sync + 'static,
{
    id: Option<DocumentId>,
    partition_key: Option<PartitionKey>,
    location: Location,
    attributes: A,
    deserializer: Deserializer<A>,
    hooks: Arc<dyn LifecycleHooks<A>>,
}

impl<A> Document<A>
where
    A: Durable + Send + Sync + 'static,
{
    /// New, never-persisted document.
    pub fn new(location: Location, attributes: A, deserializer: Deserializer<A>) -> Self {
        Self {
            id: None,
            partition_key: None,
            location,
            attributes,
            deserializer,
            hooks: Arc::new(NoHooks),
        }
    }

    /// Build a document from a raw record, recovering id and partition key.
    pub fn from_record(
        location: Location,
        record: &Record,
        deserializer: Deserializer<A>,
    ) -> Result<Self, DocumentError> {
        let attributes = deserializer(record)?;
        let partition_key = location
            .partition_key_path()
            .and_then(|path| record_partition_key(record, path));

        Ok(Self {
            id: record_id(record),
            partition_key,
            location,
            attributes,
            deserializer,
            hooks: Arc::new(NoHooks),
        })
    }

    pub fn with_id(mut self, id: DocumentId) -> Self {
        self.id = Some(id);
        self
    }

    pub fn with_partition_key(mut self, partition_key: PartitionKey) -> Self {
        self.partition_key = Some(partition_key);
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn LifecycleHooks<A>>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn id(&self) -> Option<&DocumentId> {
        self.id.as_ref()
    }

    pub fn partition_key(&self) -> Option<&PartitionKey> {
        self.partition_key.as_ref()
    }

    pub fn location(&self) -> &Location {
        &self.location
    }

    pub fn attributes(&self) -> &A {
        &self.attributes
    }

    pub fn attributes_mut(&mut self) -> &mut A {
        &mut self.attributes
    }

    pub fn into_attributes(self) -> A {
        self.attributes
    }

    /// The record sent to storage: durable attributes plus `id` when known.
    ///
    /// Reserved transport names are removed even if `to_record` emitted them.
    pub fn payload(&self) -> Record {
        let mut record = self.attributes.to_record();
        strip_reserved(&mut record);
        record.remove(ID_FIELD);
        if let Some(id) = &self.id {
            record.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
        }
        record
    }

    /// Create or replace the document, gated by hooks.
    ///
    /// Issues at most one adapter call. On create the assigned id is stored on
    /// `self`. Adapter failures propagate unchanged.
    pub async fn write<D>(
        &mut self,
        adapter: &D,
        force_create: bool,
    ) -> Result<WriteOutcome, DocumentError>
    where
        D: DocumentAdapter + ?Sized,
    {
        let hooks = Arc::clone(&self.hooks);

        if !hooks.on_before_write(self).await {
            debug!(location = %self.location, "write aborted by on_before_write");
            return Ok(WriteOutcome::Aborted(AbortStage::BeforeWrite));
        }

        let payload = self.payload();

        match self.id.clone() {
            Some(id) if !force_create => {
                if !hooks.on_before_update(self).await {
                    debug!(location = %self.location, %id, "update aborted by on_before_update");
                    return Ok(WriteOutcome::Aborted(AbortStage::BeforeUpdate));
                }

                let response = adapter
                    .replace(
                        self.location.database(),
                        self.location.container(),
                        &id,
                        self.partition_key.as_ref(),
                        payload,
                    )
                    .await?;
                info!(location = %self.location, %id, "document replaced");

                hooks.on_updated(self, &response.resource).await;
                Ok(WriteOutcome::Updated)
            }
            _ => {
                if !hooks.on_before_create(self).await {
                    debug!(location = %self.location, "create aborted by on_before_create");
                    return Ok(WriteOutcome::Aborted(AbortStage::BeforeCreate));
                }

                let response = adapter
                    .write(self.location.database(), self.location.container(), payload)
                    .await?;
                let id = record_id(&response.resource).ok_or_else(|| {
                    DocumentError::InvalidResponse("created resource carries no id".to_string())
                })?;
                info!(location = %self.location, %id, "document created");

                self.id = Some(id);
                if self.partition_key.is_none() {
                    self.partition_key = self
                        .location
                        .partition_key_path()
                        .and_then(|path| record_partition_key(&response.resource, path));
                }

                hooks.on_created(self, &response.resource).await;
                Ok(WriteOutcome::Created)
            }
        }
    }

    /// Fetch the stored record and merge its attributes into `self`.
    ///
    /// The deserializer sees the local durable record with the fetched record
    /// laid on top. Location and a partition key set at construction are kept.
    pub async fn load<D>(&mut self, adapter: &D) -> Result<(), DocumentError>
    where
        D: DocumentAdapter + ?Sized,
    {
        let db = self.location.database();
        let container = self.location.container();

        let (status, resource) = match (&self.id, &self.partition_key) {
            (Some(id), Some(pk)) => {
                debug!(location = %self.location, %id, partition = %pk, "point read");
                let response = adapter.read(db, container, id, pk).await?;
                (response.status_code, response.resource)
            }
            (Some(id), None) => {
                debug!(location = %self.location, %id, "no partition key, querying by id");
                let feed = adapter.execute(db, container, &Query::by_id(id)).await?;
                match feed.resources.into_iter().next() {
                    Some(record) => (STATUS_OK, Some(record)),
                    None => (STATUS_NOT_FOUND, None),
                }
            }
            (None, _) => (STATUS_NOT_FOUND, None),
        };

        let partition = self
            .partition_key
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default();
        let id = self.id.as_ref().map(ToString::to_string).unwrap_or_default();

        if status >= 300 {
            return Err(if status == STATUS_NOT_FOUND {
                DocumentError::not_found(&partition, &id)
            } else {
                DocumentError::load_failure(&partition, &id, status)
            });
        }

        let record = resource.ok_or_else(|| DocumentError::load_failure(&partition, &id, status))?;
        self.merge(&record)
    }

    // Fetched fields overwrite local ones; fields only present locally survive.
    fn merge(&mut self, record: &Record) -> Result<(), DocumentError> {
        let mut merged = self.attributes.to_record();
        merged.extend(record.iter().map(|(k, v)| (k.clone(), v.clone())));
        self.attributes = (self.deserializer)(&merged)?;
        if let Some(id) = record_id(record) {
            self.id = Some(id);
        }
        if self.partition_key.is_none() {
            self.partition_key = self
                .location
                .partition_key_path()
                .and_then(|path| record_partition_key(record, path));
        }
        Ok(())
    }

    /// `get_single` bound to this document's location, deserializer and hooks.
    pub async fn get_single<D>(
        &self,
        adapter: &D,
        query: &Query,
    ) -> Result<Option<Document<A>>, DocumentError>
    where
        D: DocumentAdapter + ?Sized,
    {
        let found = crate::query::get_single(
            adapter,
            query,
            &self.location,
            Arc::clone(&self.deserializer),
        )
        .await?;
        Ok(found.map(|doc| doc.with_hooks(Arc::clone(&self.hooks))))
    }

    /// `get_all` bound to this document's location, deserializer and hooks.
    pub async fn get_all<D>(
        &self,
        adapter: &D,
        query: &Query,
    ) -> Result<Vec<Document<A>>, DocumentError>
    where
        D: DocumentAdapter + ?Sized,
    {
        let docs = crate::query::get_all(
            adapter,
            query,
            &self.location,
            Arc::clone(&self.deserializer),
        )
        .await?;
        Ok(docs
            .into_iter()
            .map(|doc| doc.with_hooks(Arc::clone(&self.hooks)))
            .collect())
    }
}

impl<A> Clone for Document<A>
where
    A: Clone + Send + Sync + 'static,
{
    fn clone(&self) -> Self {
        Self {
            id: self.id.clone(),
            partition_key: self.partition_key.clone(),
            location: self.location.clone(),
            attributes: self.attributes.clone(),
            deserializer: Arc::clone(&self.deserializer),
            hooks: Arc::clone(&self.hooks),
        }
    }
}

impl<A> core::fmt::Debug for Document<A>
where
    A: core::fmt::Debug + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Document")
            .field("id", &self.id)
            .field("partition_key", &self.partition_key)
            .field("location", &self.location)
            .field("attributes", &self.attributes)
            .finish_non_exhaustive()
    }
}
