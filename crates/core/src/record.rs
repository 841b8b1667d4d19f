//! Raw records and the durable-field contract.

use serde_json::{Map, Value};

use crate::id::{DocumentId, PartitionKey};

/// Raw stored record: an opaque mapping of field name to value.
pub type Record = Map<String, Value>;

/// Field carrying a document's identifier inside a record.
pub const ID_FIELD: &str = "id";

/// Transport/location metadata that must never reach storage.
///
/// `url` and `key` are the credential fields an entity may carry around for
/// its connection; they are reserved alongside the location names.
pub const RESERVED_FIELDS: [&str; 5] = ["partitionKey", "container", "database", "url", "key"];

/// Explicit mapping from an entity to its durable-field-only record.
///
/// Implementations list the fields to persist one by one, so a field added to
/// the entity type later does not leak into storage unless it is added here
/// too. Location, partition key and credentials are never part of the output.
pub trait Durable {
    fn to_record(&self) -> Record;
}

impl Durable for Record {
    fn to_record(&self) -> Record {
        self.clone()
    }
}

/// Remove every reserved transport field from a record.
pub fn strip_reserved(record: &mut Record) {
    for field in RESERVED_FIELDS {
        record.remove(field);
    }
}

/// Read the document id stored in a record, if it is a non-empty string.
pub fn record_id(record: &Record) -> Option<DocumentId> {
    match record.get(ID_FIELD) {
        Some(Value::String(s)) => DocumentId::new(s.clone()).ok(),
        _ => None,
    }
}

/// Resolve a partition key path (e.g. `/tenantId` or `/address/city`) against a
/// record.
///
/// Strings are used as-is; numbers and booleans use their JSON rendering.
/// Missing, null and composite values yield `None`.
pub fn record_partition_key(record: &Record, path: &str) -> Option<PartitionKey> {
    let mut segments = path.trim_start_matches('/').split('/');
    let first = segments.next()?;
    let mut current = record.get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }

    let raw = match current {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    PartitionKey::new(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn strip_reserved_removes_transport_fields_only() {
        let mut r = record(json!({
            "name": "a",
            "partitionKey": "p",
            "container": "c",
            "database": "d",
            "url": "https://example",
            "key": "secret",
        }));
        strip_reserved(&mut r);
        assert_eq!(r, record(json!({ "name": "a" })));
    }

    #[test]
    fn record_id_requires_non_empty_string() {
        assert_eq!(record_id(&record(json!({ "id": "x" }))).unwrap().as_str(), "x");
        assert!(record_id(&record(json!({ "id": "" }))).is_none());
        assert!(record_id(&record(json!({ "id": 7 }))).is_none());
        assert!(record_id(&record(json!({}))).is_none());
    }

    #[test]
    fn partition_key_path_resolves_nested_and_scalar_values() {
        let r = record(json!({
            "tenant": "t-1",
            "shard": 4,
            "address": { "city": "Oslo" },
            "tags": ["a"],
        }));
        assert_eq!(record_partition_key(&r, "/tenant").unwrap().as_str(), "t-1");
        assert_eq!(record_partition_key(&r, "/shard").unwrap().as_str(), "4");
        assert_eq!(record_partition_key(&r, "/address/city").unwrap().as_str(), "Oslo");
        assert!(record_partition_key(&r, "/tags").is_none());
        assert!(record_partition_key(&r, "/missing").is_none());
    }
}
