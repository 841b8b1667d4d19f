//! Strongly-typed identifiers used by the mapper.

use core::str::FromStr;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Identifier of a persisted document.
///
/// Absence of an id on a document means it has never been durably written.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DocumentId(String);

/// Partition key value used for partition-aware routing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PartitionKey(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a string, rejecting empty values.
            pub fn new(value: impl Into<String>) -> Result<Self, DomainError> {
                let value = value.into();
                if value.is_empty() {
                    return Err(DomainError::invalid_id(format!("{}: empty", $name)));
                }
                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl FromStr for $t {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s)
            }
        }

        impl TryFrom<String> for $t {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<$t> for String {
            fn from(value: $t) -> Self {
                value.0
            }
        }
    };
}

impl_string_newtype!(DocumentId, "DocumentId");
impl_string_newtype!(PartitionKey, "PartitionKey");

impl DocumentId {
    /// Generate a fresh identifier.
    ///
    /// Uses UUIDv7 (time-ordered). Prefer passing ids explicitly in tests
    /// for determinism.
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_identifiers_are_rejected() {
        assert_eq!(
            DocumentId::new(""),
            Err(DomainError::InvalidId("DocumentId: empty".to_string()))
        );
        assert!("".parse::<PartitionKey>().is_err());
    }

    #[test]
    fn generated_ids_are_unique_and_non_empty() {
        let a = DocumentId::generate();
        let b = DocumentId::generate();
        assert!(!a.as_str().is_empty());
        assert_ne!(a, b);
    }

    #[test]
    fn deserialization_enforces_non_empty() {
        assert!(serde_json::from_value::<DocumentId>(serde_json::json!("")).is_err());
        assert!(serde_json::from_value::<PartitionKey>(serde_json::json!("")).is_err());
        let pk: PartitionKey = serde_json::from_value(serde_json::json!("t1")).unwrap();
        assert_eq!(pk.as_str(), "t1");
    }

    #[test]
    fn serializes_transparently() {
        let id: DocumentId = "doc-1".parse().unwrap();
        assert_eq!(serde_json::to_value(&id).unwrap(), serde_json::json!("doc-1"));
    }
}
