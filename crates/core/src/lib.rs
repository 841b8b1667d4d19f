//! `docmapper-core` — building blocks of the document mapper.
//!
//! This crate contains **pure** primitives (identifiers, records, locations,
//! query building). All I/O lives in `docmapper-infra`.

pub mod error;
pub mod id;
pub mod location;
pub mod query;
pub mod record;

pub use error::{DomainError, DomainResult};
pub use id::{DocumentId, PartitionKey};
pub use location::Location;
pub use query::{Query, QueryParameter, QuerySpec, SortOrder};
pub use record::{Durable, Record};
