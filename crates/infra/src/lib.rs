//! Infrastructure layer: adapter boundary, configuration and the entity lifecycle.

pub mod adapter;
pub mod config;
pub mod document;
pub mod query;


pub use adapter::{AdapterError, ConnectAdapter, DocumentAdapter, InMemoryAdapter};
pub use config::{AdapterConfig, ConfigError};
pub use document::{
    AbortStage, Deserializer, Document, DocumentError, LifecycleHooks, NoHooks, WriteOutcome,
    serde_deserializer,
};
pub use query::{get_all, get_single};
