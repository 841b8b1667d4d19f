//! Lifecycle hook protocol.
//!
//! Hooks gate or observe the write path. Every method has a default, so an
//! implementation overrides only what it needs. Hooks may perform their own
//! I/O; `Document::write` awaits each one before moving on, so no two hooks of
//! the same operation ever run concurrently.

use async_trait::async_trait;

use docmapper_core::Record;

use super::Document;

#[async_trait]
pub trait LifecycleHooks<A>: Send + Sync
where
    A: Send + Sync + 'static,
{
    /// Runs before any write attempt. Returning `false` aborts the whole write.
    async fn on_before_write(&self, _document: &Document<A>) -> bool {
        true
    }

    /// Runs before a create, once `on_before_write` passed. `false` aborts the create.
    async fn on_before_create(&self, _document: &Document<A>) -> bool {
        true
    }

    /// Observes a successful create. `document` already carries the assigned id.
    async fn on_created(&self, _document: &Document<A>, _response: &Record) {}

    /// Runs before a replace, once `on_before_write` passed. `false` aborts the update.
    async fn on_before_update(&self, _document: &Document<A>) -> bool {
        true
    }

    /// Observes a successful replace.
    async fn on_updated(&self, _document: &Document<A>, _response: &Record) {}
}

/// Hooks that let every transition through.
#[derive(Debug, Copy, Clone, Default)]
pub struct NoHooks;

impl<A> LifecycleHooks<A> for NoHooks where A: Send + Sync + 'static {}
