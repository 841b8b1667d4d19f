//! Query helpers that materialize documents from a query result.

use tracing::debug;

use docmapper_core::{Durable, Location, Query};

use crate::adapter::DocumentAdapter;
use crate::document::{Deserializer, Document, DocumentError};

/// Run `query` and materialize the first record, or `None` when nothing matched.
pub async fn get_single<A, D>(
    adapter: &D,
    query: &Query,
    location: &Location,
    deserializer: Deserializer<A>,
) -> Result<Option<Document<A>>, DocumentError>
where
    A: Durable + Send + Sync + 'static,
    D: DocumentAdapter + ?Sized,
{
    let feed = adapter
        .execute(location.database(), location.container(), query)
        .await?;
    debug!(location = %location, matched = feed.resources.len(), "get_single");

    feed.resources
        .first()
        .map(|record| Document::from_record(location.clone(), record, deserializer))
        .transpose()
}

/// Run `query` and materialize every record, in the order the adapter returned them.
///
/// Zero matches is an empty vector, not an error.
pub async fn get_all<A, D>(
    adapter: &D,
    query: &Query,
    location: &Location,
    deserializer: Deserializer<A>,
) -> Result<Vec<Document<A>>, DocumentError>
where
    A: Durable + Send + Sync + 'static,
    D: DocumentAdapter + ?Sized,
{
    let feed = adapter
        .execute(location.database(), location.container(), query)
        .await?;
    debug!(location = %location, matched = feed.resources.len(), "get_all");

    feed.resources
        .iter()
        .map(|record| Document::from_record(location.clone(), record, deserializer.clone()))
        .collect()
}
