//! Per-flush schema deduplication.

use std::collections::HashMap;
use std::sync::Arc;

use geovc_store::{ObjectStore, RevObject, StoreResult};
use geovc_types::{ObjectId, Schema};
use tracing::debug;

/// Maps each distinct schema to its stored object id.
///
/// Schemas are compared by value, so two `Arc`s holding equal schemas share
/// one entry. A cache lives for exactly one flush cycle; create a new one
/// for each cycle so that ids are never carried between batches.
pub struct SchemaCache<'s> {
    store: &'s dyn ObjectStore,
    ids: HashMap<Arc<Schema>, ObjectId>,
}

impl<'s> SchemaCache<'s> {
    pub fn new(store: &'s dyn ObjectStore) -> Self {
        Self {
            store,
            ids: HashMap::new(),
        }
    }

    /// The stored id of `schema`, storing it on first sight.
    pub fn resolve(&mut self, schema: &Arc<Schema>) -> StoreResult<ObjectId> {
        if let Some(id) = self.ids.get(schema) {
            return Ok(*id);
        }
        let id = self.store.put(&RevObject::Schema(Schema::clone(schema)))?;
        debug!(schema = schema.name(), id = %id.short_hex(), "schema stored");
        self.ids.insert(Arc::clone(schema), id);
        Ok(id)
    }

    /// Number of distinct schemas resolved so far.
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl std::fmt::Debug for SchemaCache<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SchemaCache")
            .field("schemas", &self.ids.len())
            .finish()
    }
}
