//! The path-keyed mutation buffer.
//!
//! [`MutationBuffer`] holds features in memory, grouped by the tree path
//! they are destined for, and flushes each path as one batch into a
//! [`WorkingTree`]. Once more than `flush_threshold` features are pending,
//! the next `put` flushes every path before returning.
//!
//! A flush resolves every schema first, so a store failure is reported
//! before the working tree sees any mutation. The mutations themselves are
//! built lazily while the tree consumes the sequence.
//!
//! The buffer is single-owner: it takes `&mut self` throughout and has no
//! internal locking.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use geovc_store::{ObjectStore, RevFeature, StoreResult};
use geovc_types::{append_child, Feature, ObjectId, SimpleFeature};
use geovc_worktree::{Mutation, NullProgress, ProgressListener, WorkingTree};
use itertools::Itertools;
use tracing::{debug, info, warn};

use crate::config::BufferConfig;
use crate::error::{IngestError, IngestResult};
use crate::schema_cache::SchemaCache;

/// A buffered feature whose schema has been stored.
enum Resolved<'a> {
    Insert(&'a SimpleFeature, ObjectId),
    Delete(&'a str),
}

impl Resolved<'_> {
    fn into_mutation(self, tree_path: &str) -> Mutation {
        match self {
            Self::Insert(feature, schema_id) => Mutation::insert(
                append_child(tree_path, feature.id()),
                RevFeature::build(feature),
                schema_id,
            ),
            Self::Delete(id) => Mutation::delete(append_child(tree_path, id)),
        }
    }
}

/// Buffers features by tree path and flushes them into a working tree.
pub struct MutationBuffer<W: WorkingTree> {
    sink: W,
    store: Arc<dyn ObjectStore>,
    config: BufferConfig,
    pending: BTreeMap<String, Vec<Feature>>,
    count: usize,
    flushed: u64,
    progress: Arc<dyn ProgressListener>,
}

impl<W: WorkingTree> MutationBuffer<W> {
    /// Create a buffer with the default flush threshold.
    pub fn new(sink: W, store: Arc<dyn ObjectStore>) -> Self {
        Self::with_config(sink, store, BufferConfig::default())
    }

    pub fn with_config(sink: W, store: Arc<dyn ObjectStore>, config: BufferConfig) -> Self {
        Self {
            sink,
            store,
            config,
            pending: BTreeMap::new(),
            count: 0,
            flushed: 0,
            progress: Arc::new(NullProgress),
        }
    }

    /// Report sink progress to `listener` instead of discarding it.
    pub fn with_progress(mut self, listener: Arc<dyn ProgressListener>) -> Self {
        self.progress = listener;
        self
    }

    pub fn config(&self) -> &BufferConfig {
        &self.config
    }

    /// Total features currently buffered.
    pub fn pending(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Tree paths with buffered features.
    pub fn buffered_paths(&self) -> impl Iterator<Item = &str> {
        self.pending.keys().map(String::as_str)
    }

    /// Number of features buffered under `path`.
    pub fn buffered(&self, path: &str) -> usize {
        self.pending.get(path).map_or(0, Vec::len)
    }

    /// Features flushed successfully over the buffer's lifetime.
    pub fn flushed_total(&self) -> u64 {
        self.flushed
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Buffer `feature` under the tree `path`.
    ///
    /// Buffering itself cannot fail. If this pushes the pending count over
    /// the flush threshold, every buffered path is flushed before returning;
    /// a failure there comes back as [`IngestError::AutoFlush`], with the
    /// feature already buffered.
    pub fn put(&mut self, path: impl Into<String>, feature: impl Into<Feature>) -> IngestResult<()> {
        self.pending.entry(path.into()).or_default().push(feature.into());
        self.count += 1;

        if self.count > self.config.flush_threshold {
            info!(
                pending = self.count,
                threshold = self.config.flush_threshold,
                "flush threshold exceeded, flushing all paths"
            );
            self.flush_all().map_err(|source| IngestError::AutoFlush {
                pending: self.count,
                source: Box::new(source),
            })?;
        }
        Ok(())
    }

    /// Flush the features buffered under `path` as one batch.
    ///
    /// Returns the number of features flushed; an unknown path is a no-op.
    /// On error the features stay buffered.
    pub fn flush(&mut self, path: &str) -> IngestResult<usize> {
        let store = Arc::clone(&self.store);
        let mut cache = SchemaCache::new(store.as_ref());
        self.flush_path(path, &mut cache)
    }

    /// Flush every buffered path, sharing one schema cache across them.
    ///
    /// Paths flushed before an error stay flushed; the failing path and
    /// any not yet reached stay buffered.
    pub fn flush_all(&mut self) -> IngestResult<usize> {
        if self.pending.is_empty() {
            return Ok(0);
        }
        let start = Instant::now();
        let store = Arc::clone(&self.store);
        let mut cache = SchemaCache::new(store.as_ref());

        let paths = self.pending.keys().cloned().collect_vec();
        let mut total = 0;
        for path in &paths {
            total += self.flush_path(path, &mut cache)?;
        }

        self.pending.clear();
        self.count = 0;
        info!(
            paths = paths.len(),
            features = total,
            schemas = cache.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "all paths flushed"
        );
        Ok(total)
    }

    /// Flush everything and hand back the working tree.
    pub fn into_inner(mut self) -> IngestResult<W> {
        self.flush_all()?;
        Ok(self.sink)
    }

    fn flush_path(&mut self, path: &str, cache: &mut SchemaCache<'_>) -> IngestResult<usize> {
        let Some(features) = self.pending.get(path) else {
            return Ok(0);
        };
        let start = Instant::now();
        let count = features.len();

        let resolved = features
            .iter()
            .map(|feature| match feature {
                Feature::Simple(simple) => {
                    cache.resolve(simple.schema()).map(|id| Resolved::Insert(simple, id))
                }
                Feature::Tombstone(tombstone) => Ok(Resolved::Delete(tombstone.id())),
            })
            .collect::<StoreResult<Vec<_>>>()?;

        let mut mutations = resolved.into_iter().map(|r| r.into_mutation(path));
        let outcome = self.sink.insert(&mut mutations, self.progress.as_ref());
        drop(mutations);
        if let Err(source) = outcome {
            warn!(path, count, error = %source, "working tree rejected batch");
            return Err(IngestError::Sink {
                path: path.to_string(),
                source,
            });
        }

        self.pending.remove(path);
        self.count -= count;
        self.flushed += count as u64;
        debug!(
            path,
            count,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "path flushed"
        );
        Ok(count)
    }
}

impl<W: WorkingTree> std::fmt::Debug for MutationBuffer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MutationBuffer")
            .field("paths", &self.pending.len())
            .field("pending", &self.count)
            .field("flushed", &self.flushed)
            .field("config", &self.config)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use geovc_store::{
        MemoryEnvironment, RevObject, StorageFormat, StoreError, StoreOptions,
        VersionedObjectStore,
    };
    use geovc_types::{PropertyDescriptor, PropertyType, PropertyValue, Schema};
    use geovc_worktree::{CountingProgress, InMemoryWorkingTree, WorktreeError, WorktreeResult};

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Wraps a store and counts the objects put through it, by kind.
    struct CountingStore {
        inner: VersionedObjectStore<MemoryEnvironment>,
        schema_puts: AtomicUsize,
        feature_puts: AtomicUsize,
    }

    impl CountingStore {
        fn new(read_only: bool) -> Arc<Self> {
            let options = StoreOptions {
                format: StorageFormat::V0_1,
                read_only,
            };
            Arc::new(Self {
                inner: VersionedObjectStore::open_with(MemoryEnvironment::new(), options).unwrap(),
                schema_puts: AtomicUsize::new(0),
                feature_puts: AtomicUsize::new(0),
            })
        }

        fn schema_puts(&self) -> usize {
            self.schema_puts.load(Ordering::SeqCst)
        }
    }

    impl ObjectStore for CountingStore {
        fn put(&self, object: &RevObject) -> StoreResult<ObjectId> {
            match object {
                RevObject::Schema(_) => self.schema_puts.fetch_add(1, Ordering::SeqCst),
                RevObject::Feature(_) => self.feature_puts.fetch_add(1, Ordering::SeqCst),
            };
            self.inner.put(object)
        }

        fn get_if_present(&self, id: &ObjectId) -> StoreResult<Option<RevObject>> {
            self.inner.get_if_present(id)
        }

        fn exists(&self, id: &ObjectId) -> StoreResult<bool> {
            self.inner.exists(id)
        }

        fn is_read_only(&self) -> bool {
            self.inner.is_read_only()
        }
    }

    /// Records every batch; fails any batch touching a path under `fail_under`.
    #[derive(Default)]
    struct RecordingSink {
        batches: Vec<Vec<Mutation>>,
        fail_under: Option<String>,
    }

    impl RecordingSink {
        fn failing_under(prefix: &str) -> Self {
            Self {
                batches: Vec::new(),
                fail_under: Some(prefix.to_string()),
            }
        }

        fn all(&self) -> Vec<&Mutation> {
            self.batches.iter().flatten().collect()
        }
    }

    impl WorkingTree for RecordingSink {
        fn insert(
            &mut self,
            mutations: &mut dyn Iterator<Item = Mutation>,
            progress: &dyn ProgressListener,
        ) -> WorktreeResult<usize> {
            progress.started();
            let mut batch = Vec::new();
            for mutation in mutations {
                if let Some(prefix) = &self.fail_under {
                    if mutation.path().starts_with(prefix.as_str()) {
                        return Err(WorktreeError::Rejected {
                            applied: batch.len(),
                            reason: "injected failure".into(),
                        });
                    }
                }
                batch.push(mutation);
                progress.progress(batch.len());
            }
            progress.completed();
            let applied = batch.len();
            self.batches.push(batch);
            Ok(applied)
        }
    }

    /// Counts mutations without keeping them.
    #[derive(Default)]
    struct CountingSink {
        calls: usize,
        mutations: usize,
    }

    impl WorkingTree for CountingSink {
        fn insert(
            &mut self,
            mutations: &mut dyn Iterator<Item = Mutation>,
            _progress: &dyn ProgressListener,
        ) -> WorktreeResult<usize> {
            self.calls += 1;
            let n = mutations.count();
            self.mutations += n;
            Ok(n)
        }
    }

    // -----------------------------------------------------------------------
    // Fixtures
    // -----------------------------------------------------------------------

    fn schema(name: &str) -> Arc<Schema> {
        Arc::new(
            Schema::new(
                name,
                vec![
                    PropertyDescriptor::required("geom", PropertyType::Geometry),
                    PropertyDescriptor::new("name", PropertyType::String),
                ],
            )
            .unwrap(),
        )
    }

    fn feature(id: &str, schema: &Arc<Schema>) -> SimpleFeature {
        SimpleFeature::new(id, Arc::clone(schema))
            .unwrap()
            .with("geom", PropertyValue::Geometry(format!("POINT ({id} 0)")))
            .unwrap()
    }

    fn tombstone(id: &str) -> Feature {
        Feature::tombstone(id).unwrap()
    }

    fn buffer_with(
        sink: RecordingSink,
        store: &Arc<CountingStore>,
        threshold: usize,
    ) -> MutationBuffer<RecordingSink> {
        let store: Arc<dyn ObjectStore> = store.clone();
        MutationBuffer::with_config(sink, store, BufferConfig::with_threshold(threshold))
    }

    fn buffer(store: &Arc<CountingStore>) -> MutationBuffer<RecordingSink> {
        buffer_with(RecordingSink::default(), store, 100_000)
    }

    // -----------------------------------------------------------------------
    // put / pending count
    // -----------------------------------------------------------------------

    #[test]
    fn put_tracks_pending_count() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);
        let s = schema("roads");

        buf.put("trees/roads", feature("a", &s)).unwrap();
        buf.put("trees/roads", feature("b", &s)).unwrap();
        buf.put("trees/rivers", tombstone("r")).unwrap();

        assert_eq!(buf.pending(), 3);
        assert_eq!(buf.buffered("trees/roads"), 2);
        assert_eq!(buf.buffered("trees/rivers"), 1);
        assert_eq!(
            buf.buffered_paths().collect::<Vec<_>>(),
            vec!["trees/rivers", "trees/roads"]
        );
        assert!(buf.sink().batches.is_empty());
        assert_eq!(store.schema_puts(), 0);
    }

    #[test]
    fn put_buffers_features_with_unset_properties() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);
        let bare = SimpleFeature::new("a", schema("roads")).unwrap();

        buf.put("trees/roads", bare).unwrap();
        assert_eq!(buf.pending(), 1);
        assert_eq!(buf.flush("trees/roads").unwrap(), 1);

        let sink = buf.sink();
        match sink.all()[0] {
            Mutation::Insert { feature, .. } => {
                assert_eq!(feature.values, vec![PropertyValue::Null, PropertyValue::Null]);
            }
            other => panic!("expected insert, got {other:?}"),
        }
    }

    // -----------------------------------------------------------------------
    // flush(path)
    // -----------------------------------------------------------------------

    #[test]
    fn flush_shared_schema_stored_once() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);
        let s = schema("roads");

        buf.put("trees/roads", feature("a", &s)).unwrap();
        buf.put("trees/roads", feature("b", &s)).unwrap();
        assert_eq!(buf.flush("trees/roads").unwrap(), 2);

        let sink = buf.sink();
        assert_eq!(sink.batches.len(), 1);
        let batch = &sink.batches[0];
        assert_eq!(batch.len(), 2);
        assert!(batch.iter().all(|m| !m.is_delete()));
        assert_eq!(batch[0].schema_id(), batch[1].schema_id());
        assert_eq!(store.schema_puts(), 1);

        let schema_id = batch[0].schema_id().unwrap();
        assert_eq!(store.get_schema(schema_id).unwrap(), *s);
        assert_eq!(buf.pending(), 0);
        assert_eq!(buf.flushed_total(), 2);
    }

    #[test]
    fn flush_tombstone_produces_delete_without_schema_lookup() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);

        buf.put("trees/roads", tombstone("x")).unwrap();
        buf.flush("trees/roads").unwrap();

        let all = buf.sink().all();
        assert_eq!(all, vec![&Mutation::delete("trees/roads/x")]);
        assert_eq!(store.schema_puts(), 0);
    }

    #[test]
    fn flush_builds_insert_paths_and_payloads() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);
        let s = schema("roads");

        buf.put("trees/roads/", feature("7", &s)).unwrap();
        buf.flush("trees/roads/").unwrap();

        match buf.sink().all()[0] {
            Mutation::Insert { path, feature, .. } => {
                assert_eq!(path, "trees/roads/7");
                assert_eq!(
                    feature.values,
                    vec![PropertyValue::Geometry("POINT (7 0)".into()), PropertyValue::Null]
                );
            }
            other => panic!("expected insert, got {other:?}"),
        }
    }

    #[test]
    fn flush_preserves_insertion_order() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);
        let s = schema("roads");

        for id in ["c", "a", "b"] {
            buf.put("roads", feature(id, &s)).unwrap();
        }
        buf.put("roads", tombstone("a")).unwrap();
        buf.flush("roads").unwrap();

        let paths: Vec<_> = buf.sink().all().iter().map(|m| m.path().to_string()).collect();
        assert_eq!(paths, vec!["roads/c", "roads/a", "roads/b", "roads/a"]);
        assert!(buf.sink().all()[3].is_delete());
    }

    #[test]
    fn flush_unknown_path_is_noop() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);
        buf.put("roads", tombstone("x")).unwrap();

        assert_eq!(buf.flush("rivers").unwrap(), 0);
        assert!(buf.sink().batches.is_empty());
        assert_eq!(buf.pending(), 1);
    }

    #[test]
    fn flush_leaves_other_paths_buffered() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);
        buf.put("roads", tombstone("x")).unwrap();
        buf.put("rivers", tombstone("y")).unwrap();

        buf.flush("roads").unwrap();
        assert_eq!(buf.pending(), 1);
        assert_eq!(buf.buffered_paths().collect::<Vec<_>>(), vec!["rivers"]);
    }

    #[test]
    fn sink_failure_keeps_entries_for_retry() {
        let store = CountingStore::new(false);
        let mut buf = buffer_with(RecordingSink::failing_under("roads/"), &store, 100_000);
        let s = schema("roads");
        buf.put("roads", feature("a", &s)).unwrap();
        buf.put("roads", feature("b", &s)).unwrap();

        let err = buf.flush("roads").unwrap_err();
        assert!(matches!(
            err,
            IngestError::Sink { ref path, source: WorktreeError::Rejected { applied: 0, .. } }
                if path == "roads"
        ));
        assert_eq!(buf.pending(), 2);
        assert_eq!(buf.buffered("roads"), 2);
        assert_eq!(buf.flushed_total(), 0);
        // The schema written before the failure stays in the store.
        assert_eq!(store.schema_puts(), 1);

        buf.sink_mut().fail_under = None;
        assert_eq!(buf.flush("roads").unwrap(), 2);
        assert!(buf.is_empty());
        assert_eq!(buf.sink().all().len(), 2);
    }

    #[test]
    fn store_failure_is_reported_before_sink_sees_anything() {
        let store = CountingStore::new(true);
        let mut buf = buffer(&store);
        buf.put("roads", feature("a", &schema("roads"))).unwrap();

        let err = buf.flush("roads").unwrap_err();
        assert!(matches!(
            err,
            IngestError::Store(StoreError::PermissionDenied(_))
        ));
        assert!(buf.sink().batches.is_empty());
        assert_eq!(buf.pending(), 1);
    }

    // -----------------------------------------------------------------------
    // flush_all
    // -----------------------------------------------------------------------

    #[test]
    fn flush_all_emits_one_mutation_per_feature() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);
        let roads = schema("roads");
        let rivers = schema("rivers");

        for i in 0..20 {
            buf.put("roads", feature(&format!("r{i}"), &roads)).unwrap();
            buf.put("rivers", feature(&format!("w{i}"), &rivers)).unwrap();
        }
        buf.put("roads", tombstone("gone")).unwrap();

        assert_eq!(buf.flush_all().unwrap(), 41);
        assert_eq!(buf.pending(), 0);
        assert!(buf.is_empty());
        assert_eq!(buf.sink().batches.len(), 2);
        assert_eq!(buf.sink().all().len(), 41);
    }

    #[test]
    fn flush_all_stores_each_distinct_schema_once() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);
        let schemas = [schema("a"), schema("b"), schema("c")];

        // Equal schemas behind distinct Arcs count as one.
        for i in 0..300 {
            let s = Arc::new(Schema::clone(&schemas[i % 3]));
            buf.put(format!("tree{}", i % 7), feature(&i.to_string(), &s)).unwrap();
        }
        buf.flush_all().unwrap();

        assert_eq!(store.schema_puts(), 3);
        assert_eq!(buf.sink().all().len(), 300);
    }

    #[test]
    fn schema_cache_does_not_outlive_a_cycle() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);
        let s = schema("roads");

        buf.put("roads", feature("a", &s)).unwrap();
        buf.flush_all().unwrap();
        buf.put("roads", feature("b", &s)).unwrap();
        buf.flush_all().unwrap();

        assert_eq!(store.schema_puts(), 2);
        let all = buf.sink().all();
        assert_eq!(all[0].schema_id(), all[1].schema_id());
    }

    #[test]
    fn flush_all_stops_at_failing_path() {
        let store = CountingStore::new(false);
        let mut buf = buffer_with(RecordingSink::failing_under("b/"), &store, 100_000);
        buf.put("a", tombstone("1")).unwrap();
        buf.put("b", tombstone("2")).unwrap();
        buf.put("b", tombstone("3")).unwrap();
        buf.put("c", tombstone("4")).unwrap();

        assert!(matches!(buf.flush_all(), Err(IngestError::Sink { .. })));
        assert_eq!(buf.pending(), 3);
        assert_eq!(buf.buffered_paths().collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(buf.flushed_total(), 1);
    }

    #[test]
    fn flush_all_on_empty_buffer_does_not_call_sink() {
        let store = CountingStore::new(false);
        let mut buf = buffer(&store);
        assert_eq!(buf.flush_all().unwrap(), 0);
        assert!(buf.sink().batches.is_empty());
    }

    // -----------------------------------------------------------------------
    // Automatic flush
    // -----------------------------------------------------------------------

    #[test]
    fn exceeding_threshold_flushes_all_paths() {
        let store = CountingStore::new(false);
        let mut buf = buffer_with(RecordingSink::default(), &store, 10);

        for i in 0..10 {
            buf.put(format!("tree{}", i % 3), tombstone(&i.to_string())).unwrap();
        }
        assert_eq!(buf.pending(), 10);
        assert!(buf.sink().batches.is_empty());

        buf.put("other", tombstone("x")).unwrap();
        assert_eq!(buf.pending(), 0);
        assert_eq!(buf.sink().batches.len(), 4);
        assert_eq!(buf.sink().all().len(), 11);

        buf.put("other", tombstone("y")).unwrap();
        assert_eq!(buf.pending(), 1);
    }

    #[test]
    fn default_threshold_is_one_hundred_thousand() {
        let store: Arc<dyn ObjectStore> = CountingStore::new(false);
        let mut buf = MutationBuffer::new(CountingSink::default(), store);

        for i in 0..100_000 {
            buf.put(format!("t{}", i % 4), tombstone(&i.to_string())).unwrap();
        }
        assert_eq!(buf.pending(), 100_000);
        assert_eq!(buf.sink().calls, 0);

        buf.put("t0", tombstone("last")).unwrap();
        assert_eq!(buf.pending(), 0);
        assert_eq!(buf.sink().mutations, 100_001);
        assert_eq!(buf.flushed_total(), 100_001);
    }

    #[test]
    fn automatic_flush_failure_surfaces_from_put() {
        let store = CountingStore::new(false);
        let mut buf = buffer_with(RecordingSink::failing_under("bad/"), &store, 1);
        buf.put("bad", tombstone("1")).unwrap();

        let err = buf.put("bad", tombstone("2")).unwrap_err();
        match err {
            IngestError::AutoFlush { pending, source } => {
                assert_eq!(pending, 2);
                assert!(matches!(*source, IngestError::Sink { ref path, .. } if path == "bad"));
            }
            other => panic!("expected auto flush error, got {other:?}"),
        }
        assert_eq!(buf.pending(), 2);
        assert_eq!(buf.buffered("bad"), 2);
    }

    #[test]
    fn feature_accepted_before_failed_automatic_flush_is_emitted_once() {
        let store = CountingStore::new(false);
        let mut buf = buffer_with(RecordingSink::failing_under("bad/"), &store, 1);
        buf.put("bad", tombstone("a")).unwrap();
        assert!(matches!(
            buf.put("bad", tombstone("b")),
            Err(IngestError::AutoFlush { .. })
        ));

        buf.sink_mut().fail_under = None;
        assert_eq!(buf.flush_all().unwrap(), 2);
        assert_eq!(buf.flushed_total(), 2);
        assert!(buf.is_empty());

        let paths: Vec<&str> = buf.sink().all().into_iter().map(Mutation::path).collect();
        assert_eq!(paths, vec!["bad/a", "bad/b"]);
    }

    // -----------------------------------------------------------------------
    // Progress and working tree integration
    // -----------------------------------------------------------------------

    #[test]
    fn progress_listener_sees_each_batch() {
        let store = CountingStore::new(false);
        let listener = Arc::new(CountingProgress::new());
        let mut buf = buffer(&store).with_progress(listener.clone());

        buf.put("a", tombstone("1")).unwrap();
        buf.put("b", tombstone("2")).unwrap();
        buf.put("b", tombstone("3")).unwrap();
        buf.flush_all().unwrap();

        assert_eq!(listener.batches(), 2);
        assert_eq!(listener.completed_batches(), 2);
        assert_eq!(listener.processed(), 3);
    }

    #[test]
    fn into_inner_flushes_into_working_tree() {
        let store = CountingStore::new(false);
        let shared: Arc<dyn ObjectStore> = store.clone();
        let tree = InMemoryWorkingTree::new(Arc::clone(&shared));
        let mut buf = MutationBuffer::new(tree, shared);
        let s = schema("roads");

        buf.put("trees/roads", feature("1", &s)).unwrap();
        buf.put("trees/roads", feature("2", &s)).unwrap();
        buf.put("trees/rivers", feature("3", &s)).unwrap();
        buf.put("trees/roads", tombstone("1")).unwrap();

        let tree = buf.into_inner().unwrap();
        assert_eq!(store.feature_puts.load(Ordering::SeqCst), 3);
        assert_eq!(tree.paths().collect::<Vec<_>>(), vec!["trees/rivers/3", "trees/roads/2"]);
        assert_eq!(store.schema_puts(), 1);

        let node = tree.get("trees/roads/2").unwrap();
        assert_eq!(store.get_schema(&node.schema_id).unwrap(), *s);
    }

    #[test]
    fn debug_format() {
        let store = CountingStore::new(false);
        let debug = format!("{:?}", buffer(&store));
        assert!(debug.contains("MutationBuffer"));
        assert!(debug.contains("pending"));
    }
}
