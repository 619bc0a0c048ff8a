use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use papaya::HashMap as PapayaHashMap;
use recordstore_core::{SharedClock, SystemClock};
use recordstore_storage::{Document, Filter, FindOptions};

use crate::query::{matches, sort_and_paginate};

pub type StorageKey = (String, String); // (collection, id)

pub(crate) fn make_storage_key(collection: &str, id: &str) -> StorageKey {
    (collection.to_string(), id.to_string())
}

/// A stored document plus its insertion sequence number.
#[derive(Debug, Clone)]
pub(crate) struct Entry {
    pub(crate) seq: u64,
    pub(crate) doc: Document,
}

/// In-memory document store using papaya lock-free HashMap.
///
/// This store provides:
/// - Lock-free concurrent access via papaya::HashMap
/// - Schema validation on insert and update
/// - Filtering, sorting and pagination for `find_many`
/// - Timestamps taken from an injected [`Clock`](recordstore_core::Clock)
pub struct InMemoryStore {
    /// Main storage using papaya for lock-free concurrent access
    pub(crate) data: Arc<PapayaHashMap<StorageKey, Entry>>,
    /// Atomic counter recording insertion order
    seq_counter: AtomicU64,
    /// Source of createdAt/updatedAt
    pub(crate) clock: SharedClock,
}

impl std::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("documents", &self.data.len())
            .field("clock", &self.clock)
            .finish()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    /// Creates a new in-memory store stamping documents with the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock::shared())
    }

    /// Creates a new in-memory store stamping documents with `clock`.
    pub fn with_clock(clock: SharedClock) -> Self {
        Self {
            data: Arc::new(PapayaHashMap::new()),
            seq_counter: AtomicU64::new(1),
            clock,
        }
    }

    /// Generates the next insertion sequence number.
    pub(crate) fn next_seq(&self) -> u64 {
        self.seq_counter.fetch_add(1, Ordering::SeqCst)
    }

    /// Number of documents in a collection.
    pub fn count(&self, collection: &str) -> usize {
        let guard = self.data.pin();
        guard
            .iter()
            .filter(|((name, _), _)| name == collection)
            .count()
    }

    /// Number of documents across all collections.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Finds the matching entry that was inserted first.
    pub(crate) fn first_match(&self, collection: &str, filter: &Filter) -> Option<Entry> {
        let guard = self.data.pin();

        if let Some(id) = &filter.id {
            return guard
                .get(&make_storage_key(collection, id))
                .filter(|entry| matches(filter, &entry.doc))
                .cloned();
        }

        guard
            .iter()
            .filter(|((name, _), entry)| name == collection && matches(filter, &entry.doc))
            .map(|(_, entry)| entry)
            .min_by_key(|entry| entry.seq)
            .cloned()
    }

    /// Runs a filtered, sorted, paginated scan of one collection.
    pub(crate) fn scan(&self, collection: &str, filter: &Filter, options: &FindOptions) -> Vec<Document> {
        let rows: Vec<(u64, Document)> = {
            let guard = self.data.pin();
            guard
                .iter()
                .filter(|((name, _), entry)| name == collection && matches(filter, &entry.doc))
                .map(|(_, entry)| (entry.seq, entry.doc.clone()))
                .collect()
        };

        sort_and_paginate(rows, options)
    }
}
