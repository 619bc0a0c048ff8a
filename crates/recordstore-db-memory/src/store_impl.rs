//! Implementation of the DocumentStore trait for InMemoryStore.

use async_trait::async_trait;
use papaya::{Compute, Operation};
use serde_json::Value;
use time::OffsetDateTime;

use recordstore_storage::{
    Collection, Document, DocumentStore, Filter, FindOptions, StorageError, UpdateOptions,
    split_insert_fields,
};

use crate::query::matches;
use crate::storage::{Entry, InMemoryStore, make_storage_key};

/// Why a single compute attempt in `find_one_and_update` did not write.
enum UpdateAbort {
    Gone,
    Rejected(StorageError),
}

impl InMemoryStore {
    /// Current clock instant at the millisecond precision documents keep.
    fn now(&self) -> Result<OffsetDateTime, StorageError> {
        let now = self.clock.now();
        now.replace_millisecond(now.millisecond())
            .map_err(|e| StorageError::internal(e.to_string()))
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn insert(
        &self,
        collection: &Collection,
        fields: &Value,
    ) -> Result<Document, StorageError> {
        let (id, fields) = split_insert_fields(fields)?;
        collection.schema.validate(&fields)?;

        let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
        let doc = Document::new(id.clone(), self.now()?, fields);
        let entry = Entry {
            seq: self.next_seq(),
            doc: doc.clone(),
        };

        let inserted = {
            let guard = self.data.pin();
            guard
                .try_insert(make_storage_key(&collection.name, &id), entry)
                .is_ok()
        };

        if !inserted {
            return Err(StorageError::already_exists(&collection.name, &id));
        }

        Ok(doc)
    }

    async fn find_many(
        &self,
        collection: &Collection,
        filter: &Filter,
        options: &FindOptions,
    ) -> Result<Vec<Document>, StorageError> {
        Ok(self.scan(&collection.name, filter, options))
    }

    async fn find_one(
        &self,
        collection: &Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StorageError> {
        Ok(self
            .first_match(&collection.name, filter)
            .map(|entry| entry.doc))
    }

    async fn find_one_and_update(
        &self,
        collection: &Collection,
        filter: &Filter,
        patch: &Value,
        options: &UpdateOptions,
    ) -> Result<Option<Document>, StorageError> {
        if !patch.is_object() {
            return Err(StorageError::validation("update must be a JSON object"));
        }

        let now = self.now()?;

        // Patch and validation run against the value held at write time.
        loop {
            let Some(current) = self.first_match(&collection.name, filter) else {
                return Ok(None);
            };
            let key = make_storage_key(&collection.name, &current.doc.id);

            let outcome = {
                let guard = self.data.pin();
                let computed = guard.compute(key, |existing| {
                    let Some((_, entry)) = existing else {
                        return Operation::Abort(UpdateAbort::Gone);
                    };
                    if !matches(filter, &entry.doc) {
                        return Operation::Abort(UpdateAbort::Gone);
                    }

                    let mut updated = entry.doc.clone();
                    if let Err(e) = updated.apply_patch(patch, now) {
                        return Operation::Abort(UpdateAbort::Rejected(e));
                    }
                    if options.run_validators
                        && let Err(e) = collection.schema.validate(&updated.fields)
                    {
                        return Operation::Abort(UpdateAbort::Rejected(e));
                    }

                    Operation::Insert(Entry {
                        seq: entry.seq,
                        doc: updated,
                    })
                });

                match computed {
                    Compute::Updated {
                        old: (_, old),
                        new: (_, new),
                    } => Ok(if options.return_new {
                        new.doc.clone()
                    } else {
                        old.doc.clone()
                    }),
                    Compute::Aborted(abort) => Err(abort),
                    Compute::Inserted(..) | Compute::Removed(..) => Err(UpdateAbort::Rejected(
                        StorageError::internal("update produced an insert or removal"),
                    )),
                }
            };

            match outcome {
                Ok(doc) => return Ok(Some(doc)),
                // Removed or changed since it was matched; look again.
                Err(UpdateAbort::Gone) => continue,
                Err(UpdateAbort::Rejected(e)) => return Err(e),
            }
        }
    }

    async fn find_one_and_remove(
        &self,
        collection: &Collection,
        filter: &Filter,
    ) -> Result<Option<Document>, StorageError> {
        let Some(current) = self.first_match(&collection.name, filter) else {
            return Ok(None);
        };

        let removed = {
            let guard = self.data.pin();
            guard
                .remove(&make_storage_key(&collection.name, &current.doc.id))
                .map(|entry| entry.doc.clone())
        };

        Ok(removed)
    }

    fn backend_name(&self) -> &'static str {
        "in-memory-papaya"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use recordstore_core::{ManualClock, TimeWindow};
    use recordstore_storage::{FieldKind, FieldRule, Schema, SortParam};
    use serde_json::json;
    use time::Duration;
    use time::macros::datetime;

    /// Helper to get a store as trait object to ensure we use DocumentStore methods
    fn as_document_store(store: &InMemoryStore) -> &dyn DocumentStore {
        store
    }

    fn tasks() -> Collection {
        Collection::new(
            "tasks",
            Schema::new()
                .field(FieldRule::required("title", FieldKind::String))
                .field(FieldRule::optional("status", FieldKind::String).one_of(["open", "done"])),
        )
    }

    fn store_at(now: OffsetDateTime) -> (InMemoryStore, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(now));
        (InMemoryStore::with_clock(clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let (store, _clock) = store_at(datetime!(2024-01-02 10:00:00.123456 UTC));
        let db = as_document_store(&store);

        let created = db
            .insert(&tasks(), &json!({"title": "write report"}))
            .await
            .unwrap();

        assert!(!created.id.is_empty());
        assert_eq!(created.created_at, datetime!(2024-01-02 10:00:00.123 UTC));
        assert_eq!(created.updated_at, created.created_at);
        assert_eq!(created.get("title"), Some(&json!("write report")));
        assert_eq!(store.count("tasks"), 1);
    }

    #[tokio::test]
    async fn test_insert_ignores_caller_timestamps_and_keeps_caller_id() {
        let (store, _clock) = store_at(datetime!(2024-01-02 10:00:00 UTC));
        let db = as_document_store(&store);

        let created = db
            .insert(
                &tasks(),
                &json!({"id": "t-1", "title": "a", "createdAt": "2000-01-01T00:00:00Z"}),
            )
            .await
            .unwrap();

        assert_eq!(created.id, "t-1");
        assert_eq!(created.created_at, datetime!(2024-01-02 10:00:00 UTC));
    }

    #[tokio::test]
    async fn test_insert_validation_and_conflict() {
        let store = InMemoryStore::new();
        let db = as_document_store(&store);

        let err = db.insert(&tasks(), &json!({"status": "open"})).await.unwrap_err();
        assert!(err.is_validation());
        assert!(store.is_empty());

        db.insert(&tasks(), &json!({"id": "fixed", "title": "a"}))
            .await
            .unwrap();
        let err = db
            .insert(&tasks(), &json!({"id": "fixed", "title": "b"}))
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn test_collections_are_isolated() {
        let store = InMemoryStore::new();
        let db = as_document_store(&store);
        let notes = Collection::schemaless("notes");

        db.insert(&tasks(), &json!({"id": "same", "title": "task"}))
            .await
            .unwrap();
        db.insert(&notes, &json!({"id": "same", "body": "note"}))
            .await
            .unwrap();

        assert_eq!(store.count("tasks"), 1);
        assert_eq!(store.count("notes"), 1);
        assert_eq!(store.len(), 2);

        let note = db.find_one(&notes, &Filter::by_id("same")).await.unwrap().unwrap();
        assert_eq!(note.get("body"), Some(&json!("note")));
    }

    #[tokio::test]
    async fn test_find_many_window_sort_and_pagination() {
        let (store, clock) = store_at(datetime!(2024-01-01 10:00:00 UTC));
        let db = as_document_store(&store);

        db.insert(&tasks(), &json!({"id": "jan1", "title": "a"})).await.unwrap();
        clock.set(datetime!(2024-01-02 10:00:00 UTC));
        db.insert(&tasks(), &json!({"id": "jan2-morning", "title": "b"})).await.unwrap();
        clock.set(datetime!(2024-01-02 23:00:00 UTC));
        db.insert(&tasks(), &json!({"id": "jan2-night", "title": "c"})).await.unwrap();

        let window = TimeWindow::new(
            datetime!(2024-01-02 00:00:00 UTC),
            datetime!(2024-01-03 00:00:00 UTC),
        )
        .unwrap();
        let options = FindOptions::new()
            .with_sort(SortParam::newest_first())
            .with_limit(10);
        let found = db
            .find_many(&tasks(), &Filter::created_within(window), &options)
            .await
            .unwrap();
        let ids: Vec<_> = found.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["jan2-night", "jan2-morning"]);

        let second_page = db
            .find_many(
                &tasks(),
                &Filter::all(),
                &options.clone().with_skip(2).with_limit(2),
            )
            .await
            .unwrap();
        let ids: Vec<_> = second_page.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, vec!["jan1"]);
    }

    #[tokio::test]
    async fn test_find_one_missing_is_none() {
        let store = InMemoryStore::new();
        let db = as_document_store(&store);
        assert!(db.find_one(&tasks(), &Filter::by_id("nope")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_one_and_update_returns_new_document() {
        let (store, clock) = store_at(datetime!(2024-01-02 10:00:00 UTC));
        let db = as_document_store(&store);
        let created = db
            .insert(&tasks(), &json!({"title": "a", "status": "open"}))
            .await
            .unwrap();

        clock.advance(Duration::minutes(5));
        let updated = db
            .find_one_and_update(
                &tasks(),
                &Filter::by_id(&created.id),
                &json!({"status": "done"}),
                &UpdateOptions::default(),
            )
            .await
            .unwrap()
            .unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.get("status"), Some(&json!("done")));
        assert_eq!(updated.get("title"), Some(&json!("a")));
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at, datetime!(2024-01-02 10:05:00 UTC));

        let stored = db
            .find_one(&tasks(), &Filter::by_id(&created.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored, updated);
    }

    #[tokio::test]
    async fn test_find_one_and_update_can_return_old_document() {
        let store = InMemoryStore::new();
        let db = as_document_store(&store);
        let created = db.insert(&tasks(), &json!({"title": "a"})).await.unwrap();

        let options = UpdateOptions {
            return_new: false,
            ..UpdateOptions::default()
        };
        let previous = db
            .find_one_and_update(&tasks(), &Filter::by_id(&created.id), &json!({"title": "b"}), &options)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(previous.get("title"), Some(&json!("a")));
    }

    #[tokio::test]
    async fn test_find_one_and_update_validates_merged_document() {
        let store = InMemoryStore::new();
        let db = as_document_store(&store);
        let created = db.insert(&tasks(), &json!({"title": "a"})).await.unwrap();
        let filter = Filter::by_id(&created.id);

        let err = db
            .find_one_and_update(&tasks(), &filter, &json!({"status": "blocked"}), &UpdateOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());

        let err = db
            .find_one_and_update(&tasks(), &filter, &json!({"title": null}), &UpdateOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());

        // Nothing was written.
        let stored = db.find_one(&tasks(), &filter).await.unwrap().unwrap();
        assert_eq!(stored, created);

        let unchecked = UpdateOptions {
            run_validators: false,
            ..UpdateOptions::default()
        };
        let forced = db
            .find_one_and_update(&tasks(), &filter, &json!({"status": "blocked"}), &unchecked)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(forced.get("status"), Some(&json!("blocked")));
    }

    #[tokio::test]
    async fn test_find_one_and_update_missing_is_none() {
        let store = InMemoryStore::new();
        let db = as_document_store(&store);
        let result = db
            .find_one_and_update(&tasks(), &Filter::by_id("nope"), &json!({"title": "x"}), &UpdateOptions::default())
            .await
            .unwrap();
        assert!(result.is_none());

        let err = db
            .find_one_and_update(&tasks(), &Filter::by_id("nope"), &json!("x"), &UpdateOptions::default())
            .await
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn test_find_one_and_remove() {
        let store = InMemoryStore::new();
        let db = as_document_store(&store);
        let created = db.insert(&tasks(), &json!({"title": "a"})).await.unwrap();
        let filter = Filter::by_id(&created.id);

        let removed = db.find_one_and_remove(&tasks(), &filter).await.unwrap();
        assert_eq!(removed, Some(created));
        assert!(db.find_one(&tasks(), &filter).await.unwrap().is_none());

        // Removing again is a no-op.
        assert!(db.find_one_and_remove(&tasks(), &filter).await.unwrap().is_none());
        assert_eq!(store.count("tasks"), 0);
    }

    #[tokio::test]
    async fn test_find_one_without_id_takes_first_inserted() {
        let (store, clock) = store_at(datetime!(2024-01-02 10:00:00 UTC));
        let db = as_document_store(&store);
        db.insert(&tasks(), &json!({"id": "first", "title": "a"})).await.unwrap();
        clock.advance(Duration::hours(1));
        db.insert(&tasks(), &json!({"id": "second", "title": "b"})).await.unwrap();

        let found = db.find_one(&tasks(), &Filter::all()).await.unwrap().unwrap();
        assert_eq!(found.id, "first");
    }

    #[tokio::test]
    async fn test_concurrent_inserts() {
        let store = Arc::new(InMemoryStore::new());
        let mut handles = Vec::new();

        for i in 0..16 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store
                    .insert(&tasks(), &json!({"title": format!("task {i}")}))
                    .await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(store.count("tasks"), 16);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_updates_keep_every_field() {
        let store = Arc::new(InMemoryStore::new());
        let writers = 8;

        for round in 0..200 {
            let id = format!("doc-{round}");
            store
                .insert(&tasks(), &json!({"id": id, "title": "shared"}))
                .await
                .unwrap();

            let barrier = Arc::new(tokio::sync::Barrier::new(writers));
            let mut handles = Vec::new();
            for k in 0..writers {
                let store = store.clone();
                let barrier = barrier.clone();
                let id = id.clone();
                handles.push(tokio::spawn(async move {
                    barrier.wait().await;
                    store
                        .find_one_and_update(
                            &tasks(),
                            &Filter::by_id(id),
                            &json!({ format!("f{k}"): k }),
                            &UpdateOptions::default(),
                        )
                        .await
                }));
            }
            for handle in handles {
                assert!(handle.await.unwrap().unwrap().is_some());
            }

            let doc = store
                .find_one(&tasks(), &Filter::by_id(&id))
                .await
                .unwrap()
                .unwrap();
            for k in 0..writers {
                assert_eq!(doc.get(&format!("f{k}")), Some(&json!(k)), "round {round}");
            }
        }
    }

    #[tokio::test]
    async fn test_update_racing_remove_reports_missing() {
        let store = Arc::new(InMemoryStore::new());
        let created = store.insert(&tasks(), &json!({"title": "a"})).await.unwrap();
        let filter = Filter::by_id(&created.id);

        store.find_one_and_remove(&tasks(), &filter).await.unwrap();
        let result = store
            .find_one_and_update(&tasks(), &filter, &json!({"title": "b"}), &UpdateOptions::default())
            .await
            .unwrap();
        assert!(result.is_none());
        assert_eq!(store.count("tasks"), 0);
    }

    #[tokio::test]
    async fn test_backend_name() {
        let store = InMemoryStore::new();
        assert_eq!(store.backend_name(), "in-memory-papaya");
    }
}
