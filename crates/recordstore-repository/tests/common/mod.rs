//! Shared fixtures for accessor integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use recordstore_core::observability::init_tracing_with_level;
use recordstore_core::{ManualClock, RecordStoreConfig, SharedClock};
use recordstore_db_memory::InMemoryStore;
use recordstore_repository::{Record, Repository};
use recordstore_storage::{FieldKind, FieldRule, Schema};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

impl Task {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            status: None,
        }
    }
}

impl Record for Task {
    const COLLECTION: &'static str = "tasks";

    fn schema() -> Schema {
        Schema::new()
            .field(FieldRule::required("title", FieldKind::String))
            .field(FieldRule::optional("status", FieldKind::String).one_of(["open", "done"]))
    }
}

/// A task accessor over a fresh in-memory store, with store and accessor
/// sharing one manual clock.
pub struct Fixture {
    pub clock: Arc<ManualClock>,
    pub store: Arc<InMemoryStore>,
    pub tasks: Repository<Task>,
}

impl Fixture {
    pub fn at(now: OffsetDateTime) -> Self {
        Self::with_config(now, &RecordStoreConfig::default())
    }

    pub fn with_config(now: OffsetDateTime, config: &RecordStoreConfig) -> Self {
        init_tracing_with_level("debug");

        let clock = Arc::new(ManualClock::new(now));
        let shared: SharedClock = clock.clone();
        let store = Arc::new(InMemoryStore::with_clock(shared.clone()));
        let tasks = Repository::new(store.clone())
            .with_clock(shared)
            .with_config(config);

        Self {
            clock,
            store,
            tasks,
        }
    }

    /// Creates a task stamped at `at`.
    pub async fn task_at(&self, at: OffsetDateTime, title: &str) -> String {
        self.clock.set(at);
        self.tasks
            .create(&Task::new(title))
            .await
            .expect("create task")
            .id
    }

    pub fn titles(records: &[recordstore_repository::Stored<Task>]) -> Vec<&str> {
        records.iter().map(|r| r.record.title.as_str()).collect()
    }
}
