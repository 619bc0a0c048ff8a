//! # recordstore-repository
//!
//! Generic record accessor: create, list (today, by range, all), find,
//! update and delete records of any type implementing [`Record`].
//!
//! The accessor holds no data itself. Persistence, schema validation and
//! querying are delegated to an injected
//! [`DocumentStore`](recordstore_storage::DocumentStore); the current time
//! comes from an injected [`Clock`](recordstore_core::Clock).
//!
//! ## Example
//!
//! ```ignore
//! use recordstore_db_memory::create_store;
//! use recordstore_repository::{PageRequest, Repository};
//!
//! let tasks: Repository<Task> = Repository::new(create_store());
//! let created = tasks.create(&serde_json::json!({"title": "ship it"})).await?;
//! let today = tasks.list_today(PageRequest::first(20)).await?;
//! ```

mod error;
mod pagination;
mod record;
mod repository;

pub use error::{ErrorCategory, RangeBound, RepositoryError, RepositoryResult};
pub use pagination::PageRequest;
pub use record::{Record, Stored};
pub use repository::Repository;

pub use recordstore_core::{DayEnd, Period, TimeWindow};
