//! Storage abstraction and the write-through hook.
//!
//! Operation executors can mirror API results into caller-supplied storage.
//! The remote provider is the source of truth; the local copy is a
//! best-effort cache, so insert failures are logged and swallowed here and
//! never downgrade the parent operation.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use crate::logging::targets;

/// Storage-layer errors surfaced by [`Table::insert`].
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("insert into {table} failed: {message}")]
    Insert { table: String, message: String },

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// One insert-capable table.
#[async_trait]
pub trait Table: Send + Sync {
    async fn insert(&self, row: Value) -> Result<(), StorageError>;
}

/// A named collection of tables. Absent tables are a valid, skipped state.
pub trait Storage: Send + Sync {
    fn table(&self, name: &str) -> Option<&dyn Table>;
}

/// Best-effort persistence of an operation result.
///
/// `transform` runs only when the table exists, so executors can defer row
/// construction. This is the one place that discards a storage error: the
/// insert result is inspected, logged on failure, and deliberately dropped —
/// persistence never fails the operation that produced the data.
pub async fn run_write_through<F>(storage: Option<&dyn Storage>, table_name: &str, transform: F)
where
    F: FnOnce() -> Value,
{
    let Some(storage) = storage else {
        return;
    };
    let Some(table) = storage.table(table_name) else {
        debug!(target: targets::STORAGE, table = %table_name, "no such table, skipping write-through");
        return;
    };

    let row = transform();
    if let Err(err) = table.insert(row).await {
        warn!(
            target: targets::STORAGE,
            table = %table_name,
            error = %err,
            "write-through insert failed; operation result unaffected"
        );
    }
}
