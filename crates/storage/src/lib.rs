//! Storage Layer
//!
//! Append-only history of completed analyses behind the `ResultStore` trait.

mod repository;

pub use repository::{AnalysisRecord, HistoryConfig, InMemoryResultStore, ResultStore};

use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Store error: {0}")]
    Backend(String),
}
