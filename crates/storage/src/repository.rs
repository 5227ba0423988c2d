//! Result Store Implementation

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::StorageError;

/// One completed analysis in the history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub fingerprint: String,
    pub video_id: String,
    pub user_id: Option<String>,
    pub movement: String,
    pub overall_score: u8,
    pub error_count: usize,
    pub created_at: DateTime<Utc>,
}

impl AnalysisRecord {
    /// New record stamped with a fresh id and the current time
    pub fn new(
        fingerprint: impl Into<String>,
        video_id: impl Into<String>,
        user_id: Option<String>,
        movement: impl Into<String>,
        overall_score: u8,
        error_count: usize,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            fingerprint: fingerprint.into(),
            video_id: video_id.into(),
            user_id,
            movement: movement.into(),
            overall_score,
            error_count,
            created_at: Utc::now(),
        }
    }
}

/// History retention
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Records kept before the oldest are dropped
    pub retention: usize,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self { retention: 1000 }
    }
}

/// Append-only analysis history
#[async_trait]
pub trait ResultStore: Send + Sync {
    async fn append(&self, record: AnalysisRecord) -> Result<(), StorageError>;

    /// Most recent first
    async fn list_recent(&self, limit: usize) -> Result<Vec<AnalysisRecord>, StorageError>;

    /// Most recent first, restricted to one video
    async fn list_for_video(&self, video_id: &str, limit: usize) -> Result<Vec<AnalysisRecord>, StorageError>;

    async fn count(&self) -> Result<usize, StorageError>;
}

/// In-memory store with bounded retention
pub struct InMemoryResultStore {
    records: Mutex<VecDeque<AnalysisRecord>>,
    retention: usize,
}

impl InMemoryResultStore {
    pub fn new(config: HistoryConfig) -> Self {
        info!("Creating in-memory result store (retention {})", config.retention);
        Self {
            records: Mutex::new(VecDeque::with_capacity(config.retention.min(1024))),
            retention: config.retention.max(1),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, VecDeque<AnalysisRecord>>, StorageError> {
        self.records
            .lock()
            .map_err(|e| StorageError::Backend(format!("Lock error: {}", e)))
    }
}

impl Default for InMemoryResultStore {
    fn default() -> Self {
        Self::new(HistoryConfig::default())
    }
}

#[async_trait]
impl ResultStore for InMemoryResultStore {
    async fn append(&self, record: AnalysisRecord) -> Result<(), StorageError> {
        let mut records = self.lock()?;

        // Enforce retention
        while records.len() >= self.retention {
            records.pop_front();
        }

        debug!("Appending record {} for video {}", record.id, record.video_id);
        records.push_back(record);
        Ok(())
    }

    async fn list_recent(&self, limit: usize) -> Result<Vec<AnalysisRecord>, StorageError> {
        let records = self.lock()?;
        Ok(records.iter().rev().take(limit).cloned().collect())
    }

    async fn list_for_video(&self, video_id: &str, limit: usize) -> Result<Vec<AnalysisRecord>, StorageError> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .rev()
            .filter(|r| r.video_id == video_id)
            .take(limit)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<usize, StorageError> {
        Ok(self.lock()?.len())
    }
}
