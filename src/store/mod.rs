//! Persistence gateway for log entries.
//!
//! `LogStore` is the seam between the HTTP surface and the database. The
//! server runs on [`PgLogStore`]; [`MemoryLogStore`] keeps everything in
//! process and backs the HTTP tests.

use async_trait::async_trait;

use crate::models::{LogEntry, LogId, ProjectedLog, Projection};

pub mod memory;
pub mod postgres;

pub use memory::MemoryLogStore;
pub use postgres::PgLogStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Store unavailable: {0}")]
    Unavailable(#[from] sqlx::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

/// A window over the stored records, in insertion order. `limit: None`
/// reads to the end.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Page {
    pub limit: Option<u32>,
    pub offset: u64,
}

#[async_trait]
pub trait LogStore: Send + Sync {
    /// Persists one entry and returns the identifier assigned to it.
    async fn insert(&self, entry: &LogEntry) -> Result<LogId, StoreError>;

    /// Reads stored entries narrowed to `projection`, oldest first.
    async fn query_projection(
        &self,
        projection: &Projection,
        page: Page,
    ) -> Result<Vec<ProjectedLog>, StoreError>;

    /// Short backend name, reported by the health endpoint.
    fn kind(&self) -> &'static str;

    async fn ping(&self) -> Result<(), StoreError>;

    /// Releases the underlying connections. Called once, at shutdown.
    async fn close(&self) {}
}
