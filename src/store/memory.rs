use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{LogStore, Page, StoreError};
use crate::models::{LogEntry, LogId, ProjectedLog, Projection};

/// In-process store. Entries live as long as the value does.
#[derive(Default)]
pub struct MemoryLogStore {
    entries: RwLock<Vec<(LogId, LogEntry)>>,
}

impl MemoryLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl LogStore for MemoryLogStore {
    async fn insert(&self, entry: &LogEntry) -> Result<LogId, StoreError> {
        let id = Uuid::new_v4();
        self.entries.write().await.push((id, entry.clone()));
        Ok(id)
    }

    async fn query_projection(
        &self,
        projection: &Projection,
        page: Page,
    ) -> Result<Vec<ProjectedLog>, StoreError> {
        let entries = self.entries.read().await;
        let offset = usize::try_from(page.offset).unwrap_or(usize::MAX);
        let limit = page.limit.map_or(usize::MAX, |l| l as usize);

        Ok(entries
            .iter()
            .skip(offset)
            .take(limit)
            .map(|(_, entry)| ProjectedLog::project(entry, projection))
            .collect())
    }

    fn kind(&self) -> &'static str {
        "memory"
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::LogField;
    use chrono::{TimeZone, Utc};

    fn entry(mood: i16) -> LogEntry {
        LogEntry {
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap(),
            mood,
            video_uri: String::new(),
            lat: 25.03,
            lng: 121.56,
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_distinct_ids() {
        let store = MemoryLogStore::new();
        let a = store.insert(&entry(1)).await.unwrap();
        let b = store.insert(&entry(2)).await.unwrap();
        assert_ne!(a, b);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_query_keeps_insertion_order() {
        let store = MemoryLogStore::new();
        for mood in 1..=5 {
            store.insert(&entry(mood)).await.unwrap();
        }
        let projection = Projection::new(&[LogField::Mood]);
        let moods: Vec<_> = store
            .query_projection(&projection, Page::default())
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.mood.unwrap())
            .collect();
        assert_eq!(moods, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_query_pages() {
        let store = MemoryLogStore::new();
        for mood in 1..=5 {
            store.insert(&entry(mood)).await.unwrap();
        }
        let projection = Projection::new(&[LogField::Mood]);
        let page = Page {
            limit: Some(2),
            offset: 1,
        };
        let moods: Vec<_> = store
            .query_projection(&projection, page)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.mood.unwrap())
            .collect();
        assert_eq!(moods, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_offset_past_end_is_empty() {
        let store = MemoryLogStore::new();
        store.insert(&entry(3)).await.unwrap();
        let page = Page {
            limit: None,
            offset: 10,
        };
        let rows = store
            .query_projection(&Projection::new(&[LogField::Mood]), page)
            .await
            .unwrap();
        assert!(rows.is_empty());
    }
}
