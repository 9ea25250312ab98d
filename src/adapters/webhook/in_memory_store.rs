//! In-memory processed webhook store.
//!
//! Tracks which provider events were already handled so redeliveries are
//! no-ops. Records older than the retention window are removed by the
//! maintenance worker.

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::domain::foundation::Timestamp;
use crate::domain::webhook::{WebhookError, WebhookEventRecord};
use crate::ports::{ProcessedWebhookStore, SaveResult};

#[derive(Debug, Default)]
pub struct InMemoryWebhookEventStore {
    records: RwLock<HashMap<String, WebhookEventRecord>>,
}

impl InMemoryWebhookEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ProcessedWebhookStore for InMemoryWebhookEventStore {
    async fn find_by_event_id(
        &self,
        event_id: &str,
    ) -> Result<Option<WebhookEventRecord>, WebhookError> {
        Ok(self.records.read().await.get(event_id).cloned())
    }

    async fn save(&self, record: WebhookEventRecord) -> Result<SaveResult, WebhookError> {
        let mut records = self.records.write().await;
        if records.contains_key(&record.event_id) {
            return Ok(SaveResult::AlreadyExists);
        }
        records.insert(record.event_id.clone(), record);
        Ok(SaveResult::Inserted)
    }

    async fn delete_before(&self, timestamp: Timestamp) -> Result<u64, WebhookError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| !r.processed_at.is_before(&timestamp));
        Ok((before - records.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::webhook::{ProviderWebhookEvent, WebhookEventKind, WebhookProvider};

    fn event(id: &str) -> ProviderWebhookEvent {
        ProviderWebhookEvent::new(
            id,
            WebhookProvider::OpenAI,
            WebhookEventKind::Unhandled {
                event_type: "batch.created".to_string(),
            },
        )
    }

    #[tokio::test]
    async fn second_save_reports_existing() {
        let store = InMemoryWebhookEventStore::new();
        let evt = event("evt_1");

        assert_eq!(
            store.save(WebhookEventRecord::success(&evt)).await.unwrap(),
            SaveResult::Inserted
        );
        assert_eq!(
            store.save(WebhookEventRecord::failed(&evt, "late")).await.unwrap(),
            SaveResult::AlreadyExists
        );
        assert!(store.find_by_event_id("evt_1").await.unwrap().is_some());
        assert!(store.find_by_event_id("evt_2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_before_removes_old_records() {
        let store = InMemoryWebhookEventStore::new();
        store
            .save(WebhookEventRecord::ignored(&event("evt_old"), "unhandled"))
            .await
            .unwrap();

        let removed = store
            .delete_before(Timestamp::now().plus_minutes(1))
            .await
            .unwrap();
        assert_eq!(removed, 1);
        assert!(store.is_empty().await);
    }
}
