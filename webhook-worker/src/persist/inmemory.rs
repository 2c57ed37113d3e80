//! 内存版事件仓储（InMemoryWebhookEventRepository）
//!
//! 基于 `Arc<Mutex<Vec<_>>>` 的轻量实现：
//! - `insert`：模拟接收侧写入新的 `PENDING` 事件；
//! - `fetch_pending`：按 `received_at` 升序（相同时按插入顺序）返回克隆；
//! - `save`：按 id 覆盖已有记录。
//!
use crate::error::{WebhookError, WebhookResult as Result};
use crate::persist::WebhookEventRepository;
use crate::webhook_event::{ProcessedStatus, WebhookEvent};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use uuid::Uuid;

#[derive(Clone, Default)]
pub struct InMemoryWebhookEventRepository {
    inner: Arc<Mutex<Vec<WebhookEvent>>>,
}

impl InMemoryWebhookEventRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Vec<WebhookEvent>>> {
        self.inner
            .lock()
            .map_err(|e| WebhookError::repository(e.to_string()))
    }

    pub fn insert(&self, event: WebhookEvent) -> Result<()> {
        self.lock()?.push(event);
        Ok(())
    }

    pub fn get(&self, id: Uuid) -> Result<Option<WebhookEvent>> {
        Ok(self.lock()?.iter().find(|e| e.id() == id).cloned())
    }

    pub fn all(&self) -> Result<Vec<WebhookEvent>> {
        Ok(self.lock()?.clone())
    }

    pub fn count_by_status(&self, status: ProcessedStatus) -> Result<usize> {
        Ok(self
            .lock()?
            .iter()
            .filter(|e| e.processed_status() == status)
            .count())
    }
}

#[async_trait]
impl WebhookEventRepository for InMemoryWebhookEventRepository {
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<WebhookEvent>> {
        let mut pending: Vec<WebhookEvent> = self
            .lock()?
            .iter()
            .filter(|e| e.processed_status() == ProcessedStatus::Pending)
            .cloned()
            .collect();
        // sort_by_key 为稳定排序，相同接收时间保持插入顺序
        pending.sort_by_key(|e| e.received_at());
        pending.truncate(limit);
        Ok(pending)
    }

    async fn save(&self, event: &WebhookEvent) -> Result<()> {
        let mut store = self.lock()?;
        match store.iter_mut().find(|e| e.id() == event.id()) {
            Some(slot) => *slot = event.clone(),
            None => store.push(event.clone()),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    #[tokio::test]
    async fn fetch_pending_orders_by_received_at_and_limits() {
        let repo = InMemoryWebhookEventRepository::new();
        let base = Utc::now();
        for offset in [3, 1, 2, 0] {
            repo.insert(
                WebhookEvent::builder()
                    .source(format!("s{offset}"))
                    .received_at(base + Duration::seconds(offset))
                    .build(),
            )
            .unwrap();
        }

        let batch = repo.fetch_pending(3).await.unwrap();
        let sources: Vec<&str> = batch.iter().map(|e| e.source()).collect();
        assert_eq!(sources, vec!["s0", "s1", "s2"]);
    }

    #[tokio::test]
    async fn fetch_pending_skips_terminal_events() {
        let repo = InMemoryWebhookEventRepository::new();
        repo.insert(WebhookEvent::builder().source("a").build())
            .unwrap();
        repo.insert(
            WebhookEvent::builder()
                .source("b")
                .processed_status(ProcessedStatus::Processed)
                .build(),
        )
        .unwrap();

        let batch = repo.fetch_pending(100).await.unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].source(), "a");
    }

    #[tokio::test]
    async fn save_overwrites_by_id() {
        let repo = InMemoryWebhookEventRepository::new();
        let mut ev = WebhookEvent::builder().source("a").build();
        repo.insert(ev.clone()).unwrap();

        ev.set_processed_status(ProcessedStatus::Failed);
        repo.save(&ev).await.unwrap();

        assert_eq!(repo.all().unwrap().len(), 1);
        let stored = repo.get(ev.id()).unwrap().unwrap();
        assert_eq!(stored.processed_status(), ProcessedStatus::Failed);
        assert_eq!(repo.count_by_status(ProcessedStatus::Pending).unwrap(), 0);
    }
}
