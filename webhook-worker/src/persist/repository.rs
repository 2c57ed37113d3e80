//! 事件仓储协议
//!
use crate::{error::WebhookResult as Result, webhook_event::WebhookEvent};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait WebhookEventRepository: Send + Sync {
    /// 拉取最多 `limit` 条 `PENDING` 事件，按 `received_at` 升序
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<WebhookEvent>>;

    /// 保存单条事件的当前字段值（状态、错误信息、处理时间）
    async fn save(&self, event: &WebhookEvent) -> Result<()>;
}

#[async_trait]
impl<T> WebhookEventRepository for Arc<T>
where
    T: WebhookEventRepository + ?Sized,
{
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<WebhookEvent>> {
        (**self).fetch_pending(limit).await
    }

    async fn save(&self, event: &WebhookEvent) -> Result<()> {
        (**self).save(event).await
    }
}
