//! 分发器（WebhookDispatcher）
//!
//! 单轮处理流程：
//! 1. 拉取最多 `batch_size` 条 `PENDING` 事件（按 `received_at` 升序）；
//! 2. 批次为空时直接返回，不产生任何副作用；
//! 3. 为整个批次构建一次 `HandlerRegistry`；
//! 4. 按批次顺序逐条处理：路由 → 隔离调用 → 状态迁移 → 记录处理时间 → 落盘。
//!
//! 单条事件的 handler 故障在本条内收敛为 `FAILED`，不会中断批次；
//! 仓储保存失败则向上传播并中止本轮，未落盘的事件保持 `PENDING`，在下一轮重试。
//!
use super::clock::{Clock, SystemClock};
use super::config::WorkerConfig;
use super::invoke::invoke_isolated;
use crate::error::WebhookResult as Result;
use crate::handler::WebhookHandler;
use crate::persist::WebhookEventRepository;
use crate::registry::HandlerRegistry;
use crate::webhook_event::{DispatchOutcome, ProcessedStatus, WebhookEvent};
use bon::Builder;
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Builder)]
pub struct WebhookDispatcher {
    repository: Arc<dyn WebhookEventRepository>,
    #[builder(default)]
    handlers: Vec<Arc<dyn WebhookHandler>>,
    #[builder(default = Arc::new(SystemClock) as Arc<dyn Clock>)]
    clock: Arc<dyn Clock>,
    #[builder(default)]
    pub(crate) config: WorkerConfig,
}

/// 单轮处理结果统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassReport {
    pub fetched: usize,
    pub processed: usize,
    pub failed: usize,
    pub discarded: usize,
}

impl PassReport {
    fn record(&mut self, status: ProcessedStatus) {
        match status {
            ProcessedStatus::Processed => self.processed += 1,
            ProcessedStatus::Failed => self.failed += 1,
            ProcessedStatus::Discarded => self.discarded += 1,
            ProcessedStatus::Pending => {}
        }
    }
}

impl WebhookDispatcher {
    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// 执行一轮处理
    pub async fn process_pending(&self) -> Result<PassReport> {
        let batch = self
            .repository
            .fetch_pending(self.config.batch_size)
            .await?;
        if batch.is_empty() {
            return Ok(PassReport::default());
        }

        let registry = HandlerRegistry::new(&self.handlers);

        debug!(batch_size = batch.len(), "processing pending webhooks");

        let mut report = PassReport {
            fetched: batch.len(),
            ..Default::default()
        };

        for mut item in batch {
            self.process_item(&mut item, &registry).await;
            self.repository.save(&item).await?;
            report.record(item.processed_status());
        }

        Ok(report)
    }

    async fn process_item(&self, item: &mut WebhookEvent, registry: &HandlerRegistry) {
        let outcome = match registry.get(item.source()) {
            None => {
                let reason = format!("no handler registered for source: {}", item.source());
                item.set_error_message(&reason);
                warn!(
                    webhook_id = %item.id(),
                    source = item.source(),
                    "webhook discarded: no handler registered for source"
                );
                DispatchOutcome::NoHandler
            }
            Some(handler) => match invoke_isolated(handler.as_ref(), item).await {
                Ok(()) => DispatchOutcome::Completed,
                Err(fault) => {
                    let message = fault.message();
                    item.set_error_message(&message);
                    error!(
                        webhook_id = %item.id(),
                        source = item.source(),
                        error = %fault.detail(),
                        "failed to process webhook: {message}"
                    );
                    DispatchOutcome::Faulted
                }
            },
        };

        let status = item.processed_status().transition(outcome);
        // 成功终态不携带错误信息（含重置后重试、handler 仅写入信息的情况）
        if status == ProcessedStatus::Processed {
            item.clear_error_message();
        }
        item.set_processed_status(status);
        item.stamp_processed_at(self.clock.now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::InMemoryWebhookEventRepository;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    struct FailingHandler;

    #[async_trait]
    impl WebhookHandler for FailingHandler {
        fn source(&self) -> &str {
            "crm"
        }
        async fn handle(&self, _event: &mut WebhookEvent) -> anyhow::Result<()> {
            Err(anyhow!("downstream unavailable"))
        }
    }

    #[tokio::test]
    async fn stamps_processed_at_from_clock() {
        let received = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let now = received + Duration::minutes(3);

        let repo = Arc::new(InMemoryWebhookEventRepository::new());
        let ev = WebhookEvent::builder()
            .source("crm")
            .received_at(received)
            .build();
        repo.insert(ev.clone()).unwrap();

        let dispatcher = WebhookDispatcher::builder()
            .repository(repo.clone())
            .handlers(vec![Arc::new(FailingHandler) as Arc<dyn WebhookHandler>])
            .clock(Arc::new(FixedClock(now)))
            .build();

        let report = dispatcher.process_pending().await.unwrap();
        assert_eq!(
            report,
            PassReport {
                fetched: 1,
                failed: 1,
                ..Default::default()
            }
        );

        let stored = repo.get(ev.id()).unwrap().unwrap();
        assert_eq!(stored.processed_at(), Some(now));
        assert_eq!(stored.processed_status(), ProcessedStatus::Failed);
        assert_eq!(stored.error_message(), Some("downstream unavailable"));
    }

    #[tokio::test]
    async fn discard_message_keeps_original_source() {
        let repo = Arc::new(InMemoryWebhookEventRepository::new());
        let ev = WebhookEvent::builder().source("GitLab").build();
        repo.insert(ev.clone()).unwrap();

        let dispatcher = WebhookDispatcher::builder().repository(repo.clone()).build();
        dispatcher.process_pending().await.unwrap();

        let stored = repo.get(ev.id()).unwrap().unwrap();
        assert_eq!(stored.processed_status(), ProcessedStatus::Discarded);
        assert_eq!(
            stored.error_message(),
            Some("no handler registered for source: GitLab")
        );
    }

    struct NotingHandler;

    #[async_trait]
    impl WebhookHandler for NotingHandler {
        fn source(&self) -> &str {
            "crm"
        }
        async fn handle(&self, event: &mut WebhookEvent) -> anyhow::Result<()> {
            event.set_error_message("retried after timeout");
            Ok(())
        }
    }

    #[tokio::test]
    async fn processed_item_carries_no_error_message() {
        let repo = Arc::new(InMemoryWebhookEventRepository::new());
        let ev = WebhookEvent::builder().source("CRM").build();
        repo.insert(ev.clone()).unwrap();

        let dispatcher = WebhookDispatcher::builder()
            .repository(repo.clone())
            .handlers(vec![Arc::new(NotingHandler) as Arc<dyn WebhookHandler>])
            .build();
        dispatcher.process_pending().await.unwrap();

        let stored = repo.get(ev.id()).unwrap().unwrap();
        assert_eq!(stored.processed_status(), ProcessedStatus::Processed);
        assert!(stored.error_message().is_none());
    }

    #[test]
    fn report_counts_terminal_statuses() {
        let mut report = PassReport::default();
        report.record(ProcessedStatus::Processed);
        report.record(ProcessedStatus::Processed);
        report.record(ProcessedStatus::Failed);
        report.record(ProcessedStatus::Discarded);
        assert_eq!(report.processed, 2);
        assert_eq!(report.failed, 1);
        assert_eq!(report.discarded, 1);
    }
}
