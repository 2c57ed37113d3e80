/// Webhook 工作器（内存版）示例
/// 展示 接收 -> PENDING 队列 -> 按 source 分发 -> 终态落盘 的闭环，
/// 包括无 handler 丢弃、handler 自行丢弃重复事件与 handler 失败。
use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use serde_json::json;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;
use webhook_worker::persist::InMemoryWebhookEventRepository;
use webhook_worker::worker::{WebhookDispatcher, WorkerConfig};
use webhook_worker::{ProcessedStatus, WebhookEvent, WebhookHandler};

// ============================================================================
// 处理器
// ============================================================================

struct GithubHandler;

#[async_trait]
impl WebhookHandler for GithubHandler {
    fn source(&self) -> &str {
        "github"
    }

    async fn handle(&self, event: &mut WebhookEvent) -> AnyResult<()> {
        let payload = event.payload();
        info!(
            webhook_id = %event.id(),
            action = payload["action"].as_str().unwrap_or("-"),
            repository = payload["repository"].as_str().unwrap_or("-"),
            "github event handled"
        );
        Ok(())
    }
}

#[derive(Debug, Error)]
enum StripeError {
    #[error("stripe event without id")]
    MissingEventId,
}

/// 按 Stripe 事件 id 去重，重复投递直接丢弃
#[derive(Default)]
struct StripeHandler {
    seen: Mutex<HashSet<String>>,
}

#[async_trait]
impl WebhookHandler for StripeHandler {
    fn source(&self) -> &str {
        "Stripe"
    }

    async fn handle(&self, event: &mut WebhookEvent) -> AnyResult<()> {
        let id = event.payload()["id"]
            .as_str()
            .map(str::to_owned)
            .ok_or(StripeError::MissingEventId)?;

        let first_time = self
            .seen
            .lock()
            .map_err(|e| anyhow::anyhow!("stripe dedup lock poisoned: {e}"))?
            .insert(id.clone());
        if !first_time {
            event.discard(&format!("duplicate stripe event: {id}"));
            return Ok(());
        }

        info!(webhook_id = %event.id(), stripe_event = %id, "stripe event handled");
        Ok(())
    }
}

// ============================================================================
// 示例数据
// ============================================================================

fn seed(repo: &InMemoryWebhookEventRepository) -> AnyResult<()> {
    let base = Utc::now() - Duration::minutes(5);
    let samples = [
        ("github", json!({ "action": "opened", "repository": "acme/api" })),
        ("stripe", json!({ "id": "evt_1", "type": "charge.succeeded" })),
        ("STRIPE", json!({ "id": "evt_1", "type": "charge.succeeded" })),
        ("stripe", json!({ "type": "charge.refunded" })),
        ("gitlab", json!({ "object_kind": "push" })),
    ];

    for (i, (source, payload)) in samples.into_iter().enumerate() {
        repo.insert(
            WebhookEvent::builder()
                .source(source)
                .payload(payload)
                .received_at(base + Duration::seconds(i as i64))
                .build(),
        )?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> AnyResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,webhook_worker=debug")),
        )
        .init();

    let config = WorkerConfig::from_env()?;
    let repo = InMemoryWebhookEventRepository::new();
    seed(&repo)?;

    let dispatcher = Arc::new(
        WebhookDispatcher::builder()
            .repository(Arc::new(repo.clone()))
            .handlers(vec![
                Arc::new(GithubHandler) as Arc<dyn WebhookHandler>,
                Arc::new(StripeHandler::default()),
            ])
            .config(config)
            .build(),
    );

    let handle = dispatcher.start();
    info!("press Ctrl-C to stop");
    tokio::signal::ctrl_c().await?;

    handle.shutdown();
    handle.join().await;

    for ev in repo.all()? {
        println!(
            "{} source={:<7} status={:<9} error={}",
            ev.id(),
            ev.source(),
            ev.processed_status().as_str(),
            ev.error_message().unwrap_or("-")
        );
    }
    println!(
        "pending left: {}",
        repo.count_by_status(ProcessedStatus::Pending)?
    );
    Ok(())
}
