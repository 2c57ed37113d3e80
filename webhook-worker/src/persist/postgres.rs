//! Postgres 事件仓储（PgWebhookEventRepository）
//!
//! 表结构见 `migrations/0001_webhook_received.sql`。
//! 使用运行时查询（`sqlx::query` / `sqlx::query_as`），编译期无需连接数据库。
//! 每条事件的保存包裹在独立事务中，仅覆盖状态、错误信息与处理时间。
//!
use crate::error::{WebhookError, WebhookResult as Result};
use crate::persist::WebhookEventRepository;
use crate::webhook_event::{ProcessedStatus, WebhookEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(sqlx::FromRow)]
struct WebhookReceivedRow {
    id: Uuid,
    source: String,
    payload: Value,
    processed_status: String,
    error_message: Option<String>,
    received_at: DateTime<Utc>,
    processed_at: Option<DateTime<Utc>>,
}

impl TryFrom<WebhookReceivedRow> for WebhookEvent {
    type Error = WebhookError;

    fn try_from(row: WebhookReceivedRow) -> Result<Self> {
        Ok(WebhookEvent::restore(
            row.id,
            row.source,
            row.payload,
            row.processed_status.parse()?,
            row.error_message,
            row.received_at,
            row.processed_at,
        ))
    }
}

#[derive(Clone)]
pub struct PgWebhookEventRepository {
    pool: PgPool,
}

impl PgWebhookEventRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 写入新接收的事件（接收侧使用）
    pub async fn insert(&self, event: &WebhookEvent) -> Result<()> {
        sqlx::query(
            r"
            INSERT INTO webhook_received
                (id, source, payload, processed_status, error_message, received_at, processed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ",
        )
        .bind(event.id())
        .bind(event.source())
        .bind(event.payload())
        .bind(event.processed_status().as_str())
        .bind(event.error_message())
        .bind(event.received_at())
        .bind(event.processed_at())
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl WebhookEventRepository for PgWebhookEventRepository {
    async fn fetch_pending(&self, limit: usize) -> Result<Vec<WebhookEvent>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);

        let rows = sqlx::query_as::<_, WebhookReceivedRow>(
            r"
            SELECT id, source, payload, processed_status, error_message, received_at, processed_at
            FROM webhook_received
            WHERE processed_status = $1
            ORDER BY received_at ASC
            LIMIT $2
            ",
        )
        .bind(ProcessedStatus::Pending.as_str())
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(WebhookEvent::try_from).collect()
    }

    async fn save(&self, event: &WebhookEvent) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r"
            UPDATE webhook_received
            SET processed_status = $2, error_message = $3, processed_at = $4
            WHERE id = $1
            ",
        )
        .bind(event.id())
        .bind(event.processed_status().as_str())
        .bind(event.error_message())
        .bind(event.processed_at())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(WebhookError::repository(format!(
                "webhook event not found: {}",
                event.id()
            )));
        }

        tx.commit().await?;
        Ok(())
    }
}
