//! 持久化（persist）
//!
//! 定义 webhook 事件仓储协议及其实现：
//! - `WebhookEventRepository`：按接收时间升序拉取待处理批次、逐条保存；
//! - `InMemoryWebhookEventRepository`：内存实现，用于测试、示例与本地开发；
//! - `PgWebhookEventRepository`：Postgres 实现（需启用 `infra-sqlx` 特性）。
//!
mod inmemory;
#[cfg(feature = "infra-sqlx")]
mod postgres;
mod repository;

pub use inmemory::InMemoryWebhookEventRepository;
#[cfg(feature = "infra-sqlx")]
pub use postgres::PgWebhookEventRepository;
pub use repository::WebhookEventRepository;
