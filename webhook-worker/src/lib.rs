//! Webhook 事件处理工作器（webhook-worker）
//!
//! 从持久化队列中批量拉取待处理（`PENDING`）的 webhook 事件，
//! 按来源（source）路由到对应的处理器，并为每条事件记录终态：
//! - 处理器注册表（`registry`）：大小写不敏感的 source → handler 映射；
//! - 事件模型（`webhook_event`）：`WebhookEvent` 与 `ProcessedStatus` 状态机；
//! - 仓储协议（`persist`）：拉取待处理批次、逐条落盘；
//! - 分发循环（`worker`）：单轮 poll → dispatch → finalize，以及固定延迟调度器。
//!
//! webhook 的接收/验签、处理器的具体业务逻辑均由上层提供并注入。
//!
//! 典型用法：
//! 1. 为每个外部系统实现 `WebhookHandler`；
//! 2. 选择 `persist` 中的仓储实现（内存或 Postgres）；
//! 3. 使用 `WebhookDispatcher` 组装处理器与仓储；
//! 4. 交给 `WorkerScheduler` 周期驱动，或由外部定时器直接调用 `process_pending`。
//!
pub mod error;
pub mod handler;
pub mod persist;
pub mod registry;
pub mod webhook_event;
pub mod worker;

pub use error::{WebhookError, WebhookResult};
pub use handler::WebhookHandler;
pub use registry::HandlerRegistry;
pub use webhook_event::{ProcessedStatus, WebhookEvent};
