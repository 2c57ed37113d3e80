//! Webhook 处理器（WebhookHandler）
//!
//! 每个外部来源系统对应一个处理器，负责执行事件的实际副作用。
//!
use crate::webhook_event::WebhookEvent;
use async_trait::async_trait;

/// Webhook 处理器：处理某一来源的事件
#[async_trait]
pub trait WebhookHandler: Send + Sync {
    /// 来源标识（注册时按小写归一化）
    fn source(&self) -> &str;

    /// 处理事件
    ///
    /// 可以直接修改事件的状态与错误信息（例如判定为重复事件后调用 `discard`）；
    /// 若返回时状态仍为 `PENDING`，分发循环会将其视为 `PROCESSED`。
    async fn handle(&self, event: &mut WebhookEvent) -> anyhow::Result<()>;
}
