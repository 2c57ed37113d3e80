//! handler 调用隔离
//!
//! 将 handler 返回的错误与执行期间的 panic 统一收敛为 `HandlerFault`，
//! 调用方只需处理显式的 `Result`，单条事件的故障不会越过这一边界。
//!
use crate::handler::WebhookHandler;
use crate::webhook_event::{WebhookEvent, truncate_error_message};
use futures_util::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;

/// 错误信息为空时持久化的兜底文本
pub const FALLBACK_ERROR_MESSAGE: &str = "error during processing";

/// handler 故障
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFault {
    message: Option<String>,
    detail: String,
}

impl HandlerFault {
    fn from_error(err: anyhow::Error) -> Self {
        let message = err.to_string();
        Self {
            message: (!message.trim().is_empty()).then_some(message),
            detail: format!("{err:?}"),
        }
    }

    fn from_panic(payload: Box<dyn Any + Send>) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .filter(|s| !s.trim().is_empty());
        let detail = format!(
            "handler panicked: {}",
            message.as_deref().unwrap_or("<non-string panic payload>")
        );
        Self { message, detail }
    }

    /// 持久化用的错误信息：无信息时使用兜底文本，并截断至上限
    pub fn message(&self) -> String {
        truncate_error_message(self.message.as_deref().unwrap_or(FALLBACK_ERROR_MESSAGE))
    }

    /// 完整诊断信息（含错误链），仅用于日志
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

/// 隔离调用 handler
pub async fn invoke_isolated(
    handler: &dyn WebhookHandler,
    event: &mut WebhookEvent,
) -> Result<(), HandlerFault> {
    match AssertUnwindSafe(handler.handle(event)).catch_unwind().await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(err)) => Err(HandlerFault::from_error(err)),
        Err(payload) => Err(HandlerFault::from_panic(payload)),
    }
}
