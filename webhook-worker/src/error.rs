//! 统一错误定义
//!
//! 聚焦状态解析、仓储与配置等最小必要集合。
//! 处理器自身的错误使用 `anyhow::Error`，在分发循环中被就地收敛，不会出现在这里。
//!
use thiserror::Error;

/// 统一错误类型
#[non_exhaustive]
#[derive(Debug, Error)]
pub enum WebhookError {
    // --- 解析 ---
    #[error("invalid processed status: {value}")]
    InvalidStatus { value: String },

    // --- 仓储/持久化 ---
    #[error("repository error: {reason}")]
    Repository { reason: String },
    #[error("database error: {reason}")]
    Database { reason: String },

    // --- 配置 ---
    #[error("invalid config: key={key}, reason={reason}")]
    Config { key: &'static str, reason: String },
}

/// 统一 Result 类型别名
pub type WebhookResult<T> = Result<T, WebhookError>;

impl WebhookError {
    pub fn repository(reason: impl Into<String>) -> Self {
        WebhookError::Repository {
            reason: reason.into(),
        }
    }
}

// 允许在基础设施层直接使用 `?` 将 sqlx 错误转换为 WebhookError
#[cfg(feature = "infra-sqlx")]
impl From<sqlx::Error> for WebhookError {
    fn from(err: sqlx::Error) -> Self {
        WebhookError::Database {
            reason: err.to_string(),
        }
    }
}
