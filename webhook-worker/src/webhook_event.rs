//! Webhook 事件模型（WebhookEvent）
//!
//! 定义已接收 webhook 在持久化层的标准形态与处理状态机：
//!
//! ```text
//! PENDING --(无对应 handler)------------------------> DISCARDED
//! PENDING --(handler 正常返回且未修改状态)----------> PROCESSED
//! PENDING --(handler 自行设置终态)-------------------> handler 选择的状态
//! PENDING --(handler 返回错误或发生 panic)----------> FAILED
//! ```
//!
//! 终态只有在外部主体将其重置为 `PENDING` 后才会被再次处理。
//!
use crate::error::WebhookError;
use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 错误信息的最大长度（按字符计）
pub const MAX_ERROR_MESSAGE_CHARS: usize = 500;

/// 截断错误信息，仅保留前 `MAX_ERROR_MESSAGE_CHARS` 个字符
pub fn truncate_error_message(message: &str) -> String {
    match message.char_indices().nth(MAX_ERROR_MESSAGE_CHARS) {
        Some((idx, _)) => message[..idx].to_string(),
        None => message.to_string(),
    }
}

fn deserialize_error_message<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().map(truncate_error_message))
}

/// 处理状态
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessedStatus {
    #[default]
    Pending,
    Processed,
    Failed,
    Discarded,
}

/// 单条事件在一轮分发中的结果分类
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// 没有为该 source 注册 handler
    NoHandler,
    /// handler 正常返回
    Completed,
    /// handler 返回错误或 panic
    Faulted,
}

impl ProcessedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessedStatus::Pending => "PENDING",
            ProcessedStatus::Processed => "PROCESSED",
            ProcessedStatus::Failed => "FAILED",
            ProcessedStatus::Discarded => "DISCARDED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, ProcessedStatus::Pending)
    }

    /// 状态迁移：`(当前状态, 分发结果) -> 新状态`
    ///
    /// handler 正常返回时，若其已自行设置终态则保留，否则默认为 `PROCESSED`。
    pub fn transition(self, outcome: DispatchOutcome) -> ProcessedStatus {
        match outcome {
            DispatchOutcome::NoHandler => ProcessedStatus::Discarded,
            DispatchOutcome::Faulted => ProcessedStatus::Failed,
            DispatchOutcome::Completed => match self {
                ProcessedStatus::Pending => ProcessedStatus::Processed,
                other => other,
            },
        }
    }
}

impl fmt::Display for ProcessedStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProcessedStatus {
    type Err = WebhookError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "PENDING" => Ok(ProcessedStatus::Pending),
            "PROCESSED" => Ok(ProcessedStatus::Processed),
            "FAILED" => Ok(ProcessedStatus::Failed),
            "DISCARDED" => Ok(ProcessedStatus::Discarded),
            other => Err(WebhookError::InvalidStatus {
                value: other.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
pub struct WebhookEvent {
    /// 事件唯一标识符
    #[builder(default = Uuid::new_v4())]
    id: Uuid,
    /// 来源系统标识，作为路由键（大小写不敏感）
    #[builder(into)]
    source: String,
    /// 原始负载
    #[builder(default)]
    payload: Value,
    /// 处理状态
    #[builder(default)]
    processed_status: ProcessedStatus,
    /// 失败/丢弃原因，最长 `MAX_ERROR_MESSAGE_CHARS` 个字符
    #[builder(skip)]
    #[serde(default, deserialize_with = "deserialize_error_message")]
    error_message: Option<String>,
    /// 接收时间（由接收侧写入），批次排序键
    #[builder(default = Utc::now())]
    received_at: DateTime<Utc>,
    /// 进入终态的时间（由分发循环写入）
    processed_at: Option<DateTime<Utc>>,
}

impl WebhookEvent {
    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn processed_status(&self) -> ProcessedStatus {
        self.processed_status
    }

    pub fn error_message(&self) -> Option<&str> {
        self.error_message.as_deref()
    }

    pub fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    pub fn processed_at(&self) -> Option<DateTime<Utc>> {
        self.processed_at
    }

    pub fn set_processed_status(&mut self, status: ProcessedStatus) {
        self.processed_status = status;
    }

    /// 设置错误信息，超长部分静默截断
    pub fn set_error_message(&mut self, message: &str) {
        self.error_message = Some(truncate_error_message(message));
    }

    pub(crate) fn clear_error_message(&mut self) {
        self.error_message = None;
    }

    /// handler 主动丢弃事件（例如重复投递）
    pub fn discard(&mut self, reason: &str) {
        self.processed_status = ProcessedStatus::Discarded;
        self.set_error_message(reason);
    }

    /// 记录处理时间，不早于 `received_at`
    pub(crate) fn stamp_processed_at(&mut self, now: DateTime<Utc>) {
        self.processed_at = Some(now.max(self.received_at));
    }

    /// 由持久化层还原完整记录
    #[cfg(feature = "infra-sqlx")]
    pub(crate) fn restore(
        id: Uuid,
        source: String,
        payload: Value,
        processed_status: ProcessedStatus,
        error_message: Option<String>,
        received_at: DateTime<Utc>,
        processed_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id,
            source,
            payload,
            processed_status,
            error_message: error_message.as_deref().map(truncate_error_message),
            received_at,
            processed_at,
        }
    }
}
