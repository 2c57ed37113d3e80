//! 工作器配置
//!
//! 环境变量：
//! - `WEBHOOK_WORKER_INTERVAL_MS`：两轮处理之间的固定延迟（毫秒，默认 30000）
//! - `WEBHOOK_WORKER_BATCH_SIZE`：单轮最多拉取的事件数（默认 100）
//!
use crate::error::{WebhookError, WebhookResult as Result};
use std::time::Duration;

pub const INTERVAL_MS_ENV: &str = "WEBHOOK_WORKER_INTERVAL_MS";
pub const BATCH_SIZE_ENV: &str = "WEBHOOK_WORKER_BATCH_SIZE";

pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(30_000);
pub const DEFAULT_BATCH_SIZE: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerConfig {
    /// 上一轮结束到下一轮开始之间的延迟
    pub interval: Duration,
    /// 单轮最多处理的事件数
    pub batch_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }
}

impl WorkerConfig {
    /// 从环境变量加载配置，未设置的项使用默认值
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(val) = lookup(INTERVAL_MS_ENV) {
            let ms = parse_positive(INTERVAL_MS_ENV, &val)?;
            config.interval = Duration::from_millis(ms);
        }
        if let Some(val) = lookup(BATCH_SIZE_ENV) {
            let size = parse_positive(BATCH_SIZE_ENV, &val)?;
            config.batch_size = usize::try_from(size).map_err(|e| WebhookError::Config {
                key: BATCH_SIZE_ENV,
                reason: e.to_string(),
            })?;
        }

        Ok(config)
    }
}

fn parse_positive(key: &'static str, val: &str) -> Result<u64> {
    let n: u64 = val.trim().parse().map_err(|e: std::num::ParseIntError| {
        WebhookError::Config {
            key,
            reason: format!("{val:?}: {e}"),
        }
    })?;
    if n == 0 {
        return Err(WebhookError::Config {
            key,
            reason: "must be greater than zero".to_string(),
        });
    }
    Ok(n)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = WorkerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, WorkerConfig::default());
        assert_eq!(config.interval, Duration::from_millis(30_000));
        assert_eq!(config.batch_size, 100);
    }

    #[test]
    fn reads_overrides() {
        let config = WorkerConfig::from_lookup(lookup(&[
            (INTERVAL_MS_ENV, "5000"),
            (BATCH_SIZE_ENV, " 25 "),
        ]))
        .unwrap();
        assert_eq!(config.interval, Duration::from_millis(5000));
        assert_eq!(config.batch_size, 25);
    }

    #[test]
    fn rejects_invalid_values() {
        let err = WorkerConfig::from_lookup(lookup(&[(INTERVAL_MS_ENV, "soon")])).unwrap_err();
        assert!(matches!(
            err,
            WebhookError::Config {
                key: INTERVAL_MS_ENV,
                ..
            }
        ));

        let err = WorkerConfig::from_lookup(lookup(&[(BATCH_SIZE_ENV, "0")])).unwrap_err();
        assert!(matches!(
            err,
            WebhookError::Config {
                key: BATCH_SIZE_ENV,
                ..
            }
        ));
    }
}
