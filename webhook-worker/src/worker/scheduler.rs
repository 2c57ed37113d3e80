//! 固定延迟调度
//!
//! 启动后立即执行一轮，之后每轮完整结束（含落盘）再等待 `interval` 开始下一轮，
//! 因此各轮之间不会重叠。取消信号只在两轮之间生效，进行中的一轮总是运行到结束。
//!
use super::dispatcher::WebhookDispatcher;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio::time;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

impl WebhookDispatcher {
    /// 启动调度任务，返回可用于关闭/等待的句柄
    pub fn start(self: Arc<Self>) -> WorkerHandle {
        let token = CancellationToken::new();
        let task = tokio::spawn(Self::run_fixed_delay(self, token.clone()));

        WorkerHandle {
            token,
            task: Some(task),
        }
    }

    async fn run_fixed_delay(self: Arc<Self>, token: CancellationToken) {
        let interval = self.config.interval;
        info!(
            ?interval,
            batch_size = self.config.batch_size,
            "webhook worker started"
        );

        while !token.is_cancelled() {
            match self.process_pending().await {
                Ok(report) if report.fetched > 0 => info!(
                    fetched = report.fetched,
                    processed = report.processed,
                    failed = report.failed,
                    discarded = report.discarded,
                    "webhook pass completed"
                ),
                Ok(_) => {}
                Err(e) => error!(error = %e, "webhook pass aborted, retrying on next tick"),
            }

            tokio::select! {
                _ = token.cancelled() => break,
                _ = time::sleep(interval) => {}
            }
        }

        info!("webhook worker stopped");
    }
}

/// 调度任务句柄：用于优雅关闭与等待任务结束
pub struct WorkerHandle {
    token: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(|t| t.is_finished())
    }

    pub async fn join(mut self) {
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
