//! 分发循环（worker）
//!
//! 提供单轮 poll → dispatch → finalize 的处理逻辑与周期驱动：
//! - `WebhookDispatcher`：拉取批次、按 source 路由、隔离单条失败并落盘；
//! - `invoke_isolated`：将 handler 的错误与 panic 收敛为显式的 `Result`；
//! - `Clock`：处理时间来源，便于测试注入固定时间；
//! - `WorkerConfig`：批次大小与调度间隔；
//! - `WorkerHandle`：固定延迟调度任务的关闭与等待（需启用 `scheduler` 特性）。
//!
pub mod clock;
pub mod config;
pub mod dispatcher;
pub mod invoke;
#[cfg(feature = "scheduler")]
pub mod scheduler;

pub use clock::{Clock, SystemClock};
pub use config::WorkerConfig;
pub use dispatcher::{PassReport, WebhookDispatcher};
pub use invoke::{HandlerFault, invoke_isolated};
#[cfg(feature = "scheduler")]
pub use scheduler::WorkerHandle;
