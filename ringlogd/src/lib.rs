//! ringlogd - 环形日志 TCP 服务
//!
//! 每个连接一个任务，各自持有分帧累加器：
//! - 收到完整记录：提交到共享日志，然后把整个日志回送给该客户端
//! - 收到 `RINGLOG_SEEKTO:<记录下标>,<记录内偏移>`：不提交，回送该位置到末尾的内容
//!
//! 另有定时任务按固定间隔追加 `timestamp:` 记录。

pub mod config;
pub mod control;
pub mod error;
pub mod housekeeping;
pub mod server;
pub mod signal;

pub use config::DaemonConfig;
pub use control::{parse_control, SeekRequest, CONTROL_PREFIX};
pub use error::DaemonError;
pub use housekeeping::{run_timestamps, timestamp_record};
pub use server::{Server, ServerStats};
pub use signal::{wait_for_shutdown, ShutdownSignal};
