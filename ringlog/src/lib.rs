//! ringlog - 有界并发环形记录日志
//!
//! 特性：
//! - 环形存储：固定 N 条记录，写满后覆盖最旧的一条
//! - 按分隔符分帧：多次写入拼接成一条完整记录再提交
//! - 字节流视图：全部记录按新旧顺序拼成一个逻辑文件，支持顺序读和 Seek
//! - 记录定位：（记录下标, 记录内偏移）换算为字节流位置
//! - 并发访问：单锁保护，快照只克隆句柄，锁外发送
//!
//! ```text
//! 生产者 --feed--> FramingAccumulator --commit--> SharedLog(RecordStore)
//!                                                    │
//!                          read_all / LogCursor <────┘
//! ```

pub mod config;
pub mod constants;
pub mod error;
pub mod framing;
pub mod offset;
pub mod record;
pub mod shared;
pub mod store;

#[cfg(test)]
mod tests;

pub use config::LogConfig;
pub use error::LogError;
pub use framing::{FeedResult, FramingAccumulator};
pub use offset::{EntryPosition, LogCursor};
pub use record::Record;
pub use shared::{SharedLog, Snapshot};
pub use store::{LogStats, RecordStore};
