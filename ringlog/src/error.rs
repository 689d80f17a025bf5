//! 错误类型

use std::collections::TryReserveError;
use thiserror::Error;

/// ringlog 错误
///
/// 除 `LockPoisoned` 外都可由调用方恢复，存储本身状态不受影响。
#[derive(Error, Debug)]
pub enum LogError {
    /// 定位请求指向不存在的记录或记录内偏移
    #[error("seek target out of range: record {index}, offset {offset}")]
    OutOfRange { index: usize, offset: usize },

    /// 待提交记录超过配置上限，已丢弃
    #[error("record too large: {size} bytes exceeds limit of {limit}")]
    RecordTooLarge { size: usize, limit: usize },

    #[error("allocation failed: {0}")]
    Allocation(#[from] TryReserveError),

    /// 锁已中毒，存储不变式不再可信，按致命错误处理
    #[error("record store lock poisoned")]
    LockPoisoned,

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LogError {
    /// 是否为致命错误
    pub fn is_fatal(&self) -> bool {
        matches!(self, LogError::LockPoisoned)
    }
}

impl From<LogError> for std::io::Error {
    fn from(err: LogError) -> Self {
        match err {
            LogError::Io(e) => e,
            LogError::OutOfRange { .. } | LogError::InvalidConfig(_) => {
                std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
            }
            LogError::RecordTooLarge { .. } => {
                std::io::Error::new(std::io::ErrorKind::InvalidData, err)
            }
            LogError::Allocation(_) => std::io::Error::new(std::io::ErrorKind::OutOfMemory, err),
            other => std::io::Error::other(other),
        }
    }
}
