//! 错误类型

use ringlog::LogError;
use thiserror::Error;

/// 服务错误
#[derive(Error, Debug)]
pub enum DaemonError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("log error: {0}")]
    Log(#[from] LogError),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

impl DaemonError {
    /// 致命错误需要停止整个服务
    pub fn is_fatal(&self) -> bool {
        matches!(self, DaemonError::Log(e) if e.is_fatal())
    }
}
