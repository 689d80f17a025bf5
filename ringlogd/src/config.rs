//! 服务配置
//!
//! JSON 文件示例（所有字段可省略）：
//! ```json
//! {
//!     "listen": "0.0.0.0:9000",
//!     "timestamp_interval_secs": 10,
//!     "log": { "capacity": 10, "max_record_size": 65536, "delimiter": 10 }
//! }
//! ```

use ringlog::LogConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::DaemonError;

/// 默认监听地址
pub const DEFAULT_LISTEN: &str = "0.0.0.0:9000";

/// 默认时间戳间隔（秒）
pub const DEFAULT_TIMESTAMP_INTERVAL_SECS: u64 = 10;

fn default_listen() -> String {
    DEFAULT_LISTEN.to_string()
}

fn default_timestamp_interval() -> u64 {
    DEFAULT_TIMESTAMP_INTERVAL_SECS
}

/// 服务配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// 监听地址
    #[serde(default = "default_listen")]
    pub listen: String,

    /// 时间戳记录间隔（秒），0 表示关闭
    #[serde(default = "default_timestamp_interval")]
    pub timestamp_interval_secs: u64,

    /// 环形日志参数
    #[serde(default)]
    pub log: LogConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            timestamp_interval_secs: DEFAULT_TIMESTAMP_INTERVAL_SECS,
            log: LogConfig::default(),
        }
    }
}

impl DaemonConfig {
    /// 从 JSON 文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, DaemonError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn from_json(json: &str) -> Result<Self, DaemonError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DaemonError> {
        if self.listen.trim().is_empty() {
            return Err(DaemonError::InvalidConfig(
                "listen address must not be empty".to_string(),
            ));
        }
        self.log.validate()?;
        Ok(())
    }

    /// 时间戳间隔，关闭时为 None
    pub fn timestamp_interval(&self) -> Option<Duration> {
        match self.timestamp_interval_secs {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_daemon_config() {
        let config = DaemonConfig::default();
        assert_eq!(config.listen, "0.0.0.0:9000");
        assert_eq!(config.timestamp_interval(), Some(Duration::from_secs(10)));
        assert_eq!(config.log, LogConfig::default());
    }

    #[test]
    fn test_nested_log_config() {
        let config = DaemonConfig::from_json(
            r#"{ "timestamp_interval_secs": 0, "log": { "capacity": 4 } }"#,
        )
        .unwrap();
        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert_eq!(config.timestamp_interval(), None);
        assert_eq!(config.log.capacity, 4);
        assert_eq!(config.log.delimiter, b'\n');
    }

    #[test]
    fn test_invalid_nested_config() {
        let err = DaemonConfig::from_json(r#"{ "log": { "capacity": 0 } }"#).unwrap_err();
        assert!(matches!(err, DaemonError::Log(_)));

        let err = DaemonConfig::from_json(r#"{ "listen": " " }"#).unwrap_err();
        assert!(matches!(err, DaemonError::InvalidConfig(_)));
    }
}
