//! 环形日志配置
//!
//! 主机传入的全部参数：环容量、单条记录上限、分帧分隔符。
//! 支持 JSON 文件加载，缺省字段使用默认值。

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::constants::{DEFAULT_CAPACITY, DEFAULT_DELIMITER, DEFAULT_MAX_RECORD_SIZE};
use crate::error::LogError;

fn default_capacity() -> usize {
    DEFAULT_CAPACITY
}

fn default_max_record_size() -> Option<usize> {
    Some(DEFAULT_MAX_RECORD_SIZE)
}

fn default_delimiter() -> u8 {
    DEFAULT_DELIMITER
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// 环容量（记录条数）
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// 单条记录上限（字节），None 表示只受内存限制
    #[serde(default = "default_max_record_size")]
    pub max_record_size: Option<usize>,

    /// 分帧分隔符
    #[serde(default = "default_delimiter")]
    pub delimiter: u8,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            max_record_size: Some(DEFAULT_MAX_RECORD_SIZE),
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl LogConfig {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            capacity,
            ..Self::default()
        }
    }

    /// 从 JSON 文件加载
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LogError> {
        let content = fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// 从 JSON 字符串解析并校验
    pub fn from_json(json: &str) -> Result<Self, LogError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), LogError> {
        if self.capacity == 0 {
            return Err(LogError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        if self.max_record_size == Some(0) {
            return Err(LogError::InvalidConfig(
                "max_record_size must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
