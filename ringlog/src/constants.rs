//! 常量定义
//!
//! 环形记录日志的默认参数

/// 默认环容量（记录条数）
pub const DEFAULT_CAPACITY: usize = 10;

/// 默认单条记录上限（字节），与单次接收缓冲一致
pub const DEFAULT_MAX_RECORD_SIZE: usize = 65536;

/// 默认分帧分隔符
pub const DEFAULT_DELIMITER: u8 = b'\n';

/// 待提交缓冲的初始容量
pub const PENDING_INITIAL_CAPACITY: usize = 256;

