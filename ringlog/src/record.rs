//! 记录结构
//!
//! 已提交到环中的单条记录

use bytes::Bytes;

/// 单条已提交记录
///
/// 数据以 `Bytes` 保存，提交后不可变；快照只克隆句柄，不复制内容。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// 提交序列号（全局递增）
    pub sequence: u64,
    pub data: Bytes,
}

impl Record {
    pub fn new(sequence: u64, data: Bytes) -> Self {
        Self { sequence, data }
    }

    /// 记录长度（字节）
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }
}
