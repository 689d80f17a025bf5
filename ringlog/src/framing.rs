//! 分帧累加器
//!
//! 每个生产者独占一个累加器：多次写入的原始字节先在这里拼接，
//! 遇到分隔符才形成完整记录交给 [`crate::shared::SharedLog::commit`]。
//! 累加器状态从不共享，不需要加锁。
//!
//! ```text
//! feed("ab")      -> Pending            pending = "ab"
//! feed("cd\nef")  -> Complete("abcd\n") pending = "ef"
//! ```

use bytes::Bytes;
use tracing::warn;

use crate::config::LogConfig;
use crate::constants::PENDING_INITIAL_CAPACITY;
use crate::error::LogError;

/// 单次喂入的结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedResult {
    /// 完整记录（含分隔符）
    Complete(Bytes),
    /// 尚未见到分隔符
    Pending,
}

impl FeedResult {
    pub fn into_record(self) -> Option<Bytes> {
        match self {
            FeedResult::Complete(record) => Some(record),
            FeedResult::Pending => None,
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, FeedResult::Complete(_))
    }
}

/// 分帧累加器
#[derive(Debug)]
pub struct FramingAccumulator {
    pending: Vec<u8>,
    /// pending 中尚未取出部分的起点
    start: usize,
    /// pending 中已扫描过（确认不含分隔符）的前缀长度，不小于 start
    scanned: usize,
    delimiter: u8,
    max_record_size: Option<usize>,
}

impl FramingAccumulator {
    pub fn new(delimiter: u8, max_record_size: Option<usize>) -> Self {
        Self {
            pending: Vec::new(),
            start: 0,
            scanned: 0,
            delimiter,
            max_record_size,
        }
    }

    pub fn from_config(config: &LogConfig) -> Self {
        Self::new(config.delimiter, config.max_record_size)
    }

    /// 待提交字节数
    pub fn pending_len(&self) -> usize {
        self.pending.len() - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.pending_len() == 0
    }

    /// 丢弃未完成的记录并释放缓冲
    pub fn reset(&mut self) {
        self.pending = Vec::new();
        self.start = 0;
        self.scanned = 0;
    }

    /// 追加原始字节
    ///
    /// 只扫描新追加的区域。每次最多切出一条记录，分隔符之后的字节留作下一条记录的开头，
    /// 可用 [`Self::next_complete`] 继续取出。
    /// 分配失败时返回 `Allocation`，已累积的内容保持不变。
    pub fn feed(&mut self, data: &[u8]) -> Result<FeedResult, LogError> {
        if !data.is_empty() {
            let additional = if self.pending.capacity() == 0 {
                data.len().max(PENDING_INITIAL_CAPACITY)
            } else {
                data.len()
            };
            self.pending.try_reserve(additional)?;
            self.pending.extend_from_slice(data);
        }

        self.take_record()
    }

    /// 取出缓冲中已经完整的下一条记录（同一次读取带来多条记录时使用）
    pub fn next_complete(&mut self) -> Result<Option<Bytes>, LogError> {
        self.take_record().map(FeedResult::into_record)
    }

    /// 丢弃已取出的前缀，一批记录只搬移一次剩余字节
    fn compact(&mut self) {
        if self.start > 0 {
            self.pending.drain(..self.start);
            self.scanned -= self.start;
            self.start = 0;
        }
    }

    fn take_record(&mut self) -> Result<FeedResult, LogError> {
        let delimiter = self.delimiter;
        let found = self.pending[self.scanned..]
            .iter()
            .position(|&b| b == delimiter)
            .map(|i| self.scanned + i);

        match found {
            Some(end) => {
                let record_len = end + 1 - self.start;

                if let Some(limit) = self.max_record_size {
                    if record_len > limit {
                        warn!(
                            "ringlog: discard framed record of {} bytes (limit {})",
                            record_len, limit
                        );
                        self.start = end + 1;
                        self.scanned = self.start;
                        return Err(LogError::RecordTooLarge {
                            size: record_len,
                            limit,
                        });
                    }
                }

                let record = if self.start == 0 && end + 1 == self.pending.len() {
                    // 整个缓冲正好是一条记录，直接移交不复制
                    self.scanned = 0;
                    Bytes::from(std::mem::take(&mut self.pending))
                } else {
                    let record = Bytes::copy_from_slice(&self.pending[self.start..=end]);
                    self.start = end + 1;
                    self.scanned = self.start;
                    record
                };

                Ok(FeedResult::Complete(record))
            }
            None => {
                self.scanned = self.pending.len();
                self.compact();

                if let Some(limit) = self.max_record_size {
                    let size = self.pending.len();
                    if size > limit {
                        warn!(
                            "ringlog: discard oversized partial record of {} bytes (limit {})",
                            size, limit
                        );
                        self.reset();
                        return Err(LogError::RecordTooLarge { size, limit });
                    }
                }

                Ok(FeedResult::Pending)
            }
        }
    }
}
