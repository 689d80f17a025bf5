//! 环形记录存储
//!
//! 设计要点：
//! 1. 固定槽位 - N 个槽位的数组 + 读写下标 + full 标志，不依赖指针
//! 2. 覆盖最旧 - 写满后每条新记录淘汰最旧的一条，淘汰记录移交调用方
//! 3. 累计偏移 - 偏移 0 始终对应当前最旧记录的第一个字节，淘汰后整体前移
//!
//! 槽位布局：
//! ```text
//! ┌────────┬────────┬────────┬────────┬────────┐
//! │ slot 0 │ slot 1 │ slot 2 │ slot 3 │ slot 4 │
//! │  (空)  │ 最旧   │        │ 最新   │  (空)  │
//! └────────┴────────┴────────┴────────┴────────┘
//!              ↑                          ↑
//!         read_index                 write_index
//! ```
//!
//! 本模块不加锁，并发访问由 [`crate::shared::SharedLog`] 负责。

use bytes::Bytes;
use tracing::debug;

use crate::config::LogConfig;
use crate::error::LogError;
use crate::record::Record;

/// 统计信息
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogStats {
    pub capacity: usize,
    pub records: usize,
    pub used_bytes: usize,
    pub global_seq: u64,
    pub evicted: u64,
}

impl std::fmt::Display for LogStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Ring Log Statistics:")?;
        writeln!(f, "  Capacity: {} records", self.capacity)?;
        writeln!(
            f,
            "  Occupied: {} records ({:.1}%)",
            self.records,
            self.records as f64 / self.capacity as f64 * 100.0
        )?;
        writeln!(
            f,
            "  Used: {} bytes ({:.1} KB)",
            self.used_bytes,
            self.used_bytes as f64 / 1024.0
        )?;
        writeln!(f, "  Total committed: {}", self.global_seq)?;
        writeln!(f, "  Evicted: {}", self.evicted)?;
        Ok(())
    }
}

/// 环形记录存储
#[derive(Debug)]
pub struct RecordStore {
    slots: Vec<Option<Record>>,
    /// 下一个写入槽位
    write_index: usize,
    /// 最旧的有效槽位
    read_index: usize,
    full: bool,
    /// 已占用字节数
    used_bytes: usize,
    /// 全局序列号
    global_seq: u64,
    /// 累计淘汰条数
    evicted: u64,
}

impl RecordStore {
    /// 创建指定容量的空存储
    pub fn new(capacity: usize) -> Result<Self, LogError> {
        if capacity == 0 {
            return Err(LogError::InvalidConfig(
                "capacity must be at least 1".to_string(),
            ));
        }
        let mut slots = Vec::new();
        slots.try_reserve_exact(capacity)?;
        slots.resize_with(capacity, || None);

        Ok(Self {
            slots,
            write_index: 0,
            read_index: 0,
            full: false,
            used_bytes: 0,
            global_seq: 0,
            evicted: 0,
        })
    }

    pub fn from_config(config: &LogConfig) -> Result<Self, LogError> {
        config.validate()?;
        Self::new(config.capacity)
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// 已占用记录数
    pub fn len(&self) -> usize {
        if self.full {
            self.capacity()
        } else {
            (self.write_index + self.capacity() - self.read_index) % self.capacity()
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.full && self.write_index == self.read_index
    }

    pub fn is_full(&self) -> bool {
        self.full
    }

    /// 下一条提交将获得的序列号
    pub fn next_sequence(&self) -> u64 {
        self.global_seq
    }

    /// 写入一条记录
    ///
    /// 已满时淘汰 write_index 处（即最旧）的记录并返回，由调用方释放。
    /// O(1)，每次最多淘汰一条，数据只移动不复制。
    pub fn add_record(&mut self, data: Bytes) -> Option<Record> {
        let capacity = self.capacity();

        let evicted = if self.full {
            let old = self.slots[self.write_index].take();
            self.read_index = (self.read_index + 1) % capacity;
            if let Some(record) = &old {
                self.used_bytes -= record.len();
                self.evicted += 1;
                debug!(
                    "ringlog: evict seq={} ({} bytes) from slot {}",
                    record.sequence,
                    record.len(),
                    self.write_index
                );
            }
            old
        } else {
            None
        };

        let sequence = self.global_seq;
        self.global_seq += 1;
        self.used_bytes += data.len();
        self.slots[self.write_index] = Some(Record::new(sequence, data));

        self.write_index = (self.write_index + 1) % capacity;

        // 写后追上读下标即为满
        if self.write_index == self.read_index {
            self.full = true;
        }

        evicted
    }

    /// 按逻辑下标（0 = 最旧）获取记录
    pub fn get(&self, index: usize) -> Option<&Record> {
        if index >= self.len() {
            return None;
        }
        self.slots[(self.read_index + index) % self.capacity()].as_ref()
    }

    /// 从最旧到最新遍历已占用记录
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        (0..self.len()).filter_map(move |i| self.get(i))
    }

    /// 已占用字节总数（逻辑字节流长度）
    pub fn total_occupied_bytes(&self) -> usize {
        self.used_bytes
    }

    /// 查找累计偏移所在的记录逻辑下标和记录内偏移
    ///
    /// 只遍历已占用范围，最多检查 N 个槽位；偏移到达或超过总长度时返回 None。
    pub fn find_position_for_offset(&self, cumulative_offset: usize) -> Option<(usize, usize)> {
        let mut counted = 0usize;

        for (index, record) in self.iter().enumerate() {
            if counted + record.len() > cumulative_offset {
                return Some((index, cumulative_offset - counted));
            }
            counted += record.len();
        }

        None
    }

    /// 查找累计偏移对应的记录及记录内偏移
    pub fn find_entry_for_offset(&self, cumulative_offset: usize) -> Option<(&Record, usize)> {
        let (index, intra_offset) = self.find_position_for_offset(cumulative_offset)?;
        self.get(index).map(|record| (record, intra_offset))
    }

    /// 将（记录下标, 记录内偏移）换算为绝对累计偏移
    pub fn resolve_record_and_offset_to_absolute(
        &self,
        record_index: usize,
        intra_offset: usize,
    ) -> Result<u64, LogError> {
        let out_of_range = LogError::OutOfRange {
            index: record_index,
            offset: intra_offset,
        };

        let Some(target) = self.get(record_index) else {
            return Err(out_of_range);
        };
        if intra_offset >= target.len() {
            return Err(out_of_range);
        }

        let prior: usize = self.iter().take(record_index).map(Record::len).sum();
        Ok((prior + intra_offset) as u64)
    }

    /// 清空所有槽位，重置下标和计数
    pub fn clear(&mut self) {
        for slot in self.slots.iter_mut() {
            *slot = None;
        }
        self.write_index = 0;
        self.read_index = 0;
        self.full = false;
        self.used_bytes = 0;
        self.global_seq = 0;
        self.evicted = 0;
    }

    /// 获取统计信息
    pub fn stats(&self) -> LogStats {
        LogStats {
            capacity: self.capacity(),
            records: self.len(),
            used_bytes: self.used_bytes,
            global_seq: self.global_seq,
            evicted: self.evicted,
        }
    }

    /// 检查槽位不变式（测试用）
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        let occupied = self.len();
        let capacity = self.capacity();
        if self.full {
            assert_eq!(self.read_index, self.write_index);
        }
        for i in 0..capacity {
            let logical = (i + capacity - self.read_index) % capacity;
            let live = logical < occupied;
            assert_eq!(
                self.slots[i].is_some(),
                live,
                "slot {} liveness mismatch (read={}, write={}, full={})",
                i,
                self.read_index,
                self.write_index,
                self.full
            );
        }
        let bytes: usize = self.iter().map(Record::len).sum();
        assert_eq!(bytes, self.used_bytes);
    }
}
