//! 同步访问层
//!
//! 记录存储唯一的共享入口。所有修改和需要一致视图的读取都持有同一把锁，
//! 锁只覆盖内存操作，不跨越任何网络 I/O：
//! - `commit` 锁内完成插入和淘汰，淘汰的记录在解锁后释放
//! - `read_all` 锁内只克隆各记录的 `Bytes` 句柄，之后在锁外发送
//!
//! 提交顺序以获得锁的先后为准。锁中毒视为致命错误（`LogError::LockPoisoned`）。

use bytes::Bytes;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, error, info};

use crate::config::LogConfig;
use crate::error::LogError;
use crate::framing::FramingAccumulator;
use crate::offset::{self, LogCursor};
use crate::store::{LogStats, RecordStore};

/// 全部已占用记录的快照（最旧到最新）
///
/// 快照持有记录句柄，不受之后的淘汰影响。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Snapshot {
    chunks: Vec<Bytes>,
    total_bytes: usize,
}

impl Snapshot {
    /// 记录条数
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn total_bytes(&self) -> usize {
        self.total_bytes
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Bytes> {
        self.chunks.iter()
    }

    /// 拼接为连续字节
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.total_bytes);
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out
    }
}

impl IntoIterator for Snapshot {
    type Item = Bytes;
    type IntoIter = std::vec::IntoIter<Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.into_iter()
    }
}

impl<'a> IntoIterator for &'a Snapshot {
    type Item = &'a Bytes;
    type IntoIter = std::slice::Iter<'a, Bytes>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

/// 共享环形日志句柄
///
/// 克隆开销很小，所有克隆指向同一个存储。
#[derive(Debug, Clone)]
pub struct SharedLog {
    inner: Arc<Mutex<RecordStore>>,
    config: Arc<LogConfig>,
}

impl SharedLog {
    /// 创建空日志
    pub fn new(config: LogConfig) -> Result<Self, LogError> {
        let store = RecordStore::from_config(&config)?;
        info!(
            "ringlog: Created ring with {} slots (max record {:?} bytes)",
            config.capacity, config.max_record_size
        );
        Ok(Self {
            inner: Arc::new(Mutex::new(store)),
            config: Arc::new(config),
        })
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    fn lock(&self) -> Result<MutexGuard<'_, RecordStore>, LogError> {
        self.inner.lock().map_err(|_| {
            error!("ringlog: record store lock poisoned");
            LogError::LockPoisoned
        })
    }

    /// 为一个生产者创建独立的分帧累加器
    pub fn accumulator(&self) -> FramingAccumulator {
        FramingAccumulator::from_config(&self.config)
    }

    /// 创建位于偏移 0 的读游标
    pub fn cursor(&self) -> LogCursor {
        LogCursor::new(self.clone())
    }

    /// 提交一条完整记录，返回其序列号
    ///
    /// 已满时淘汰最旧的一条。插入本身不会失败，因此提交要么完整生效要么不发生。
    pub fn commit(&self, record: Bytes) -> Result<u64, LogError> {
        let len = record.len();
        let (sequence, evicted) = {
            let mut store = self.lock()?;
            let sequence = store.next_sequence();
            let evicted = store.add_record(record);
            (sequence, evicted)
        };

        debug!(
            "ringlog: commit seq={} ({} bytes){}",
            sequence,
            len,
            if evicted.is_some() { ", evicted oldest" } else { "" }
        );
        // 淘汰的记录在锁外释放
        drop(evicted);

        Ok(sequence)
    }

    /// 获取全部记录的一致快照
    pub fn read_all(&self) -> Result<Snapshot, LogError> {
        let store = self.lock()?;

        let mut chunks = Vec::new();
        chunks.try_reserve_exact(store.len())?;
        chunks.extend(store.iter().map(|record| record.data.clone()));

        Ok(Snapshot {
            chunks,
            total_bytes: store.total_occupied_bytes(),
        })
    }

    /// 从累计偏移读取最多 max_bytes 字节，可跨越多条记录
    pub fn read_from_offset(
        &self,
        cumulative_offset: usize,
        max_bytes: usize,
    ) -> Result<Vec<u8>, LogError> {
        let store = self.lock()?;
        offset::copy_from(&store, cumulative_offset, max_bytes)
    }

    /// 从累计偏移复制到调用方缓冲
    pub fn read_into(&self, cumulative_offset: usize, buf: &mut [u8]) -> Result<usize, LogError> {
        let store = self.lock()?;
        Ok(offset::copy_into(&store, cumulative_offset, buf))
    }

    /// （记录下标, 记录内偏移）-> 绝对累计偏移
    pub fn resolve_seek(&self, record_index: usize, intra_offset: usize) -> Result<u64, LogError> {
        let store = self.lock()?;
        offset::seek_target(&store, record_index, intra_offset)
    }

    /// 从（记录下标, 记录内偏移）读到流末尾
    ///
    /// 定位和复制在同一次加锁内完成，中间的提交不会让起点错位。
    pub fn read_from_record(
        &self,
        record_index: usize,
        intra_offset: usize,
    ) -> Result<(u64, Vec<u8>), LogError> {
        let store = self.lock()?;
        let absolute = offset::seek_target(&store, record_index, intra_offset)?;
        let data = offset::copy_from(&store, absolute as usize, usize::MAX)?;
        Ok((absolute, data))
    }

    /// 当前逻辑字节流长度
    pub fn total_occupied_bytes(&self) -> Result<usize, LogError> {
        Ok(self.lock()?.total_occupied_bytes())
    }

    /// 清空存储
    pub fn clear(&self) -> Result<(), LogError> {
        let mut store = self.lock()?;
        let dropped = store.len();
        store.clear();
        info!("ringlog: Cleared {} records", dropped);
        Ok(())
    }

    /// 获取统计信息
    pub fn stats(&self) -> Result<LogStats, LogError> {
        Ok(self.lock()?.stats())
    }
}
