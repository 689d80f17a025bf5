//! 偏移换算
//!
//! 顺序读（字节流文件位置）和随机定位（记录下标 + 记录内偏移）共用同一套
//! 回绕感知的遍历，只是参数形状和错误语义不同。
//!
//! 两种寻址方式的流末尾统一定义为 `total_occupied_bytes()`：
//! - 顺序读在 `pos >= end` 时返回 0 字节
//! - `Seek` 接受 `0..=end` 内的任意位置，超出返回 `InvalidInput`

use std::io::{self, Read, Seek, SeekFrom};

use crate::error::LogError;
use crate::shared::SharedLog;
use crate::store::RecordStore;

/// 字节流位置对应的记录位置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryPosition {
    /// 记录逻辑下标（0 = 最旧）
    pub index: usize,
    /// 记录内偏移
    pub intra_offset: usize,
}

/// 累计偏移 -> 记录位置
pub fn locate(store: &RecordStore, cumulative_offset: usize) -> Option<EntryPosition> {
    store
        .find_position_for_offset(cumulative_offset)
        .map(|(index, intra_offset)| EntryPosition {
            index,
            intra_offset,
        })
}

/// 记录位置 -> 累计偏移
pub fn seek_target(
    store: &RecordStore,
    record_index: usize,
    intra_offset: usize,
) -> Result<u64, LogError> {
    store.resolve_record_and_offset_to_absolute(record_index, intra_offset)
}

/// 从累计偏移开始依次给出各记录的剩余片段
pub fn segments(store: &RecordStore, cumulative_offset: usize) -> impl Iterator<Item = &[u8]> + '_ {
    let start = locate(store, cumulative_offset);

    store.iter().enumerate().filter_map(move |(i, record)| {
        let start = start?;
        if i < start.index {
            None
        } else if i == start.index {
            Some(&record.as_bytes()[start.intra_offset..])
        } else {
            Some(record.as_bytes())
        }
    })
}

/// 从累计偏移复制最多 max_bytes 字节，可跨越多条记录
pub fn copy_from(
    store: &RecordStore,
    cumulative_offset: usize,
    max_bytes: usize,
) -> Result<Vec<u8>, LogError> {
    let available = store
        .total_occupied_bytes()
        .saturating_sub(cumulative_offset);
    let wanted = max_bytes.min(available);

    let mut out = Vec::new();
    if wanted == 0 {
        return Ok(out);
    }
    out.try_reserve_exact(wanted)?;

    for segment in segments(store, cumulative_offset) {
        let take = segment.len().min(wanted - out.len());
        out.extend_from_slice(&segment[..take]);
        if out.len() == wanted {
            break;
        }
    }

    Ok(out)
}

/// 从累计偏移复制到调用方缓冲，返回实际复制的字节数
pub fn copy_into(store: &RecordStore, cumulative_offset: usize, buf: &mut [u8]) -> usize {
    let mut copied = 0;

    for segment in segments(store, cumulative_offset) {
        let take = segment.len().min(buf.len() - copied);
        buf[copied..copied + take].copy_from_slice(&segment[..take]);
        copied += take;
        if copied == buf.len() {
            break;
        }
    }

    copied
}

/// 读者私有的文件位置
///
/// 每次 `read` 按实际复制的字节推进位置，跨记录边界一次读完。
/// 记录被淘汰后偏移整体前移，游标位置不做修正。
#[derive(Debug, Clone)]
pub struct LogCursor {
    log: SharedLog,
    pos: u64,
}

impl LogCursor {
    pub fn new(log: SharedLog) -> Self {
        Self { log, pos: 0 }
    }

    pub fn position(&self) -> u64 {
        self.pos
    }

    /// 按记录下标定位（控制请求）
    pub fn seek_to_record(
        &mut self,
        record_index: usize,
        intra_offset: usize,
    ) -> Result<u64, LogError> {
        let absolute = self.log.resolve_seek(record_index, intra_offset)?;
        self.pos = absolute;
        Ok(absolute)
    }

    /// 从当前位置读取最多 max_bytes 字节并推进位置
    pub fn read_chunk(&mut self, max_bytes: usize) -> Result<Vec<u8>, LogError> {
        let data = self.log.read_from_offset(self.offset(), max_bytes)?;
        self.pos += data.len() as u64;
        Ok(data)
    }

    /// 读取当前位置到流末尾的全部内容
    pub fn read_to_end_of_log(&mut self) -> Result<Vec<u8>, LogError> {
        self.read_chunk(usize::MAX)
    }

    fn offset(&self) -> usize {
        usize::try_from(self.pos).unwrap_or(usize::MAX)
    }
}

impl Read for LogCursor {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.log.read_into(self.offset(), buf)?;
        self.pos += n as u64;
        Ok(n)
    }
}

impl Seek for LogCursor {
    fn seek(&mut self, from: SeekFrom) -> io::Result<u64> {
        let end = self.log.total_occupied_bytes()? as i128;
        let target = match from {
            SeekFrom::Start(n) => n as i128,
            SeekFrom::Current(delta) => self.pos as i128 + delta as i128,
            SeekFrom::End(delta) => end + delta as i128,
        };

        if target < 0 || target > end {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("seek position {} outside 0..={}", target, end),
            ));
        }

        self.pos = target as u64;
        Ok(self.pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LogConfig;
    use bytes::Bytes;

    fn store_with(capacity: usize, records: &[&'static str]) -> RecordStore {
        let mut store = RecordStore::new(capacity).unwrap();
        for r in records {
            store.add_record(Bytes::from_static(r.as_bytes()));
        }
        store
    }

    #[test]
    fn test_locate_record_boundaries() {
        let store = store_with(4, &["abc\n", "de\n", "f\n"]);

        assert_eq!(
            locate(&store, 3),
            Some(EntryPosition {
                index: 0,
                intra_offset: 3
            })
        );
        assert_eq!(
            locate(&store, 4),
            Some(EntryPosition {
                index: 1,
                intra_offset: 0
            })
        );
        assert_eq!(
            locate(&store, 8),
            Some(EntryPosition {
                index: 2,
                intra_offset: 1
            })
        );
        assert_eq!(locate(&store, 9), None);
    }

    #[test]
    fn test_seek_target_matches_locate() {
        let store = store_with(3, &["a\n", "bb\n", "ccc\n", "dddd\n"]);
        for index in 0..store.len() {
            let len = store.get(index).unwrap().len();
            for k in 0..len {
                let absolute = seek_target(&store, index, k).unwrap() as usize;
                assert_eq!(
                    locate(&store, absolute),
                    Some(EntryPosition {
                        index,
                        intra_offset: k
                    })
                );
            }
        }
    }

    #[test]
    fn test_copy_spans_records() {
        let store = store_with(4, &["abc\n", "de\n", "f\n"]);

        assert_eq!(copy_from(&store, 2, 4).unwrap(), b"c\nde");
        assert_eq!(copy_from(&store, 2, 100).unwrap(), b"c\nde\nf\n");
        assert_eq!(copy_from(&store, 0, 0).unwrap(), b"");
        assert_eq!(copy_from(&store, 9, 10).unwrap(), b"");

        let mut buf = [0u8; 5];
        assert_eq!(copy_into(&store, 1, &mut buf), 5);
        assert_eq!(&buf, b"bc\nde");
        assert_eq!(copy_into(&store, 8, &mut buf), 1);
        assert_eq!(buf[0], b'\n');
    }

    #[test]
    fn test_cursor_sequential_read() {
        let log = SharedLog::new(LogConfig::with_capacity(4)).unwrap();
        for line in ["abc\n", "de\n", "f\n"] {
            log.commit(Bytes::from_static(line.as_bytes())).unwrap();
        }

        let mut cursor = log.cursor();
        let mut buf = [0u8; 5];
        assert_eq!(cursor.read(&mut buf).unwrap(), 5);
        assert_eq!(&buf, b"abc\nd");
        assert_eq!(cursor.position(), 5);

        assert_eq!(cursor.read(&mut buf).unwrap(), 4);
        assert_eq!(&buf[..4], b"e\nf\n");
        // 流末尾
        assert_eq!(cursor.read(&mut buf).unwrap(), 0);
        assert_eq!(cursor.position(), 9);

        let mut all = Vec::new();
        cursor.seek(SeekFrom::Start(0)).unwrap();
        cursor.read_to_end(&mut all).unwrap();
        assert_eq!(all, b"abc\nde\nf\n");
    }

    #[test]
    fn test_cursor_seek_bounds() {
        let log = SharedLog::new(LogConfig::with_capacity(4)).unwrap();
        log.commit(Bytes::from_static(b"hello\n")).unwrap();

        let mut cursor = log.cursor();
        assert_eq!(cursor.seek(SeekFrom::End(0)).unwrap(), 6);
        assert_eq!(cursor.seek(SeekFrom::Current(-2)).unwrap(), 4);
        assert_eq!(cursor.read_chunk(10).unwrap(), b"o\n");

        assert!(cursor.seek(SeekFrom::End(1)).is_err());
        assert!(cursor.seek(SeekFrom::Current(-100)).is_err());
        // 失败的 seek 不移动位置
        assert_eq!(cursor.position(), 6);
    }

    #[test]
    fn test_cursor_seek_to_record() {
        let log = SharedLog::new(LogConfig::with_capacity(3)).unwrap();
        for line in ["a\n", "bb\n", "ccc\n", "dddd\n"] {
            log.commit(Bytes::from_static(line.as_bytes())).unwrap();
        }

        let mut cursor = log.cursor();
        assert_eq!(cursor.seek_to_record(1, 2).unwrap(), 5);
        assert_eq!(cursor.read_to_end_of_log().unwrap(), b"c\ndddd\n");

        assert!(matches!(
            cursor.seek_to_record(3, 0),
            Err(LogError::OutOfRange { .. })
        ));
        assert_eq!(cursor.position(), 12);
    }
}
