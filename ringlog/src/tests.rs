//! 单元测试模块
//!
//! 环形记录日志的端到端用例：分帧 -> 提交 -> 读取/定位

use crate::config::LogConfig;
use crate::error::LogError;
use crate::framing::FeedResult;
use crate::shared::SharedLog;
use bytes::Bytes;
use std::io::{Read, Seek, SeekFrom};

fn commit_all(log: &SharedLog, records: &[&'static str]) {
    for r in records {
        log.commit(Bytes::from_static(r.as_bytes())).unwrap();
    }
}

#[test]
fn test_ring_basic() {
    println!("\n=== 容量 3，写入 4 条 ===");
    let log = SharedLog::new(LogConfig::with_capacity(3)).unwrap();
    commit_all(&log, &["a\n", "bb\n", "ccc\n", "dddd\n"]);

    let snapshot = log.read_all().unwrap();
    println!("{}", log.stats().unwrap());
    assert_eq!(snapshot.to_vec(), b"bb\nccc\ndddd\n");
    assert_eq!(snapshot.total_bytes(), 12);
    assert_eq!(log.total_occupied_bytes().unwrap(), 12);

    assert_eq!(log.resolve_seek(0, 0).unwrap(), 0);
    assert_eq!(log.resolve_seek(2, 0).unwrap(), 7);
    assert_eq!(log.read_from_offset(7, 5).unwrap(), b"dddd\n");
    println!("=== 基本用例通过 ===\n");
}

#[test]
fn test_read_all_is_idempotent() {
    let log = SharedLog::new(LogConfig::with_capacity(4)).unwrap();
    commit_all(&log, &["x\n", "yy\n"]);

    let first = log.read_all().unwrap();
    let second = log.read_all().unwrap();
    assert_eq!(first, second, "中间没有提交时两次快照必须一致");
}

#[test]
fn test_eviction_order() {
    println!("\n=== 覆盖顺序测试 ===");
    let capacity = 5;
    let log = SharedLog::new(LogConfig::with_capacity(capacity)).unwrap();

    for i in 0..23 {
        log.commit(Bytes::from(format!("line {}\n", i))).unwrap();

        // 保留的始终是最近 min(i+1, N) 条，按新旧顺序
        let kept = (i + 1).min(capacity);
        let expected: String = ((i + 1 - kept)..=i).map(|k| format!("line {}\n", k)).collect();
        let snapshot = log.read_all().unwrap();
        assert_eq!(snapshot.len(), kept);
        assert_eq!(snapshot.to_vec(), expected.as_bytes(), "第 {} 次提交后内容不符", i);
    }

    let stats = log.stats().unwrap();
    println!("{}", stats);
    assert_eq!(stats.global_seq, 23);
    assert_eq!(stats.evicted, 18);
}

#[test]
fn test_offsets_shift_after_eviction() {
    let log = SharedLog::new(LogConfig::with_capacity(2)).unwrap();
    commit_all(&log, &["first\n", "second\n"]);
    assert_eq!(log.read_from_offset(0, 6).unwrap(), b"first\n");

    log.commit(Bytes::from_static(b"third\n")).unwrap();
    // 偏移 0 现在指向 "second"
    assert_eq!(log.read_from_offset(0, 7).unwrap(), b"second\n");
    assert_eq!(log.resolve_seek(1, 0).unwrap(), 7);
}

#[test]
fn test_out_of_range_seek() {
    let log = SharedLog::new(LogConfig::with_capacity(3)).unwrap();
    commit_all(&log, &["abc\n", "de\n"]);

    assert!(matches!(
        log.resolve_seek(2, 0),
        Err(LogError::OutOfRange { index: 2, offset: 0 })
    ));
    assert!(matches!(
        log.resolve_seek(1, 3),
        Err(LogError::OutOfRange { index: 1, offset: 3 })
    ));
    // 记录内最后一个字节可以定位
    assert_eq!(log.resolve_seek(1, 2).unwrap(), 6);

    // 失败不影响存储
    assert_eq!(log.read_all().unwrap().to_vec(), b"abc\nde\n");
}

#[test]
fn test_framing_to_commit() {
    println!("\n=== 分帧提交测试 ===");
    let log = SharedLog::new(LogConfig::with_capacity(4)).unwrap();
    let mut acc = log.accumulator();

    // 模拟一次读取到多行，外加一段未完成的行
    let chunks: [&[u8]; 4] = [b"he", b"llo\nwor", b"ld\nbye\npar", b"tial"];
    for chunk in chunks {
        let mut next = acc.feed(chunk).unwrap().into_record();
        while let Some(record) = next {
            println!("commit {:?}", String::from_utf8_lossy(&record));
            log.commit(record).unwrap();
            next = acc.next_complete().unwrap();
        }
    }

    assert_eq!(log.read_all().unwrap().to_vec(), b"hello\nworld\nbye\n");
    assert_eq!(acc.pending_len(), 7);

    // 连接中断：未完成的记录直接丢弃，不可见
    drop(acc);
    assert_eq!(log.read_all().unwrap().len(), 3);
}

#[test]
fn test_oversize_then_recover() {
    let config = LogConfig {
        capacity: 3,
        max_record_size: Some(16),
        ..LogConfig::default()
    };
    let log = SharedLog::new(config).unwrap();
    let mut acc = log.accumulator();

    let err = acc.feed(&[b'x'; 17]).unwrap_err();
    assert!(matches!(err, LogError::RecordTooLarge { size: 17, limit: 16 }));
    assert!(acc.is_empty(), "超限后累加器必须清空");

    let result = acc.feed(b"short\n").unwrap();
    assert_eq!(result, FeedResult::Complete(Bytes::from_static(b"short\n")));
    log.commit(result.into_record().unwrap()).unwrap();
    assert_eq!(log.read_all().unwrap().to_vec(), b"short\n");
}

#[test]
fn test_cursor_over_wrapped_ring() {
    let log = SharedLog::new(LogConfig::with_capacity(3)).unwrap();
    commit_all(&log, &["1\n", "22\n", "333\n", "4444\n", "55555\n"]);

    // 保留 "333\n4444\n55555\n"
    let mut cursor = log.cursor();
    let mut out = String::new();
    cursor.read_to_string(&mut out).unwrap();
    assert_eq!(out, "333\n4444\n55555\n");

    let pos = cursor.seek_to_record(1, 0).unwrap();
    assert_eq!(pos, 4);
    let mut buf = [0u8; 3];
    cursor.read_exact(&mut buf).unwrap();
    assert_eq!(&buf, b"444");

    assert_eq!(cursor.seek(SeekFrom::End(-6)).unwrap(), 9);
    assert_eq!(cursor.read_to_end_of_log().unwrap(), b"55555\n");
}

#[test]
fn test_capacity_one() {
    let log = SharedLog::new(LogConfig::with_capacity(1)).unwrap();
    for i in 0..5 {
        log.commit(Bytes::from(format!("{}\n", i))).unwrap();
        assert_eq!(log.read_all().unwrap().to_vec(), format!("{}\n", i).as_bytes());
    }
    assert_eq!(log.resolve_seek(0, 1).unwrap(), 1);
    assert!(log.resolve_seek(1, 0).is_err());
}
