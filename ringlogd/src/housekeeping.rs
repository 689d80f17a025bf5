//! 定时时间戳记录
//!
//! 按固定间隔提交一条 `timestamp:<RFC 2822 时间>` 记录，
//! 结尾使用日志配置的分隔符。

use bytes::Bytes;
use chrono::{DateTime, Local, TimeZone};
use ringlog::SharedLog;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::error::DaemonError;

/// 时间戳记录前缀
pub const TIMESTAMP_PREFIX: &str = "timestamp:";

/// 生成一条时间戳记录
pub fn timestamp_record<Tz>(now: &DateTime<Tz>, delimiter: u8) -> Bytes
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    let mut line = format!("{}{}", TIMESTAMP_PREFIX, now.format("%a, %d %b %Y %T %z")).into_bytes();
    line.push(delimiter);
    Bytes::from(line)
}

/// 运行时间戳任务，直到收到停止信号
///
/// 第一条记录在一个间隔之后写入。返回写入的记录数。
pub async fn run_timestamps(
    log: SharedLog,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> Result<u64, DaemonError> {
    let delimiter = log.config().delimiter;
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut written = 0u64;

    info!("ringlogd: Timestamp every {}s", period.as_secs());

    loop {
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() || *shutdown.borrow() {
                    break;
                }
            }
            _ = ticker.tick() => {
                let record = timestamp_record(&Local::now(), delimiter);
                let seq = log.commit(record)?;
                written += 1;
                debug!("ringlogd: timestamp seq={}", seq);
            }
        }
    }

    info!("ringlogd: Timestamp task stopped ({} records)", written);
    Ok(written)
}
