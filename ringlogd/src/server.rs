//! TCP 服务
//!
//! ```text
//! accept ──> 连接任务(JoinSet) ──feed──> FramingAccumulator
//!                │                            │ 完整记录
//!                │                            v
//!                │<── 回送快照/定位内容 ── SharedLog
//! ```
//!
//! 停止信号通过 `watch` 通道广播：先停止 accept，连接任务在下一次读或写处退出，
//! 再等待全部任务结束。客户端不读取回送数据也不会阻塞停止。
//! 任何连接返回致命错误时整个服务停止。

use bytes::Bytes;
use ringlog::{FeedResult, LogError, SharedLog};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use crate::control::{parse_control, SeekRequest};
use crate::error::DaemonError;

/// 单次接收缓冲大小
pub const RECV_BUFFER_SIZE: usize = 4096;

/// accept 失败后的等待时间
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// 服务统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ServerStats {
    pub connections: u64,
    pub failed_connections: u64,
}

impl std::fmt::Display for ServerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Server Statistics:")?;
        writeln!(f, "  Connections: {}", self.connections)?;
        writeln!(f, "  Failed connections: {}", self.failed_connections)?;
        Ok(())
    }
}

/// 日志服务
pub struct Server {
    listener: TcpListener,
    log: SharedLog,
}

impl Server {
    /// 绑定监听地址
    pub async fn bind(addr: &str, log: SharedLog) -> Result<Self, DaemonError> {
        let listener = TcpListener::bind(addr).await?;
        info!("ringlogd: Listening on {}", listener.local_addr()?);
        Ok(Self { listener, log })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, DaemonError> {
        Ok(self.listener.local_addr()?)
    }

    /// 运行 accept 循环，直到收到停止信号或出现致命错误
    ///
    /// 返回前等待所有连接任务结束，因此不会有提交停在中途。
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<ServerStats, DaemonError> {
        let mut tasks: JoinSet<Result<(), DaemonError>> = JoinSet::new();
        let mut stats = ServerStats::default();
        let mut fatal: Option<DaemonError> = None;

        // 连接任务使用自己的停止通道，致命错误时也能通知它们
        let (stop_tx, stop_rx) = watch::channel(false);

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        info!("ringlogd: Shutdown requested, stop accepting");
                        break;
                    }
                }
                accept = self.listener.accept() => {
                    match accept {
                        Ok((stream, addr)) => {
                            stats.connections += 1;
                            info!("ringlogd: Accepted connection from {}", addr);
                            let log = self.log.clone();
                            let stop = stop_rx.clone();
                            tasks.spawn(handle_connection(stream, addr, log, stop));
                        }
                        Err(e) => {
                            warn!("ringlogd: accept failed: {}", e);
                            tokio::time::sleep(ACCEPT_BACKOFF).await;
                        }
                    }
                }
                Some(joined) = tasks.join_next() => {
                    if let Some(err) = reap(joined, &mut stats) {
                        fatal = Some(err);
                        break;
                    }
                }
            }
        }

        let _ = stop_tx.send(true);
        while let Some(joined) = tasks.join_next().await {
            if let Some(err) = reap(joined, &mut stats) {
                fatal.get_or_insert(err);
            }
        }

        match fatal {
            Some(err) => {
                error!("ringlogd: Fatal error, server stopped: {}", err);
                Err(err)
            }
            None => {
                info!("ringlogd: All connections closed");
                Ok(stats)
            }
        }
    }
}

/// 回收一个连接任务，致命错误原样返回
fn reap(
    joined: Result<Result<(), DaemonError>, tokio::task::JoinError>,
    stats: &mut ServerStats,
) -> Option<DaemonError> {
    match joined {
        Ok(Ok(())) => None,
        Ok(Err(err)) if err.is_fatal() => {
            stats.failed_connections += 1;
            Some(err)
        }
        Ok(Err(err)) => {
            stats.failed_connections += 1;
            warn!("ringlogd: connection error: {}", err);
            None
        }
        Err(e) => {
            stats.failed_connections += 1;
            warn!("ringlogd: connection task aborted: {}", e);
            None
        }
    }
}

/// 连接是否继续处理
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    log: SharedLog,
    mut stop: watch::Receiver<bool>,
) -> Result<(), DaemonError> {
    let mut acc = log.accumulator();
    let mut buf = vec![0u8; RECV_BUFFER_SIZE];

    loop {
        let n = tokio::select! {
            _ = stop.changed() => {
                if !acc.is_empty() {
                    debug!("ringlogd: {} dropping {} pending bytes on shutdown", addr, acc.pending_len());
                }
                return Ok(());
            }
            read = stream.read(&mut buf) => read?,
        };

        if n == 0 {
            if !acc.is_empty() {
                debug!("ringlogd: {} closed with {} pending bytes", addr, acc.pending_len());
            }
            info!("ringlogd: Closed connection from {}", addr);
            return Ok(());
        }

        let mut next = acc.feed(&buf[..n]).map(FeedResult::into_record);
        loop {
            match next {
                Ok(Some(record)) => {
                    if respond(&mut stream, &log, record, &mut stop).await? == Flow::Stop {
                        info!("ringlogd: {} abandoned on shutdown", addr);
                        return Ok(());
                    }
                }
                Ok(None) => break,
                Err(LogError::RecordTooLarge { size, limit }) => {
                    warn!(
                        "ringlogd: {} sent oversized record ({} > {}), discarded",
                        addr, size, limit
                    );
                }
                Err(e) => return Err(e.into()),
            }
            next = acc.next_complete();
        }
    }
}

/// 写出数据，收到停止信号时放弃
///
/// 客户端不读取时写操作可能一直挂起，停止信号优先。
async fn send(
    stream: &mut TcpStream,
    data: &[u8],
    stop: &mut watch::Receiver<bool>,
) -> Result<Flow, DaemonError> {
    tokio::select! {
        _ = stop.changed() => Ok(Flow::Stop),
        written = stream.write_all(data) => {
            written?;
            Ok(Flow::Continue)
        }
    }
}

/// 处理一条完整记录：控制命令或普通提交
async fn respond(
    stream: &mut TcpStream,
    log: &SharedLog,
    record: Bytes,
    stop: &mut watch::Receiver<bool>,
) -> Result<Flow, DaemonError> {
    match parse_control(&record) {
        Some(Ok(request)) => send_from(stream, log, request, stop).await,
        Some(Err(reason)) => {
            warn!("ringlogd: malformed control command: {}", reason);
            Ok(Flow::Continue)
        }
        None => {
            log.commit(record)?;
            let snapshot = log.read_all()?;
            for chunk in &snapshot {
                if send(stream, chunk, stop).await? == Flow::Stop {
                    return Ok(Flow::Stop);
                }
            }
            Ok(Flow::Continue)
        }
    }
}

async fn send_from(
    stream: &mut TcpStream,
    log: &SharedLog,
    request: SeekRequest,
    stop: &mut watch::Receiver<bool>,
) -> Result<Flow, DaemonError> {
    match log.read_from_record(request.record_index, request.intra_offset) {
        Ok((pos, data)) => {
            debug!(
                "ringlogd: seek to record {} offset {} -> {}",
                request.record_index, request.intra_offset, pos
            );
            send(stream, &data, stop).await
        }
        Err(LogError::OutOfRange { index, offset }) => {
            warn!("ringlogd: seek out of range: record {}, offset {}", index, offset);
            Ok(Flow::Continue)
        }
        Err(e) => Err(e.into()),
    }
}
