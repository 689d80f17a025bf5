//! 停止信号
//!
//! Unix 下同时监听 SIGINT（Ctrl+C）和 SIGTERM，其他平台只监听 Ctrl+C。

use std::fmt;
use tracing::warn;

/// 收到的停止信号
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownSignal::Interrupt => write!(f, "Ctrl+C"),
            ShutdownSignal::Terminate => write!(f, "SIGTERM"),
        }
    }
}

/// 等待第一个停止信号
///
/// 某个信号无法注册时只等待另一个；都无法注册时永不返回。
#[cfg(unix)]
pub async fn wait_for_shutdown() -> ShutdownSignal {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = match signal(SignalKind::terminate()) {
        Ok(s) => Some(s),
        Err(e) => {
            warn!("ringlogd: Failed to install SIGTERM handler: {}", e);
            None
        }
    };

    let terminated = async {
        match terminate.as_mut() {
            Some(s) => {
                s.recv().await;
            }
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(terminated);

    tokio::select! {
        result = tokio::signal::ctrl_c() => match result {
            Ok(()) => ShutdownSignal::Interrupt,
            Err(e) => {
                warn!("ringlogd: Failed to listen for Ctrl+C: {}", e);
                (&mut terminated).await;
                ShutdownSignal::Terminate
            }
        },
        _ = &mut terminated => ShutdownSignal::Terminate,
    }
}

#[cfg(not(unix))]
pub async fn wait_for_shutdown() -> ShutdownSignal {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("ringlogd: Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }
    ShutdownSignal::Interrupt
}
