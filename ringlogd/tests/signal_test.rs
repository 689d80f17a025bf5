//! 停止信号测试
//!
//! 单独的测试进程：向自身发送 SIGTERM，确认被捕获为停止信号而不是直接退出。

#![cfg(unix)]

use ringlogd::{wait_for_shutdown, ShutdownSignal};
use std::process::Command;
use std::time::Duration;
use tokio::time::timeout;

#[tokio::test]
async fn test_sigterm_requests_shutdown() {
    let waiter = tokio::spawn(wait_for_shutdown());

    // 等待信号处理注册完成
    tokio::time::sleep(Duration::from_millis(200)).await;

    let status = Command::new("kill")
        .args(["-TERM", &std::process::id().to_string()])
        .status()
        .expect("无法执行 kill");
    assert!(status.success());

    let signal = timeout(Duration::from_secs(5), waiter)
        .await
        .expect("未收到停止信号")
        .unwrap();
    assert_eq!(signal, ShutdownSignal::Terminate);
    assert_eq!(signal.to_string(), "SIGTERM");
}
