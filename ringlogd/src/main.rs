//! ringlogd - 环形日志 TCP 服务
//!
//! 默认监听 0.0.0.0:9000，每 10 秒追加一条时间戳记录。
//! Ctrl+C 或 SIGTERM 后停止接受连接，等待已有连接退出，最后清空日志。

use anyhow::Result;
use clap::Parser;
use ringlog::SharedLog;
use ringlogd::{run_timestamps, wait_for_shutdown, DaemonConfig, Server};
use tokio::sync::watch;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser)]
#[command(name = "ringlogd")]
#[command(about = "Ring log server - newline framed records over TCP")]
struct Cli {
    /// JSON 配置文件路径
    #[arg(short, long)]
    config: Option<String>,

    /// 监听地址
    #[arg(short, long)]
    listen: Option<String>,

    /// 环容量（记录条数）
    #[arg(short = 'n', long)]
    capacity: Option<usize>,

    /// 单条记录上限（字节），0 表示不限制
    #[arg(short, long)]
    max_record_size: Option<usize>,

    /// 时间戳间隔（秒），0 表示关闭
    #[arg(short, long)]
    timestamp_interval: Option<u64>,

    /// 详细输出
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// 配置文件为基础，命令行参数覆盖
    fn load_config(&self) -> Result<DaemonConfig> {
        let mut config = match &self.config {
            Some(path) => {
                info!("ringlogd: Loading config from {}", path);
                DaemonConfig::from_file(path)?
            }
            None => DaemonConfig::default(),
        };

        if let Some(listen) = &self.listen {
            config.listen = listen.clone();
        }
        if let Some(capacity) = self.capacity {
            config.log.capacity = capacity;
        }
        if let Some(max) = self.max_record_size {
            config.log.max_record_size = (max > 0).then_some(max);
        }
        if let Some(secs) = self.timestamp_interval {
            config.timestamp_interval_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 设置日志
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("ringlogd: Starting...");

    let config = cli.load_config()?;
    info!("ringlogd: Capacity: {} records", config.log.capacity);
    match config.log.max_record_size {
        Some(max) => info!("ringlogd: Max record size: {} bytes", max),
        None => info!("ringlogd: Max record size: unlimited"),
    }

    let log = SharedLog::new(config.log.clone())?;
    let server = Server::bind(&config.listen, log.clone()).await?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        let signal = wait_for_shutdown().await;
        info!("ringlogd: Received {}, stopping...", signal);
        let _ = shutdown_tx.send(true);
    });

    let timestamps = config
        .timestamp_interval()
        .map(|period| tokio::spawn(run_timestamps(log.clone(), period, shutdown_rx.clone())));

    info!("ringlogd: Press Ctrl+C to stop");
    let stats = server.run(shutdown_rx).await?;

    if let Some(handle) = timestamps {
        match handle.await {
            Ok(Ok(_)) => {}
            Ok(Err(e)) => warn!("ringlogd: Timestamp task failed: {}", e),
            Err(e) => warn!("ringlogd: Timestamp task aborted: {}", e),
        }
    }

    print!("{}", stats);
    print!("{}", log.stats()?);
    log.clear()?;

    info!("ringlogd: Done.");
    Ok(())
}
