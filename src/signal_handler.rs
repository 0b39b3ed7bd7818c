//! 信号处理模块
//!
//! 将 SIGINT/SIGTERM 与 Ctrl+C 转换为关闭广播

use crate::error::Result;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

#[cfg(unix)]
use signal_hook::consts::{SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook_tokio::Signals;

/// 设置信号处理器
pub async fn setup_signal_handlers(shutdown_tx: broadcast::Sender<()>) -> Result<()> {
    #[cfg(unix)]
    {
        setup_unix_signals(shutdown_tx).await
    }
    #[cfg(not(unix))]
    {
        setup_ctrl_c(shutdown_tx);
        Ok(())
    }
}

/// Unix/Linux系统信号处理
#[cfg(unix)]
async fn setup_unix_signals(shutdown_tx: broadcast::Sender<()>) -> Result<()> {
    use futures::stream::StreamExt;

    let signals = Signals::new([SIGINT, SIGTERM])?;
    let handle = signals.handle();

    let shutdown_tx_signals = shutdown_tx.clone();
    tokio::spawn(async move {
        let mut signals = signals;
        while let Some(signal) = signals.next().await {
            match signal {
                SIGINT => info!("接收到 SIGINT 信号，开始优雅关闭..."),
                SIGTERM => info!("接收到 SIGTERM 信号，开始优雅关闭..."),
                _ => {
                    warn!("接收到未处理的信号: {signal}");
                    continue;
                }
            }
            notify_shutdown(&shutdown_tx_signals);
            break;
        }
        handle.close();
    });

    setup_ctrl_c(shutdown_tx);
    Ok(())
}

fn setup_ctrl_c(shutdown_tx: broadcast::Sender<()>) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("接收到 Ctrl+C，开始优雅关闭...");
                notify_shutdown(&shutdown_tx);
            }
            Err(e) => error!("监听中断信号失败: {e}"),
        }
    });
}

fn notify_shutdown(shutdown_tx: &broadcast::Sender<()>) {
    if let Err(e) = shutdown_tx.send(()) {
        error!("发送关闭信号失败: {e}");
    }
}

/// 等待关闭信号
pub async fn wait_for_shutdown(mut shutdown_rx: broadcast::Receiver<()>) {
    match shutdown_rx.recv().await {
        Ok(()) => {
            info!("接收到关闭信号，开始清理资源...");
        }
        Err(e) => {
            error!("等待关闭信号时发生错误: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::time::{sleep, timeout, Duration};

    #[tokio::test]
    async fn test_wait_for_shutdown_signal() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);

        tokio::spawn(async move {
            sleep(Duration::from_millis(50)).await;
            notify_shutdown(&shutdown_tx);
        });

        let result = timeout(Duration::from_secs(1), wait_for_shutdown(shutdown_rx)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_sender_dropped() {
        let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);
        drop(shutdown_tx);

        // 发送端关闭时立即返回
        let result = timeout(Duration::from_secs(1), wait_for_shutdown(shutdown_rx)).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_setup_signal_handlers() {
        let (shutdown_tx, _shutdown_rx) = broadcast::channel(1);
        assert!(setup_signal_handlers(shutdown_tx).await.is_ok());
    }
}
