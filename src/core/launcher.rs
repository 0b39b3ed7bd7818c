//! 服务启动器
//!
//! 负责加载配置、注册摄像头、等待关闭信号并停止全部服务

use crate::camera::Camera;
use crate::config::{self, ConfigLoader, TomlConfigLoader};
use crate::core::registry::CameraRegistry;
use crate::signal_handler;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// 服务启动器
pub struct ServiceLauncher;

impl ServiceLauncher {
    /// 以前台模式运行，直到收到中断信号
    pub async fn run(config_path: &Path) -> Result<()> {
        info!("以前台模式启动服务...");

        let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
        signal_handler::setup_signal_handlers(shutdown_tx)
            .await
            .context("设置信号处理器失败")?;

        let config = Self::load_and_validate_config(config_path).await?;
        Self::run_until_shutdown(&config, shutdown_rx).await
    }

    /// 使用给定配置运行，直到关闭通道收到信号
    pub async fn run_until_shutdown(
        config: &config::Config,
        shutdown_rx: broadcast::Receiver<()>,
    ) -> Result<()> {
        // 1. 注册摄像头并启动已启用的服务
        let registry = Self::build_registry(config).await?;

        // 2. 启动告警日志任务
        let alert_logger = Self::spawn_alert_logger(&registry);

        // 3. 等待关闭信号并清理
        Self::handle_shutdown_and_cleanup(shutdown_rx, &registry, alert_logger).await
    }

    /// 加载和验证配置
    pub async fn load_and_validate_config(config_path: &Path) -> Result<config::Config> {
        info!("加载配置文件: {:?}", config_path);

        let config_loader = TomlConfigLoader::new(true);
        let config = config_loader
            .load_from_file(config_path)
            .await
            .context("加载配置文件失败")?;

        info!("配置加载成功，共 {} 个摄像头", config.cameras.len());
        Ok(config)
    }

    /// 创建注册表并注册配置中的所有摄像头
    ///
    /// 个别服务启动失败只记录日志，不影响其余摄像头。
    pub async fn build_registry(config: &config::Config) -> Result<Arc<CameraRegistry>> {
        info!("初始化摄像头服务...");

        let registry = Arc::new(CameraRegistry::new(config.global.timeouts()));

        for camera_config in &config.cameras {
            let camera = Camera::from_config(camera_config.clone())
                .with_context(|| format!("创建摄像头客户端失败: {}", camera_config.id))?;

            // 单个服务的失败已由监管器记录
            registry
                .register(Arc::new(camera))
                .await
                .with_context(|| format!("注册摄像头失败: {}", camera_config.id))?;
        }

        Ok(registry)
    }

    /// 启动告警日志任务
    pub fn spawn_alert_logger(registry: &CameraRegistry) -> JoinHandle<()> {
        let mut alerts = registry.subscribe_alerts();
        tokio::spawn(async move {
            loop {
                match alerts.recv().await {
                    Ok(event) => {
                        info!(
                            camera = %event.camera_id,
                            detection = %event.detection,
                            count = event.alert_count,
                            "检测到告警事件: {}",
                            event.id
                        );
                    }
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        warn!("告警日志落后，丢弃 {} 条事件", skipped);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        })
    }

    /// 处理关闭和清理
    pub async fn handle_shutdown_and_cleanup(
        shutdown_rx: broadcast::Receiver<()>,
        registry: &CameraRegistry,
        alert_logger: JoinHandle<()>,
    ) -> Result<()> {
        info!("等待关闭信号...");
        signal_handler::wait_for_shutdown(shutdown_rx).await;

        info!("正在停止服务...");

        registry.shutdown().await;
        alert_logger.abort();

        info!("服务已停止");
        Ok(())
    }
}
