//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::camera::Camera;
use crate::cli::args::{Args, Commands, OutputFormat};
use crate::common::menu::render_menu;
use crate::common::status::CameraStatus;
use crate::config::{Config, ConfigLoader, TomlConfigLoader};
use crate::core::{ServiceLauncher, ServiceSupervisor};
use crate::error::{CamServicesError, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::broadcast;

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 运行命令
pub struct RunCommand;

#[async_trait]
impl Command for RunCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        ServiceLauncher::run(&args.get_config_path()).await?;
        Ok(())
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = serde_json::json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}

/// 验证命令
pub struct ValidateCommand;

#[async_trait]
impl Command for ValidateCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Validate {
            config_path,
            verbose,
        } = &args.command
        {
            let config_file = config_path
                .clone()
                .unwrap_or_else(|| args.get_config_path());

            self.validate_config_file(&config_file, *verbose).await
        } else {
            Ok(())
        }
    }
}

impl ValidateCommand {
    /// 验证配置文件
    async fn validate_config_file(&self, config_path: &Path, verbose: bool) -> Result<()> {
        println!("验证配置文件: {}", config_path.display());

        let loader = TomlConfigLoader::new(true);
        let config = loader.load_from_file(config_path).await?;

        if verbose {
            println!("配置验证通过！");
            println!("全局配置:");
            println!("  日志级别: {}", config.global.log_level);
            println!("  启动超时: {}秒", config.global.start_timeout_seconds);
            println!("  停止超时: {}秒", config.global.stop_timeout_seconds);

            println!("摄像头配置:");
            for (i, camera) in config.cameras.iter().enumerate() {
                println!("  {}. {} ({})", i + 1, camera.id, camera.base_url);
                println!("     描述: {}", camera.description);
                let detections: Vec<String> = camera
                    .alert
                    .enabled_detections()
                    .iter()
                    .map(|d| d.to_string())
                    .collect();
                println!(
                    "     告警: {}",
                    if camera.alert.enabled {
                        format!("启用 [{}]", detections.join(", "))
                    } else {
                        "未启用".to_string()
                    }
                );
                for kind in crate::constants::StreamKind::ALL {
                    let enabled = camera.streams.get(kind).is_some_and(|s| s.enabled);
                    println!("     {} 视频流: {}", kind, if enabled { "是" } else { "否" });
                }
            }
        } else {
            println!("✓ 配置文件验证通过");
            println!("✓ 找到 {} 个摄像头配置", config.cameras.len());
        }

        Ok(())
    }
}

/// 单个摄像头的服务清单
#[derive(Debug, Serialize)]
pub struct ServiceListing {
    /// 服务状态
    pub status: CameraStatus,
    /// 命令菜单
    pub menu: String,
}

/// 服务清单命令
pub struct ServicesCommand;

#[async_trait]
impl Command for ServicesCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Services { camera, format } = &args.command {
            let loader = TomlConfigLoader::new(true);
            let config = loader.load_from_file(args.get_config_path()).await?;
            let listings = self.list_services(&config, camera.as_deref())?;

            match format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&listings)?);
                }
                OutputFormat::Text => {
                    for listing in &listings {
                        println!("{}", listing.status.render_text());
                        println!();
                        println!("{}", listing.menu);
                        println!();
                    }
                }
            }
        }
        Ok(())
    }
}

impl ServicesCommand {
    /// 为配置中的摄像头组装服务（不启动）并生成清单
    pub fn list_services(
        &self,
        config: &Config,
        camera_filter: Option<&str>,
    ) -> Result<Vec<ServiceListing>> {
        let cameras: Vec<_> = config
            .cameras
            .iter()
            .filter(|c| camera_filter.is_none_or(|id| c.id == id))
            .collect();

        if let Some(id) = camera_filter {
            if cameras.is_empty() {
                return Err(CamServicesError::Other(anyhow::anyhow!(
                    "未找到摄像头: {}",
                    id
                )));
            }
        }

        let (alerts, _) = broadcast::channel(1);
        let timeouts = config.global.timeouts();

        cameras
            .into_iter()
            .map(|camera_config| {
                let camera = Arc::new(Camera::from_config(camera_config.clone())?);
                let supervisor =
                    ServiceSupervisor::for_camera(Arc::clone(&camera), timeouts, alerts.clone());
                Ok(ServiceListing {
                    status: supervisor.status(),
                    menu: render_menu(&camera, supervisor.services()),
                })
            })
            .collect()
    }
}
