//! hikcam-services - 海康摄像头告警与视频流服务
//!
//! 为每个摄像头管理一组后台服务，统一生命周期约定：
//! - 告警服务：监听告警推送流，识别移动侦测、越界侦测和区域入侵
//! - 视频流服务：转发直连或 DVR 视频流数据
//! - 批量启动已启用的服务、批量停止全部服务
//! - 按配置决定对外暴露的命令菜单

pub mod camera;
pub mod cli;
pub mod common;
pub mod config;
pub mod constants;
pub mod core;
pub mod error;
pub mod logging;
pub mod service;
pub mod signal_handler;

#[cfg(test)]
mod logging_tests;

// 重新导出主要类型
pub use camera::{Camera, CameraClient, HttpCameraClient};
pub use config::{CameraConfig, Config, GlobalConfig};
pub use self::core::{BulkReport, CameraRegistry, ServiceSupervisor};
pub use error::{CamServicesError, ServiceError};
pub use service::{AlarmService, Service, ServiceState, StreamService};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
