//! 摄像头模块
//!
//! 摄像头实例由其全部服务共享，服务只读取摄像头状态

pub mod client;

pub use client::{AlertStream, CameraClient, FrameStream, HttpCameraClient};

use crate::config::CameraConfig;
use crate::error::CameraError;
use std::fmt;
use std::sync::Arc;

/// 摄像头实例
pub struct Camera {
    /// 摄像头配置（只读）
    config: CameraConfig,
    /// I/O客户端
    client: Arc<dyn CameraClient>,
}

impl Camera {
    /// 使用指定客户端创建摄像头
    pub fn new(config: CameraConfig, client: Arc<dyn CameraClient>) -> Self {
        Self { config, client }
    }

    /// 根据配置创建使用HTTP客户端的摄像头
    pub fn from_config(config: CameraConfig) -> Result<Self, CameraError> {
        let client = HttpCameraClient::new(&config)?;
        Ok(Self::new(config, Arc::new(client)))
    }

    pub fn id(&self) -> &str {
        &self.config.id
    }

    pub fn description(&self) -> &str {
        &self.config.description
    }

    /// 摄像头配置的只读视图
    pub fn conf(&self) -> &CameraConfig {
        &self.config
    }

    pub fn client(&self) -> &Arc<dyn CameraClient> {
        &self.client
    }
}

impl fmt::Debug for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Camera")
            .field("id", &self.config.id)
            .field("description", &self.config.description)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for Camera {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.config.description.is_empty() {
            f.write_str(&self.config.id)
        } else {
            write!(f, "{} ({})", self.config.id, self.config.description)
        }
    }
}
