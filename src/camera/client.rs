//! 摄像头客户端
//!
//! 定义服务访问摄像头所需的I/O接口，以及基于HTTP的实现

use crate::config::CameraConfig;
use crate::error::CameraError;
use async_trait::async_trait;
use futures::stream::{BoxStream, StreamExt};
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

/// 告警流，每个元素是一个原始网络数据块
///
/// 数据块不保证与告警记录对齐，由调用方负责分帧。
pub type AlertStream = BoxStream<'static, Result<Vec<u8>, CameraError>>;

/// 视频帧流
pub type FrameStream = BoxStream<'static, Result<Vec<u8>, CameraError>>;

/// 摄像头客户端trait
///
/// 服务只通过该接口与摄像头交互，打开连接的过程即服务启动时的资源获取步骤。
#[async_trait]
pub trait CameraClient: Send + Sync {
    /// 打开告警推送流
    ///
    /// # 参数
    /// * `path` - 告警流路径
    async fn open_alert_stream(&self, path: &str) -> Result<AlertStream, CameraError>;

    /// 打开视频流
    ///
    /// # 参数
    /// * `path` - 视频流路径
    async fn open_video_stream(&self, path: &str) -> Result<FrameStream, CameraError>;
}

/// 基于HTTP的摄像头客户端
///
/// 只负责建立连接和读取字节流，不解析具体协议内容。
pub struct HttpCameraClient {
    /// HTTP客户端
    client: Client,
    /// 摄像头地址
    base_url: String,
    username: String,
    password: String,
}

impl HttpCameraClient {
    /// 默认连接超时时间
    pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

    /// 根据摄像头配置创建客户端
    pub fn new(config: &CameraConfig) -> Result<Self, CameraError> {
        let client = Client::builder()
            .connect_timeout(Self::CONNECT_TIMEOUT)
            .user_agent(format!("{}/{}", crate::APP_NAME, crate::VERSION))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            username: config.username.clone(),
            password: config.password.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// 发起GET请求并返回原始字节流
    async fn open(&self, path: &str) -> Result<FrameStream, CameraError> {
        let url = self.url(path);
        debug!("连接摄像头: {}", url);

        let response = self
            .client
            .get(&url)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| {
                if e.is_connect() || e.is_timeout() {
                    CameraError::ConnectionError { url: url.clone() }
                } else {
                    CameraError::RequestError(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CameraError::UnexpectedStatus {
                status: status.as_u16(),
                url,
            });
        }

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(CameraError::from))
            .boxed())
    }
}

#[async_trait]
impl CameraClient for HttpCameraClient {
    async fn open_alert_stream(&self, path: &str) -> Result<AlertStream, CameraError> {
        self.open(path).await
    }

    async fn open_video_stream(&self, path: &str) -> Result<FrameStream, CameraError> {
        self.open(path).await
    }
}
