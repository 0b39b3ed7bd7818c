//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use thiserror::Error;

/// 应用程序的主要错误类型
#[derive(Error, Debug)]
pub enum CamServicesError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 服务生命周期错误
    #[error("服务错误: {0}")]
    Service(#[from] ServiceError),

    /// 摄像头访问错误
    #[error("摄像头错误: {0}")]
    Camera(#[from] CameraError),

    /// 摄像头重复注册
    #[error("摄像头已注册: {0}")]
    DuplicateCamera(String),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置文件解析错误
    #[error("配置文件解析失败: {0}")]
    ParseError(String),

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 环境变量替换错误
    #[error("环境变量替换失败: {var}")]
    EnvVarError { var: String },
}

/// 服务生命周期错误类型
///
/// 启动失败后服务保持未运行状态；停止失败后服务仍被标记为已停止。
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// 启动失败（资源获取失败、超时或被取消）
    #[error("服务 {service} 启动失败: {reason}")]
    Start { service: String, reason: String },

    /// 停止失败（资源释放失败）
    #[error("服务 {service} 停止失败: {reason}")]
    Stop { service: String, reason: String },
}

impl ServiceError {
    /// 创建启动错误
    pub fn start(service: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Start {
            service: service.into(),
            reason: reason.to_string(),
        }
    }

    /// 创建停止错误
    pub fn stop(service: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Stop {
            service: service.into(),
            reason: reason.to_string(),
        }
    }

    /// 出错的服务名称
    pub fn service(&self) -> &str {
        match self {
            Self::Start { service, .. } | Self::Stop { service, .. } => service,
        }
    }
}

/// 摄像头访问错误类型
#[derive(Error, Debug)]
pub enum CameraError {
    /// HTTP请求错误
    #[error("HTTP请求失败: {0}")]
    RequestError(#[from] reqwest::Error),

    /// 连接错误
    #[error("连接失败: {url}")]
    ConnectionError { url: String },

    /// 状态码异常
    #[error("摄像头返回异常状态码 {status}: {url}")]
    UnexpectedStatus { status: u16, url: String },

    /// 数据流意外结束
    #[error("数据流已结束: {0}")]
    StreamClosed(String),
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, CamServicesError>;
