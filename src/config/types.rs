//! 配置数据结构定义
//!
//! 定义应用程序的配置结构体和验证逻辑

use crate::constants::{CommandSection, Detection, StreamKind};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

/// 主配置结构，包含全局配置和摄像头列表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// 全局配置项
    #[serde(default)]
    pub global: GlobalConfig,
    /// 摄像头配置列表
    pub cameras: Vec<CameraConfig>,
}

/// 全局配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GlobalConfig {
    /// 日志级别
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// 日志文件路径，设置后不再输出到控制台
    #[serde(default)]
    pub log_file: Option<PathBuf>,
    /// 是否输出JSON格式日志
    #[serde(default)]
    pub log_json: bool,
    /// 服务启动超时时间（秒）
    #[serde(default = "default_start_timeout")]
    pub start_timeout_seconds: u64,
    /// 服务停止超时时间（秒）
    #[serde(default = "default_stop_timeout")]
    pub stop_timeout_seconds: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_file: None,
            log_json: false,
            start_timeout_seconds: default_start_timeout(),
            stop_timeout_seconds: default_stop_timeout(),
        }
    }
}

impl GlobalConfig {
    /// 生命周期超时设置
    pub fn timeouts(&self) -> LifecycleTimeouts {
        LifecycleTimeouts {
            start: Duration::from_secs(self.start_timeout_seconds),
            stop: Duration::from_secs(self.stop_timeout_seconds),
        }
    }
}

/// 服务启动/停止的超时设置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleTimeouts {
    pub start: Duration,
    pub stop: Duration,
}

impl Default for LifecycleTimeouts {
    fn default() -> Self {
        GlobalConfig::default().timeouts()
    }
}

/// 摄像头配置结构
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CameraConfig {
    /// 摄像头标识
    pub id: String,
    /// 摄像头描述
    #[serde(default)]
    pub description: String,
    /// 摄像头地址，如 http://192.168.1.10
    pub base_url: String,
    /// 用户名
    pub username: String,
    /// 密码
    pub password: String,
    /// 告警配置
    #[serde(default)]
    pub alert: AlertConfig,
    /// 视频流配置
    #[serde(default)]
    pub streams: StreamsConfig,
    /// 命令分组可见性
    #[serde(default)]
    pub command_sections_visibility: CommandSectionsVisibility,
}

/// 告警配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertConfig {
    /// 是否启用告警监听
    #[serde(default)]
    pub enabled: bool,
    /// 两次告警之间的最小间隔（秒）
    #[serde(default = "default_alert_delay")]
    pub delay_seconds: u64,
    /// 告警流路径
    #[serde(default = "default_alert_stream_path")]
    pub stream_path: String,
    #[serde(default)]
    pub motion: DetectionConfig,
    #[serde(default)]
    pub line: DetectionConfig,
    #[serde(default)]
    pub intrusion: DetectionConfig,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            delay_seconds: default_alert_delay(),
            stream_path: default_alert_stream_path(),
            motion: DetectionConfig::default(),
            line: DetectionConfig::default(),
            intrusion: DetectionConfig::default(),
        }
    }
}

impl AlertConfig {
    /// 获取指定检测类型的配置
    pub fn detection(&self, detection: Detection) -> &DetectionConfig {
        match detection {
            Detection::Motion => &self.motion,
            Detection::Line => &self.line,
            Detection::Intrusion => &self.intrusion,
        }
    }

    /// 已启用的检测类型
    pub fn enabled_detections(&self) -> Vec<Detection> {
        Detection::ALL
            .into_iter()
            .filter(|d| self.detection(*d).enabled)
            .collect()
    }
}

/// 单个检测类型的配置
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DetectionConfig {
    /// 是否启用
    #[serde(default)]
    pub enabled: bool,
}

/// 视频流配置集合
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct StreamsConfig {
    pub direct: Option<StreamConfig>,
    pub dvr: Option<StreamConfig>,
}

impl StreamsConfig {
    /// 获取指定视频流类型的配置
    pub fn get(&self, kind: StreamKind) -> Option<&StreamConfig> {
        match kind {
            StreamKind::Direct => self.direct.as_ref(),
            StreamKind::Dvr => self.dvr.as_ref(),
        }
    }
}

/// 单个视频流配置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StreamConfig {
    /// 是否启用
    #[serde(default)]
    pub enabled: bool,
    /// 视频流路径
    #[serde(default)]
    pub url_path: String,
    /// 订阅通道缓冲区大小
    #[serde(default = "default_frame_buffer")]
    pub frame_buffer: usize,
}

/// 命令分组可见性
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CommandSectionsVisibility {
    #[serde(default = "default_enabled")]
    pub general: bool,
    #[serde(default = "default_enabled")]
    pub stream: bool,
    #[serde(default = "default_enabled")]
    pub alert: bool,
}

impl Default for CommandSectionsVisibility {
    fn default() -> Self {
        Self {
            general: true,
            stream: true,
            alert: true,
        }
    }
}

impl CommandSectionsVisibility {
    /// 指定分组是否可见
    pub fn is_visible(&self, section: CommandSection) -> bool {
        match section {
            CommandSection::General => self.general,
            CommandSection::Stream => self.stream,
            CommandSection::Alert => self.alert,
        }
    }
}

// 默认值函数
fn default_log_level() -> String {
    "info".to_string()
}
fn default_start_timeout() -> u64 {
    10
}
fn default_stop_timeout() -> u64 {
    5
}
fn default_alert_delay() -> u64 {
    10
}
fn default_alert_stream_path() -> String {
    "/ISAPI/Event/notification/alertStream".to_string()
}
fn default_frame_buffer() -> usize {
    64
}
fn default_enabled() -> bool {
    true
}

/// 配置验证函数
///
/// # 参数
/// * `config` - 要验证的配置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_config(config: &Config) -> Result<(), String> {
    if config.global.start_timeout_seconds == 0 {
        return Err("启动超时时间不能为0".to_string());
    }

    if config.global.stop_timeout_seconds == 0 {
        return Err("停止超时时间不能为0".to_string());
    }

    let valid_log_levels = ["debug", "info", "warn", "error"];
    if !valid_log_levels.contains(&config.global.log_level.as_str()) {
        return Err(format!(
            "无效的日志级别: {}，支持的级别: {:?}",
            config.global.log_level, valid_log_levels
        ));
    }

    if config.cameras.is_empty() {
        return Err("至少需要配置一个摄像头".to_string());
    }

    let mut seen_ids = HashSet::new();
    for camera in &config.cameras {
        if camera.id.trim().is_empty() {
            return Err("摄像头标识不能为空".to_string());
        }

        if !seen_ids.insert(camera.id.as_str()) {
            return Err(format!("摄像头标识重复: {}", camera.id));
        }

        if !camera.base_url.starts_with("http://") && !camera.base_url.starts_with("https://") {
            return Err(format!("摄像头 {} 的地址格式无效", camera.id));
        }

        if camera.alert.enabled && camera.alert.stream_path.trim().is_empty() {
            return Err(format!("摄像头 {} 的告警流路径不能为空", camera.id));
        }

        for kind in StreamKind::ALL {
            if let Some(stream) = camera.streams.get(kind) {
                if stream.enabled && stream.url_path.trim().is_empty() {
                    return Err(format!(
                        "摄像头 {} 的 {} 视频流路径不能为空",
                        camera.id, kind
                    ));
                }
                if stream.frame_buffer == 0 {
                    return Err(format!(
                        "摄像头 {} 的 {} 视频流缓冲区大小不能为0",
                        camera.id, kind
                    ));
                }
            }
        }
    }

    Ok(())
}
