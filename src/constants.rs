//! 常量与枚举定义
//!
//! 检测类型、服务类型和命令分组等封闭枚举

use serde::{Deserialize, Serialize};
use std::fmt;

/// 检测类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Detection {
    /// 移动侦测
    Motion,
    /// 越界侦测
    Line,
    /// 区域入侵侦测
    Intrusion,
}

impl Detection {
    /// 所有检测类型
    pub const ALL: [Detection; 3] = [Detection::Motion, Detection::Line, Detection::Intrusion];

    /// 告警流中对应的 eventType 值
    pub fn event_type(&self) -> &'static str {
        match self {
            Detection::Motion => "VMD",
            Detection::Line => "linedetection",
            Detection::Intrusion => "fielddetection",
        }
    }

    /// 根据 eventType 值查找检测类型（大小写不敏感）
    pub fn from_event_type(event_type: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|d| d.event_type().eq_ignore_ascii_case(event_type))
    }

    /// 可读名称
    pub fn as_str(&self) -> &'static str {
        match self {
            Detection::Motion => "motion detection",
            Detection::Line => "line crossing detection",
            Detection::Intrusion => "intrusion detection",
        }
    }
}

impl fmt::Display for Detection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 告警服务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlarmKind {
    /// 摄像头告警推送流
    AlertStream,
}

/// 视频流服务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    /// 直接转发摄像头预览流
    Direct,
    /// 录像转发流
    Dvr,
}

impl StreamKind {
    /// 所有视频流类型
    pub const ALL: [StreamKind; 2] = [StreamKind::Direct, StreamKind::Dvr];

    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Direct => "direct",
            StreamKind::Dvr => "dvr",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 服务类别：告警或视频流
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "category", content = "type", rename_all = "lowercase")]
pub enum ServiceKind {
    Alarm(AlarmKind),
    Stream(StreamKind),
}

impl ServiceKind {
    /// 是否为告警类服务
    pub fn is_alarm(&self) -> bool {
        matches!(self, ServiceKind::Alarm(_))
    }

    /// 是否为视频流类服务
    pub fn is_stream(&self) -> bool {
        matches!(self, ServiceKind::Stream(_))
    }
}

impl fmt::Display for ServiceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceKind::Alarm(AlarmKind::AlertStream) => f.write_str("alarm/alert_stream"),
            ServiceKind::Stream(kind) => write!(f, "stream/{kind}"),
        }
    }
}

/// 命令菜单分组
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandSection {
    /// 通用命令
    General,
    /// 视频流命令
    Stream,
    /// 告警命令
    Alert,
}

impl CommandSection {
    /// 菜单中展示的分组标题
    pub fn title(&self) -> &'static str {
        match self {
            CommandSection::General => "General Commands",
            CommandSection::Stream => "Stream Commands",
            CommandSection::Alert => "Alert Commands",
        }
    }
}
