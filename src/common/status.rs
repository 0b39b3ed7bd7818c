//! 服务状态模块
//!
//! 汇总摄像头服务的运行状态，供状态查询和菜单展示使用

use crate::common::utils::{format_datetime, make_bold};
use crate::constants::{Detection, ServiceKind};
use crate::service::{Service, ServiceState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 单个服务的状态快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// 服务类型名称
    pub service: String,
    /// 检测类型
    pub name: Option<Detection>,
    /// 服务类别
    pub kind: Option<ServiceKind>,
    /// 生命周期状态
    pub state: ServiceState,
    /// 是否运行中
    pub started: bool,
    /// 配置中是否启用
    pub enabled: bool,
}

impl ServiceStatus {
    /// 从服务实例采集状态
    pub fn collect(service: &dyn Service) -> Self {
        Self {
            service: service.display_name().to_string(),
            name: service.name(),
            kind: service.kind(),
            state: service.state(),
            started: service.started(),
            enabled: service.enabled_in_conf(),
        }
    }
}

/// 摄像头状态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraStatus {
    /// 摄像头标识
    pub id: String,
    /// 摄像头描述
    pub description: String,
    /// 服务状态列表
    pub services: Vec<ServiceStatus>,
    /// 采集时间
    pub checked_at: DateTime<Utc>,
}

impl CameraStatus {
    /// 运行中的服务数量
    pub fn running_services(&self) -> usize {
        self.services.iter().filter(|s| s.started).count()
    }

    /// 渲染为菜单文本
    pub fn render_text(&self) -> String {
        let mut lines = vec![format!(
            "{} {}",
            make_bold(&self.id),
            self.description.trim()
        )];

        for status in &self.services {
            let kind = status
                .kind
                .map(|k| format!(" [{k}]"))
                .unwrap_or_default();
            let detection = status
                .name
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();
            let enabled = if status.enabled { "enabled" } else { "disabled" };
            lines.push(format!(
                "{}{}{}: {} ({})",
                status.service, kind, detection, status.state, enabled
            ));
        }

        lines.push(format!("Checked at: {}", format_datetime(&self.checked_at)));
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::{AlertStream, Camera, CameraClient, FrameStream};
    use crate::config::{AlertConfig, CameraConfig, DetectionConfig, LifecycleTimeouts};
    use crate::constants::{AlarmKind, StreamKind};
    use crate::error::CameraError;
    use crate::service::{AlarmService, StreamService};
    use async_trait::async_trait;
    use futures::stream::{self, StreamExt};
    use std::sync::Arc;
    use tokio::sync::broadcast;

    struct PendingClient;

    #[async_trait]
    impl CameraClient for PendingClient {
        async fn open_alert_stream(&self, _path: &str) -> Result<AlertStream, CameraError> {
            Ok(stream::pending().boxed())
        }

        async fn open_video_stream(&self, _path: &str) -> Result<FrameStream, CameraError> {
            Ok(stream::pending().boxed())
        }
    }

    fn camera() -> Arc<Camera> {
        let config = CameraConfig {
            id: "cam_1".to_string(),
            description: "Front door".to_string(),
            base_url: "http://192.168.1.10".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            alert: AlertConfig {
                enabled: true,
                motion: DetectionConfig { enabled: true },
                ..Default::default()
            },
            streams: Default::default(),
            command_sections_visibility: Default::default(),
        };
        Arc::new(Camera::new(config, Arc::new(PendingClient)))
    }

    fn sample_status() -> CameraStatus {
        CameraStatus {
            id: "cam_1".to_string(),
            description: "Front door".to_string(),
            services: vec![
                ServiceStatus {
                    service: "AlarmService".to_string(),
                    name: None,
                    kind: Some(ServiceKind::Alarm(AlarmKind::AlertStream)),
                    state: ServiceState::Running,
                    started: true,
                    enabled: true,
                },
                ServiceStatus {
                    service: "StreamService".to_string(),
                    name: None,
                    kind: Some(ServiceKind::Stream(StreamKind::Dvr)),
                    state: ServiceState::NotStarted,
                    started: false,
                    enabled: false,
                },
            ],
            checked_at: Utc::now(),
        }
    }

    #[test]
    fn test_render_text() {
        let status = sample_status();
        let text = status.render_text();

        assert!(text.starts_with("<b>cam_1</b> Front door"));
        assert!(text.contains("AlarmService [alarm/alert_stream]: running (enabled)"));
        assert!(text.contains("StreamService [stream/dvr]: not started (disabled)"));
        assert!(text.contains("Checked at: "));
        assert_eq!(status.running_services(), 1);
    }

    #[tokio::test]
    async fn test_collect_from_services() {
        let camera = camera();
        let (events, _) = broadcast::channel(1);
        let alarm = AlarmService::new(Arc::clone(&camera), LifecycleTimeouts::default(), events);
        let dvr = StreamService::new(camera, StreamKind::Dvr, LifecycleTimeouts::default());

        alarm.start().await.unwrap();
        let alarm_status = ServiceStatus::collect(&alarm);
        let dvr_status = ServiceStatus::collect(&dvr);
        alarm.stop().await.unwrap();

        let status = sample_status();
        assert_eq!(alarm_status, status.services[0]);
        assert_eq!(dvr_status, status.services[1]);
    }

    #[test]
    fn test_status_json() {
        let status = sample_status();
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["services"][0]["state"], "running");
        assert_eq!(json["services"][1]["kind"]["category"], "stream");
        assert_eq!(json["services"][1]["kind"]["type"], "dvr");
    }
}
