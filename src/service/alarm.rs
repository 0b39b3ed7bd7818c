//! 告警服务
//!
//! 监听摄像头告警推送流，识别侦测事件并广播告警

use crate::camera::{AlertStream, Camera};
use crate::common::utils::gen_uuid;
use crate::config::LifecycleTimeouts;
use crate::constants::{AlarmKind, Detection, ServiceKind};
use crate::error::ServiceError;
use crate::service::detector::{AlertFramer, ChunkDetector};
use crate::service::runner::{ServiceRunner, ServiceState};
use crate::service::Service;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// 告警事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    /// 事件ID
    pub id: String,
    /// 摄像头标识
    pub camera_id: String,
    /// 检测类型
    pub detection: Detection,
    /// 检测时间
    pub timestamp: DateTime<Utc>,
    /// 服务创建以来的告警次数
    pub alert_count: u64,
}

/// 告警服务
pub struct AlarmService {
    camera: Arc<Camera>,
    runner: ServiceRunner,
    /// 告警计数
    alert_count: Arc<AtomicU64>,
    /// 告警事件发送端
    events: broadcast::Sender<AlertEvent>,
}

impl AlarmService {
    pub const NAME: &'static str = "AlarmService";

    /// 创建新的告警服务
    ///
    /// # 参数
    /// * `camera` - 所属摄像头
    /// * `timeouts` - 启动/停止超时
    /// * `events` - 告警事件发送端，可由多个摄像头共享
    pub fn new(
        camera: Arc<Camera>,
        timeouts: LifecycleTimeouts,
        events: broadcast::Sender<AlertEvent>,
    ) -> Self {
        let label = format!("{}/{}", camera.id(), Self::NAME);
        Self {
            camera,
            runner: ServiceRunner::new(label, timeouts),
            alert_count: Arc::new(AtomicU64::new(0)),
            events,
        }
    }

    /// 服务创建以来发出的告警次数
    pub fn alert_count(&self) -> u64 {
        self.alert_count.load(Ordering::Relaxed)
    }

    /// 订阅告警事件
    pub fn subscribe(&self) -> broadcast::Receiver<AlertEvent> {
        self.events.subscribe()
    }
}

/// 告警监听任务的上下文
struct AlertLoop {
    camera: Arc<Camera>,
    alert_count: Arc<AtomicU64>,
    events: broadcast::Sender<AlertEvent>,
    delay: Duration,
}

impl AlertLoop {
    /// 处理告警流直到被取消或流结束
    async fn run(self, mut stream: AlertStream, shutdown: CancellationToken) {
        info!("启动告警监听任务: {}", self.camera);
        let mut framer = AlertFramer::new();
        let mut wait_before: Option<Instant> = None;

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("退出告警监听任务: {}", self.camera);
                    return;
                }
                next = stream.next() => next,
            };

            let chunk = match next {
                Some(Ok(chunk)) => chunk,
                Some(Err(e)) => {
                    error!("读取告警流失败 {}: {}", self.camera.id(), e);
                    return;
                }
                None => {
                    error!("告警流意外结束: {}", self.camera.id());
                    return;
                }
            };

            for record in framer.push(&chunk) {
                if wait_before.is_some_and(|until| Instant::now() < until) {
                    continue;
                }
                if let Some(detection) = self.detect(&record) {
                    self.send_alert(detection);
                    wait_before = Some(Instant::now() + self.delay);
                }
            }
        }
    }

    /// 识别一条完整告警记录，忽略未启用的检测类型
    fn detect(&self, record: &str) -> Option<Detection> {
        let detection = match ChunkDetector::detect_chunk(record) {
            Ok(detection) => detection?,
            Err(e) => {
                warn!("{}: {}", self.camera.id(), e);
                return None;
            }
        };

        if !self.camera.conf().alert.detection(detection).enabled {
            debug!("忽略未启用的检测类型 {}: {}", self.camera.id(), detection);
            return None;
        }
        Some(detection)
    }

    fn send_alert(&self, detection: Detection) {
        let alert_count = self.alert_count.fetch_add(1, Ordering::Relaxed) + 1;
        info!("发送告警 {}: {}", self.camera.id(), detection);

        let event = AlertEvent {
            id: gen_uuid(),
            camera_id: self.camera.id().to_string(),
            detection,
            timestamp: Utc::now(),
            alert_count,
        };

        // 没有订阅者时丢弃事件
        if self.events.send(event).is_err() {
            debug!("告警事件无订阅者: {}", self.camera.id());
        }
    }
}

#[async_trait]
impl Service for AlarmService {
    fn display_name(&self) -> &'static str {
        Self::NAME
    }

    fn kind(&self) -> Option<ServiceKind> {
        Some(ServiceKind::Alarm(AlarmKind::AlertStream))
    }

    fn camera(&self) -> &Arc<Camera> {
        &self.camera
    }

    async fn start(&self) -> Result<(), ServiceError> {
        let alert_conf = &self.camera.conf().alert;
        let context = AlertLoop {
            camera: Arc::clone(&self.camera),
            alert_count: Arc::clone(&self.alert_count),
            events: self.events.clone(),
            delay: Duration::from_secs(alert_conf.delay_seconds),
        };

        let client = self.camera.client();
        self.runner
            .start(client.open_alert_stream(&alert_conf.stream_path), move |stream, token| {
                context.run(stream, token)
            })
            .await
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.runner.stop().await
    }

    fn started(&self) -> bool {
        self.runner.is_running()
    }

    fn enabled_in_conf(&self) -> bool {
        let alert = &self.camera.conf().alert;
        alert.enabled && !alert.enabled_detections().is_empty()
    }

    fn state(&self) -> ServiceState {
        self.runner.state()
    }

    fn label(&self) -> String {
        self.runner.label().to_string()
    }
}
