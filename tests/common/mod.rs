//! 集成测试共用的摄像头与服务构造工具

#![allow(dead_code)]

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use hikcam_services::camera::{AlertStream, Camera, CameraClient, FrameStream};
use hikcam_services::config::{
    AlertConfig, CameraConfig, DetectionConfig, LifecycleTimeouts, StreamConfig, StreamsConfig,
};
use hikcam_services::error::{CameraError, ServiceError};
use hikcam_services::service::{Service, ServiceRunner, ServiceState};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// 告警流与视频流都保持打开、永不产生数据的客户端
pub struct IdleClient;

#[async_trait]
impl CameraClient for IdleClient {
    async fn open_alert_stream(&self, _path: &str) -> Result<AlertStream, CameraError> {
        Ok(stream::pending().boxed())
    }

    async fn open_video_stream(&self, _path: &str) -> Result<FrameStream, CameraError> {
        Ok(stream::pending().boxed())
    }
}

pub fn camera_config(id: &str) -> CameraConfig {
    CameraConfig {
        id: id.to_string(),
        description: "Front door".to_string(),
        base_url: "http://192.168.1.10".to_string(),
        username: "admin".to_string(),
        password: "secret".to_string(),
        alert: AlertConfig {
            enabled: true,
            motion: DetectionConfig { enabled: true },
            ..Default::default()
        },
        streams: StreamsConfig {
            direct: Some(StreamConfig {
                enabled: true,
                url_path: "/ISAPI/Streaming/channels/102/httpPreview".to_string(),
                frame_buffer: 8,
            }),
            dvr: None,
        },
        command_sections_visibility: Default::default(),
    }
}

pub fn idle_camera(id: &str) -> Arc<Camera> {
    Arc::new(Camera::new(camera_config(id), Arc::new(IdleClient)))
}

pub fn short_timeouts() -> LifecycleTimeouts {
    LifecycleTimeouts {
        start: Duration::from_millis(200),
        stop: Duration::from_millis(200),
    }
}

/// 可配置失败行为的测试服务
pub struct MockService {
    name: &'static str,
    camera: Arc<Camera>,
    runner: ServiceRunner,
    enabled: bool,
    fail_start: bool,
    fail_stop: bool,
    panic_on_stop: bool,
    stop_calls: AtomicUsize,
}

impl MockService {
    pub fn new(name: &'static str, camera: Arc<Camera>) -> Self {
        let label = format!("{}/{}", camera.id(), name);
        Self {
            name,
            camera,
            runner: ServiceRunner::new(label, short_timeouts()),
            enabled: true,
            fail_start: false,
            fail_stop: false,
            panic_on_stop: false,
            stop_calls: AtomicUsize::new(0),
        }
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn failing_start(mut self) -> Self {
        self.fail_start = true;
        self
    }

    pub fn failing_stop(mut self) -> Self {
        self.fail_stop = true;
        self
    }

    pub fn panicking_stop(mut self) -> Self {
        self.panic_on_stop = true;
        self
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Service for MockService {
    fn display_name(&self) -> &'static str {
        self.name
    }

    fn camera(&self) -> &Arc<Camera> {
        &self.camera
    }

    async fn start(&self) -> Result<(), ServiceError> {
        let fail = self.fail_start;
        self.runner
            .start(
                async move {
                    if fail {
                        Err("资源获取失败")
                    } else {
                        Ok(())
                    }
                },
                |(), token| async move { token.cancelled().await },
            )
            .await
    }

    async fn stop(&self) -> Result<(), ServiceError> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.panic_on_stop {
            panic!("stop panicked");
        }
        self.runner.stop().await?;
        if self.fail_stop {
            return Err(ServiceError::stop(self.label(), "资源释放失败"));
        }
        Ok(())
    }

    fn started(&self) -> bool {
        self.runner.is_running()
    }

    fn enabled_in_conf(&self) -> bool {
        self.enabled
    }

    fn state(&self) -> ServiceState {
        self.runner.state()
    }
}
