//! 视频流服务
//!
//! 从摄像头读取视频帧并转发给订阅者

use crate::camera::{Camera, FrameStream};
use crate::config::LifecycleTimeouts;
use crate::constants::{ServiceKind, StreamKind};
use crate::error::{CameraError, ServiceError};
use crate::service::runner::{ServiceRunner, ServiceState};
use crate::service::Service;
use async_trait::async_trait;
use futures::StreamExt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

/// 视频帧
pub type Frame = Arc<Vec<u8>>;

/// 视频流服务
pub struct StreamService {
    camera: Arc<Camera>,
    stream_kind: StreamKind,
    runner: ServiceRunner,
    /// 转发的帧数
    frame_count: Arc<AtomicU64>,
    /// 视频帧发送端
    frames: broadcast::Sender<Frame>,
}

impl StreamService {
    pub const NAME: &'static str = "StreamService";

    /// 创建新的视频流服务
    pub fn new(camera: Arc<Camera>, stream_kind: StreamKind, timeouts: LifecycleTimeouts) -> Self {
        let label = format!("{}/{}[{}]", camera.id(), Self::NAME, stream_kind);
        let buffer = camera
            .conf()
            .streams
            .get(stream_kind)
            .map_or(1, |s| s.frame_buffer.max(1));
        let (frames, _) = broadcast::channel(buffer);

        Self {
            camera,
            stream_kind,
            runner: ServiceRunner::new(label, timeouts),
            frame_count: Arc::new(AtomicU64::new(0)),
            frames,
        }
    }

    pub fn stream_kind(&self) -> StreamKind {
        self.stream_kind
    }

    /// 已转发的帧数
    pub fn frame_count(&self) -> u64 {
        self.frame_count.load(Ordering::Relaxed)
    }

    /// 订阅视频帧
    pub fn subscribe(&self) -> broadcast::Receiver<Frame> {
        self.frames.subscribe()
    }

    /// 转发视频帧直到被取消或流结束
    async fn publish(
        label: String,
        mut stream: FrameStream,
        frames: broadcast::Sender<Frame>,
        frame_count: Arc<AtomicU64>,
        shutdown: CancellationToken,
    ) {
        info!("启动视频流转发任务: {}", label);

        loop {
            let next = tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("退出视频流转发任务: {}", label);
                    return;
                }
                next = stream.next() => next,
            };

            match next {
                Some(Ok(frame)) => {
                    frame_count.fetch_add(1, Ordering::Relaxed);
                    // 没有订阅者时丢弃
                    let _ = frames.send(Arc::new(frame));
                }
                Some(Err(e)) => {
                    error!("读取视频流失败 {}: {}", label, e);
                    return;
                }
                None => {
                    error!("视频流意外结束: {}", label);
                    return;
                }
            }
        }
    }
}

#[async_trait]
impl Service for StreamService {
    fn display_name(&self) -> &'static str {
        Self::NAME
    }

    fn kind(&self) -> Option<ServiceKind> {
        Some(ServiceKind::Stream(self.stream_kind))
    }

    fn camera(&self) -> &Arc<Camera> {
        &self.camera
    }

    async fn start(&self) -> Result<(), ServiceError> {
        let label = self.runner.label().to_string();
        let frames = self.frames.clone();
        let frame_count = Arc::clone(&self.frame_count);
        let camera = Arc::clone(&self.camera);
        let stream_kind = self.stream_kind;

        let setup = async move {
            let conf = camera.conf().streams.get(stream_kind).ok_or_else(|| {
                CameraError::StreamClosed(format!("未配置 {stream_kind} 视频流"))
            })?;
            camera.client().open_video_stream(&conf.url_path).await
        };

        self.runner
            .start(setup, move |stream, token| {
                Self::publish(label, stream, frames, frame_count, token)
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
        self.camera
            .conf()
            .streams
            .get(self.stream_kind)
            .is_some_and(|s| s.enabled)
    }

    fn state(&self) -> ServiceState {
        self.runner.state()
    }

    fn label(&self) -> String {
        self.runner.label().to_string()
    }
}
