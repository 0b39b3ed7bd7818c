//! 摄像头注册表
//!
//! 进程内唯一的摄像头与服务注册表，由程序入口创建一次并以引用方式传递

use crate::camera::Camera;
use crate::common::status::CameraStatus;
use crate::config::LifecycleTimeouts;
use crate::core::supervisor::{BulkReport, ServiceSupervisor};
use crate::error::{CamServicesError, Result};
use crate::service::AlertEvent;
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

/// 告警事件通道容量
const ALERT_CHANNEL_CAPACITY: usize = 256;

/// 摄像头注册表
pub struct CameraRegistry {
    /// 服务超时设置
    timeouts: LifecycleTimeouts,
    /// 摄像头标识到监管器的映射
    supervisors: RwLock<BTreeMap<String, Arc<ServiceSupervisor>>>,
    /// 所有摄像头共享的告警事件通道
    alerts: broadcast::Sender<AlertEvent>,
}

impl CameraRegistry {
    /// 创建新的注册表
    pub fn new(timeouts: LifecycleTimeouts) -> Self {
        let (alerts, _) = broadcast::channel(ALERT_CHANNEL_CAPACITY);
        Self {
            timeouts,
            supervisors: RwLock::new(BTreeMap::new()),
            alerts,
        }
    }

    /// 订阅所有摄像头的告警事件
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<AlertEvent> {
        self.alerts.subscribe()
    }

    /// 注册摄像头并启动其所有已启用的服务
    ///
    /// 单个服务启动失败只记录在返回结果中，注册本身仍然成功。
    pub async fn register(&self, camera: Arc<Camera>) -> Result<BulkReport> {
        let supervisor =
            ServiceSupervisor::for_camera(camera, self.timeouts, self.alerts.clone());
        self.register_supervisor(supervisor).await
    }

    /// 注册已组装好的监管器并启动其已启用的服务
    pub async fn register_supervisor(&self, supervisor: ServiceSupervisor) -> Result<BulkReport> {
        let camera_id = supervisor.camera().id().to_string();
        let supervisor = Arc::new(supervisor);

        {
            let mut supervisors = self.supervisors.write().await;
            if supervisors.contains_key(&camera_id) {
                return Err(CamServicesError::DuplicateCamera(camera_id));
            }
            supervisors.insert(camera_id.clone(), Arc::clone(&supervisor));
        }

        info!("注册摄像头: {}", supervisor.camera());
        Ok(supervisor.start_enabled().await)
    }

    /// 移除摄像头并停止其所有服务
    pub async fn remove(&self, camera_id: &str) -> Option<BulkReport> {
        let supervisor = self.supervisors.write().await.remove(camera_id);
        match supervisor {
            Some(supervisor) => {
                info!("移除摄像头: {}", supervisor.camera());
                Some(supervisor.stop_all().await)
            }
            None => {
                warn!("摄像头未注册: {}", camera_id);
                None
            }
        }
    }

    /// 获取摄像头的监管器
    pub async fn get(&self, camera_id: &str) -> Option<Arc<ServiceSupervisor>> {
        self.supervisors.read().await.get(camera_id).cloned()
    }

    /// 已注册的摄像头标识
    pub async fn camera_ids(&self) -> Vec<String> {
        self.supervisors.read().await.keys().cloned().collect()
    }

    /// 所有摄像头的状态
    pub async fn status(&self) -> Vec<CameraStatus> {
        self.supervisors
            .read()
            .await
            .values()
            .map(|s| s.status())
            .collect()
    }

    /// 停止所有摄像头的全部服务
    ///
    /// 摄像头仍保留在注册表中，可以再次启动。
    pub async fn shutdown(&self) -> BulkReport {
        let supervisors: Vec<Arc<ServiceSupervisor>> =
            self.supervisors.read().await.values().cloned().collect();

        info!("停止全部摄像头服务，摄像头数量: {}", supervisors.len());

        let mut report = BulkReport::default();
        for camera_report in join_all(supervisors.iter().map(|s| s.stop_all())).await {
            report.merge(camera_report);
        }

        info!("全部摄像头服务已停止: {}", report);
        report
    }
}
