//! 服务监管器
//!
//! 管理单个摄像头的全部服务：批量启动已启用的服务、批量停止、汇总状态。
//! 单个服务的失败被隔离记录，不影响其余服务。

use crate::camera::Camera;
use crate::common::status::{CameraStatus, ServiceStatus};
use crate::config::LifecycleTimeouts;
use crate::constants::{ServiceKind, StreamKind};
use crate::error::ServiceError;
use crate::service::{AlarmService, AlertEvent, Service, StreamService};
use chrono::Utc;
use futures::future::join_all;
use futures::FutureExt;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{debug, error, info};

/// 批量操作结果
#[derive(Debug, Default)]
pub struct BulkReport {
    /// 成功的服务
    pub succeeded: Vec<String>,
    /// 跳过的服务（未启用或已在运行）
    pub skipped: Vec<String>,
    /// 失败的服务及错误
    pub failed: Vec<ServiceError>,
}

impl BulkReport {
    /// 是否全部成功
    pub fn is_ok(&self) -> bool {
        self.failed.is_empty()
    }

    /// 合并另一个结果
    pub fn merge(&mut self, other: BulkReport) {
        self.succeeded.extend(other.succeeded);
        self.skipped.extend(other.skipped);
        self.failed.extend(other.failed);
    }
}

impl fmt::Display for BulkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "成功 {}，跳过 {}，失败 {}",
            self.succeeded.len(),
            self.skipped.len(),
            self.failed.len()
        )
    }
}

/// 单个服务操作的结果
enum Outcome {
    Done(String),
    Skipped(String),
    Failed(ServiceError),
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "未知错误".to_string())
}

/// 执行单个服务操作，捕获错误与 panic
async fn isolate<F>(label: String, op: F, on_panic: fn(String, String) -> ServiceError) -> Outcome
where
    F: Future<Output = Result<(), ServiceError>>,
{
    match AssertUnwindSafe(op).catch_unwind().await {
        Ok(Ok(())) => Outcome::Done(label),
        Ok(Err(e)) => {
            error!("{}", e);
            Outcome::Failed(e)
        }
        Err(panic) => {
            let err = on_panic(label, format!("panic: {}", panic_message(panic.as_ref())));
            error!("{}", err);
            Outcome::Failed(err)
        }
    }
}

fn collect(outcomes: Vec<Outcome>) -> BulkReport {
    let mut report = BulkReport::default();
    for outcome in outcomes {
        match outcome {
            Outcome::Done(label) => report.succeeded.push(label),
            Outcome::Skipped(label) => report.skipped.push(label),
            Outcome::Failed(e) => report.failed.push(e),
        }
    }
    report
}

/// 单个摄像头的服务监管器
pub struct ServiceSupervisor {
    camera: Arc<Camera>,
    services: Vec<Arc<dyn Service>>,
}

impl ServiceSupervisor {
    /// 创建不含服务的监管器
    pub fn new(camera: Arc<Camera>) -> Self {
        Self {
            camera,
            services: Vec::new(),
        }
    }

    /// 为摄像头创建标准服务集合：一个告警服务和每种视频流一个服务
    pub fn for_camera(
        camera: Arc<Camera>,
        timeouts: LifecycleTimeouts,
        alerts: broadcast::Sender<AlertEvent>,
    ) -> Self {
        let mut supervisor = Self::new(Arc::clone(&camera));
        supervisor.add_service(Arc::new(AlarmService::new(
            Arc::clone(&camera),
            timeouts,
            alerts,
        )));
        for kind in StreamKind::ALL {
            supervisor.add_service(Arc::new(StreamService::new(
                Arc::clone(&camera),
                kind,
                timeouts,
            )));
        }
        supervisor
    }

    /// 添加服务
    pub fn add_service(&mut self, service: Arc<dyn Service>) {
        debug!("注册服务: {}", service.label());
        self.services.push(service);
    }

    pub fn camera(&self) -> &Arc<Camera> {
        &self.camera
    }

    pub fn services(&self) -> &[Arc<dyn Service>] {
        &self.services
    }

    /// 按服务类别查找服务
    pub fn find(&self, kind: ServiceKind) -> Option<&Arc<dyn Service>> {
        self.services.iter().find(|s| s.kind() == Some(kind))
    }

    /// 并发启动所有在配置中启用的服务
    pub async fn start_enabled(&self) -> BulkReport {
        info!("启动摄像头服务: {}", self.camera);

        let outcomes = join_all(self.services.iter().map(|service| async move {
            let label = service.label();
            if !service.enabled_in_conf() {
                debug!("跳过未启用的服务: {}", label);
                return Outcome::Skipped(label);
            }
            if service.started() {
                debug!("服务已在运行: {}", label);
                return Outcome::Skipped(label);
            }
            isolate(label, service.start(), |service, reason| ServiceError::Start {
                service,
                reason,
            })
            .await
        }))
        .await;

        let report = collect(outcomes);
        info!("摄像头服务启动完成 {}: {}", self.camera.id(), report);
        report
    }

    /// 并发停止所有服务
    ///
    /// 每个服务都会收到 stop 调用，单个服务失败不影响其他服务。
    pub async fn stop_all(&self) -> BulkReport {
        info!("停止摄像头服务: {}", self.camera);

        let outcomes = join_all(self.services.iter().map(|service| {
            let label = service.label();
            isolate(label, service.stop(), |service, reason| ServiceError::Stop {
                service,
                reason,
            })
        }))
        .await;

        let report = collect(outcomes);
        info!("摄像头服务停止完成 {}: {}", self.camera.id(), report);
        report
    }

    /// 采集当前状态
    pub fn status(&self) -> CameraStatus {
        CameraStatus {
            id: self.camera.id().to_string(),
            description: self.camera.description().to_string(),
            services: self
                .services
                .iter()
                .map(|s| ServiceStatus::collect(s.as_ref()))
                .collect(),
            checked_at: Utc::now(),
        }
    }
}
