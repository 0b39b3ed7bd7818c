//! 摄像头服务模块
//!
//! 定义所有摄像头服务（告警监听、视频流转发）共同遵守的生命周期接口

pub mod alarm;
pub mod detector;
pub mod runner;
pub mod stream;

pub use alarm::{AlarmService, AlertEvent};
pub use detector::{AlertFramer, ChunkDetector, ChunkDetectorError};
pub use runner::{ServiceRunner, ServiceState};
pub use stream::StreamService;

use crate::camera::Camera;
use crate::constants::{Detection, ServiceKind};
use crate::error::ServiceError;
use async_trait::async_trait;
use std::sync::Arc;

/// 摄像头服务trait
///
/// 编排器通过该接口统一启动、停止和查询服务，无需了解具体类型。
///
/// 状态机：
/// ```text
/// NOT_STARTED --start()--> RUNNING --stop()--> STOPPED
/// STOPPED     --start()--> RUNNING
/// RUNNING     --start()--> RUNNING   (忽略)
/// NOT_STARTED/STOPPED --stop()--> STOPPED (忽略)
/// ```
#[async_trait]
pub trait Service: Send + Sync {
    /// 服务类型名称，用于日志和菜单
    fn display_name(&self) -> &'static str;

    /// 关联的检测类型
    fn name(&self) -> Option<Detection> {
        None
    }

    /// 服务类别
    fn kind(&self) -> Option<ServiceKind> {
        None
    }

    /// 所属摄像头，构造后不可更改
    fn camera(&self) -> &Arc<Camera>;

    /// 启动服务
    ///
    /// 已运行时忽略并返回 `Ok(())`；失败时服务保持未运行状态。
    async fn start(&self) -> Result<(), ServiceError>;

    /// 停止服务
    ///
    /// 幂等；返回后不再有后台任务运行。
    async fn stop(&self) -> Result<(), ServiceError>;

    /// 服务当前是否运行中
    fn started(&self) -> bool;

    /// 配置中是否启用该服务，与运行状态无关
    fn enabled_in_conf(&self) -> bool;

    /// 当前生命周期状态
    fn state(&self) -> ServiceState {
        if self.started() {
            ServiceState::Running
        } else {
            ServiceState::NotStarted
        }
    }

    /// 日志中使用的完整标识
    fn label(&self) -> String {
        format!("{}/{}", self.camera().id(), self.display_name())
    }
}
