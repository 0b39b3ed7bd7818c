//! 服务运行器
//!
//! 为具体服务提供统一的生命周期状态机：
//! - 同一实例上的 start/stop 调用串行执行
//! - 启动阶段可被 stop 取消
//! - 启动与停止都有超时限制
//! - 运行状态由后台任务是否存活实时计算

use crate::config::LifecycleTimeouts;
use crate::error::ServiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// 服务生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceState {
    /// 尚未启动
    NotStarted,
    /// 正在启动（等待资源就绪）
    Starting,
    /// 运行中
    Running,
    /// 已停止
    Stopped,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::NotStarted => "not started",
            ServiceState::Starting => "starting",
            ServiceState::Running => "running",
            ServiceState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

/// 运行中的后台任务
struct RunningTask {
    /// 关闭信号
    shutdown: CancellationToken,
    /// 任务句柄
    handle: JoinHandle<()>,
}

impl RunningTask {
    fn is_alive(&self) -> bool {
        !self.handle.is_finished()
    }
}

/// 运行器内部状态
struct RunState {
    phase: ServiceState,
    running: Option<RunningTask>,
    /// 正在进行的启动操作的取消令牌
    pending_start: Option<CancellationToken>,
    /// stop 调用次数，排队中的启动据此判断是否已被取消
    stop_requests: u64,
}

/// 启动阶段的结果
enum SetupOutcome<T> {
    Ready(T),
    Failed(String),
    TimedOut,
    Cancelled,
}

/// 服务运行器
pub struct ServiceRunner {
    /// 日志中使用的服务标识
    label: String,
    /// 超时设置
    timeouts: LifecycleTimeouts,
    /// 串行化同一实例上的 start/stop
    op_lock: tokio::sync::Mutex<()>,
    /// 状态，临界区内不跨越 await
    state: Mutex<RunState>,
}

impl ServiceRunner {
    /// 创建新的服务运行器
    ///
    /// # 参数
    /// * `label` - 服务标识，如 `cam_1/AlarmService`
    /// * `timeouts` - 启动/停止超时设置
    pub fn new(label: impl Into<String>, timeouts: LifecycleTimeouts) -> Self {
        Self {
            label: label.into(),
            timeouts,
            op_lock: tokio::sync::Mutex::new(()),
            state: Mutex::new(RunState {
                phase: ServiceState::NotStarted,
                running: None,
                pending_start: None,
                stop_requests: 0,
            }),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn timeouts(&self) -> LifecycleTimeouts {
        self.timeouts
    }

    fn lock_state(&self) -> MutexGuard<'_, RunState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 后台任务是否存活
    pub fn is_running(&self) -> bool {
        self.lock_state()
            .running
            .as_ref()
            .is_some_and(RunningTask::is_alive)
    }

    /// 当前生命周期状态
    ///
    /// 后台任务自行退出后报告为 `Stopped`。
    pub fn state(&self) -> ServiceState {
        let state = self.lock_state();
        match (&state.phase, &state.running) {
            (ServiceState::Running, Some(task)) if !task.is_alive() => ServiceState::Stopped,
            (phase, _) => *phase,
        }
    }

    /// 启动服务
    ///
    /// `setup` 负责获取资源（如连接摄像头），成功后其结果与关闭信号一起交给
    /// `run` 生成的后台任务。已在运行时直接返回 `Ok(())`。
    ///
    /// # 返回
    /// * `Err(ServiceError::Start)` - 资源获取失败、超时或被 stop 取消，此时没有后台任务存活
    pub async fn start<S, T, E, R, F>(&self, setup: S, run: R) -> Result<(), ServiceError>
    where
        S: Future<Output = Result<T, E>> + Send,
        T: Send,
        E: fmt::Display + Send,
        R: FnOnce(T, CancellationToken) -> F + Send,
        F: Future<Output = ()> + Send + 'static,
    {
        let stops_before = self.lock_state().stop_requests;
        let _guard = self.op_lock.lock().await;

        let (token, prior_phase) = {
            let mut state = self.lock_state();

            if let Some(task) = &state.running {
                if task.is_alive() {
                    warn!("服务已在运行，忽略重复启动: {}", self.label);
                    return Ok(());
                }
            }
            if state.running.take().is_some() {
                debug!("清理已退出的后台任务: {}", self.label);
            }

            // 等待 op_lock 期间已有 stop 请求
            if state.stop_requests != stops_before {
                state.phase = ServiceState::Stopped;
                warn!("服务启动被取消: {}", self.label);
                return Err(ServiceError::start(&self.label, "启动被取消"));
            }

            let token = CancellationToken::new();
            let prior_phase = match state.phase {
                ServiceState::Running | ServiceState::Stopped => ServiceState::Stopped,
                _ => ServiceState::NotStarted,
            };
            state.phase = ServiceState::Starting;
            state.pending_start = Some(token.clone());
            (token, prior_phase)
        };

        info!("启动服务: {}", self.label);

        let outcome = tokio::select! {
            _ = token.cancelled() => SetupOutcome::Cancelled,
            result = tokio::time::timeout(self.timeouts.start, setup) => match result {
                Ok(Ok(resource)) => SetupOutcome::Ready(resource),
                Ok(Err(e)) => SetupOutcome::Failed(e.to_string()),
                Err(_) => SetupOutcome::TimedOut,
            },
        };

        let mut state = self.lock_state();
        state.pending_start = None;

        // setup 完成后 stop 仍可能先于此处取消令牌
        let outcome = match outcome {
            SetupOutcome::Ready(_) if token.is_cancelled() => SetupOutcome::Cancelled,
            other => other,
        };

        match outcome {
            SetupOutcome::Ready(resource) => {
                let handle = tokio::spawn(run(resource, token.clone()));
                state.running = Some(RunningTask {
                    shutdown: token,
                    handle,
                });
                state.phase = ServiceState::Running;
                info!("服务已启动: {}", self.label);
                Ok(())
            }
            SetupOutcome::Cancelled => {
                state.phase = ServiceState::Stopped;
                warn!("服务启动被取消: {}", self.label);
                Err(ServiceError::start(&self.label, "启动被取消"))
            }
            SetupOutcome::TimedOut => {
                state.phase = prior_phase;
                debug!(
                    "服务启动超时: {} ({}秒)",
                    self.label,
                    self.timeouts.start.as_secs_f64()
                );
                Err(ServiceError::start(
                    &self.label,
                    format!("启动超时 ({:?})", self.timeouts.start),
                ))
            }
            SetupOutcome::Failed(reason) => {
                state.phase = prior_phase;
                debug!("服务启动失败: {} - {}", self.label, reason);
                Err(ServiceError::start(&self.label, reason))
            }
        }
    }

    /// 停止服务
    ///
    /// 幂等：未启动或已停止时直接返回 `Ok(())`。正在进行的启动会被取消。
    /// 返回前保证后台任务已退出；即使返回错误，服务也被标记为已停止。
    pub async fn stop(&self) -> Result<(), ServiceError> {
        {
            let mut state = self.lock_state();
            state.stop_requests += 1;
            if let Some(token) = &state.pending_start {
                debug!("取消正在进行的启动: {}", self.label);
                token.cancel();
            }
        }

        let _guard = self.op_lock.lock().await;

        let task = {
            let mut state = self.lock_state();
            let task = state.running.take();
            state.phase = ServiceState::Stopped;
            task
        };

        let Some(RunningTask { shutdown, mut handle }) = task else {
            debug!("服务未运行，无需停止: {}", self.label);
            return Ok(());
        };

        info!("停止服务: {}", self.label);
        shutdown.cancel();

        match tokio::time::timeout(self.timeouts.stop, &mut handle).await {
            Ok(Ok(())) => {
                info!("服务已停止: {}", self.label);
                Ok(())
            }
            Ok(Err(e)) => {
                debug!("服务后台任务异常退出: {} - {}", self.label, e);
                Err(ServiceError::stop(&self.label, format!("后台任务异常退出: {e}")))
            }
            Err(_) => {
                handle.abort();
                // 中止后等待任务真正退出
                let _ = handle.await;
                debug!("等待服务退出超时，已强制中止: {}", self.label);
                Err(ServiceError::stop(
                    &self.label,
                    format!("等待后台任务退出超时 ({:?})", self.timeouts.stop),
                ))
            }
        }
    }
}

impl Drop for ServiceRunner {
    fn drop(&mut self) {
        let state = self.lock_state();
        if let Some(token) = &state.pending_start {
            token.cancel();
        }
        if let Some(task) = &state.running {
            task.shutdown.cancel();
        }
    }
}
