//! 核心模块
//!
//! 包含摄像头注册表、服务监管和应用程序生命周期管理

pub mod launcher;
pub mod registry;
pub mod supervisor;

// 重新导出主要类型
pub use launcher::ServiceLauncher;
pub use registry::CameraRegistry;
pub use supervisor::{BulkReport, ServiceSupervisor};
