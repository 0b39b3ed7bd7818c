//! 通用模块
//!
//! 包含状态汇总、命令菜单和工具函数

pub mod menu;
pub mod status;
pub mod utils;

// 重新导出主要类型
pub use menu::{camera_commands, render_menu};
pub use status::{CameraStatus, ServiceStatus};
pub use utils::{build_command_presentation, format_ts, gen_uuid, make_bold};
