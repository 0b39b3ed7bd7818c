//! 命令菜单
//!
//! 根据服务在配置中的启用情况决定摄像头暴露哪些命令

use crate::camera::Camera;
use crate::common::utils::build_command_presentation;
use crate::constants::{CommandSection, ServiceKind};
use crate::service::Service;
use std::sync::Arc;

/// 生成摄像头可用的命令分组
///
/// 通用命令总是存在；告警与视频流命令只对配置中启用的服务生成。
pub fn camera_commands(
    camera: &Camera,
    services: &[Arc<dyn Service>],
) -> Vec<(CommandSection, Vec<String>)> {
    let id = camera.id();
    let general = vec![format!("cmds_{id}"), format!("status_{id}")];

    let mut alert = Vec::new();
    let mut stream = Vec::new();
    for service in services.iter().filter(|s| s.enabled_in_conf()) {
        match service.kind() {
            Some(ServiceKind::Alarm(_)) => {
                alert.push(format!("alert_on_{id}"));
                alert.push(format!("alert_off_{id}"));
            }
            Some(ServiceKind::Stream(kind)) => {
                stream.push(format!("stream_{kind}_on_{id}"));
                stream.push(format!("stream_{kind}_off_{id}"));
            }
            None => {}
        }
    }
    alert.dedup();

    vec![
        (CommandSection::General, general),
        (CommandSection::Alert, alert),
        (CommandSection::Stream, stream),
    ]
}

/// 渲染摄像头的命令菜单
pub fn render_menu(camera: &Camera, services: &[Arc<dyn Service>]) -> String {
    build_command_presentation(
        &camera_commands(camera, services),
        &camera.conf().command_sections_visibility,
    )
}
