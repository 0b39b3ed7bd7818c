//! 通用工具函数

use crate::config::CommandSectionsVisibility;
use crate::constants::CommandSection;
use chrono::{DateTime, Local, TimeZone, Utc};

/// 默认时间格式
pub const DEFAULT_TIME_FORMAT: &str = "%a %b %d %H:%M:%S %Y";

/// 生成不带连字符的UUID
pub fn gen_uuid() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// 按本地时区格式化时间戳
///
/// # 参数
/// * `ts` - Unix时间戳（秒）
/// * `format` - strftime 格式
pub fn format_ts(ts: i64, format: &str) -> String {
    match Local.timestamp_opt(ts, 0).single() {
        Some(dt) => dt.format(format).to_string(),
        None => ts.to_string(),
    }
}

/// 按本地时区格式化UTC时间
pub fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.with_timezone(&Local).format(DEFAULT_TIME_FORMAT).to_string()
}

/// 用HTML粗体标签包裹文本
pub fn make_bold(text: &str) -> String {
    format!("<b>{text}</b>")
}

/// 渲染命令菜单
///
/// 每个可见分组输出标题和 `/命令` 列表，分组之间空一行。
pub fn build_command_presentation(
    commands: &[(CommandSection, Vec<String>)],
    visibility: &CommandSectionsVisibility,
) -> String {
    commands
        .iter()
        .filter(|(section, cmds)| visibility.is_visible(*section) && !cmds.is_empty())
        .map(|(section, cmds)| {
            let rendered: Vec<String> = cmds.iter().map(|cmd| format!("/{cmd}")).collect();
            format!("{}\n{}", section.title(), rendered.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gen_uuid() {
        let a = gen_uuid();
        let b = gen_uuid();
        assert_eq!(a.len(), 32);
        assert!(!a.contains('-'));
        assert_ne!(a, b);
    }

    #[test]
    fn test_make_bold() {
        assert_eq!(make_bold("cam_1"), "<b>cam_1</b>");
    }

    #[test]
    fn test_format_ts() {
        let formatted = format_ts(0, "%Y");
        assert!(formatted == "1970" || formatted == "1969");
        assert!(!format_ts(1_700_000_000, DEFAULT_TIME_FORMAT).is_empty());
    }

    #[test]
    fn test_build_command_presentation() {
        let commands = vec![
            (
                CommandSection::General,
                vec!["cmds_cam_1".to_string(), "status_cam_1".to_string()],
            ),
            (CommandSection::Alert, vec!["alert_on_cam_1".to_string()]),
            (CommandSection::Stream, vec![]),
        ];

        let rendered =
            build_command_presentation(&commands, &CommandSectionsVisibility::default());
        assert_eq!(
            rendered,
            "General Commands\n/cmds_cam_1\n/status_cam_1\n\nAlert Commands\n/alert_on_cam_1"
        );

        let visibility = CommandSectionsVisibility {
            general: false,
            stream: true,
            alert: true,
        };
        let rendered = build_command_presentation(&commands, &visibility);
        assert_eq!(rendered, "Alert Commands\n/alert_on_cam_1");
    }
}
