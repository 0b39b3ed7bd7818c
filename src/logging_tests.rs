//! 日志系统测试模块

#[cfg(test)]
mod tests {
    use crate::config::GlobalConfig;
    use crate::logging::{open_log_file, LogConfig, LoggingSystem};
    use log::LevelFilter;
    use tempfile::TempDir;

    #[test]
    fn test_logging_installs_once() {
        let config = LogConfig {
            level: LevelFilter::Debug,
            ..Default::default()
        };

        assert!(LoggingSystem::setup_logging(config.clone()).is_ok());
        // 第二次调用返回第一次的结果，不会重复安装
        assert!(LoggingSystem::setup_logging(config).is_ok());
        log::info!("log 记录经由 tracing 输出");
    }

    #[test]
    fn test_default_config_quiets_http_stack() {
        let config = LogConfig::default();
        assert_eq!(config.level, LevelFilter::Info);
        assert_eq!(config.module_levels.get("reqwest"), Some(&LevelFilter::Warn));
        assert_eq!(config.module_levels.get("hyper"), Some(&LevelFilter::Warn));
    }

    #[test]
    fn test_config_from_global_settings() {
        let global = GlobalConfig {
            log_level: "debug".to_string(),
            log_file: Some("/tmp/hikcam.log".into()),
            log_json: true,
            ..Default::default()
        };

        let config = LogConfig::from_global(&global);
        assert_eq!(config.level, LevelFilter::Debug);
        assert_eq!(config.file_path, global.log_file);
        assert!(config.json_format);

        let bogus = GlobalConfig {
            log_level: "bogus".to_string(),
            ..Default::default()
        };
        assert_eq!(LogConfig::from_global(&bogus).level, LevelFilter::Info);
    }

    #[test]
    fn test_env_filter_includes_module_levels() {
        let mut config = LogConfig::default();
        config
            .module_levels
            .insert("hikcam_services::service".to_string(), LevelFilter::Debug);

        let filter = config.env_filter().to_string();
        assert!(filter.contains("reqwest=warn"));
        assert!(filter.contains("hikcam_services::service=debug"));
    }

    #[test]
    fn test_open_log_file_creates_parent_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("logs").join("hikcam.log");

        open_log_file(&path).unwrap();
        assert!(path.exists());

        // 已存在的文件以追加方式打开
        open_log_file(&path).unwrap();
    }
}
