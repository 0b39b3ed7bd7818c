//! 日志系统模块
//!
//! 基于 tracing 的结构化日志，`log` 记录通过 tracing-log 桥接

use crate::config::GlobalConfig;
use anyhow::Context;
use log::LevelFilter;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, prelude::*, registry, EnvFilter, Layer};

/// 默认降低日志级别的第三方模块
const NOISY_MODULES: [&str; 3] = ["hyper", "hyper_util", "reqwest"];

/// 订阅者安装结果，进程内只安装一次
static INSTALLED: OnceLock<Result<(), String>> = OnceLock::new();

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    /// 设置后日志写入文件而不是控制台
    pub file_path: Option<PathBuf>,
    pub json_format: bool,
    /// 模块级别日志控制
    pub module_levels: HashMap<String, LevelFilter>,
}

impl Default for LogConfig {
    fn default() -> Self {
        let module_levels = NOISY_MODULES
            .iter()
            .map(|module| (module.to_string(), LevelFilter::Warn))
            .collect();

        Self {
            level: LevelFilter::Info,
            file_path: None,
            json_format: false,
            module_levels,
        }
    }
}

impl LogConfig {
    /// 按配置文件的全局设置创建，无法识别的级别按 info 处理
    pub fn from_global(global: &GlobalConfig) -> Self {
        Self {
            level: global.log_level.parse().unwrap_or(LevelFilter::Info),
            file_path: global.log_file.clone(),
            json_format: global.log_json,
            ..Default::default()
        }
    }

    /// 构建环境过滤器，`RUST_LOG` 中的指令同样生效
    pub(crate) fn env_filter(&self) -> EnvFilter {
        let mut filter = EnvFilter::from_default_env().add_directive(level_directive(self.level));

        for (module, level) in &self.module_levels {
            match format!("{}={}", module, level.as_str().to_lowercase()).parse::<Directive>() {
                Ok(directive) => filter = filter.add_directive(directive),
                Err(e) => eprintln!("忽略无效的模块日志级别 {module}: {e}"),
            }
        }

        filter
    }
}

fn level_directive(level: LevelFilter) -> Directive {
    use tracing_subscriber::filter::LevelFilter as TracingLevel;
    let level = match level {
        LevelFilter::Off => TracingLevel::OFF,
        LevelFilter::Error => TracingLevel::ERROR,
        LevelFilter::Warn => TracingLevel::WARN,
        LevelFilter::Info => TracingLevel::INFO,
        LevelFilter::Debug => TracingLevel::DEBUG,
        LevelFilter::Trace => TracingLevel::TRACE,
    };
    Directive::from(level)
}

pub(crate) fn open_log_file(path: &Path) -> anyhow::Result<File> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("创建日志目录失败: {}", parent.display()))?;
    }
    File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("打开日志文件失败: {}", path.display()))
}

/// 日志系统
pub struct LoggingSystem;

impl LoggingSystem {
    /// 安装全局日志订阅者
    ///
    /// 只有第一次调用生效，之后的调用返回第一次的结果。
    pub fn setup_logging(config: LogConfig) -> anyhow::Result<()> {
        INSTALLED
            .get_or_init(|| Self::install(&config).map_err(|e| format!("{e:#}")))
            .clone()
            .map_err(|e| anyhow::anyhow!("日志系统初始化失败: {}", e))
    }

    fn install(config: &LogConfig) -> anyhow::Result<()> {
        tracing_log::LogTracer::init().context("LogTracer初始化失败")?;

        let timer = fmt::time::ChronoUtc::rfc_3339();
        let layer = match (&config.file_path, config.json_format) {
            (Some(path), json) => {
                let file = open_log_file(path)?;
                let layer = fmt::layer()
                    .with_writer(Mutex::new(file))
                    .with_ansi(false)
                    .with_timer(timer)
                    .with_file(true)
                    .with_line_number(true);
                if json {
                    layer.json().boxed()
                } else {
                    layer.boxed()
                }
            }
            (None, true) => fmt::layer().json().with_timer(timer).boxed(),
            (None, false) => fmt::layer()
                .with_timer(timer)
                .with_target(true)
                .with_thread_names(true)
                .boxed(),
        };

        registry()
            .with(config.env_filter())
            .with(layer)
            .try_init()
            .context("tracing subscriber初始化失败")?;

        tracing::info!("日志系统初始化完成");
        tracing::debug!("日志配置: {:?}", config);
        Ok(())
    }
}
