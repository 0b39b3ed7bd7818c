//! hikcam-services 主程序入口
//!
//! 海康摄像头告警与视频流服务

use anyhow::{Context, Result};
use clap::Parser;
use hikcam_services::cli::args::{Args, Commands};
use hikcam_services::cli::commands::{
    Command, RunCommand, ServicesCommand, ValidateCommand, VersionCommand,
};
use hikcam_services::config::{ConfigLoader, TomlConfigLoader};
use hikcam_services::logging::{LogConfig, LoggingSystem};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 初始化日志系统，命令行级别优先于配置文件
    let mut log_config = configured_logging(&args).await;
    if let Some(level) = args.log_level {
        log_config.level = level.into();
    }

    LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    info!("{} v{} 启动", hikcam_services::APP_NAME, hikcam_services::VERSION);

    // 执行命令
    if let Err(e) = execute_command(&args).await {
        error!("命令执行失败: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// 读取配置文件中的日志设置，配置不可用时使用默认设置
async fn configured_logging(args: &Args) -> LogConfig {
    if !matches!(args.command, Commands::Run | Commands::Services { .. }) {
        return LogConfig::default();
    }

    TomlConfigLoader::new(true)
        .load_from_file(args.get_config_path())
        .await
        .map(|config| LogConfig::from_global(&config.global))
        .unwrap_or_default()
}

/// 执行CLI命令
async fn execute_command(args: &Args) -> Result<()> {
    let command: &dyn Command = match &args.command {
        Commands::Run => &RunCommand,
        Commands::Validate { .. } => &ValidateCommand,
        Commands::Services { .. } => &ServicesCommand,
        Commands::Version { .. } => &VersionCommand,
    };

    command.execute(args).await.map_err(anyhow::Error::from)
}
