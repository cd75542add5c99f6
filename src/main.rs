//! Halfpipe 主程序入口
//!
//! 多配置源聚合工具

use anyhow::{Context, Result};
use clap::Parser;
use halfpipe::cli::{command_for, Args};
use halfpipe::logging::{LogConfig, LoggingSystem};
use tracing::{debug, error};

#[tokio::main]
async fn main() -> Result<()> {
    // 解析命令行参数
    let args = Args::parse();

    // 初始化日志系统
    let log_config = LogConfig {
        level: args.log_level.into(),
        file_path: args.log_file.clone(),
        json_format: args.json_logs,
    };

    let _logging_system = LoggingSystem::setup_logging(log_config).context("初始化日志系统失败")?;

    debug!("Halfpipe v{} 启动", halfpipe::VERSION);

    // 执行命令
    let command = command_for(&args.command);
    if let Err(e) = command.execute(&args).await {
        error!("命令执行失败: {}", e);
        eprintln!("错误: {e}");
        std::process::exit(1);
    }

    Ok(())
}
