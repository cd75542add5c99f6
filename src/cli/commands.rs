//! 命令处理逻辑
//!
//! 实现各种CLI命令的处理逻辑

use crate::cli::args::{Args, Commands, OutputFormat, PollFormat};
use crate::config::parser::properties;
use crate::config::{
    ConfigBootstrap, InitState, Snapshot, SourceList, SourceSettings, UrlConfigurationSource,
};
use crate::error::{ConfigError, HalfpipeError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

/// 进程内唯一的配置系统安装状态
static CONFIG_INIT: InitState = InitState::new();

/// 命令处理器trait
#[async_trait]
pub trait Command: Send + Sync {
    /// 执行命令
    async fn execute(&self, args: &Args) -> Result<()>;
}

/// 根据子命令创建处理器
pub fn command_for(command: &Commands) -> Box<dyn Command> {
    match command {
        Commands::Sources { .. } => Box::new(SourcesCommand),
        Commands::Poll { .. } => Box::new(PollCommand),
        Commands::Get { .. } => Box::new(GetCommand),
        Commands::Version { .. } => Box::new(VersionCommand),
    }
}

/// 读取配置源设置，未指定设置文件时使用默认值
pub async fn load_settings(args: &Args) -> Result<SourceSettings> {
    match &args.settings {
        Some(path) => {
            debug!("加载配置源设置: {}", path.display());
            SourceSettings::load_from_file(path).await
        }
        None => Ok(SourceSettings::default()),
    }
}

/// 在超时限制内执行一次配置操作
pub async fn with_timeout<T, F>(seconds: u64, operation: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    tokio::time::timeout(Duration::from_secs(seconds), operation)
        .await
        .map_err(|_| ConfigError::PollTimeout { seconds })?
}

/// 安装配置系统并返回首次轮询后的快照
async fn poll_snapshot(args: &Args, timeout: u64) -> Result<Snapshot> {
    install_and_snapshot(&CONFIG_INIT, args, timeout).await
}

async fn install_and_snapshot(state: &InitState, args: &Args, timeout: u64) -> Result<Snapshot> {
    let settings = load_settings(args).await?;
    let bootstrap = with_timeout(
        timeout,
        ConfigBootstrap::install(state, &settings, args.config.as_deref()),
    )
    .await?
    .ok_or_else(|| HalfpipeError::Other(anyhow::anyhow!("配置系统已经安装")))?;

    if bootstrap.source.sources().is_empty() {
        warn!("未配置任何配置源");
    }

    Ok(Snapshot::clone(&*bootstrap.registry.snapshot().await))
}

/// 配置值的文本形式：字符串原样输出，其他值输出JSON文本
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 渲染配置源列表
pub fn render_sources(sources: &SourceList, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(sources)?),
        OutputFormat::Text => {
            if sources.is_empty() {
                return Ok("未配置任何配置源".to_string());
            }
            let lines: Vec<String> = sources
                .iter()
                .enumerate()
                .map(|(i, location)| format!("{}. {} ({})", i + 1, location, location.format()))
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

/// 渲染合并后的快照
pub fn render_snapshot(snapshot: &Snapshot, format: PollFormat) -> Result<String> {
    match format {
        PollFormat::Json => Ok(serde_json::to_string_pretty(snapshot)?),
        PollFormat::Properties => Ok(properties::render(snapshot).trim_end().to_string()),
        PollFormat::Text => {
            let lines: Vec<String> = snapshot
                .iter()
                .map(|(key, value)| format!("{key} = {}", value_text(value)))
                .collect();
            Ok(lines.join("\n"))
        }
    }
}

/// 渲染单个配置项
pub fn render_value(key: &str, value: &Value, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(&json!({ "key": key, "value": value }))?),
        OutputFormat::Text => Ok(value_text(value)),
    }
}

/// 配置源列表命令
pub struct SourcesCommand;

#[async_trait]
impl Command for SourcesCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Sources { format } = &args.command {
            let settings = load_settings(args).await?;
            let source = UrlConfigurationSource::from_settings(&settings, args.config.as_deref())?;
            println!("{}", render_sources(source.sources(), *format)?);
        }
        Ok(())
    }
}

/// 轮询命令
pub struct PollCommand;

#[async_trait]
impl Command for PollCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Poll { format, timeout } = &args.command {
            let snapshot = poll_snapshot(args, *timeout).await?;
            let output = render_snapshot(&snapshot, *format)?;
            if !output.is_empty() {
                println!("{output}");
            }
        }
        Ok(())
    }
}

/// 单项查询命令
pub struct GetCommand;

#[async_trait]
impl Command for GetCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Get {
            key,
            format,
            timeout,
        } = &args.command
        {
            let snapshot = poll_snapshot(args, *timeout).await?;
            let value = snapshot
                .get(key)
                .ok_or_else(|| HalfpipeError::Other(anyhow::anyhow!("配置项不存在: {key}")))?;
            println!("{}", render_value(key, value, *format)?);
        }
        Ok(())
    }
}

/// 版本命令
pub struct VersionCommand;

#[async_trait]
impl Command for VersionCommand {
    async fn execute(&self, args: &Args) -> Result<()> {
        if let Commands::Version { format } = &args.command {
            match format {
                OutputFormat::Json => {
                    let version_info = json!({
                        "name": crate::APP_NAME,
                        "version": crate::VERSION,
                        "description": crate::APP_DESCRIPTION
                    });
                    println!("{}", serde_json::to_string_pretty(&version_info)?);
                }
                OutputFormat::Text => {
                    println!("{} v{}", crate::APP_NAME, crate::VERSION);
                    println!("{}", crate::APP_DESCRIPTION);
                }
            }
        }
        Ok(())
    }
}
