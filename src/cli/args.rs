//! 命令行参数定义
//!
//! 使用clap定义应用程序的命令行接口

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// halfpipe - 多配置源聚合工具
#[derive(Parser, Debug, Clone)]
#[command(
    name = "halfpipe",
    version = crate::VERSION,
    about = crate::APP_DESCRIPTION,
    long_about = None
)]
pub struct Args {
    /// 配置文件路径，优先级高于其他所有配置源
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置文件路径",
        env = "HALFPIPE_CONFIG_FILE",
        global = true
    )]
    pub config: Option<PathBuf>,

    /// 配置源设置文件（TOML）
    #[arg(
        short,
        long,
        value_name = "FILE",
        help = "配置源设置文件",
        env = "HALFPIPE_SETTINGS",
        global = true
    )]
    pub settings: Option<PathBuf>,

    /// 日志级别
    #[arg(
        short,
        long,
        value_enum,
        default_value = "warn",
        help = "日志级别",
        env = "HALFPIPE_LOG_LEVEL",
        global = true
    )]
    pub log_level: LogLevel,

    /// 以JSON格式输出日志
    #[arg(long, help = "以JSON格式输出日志", global = true)]
    pub json_logs: bool,

    /// 日志文件路径，设置后日志不再输出到 stderr
    #[arg(
        long,
        value_name = "FILE",
        help = "日志文件路径",
        env = "HALFPIPE_LOG_FILE",
        global = true
    )]
    pub log_file: Option<PathBuf>,

    /// 子命令
    #[command(subcommand)]
    pub command: Commands,
}

/// 日志级别枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum LogLevel {
    /// 跟踪级别
    Trace,
    /// 调试级别
    Debug,
    /// 信息级别
    Info,
    /// 警告级别
    Warn,
    /// 错误级别
    Error,
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        use tracing_subscriber::filter::LevelFilter;
        match level {
            LogLevel::Trace => LevelFilter::TRACE,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Error => LevelFilter::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
        }
    }
}

/// 子命令定义
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// 列出解析后的配置源
    Sources {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },

    /// 执行一次轮询并输出合并后的配置
    Poll {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: PollFormat,

        /// 超时时间（秒）
        #[arg(
            short,
            long,
            value_name = "SECONDS",
            default_value = "30",
            help = "超时时间（秒）"
        )]
        timeout: u64,
    },

    /// 执行一次轮询并输出单个配置项
    Get {
        /// 配置键
        #[arg(value_name = "KEY", help = "配置键")]
        key: String,

        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,

        /// 超时时间（秒）
        #[arg(
            short,
            long,
            value_name = "SECONDS",
            default_value = "30",
            help = "超时时间（秒）"
        )]
        timeout: u64,
    },

    /// 显示版本信息
    Version {
        /// 输出格式
        #[arg(short, long, value_enum, default_value = "text", help = "输出格式")]
        format: OutputFormat,
    },
}

/// 输出格式枚举
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum OutputFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
}

/// 轮询结果输出格式
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum PollFormat {
    /// 文本格式
    Text,
    /// JSON格式
    Json,
    /// properties 格式
    Properties,
}

impl Args {
    /// 解析命令行参数
    pub fn parse_args() -> Self {
        Self::parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_poll_with_globals() {
        let args = Args::try_parse_from([
            "halfpipe",
            "poll",
            "--format",
            "properties",
            "--config",
            "app.yaml",
            "--timeout",
            "5",
        ])
        .unwrap();

        assert_eq!(args.config, Some(PathBuf::from("app.yaml")));
        match args.command {
            Commands::Poll { format, timeout } => {
                assert_eq!(format, PollFormat::Properties);
                assert_eq!(timeout, 5);
            }
            other => panic!("期望 poll 命令, 实际 {other:?}"),
        }
    }

    #[test]
    fn test_parse_get_defaults() {
        let args = Args::try_parse_from(["halfpipe", "--log-level", "debug", "get", "db.url"]).unwrap();
        assert_eq!(args.log_level, LogLevel::Debug);
        assert!(!args.json_logs);
        assert!(args.log_file.is_none());
        match args.command {
            Commands::Get { key, format, timeout } => {
                assert_eq!(key, "db.url");
                assert_eq!(format, OutputFormat::Text);
                assert_eq!(timeout, 30);
            }
            other => panic!("期望 get 命令, 实际 {other:?}"),
        }
    }

    #[test]
    fn test_properties_format_only_for_poll() {
        assert!(Args::try_parse_from(["halfpipe", "sources", "--format", "properties"]).is_err());
    }

    #[test]
    fn test_parse_log_file_after_subcommand() {
        let args =
            Args::try_parse_from(["halfpipe", "sources", "--log-file", "/tmp/halfpipe.log"]).unwrap();
        assert_eq!(args.log_file, Some(PathBuf::from("/tmp/halfpipe.log")));
    }

    #[test]
    fn test_log_level_display() {
        assert_eq!(LogLevel::Warn.to_string(), "warn");
    }
}
