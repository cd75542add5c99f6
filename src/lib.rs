//! Halfpipe - 多配置源聚合工具
//!
//! 把若干个按地址定位的配置源（properties、JSON、YAML）合并为一个
//! 扁平的配置快照，并提供带校验的 JSON 请求体读取：
//! - 默认资源、环境变量和命令行指定的配置源
//! - 按列表顺序覆盖的整体轮询合并
//! - 配置注册表和变更通知
//! - 收集全部违规信息的请求体校验
//! - 结构化日志记录

pub mod cli;
pub mod config;
pub mod entity;
pub mod error;
pub mod logging;
pub mod web;

// 重新导出主要类型
pub use config::{Location, PollResult, PolledConfigurationSource, Snapshot, UrlConfigurationSource};
pub use entity::{JsonEntityProvider, Validate, Validator, ViolationSet};
pub use error::{ConfigError, EntityError, HalfpipeError};

/// 应用程序版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 应用程序名称
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");

/// 应用程序描述
pub const APP_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");
