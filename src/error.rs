//! 错误处理模块
//!
//! 定义应用程序的统一错误类型

use crate::config::SourceFormat;
use crate::entity::ViolationSet;
use thiserror::Error;

/// Halfpipe 的主要错误类型
#[derive(Error, Debug)]
pub enum HalfpipeError {
    /// 配置相关错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),

    /// 请求体相关错误
    #[error("请求体错误: {0}")]
    Entity(#[from] EntityError),

    /// IO错误
    #[error("IO错误: {0}")]
    Io(#[from] std::io::Error),

    /// JSON序列化/反序列化错误
    #[error("JSON错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 其他错误
    #[error("其他错误: {0}")]
    Other(#[from] anyhow::Error),
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    /// 配置源地址格式无效
    #[error("无效的配置源地址 '{location}': {reason}")]
    InvalidLocation { location: String, reason: String },

    /// 不支持的地址协议
    #[error("不支持的配置源协议 '{scheme}': {location}")]
    UnsupportedScheme { location: String, scheme: String },

    /// 配置源读取失败
    #[error("读取配置源失败 {location}: {source}")]
    LoadError {
        location: String,
        #[source]
        source: LoadFailure,
    },

    /// 配置源内容解析失败
    #[error("解析配置源失败 {location} ({format}): {source}")]
    ParseError {
        location: String,
        format: SourceFormat,
        #[source]
        source: FormatError,
    },

    /// 配置验证错误
    #[error("配置验证失败: {0}")]
    ValidationError(String),

    /// 配置文件不存在
    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },

    /// 轮询超时
    #[error("配置轮询超时: {seconds}秒")]
    PollTimeout { seconds: u64 },
}

/// 单个配置源的读取失败原因
#[derive(Error, Debug)]
pub enum LoadFailure {
    /// 文件读取错误
    #[error("{0}")]
    Io(#[from] std::io::Error),

    /// HTTP请求错误
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    /// HTTP状态码非成功
    #[error("HTTP状态码 {0}")]
    Status(u16),
}

/// 配置内容格式错误
#[derive(Error, Debug)]
pub enum FormatError {
    /// properties 格式错误
    #[error("第{line}行: {message}")]
    Properties { line: usize, message: String },

    /// JSON 格式错误
    #[error("{0}")]
    Json(#[from] serde_json::Error),

    /// YAML 格式错误
    #[error("{0}")]
    Yaml(#[from] serde_yaml::Error),

    /// 文档根节点不是映射
    #[error("文档根节点必须是对象，实际为 {0}")]
    RootNotMapping(&'static str),

    /// 不支持的键类型
    #[error("不支持的键类型: {0}")]
    UnsupportedKey(String),
}

/// 请求体读写错误类型
#[derive(Error, Debug)]
pub enum EntityError {
    /// 反序列化失败（结构或类型错误）
    #[error("请求体解析失败: {0}")]
    Deserialize(#[source] serde_json::Error),

    /// 请求体读取失败
    #[error("请求体读取失败: {0}")]
    Body(String),

    /// 校验失败
    #[error("{0}")]
    Invalid(InvalidEntity),

    /// 类型或媒体类型不受支持
    #[error("不支持的实体类型 {type_name} ({media_type})")]
    Unsupported {
        type_name: &'static str,
        media_type: String,
    },

    /// 序列化失败
    #[error("响应体序列化失败: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// 校验失败，携带全部违规信息
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message} {violations}")]
pub struct InvalidEntity {
    /// 固定的提示前缀
    pub message: String,
    /// 全部违规信息
    pub violations: ViolationSet,
}

impl InvalidEntity {
    /// 请求体校验失败时的固定提示
    pub const MESSAGE: &'static str = "The request entity had the following errors:";

    /// 创建校验失败错误
    pub fn new(violations: ViolationSet) -> Self {
        Self {
            message: Self::MESSAGE.to_string(),
            violations,
        }
    }
}

/// 结果类型别名
pub type Result<T> = std::result::Result<T, HalfpipeError>;
