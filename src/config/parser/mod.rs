//! 配置格式解析器
//!
//! 按配置源格式分派到对应的解析器，每个解析器都返回扁平键值映射

pub mod properties;
pub mod structured;

use crate::config::{Location, SourceFormat, Snapshot};
use crate::error::{ConfigError, FormatError};

impl SourceFormat {
    /// 使用该格式的解析器解析原始内容
    pub fn parse(self, bytes: &[u8]) -> Result<Snapshot, FormatError> {
        match self {
            SourceFormat::Properties => properties::parse(bytes),
            SourceFormat::Json => structured::parse_json(bytes),
            SourceFormat::Yaml => structured::parse_yaml(bytes),
        }
    }
}

/// 按配置源地址推断的格式解析内容
///
/// # 参数
/// * `location` - 内容所属的配置源
/// * `bytes` - 原始内容
///
/// # 返回
/// * `Result<Snapshot, ConfigError>` - 解析结果，失败时携带配置源地址
pub fn parse_location(location: &Location, bytes: &[u8]) -> Result<Snapshot, ConfigError> {
    location
        .format()
        .parse(bytes)
        .map_err(|source| ConfigError::ParseError {
            location: location.to_string(),
            format: location.format(),
            source,
        })
}
