//! 配置源地址
//!
//! 定义配置源地址及其格式推断

use crate::error::ConfigError;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use url::Url;

/// 支持的地址协议
const SUPPORTED_SCHEMES: [&str; 3] = ["file", "http", "https"];

/// 配置源内容格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    /// key=value 格式
    Properties,
    /// JSON 文档
    Json,
    /// YAML 文档
    Yaml,
}

impl SourceFormat {
    /// 根据地址后缀推断格式
    ///
    /// `.json` 为 JSON，`.yaml`/`.yml` 为 YAML，其余均按 properties 处理
    pub fn from_address(address: &str) -> Self {
        if address.ends_with(".json") {
            SourceFormat::Json
        } else if address.ends_with(".yaml") || address.ends_with(".yml") {
            SourceFormat::Yaml
        } else {
            SourceFormat::Properties
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFormat::Properties => write!(f, "properties"),
            SourceFormat::Json => write!(f, "json"),
            SourceFormat::Yaml => write!(f, "yaml"),
        }
    }
}

/// 一个可寻址的配置源，解析后不可变
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Location {
    url: Url,
    format: SourceFormat,
}

impl Location {
    /// 解析配置源地址
    ///
    /// 接受 `file:`、`http:`、`https:` URL 以及文件系统路径，
    /// 相对路径按当前工作目录解析。
    ///
    /// # 参数
    /// * `raw` - 地址字符串
    ///
    /// # 返回
    /// * `Result<Self, ConfigError>` - 解析结果，格式无效时立即返回错误
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ConfigError::InvalidLocation {
                location: raw.to_string(),
                reason: "地址为空".to_string(),
            });
        }

        match Url::parse(trimmed) {
            // 单字母协议视为 Windows 盘符路径
            Ok(url) if url.scheme().len() > 1 => Self::from_url(url),
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => {
                Self::from_path(Path::new(trimmed))
            }
            Err(e) => Err(ConfigError::InvalidLocation {
                location: trimmed.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    /// 从 URL 创建配置源地址
    pub fn from_url(url: Url) -> Result<Self, ConfigError> {
        if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(ConfigError::UnsupportedScheme {
                location: url.to_string(),
                scheme: url.scheme().to_string(),
            });
        }

        let format = SourceFormat::from_address(url.path());
        Ok(Self { url, format })
    }

    /// 从文件路径创建配置源地址
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir()
                .map_err(|e| ConfigError::InvalidLocation {
                    location: path.display().to_string(),
                    reason: format!("无法获取当前目录: {e}"),
                })?
                .join(path)
        };

        let url = Url::from_file_path(&absolute).map_err(|_| ConfigError::InvalidLocation {
            location: path.display().to_string(),
            reason: "无法转换为文件URL".to_string(),
        })?;

        Self::from_url(url)
    }

    /// 地址 URL
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// 推断的内容格式
    pub fn format(&self) -> SourceFormat {
        self.format
    }

    /// 地址协议
    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    /// 地址字符串
    pub fn as_str(&self) -> &str {
        self.url.as_str()
    }
}

impl FromStr for Location {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.url.as_str())
    }
}

impl Serialize for Location {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.url.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_suffix() {
        assert_eq!(SourceFormat::from_address("/etc/app.json"), SourceFormat::Json);
        assert_eq!(SourceFormat::from_address("/etc/app.yaml"), SourceFormat::Yaml);
        assert_eq!(SourceFormat::from_address("/etc/app.yml"), SourceFormat::Yaml);
        assert_eq!(
            SourceFormat::from_address("/etc/app.properties"),
            SourceFormat::Properties
        );
        assert_eq!(SourceFormat::from_address("/etc/app"), SourceFormat::Properties);
        // 大小写敏感
        assert_eq!(SourceFormat::from_address("/etc/APP.JSON"), SourceFormat::Properties);
    }

    #[test]
    fn test_parse_http_url() {
        let location = Location::parse("https://config.example.com/app.yaml").unwrap();
        assert_eq!(location.scheme(), "https");
        assert_eq!(location.format(), SourceFormat::Yaml);
    }

    #[test]
    fn test_query_is_not_part_of_suffix() {
        let location = Location::parse("http://config.example.com/app.json?env=prod").unwrap();
        assert_eq!(location.format(), SourceFormat::Json);
    }

    #[test]
    fn test_parse_relative_path() {
        let location = Location::parse("conf/app.properties").unwrap();
        assert_eq!(location.scheme(), "file");
        assert!(location.as_str().ends_with("/conf/app.properties"));
        assert_eq!(location.format(), SourceFormat::Properties);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let location = Location::parse("  file:///etc/app.json ").unwrap();
        assert_eq!(location.as_str(), "file:///etc/app.json");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(matches!(
            Location::parse(""),
            Err(ConfigError::InvalidLocation { .. })
        ));
        assert!(matches!(
            Location::parse("http://exa mple.com/app.properties"),
            Err(ConfigError::InvalidLocation { .. })
        ));
        assert!(matches!(
            Location::parse("ftp://example.com/app.properties"),
            Err(ConfigError::UnsupportedScheme { .. })
        ));
    }
}
