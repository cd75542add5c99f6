//! 配置源设置
//!
//! 定义配置源解析所需的设置项及其验证逻辑

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// 配置源设置
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SourceSettings {
    /// 默认配置文件名
    #[serde(default = "default_file_name")]
    pub default_file_name: String,
    /// 保存附加配置源列表的环境变量名
    #[serde(default = "default_config_url_var")]
    pub config_url_var: String,
    /// 固定的附加配置源，排在环境变量声明的配置源之前
    #[serde(default)]
    pub additional_urls: Vec<String>,
    /// 额外的默认配置文件查找目录，优先于内置查找顺序
    #[serde(default)]
    pub resource_dirs: Vec<PathBuf>,
    /// HTTP 配置源请求超时（秒），不设置则不限制
    #[serde(default)]
    pub request_timeout_seconds: Option<u64>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            default_file_name: default_file_name(),
            config_url_var: default_config_url_var(),
            additional_urls: Vec::new(),
            resource_dirs: Vec::new(),
            request_timeout_seconds: None,
        }
    }
}

impl SourceSettings {
    /// 从 TOML 字符串加载设置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: SourceSettings = toml::from_str(content)
            .map_err(|e| ConfigError::ValidationError(format!("TOML解析失败: {e}")))?;
        validate_settings(&settings).map_err(ConfigError::ValidationError)?;
        Ok(settings)
    }

    /// 从文件加载设置
    pub async fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::FileNotFound {
                path: path.to_string_lossy().to_string(),
            }
            .into());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let settings = Self::from_toml_str(&content)?;

        tracing::info!("成功加载设置文件: {}", path.display());
        tracing::debug!("设置内容: {:?}", settings);

        Ok(settings)
    }
}

// 默认值函数
fn default_file_name() -> String {
    "halfpipe.properties".to_string()
}
fn default_config_url_var() -> String {
    "HALFPIPE_CONFIG_URL".to_string()
}

/// 设置验证函数
///
/// # 参数
/// * `settings` - 要验证的设置
///
/// # 返回
/// * `Result<(), String>` - 验证结果，错误时返回错误信息
pub fn validate_settings(settings: &SourceSettings) -> std::result::Result<(), String> {
    let name = settings.default_file_name.trim();
    if name.is_empty() {
        return Err("默认配置文件名不能为空".to_string());
    }
    if name.contains('/') || name.contains('\\') {
        return Err(format!("默认配置文件名不能包含路径分隔符: {name}"));
    }

    let var = &settings.config_url_var;
    if var.is_empty() || var.contains('=') || var.contains('\0') {
        return Err(format!("无效的环境变量名: {var:?}"));
    }

    if settings.request_timeout_seconds == Some(0) {
        return Err("请求超时时间不能为0".to_string());
    }

    for url in &settings.additional_urls {
        if url.trim().is_empty() {
            return Err("附加配置源地址不能为空".to_string());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let settings = SourceSettings::default();
        assert_eq!(settings.default_file_name, "halfpipe.properties");
        assert_eq!(settings.config_url_var, "HALFPIPE_CONFIG_URL");
        assert!(settings.additional_urls.is_empty());
        assert!(settings.request_timeout_seconds.is_none());
        assert!(validate_settings(&settings).is_ok());
    }

    #[test]
    fn test_toml_parsing_with_defaults() {
        let settings = SourceSettings::from_toml_str(
            r#"
default_file_name = "app.properties"
additional_urls = ["https://config.local/app.json"]
request_timeout_seconds = 5
"#,
        )
        .unwrap();

        assert_eq!(settings.default_file_name, "app.properties");
        assert_eq!(settings.config_url_var, "HALFPIPE_CONFIG_URL");
        assert_eq!(settings.additional_urls.len(), 1);
        assert_eq!(settings.request_timeout_seconds, Some(5));
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let settings = SourceSettings {
            request_timeout_seconds: Some(0),
            ..Default::default()
        };
        let result = validate_settings(&settings);
        assert!(result.unwrap_err().contains("请求超时时间不能为0"));
    }

    #[test]
    fn test_validation_rejects_path_in_file_name() {
        let settings = SourceSettings {
            default_file_name: "conf/app.properties".to_string(),
            ..Default::default()
        };
        assert!(validate_settings(&settings).is_err());
    }

    #[test]
    fn test_invalid_toml() {
        let result = SourceSettings::from_toml_str("default_file_name = [");
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let result = SourceSettings::load_from_file("/nonexistent/halfpipe.toml").await;
        assert!(result.unwrap_err().to_string().contains("配置文件不存在"));
    }
}
