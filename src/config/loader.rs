//! 配置源加载器实现
//!
//! 读取本地文件和 HTTP(S) 配置源的原始内容

use crate::config::settings::SourceSettings;
use crate::config::Location;
use crate::error::{ConfigError, LoadFailure};
use async_trait::async_trait;
use std::time::Duration;

/// 配置源加载器trait，定义配置源读取接口
#[async_trait]
pub trait LocationLoader: Send + Sync {
    /// 读取配置源的全部内容
    ///
    /// # 参数
    /// * `location` - 配置源地址
    ///
    /// # 返回
    /// * `Result<Vec<u8>, ConfigError>` - 原始内容或读取错误
    async fn load(&self, location: &Location) -> Result<Vec<u8>, ConfigError>;
}

/// 默认加载器，支持 `file:`、`http:`、`https:`
#[derive(Debug, Clone)]
pub struct DefaultLocationLoader {
    /// HTTP客户端
    client: reqwest::Client,
}

impl DefaultLocationLoader {
    /// 创建新的加载器
    ///
    /// # 参数
    /// * `request_timeout` - HTTP 请求超时，`None` 表示不限制
    ///
    /// # 返回
    /// * `Result<Self, ConfigError>` - 加载器实例
    pub fn new(request_timeout: Option<Duration>) -> Result<Self, ConfigError> {
        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = request_timeout {
            builder = builder.timeout(timeout);
        }

        let client = builder.build().map_err(|e| ConfigError::LoadError {
            location: "<http-client>".to_string(),
            source: LoadFailure::Http(e),
        })?;

        Ok(Self { client })
    }

    /// 根据设置创建加载器
    pub fn from_settings(settings: &SourceSettings) -> Result<Self, ConfigError> {
        Self::new(settings.request_timeout_seconds.map(Duration::from_secs))
    }

    async fn load_file(&self, location: &Location) -> Result<Vec<u8>, LoadFailure> {
        let path = location.url().to_file_path().map_err(|_| {
            LoadFailure::Io(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "无法转换为本地文件路径",
            ))
        })?;
        Ok(tokio::fs::read(path).await?)
    }

    async fn load_http(&self, location: &Location) -> Result<Vec<u8>, LoadFailure> {
        let response = self.client.get(location.url().clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadFailure::Status(status.as_u16()));
        }

        Ok(response.bytes().await?.to_vec())
    }
}

#[async_trait]
impl LocationLoader for DefaultLocationLoader {
    async fn load(&self, location: &Location) -> Result<Vec<u8>, ConfigError> {
        let result = match location.scheme() {
            "file" => self.load_file(location).await,
            "http" | "https" => self.load_http(location).await,
            scheme => {
                return Err(ConfigError::UnsupportedScheme {
                    location: location.to_string(),
                    scheme: scheme.to_string(),
                })
            }
        };

        let bytes = result.map_err(|source| ConfigError::LoadError {
            location: location.to_string(),
            source,
        })?;

        tracing::debug!("读取配置源 {} ({} 字节)", location, bytes.len());
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn test_load_file() {
        let file = NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "a=1").unwrap();

        let loader = DefaultLocationLoader::new(None).unwrap();
        let location = Location::from_path(file.path()).unwrap();
        let bytes = loader.load(&location).await.unwrap();
        assert_eq!(bytes, b"a=1");
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let loader = DefaultLocationLoader::new(None).unwrap();
        let location = Location::parse("file:///nonexistent/halfpipe/app.properties").unwrap();
        let result = loader.load(&location).await;
        assert!(matches!(
            result,
            Err(ConfigError::LoadError {
                source: LoadFailure::Io(_),
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_load_http_status_error() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/missing.properties")
            .with_status(404)
            .create_async()
            .await;

        let loader = DefaultLocationLoader::new(Some(Duration::from_secs(5))).unwrap();
        let location = Location::parse(&format!("{}/missing.properties", server.url())).unwrap();
        let result = loader.load(&location).await;

        mock.assert_async().await;
        assert!(matches!(
            result,
            Err(ConfigError::LoadError {
                source: LoadFailure::Status(404),
                ..
            })
        ));
    }
}
