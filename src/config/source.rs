//! 基于配置源列表的轮询配置源
//!
//! 每次轮询都完整重新加载所有配置源，按列表顺序合并，后出现的配置源覆盖先出现的

use crate::config::loader::{DefaultLocationLoader, LocationLoader};
use crate::config::parser::parse_location;
use crate::config::resolver::{parse_locations, SourceList, SourceResolver};
use crate::config::settings::SourceSettings;
use crate::error::ConfigError;
use async_trait::async_trait;
use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// 一次轮询得到的完整扁平配置
pub type Snapshot = BTreeMap<String, serde_json::Value>;

/// 轮询检查点，本实现不使用
pub type Checkpoint = dyn Any + Send + Sync;

/// 轮询结果
///
/// 只产生完整结果，调用方应整体替换其配置状态
#[derive(Debug, Clone, PartialEq)]
pub struct PollResult {
    complete: Option<Snapshot>,
}

impl PollResult {
    /// 创建完整结果，`None` 表示没有任何配置源
    pub fn full(complete: Option<Snapshot>) -> Self {
        Self { complete }
    }

    /// 是否为增量结果
    pub fn is_incremental(&self) -> bool {
        false
    }

    /// 完整配置
    pub fn complete(&self) -> Option<&Snapshot> {
        self.complete.as_ref()
    }

    /// 取出完整配置
    pub fn into_complete(self) -> Option<Snapshot> {
        self.complete
    }
}

/// 可轮询的配置源
#[async_trait]
pub trait PolledConfigurationSource: Send + Sync {
    /// 轮询配置
    ///
    /// # 参数
    /// * `initial` - 是否为首次轮询
    /// * `checkpoint` - 上次轮询的检查点
    ///
    /// # 返回
    /// * `Result<PollResult, ConfigError>` - 轮询结果，任一配置源失败时整体失败
    async fn poll(
        &self,
        initial: bool,
        checkpoint: Option<&Checkpoint>,
    ) -> Result<PollResult, ConfigError>;
}

/// 基于地址列表的轮询配置源
#[derive(Clone)]
pub struct UrlConfigurationSource {
    /// 配置源列表
    sources: SourceList,
    /// 配置源加载器
    loader: Arc<dyn LocationLoader>,
}

impl UrlConfigurationSource {
    /// 使用默认设置和当前环境变量创建配置源
    pub fn new() -> Result<Self, ConfigError> {
        Self::from_settings(&SourceSettings::default(), None)
    }

    /// 根据设置创建配置源
    ///
    /// # 参数
    /// * `settings` - 配置源设置
    /// * `config_file` - 命令行指定的配置文件，优先级最高
    ///
    /// # 返回
    /// * `Result<Self, ConfigError>` - 配置源，任一地址无效时立即返回错误
    pub fn from_settings(
        settings: &SourceSettings,
        config_file: Option<&Path>,
    ) -> Result<Self, ConfigError> {
        let mut resolver = SourceResolver::new(settings);
        if let Some(path) = config_file {
            resolver = resolver.with_config_file(path);
        }
        let sources = resolver.resolve()?;
        let loader = DefaultLocationLoader::from_settings(settings)?;
        Ok(Self::with_loader(sources, Arc::new(loader)))
    }

    /// 使用显式地址列表创建配置源
    pub fn from_locations<I, S>(locations: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let sources = parse_locations(locations)?;
        let loader = DefaultLocationLoader::new(None)?;
        Ok(Self::with_loader(sources, Arc::new(loader)))
    }

    /// 使用指定的配置源列表和加载器创建配置源
    pub fn with_loader(sources: SourceList, loader: Arc<dyn LocationLoader>) -> Self {
        Self { sources, loader }
    }

    /// 配置源列表
    pub fn sources(&self) -> &SourceList {
        &self.sources
    }

    /// 按顺序加载并合并所有配置源
    async fn load_snapshot(&self) -> Result<Snapshot, ConfigError> {
        let mut snapshot = Snapshot::new();
        for location in self.sources.iter() {
            let bytes = self.loader.load(location).await?;
            let entries = parse_location(location, &bytes)?;
            debug!("配置源 {} 解析出 {} 个配置项", location, entries.len());
            snapshot.extend(entries);
        }
        Ok(snapshot)
    }
}

#[async_trait]
impl PolledConfigurationSource for UrlConfigurationSource {
    async fn poll(
        &self,
        _initial: bool,
        _checkpoint: Option<&Checkpoint>,
    ) -> Result<PollResult, ConfigError> {
        if self.sources.is_empty() {
            return Ok(PollResult::full(None));
        }

        let snapshot = self.load_snapshot().await?;
        debug!(
            "轮询完成: {} 个配置源, {} 个配置项",
            self.sources.len(),
            snapshot.len()
        );
        Ok(PollResult::full(Some(snapshot)))
    }
}

impl fmt::Debug for UrlConfigurationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UrlConfigurationSource")
            .field("sources", &self.sources)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for UrlConfigurationSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let listed: Vec<&str> = self.sources.iter().map(|l| l.as_str()).collect();
        write!(f, "UrlConfigurationSource [sources={listed:?}]")
    }
}
