//! 配置源解析器
//!
//! 构建有序、不可变的配置源列表：默认配置文件在前，环境变量声明的配置源在后

use crate::config::settings::SourceSettings;
use crate::config::Location;
use crate::error::ConfigError;
use serde::Serialize;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// 用户配置目录下的子目录名
const APP_CONFIG_DIR: &str = "halfpipe";

/// 默认配置文件的查找策略
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceLookup {
    /// 当前工作目录
    WorkingDir,
    /// 用户配置目录（如 `~/.config/halfpipe`）
    UserConfigDir,
    /// 可执行文件所在目录
    ExecutableDir,
    /// 指定目录
    Directory(PathBuf),
}

impl ResourceLookup {
    /// 内置查找顺序
    pub fn default_chain() -> Vec<ResourceLookup> {
        vec![
            ResourceLookup::WorkingDir,
            ResourceLookup::UserConfigDir,
            ResourceLookup::ExecutableDir,
        ]
    }

    fn base_dir(&self) -> Option<PathBuf> {
        match self {
            ResourceLookup::WorkingDir => std::env::current_dir().ok(),
            ResourceLookup::UserConfigDir => dirs::config_dir().map(|dir| dir.join(APP_CONFIG_DIR)),
            ResourceLookup::ExecutableDir => std::env::current_exe()
                .ok()
                .and_then(|exe| exe.parent().map(Path::to_path_buf)),
            ResourceLookup::Directory(dir) => Some(dir.clone()),
        }
    }

    /// 在该策略对应的目录中查找文件
    pub fn find(&self, file_name: &str) -> Option<PathBuf> {
        let candidate = self.base_dir()?.join(file_name);
        candidate.is_file().then_some(candidate)
    }
}

/// 有序、不可变的配置源列表，越靠后优先级越高
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceList(Arc<[Location]>);

impl SourceList {
    /// 空列表
    pub fn empty() -> Self {
        Self(Arc::from(Vec::new()))
    }

    /// 配置源切片
    pub fn as_slice(&self) -> &[Location] {
        &self.0
    }
}

impl Deref for SourceList {
    type Target = [Location];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Default for SourceList {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<Location>> for SourceList {
    fn from(locations: Vec<Location>) -> Self {
        Self(locations.into())
    }
}

impl Serialize for SourceList {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_slice().serialize(serializer)
    }
}

/// 把逗号分隔的地址列表解析为配置源，空项被跳过
///
/// 任何一项格式无效都会立即返回错误
pub fn split_locations(raw: &str) -> Result<Vec<Location>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(Location::parse)
        .collect()
}

/// 解析字符串列表为配置源列表
pub fn parse_locations<I, S>(raw: I) -> Result<SourceList, ConfigError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .map(|s| Location::parse(s.as_ref()))
        .collect::<Result<Vec<_>, _>>()
        .map(SourceList::from)
}

/// 配置源解析器
#[derive(Debug, Clone)]
pub struct SourceResolver {
    /// 默认配置文件名
    default_file_name: String,
    /// 附加配置源环境变量名
    config_url_var: String,
    /// 设置中声明的附加配置源
    additional_urls: Vec<String>,
    /// 默认配置文件查找顺序
    lookups: Vec<ResourceLookup>,
    /// 命令行指定的配置文件，排在最后
    config_file: Option<PathBuf>,
}

impl SourceResolver {
    /// 根据设置创建解析器
    ///
    /// 设置中的 `resource_dirs` 排在内置查找顺序之前
    pub fn new(settings: &SourceSettings) -> Self {
        let lookups = settings
            .resource_dirs
            .iter()
            .cloned()
            .map(ResourceLookup::Directory)
            .chain(ResourceLookup::default_chain())
            .collect();

        Self {
            default_file_name: settings.default_file_name.clone(),
            config_url_var: settings.config_url_var.clone(),
            additional_urls: settings.additional_urls.clone(),
            lookups,
            config_file: None,
        }
    }

    /// 替换默认配置文件查找顺序
    pub fn with_lookups(mut self, lookups: Vec<ResourceLookup>) -> Self {
        self.lookups = lookups;
        self
    }

    /// 追加一个配置文件，优先级最高
    pub fn with_config_file<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// 附加配置源环境变量名
    pub fn config_url_var(&self) -> &str {
        &self.config_url_var
    }

    /// 默认配置文件名
    pub fn default_file_name(&self) -> &str {
        &self.default_file_name
    }

    /// 读取环境变量并构建配置源列表
    pub fn resolve(&self) -> Result<SourceList, ConfigError> {
        let raw = std::env::var(&self.config_url_var).ok();
        self.resolve_with(raw.as_deref())
    }

    /// 使用给定的附加配置源字符串构建配置源列表
    ///
    /// 顺序：默认配置文件、设置中的附加配置源、环境变量中的配置源、命令行配置文件
    ///
    /// # 参数
    /// * `overrides` - 逗号分隔的附加配置源
    ///
    /// # 返回
    /// * `Result<SourceList, ConfigError>` - 配置源列表，任一地址无效时返回错误
    pub fn resolve_with(&self, overrides: Option<&str>) -> Result<SourceList, ConfigError> {
        let mut locations = Vec::new();

        if let Some(default) = self.find_default_resource()? {
            locations.push(default);
        }

        for url in &self.additional_urls {
            locations.push(Location::parse(url)?);
        }

        if let Some(raw) = overrides {
            locations.extend(split_locations(raw)?);
        }

        if let Some(path) = &self.config_file {
            let location = Location::from_path(path)?;
            debug!("命令行配置文件: {}", location);
            locations.push(location);
        }

        if locations.is_empty() {
            warn!("没有可轮询的动态配置源");
            info!(
                "如需启用动态配置源，请设置环境变量 {} 或提供 {} 文件",
                self.config_url_var, self.default_file_name
            );
        } else {
            let listed: Vec<&str> = locations.iter().map(Location::as_str).collect();
            info!("动态配置源: {:?}", listed);
        }

        Ok(SourceList::from(locations))
    }

    /// 按查找顺序定位默认配置文件，命中第一个即停止
    fn find_default_resource(&self) -> Result<Option<Location>, ConfigError> {
        for lookup in &self.lookups {
            if let Some(path) = lookup.find(&self.default_file_name) {
                debug!("通过 {:?} 找到默认配置文件: {}", lookup, path.display());
                return Location::from_path(&path).map(Some);
            }
        }
        Ok(None)
    }
}

impl Default for SourceResolver {
    fn default() -> Self {
        Self::new(&SourceSettings::default())
    }
}
