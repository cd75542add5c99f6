//! 配置注册表模块
//!
//! 保存当前生效的配置，整体应用轮询得到的完整结果，并提供一次性安装保护

use crate::config::settings::SourceSettings;
use crate::config::source::{PollResult, PolledConfigurationSource, Snapshot, UrlConfigurationSource};
use crate::error::Result;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

/// 配置差异类型
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigDiff {
    /// 配置项添加
    KeyAdded { key: String, value: Value },
    /// 配置项移除
    KeyRemoved { key: String },
    /// 配置项修改
    KeyModified { key: String, old: Value, new: Value },
}

/// 配置变更通知
#[derive(Debug, Clone)]
pub struct ConfigUpdateNotification {
    /// 配置版本号
    pub version: u64,
    /// 配置差异列表
    pub diffs: Vec<ConfigDiff>,
    /// 变更时间
    pub timestamp: DateTime<Utc>,
}

/// 配置注册表
///
/// 每次应用完整结果都整体替换当前配置
pub struct ConfigRegistry {
    /// 当前配置
    current: Arc<RwLock<Arc<Snapshot>>>,
    /// 配置版本号
    version: Arc<RwLock<u64>>,
    /// 配置更新通知发送器
    update_sender: broadcast::Sender<ConfigUpdateNotification>,
    /// 最后更新时间
    last_update: Arc<RwLock<Option<DateTime<Utc>>>>,
}

impl ConfigRegistry {
    /// 创建空的配置注册表
    ///
    /// # 返回
    /// * `(Self, broadcast::Receiver<ConfigUpdateNotification>)` - 注册表和更新通知接收器
    pub fn new() -> (Self, broadcast::Receiver<ConfigUpdateNotification>) {
        let (update_sender, update_receiver) = broadcast::channel(32);

        let registry = Self {
            current: Arc::new(RwLock::new(Arc::new(Snapshot::new()))),
            version: Arc::new(RwLock::new(0)),
            update_sender,
            last_update: Arc::new(RwLock::new(None)),
        };

        (registry, update_receiver)
    }

    /// 应用一次轮询结果
    ///
    /// 没有完整配置的结果不会改变当前状态
    ///
    /// # 参数
    /// * `result` - 轮询结果
    ///
    /// # 返回
    /// * `u64` - 应用后的版本号
    pub async fn apply(&self, result: PollResult) -> u64 {
        let Some(new_snapshot) = result.into_complete() else {
            debug!("轮询结果不含配置，保持当前配置");
            return *self.version.read().await;
        };

        // 写锁贯穿比较和替换，保证并发应用按顺序进行
        let mut current = self.current.write().await;
        let diffs = Self::calculate_diff(&current, &new_snapshot);

        if diffs.is_empty() {
            debug!("配置无实质性变更，跳过更新");
            return *self.version.read().await;
        }

        *current = Arc::new(new_snapshot);

        let new_version = {
            let mut ver = self.version.write().await;
            *ver += 1;
            *ver
        };

        let now = Utc::now();
        *self.last_update.write().await = Some(now);
        drop(current);

        info!("配置更新完成，版本: {}，变更 {} 项", new_version, diffs.len());

        let notification = ConfigUpdateNotification {
            version: new_version,
            diffs,
            timestamp: now,
        };
        if let Err(e) = self.update_sender.send(notification) {
            debug!("没有配置更新订阅者: {}", e);
        }

        new_version
    }

    /// 计算配置差异
    fn calculate_diff(old: &Snapshot, new: &Snapshot) -> Vec<ConfigDiff> {
        let mut diffs = Vec::new();

        for (key, new_value) in new {
            match old.get(key) {
                Some(old_value) if old_value != new_value => diffs.push(ConfigDiff::KeyModified {
                    key: key.clone(),
                    old: old_value.clone(),
                    new: new_value.clone(),
                }),
                Some(_) => {}
                None => diffs.push(ConfigDiff::KeyAdded {
                    key: key.clone(),
                    value: new_value.clone(),
                }),
            }
        }

        for key in old.keys() {
            if !new.contains_key(key) {
                diffs.push(ConfigDiff::KeyRemoved { key: key.clone() });
            }
        }

        diffs
    }

    /// 获取当前配置快照
    pub async fn snapshot(&self) -> Arc<Snapshot> {
        Arc::clone(&*self.current.read().await)
    }

    /// 获取配置值
    pub async fn get(&self, key: &str) -> Option<Value> {
        self.current.read().await.get(key).cloned()
    }

    /// 获取字符串配置值，非字符串标量按文本返回
    pub async fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key).await? {
            Value::String(s) => Some(s),
            Value::Null => None,
            other => Some(other.to_string()),
        }
    }

    /// 获取整数配置值，字符串值会被解析
    pub async fn get_i64(&self, key: &str) -> Option<i64> {
        match self.get(key).await? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// 获取布尔配置值，字符串值会被解析
    pub async fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key).await? {
            Value::Bool(b) => Some(b),
            Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// 获取当前版本号
    pub async fn get_version(&self) -> u64 {
        *self.version.read().await
    }

    /// 获取最后更新时间
    pub async fn get_last_update(&self) -> Option<DateTime<Utc>> {
        *self.last_update.read().await
    }

    /// 订阅配置更新通知
    pub fn subscribe(&self) -> broadcast::Receiver<ConfigUpdateNotification> {
        self.update_sender.subscribe()
    }
}

/// 显式的初始化状态
///
/// 调用方共享同一个实例即可获得只初始化一次的语义
#[derive(Debug, Default)]
pub struct InitState {
    initialized: Mutex<bool>,
}

impl InitState {
    /// 创建未初始化的状态
    pub const fn new() -> Self {
        Self {
            initialized: Mutex::new(false),
        }
    }

    /// 执行初始化
    ///
    /// 只有第一次成功的调用会执行 `init`；之后的调用记录警告并返回 `Ok(None)`。
    /// `init` 失败时状态保持未初始化。
    ///
    /// # 参数
    /// * `init` - 初始化逻辑
    ///
    /// # 返回
    /// * `Result<Option<T>, E>` - 本次是否真正执行了初始化
    pub fn init<T, E>(&self, init: impl FnOnce() -> std::result::Result<T, E>) -> std::result::Result<Option<T>, E> {
        let mut initialized = self
            .initialized
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if *initialized {
            warn!("配置注册表已经初始化，忽略重复初始化");
            return Ok(None);
        }

        let value = init()?;
        *initialized = true;
        Ok(Some(value))
    }

    /// 回到未初始化状态，安装在首次轮询失败时调用
    fn reset(&self) {
        *self
            .initialized
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = false;
    }

    /// 是否已经初始化
    pub fn is_initialized(&self) -> bool {
        *self
            .initialized
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// 安装好的配置系统
pub struct ConfigBootstrap {
    /// 配置源
    pub source: Arc<UrlConfigurationSource>,
    /// 配置注册表
    pub registry: Arc<ConfigRegistry>,
}

impl ConfigBootstrap {
    /// 安装配置系统并执行首次轮询
    ///
    /// 重复安装不会报错，返回 `Ok(None)`。首次轮询失败时状态回到未初始化，
    /// 之后的安装会重新构建并轮询。
    ///
    /// # 参数
    /// * `state` - 共享的初始化状态
    /// * `settings` - 配置源设置
    /// * `config_file` - 命令行指定的配置文件
    ///
    /// # 返回
    /// * `Result<Option<Self>>` - 本次安装的配置系统
    pub async fn install(
        state: &InitState,
        settings: &SourceSettings,
        config_file: Option<&Path>,
    ) -> Result<Option<Self>> {
        let installed = state.init(|| -> Result<Self> {
            let source = UrlConfigurationSource::from_settings(settings, config_file)?;
            let (registry, _receiver) = ConfigRegistry::new();
            Ok(Self {
                source: Arc::new(source),
                registry: Arc::new(registry),
            })
        })?;

        let Some(bootstrap) = installed else {
            return Ok(None);
        };

        let result = match bootstrap.source.poll(true, None).await {
            Ok(result) => result,
            Err(e) => {
                state.reset();
                warn!("首次轮询失败，配置系统未安装: {}", e);
                return Err(e.into());
            }
        };
        let version = bootstrap.registry.apply(result).await;
        info!("配置系统已安装，版本: {}", version);

        Ok(Some(bootstrap))
    }

    /// 重新轮询并应用结果
    pub async fn refresh(&self) -> Result<u64> {
        let result = self.source.poll(false, None).await?;
        Ok(self.registry.apply(result).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(entries: &[(&str, Value)]) -> Snapshot {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_registry_creation() {
        let (registry, _receiver) = ConfigRegistry::new();
        assert_eq!(registry.get_version().await, 0);
        assert!(registry.snapshot().await.is_empty());
        assert!(registry.get_last_update().await.is_none());
    }

    #[tokio::test]
    async fn test_full_result_replaces_state() {
        let (registry, mut receiver) = ConfigRegistry::new();

        let v1 = registry
            .apply(PollResult::full(Some(snapshot(&[
                ("a", json!("1")),
                ("b", json!(2)),
            ]))))
            .await;
        assert_eq!(v1, 1);

        let v2 = registry
            .apply(PollResult::full(Some(snapshot(&[("b", json!(3))]))))
            .await;
        assert_eq!(v2, 2);
        assert!(registry.get("a").await.is_none());
        assert_eq!(registry.get_i64("b").await, Some(3));

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.version, 1);
        assert_eq!(first.diffs.len(), 2);

        let second = receiver.recv().await.unwrap();
        assert!(second.diffs.contains(&ConfigDiff::KeyRemoved {
            key: "a".to_string()
        }));
        assert!(second.diffs.contains(&ConfigDiff::KeyModified {
            key: "b".to_string(),
            old: json!(2),
            new: json!(3),
        }));
    }

    #[tokio::test]
    async fn test_absent_result_keeps_state() {
        let (registry, _receiver) = ConfigRegistry::new();
        registry
            .apply(PollResult::full(Some(snapshot(&[("a", json!("1"))]))))
            .await;

        let version = registry.apply(PollResult::full(None)).await;
        assert_eq!(version, 1);
        assert_eq!(registry.get_string("a").await.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn test_unchanged_result_keeps_version() {
        let (registry, _receiver) = ConfigRegistry::new();
        let entries = snapshot(&[("a", json!("1"))]);
        registry.apply(PollResult::full(Some(entries.clone()))).await;
        let version = registry.apply(PollResult::full(Some(entries))).await;
        assert_eq!(version, 1);
    }

    #[tokio::test]
    async fn test_typed_getters_parse_strings() {
        let (registry, _receiver) = ConfigRegistry::new();
        registry
            .apply(PollResult::full(Some(snapshot(&[
                ("port", json!("8080")),
                ("gzip", json!("TRUE")),
                ("ratio", json!(0.5)),
                ("none", Value::Null),
            ]))))
            .await;

        assert_eq!(registry.get_i64("port").await, Some(8080));
        assert_eq!(registry.get_bool("gzip").await, Some(true));
        assert_eq!(registry.get_string("ratio").await.as_deref(), Some("0.5"));
        assert_eq!(registry.get_string("none").await, None);
        assert_eq!(registry.get_bool("port").await, None);
    }

    #[test]
    fn test_init_state_is_idempotent() {
        let state = InitState::new();
        let mut runs = 0;

        let first: std::result::Result<_, String> = state.init(|| {
            runs += 1;
            Ok("installed")
        });
        assert_eq!(first, Ok(Some("installed")));
        assert!(state.is_initialized());

        let second: std::result::Result<Option<&str>, String> = state.init(|| {
            runs += 1;
            Ok("again")
        });
        assert_eq!(second, Ok(None));
        assert_eq!(runs, 1);
    }

    #[test]
    fn test_failed_init_can_be_retried() {
        let state = InitState::new();
        let failed: std::result::Result<Option<()>, &str> = state.init(|| Err("boom"));
        assert_eq!(failed, Err("boom"));
        assert!(!state.is_initialized());

        let retried: std::result::Result<Option<()>, &str> = state.init(|| Ok(()));
        assert_eq!(retried, Ok(Some(())));
    }

    #[tokio::test]
    async fn test_install_retries_after_failed_first_poll() {
        let dir = tempfile::TempDir::new().unwrap();
        let file = dir.path().join("app.properties");
        let settings = SourceSettings {
            default_file_name: "halfpipe-manager-missing.properties".to_string(),
            config_url_var: "HALFPIPE_MANAGER_TEST_URL".to_string(),
            ..SourceSettings::default()
        };
        let state = InitState::new();

        let failed = ConfigBootstrap::install(&state, &settings, Some(file.as_path())).await;
        assert!(failed.is_err());
        assert!(!state.is_initialized());

        std::fs::write(&file, "mode=ready\n").unwrap();
        let bootstrap = ConfigBootstrap::install(&state, &settings, Some(file.as_path()))
            .await
            .unwrap()
            .unwrap();
        assert!(state.is_initialized());
        assert_eq!(bootstrap.registry.get_string("mode").await.as_deref(), Some("ready"));
    }
}
