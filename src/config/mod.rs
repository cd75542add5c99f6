//! 配置管理模块
//!
//! 提供多配置源解析、格式解析、轮询合并和配置注册表功能

pub mod loader;
pub mod location;
pub mod manager;
pub mod parser;
pub mod resolver;
pub mod settings;
pub mod source;

// 重新导出主要类型
pub use loader::{DefaultLocationLoader, LocationLoader};
pub use location::{Location, SourceFormat};
pub use manager::{ConfigBootstrap, ConfigDiff, ConfigRegistry, ConfigUpdateNotification, InitState};
pub use resolver::{ResourceLookup, SourceList, SourceResolver};
pub use settings::{validate_settings, SourceSettings};
pub use source::{Checkpoint, PollResult, PolledConfigurationSource, Snapshot, UrlConfigurationSource};
