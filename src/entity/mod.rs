//! 请求体读写模块
//!
//! 提供带可选校验的 JSON 实体反序列化

pub mod provider;
pub mod validation;

// 重新导出主要类型
pub use provider::{CallSite, Entity, JsonEntityProvider, JsonMedia, MediaSupport, TypeDisposition};
pub use validation::{validate, Validate, Validator, ViolationSet};
