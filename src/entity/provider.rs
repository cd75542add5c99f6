//! JSON 实体读写
//!
//! 把请求体反序列化为类型化的值，按调用点要求执行校验

use crate::entity::validation::{validate, Validate};
use crate::error::{EntityError, InvalidEntity};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// 类型在实体读写中的处置方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeDisposition {
    /// 正常参与读写
    Mapped,
    /// 完全不参与本读写器的读写判断
    Ignored,
}

/// 可作为请求体或响应体的类型
///
/// 处置方式在编译期确定
pub trait Entity {
    /// 类型名称，用于错误信息
    const TYPE_NAME: &'static str;
    /// 处置方式
    const DISPOSITION: TypeDisposition = TypeDisposition::Mapped;

    /// 是否被排除
    fn is_ignored() -> bool {
        Self::DISPOSITION == TypeDisposition::Ignored
    }
}

/// 调用点元数据
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallSite {
    validate: bool,
}

impl CallSite {
    /// 不要求校验
    pub const fn plain() -> Self {
        Self { validate: false }
    }

    /// 要求校验
    pub const fn validated() -> Self {
        Self { validate: true }
    }

    /// 是否要求校验
    pub fn requires_validation(&self) -> bool {
        self.validate
    }
}

/// 媒体类型支持判断
pub trait MediaSupport: Send + Sync {
    /// 是否能读取该媒体类型
    fn can_read(&self, media_type: &str) -> bool;
    /// 是否能写出该媒体类型
    fn can_write(&self, media_type: &str) -> bool;
}

/// JSON 媒体类型：`application/json` 以及 `+json` 后缀
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonMedia;

impl JsonMedia {
    fn is_json(media_type: &str) -> bool {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        essence == "application/json" || (essence.starts_with("application/") && essence.ends_with("+json"))
    }
}

impl MediaSupport for JsonMedia {
    fn can_read(&self, media_type: &str) -> bool {
        Self::is_json(media_type)
    }

    fn can_write(&self, media_type: &str) -> bool {
        Self::is_json(media_type)
    }
}

/// JSON 实体读写器
#[derive(Debug, Clone, Default)]
pub struct JsonEntityProvider<M = JsonMedia> {
    media: M,
}

impl JsonEntityProvider<JsonMedia> {
    /// 创建默认的 JSON 读写器
    pub fn new() -> Self {
        Self { media: JsonMedia }
    }
}

impl<M: MediaSupport> JsonEntityProvider<M> {
    /// 使用自定义媒体类型判断创建读写器
    pub fn with_media(media: M) -> Self {
        Self { media }
    }

    /// 类型是否可读，被排除的类型不会进入媒体类型判断
    pub fn is_readable<T: Entity>(&self, media_type: &str) -> bool {
        !T::is_ignored() && self.media.can_read(media_type)
    }

    /// 类型是否可写，被排除的类型不会进入媒体类型判断
    pub fn is_writeable<T: Entity>(&self, media_type: &str) -> bool {
        !T::is_ignored() && self.media.can_write(media_type)
    }

    /// 读取实体
    ///
    /// 先反序列化；调用点要求校验时再执行全部规则，
    /// 存在违规则返回携带全部违规信息的错误，否则原样返回值。
    ///
    /// # 参数
    /// * `bytes` - 请求体
    /// * `call_site` - 调用点元数据
    ///
    /// # 返回
    /// * `Result<T, EntityError>` - 反序列化后的值
    pub fn read_from<T>(&self, bytes: &[u8], call_site: CallSite) -> Result<T, EntityError>
    where
        T: Entity + DeserializeOwned + Validate,
    {
        if T::is_ignored() {
            return Err(EntityError::Unsupported {
                type_name: T::TYPE_NAME,
                media_type: "application/json".to_string(),
            });
        }

        let value: T = serde_json::from_slice(bytes).map_err(EntityError::Deserialize)?;

        if call_site.requires_validation() {
            let violations = validate(&value);
            if !violations.is_empty() {
                debug!("{} 校验失败: {}", T::TYPE_NAME, violations);
                return Err(EntityError::Invalid(InvalidEntity::new(violations)));
            }
        }

        Ok(value)
    }

    /// 写出实体
    pub fn write_to<T>(&self, value: &T) -> Result<Vec<u8>, EntityError>
    where
        T: Entity + Serialize,
    {
        if T::is_ignored() {
            return Err(EntityError::Unsupported {
                type_name: T::TYPE_NAME,
                media_type: "application/json".to_string(),
            });
        }
        serde_json::to_vec(value).map_err(EntityError::Serialize)
    }
}
