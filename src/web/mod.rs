//! Web 边界模块
//!
//! 把实体读写接入 axum：带校验的请求体提取器以及错误到响应的映射

use crate::entity::{CallSite, Entity, JsonEntityProvider, Validate};
use crate::error::EntityError;
use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error};

/// 读取时总是要求校验的 JSON 请求体
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: Entity + DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = EntityError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let media_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let provider = JsonEntityProvider::new();
        if !provider.is_readable::<T>(&media_type) {
            return Err(EntityError::Unsupported {
                type_name: T::TYPE_NAME,
                media_type,
            });
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| EntityError::Body(rejection.body_text()))?;

        provider
            .read_from(&bytes, CallSite::validated())
            .map(ValidatedJson)
    }
}

impl<T> IntoResponse for ValidatedJson<T>
where
    T: Entity + Serialize,
{
    fn into_response(self) -> Response {
        match JsonEntityProvider::new().write_to(&self.0) {
            Ok(body) => (
                [(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                )],
                body,
            )
                .into_response(),
            Err(e) => e.into_response(),
        }
    }
}

/// 错误响应体
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// HTTP状态码
    pub code: u16,
    /// 错误信息
    pub message: String,
    /// 违规信息列表
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl EntityError {
    /// 对应的HTTP状态码
    pub fn status_code(&self) -> StatusCode {
        match self {
            EntityError::Invalid(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EntityError::Deserialize(_) | EntityError::Body(_) => StatusCode::BAD_REQUEST,
            EntityError::Unsupported { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            EntityError::Serialize(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for EntityError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("响应体处理失败: {}", self);
        } else {
            debug!("请求体被拒绝: {}", self);
        }

        let body = match self {
            EntityError::Invalid(invalid) => ErrorResponse {
                code: status.as_u16(),
                message: invalid.message,
                errors: invalid.violations.messages().to_vec(),
            },
            other => ErrorResponse {
                code: status.as_u16(),
                message: other.to_string(),
                errors: Vec::new(),
            },
        };

        (status, Json(body)).into_response()
    }
}
