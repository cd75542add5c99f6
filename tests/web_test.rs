//! Web 边界集成测试

use axum::body::{to_bytes, Body};
use axum::http::{header, Request, StatusCode};
use axum::routing::post;
use axum::Router;
use halfpipe::entity::{Entity, Validate, Validator};
use halfpipe::error::InvalidEntity;
use halfpipe::web::ValidatedJson;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower::ServiceExt;

#[derive(Debug, Deserialize, Serialize)]
struct Endpoint {
    name: String,
    port: u32,
}

impl Entity for Endpoint {
    const TYPE_NAME: &'static str = "Endpoint";
}

impl Validate for Endpoint {
    fn validate(&self, v: &mut Validator) {
        v.not_blank("name", &self.name).in_range("port", self.port, 1, 65535);
    }
}

async fn register(ValidatedJson(endpoint): ValidatedJson<Endpoint>) -> ValidatedJson<Endpoint> {
    ValidatedJson(endpoint)
}

fn app() -> Router {
    Router::new().route("/endpoints", post(register))
}

async fn send(content_type: &str, body: &'static str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri("/endpoints")
        .header(header::CONTENT_TYPE, content_type)
        .body(Body::from(body))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn test_valid_body_is_echoed() {
    let (status, body) = send("application/json", r#"{"name": "api", "port": 8080}"#).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"name": "api", "port": 8080}));
}

#[tokio::test]
async fn test_invalid_body_reports_every_violation() {
    let (status, body) = send("application/json", r#"{"name": " ", "port": 0}"#).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], json!(422));
    assert_eq!(body["message"], json!(InvalidEntity::MESSAGE));
    assert_eq!(
        body["errors"],
        json!(["name may not be empty", "port must be between 1 and 65535"])
    );
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let (status, body) = send("application/json", r#"{"name": "api", "port": }"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], json!(400));
    assert!(body.get("errors").is_none());
}

#[tokio::test]
async fn test_wrong_media_type_is_rejected() {
    let (status, body) = send("text/plain", r#"{"name": "api", "port": 8080}"#).await;
    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["code"], json!(415));
}
