//! HTTP 接口（feature `web`）
//!
//! POST /api/users/nl  {"query": "...", "max_steps": 30}
//! GET  /api/users
//! GET  /health
//!
//! 所有错误（包括请求体无法解析）都以 `{"error": {"kind", "message"}}` 返回。

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::AppConfig;
use crate::core::{FallbackChain, Request, ServiceError};

pub struct AppState {
    pub config: AppConfig,
    pub chain: FallbackChain,
}

/// ServiceError -> (状态码, {"error": {...}})
pub struct ApiError(pub ServiceError);

impl From<ServiceError> for ApiError {
    fn from(e: ServiceError) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(ServiceError::InvalidArgument(rejection.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.0.to_json())).into_response()
    }
}

/// 客户端断开时 axum 丢弃本 future，进行中的 store guard 随之释放
async fn nl_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Request>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = payload?;
    tracing::info!(query = %req.query, "nl request");
    let reply = state.chain.handle(&req).await?;
    Ok(Json(reply).into_response())
}

async fn list_users(State(state): State<Arc<AppState>>) -> Result<Response, ApiError> {
    let users = state
        .chain
        .store()
        .read()
        .await
        .map_err(ServiceError::from)?
        .users;
    Ok(Json(serde_json::json!({ "users": users })).into_response())
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "ok": true,
        "model": state.config.llm.model,
        "file": state.config.store.path,
    }))
}

pub fn cors_layer(origin: &str) -> Result<CorsLayer, ServiceError> {
    let origin: HeaderValue = origin
        .parse()
        .map_err(|_| ServiceError::InvalidArgument(format!("invalid frontend origin: {origin}")))?;
    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true))
}

/// 仅路由；trace 与 CORS 层由调用方叠加
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/users/nl", post(nl_handler))
        .route("/api/users", get(list_users))
        .route("/health", get(health))
        .with_state(state)
}
