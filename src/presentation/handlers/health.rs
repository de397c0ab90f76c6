use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct ChatRootResponse {
    pub message: &'static str,
}

pub async fn health_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(HealthResponse {
            status: "healthy".to_string(),
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

pub async fn chat_root_handler() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(ChatRootResponse {
            message: "Chat works!",
        }),
    )
}
