use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use pharmacie_reorder::ReorderError;

pub fn reorder_error_to_response(err: ReorderError) -> axum::response::Response {
    match err {
        ReorderError::Store(e) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", e.to_string())
        }
        e @ ReorderError::Notification { .. } => {
            json_error(StatusCode::BAD_GATEWAY, "notification_failed", e.to_string())
        }
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn join_error_to_response(err: tokio::task::JoinError) -> axum::response::Response {
    tracing::error!(error = %err, "blocking task failed");
    json_error(
        StatusCode::INTERNAL_SERVER_ERROR,
        "internal_error",
        "request processing failed",
    )
}
