use std::sync::Arc;

use axum::{
    Json, Router,
    extract::Extension,
    response::IntoResponse,
    routing::{get, post},
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};

pub fn router() -> Router {
    Router::new()
        .route("/demanderDevis", post(request_quotes))
        .route("/candidats", get(list_candidates))
        .route("/redondance", get(supplier_redundancy))
}

/// Run the reprovisioning workflow and return one line per supplier.
pub async fn request_quotes(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let result = tokio::task::spawn_blocking(move || services.quotes().request_quote_lines()).await;

    match result {
        Ok(Ok(lines)) => Json(lines).into_response(),
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "quote request run failed");
            errors::reorder_error_to_response(e)
        }
        Err(e) => errors::join_error_to_response(e),
    }
}

pub async fn list_candidates(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let result = tokio::task::spawn_blocking(move || services.quotes().reorder_candidates()).await;

    match result {
        Ok(Ok(candidates)) => Json(dto::candidates_to_response(&candidates)).into_response(),
        Ok(Err(e)) => errors::reorder_error_to_response(e),
        Err(e) => errors::join_error_to_response(e),
    }
}

pub async fn supplier_redundancy(
    Extension(services): Extension<Arc<AppServices>>,
) -> axum::response::Response {
    let result = tokio::task::spawn_blocking(move || {
        let min = services.min_suppliers();
        services
            .quotes()
            .redundancy_gaps(min)
            .map(|gaps| dto::redundancy_to_response(min, &gaps))
    })
    .await;

    match result {
        Ok(Ok(body)) => Json(body).into_response(),
        Ok(Err(e)) => errors::reorder_error_to_response(e),
        Err(e) => errors::join_error_to_response(e),
    }
}
