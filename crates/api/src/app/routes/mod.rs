use axum::Router;

pub mod reorder;
pub mod system;

/// Router for the reprovisioning service endpoints.
pub fn router() -> Router {
    Router::new().nest("/api/services/reapprovisionnement", reorder::router())
}
