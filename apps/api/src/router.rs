use std::sync::Arc;

use axum::{routing::get, Router};

use consultation_cell::router::consultation_routes;
use doctor_cell::router::doctor_routes;
use shared_config::AppConfig;

pub fn create_router(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(|| async { "FreeDoc API is running!" }))
        .nest("/doctors", doctor_routes(state.clone()))
        .nest("/consultations", consultation_routes(state.clone()))
}
