use std::sync::Arc;

use axum::{
    routing::{get, patch, post, put},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn consultation_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", post(handlers::submit_consultation))
        .route("/pending", get(handlers::list_pending_consultations))
        .route("/stats", get(handlers::consultation_stats))
        .route("/{consultation_id}", get(handlers::get_consultation))
        .route(
            "/{consultation_id}/document",
            get(handlers::get_consultation_document),
        )
        .route(
            "/{consultation_id}/status",
            patch(handlers::update_consultation_status),
        )
        .route(
            "/{consultation_id}/reassign",
            put(handlers::reassign_consultation),
        )
        .route(
            "/patient/{patient_id}",
            get(handlers::list_patient_consultations),
        )
        .route(
            "/doctor/{doctor_id}",
            get(handlers::list_doctor_consultations),
        )
        .with_state(state)
}
