use std::sync::Arc;

use axum::{
    routing::{get, patch},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn doctor_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route("/", get(handlers::list_doctors).post(handlers::create_doctor))
        .route("/active", get(handlers::list_active_doctors))
        .route("/{doctor_id}", get(handlers::get_doctor))
        .route("/{doctor_id}/active", patch(handlers::set_doctor_active))
        .with_state(state)
}
