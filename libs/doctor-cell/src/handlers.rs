use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::models::{CreateDoctorRequest, DoctorError, SetActiveRequest};
use crate::services::registry::{DoctorRegistry, SupabaseDoctorRegistry};

impl From<DoctorError> for AppError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => AppError::NotFound("Doctor not found".to_string()),
            DoctorError::ValidationError(msg) => AppError::ValidationError(msg),
            DoctorError::Storage(msg) => AppError::Database(msg),
        }
    }
}

#[axum::debug_handler]
pub async fn create_doctor(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<CreateDoctorRequest>,
) -> Result<Json<Value>, AppError> {
    let registry = SupabaseDoctorRegistry::new(&state);

    let doctor = registry.create(request).await?;

    Ok(Json(json!({
        "message": "Doctor created successfully",
        "doctor": doctor
    })))
}

#[axum::debug_handler]
pub async fn list_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let registry = SupabaseDoctorRegistry::new(&state);

    let doctors = registry.list_all().await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn list_active_doctors(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let registry = SupabaseDoctorRegistry::new(&state);

    let doctors = registry.list_active().await?;

    Ok(Json(json!({
        "doctors": doctors,
        "total": doctors.len()
    })))
}

#[axum::debug_handler]
pub async fn get_doctor(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let registry = SupabaseDoctorRegistry::new(&state);

    let doctor = registry
        .get(doctor_id)
        .await?
        .ok_or(DoctorError::NotFound)?;

    Ok(Json(json!(doctor)))
}

#[axum::debug_handler]
pub async fn set_doctor_active(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<Value>, AppError> {
    let registry = SupabaseDoctorRegistry::new(&state);

    let doctor = registry.set_active(doctor_id, request.is_active).await?;

    Ok(Json(json!({
        "message": "Doctor updated successfully",
        "doctor": doctor
    })))
}
