use std::sync::Arc;

use axum::{
    extract::{Path, State},
    response::Html,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use document_cell::services::generator::DocumentGenerator;
use notification_cell::services::mailer::EmailNotifier;
use shared_config::AppConfig;
use shared_models::error::AppError;

use crate::error::ConsultationError;
use crate::models::{ReassignRequest, SubmitConsultationRequest, UpdateStatusRequest};
use crate::services::assignment::AssignmentEngine;
use crate::services::intake::IntakeService;
use crate::services::lifecycle::LifecycleController;
use crate::services::store::{
    ConsultationStore, SupabaseConsultationStore, SupabasePatientDirectory,
};
use doctor_cell::services::registry::SupabaseDoctorRegistry;

fn store(state: &AppConfig) -> Arc<SupabaseConsultationStore> {
    Arc::new(SupabaseConsultationStore::new(state))
}

fn registry(state: &AppConfig) -> Arc<SupabaseDoctorRegistry> {
    Arc::new(SupabaseDoctorRegistry::new(state))
}

fn lifecycle(state: &AppConfig) -> LifecycleController {
    LifecycleController::new(
        store(state),
        registry(state),
        Arc::new(SupabasePatientDirectory::new(state)),
        DocumentGenerator::new(state),
        Arc::new(EmailNotifier::new(state)),
    )
}

#[axum::debug_handler]
pub async fn submit_consultation(
    State(state): State<Arc<AppConfig>>,
    Json(request): Json<SubmitConsultationRequest>,
) -> Result<Json<Value>, AppError> {
    let intake = IntakeService::new(store(&state), registry(&state));

    let outcome = intake.submit(request).await?;

    Ok(Json(json!({
        "message": "Consultation submitted successfully",
        "consultation_id": outcome.consultation_id,
        "status": outcome.status,
        "doctor_id": outcome.doctor_id
    })))
}

#[axum::debug_handler]
pub async fn list_pending_consultations(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let consultations = store(&state).list_pending().await?;

    Ok(Json(json!({
        "consultations": consultations,
        "total": consultations.len()
    })))
}

#[axum::debug_handler]
pub async fn get_consultation(
    State(state): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let consultation = store(&state)
        .get(consultation_id)
        .await?
        .ok_or_else(|| ConsultationError::NotFound("Consultation not found".to_string()))?;

    Ok(Json(json!(consultation)))
}

#[axum::debug_handler]
pub async fn get_consultation_document(
    State(state): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
) -> Result<Html<String>, AppError> {
    let consultation = store(&state)
        .get(consultation_id)
        .await?
        .ok_or_else(|| ConsultationError::NotFound("Consultation not found".to_string()))?;

    let html = consultation.document_html.ok_or_else(|| {
        ConsultationError::NotFound("No document has been generated for this consultation".to_string())
    })?;

    Ok(Html(html))
}

#[axum::debug_handler]
pub async fn list_patient_consultations(
    State(state): State<Arc<AppConfig>>,
    Path(patient_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let consultations = store(&state).list_by_patient(&patient_id).await?;

    Ok(Json(json!({
        "consultations": consultations,
        "total": consultations.len()
    })))
}

#[axum::debug_handler]
pub async fn list_doctor_consultations(
    State(state): State<Arc<AppConfig>>,
    Path(doctor_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let consultations = store(&state).list_by_doctor(doctor_id).await?;

    Ok(Json(json!({
        "consultations": consultations,
        "total": consultations.len()
    })))
}

#[axum::debug_handler]
pub async fn update_consultation_status(
    State(state): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    Json(request): Json<UpdateStatusRequest>,
) -> Result<Json<Value>, AppError> {
    let controller = lifecycle(&state);

    let consultation = controller
        .update_status(
            consultation_id,
            request.doctor_id,
            request.status,
            request.notes,
        )
        .await?;

    Ok(Json(json!({
        "message": "Consultation updated successfully",
        "consultation": consultation
    })))
}

#[axum::debug_handler]
pub async fn reassign_consultation(
    State(state): State<Arc<AppConfig>>,
    Path(consultation_id): Path<Uuid>,
    Json(request): Json<ReassignRequest>,
) -> Result<Json<Value>, AppError> {
    let engine = AssignmentEngine::new(store(&state), registry(&state));

    let consultation = engine.reassign(consultation_id, request.doctor_id).await?;

    Ok(Json(json!({
        "message": "Consultation reassigned successfully",
        "consultation": consultation
    })))
}

#[axum::debug_handler]
pub async fn consultation_stats(
    State(state): State<Arc<AppConfig>>,
) -> Result<Json<Value>, AppError> {
    let stats = store(&state).stats().await?;

    Ok(Json(json!(stats)))
}
