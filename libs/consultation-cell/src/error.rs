use thiserror::Error;

use doctor_cell::models::DoctorError;
use shared_models::error::AppError;

use crate::models::ConsultationStatus;

#[derive(Debug, Error)]
pub enum ConsultationError {
    #[error("No doctors are currently available")]
    NoDoctorAvailable,

    #[error("Cannot transition consultation from {from} to {to}")]
    IllegalTransition {
        from: ConsultationStatus,
        to: ConsultationStatus,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("Document generation failed: {0}")]
    DocumentGenerationFailed(String),

    #[error("{0}")]
    ValidationError(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<ConsultationError> for AppError {
    fn from(err: ConsultationError) -> Self {
        match err {
            ConsultationError::NoDoctorAvailable => AppError::Unavailable(err.to_string()),
            ConsultationError::IllegalTransition { .. } => AppError::Conflict(err.to_string()),
            ConsultationError::NotFound(msg) => AppError::NotFound(msg),
            ConsultationError::DocumentGenerationFailed(msg) => AppError::ExternalService(msg),
            ConsultationError::ValidationError(msg) => AppError::ValidationError(msg),
            ConsultationError::Storage(msg) => AppError::Database(msg),
        }
    }
}

impl From<DoctorError> for ConsultationError {
    fn from(err: DoctorError) -> Self {
        match err {
            DoctorError::NotFound => ConsultationError::NotFound("Doctor not found".to_string()),
            DoctorError::ValidationError(msg) => ConsultationError::ValidationError(msg),
            DoctorError::Storage(msg) => ConsultationError::Storage(msg),
        }
    }
}
