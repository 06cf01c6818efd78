// libs/consultation-cell/src/services/intake.rs
use std::sync::Arc;

use tracing::{info, warn};

use doctor_cell::services::registry::DoctorRegistry;

use crate::error::ConsultationError;
use crate::models::{SubmitConsultationRequest, SubmitOutcome};
use crate::services::assignment::AssignmentEngine;
use crate::services::store::ConsultationStore;

/// Accepts new consultation requests: validates the payload, persists the
/// consultation in `pending`, then hands it to the assignment engine.
///
/// The record is durable before assignment runs, so a submission with no
/// available doctor still leaves a pending consultation behind for later
/// assignment.
pub struct IntakeService {
    store: Arc<dyn ConsultationStore>,
    engine: AssignmentEngine,
}

impl IntakeService {
    pub fn new(store: Arc<dyn ConsultationStore>, registry: Arc<dyn DoctorRegistry>) -> Self {
        let engine = AssignmentEngine::new(store.clone(), registry);
        Self { store, engine }
    }

    pub async fn submit(
        &self,
        request: SubmitConsultationRequest,
    ) -> Result<SubmitOutcome, ConsultationError> {
        if request.patient_id.trim().is_empty() {
            return Err(ConsultationError::ValidationError(
                "patient_id is required".to_string(),
            ));
        }
        request.request_data.validate()?;

        let consultation = self
            .store
            .create(&request.patient_id, request.request_data)
            .await?;

        match self.engine.assign(&consultation).await {
            Ok(assigned) => {
                info!(
                    "Consultation {} submitted and assigned to {:?}",
                    assigned.id, assigned.doctor_id
                );
                Ok(SubmitOutcome {
                    consultation_id: assigned.id,
                    status: assigned.status,
                    doctor_id: assigned.doctor_id,
                })
            }
            Err(ConsultationError::NoDoctorAvailable) => {
                warn!(
                    "Consultation {} left pending, no doctors available",
                    consultation.id
                );
                Err(ConsultationError::NoDoctorAvailable)
            }
            Err(err) => Err(err),
        }
    }
}
