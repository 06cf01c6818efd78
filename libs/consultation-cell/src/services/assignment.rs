// libs/consultation-cell/src/services/assignment.rs
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use doctor_cell::services::registry::DoctorRegistry;

use crate::error::ConsultationError;
use crate::models::{Consultation, ConsultationStatus};
use crate::services::store::ConsultationStore;

/// Picks a doctor for each new consultation and keeps workload counters in
/// step with assignment changes.
///
/// Selection is least-loaded-first: the active doctor with the smallest
/// `workload_count` wins, and ties go to whichever doctor the registry lists
/// first. Every assignment increments the winner's counter before the
/// consultation record is updated; if that update fails the increment is
/// compensated so the counter never drifts.
pub struct AssignmentEngine {
    store: Arc<dyn ConsultationStore>,
    registry: Arc<dyn DoctorRegistry>,
}

impl AssignmentEngine {
    pub fn new(store: Arc<dyn ConsultationStore>, registry: Arc<dyn DoctorRegistry>) -> Self {
        Self { store, registry }
    }

    /// Assign a pending consultation to the least-loaded active doctor.
    pub async fn assign(
        &self,
        consultation: &Consultation,
    ) -> Result<Consultation, ConsultationError> {
        if consultation.doctor_id.is_some() {
            return Err(ConsultationError::ValidationError(
                "Consultation is already assigned".to_string(),
            ));
        }

        let candidates = self.registry.list_active().await?;
        let chosen = candidates
            .iter()
            .min_by_key(|d| d.workload_count)
            .ok_or(ConsultationError::NoDoctorAvailable)?;

        self.registry.adjust_workload(chosen.id, 1).await?;

        match self.store.set_doctor(consultation.id, chosen.id).await {
            Ok(updated) => {
                info!(
                    "Assigned consultation {} to doctor {} (workload was {})",
                    consultation.id, chosen.id, chosen.workload_count
                );
                Ok(updated)
            }
            Err(err) => {
                // Undo the increment so the counter matches reality.
                if let Err(comp) = self.registry.adjust_workload(chosen.id, -1).await {
                    warn!(
                        "Failed to compensate workload for doctor {} after assignment failure: {}",
                        chosen.id, comp
                    );
                }
                Err(err)
            }
        }
    }

    /// Move a consultation to a different doctor, transferring one unit of
    /// workload from the old doctor (if any) to the new one.
    pub async fn reassign(
        &self,
        consultation_id: Uuid,
        new_doctor_id: Uuid,
    ) -> Result<Consultation, ConsultationError> {
        let consultation = self
            .store
            .get(consultation_id)
            .await?
            .ok_or_else(|| ConsultationError::NotFound("Consultation not found".to_string()))?;

        if consultation.status.is_terminal() {
            return Err(ConsultationError::IllegalTransition {
                from: consultation.status,
                to: ConsultationStatus::Assigned,
            });
        }

        let new_doctor = self
            .registry
            .get(new_doctor_id)
            .await?
            .ok_or_else(|| ConsultationError::NotFound("Doctor not found".to_string()))?;

        if !new_doctor.is_active {
            return Err(ConsultationError::ValidationError(format!(
                "Doctor {} is not accepting consultations",
                new_doctor.full_name
            )));
        }

        if consultation.doctor_id == Some(new_doctor_id) {
            return Err(ConsultationError::ValidationError(
                "Consultation is already assigned to this doctor".to_string(),
            ));
        }

        let released = match consultation.doctor_id {
            Some(old_doctor_id) => self.registry.adjust_workload(old_doctor_id, -1).await?,
            None => 0,
        };
        self.registry.adjust_workload(new_doctor_id, 1).await?;

        match self.store.set_doctor(consultation_id, new_doctor_id).await {
            Ok(updated) => {
                info!(
                    "Reassigned consultation {} from {:?} to doctor {}",
                    consultation_id, consultation.doctor_id, new_doctor_id
                );
                Ok(updated)
            }
            Err(err) => {
                // Put both counters back where they were. The old doctor
                // gets back only what the decrement actually took; a
                // decrement floored at zero must not mint a unit here.
                if let Err(comp) = self.registry.adjust_workload(new_doctor_id, -1).await {
                    warn!(
                        "Failed to compensate workload for doctor {} after reassignment failure: {}",
                        new_doctor_id, comp
                    );
                }
                if released != 0 {
                    if let Some(old_doctor_id) = consultation.doctor_id {
                        if let Err(comp) =
                            self.registry.adjust_workload(old_doctor_id, -released).await
                        {
                            warn!(
                                "Failed to restore workload for doctor {} after reassignment failure: {}",
                                old_doctor_id, comp
                            );
                        }
                    }
                }
                Err(err)
            }
        }
    }
}
