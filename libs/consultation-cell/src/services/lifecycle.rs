// libs/consultation-cell/src/services/lifecycle.rs
use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use doctor_cell::models::Doctor;
use doctor_cell::services::registry::DoctorRegistry;
use document_cell::models::{
    DocumentParties, MedicalCertificateDocument, PathologyReferralDocument, PrescriptionDocument,
};
use document_cell::services::generator::DocumentGenerator;
use notification_cell::models::StatusUpdate;
use notification_cell::services::mailer::Notifier;
use shared_models::patient::Patient;

use crate::error::ConsultationError;
use crate::models::{Consultation, ConsultationStatus, DocumentRef, RequestData, Urgency};
use crate::services::store::{ConsultationStore, PatientDirectory};

const DEFAULT_PRESCRIPTION_QUANTITY: &str = "30";

/// Drives consultation status transitions and their side effects.
///
/// Completion of a document-bearing service type generates the document
/// first; a generation failure aborts the transition and leaves the
/// consultation untouched. Notification is last and best-effort: a failed
/// email never rolls a transition back.
pub struct LifecycleController {
    store: Arc<dyn ConsultationStore>,
    registry: Arc<dyn DoctorRegistry>,
    patients: Arc<dyn PatientDirectory>,
    documents: DocumentGenerator,
    notifier: Arc<dyn Notifier>,
}

/// States a consultation may move to from `from` via a doctor-driven update.
pub fn valid_transitions(from: ConsultationStatus) -> &'static [ConsultationStatus] {
    match from {
        ConsultationStatus::Pending => &[ConsultationStatus::Assigned],
        ConsultationStatus::Assigned => &[
            ConsultationStatus::InProgress,
            ConsultationStatus::Completed,
            ConsultationStatus::Cancelled,
        ],
        ConsultationStatus::InProgress => {
            &[ConsultationStatus::Completed, ConsultationStatus::Cancelled]
        }
        ConsultationStatus::Completed | ConsultationStatus::Cancelled => &[],
    }
}

pub fn validate_transition(
    from: ConsultationStatus,
    to: ConsultationStatus,
) -> Result<(), ConsultationError> {
    if valid_transitions(from).contains(&to) {
        Ok(())
    } else {
        Err(ConsultationError::IllegalTransition { from, to })
    }
}

impl LifecycleController {
    pub fn new(
        store: Arc<dyn ConsultationStore>,
        registry: Arc<dyn DoctorRegistry>,
        patients: Arc<dyn PatientDirectory>,
        documents: DocumentGenerator,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            registry,
            patients,
            documents,
            notifier,
        }
    }

    /// Apply a doctor-requested status change, running completion side
    /// effects when the target state is `completed`.
    pub async fn update_status(
        &self,
        consultation_id: Uuid,
        requesting_doctor_id: Uuid,
        new_status: ConsultationStatus,
        notes: Option<String>,
    ) -> Result<Consultation, ConsultationError> {
        let consultation = self
            .store
            .get(consultation_id)
            .await?
            .ok_or_else(|| ConsultationError::NotFound("Consultation not found".to_string()))?;

        // The requesting doctor may only touch their own consultations.
        if consultation.doctor_id != Some(requesting_doctor_id) {
            return Err(ConsultationError::NotFound(
                "Consultation not found for this doctor".to_string(),
            ));
        }

        validate_transition(consultation.status, new_status)?;

        let doctor = self
            .registry
            .get(requesting_doctor_id)
            .await?
            .ok_or_else(|| ConsultationError::NotFound("Doctor not found".to_string()))?;

        let updated = match new_status {
            ConsultationStatus::Completed => {
                self.complete(&consultation, &doctor, notes).await?
            }
            ConsultationStatus::Cancelled => self.cancel(&consultation, &doctor, notes).await?,
            _ => {
                self.store
                    .update_status(consultation_id, new_status, notes)
                    .await?
            }
        };

        info!(
            "Consultation {} moved {} -> {}",
            consultation_id, consultation.status, new_status
        );

        if new_status != ConsultationStatus::Cancelled {
            self.notify(&updated, &doctor).await;
        }

        Ok(updated)
    }

    /// Completion side effects, in order: generate the outcome document
    /// (when the service type has one), release one unit of the doctor's
    /// workload, then close the consultation in a single store write that
    /// carries the status, `completed_at`, notes and document together.
    /// If that write fails the released unit is restored, so neither a
    /// terminal status without the decrement nor a dangling document
    /// reference can be observed.
    async fn complete(
        &self,
        consultation: &Consultation,
        doctor: &Doctor,
        notes: Option<String>,
    ) -> Result<Consultation, ConsultationError> {
        let document = if consultation.service_type.requires_document() {
            let patient = self
                .patients
                .get(&consultation.patient_id)
                .await?
                .ok_or_else(|| ConsultationError::NotFound("Patient not found".to_string()))?;

            let generated = self
                .generate_document(consultation, doctor, &patient)
                .map_err(|e| ConsultationError::DocumentGenerationFailed(e.to_string()))?;

            Some(DocumentRef {
                path: generated.path,
                html: generated.html,
            })
        } else {
            None
        };

        let released = self.registry.adjust_workload(doctor.id, -1).await?;

        match self.store.complete(consultation.id, notes, document).await {
            Ok(updated) => Ok(updated),
            Err(err) => {
                self.restore_workload(doctor.id, released).await;
                Err(err)
            }
        }
    }

    /// Cancellation releases the workload unit first, then writes the
    /// status; a failed write restores what the decrement took.
    async fn cancel(
        &self,
        consultation: &Consultation,
        doctor: &Doctor,
        notes: Option<String>,
    ) -> Result<Consultation, ConsultationError> {
        let released = if consultation.status.counts_toward_load() {
            self.registry.adjust_workload(doctor.id, -1).await?
        } else {
            0
        };

        match self
            .store
            .update_status(consultation.id, ConsultationStatus::Cancelled, notes)
            .await
        {
            Ok(updated) => Ok(updated),
            Err(err) => {
                self.restore_workload(doctor.id, released).await;
                Err(err)
            }
        }
    }

    /// Undo a workload release after a failed store write. Restores only
    /// what the decrement actually applied, so a floored decrement never
    /// mints a unit.
    async fn restore_workload(&self, doctor_id: Uuid, released: i32) {
        if released == 0 {
            return;
        }
        if let Err(comp) = self.registry.adjust_workload(doctor_id, -released).await {
            warn!(
                "Failed to restore workload for doctor {} after a failed status write: {}",
                doctor_id, comp
            );
        }
    }

    fn generate_document(
        &self,
        consultation: &Consultation,
        doctor: &Doctor,
        patient: &Patient,
    ) -> Result<document_cell::models::GeneratedDocument, document_cell::models::DocumentError>
    {
        let parties = DocumentParties {
            consultation_id: consultation.id,
            patient_name: patient.full_name(),
            patient_date_of_birth: patient.date_of_birth.clone().unwrap_or_default(),
            doctor_name: doctor.full_name.clone(),
            doctor_license: doctor.license_number.clone(),
            issued_date: Utc::now().format("%d %B %Y").to_string(),
        };

        match &consultation.request_data {
            RequestData::Prescription {
                medication,
                dosage,
                quantity,
                reason,
                ..
            } => self.documents.generate_prescription(&PrescriptionDocument {
                parties,
                medication_name: medication.clone(),
                dosage: dosage.clone(),
                quantity: quantity
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PRESCRIPTION_QUANTITY.to_string()),
                repeats: 0,
                instructions: reason.clone(),
            }),
            RequestData::MedicalCertificate {
                certificate_type,
                date_from,
                date_to,
                symptoms,
            } => self
                .documents
                .generate_medical_certificate(&MedicalCertificateDocument {
                    parties,
                    certificate_type: certificate_type.as_str().replace('_', " "),
                    date_from: date_from.clone(),
                    date_to: date_to.clone(),
                    condition: symptoms.clone(),
                }),
            RequestData::Pathology {
                tests_requested,
                clinical_details,
                urgency,
                preferred_lab,
            } => self
                .documents
                .generate_pathology_referral(&PathologyReferralDocument {
                    parties,
                    tests_requested: tests_requested.clone(),
                    clinical_details: clinical_details.clone(),
                    urgency: urgency.unwrap_or(Urgency::Routine).as_str().to_string(),
                    preferred_lab: preferred_lab.clone(),
                }),
            // Stateless service types carry no document; callers check
            // requires_document() before getting here.
            RequestData::MentalHealth { .. } | RequestData::Telehealth { .. } => Err(
                document_cell::models::DocumentError::MissingField("service_type"),
            ),
        }
    }

    /// Best-effort status email. Missing patients or relay failures are
    /// logged and swallowed.
    async fn notify(&self, consultation: &Consultation, doctor: &Doctor) {
        let patient = match self.patients.get(&consultation.patient_id).await {
            Ok(Some(patient)) => patient,
            Ok(None) => {
                warn!(
                    "No patient record for {}, skipping status notification",
                    consultation.patient_id
                );
                return;
            }
            Err(e) => {
                warn!("Patient lookup failed, skipping status notification: {}", e);
                return;
            }
        };

        let update = StatusUpdate {
            patient_email: patient.email.clone(),
            patient_name: patient.full_name(),
            service_type: consultation.service_type.as_str().to_string(),
            new_status: consultation.status.as_str().to_string(),
            doctor_name: doctor.full_name.clone(),
        };

        if let Err(e) = self.notifier.send_status_update(&update).await {
            warn!(
                "Failed to send status update for consultation {}: {}",
                consultation.id, e
            );
        }
    }
}
