use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ConsultationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ServiceType {
    Prescription,
    MedicalCertificate,
    MentalHealth,
    Telehealth,
    Pathology,
}

impl ServiceType {
    /// Completion of these service types must produce a generated document;
    /// the others complete with notes and a status change only.
    pub fn requires_document(&self) -> bool {
        matches!(
            self,
            ServiceType::Prescription | ServiceType::MedicalCertificate | ServiceType::Pathology
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Prescription => "prescription",
            ServiceType::MedicalCertificate => "medical_certificate",
            ServiceType::MentalHealth => "mental_health",
            ServiceType::Telehealth => "telehealth",
            ServiceType::Pathology => "pathology",
        }
    }
}

impl std::fmt::Display for ServiceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConsultationStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Cancelled,
}

impl ConsultationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ConsultationStatus::Completed | ConsultationStatus::Cancelled)
    }

    /// Whether a consultation in this state counts toward its doctor's
    /// workload counter.
    pub fn counts_toward_load(&self) -> bool {
        matches!(self, ConsultationStatus::Assigned | ConsultationStatus::InProgress)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsultationStatus::Pending => "pending",
            ConsultationStatus::Assigned => "assigned",
            ConsultationStatus::InProgress => "in_progress",
            ConsultationStatus::Completed => "completed",
            ConsultationStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for ConsultationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificateType {
    SickLeave,
    FitnessToWork,
    StudyExemption,
    GeneralMedical,
}

impl CertificateType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CertificateType::SickLeave => "sick_leave",
            CertificateType::FitnessToWork => "fitness_to_work",
            CertificateType::StudyExemption => "study_exemption",
            CertificateType::GeneralMedical => "general_medical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportType {
    MentalHealthPlan,
    CounselingReferral,
    MedicationReview,
    CrisisSupport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TelehealthType {
    General,
    FollowUp,
    ChronicDisease,
    Preventive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreferredTime {
    Morning,
    Afternoon,
    Evening,
    Anytime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Routine,
    Urgent,
    Asap,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Routine => "routine",
            Urgency::Urgent => "urgent",
            Urgency::Asap => "asap",
        }
    }
}

/// Service-specific intake payload. The tag keeps each service type's
/// required fields enforced at the boundary instead of an open JSON bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "service_type", rename_all = "snake_case")]
pub enum RequestData {
    Prescription {
        medication: String,
        dosage: String,
        #[serde(default)]
        quantity: Option<String>,
        reason: String,
        #[serde(default)]
        previous_doctor: Option<String>,
    },
    MedicalCertificate {
        certificate_type: CertificateType,
        date_from: String,
        date_to: String,
        symptoms: String,
    },
    MentalHealth {
        support_type: SupportType,
        #[serde(default)]
        symptoms: Option<String>,
        #[serde(default)]
        previous_treatment: Option<String>,
    },
    Telehealth {
        consultation_type: TelehealthType,
        preferred_time: PreferredTime,
        health_concerns: String,
        #[serde(default)]
        current_medications: Option<String>,
    },
    Pathology {
        tests_requested: Vec<String>,
        clinical_details: String,
        #[serde(default)]
        urgency: Option<Urgency>,
        #[serde(default)]
        preferred_lab: Option<String>,
    },
}

impl RequestData {
    pub fn service_type(&self) -> ServiceType {
        match self {
            RequestData::Prescription { .. } => ServiceType::Prescription,
            RequestData::MedicalCertificate { .. } => ServiceType::MedicalCertificate,
            RequestData::MentalHealth { .. } => ServiceType::MentalHealth,
            RequestData::Telehealth { .. } => ServiceType::Telehealth,
            RequestData::Pathology { .. } => ServiceType::Pathology,
        }
    }

    /// Intake-time validation of free-text required fields. Enum fields are
    /// already enforced by deserialization.
    pub fn validate(&self) -> Result<(), ConsultationError> {
        let missing = |field: &str| {
            Err(ConsultationError::ValidationError(format!(
                "{} is required",
                field
            )))
        };

        match self {
            RequestData::Prescription {
                medication,
                dosage,
                reason,
                ..
            } => {
                if medication.trim().is_empty() {
                    return missing("medication");
                }
                if dosage.trim().is_empty() {
                    return missing("dosage");
                }
                if reason.trim().is_empty() {
                    return missing("reason");
                }
            }
            RequestData::MedicalCertificate {
                date_from,
                date_to,
                symptoms,
                ..
            } => {
                if date_from.trim().is_empty() {
                    return missing("date_from");
                }
                if date_to.trim().is_empty() {
                    return missing("date_to");
                }
                if symptoms.trim().is_empty() {
                    return missing("symptoms");
                }
            }
            RequestData::MentalHealth { .. } => {}
            RequestData::Telehealth { health_concerns, .. } => {
                if health_concerns.trim().is_empty() {
                    return missing("health_concerns");
                }
            }
            RequestData::Pathology {
                tests_requested,
                clinical_details,
                ..
            } => {
                if tests_requested.iter().all(|t| t.trim().is_empty()) {
                    return missing("tests_requested");
                }
                if clinical_details.trim().is_empty() {
                    return missing("clinical_details");
                }
            }
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consultation {
    pub id: Uuid,
    pub patient_id: String,
    pub doctor_id: Option<Uuid>,
    pub service_type: ServiceType,
    pub status: ConsultationStatus,
    pub request_data: RequestData,
    pub doctor_notes: Option<String>,
    #[serde(rename = "generated_document_path")]
    pub document_path: Option<String>,
    #[serde(rename = "generated_document_html")]
    pub document_html: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Generated document reference persisted together with a completion, in the
/// same store write.
#[derive(Debug, Clone)]
pub struct DocumentRef {
    pub path: String,
    pub html: String,
}

// ==============================================================================
// REQUEST / RESPONSE DTOS
// ==============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitConsultationRequest {
    pub patient_id: String,
    #[serde(flatten)]
    pub request_data: RequestData,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmitOutcome {
    pub consultation_id: Uuid,
    pub status: ConsultationStatus,
    pub doctor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusRequest {
    pub doctor_id: Uuid,
    pub status: ConsultationStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReassignRequest {
    pub doctor_id: Uuid,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConsultationStats {
    pub total: usize,
    pub pending: usize,
    pub assigned: usize,
    pub in_progress: usize,
    pub completed: usize,
    pub cancelled: usize,
}
