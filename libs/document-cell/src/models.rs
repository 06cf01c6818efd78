use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Fields common to every rendered document: who it is for, who issued it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentParties {
    pub consultation_id: Uuid,
    pub patient_name: String,
    pub patient_date_of_birth: String,
    pub doctor_name: String,
    pub doctor_license: String,
    pub issued_date: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrescriptionDocument {
    pub parties: DocumentParties,
    pub medication_name: String,
    pub dosage: String,
    pub quantity: String,
    pub repeats: i32,
    pub instructions: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedicalCertificateDocument {
    pub parties: DocumentParties,
    pub certificate_type: String,
    pub date_from: String,
    pub date_to: String,
    pub condition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathologyReferralDocument {
    pub parties: DocumentParties,
    pub tests_requested: Vec<String>,
    pub clinical_details: String,
    pub urgency: String,
    pub preferred_lab: Option<String>,
}

/// A rendered document plus where it was written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub file_name: String,
    pub path: String,
    pub html: String,
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("Failed to write document: {0}")]
    Io(#[from] std::io::Error),
}
