// libs/consultation-cell/src/services/store.rs
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;
use shared_models::patient::Patient;

use crate::error::ConsultationError;
use crate::models::{
    Consultation, ConsultationStats, ConsultationStatus, DocumentRef, RequestData,
};

/// Durable consultation records.
///
/// The store only persists state; assignment and transition rules live in the
/// services above it. `set_doctor` and `update_status` are the only writes
/// that touch status, and both stamp `updated_at`.
#[async_trait]
pub trait ConsultationStore: Send + Sync {
    /// Persist a new consultation in `pending` with no doctor.
    async fn create(
        &self,
        patient_id: &str,
        request_data: RequestData,
    ) -> Result<Consultation, ConsultationError>;

    async fn get(&self, id: Uuid) -> Result<Option<Consultation>, ConsultationError>;

    /// Unassigned consultations, oldest first.
    async fn list_pending(&self) -> Result<Vec<Consultation>, ConsultationError>;

    async fn list_by_patient(&self, patient_id: &str)
        -> Result<Vec<Consultation>, ConsultationError>;

    async fn list_by_doctor(&self, doctor_id: Uuid)
        -> Result<Vec<Consultation>, ConsultationError>;

    /// Point the consultation at `doctor_id` and move it to `assigned`.
    /// Used for both initial assignment and reassignment.
    async fn set_doctor(
        &self,
        id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Consultation, ConsultationError>;

    /// Write the new status (and notes, when given).
    async fn update_status(
        &self,
        id: Uuid,
        status: ConsultationStatus,
        notes: Option<String>,
    ) -> Result<Consultation, ConsultationError>;

    /// Close the consultation in one write: status `completed`,
    /// `completed_at`, notes, and the generated document reference when the
    /// service type has one. A single write means a failure here leaves no
    /// document attached to a non-completed record.
    async fn complete(
        &self,
        id: Uuid,
        notes: Option<String>,
        document: Option<DocumentRef>,
    ) -> Result<Consultation, ConsultationError>;

    async fn stats(&self) -> Result<ConsultationStats, ConsultationError>;
}

/// Patient lookup for document generation and notifications.
#[async_trait]
pub trait PatientDirectory: Send + Sync {
    async fn get(&self, patient_id: &str) -> Result<Option<Patient>, ConsultationError>;
}

// ==============================================================================
// SUPABASE-BACKED STORE
// ==============================================================================

pub struct SupabaseConsultationStore {
    supabase: SupabaseClient,
}

impl SupabaseConsultationStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    fn representation_headers() -> reqwest::header::HeaderMap {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            "Prefer",
            reqwest::header::HeaderValue::from_static("return=representation"),
        );
        headers
    }

    fn row_to_consultation(row: Value) -> Result<Consultation, ConsultationError> {
        serde_json::from_value(row).map_err(|e| ConsultationError::Storage(e.to_string()))
    }

    fn rows_to_consultations(rows: Vec<Value>) -> Result<Vec<Consultation>, ConsultationError> {
        rows.into_iter().map(Self::row_to_consultation).collect()
    }

    async fn patch(
        &self,
        id: Uuid,
        update: Value,
    ) -> Result<Consultation, ConsultationError> {
        let path = format!("/rest/v1/consultations?id=eq.{}", id);
        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(update),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| ConsultationError::Storage(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| ConsultationError::NotFound("Consultation not found".to_string()))?;
        Self::row_to_consultation(row)
    }
}

#[async_trait]
impl ConsultationStore for SupabaseConsultationStore {
    async fn create(
        &self,
        patient_id: &str,
        request_data: RequestData,
    ) -> Result<Consultation, ConsultationError> {
        let service_type = request_data.service_type();
        debug!(
            "Creating {} consultation for patient {}",
            service_type, patient_id
        );

        let now = Utc::now().to_rfc3339();
        let row = json!({
            "patient_id": patient_id,
            "doctor_id": null,
            "service_type": service_type,
            "status": ConsultationStatus::Pending,
            "request_data": request_data,
            "created_at": now,
            "updated_at": now
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/consultations",
                Some(row),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| ConsultationError::Storage(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| ConsultationError::Storage("insert returned no row".to_string()))?;
        Self::row_to_consultation(row)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Consultation>, ConsultationError> {
        let path = format!("/rest/v1/consultations?id=eq.{}", id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| ConsultationError::Storage(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => Ok(Some(Self::row_to_consultation(row)?)),
            None => Ok(None),
        }
    }

    async fn list_pending(&self) -> Result<Vec<Consultation>, ConsultationError> {
        let result: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/consultations?status=eq.pending&order=created_at.asc",
                None,
            )
            .await
            .map_err(|e| ConsultationError::Storage(e.to_string()))?;
        Self::rows_to_consultations(result)
    }

    async fn list_by_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        let path = format!(
            "/rest/v1/consultations?patient_id=eq.{}&order=created_at.desc",
            patient_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| ConsultationError::Storage(e.to_string()))?;
        Self::rows_to_consultations(result)
    }

    async fn list_by_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        let path = format!(
            "/rest/v1/consultations?doctor_id=eq.{}&order=created_at.desc",
            doctor_id
        );
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| ConsultationError::Storage(e.to_string()))?;
        Self::rows_to_consultations(result)
    }

    async fn set_doctor(
        &self,
        id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Consultation, ConsultationError> {
        self.patch(
            id,
            json!({
                "doctor_id": doctor_id,
                "status": ConsultationStatus::Assigned,
                "updated_at": Utc::now().to_rfc3339()
            }),
        )
        .await
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ConsultationStatus,
        notes: Option<String>,
    ) -> Result<Consultation, ConsultationError> {
        let mut update = json!({
            "status": status,
            "updated_at": Utc::now().to_rfc3339()
        });
        if let Some(notes) = notes {
            update["doctor_notes"] = json!(notes);
        }
        self.patch(id, update).await
    }

    async fn complete(
        &self,
        id: Uuid,
        notes: Option<String>,
        document: Option<DocumentRef>,
    ) -> Result<Consultation, ConsultationError> {
        let now = Utc::now().to_rfc3339();
        let mut update = json!({
            "status": ConsultationStatus::Completed,
            "completed_at": now.clone(),
            "updated_at": now
        });
        if let Some(notes) = notes {
            update["doctor_notes"] = json!(notes);
        }
        if let Some(document) = document {
            update["generated_document_path"] = json!(document.path);
            update["generated_document_html"] = json!(document.html);
        }
        self.patch(id, update).await
    }

    async fn stats(&self) -> Result<ConsultationStats, ConsultationError> {
        // Status counts are small enough to fold client side; a dedicated
        // aggregate view is not worth the extra schema surface yet.
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, "/rest/v1/consultations?select=status", None)
            .await
            .map_err(|e| ConsultationError::Storage(e.to_string()))?;

        let mut stats = ConsultationStats::default();
        for row in result {
            let status: ConsultationStatus = serde_json::from_value(row["status"].clone())
                .map_err(|e| ConsultationError::Storage(e.to_string()))?;
            tally(&mut stats, status);
        }
        Ok(stats)
    }
}

// ==============================================================================
// SUPABASE-BACKED PATIENT DIRECTORY
// ==============================================================================

pub struct SupabasePatientDirectory {
    supabase: SupabaseClient,
}

impl SupabasePatientDirectory {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }
}

#[async_trait]
impl PatientDirectory for SupabasePatientDirectory {
    async fn get(&self, patient_id: &str) -> Result<Option<Patient>, ConsultationError> {
        let path = format!("/rest/v1/users?id=eq.{}", patient_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| ConsultationError::Storage(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => {
                let patient = serde_json::from_value(row)
                    .map_err(|e| ConsultationError::Storage(e.to_string()))?;
                Ok(Some(patient))
            }
            None => Ok(None),
        }
    }
}

// ==============================================================================
// IN-MEMORY IMPLEMENTATIONS (tests and local development)
// ==============================================================================

#[derive(Default)]
pub struct InMemoryConsultationStore {
    consultations: RwLock<Vec<Consultation>>,
}

impl InMemoryConsultationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, bypassing intake.
    pub async fn seed(&self, consultation: Consultation) {
        self.consultations.write().await.push(consultation);
    }
}

#[async_trait]
impl ConsultationStore for InMemoryConsultationStore {
    async fn create(
        &self,
        patient_id: &str,
        request_data: RequestData,
    ) -> Result<Consultation, ConsultationError> {
        let now = Utc::now();
        let consultation = Consultation {
            id: Uuid::new_v4(),
            patient_id: patient_id.to_string(),
            doctor_id: None,
            service_type: request_data.service_type(),
            status: ConsultationStatus::Pending,
            request_data,
            doctor_notes: None,
            document_path: None,
            document_html: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        };
        self.consultations.write().await.push(consultation.clone());
        Ok(consultation)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Consultation>, ConsultationError> {
        let consultations = self.consultations.read().await;
        Ok(consultations.iter().find(|c| c.id == id).cloned())
    }

    async fn list_pending(&self) -> Result<Vec<Consultation>, ConsultationError> {
        let consultations = self.consultations.read().await;
        Ok(consultations
            .iter()
            .filter(|c| c.status == ConsultationStatus::Pending)
            .cloned()
            .collect())
    }

    async fn list_by_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        let consultations = self.consultations.read().await;
        Ok(consultations
            .iter()
            .filter(|c| c.patient_id == patient_id)
            .cloned()
            .collect())
    }

    async fn list_by_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        let consultations = self.consultations.read().await;
        Ok(consultations
            .iter()
            .filter(|c| c.doctor_id == Some(doctor_id))
            .cloned()
            .collect())
    }

    async fn set_doctor(
        &self,
        id: Uuid,
        doctor_id: Uuid,
    ) -> Result<Consultation, ConsultationError> {
        let mut consultations = self.consultations.write().await;
        let consultation = consultations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ConsultationError::NotFound("Consultation not found".to_string()))?;
        consultation.doctor_id = Some(doctor_id);
        consultation.status = ConsultationStatus::Assigned;
        consultation.updated_at = Utc::now();
        Ok(consultation.clone())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ConsultationStatus,
        notes: Option<String>,
    ) -> Result<Consultation, ConsultationError> {
        let mut consultations = self.consultations.write().await;
        let consultation = consultations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ConsultationError::NotFound("Consultation not found".to_string()))?;
        consultation.status = status;
        if let Some(notes) = notes {
            consultation.doctor_notes = Some(notes);
        }
        consultation.updated_at = Utc::now();
        Ok(consultation.clone())
    }

    async fn complete(
        &self,
        id: Uuid,
        notes: Option<String>,
        document: Option<DocumentRef>,
    ) -> Result<Consultation, ConsultationError> {
        let mut consultations = self.consultations.write().await;
        let consultation = consultations
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ConsultationError::NotFound("Consultation not found".to_string()))?;
        consultation.status = ConsultationStatus::Completed;
        if let Some(notes) = notes {
            consultation.doctor_notes = Some(notes);
        }
        if let Some(document) = document {
            consultation.document_path = Some(document.path);
            consultation.document_html = Some(document.html);
        }
        consultation.completed_at = Some(Utc::now());
        consultation.updated_at = Utc::now();
        Ok(consultation.clone())
    }

    async fn stats(&self) -> Result<ConsultationStats, ConsultationError> {
        let consultations = self.consultations.read().await;
        let mut stats = ConsultationStats::default();
        for consultation in consultations.iter() {
            tally(&mut stats, consultation.status);
        }
        Ok(stats)
    }
}

#[derive(Default)]
pub struct InMemoryPatientDirectory {
    patients: RwLock<HashMap<String, Patient>>,
}

impl InMemoryPatientDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, patient: Patient) {
        self.patients
            .write()
            .await
            .insert(patient.id.clone(), patient);
    }
}

#[async_trait]
impl PatientDirectory for InMemoryPatientDirectory {
    async fn get(&self, patient_id: &str) -> Result<Option<Patient>, ConsultationError> {
        Ok(self.patients.read().await.get(patient_id).cloned())
    }
}

fn tally(stats: &mut ConsultationStats, status: ConsultationStatus) {
    stats.total += 1;
    match status {
        ConsultationStatus::Pending => stats.pending += 1,
        ConsultationStatus::Assigned => stats.assigned += 1,
        ConsultationStatus::InProgress => stats.in_progress += 1,
        ConsultationStatus::Completed => stats.completed += 1,
        ConsultationStatus::Cancelled => stats.cancelled += 1,
    }
}
