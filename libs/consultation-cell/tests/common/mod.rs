use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use consultation_cell::models::{
    CertificateType, Consultation, ConsultationStats, ConsultationStatus, DocumentRef,
    RequestData,
};
use consultation_cell::services::store::{ConsultationStore, InMemoryConsultationStore};
use consultation_cell::ConsultationError;
use doctor_cell::models::{CreateDoctorRequest, Doctor, DoctorError};
use doctor_cell::services::registry::{DoctorRegistry, InMemoryDoctorRegistry};
use notification_cell::models::{NotificationError, StatusUpdate};
use notification_cell::services::mailer::Notifier;
use shared_models::patient::Patient;

pub fn mock_config(url: &str) -> shared_config::AppConfig {
    shared_config::AppConfig {
        supabase_url: url.to_string(),
        supabase_anon_key: "test-anon-key".to_string(),
        mail_api_url: String::new(),
        mail_api_key: String::new(),
        mail_from_address: "noreply@test".to_string(),
        documents_dir: "generated_documents".to_string(),
    }
}

pub fn test_doctor(name: &str, workload: i32) -> Doctor {
    let now = Utc::now();
    Doctor {
        id: Uuid::new_v4(),
        user_id: None,
        full_name: name.to_string(),
        email: format!("{}@example.com", name.to_lowercase().replace(' ', ".")),
        license_number: format!("MED-{}", Uuid::new_v4()),
        specialty: "General Practice".to_string(),
        is_active: true,
        workload_count: workload,
        created_at: now,
        updated_at: now,
    }
}

pub fn test_patient(id: &str) -> Patient {
    Patient {
        id: id.to_string(),
        email: Some(format!("{}@example.com", id)),
        first_name: Some("Alex".to_string()),
        last_name: Some("Patient".to_string()),
        date_of_birth: Some("1990-01-15".to_string()),
        created_at: Some(Utc::now()),
    }
}

pub fn prescription_request() -> RequestData {
    RequestData::Prescription {
        medication: "Amoxicillin".to_string(),
        dosage: "500mg three times daily".to_string(),
        quantity: None,
        reason: "Bacterial infection".to_string(),
        previous_doctor: None,
    }
}

pub fn certificate_request(date_from: &str, date_to: &str) -> RequestData {
    RequestData::MedicalCertificate {
        certificate_type: CertificateType::SickLeave,
        date_from: date_from.to_string(),
        date_to: date_to.to_string(),
        symptoms: "Influenza".to_string(),
    }
}

/// Build a consultation record directly, bypassing intake and assignment.
pub fn consultation_with(
    patient_id: &str,
    doctor_id: Option<Uuid>,
    status: ConsultationStatus,
    request_data: RequestData,
) -> Consultation {
    let now = Utc::now();
    Consultation {
        id: Uuid::new_v4(),
        patient_id: patient_id.to_string(),
        doctor_id,
        service_type: request_data.service_type(),
        status,
        request_data,
        doctor_notes: None,
        document_path: None,
        document_html: None,
        created_at: now,
        updated_at: now,
        completed_at: None,
    }
}

pub async fn workload_of(registry: &InMemoryDoctorRegistry, doctor_id: Uuid) -> i32 {
    registry
        .get(doctor_id)
        .await
        .expect("get doctor")
        .expect("doctor exists")
        .workload_count
}

pub async fn stored(store: &InMemoryConsultationStore, id: Uuid) -> Consultation {
    store
        .get(id)
        .await
        .expect("get consultation")
        .expect("consultation exists")
}

/// Delegates reads to an in-memory store but fails every write that would
/// change assignment or status.
pub struct FailingWriteStore {
    pub inner: Arc<InMemoryConsultationStore>,
}

impl FailingWriteStore {
    fn offline<T>() -> Result<T, ConsultationError> {
        Err(ConsultationError::Storage("storage offline".to_string()))
    }
}

#[async_trait]
impl ConsultationStore for FailingWriteStore {
    async fn create(
        &self,
        patient_id: &str,
        request_data: RequestData,
    ) -> Result<Consultation, ConsultationError> {
        self.inner.create(patient_id, request_data).await
    }

    async fn get(&self, id: Uuid) -> Result<Option<Consultation>, ConsultationError> {
        self.inner.get(id).await
    }

    async fn list_pending(&self) -> Result<Vec<Consultation>, ConsultationError> {
        self.inner.list_pending().await
    }

    async fn list_by_patient(
        &self,
        patient_id: &str,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        self.inner.list_by_patient(patient_id).await
    }

    async fn list_by_doctor(
        &self,
        doctor_id: Uuid,
    ) -> Result<Vec<Consultation>, ConsultationError> {
        self.inner.list_by_doctor(doctor_id).await
    }

    async fn set_doctor(
        &self,
        _id: Uuid,
        _doctor_id: Uuid,
    ) -> Result<Consultation, ConsultationError> {
        Self::offline()
    }

    async fn update_status(
        &self,
        _id: Uuid,
        _status: ConsultationStatus,
        _notes: Option<String>,
    ) -> Result<Consultation, ConsultationError> {
        Self::offline()
    }

    async fn complete(
        &self,
        _id: Uuid,
        _notes: Option<String>,
        _document: Option<DocumentRef>,
    ) -> Result<Consultation, ConsultationError> {
        Self::offline()
    }

    async fn stats(&self) -> Result<ConsultationStats, ConsultationError> {
        self.inner.stats().await
    }
}

/// Delegates to an in-memory registry but fails every workload adjustment.
pub struct UnreliableRegistry {
    pub inner: Arc<InMemoryDoctorRegistry>,
}

#[async_trait]
impl DoctorRegistry for UnreliableRegistry {
    async fn create(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        self.inner.create(request).await
    }

    async fn get(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DoctorError> {
        self.inner.get(doctor_id).await
    }

    async fn list_all(&self) -> Result<Vec<Doctor>, DoctorError> {
        self.inner.list_all().await
    }

    async fn list_active(&self) -> Result<Vec<Doctor>, DoctorError> {
        self.inner.list_active().await
    }

    async fn set_active(&self, doctor_id: Uuid, active: bool) -> Result<Doctor, DoctorError> {
        self.inner.set_active(doctor_id, active).await
    }

    async fn adjust_workload(&self, _doctor_id: Uuid, _delta: i32) -> Result<i32, DoctorError> {
        Err(DoctorError::Storage("registry offline".to_string()))
    }
}

/// Captures sent updates, or fails every send when `fail` is set.
#[derive(Default)]
pub struct RecordingNotifier {
    pub fail: bool,
    pub sent: Mutex<Vec<StatusUpdate>>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self {
            fail: true,
            sent: Mutex::new(Vec::new()),
        })
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_status_update(&self, update: &StatusUpdate) -> Result<(), NotificationError> {
        if self.fail {
            return Err(NotificationError::Delivery("relay down".to_string()));
        }
        self.sent.lock().await.push(update.clone());
        Ok(())
    }
}
