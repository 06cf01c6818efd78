// libs/doctor-cell/src/services/registry.rs
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Method;
use serde_json::{json, Value};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_database::supabase::SupabaseClient;

use crate::models::{CreateDoctorRequest, Doctor, DoctorError};

/// Durable doctor accounts plus the running workload counter per doctor.
///
/// Workload mutation goes through `adjust_workload` only, which the store
/// applies as a single atomic update floored at zero. Nothing else may touch
/// the counter.
#[async_trait]
pub trait DoctorRegistry: Send + Sync {
    async fn create(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError>;

    async fn get(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DoctorError>;

    async fn list_all(&self) -> Result<Vec<Doctor>, DoctorError>;

    /// Active doctors in stable (creation) order. Assignment tie-breaking
    /// relies on this ordering being deterministic.
    async fn list_active(&self) -> Result<Vec<Doctor>, DoctorError>;

    /// Deactivation excludes a doctor from future assignment while keeping
    /// the record and its consultation history.
    async fn set_active(&self, doctor_id: Uuid, active: bool) -> Result<Doctor, DoctorError>;

    /// Atomically add `delta` to the doctor's workload counter, floored at
    /// zero, and return the delta that was actually applied. A floored
    /// decrement reports less than asked; callers compensating a failed
    /// operation must restore only what was applied.
    async fn adjust_workload(&self, doctor_id: Uuid, delta: i32) -> Result<i32, DoctorError>;
}

// ==============================================================================
// SUPABASE-BACKED REGISTRY
// ==============================================================================

pub struct SupabaseDoctorRegistry {
    supabase: SupabaseClient,
}

impl SupabaseDoctorRegistry {
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
}

#[async_trait]
impl DoctorRegistry for SupabaseDoctorRegistry {
    async fn create(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        debug!("Creating doctor record for {}", request.email);

        if request.full_name.trim().is_empty() || request.license_number.trim().is_empty() {
            return Err(DoctorError::ValidationError(
                "full_name and license_number are required".to_string(),
            ));
        }

        let existing_path = format!("/rest/v1/doctors?license_number=eq.{}", request.license_number);
        let existing: Vec<Value> = self
            .supabase
            .request(Method::GET, &existing_path, None)
            .await
            .map_err(|e| DoctorError::Storage(e.to_string()))?;

        if !existing.is_empty() {
            return Err(DoctorError::ValidationError(format!(
                "Doctor with license number {} already exists",
                request.license_number
            )));
        }

        let doctor_data = json!({
            "user_id": request.user_id,
            "full_name": request.full_name,
            "email": request.email,
            "license_number": request.license_number,
            "specialty": request.specialty,
            "is_active": true,
            "workload_count": 0,
            "created_at": Utc::now().to_rfc3339(),
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::POST,
                "/rest/v1/doctors",
                Some(doctor_data),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| DoctorError::Storage(e.to_string()))?;

        let row = result
            .into_iter()
            .next()
            .ok_or_else(|| DoctorError::Storage("insert returned no row".to_string()))?;

        serde_json::from_value(row).map_err(|e| DoctorError::Storage(e.to_string()))
    }

    async fn get(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DoctorError> {
        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, &path, None)
            .await
            .map_err(|e| DoctorError::Storage(e.to_string()))?;

        match result.into_iter().next() {
            Some(row) => {
                let doctor =
                    serde_json::from_value(row).map_err(|e| DoctorError::Storage(e.to_string()))?;
                Ok(Some(doctor))
            }
            None => Ok(None),
        }
    }

    async fn list_all(&self) -> Result<Vec<Doctor>, DoctorError> {
        let result: Vec<Value> = self
            .supabase
            .request(Method::GET, "/rest/v1/doctors?order=created_at.asc", None)
            .await
            .map_err(|e| DoctorError::Storage(e.to_string()))?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| DoctorError::Storage(e.to_string())))
            .collect()
    }

    async fn list_active(&self) -> Result<Vec<Doctor>, DoctorError> {
        let result: Vec<Value> = self
            .supabase
            .request(
                Method::GET,
                "/rest/v1/doctors?is_active=eq.true&order=created_at.asc",
                None,
            )
            .await
            .map_err(|e| DoctorError::Storage(e.to_string()))?;

        result
            .into_iter()
            .map(|row| serde_json::from_value(row).map_err(|e| DoctorError::Storage(e.to_string())))
            .collect()
    }

    async fn set_active(&self, doctor_id: Uuid, active: bool) -> Result<Doctor, DoctorError> {
        debug!("Setting doctor {} active={}", doctor_id, active);

        let path = format!("/rest/v1/doctors?id=eq.{}", doctor_id);
        let update = json!({
            "is_active": active,
            "updated_at": Utc::now().to_rfc3339()
        });

        let result: Vec<Value> = self
            .supabase
            .request_with_headers(
                Method::PATCH,
                &path,
                Some(update),
                Some(Self::representation_headers()),
            )
            .await
            .map_err(|e| DoctorError::Storage(e.to_string()))?;

        let row = result.into_iter().next().ok_or(DoctorError::NotFound)?;
        serde_json::from_value(row).map_err(|e| DoctorError::Storage(e.to_string()))
    }

    async fn adjust_workload(&self, doctor_id: Uuid, delta: i32) -> Result<i32, DoctorError> {
        // Single-statement update server side, returning new minus old so a
        // floored decrement is visible to the caller:
        //   update doctors
        //   set workload_count = greatest(0, workload_count + p_delta)
        //   where id = p_doctor_id
        let applied: i32 = self
            .supabase
            .rpc(
                "adjust_doctor_workload",
                json!({ "p_doctor_id": doctor_id, "p_delta": delta }),
            )
            .await
            .map_err(|e| DoctorError::Storage(e.to_string()))?;

        debug!(
            "Adjusted workload for {} by {} (applied {})",
            doctor_id, delta, applied
        );
        Ok(applied)
    }
}

// ==============================================================================
// IN-MEMORY REGISTRY (tests and local development)
// ==============================================================================

#[derive(Default)]
pub struct InMemoryDoctorRegistry {
    // Vec keeps creation order, which list_active must preserve.
    doctors: RwLock<Vec<Doctor>>,
}

impl InMemoryDoctorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a fully-formed record, bypassing request validation.
    pub async fn seed(&self, doctor: Doctor) {
        self.doctors.write().await.push(doctor);
    }
}

#[async_trait]
impl DoctorRegistry for InMemoryDoctorRegistry {
    async fn create(&self, request: CreateDoctorRequest) -> Result<Doctor, DoctorError> {
        if request.full_name.trim().is_empty() || request.license_number.trim().is_empty() {
            return Err(DoctorError::ValidationError(
                "full_name and license_number are required".to_string(),
            ));
        }

        let mut doctors = self.doctors.write().await;
        if doctors.iter().any(|d| d.license_number == request.license_number) {
            return Err(DoctorError::ValidationError(format!(
                "Doctor with license number {} already exists",
                request.license_number
            )));
        }

        let now = Utc::now();
        let doctor = Doctor {
            id: Uuid::new_v4(),
            user_id: request.user_id,
            full_name: request.full_name,
            email: request.email,
            license_number: request.license_number,
            specialty: request.specialty,
            is_active: true,
            workload_count: 0,
            created_at: now,
            updated_at: now,
        };
        doctors.push(doctor.clone());
        Ok(doctor)
    }

    async fn get(&self, doctor_id: Uuid) -> Result<Option<Doctor>, DoctorError> {
        let doctors = self.doctors.read().await;
        Ok(doctors.iter().find(|d| d.id == doctor_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Doctor>, DoctorError> {
        Ok(self.doctors.read().await.clone())
    }

    async fn list_active(&self) -> Result<Vec<Doctor>, DoctorError> {
        let doctors = self.doctors.read().await;
        Ok(doctors.iter().filter(|d| d.is_active).cloned().collect())
    }

    async fn set_active(&self, doctor_id: Uuid, active: bool) -> Result<Doctor, DoctorError> {
        let mut doctors = self.doctors.write().await;
        let doctor = doctors
            .iter_mut()
            .find(|d| d.id == doctor_id)
            .ok_or(DoctorError::NotFound)?;
        doctor.is_active = active;
        doctor.updated_at = Utc::now();
        Ok(doctor.clone())
    }

    async fn adjust_workload(&self, doctor_id: Uuid, delta: i32) -> Result<i32, DoctorError> {
        let mut doctors = self.doctors.write().await;
        let doctor = doctors
            .iter_mut()
            .find(|d| d.id == doctor_id)
            .ok_or(DoctorError::NotFound)?;

        let next = (doctor.workload_count + delta).max(0);
        let applied = next - doctor.workload_count;
        if applied != delta {
            warn!(
                "Workload for doctor {} floored at 0 (requested {}, applied {})",
                doctor_id, delta, applied
            );
        }
        doctor.workload_count = next;
        doctor.updated_at = Utc::now();
        Ok(applied)
    }
}
