pub mod error;
pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use error::ConsultationError;
pub use models::*;
pub use services::assignment::AssignmentEngine;
pub use services::intake::IntakeService;
pub use services::lifecycle::LifecycleController;
pub use services::store::{
    ConsultationStore, InMemoryConsultationStore, InMemoryPatientDirectory, PatientDirectory,
    SupabaseConsultationStore, SupabasePatientDirectory,
};
