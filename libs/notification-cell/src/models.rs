use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A consultation status change to be relayed to the patient.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub patient_email: Option<String>,
    pub patient_name: String,
    pub service_type: String,
    pub new_status: String,
    pub doctor_name: String,
}

#[derive(Error, Debug)]
pub enum NotificationError {
    #[error("Delivery failed: {0}")]
    Delivery(String),

    #[error("Recipient has no email address")]
    NoRecipient,
}
