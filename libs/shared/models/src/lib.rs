pub mod error;
pub mod patient;
