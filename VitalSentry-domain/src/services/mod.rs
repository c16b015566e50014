// Domain services
// This module contains business logic implementations.

pub mod device_auth;
pub mod profiles;
pub mod estimation;
pub mod alerts;
pub mod notifications;
pub mod ingestion;

// Re-export service traits and factory functions
pub use device_auth::{DeviceAuthenticator, DeviceAuthConfig, DeviceAuthError, DeviceCredentials};
pub use estimation::{EstimationEngine, VitalsEstimatorTrait, fallback_estimate};
pub use alerts::evaluate_reading;
pub use ingestion::{IngestionServiceTrait, create_default_ingestion_service};
