// VitalSentry Domain
// This crate contains the decision logic for the ingestion pipeline:
// device authentication, profile resolution, estimation with fallback,
// alert evaluation, persistence sequencing and notification dispatch.

// Services that implement business logic
pub mod services;

// Domain entities
pub mod entities;

// Health checks and system status
pub mod health;

// Re-export the database module from the data layer for convenience
pub use vital_sentry_data::database;

// Testing utilities - available to unit tests and with the mock feature
#[cfg(any(test, feature = "mock"))]
pub mod testing;
