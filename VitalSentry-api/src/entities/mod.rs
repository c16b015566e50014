// API entities and value objects
pub mod vitals;
pub mod common;

// Re-export common types for easier imports
pub use vitals::{DeviceReadingPayload, IngestResponse, IngestVitalsRequest};
