use chrono::DateTime;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};
use utoipa::ToSchema;

use vital_sentry_domain::entities::vitals::DeviceReading;

/// One sensor sample as submitted by a device
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeviceReadingPayload {
    /// Device that produced the sample
    #[validate(length(min = 1, message = "device_id must not be empty"))]
    pub device_id: String,

    /// When the sample was taken (ISO 8601)
    #[validate(custom = "validate_timestamp")]
    pub timestamp: String,

    /// Heart rate in beats per minute
    #[validate(range(min = 20.0, max = 260.0, message = "Heart rate must be between 20 and 260"))]
    pub heart_rate: f64,

    /// Blood oxygen saturation in percent
    #[validate(range(min = 0.0, max = 100.0, message = "SpO2 must be between 0 and 100"))]
    pub spo2: f64,

    /// Body temperature in degrees Celsius
    #[validate(range(min = 25.0, max = 45.0, message = "Temperature must be between 25 and 45"))]
    pub temperature: f64,

    /// Raw photoplethysmographic signal magnitude
    pub ppg: f64,
}

impl DeviceReadingPayload {
    /// Convert the payload into the domain reading
    pub fn into_reading(self) -> DeviceReading {
        DeviceReading {
            device_id: self.device_id,
            timestamp: self.timestamp,
            heart_rate: self.heart_rate,
            spo2: self.spo2,
            temperature: self.temperature,
            ppg: self.ppg,
        }
    }
}

/// Request payload for ingesting a batch of device readings.
/// Emptiness is rejected by the ingestion pipeline itself.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct IngestVitalsRequest {
    /// Ordered, non-empty list of readings
    #[validate]
    pub readings: Vec<DeviceReadingPayload>,

    /// Originating interactive session to echo full reports to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// Acknowledgment returned for a processed batch.
///
/// Per-reading skips are surfaced through logging, not in this shape.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct IngestResponse {
    /// Overall outcome ("success")
    pub status: String,

    /// Human-readable acknowledgment
    pub message: String,
}

/// Validate that a timestamp parses as RFC 3339
fn validate_timestamp(value: &str) -> Result<(), ValidationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|_| ())
        .map_err(|_| ValidationError::new("invalid_timestamp"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> DeviceReadingPayload {
        DeviceReadingPayload {
            device_id: "wearable-007".to_string(),
            timestamp: "2026-01-01T08:00:00Z".to_string(),
            heart_rate: 72.0,
            spo2: 98.0,
            temperature: 36.8,
            ppg: 0.42,
        }
    }

    #[test]
    fn test_valid_payload_passes_validation() {
        assert!(valid_payload().validate().is_ok());
    }

    #[test]
    fn test_out_of_range_heart_rate_fails_validation() {
        let mut payload = valid_payload();
        payload.heart_rate = 400.0;
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_malformed_timestamp_fails_validation() {
        let mut payload = valid_payload();
        payload.timestamp = "yesterday at noon".to_string();
        assert!(payload.validate().is_err());
    }

    #[test]
    fn test_nested_reading_validation() {
        let mut bad = valid_payload();
        bad.spo2 = 150.0;
        let request = IngestVitalsRequest {
            readings: vec![bad],
            session_id: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_into_reading_preserves_fields() {
        let reading = valid_payload().into_reading();
        assert_eq!(reading.device_id, "wearable-007");
        assert_eq!(reading.heart_rate, 72.0);
        assert_eq!(reading.ppg, 0.42);
    }
}
