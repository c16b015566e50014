use serde::{Deserialize, Serialize};

/// Storage model for an enriched health vital record.
///
/// One row per ingested device reading. Rows are append-only: there is no
/// update path once a record has been written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthVitalRecord {
    /// Unique identifier for the record
    pub id: String,

    /// Patient the reading belongs to
    pub patient_id: String,

    /// Device that produced the reading
    pub device_id: String,

    /// When the reading was taken (device time, ISO 8601)
    pub timestamp: String,

    /// Heart rate in beats per minute
    pub heart_rate: f64,

    /// Blood oxygen saturation in percent
    pub spo2: f64,

    /// Body temperature in degrees Celsius
    pub temperature: f64,

    /// Raw photoplethysmographic signal magnitude
    pub ppg: f64,

    /// Estimated systolic blood pressure in mmHg
    pub estimated_systolic: f64,

    /// Estimated diastolic blood pressure in mmHg
    pub estimated_diastolic: f64,

    /// Estimated blood glucose in mg/dL
    pub estimated_glucose: f64,

    /// Estimation confidence in [0, 1]
    pub confidence: f64,

    /// Human-readable estimation reasoning
    pub reasoning: String,

    /// Whether this reading triggered an alert
    pub alert_triggered: bool,

    /// When the record was written (server time, ISO 8601)
    pub created_at: String,
}

/// Input data for appending a new health vital record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVitalRecord {
    /// Patient the reading belongs to
    pub patient_id: String,

    /// Device that produced the reading
    pub device_id: String,

    /// When the reading was taken (device time, ISO 8601)
    pub timestamp: String,

    /// Heart rate in beats per minute
    pub heart_rate: f64,

    /// Blood oxygen saturation in percent
    pub spo2: f64,

    /// Body temperature in degrees Celsius
    pub temperature: f64,

    /// Raw photoplethysmographic signal magnitude
    pub ppg: f64,

    /// Estimated systolic blood pressure in mmHg
    pub estimated_systolic: f64,

    /// Estimated diastolic blood pressure in mmHg
    pub estimated_diastolic: f64,

    /// Estimated blood glucose in mg/dL
    pub estimated_glucose: f64,

    /// Estimation confidence in [0, 1]
    pub confidence: f64,

    /// Human-readable estimation reasoning
    pub reasoning: String,

    /// Whether this reading triggered an alert
    pub alert_triggered: bool,
}

/// Storage model for a triggered alert.
///
/// Created at most once per reading. The acknowledgment fields are mutated
/// exactly once by the acknowledgment workflow; alerts are never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRecord {
    /// Unique alert identifier
    pub id: String,

    /// Patient the alert concerns
    pub patient_id: String,

    /// Device that produced the triggering reading
    pub device_id: String,

    /// Timestamp of the triggering reading (ISO 8601)
    pub timestamp: String,

    /// Heart rate at the time of the alert
    pub heart_rate: f64,

    /// SpO2 at the time of the alert
    pub spo2: f64,

    /// Temperature at the time of the alert
    pub temperature: f64,

    /// Estimated systolic blood pressure at the time of the alert
    pub estimated_systolic: f64,

    /// Estimated glucose at the time of the alert
    pub estimated_glucose: f64,

    /// Composed human-readable alert message
    pub message: String,

    /// Alert severity ("Critical" or "High")
    pub severity: String,

    /// Whether the alert has been acknowledged
    pub acknowledged: bool,

    /// When the alert was acknowledged, if it has been
    pub acknowledged_at: Option<String>,

    /// When the alert was written (server time, ISO 8601)
    pub created_at: String,
}

/// Input data for appending a new alert record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAlertRecord {
    /// Patient the alert concerns
    pub patient_id: String,

    /// Device that produced the triggering reading
    pub device_id: String,

    /// Timestamp of the triggering reading (ISO 8601)
    pub timestamp: String,

    /// Heart rate at the time of the alert
    pub heart_rate: f64,

    /// SpO2 at the time of the alert
    pub spo2: f64,

    /// Temperature at the time of the alert
    pub temperature: f64,

    /// Estimated systolic blood pressure at the time of the alert
    pub estimated_systolic: f64,

    /// Estimated glucose at the time of the alert
    pub estimated_glucose: f64,

    /// Composed human-readable alert message
    pub message: String,

    /// Alert severity ("Critical" or "High")
    pub severity: String,
}
