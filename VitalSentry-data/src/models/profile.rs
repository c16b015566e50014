use serde::{Deserialize, Serialize};

/// Storage model for a patient profile.
///
/// Owned by the profile store; the ingestion pipeline only reads it.
/// Every active device maps to exactly one profile. Threshold fields are
/// per-patient overrides; `None` means the global default applies.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientProfile {
    /// Unique patient identifier
    pub patient_id: String,

    /// Device registered to this patient
    pub device_id: String,

    /// Patient display name
    pub name: String,

    /// Age in years
    pub age: u32,

    /// Gender as free-form text
    pub gender: String,

    /// Diabetes condition flag
    pub has_diabetes: bool,

    /// Hypertension condition flag
    pub has_hypertension: bool,

    /// Heart condition flag
    pub has_heart_condition: bool,

    /// Baseline resting heart rate, if recorded
    pub baseline_heart_rate: Option<f64>,

    /// Baseline SpO2, if recorded
    pub baseline_spo2: Option<f64>,

    /// Heart rate high-alert override (bpm)
    pub max_heart_rate: Option<f64>,

    /// Heart rate low-alert override (bpm)
    pub min_heart_rate: Option<f64>,

    /// SpO2 low-alert override (%)
    pub min_spo2: Option<f64>,

    /// Systolic blood pressure high-alert override (mmHg)
    pub max_systolic: Option<f64>,

    /// Blood glucose high-alert override (mg/dL)
    pub max_glucose: Option<f64>,
}
