use serde::{Deserialize, Serialize};

/// One timestamped sensor sample from a wearable device
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceReading {
    /// Device that produced the sample
    pub device_id: String,

    /// When the sample was taken (ISO 8601)
    pub timestamp: String,

    /// Heart rate in beats per minute
    pub heart_rate: f64,

    /// Blood oxygen saturation in percent
    pub spo2: f64,

    /// Body temperature in degrees Celsius
    pub temperature: f64,

    /// Raw photoplethysmographic signal magnitude
    pub ppg: f64,
}

/// Estimated vitals derived from a reading.
///
/// Produced fresh for every reading, folded into the persisted vital
/// record and never stored on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EstimationResult {
    /// Estimated systolic blood pressure in mmHg
    pub systolic: f64,

    /// Estimated diastolic blood pressure in mmHg
    pub diastolic: f64,

    /// Estimated blood glucose in mg/dL
    pub glucose: f64,

    /// Confidence score in [0, 1]
    pub confidence: f64,

    /// Human-readable reasoning behind the estimate
    pub reasoning: String,
}

/// Severity of a triggered alert
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum AlertSeverity {
    /// Serious but not immediately life-threatening
    High,

    /// Requires immediate clinical attention
    Critical,
}

impl AlertSeverity {
    /// Stable string form used at the storage boundary
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertSeverity::High => "High",
            AlertSeverity::Critical => "Critical",
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of evaluating one reading against the alert rule table
#[derive(Debug, Clone)]
pub struct AlertEvaluation {
    /// Whether any rule matched
    pub triggered: bool,

    /// Severity of the alert; Critical if any critical-tier rule matched
    pub severity: AlertSeverity,

    /// Messages of every rule that matched, in rule-table order
    pub reasons: Vec<String>,
}

impl AlertEvaluation {
    /// Compose the full alert message from all triggering reasons
    pub fn message(&self) -> String {
        self.reasons.join("; ")
    }
}

/// Patient profile as seen by the pipeline: demographics, condition flags
/// and per-patient alert threshold overrides
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

impl PatientProfile {
    /// Short textual summary of the patient's condition flags, used as
    /// context for the estimation service
    pub fn condition_summary(&self) -> String {
        let mut conditions = Vec::new();
        if self.has_diabetes {
            conditions.push("diabetes");
        }
        if self.has_hypertension {
            conditions.push("hypertension");
        }
        if self.has_heart_condition {
            conditions.push("heart condition");
        }

        if conditions.is_empty() {
            "no known conditions".to_string()
        } else {
            conditions.join(", ")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile_with_flags(diabetes: bool, hypertension: bool, heart: bool) -> PatientProfile {
        PatientProfile {
            patient_id: "patient-1".to_string(),
            device_id: "device-1".to_string(),
            name: "Ada Example".to_string(),
            age: 54,
            gender: "female".to_string(),
            has_diabetes: diabetes,
            has_hypertension: hypertension,
            has_heart_condition: heart,
            baseline_heart_rate: None,
            baseline_spo2: None,
            max_heart_rate: None,
            min_heart_rate: None,
            min_spo2: None,
            max_systolic: None,
            max_glucose: None,
        }
    }

    #[test]
    fn test_condition_summary_empty() {
        let profile = profile_with_flags(false, false, false);
        assert_eq!(profile.condition_summary(), "no known conditions");
    }

    #[test]
    fn test_condition_summary_multiple() {
        let profile = profile_with_flags(true, true, false);
        assert_eq!(profile.condition_summary(), "diabetes, hypertension");
    }

    #[test]
    fn test_severity_string_form() {
        assert_eq!(AlertSeverity::Critical.as_str(), "Critical");
        assert_eq!(AlertSeverity::High.to_string(), "High");
    }

    #[test]
    fn test_evaluation_message_joins_reasons() {
        let evaluation = AlertEvaluation {
            triggered: true,
            severity: AlertSeverity::Critical,
            reasons: vec![
                "High heart rate: 130 bpm".to_string(),
                "Low SpO2: 88.0%".to_string(),
            ],
        };
        assert_eq!(
            evaluation.message(),
            "High heart rate: 130 bpm; Low SpO2: 88.0%"
        );
    }
}
