use crate::entities::vitals::{AlertEvaluation, DeviceReading, EstimationResult, PatientProfile};

/// Conversion functions between domain entities and data models
/// These functions follow the pattern convert_to_[target_layer]_[model_name]
/// as specified in the architectural rules

/// Convert from data model to domain entity for a patient profile
pub fn convert_to_domain_profile(
    data_profile: vital_sentry_data::models::profile::PatientProfile,
) -> PatientProfile {
    PatientProfile {
        patient_id: data_profile.patient_id,
        device_id: data_profile.device_id,
        name: data_profile.name,
        age: data_profile.age,
        gender: data_profile.gender,
        has_diabetes: data_profile.has_diabetes,
        has_hypertension: data_profile.has_hypertension,
        has_heart_condition: data_profile.has_heart_condition,
        baseline_heart_rate: data_profile.baseline_heart_rate,
        baseline_spo2: data_profile.baseline_spo2,
        max_heart_rate: data_profile.max_heart_rate,
        min_heart_rate: data_profile.min_heart_rate,
        min_spo2: data_profile.min_spo2,
        max_systolic: data_profile.max_systolic,
        max_glucose: data_profile.max_glucose,
    }
}

/// Build the data-layer vital record for one enriched reading.
///
/// Field-by-field assembly at this boundary is deliberate: the data model
/// maps to named table columns, so every value is bound to its field
/// explicitly here and to its column explicitly in the storage layer.
pub fn convert_to_data_vital_record(
    reading: &DeviceReading,
    profile: &PatientProfile,
    estimate: &EstimationResult,
    alert_triggered: bool,
) -> vital_sentry_data::models::vitals::NewVitalRecord {
    vital_sentry_data::models::vitals::NewVitalRecord {
        patient_id: profile.patient_id.clone(),
        device_id: reading.device_id.clone(),
        timestamp: reading.timestamp.clone(),
        heart_rate: reading.heart_rate,
        spo2: reading.spo2,
        temperature: reading.temperature,
        ppg: reading.ppg,
        estimated_systolic: estimate.systolic,
        estimated_diastolic: estimate.diastolic,
        estimated_glucose: estimate.glucose,
        confidence: estimate.confidence,
        reasoning: estimate.reasoning.clone(),
        alert_triggered,
    }
}

/// Build the data-layer alert record for a triggered evaluation
pub fn convert_to_data_alert_record(
    reading: &DeviceReading,
    profile: &PatientProfile,
    estimate: &EstimationResult,
    evaluation: &AlertEvaluation,
) -> vital_sentry_data::models::vitals::NewAlertRecord {
    vital_sentry_data::models::vitals::NewAlertRecord {
        patient_id: profile.patient_id.clone(),
        device_id: reading.device_id.clone(),
        timestamp: reading.timestamp.clone(),
        heart_rate: reading.heart_rate,
        spo2: reading.spo2,
        temperature: reading.temperature,
        estimated_systolic: estimate.systolic,
        estimated_glucose: estimate.glucose,
        message: evaluation.message(),
        severity: evaluation.severity.as_str().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::vitals::AlertSeverity;

    fn sample_reading() -> DeviceReading {
        DeviceReading {
            device_id: "device-1".to_string(),
            timestamp: "2026-01-01T08:00:00Z".to_string(),
            heart_rate: 130.0,
            spo2: 98.0,
            temperature: 37.0,
            ppg: 0.42,
        }
    }

    fn sample_profile() -> PatientProfile {
        PatientProfile {
            patient_id: "patient-1".to_string(),
            device_id: "device-1".to_string(),
            name: "Ada Example".to_string(),
            age: 54,
            gender: "female".to_string(),
            has_diabetes: false,
            has_hypertension: false,
            has_heart_condition: false,
            baseline_heart_rate: None,
            baseline_spo2: None,
            max_heart_rate: None,
            min_heart_rate: None,
            min_spo2: None,
            max_systolic: None,
            max_glucose: None,
        }
    }

    fn sample_estimate() -> EstimationResult {
        EstimationResult {
            systolic: 122.0,
            diastolic: 78.0,
            glucose: 95.0,
            confidence: 0.85,
            reasoning: "model estimate".to_string(),
        }
    }

    #[test]
    fn test_convert_to_data_vital_record() {
        let record = convert_to_data_vital_record(
            &sample_reading(),
            &sample_profile(),
            &sample_estimate(),
            true,
        );

        assert_eq!(record.patient_id, "patient-1");
        assert_eq!(record.device_id, "device-1");
        assert_eq!(record.heart_rate, 130.0);
        assert_eq!(record.estimated_systolic, 122.0);
        assert_eq!(record.confidence, 0.85);
        assert!(record.alert_triggered);
    }

    #[test]
    fn test_convert_to_data_alert_record() {
        let evaluation = AlertEvaluation {
            triggered: true,
            severity: AlertSeverity::Critical,
            reasons: vec!["High heart rate: 130 bpm".to_string()],
        };

        let record = convert_to_data_alert_record(
            &sample_reading(),
            &sample_profile(),
            &sample_estimate(),
            &evaluation,
        );

        assert_eq!(record.patient_id, "patient-1");
        assert_eq!(record.severity, "Critical");
        assert_eq!(record.message, "High heart rate: 130 bpm");
        assert_eq!(record.estimated_glucose, 95.0);
    }

    #[test]
    fn test_convert_to_domain_profile_preserves_overrides() {
        let data_profile = vital_sentry_data::models::profile::PatientProfile {
            patient_id: "patient-1".to_string(),
            device_id: "device-1".to_string(),
            name: "Ada Example".to_string(),
            age: 54,
            gender: "female".to_string(),
            has_diabetes: true,
            has_hypertension: false,
            has_heart_condition: false,
            baseline_heart_rate: Some(68.0),
            baseline_spo2: None,
            max_heart_rate: Some(110.0),
            min_heart_rate: None,
            min_spo2: Some(94.0),
            max_systolic: None,
            max_glucose: None,
        };

        let profile = convert_to_domain_profile(data_profile);
        assert_eq!(profile.max_heart_rate, Some(110.0));
        assert_eq!(profile.min_spo2, Some(94.0));
        assert!(profile.has_diabetes);
    }
}
