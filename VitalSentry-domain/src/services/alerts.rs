//! Alert evaluation over raw vitals and gated estimates
//!
//! Every matching rule appends its message; severity is escalated to
//! Critical by any critical-tier match and stays High when only high-tier
//! rules matched. Estimate-derived rules require the estimation
//! confidence to clear a gate, so a low-confidence (fallback) estimate
//! can never escalate severity on its own.

use crate::entities::vitals::{AlertEvaluation, AlertSeverity, DeviceReading, EstimationResult, PatientProfile};

/// Global default thresholds, applied where the profile has no override.
/// Temperature has no per-patient override and always uses these.
pub const DEFAULT_MAX_TEMPERATURE: f64 = 38.0;
pub const DEFAULT_MIN_TEMPERATURE: f64 = 35.0;
pub const DEFAULT_MAX_HEART_RATE: f64 = 120.0;
pub const DEFAULT_MIN_HEART_RATE: f64 = 50.0;
pub const DEFAULT_MIN_SPO2: f64 = 92.0;
pub const DEFAULT_MAX_SYSTOLIC: f64 = 140.0;
pub const DEFAULT_MAX_GLUCOSE: f64 = 180.0;

/// Minimum estimation confidence for estimate-derived rules to fire
pub const ESTIMATE_CONFIDENCE_GATE: f64 = 0.5;

/// Evaluate one reading against the rule table.
///
/// All comparisons are strict. Matching is accumulation, not first-match:
/// every triggered rule contributes its reason, in table order.
pub fn evaluate_reading(
    reading: &DeviceReading,
    profile: &PatientProfile,
    estimate: &EstimationResult,
) -> AlertEvaluation {
    let mut reasons = Vec::new();
    let mut severity = AlertSeverity::High;

    if reading.temperature > DEFAULT_MAX_TEMPERATURE {
        reasons.push(format!("High temperature: {:.1}°C", reading.temperature));
    }
    if reading.temperature < DEFAULT_MIN_TEMPERATURE {
        reasons.push(format!("Low temperature: {:.1}°C", reading.temperature));
    }

    let max_heart_rate = profile.max_heart_rate.unwrap_or(DEFAULT_MAX_HEART_RATE);
    if reading.heart_rate > max_heart_rate {
        reasons.push(format!("High heart rate: {:.0} bpm", reading.heart_rate));
        severity = AlertSeverity::Critical;
    }

    let min_heart_rate = profile.min_heart_rate.unwrap_or(DEFAULT_MIN_HEART_RATE);
    if reading.heart_rate < min_heart_rate {
        reasons.push(format!("Low heart rate: {:.0} bpm", reading.heart_rate));
        severity = AlertSeverity::Critical;
    }

    let min_spo2 = profile.min_spo2.unwrap_or(DEFAULT_MIN_SPO2);
    if reading.spo2 < min_spo2 {
        reasons.push(format!("Low SpO2: {:.1}%", reading.spo2));
        severity = AlertSeverity::Critical;
    }

    if estimate.confidence > ESTIMATE_CONFIDENCE_GATE {
        let max_systolic = profile.max_systolic.unwrap_or(DEFAULT_MAX_SYSTOLIC);
        if estimate.systolic > max_systolic {
            reasons.push(format!(
                "High estimated blood pressure: {:.0} mmHg systolic",
                estimate.systolic
            ));
            severity = AlertSeverity::Critical;
        }

        let max_glucose = profile.max_glucose.unwrap_or(DEFAULT_MAX_GLUCOSE);
        if estimate.glucose > max_glucose {
            reasons.push(format!("High estimated glucose: {:.0} mg/dL", estimate.glucose));
            severity = AlertSeverity::Critical;
        }
    }

    AlertEvaluation {
        triggered: !reasons.is_empty(),
        severity,
        reasons,
    }
}
