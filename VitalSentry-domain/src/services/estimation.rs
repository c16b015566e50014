//! Blood pressure and glucose estimation
//!
//! The primary path calls an external AI estimation service over HTTP.
//! Every failure of that call degrades to a deterministic rule-based
//! estimate with a fixed low confidence, so estimation as a whole never
//! fails and the pipeline never stalls on estimator unavailability.

use std::env;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::entities::vitals::EstimationResult;

/// Confidence assigned to every rule-based fallback estimate
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Reasoning string attached to every rule-based fallback estimate
pub const FALLBACK_REASONING: &str = "rule-based fallback";

/// Estimator call errors
#[derive(Debug, Error)]
pub enum EstimatorError {
    /// The call exceeded its deadline
    #[error("Estimation service timed out")]
    Timeout,

    /// Transport-level failure
    #[error("Estimation service request failed: {0}")]
    Http(String),

    /// The service answered with a non-success status
    #[error("Estimation service error: {0}")]
    Service(String),

    /// The response body could not be interpreted
    #[error("Malformed estimation response: {0}")]
    MalformedResponse(String),
}

/// Inputs for one estimation call
#[derive(Debug, Clone, Serialize)]
pub struct EstimationRequest {
    /// Patient age in years
    pub age: u32,

    /// Patient gender
    pub gender: String,

    /// Textual summary of the patient's condition flags
    pub conditions: String,

    /// Current heart rate in bpm
    pub heart_rate: f64,

    /// Current SpO2 in percent
    pub spo2: f64,

    /// Current body temperature in degrees Celsius
    pub temperature: f64,

    /// Raw photoplethysmographic signal magnitude
    pub ppg: f64,

    /// Short summary of the patient's recent readings
    pub history_summary: String,
}

/// Trait for vitals estimators
#[async_trait]
pub trait VitalsEstimatorTrait {
    /// Estimate blood pressure and glucose for the given inputs
    async fn estimate(&self, request: &EstimationRequest) -> Result<EstimationResult, EstimatorError>;
}

/// Configuration for the external AI estimator
#[derive(Debug, Clone)]
pub struct EstimatorConfig {
    /// Endpoint to POST estimation requests to
    pub url: String,

    /// Optional bearer token for the service
    pub api_key: Option<String>,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl EstimatorConfig {
    /// Read the estimator configuration from the environment.
    /// Returns `None` when no estimator endpoint is configured.
    pub fn from_env() -> Option<Self> {
        let url = env::var("AI_ESTIMATOR_URL").ok()?;

        let timeout_seconds = env::var("AI_ESTIMATOR_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        Some(Self {
            url,
            api_key: env::var("AI_ESTIMATOR_API_KEY").ok(),
            timeout_seconds,
        })
    }
}

/// Response body expected from the estimation service
#[derive(Debug, Deserialize)]
struct AiEstimateResponse {
    systolic: f64,
    diastolic: f64,
    glucose: f64,
    confidence: f64,
    reasoning: String,
}

/// HTTP client for the external AI estimation service
pub struct AiVitalsEstimator {
    client: reqwest::Client,
    config: EstimatorConfig,
}

impl AiVitalsEstimator {
    /// Create a client with the request timeout baked in
    pub fn new(config: EstimatorConfig) -> Result<Self, EstimatorError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| EstimatorError::Http(e.to_string()))?;

        Ok(Self { client, config })
    }
}

#[async_trait]
impl VitalsEstimatorTrait for AiVitalsEstimator {
    /// Estimate blood pressure and glucose via the external service
    async fn estimate(&self, request: &EstimationRequest) -> Result<EstimationResult, EstimatorError> {
        debug!("Calling AI estimation service at {}", self.config.url);

        let mut http_request = self.client.post(&self.config.url).json(request);
        if let Some(api_key) = &self.config.api_key {
            http_request = http_request.bearer_auth(api_key);
        }

        let response = http_request.send().await.map_err(|e| {
            if e.is_timeout() {
                EstimatorError::Timeout
            } else {
                EstimatorError::Http(e.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(EstimatorError::Service(format!(
                "status {}",
                response.status()
            )));
        }

        let body: AiEstimateResponse = response
            .json()
            .await
            .map_err(|e| EstimatorError::MalformedResponse(e.to_string()))?;

        if !(0.0..=1.0).contains(&body.confidence) {
            return Err(EstimatorError::MalformedResponse(format!(
                "confidence {} outside [0, 1]",
                body.confidence
            )));
        }

        Ok(EstimationResult {
            systolic: body.systolic,
            diastolic: body.diastolic,
            glucose: body.glucose,
            confidence: body.confidence,
            reasoning: body.reasoning,
        })
    }
}

/// Deterministic rule-based estimate used when the AI service is
/// unavailable. All values are rounded to the nearest integer; the
/// confidence is fixed low so confidence-gated alert rules cannot fire
/// from an unverified inference.
pub fn fallback_estimate(age: u32, heart_rate: f64) -> EstimationResult {
    let age = age as f64;

    EstimationResult {
        systolic: (110.0 * (age / 50.0) + 10.0 * (heart_rate / 80.0)).round(),
        diastolic: (70.0 * (age / 50.0) + 5.0 * (heart_rate / 80.0)).round(),
        glucose: (90.0 + (heart_rate - 75.0) * 2.0).round(),
        confidence: FALLBACK_CONFIDENCE,
        reasoning: FALLBACK_REASONING.to_string(),
    }
}

/// Estimation engine: AI estimator first, rule-based fallback on any failure
pub struct EstimationEngine<E: VitalsEstimatorTrait> {
    estimator: Option<E>,
}

impl<E: VitalsEstimatorTrait> EstimationEngine<E> {
    /// Create an engine with the given primary estimator
    pub fn new(estimator: E) -> Self {
        Self {
            estimator: Some(estimator),
        }
    }

    /// Create an engine that always uses the rule-based fallback
    pub fn without_estimator() -> Self {
        Self { estimator: None }
    }

    /// Produce an estimate for the request. Infallible: any estimator
    /// failure degrades to the deterministic fallback.
    pub async fn estimate(&self, request: &EstimationRequest) -> EstimationResult {
        match &self.estimator {
            Some(estimator) => match estimator.estimate(request).await {
                Ok(result) => result,
                Err(e) => {
                    warn!("AI estimator failed ({}), using rule-based fallback", e);
                    fallback_estimate(request.age, request.heart_rate)
                }
            },
            None => fallback_estimate(request.age, request.heart_rate),
        }
    }
}

/// Create the default estimation engine from the environment.
/// Without `AI_ESTIMATOR_URL` the engine runs fallback-only.
pub fn create_default_estimation_engine() -> EstimationEngine<AiVitalsEstimator> {
    match EstimatorConfig::from_env() {
        Some(config) => match AiVitalsEstimator::new(config) {
            Ok(estimator) => EstimationEngine::new(estimator),
            Err(e) => {
                warn!("Failed to build AI estimator client ({}), running fallback-only", e);
                EstimationEngine::without_estimator()
            }
        },
        None => {
            info!("AI_ESTIMATOR_URL not set, estimation runs fallback-only");
            EstimationEngine::without_estimator()
        }
    }
}
