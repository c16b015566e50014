//! Ingestion orchestration
//!
//! One batch flows through: authenticate once, then per reading resolve
//! the profile, estimate, evaluate, persist vital-then-alert, and notify.
//! A reading with no registered profile is skipped and the batch
//! continues; a per-reading persistence failure is logged with enough
//! detail for manual reconciliation and counted, without aborting the
//! remaining readings. The batch as a whole fails only on authentication
//! or configuration errors (before any reading is touched), an empty
//! batch, or at the end when any reading failed to persist.

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::entities::conversions;
use crate::entities::vitals::DeviceReading;
use crate::services::alerts::evaluate_reading;
use crate::services::device_auth::{DeviceAuthError, DeviceAuthenticator, DeviceCredentials};
use crate::services::estimation::{
    create_default_estimation_engine, AiVitalsEstimator, EstimationEngine, EstimationRequest,
    VitalsEstimatorTrait,
};
use crate::services::notifications::{
    create_default_notification_dispatcher, HttpNotificationChannel, NotificationChannelTrait,
    NotificationDispatcher,
};
use crate::services::profiles::{create_default_profile_service, ProfileService};
use vital_sentry_data::models::vitals::HealthVitalRecord;
use vital_sentry_data::repository::{
    PatientProfileRepository, PatientProfileRepositoryTrait, VitalsRepository, VitalsRepositoryTrait,
};

/// Number of recent readings summarized for the estimator
const RECENT_HISTORY_LIMIT: usize = 5;

/// Ingestion errors, mapped to HTTP statuses at the API boundary
#[derive(Debug, Error)]
pub enum IngestionError {
    /// Caller could not be authorized; the batch was not processed
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Server-side configuration is missing or invalid
    #[error("Server configuration error: {0}")]
    Configuration(String),

    /// The batch contained no readings
    #[error("Reading batch is empty")]
    EmptyBatch,

    /// One or more readings could not be persisted
    #[error("Failed to persist {failed} of {total} readings")]
    Persistence { failed: usize, total: usize },
}

/// Per-batch outcome counters. Logged, not returned to the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// Readings received in the batch
    pub received: usize,

    /// Readings fully processed and persisted
    pub processed: usize,

    /// Readings skipped for lack of a patient profile
    pub skipped: usize,

    /// Readings that failed to persist
    pub failed: usize,

    /// Alerts fired across the batch
    pub alerts_fired: usize,
}

/// Request-scoped context for one ingestion call
#[derive(Debug, Clone, Default)]
pub struct IngestContext {
    /// Credentials presented by the caller
    pub credentials: DeviceCredentials,

    /// Interactive session to echo full reports to, if any
    pub session_id: Option<String>,
}

/// Trait for the ingestion orchestrator, used for handler injection
#[async_trait]
pub trait IngestionServiceTrait {
    /// Process one batch of device readings
    async fn ingest_batch(
        &self,
        readings: Vec<DeviceReading>,
        context: IngestContext,
    ) -> Result<BatchSummary, IngestionError>;
}

/// Outcome of processing a single reading
enum ReadingOutcome {
    Processed { alert_fired: bool },
    Skipped,
    Failed,
}

/// Orchestrates the ingestion pipeline over injected collaborators
pub struct IngestionService<P, V, E, C>
where
    P: PatientProfileRepositoryTrait + Send + Sync,
    V: VitalsRepositoryTrait + Send + Sync,
    E: VitalsEstimatorTrait + Send + Sync,
    C: NotificationChannelTrait + Send + Sync,
{
    authenticator: DeviceAuthenticator,
    profiles: ProfileService<P>,
    vitals: V,
    engine: EstimationEngine<E>,
    dispatcher: NotificationDispatcher<C>,
}

impl<P, V, E, C> IngestionService<P, V, E, C>
where
    P: PatientProfileRepositoryTrait + Send + Sync,
    V: VitalsRepositoryTrait + Send + Sync,
    E: VitalsEstimatorTrait + Send + Sync,
    C: NotificationChannelTrait + Send + Sync,
{
    /// Create an ingestion service from its collaborators
    pub fn new(
        authenticator: DeviceAuthenticator,
        profiles: ProfileService<P>,
        vitals: V,
        engine: EstimationEngine<E>,
        dispatcher: NotificationDispatcher<C>,
    ) -> Self {
        Self {
            authenticator,
            profiles,
            vitals,
            engine,
            dispatcher,
        }
    }

    /// Run one reading through resolve → estimate → evaluate → persist → notify
    async fn process_reading(&self, reading: &DeviceReading, session_id: Option<&str>) -> ReadingOutcome {
        let profile = match self.profiles.resolve_by_device(&reading.device_id).await {
            Ok(Some(profile)) => profile,
            Ok(None) => {
                warn!(
                    "No patient profile registered for device {}, skipping reading",
                    reading.device_id
                );
                return ReadingOutcome::Skipped;
            }
            Err(e) => {
                error!("Profile lookup failed for device {}: {}", reading.device_id, e);
                return ReadingOutcome::Failed;
            }
        };

        // Recent history enriches the estimate but is never worth failing a
        // reading over
        let history_summary = match self
            .vitals
            .get_recent_for_patient(&profile.patient_id, RECENT_HISTORY_LIMIT)
            .await
        {
            Ok(records) => summarize_history(&records),
            Err(e) => {
                debug!("Could not load recent vitals for {}: {}", profile.patient_id, e);
                "history unavailable".to_string()
            }
        };

        let request = EstimationRequest {
            age: profile.age,
            gender: profile.gender.clone(),
            conditions: profile.condition_summary(),
            heart_rate: reading.heart_rate,
            spo2: reading.spo2,
            temperature: reading.temperature,
            ppg: reading.ppg,
            history_summary,
        };
        let estimate = self.engine.estimate(&request).await;

        let evaluation = evaluate_reading(reading, &profile, &estimate);

        // The vital record must be durably written before its alert record
        let vital_record =
            conversions::convert_to_data_vital_record(reading, &profile, &estimate, evaluation.triggered);
        let vital = match self.vitals.append_vital(vital_record).await {
            Ok(vital) => vital,
            Err(e) => {
                error!(
                    "Failed to persist vital record (device={}, timestamp={}): {}",
                    reading.device_id, reading.timestamp, e
                );
                return ReadingOutcome::Failed;
            }
        };

        if evaluation.triggered {
            let alert_record =
                conversions::convert_to_data_alert_record(reading, &profile, &estimate, &evaluation);
            match self.vitals.append_alert(alert_record).await {
                Ok(alert) => {
                    info!(
                        "Alert {} ({}) recorded for patient {}",
                        alert.id, alert.severity, profile.patient_id
                    );
                }
                Err(e) => {
                    // The vital row now exists without its alert row; the two
                    // writes are not transactional, so log everything needed
                    // to reconcile by hand
                    error!(
                        "Failed to persist alert record after vital {} (device={}, timestamp={}, \
                         severity={}): {}; manual reconciliation required",
                        vital.id, reading.device_id, reading.timestamp, evaluation.severity, e
                    );
                    return ReadingOutcome::Failed;
                }
            }

            self.dispatcher
                .dispatch_alert(&profile.name, evaluation.severity, &evaluation.message())
                .await;
        }

        if let Some(session_id) = session_id {
            self.dispatcher
                .dispatch_report(session_id, &profile.name, reading, &estimate, evaluation.triggered)
                .await;
        }

        ReadingOutcome::Processed {
            alert_fired: evaluation.triggered,
        }
    }
}

#[async_trait]
impl<P, V, E, C> IngestionServiceTrait for IngestionService<P, V, E, C>
where
    P: PatientProfileRepositoryTrait + Send + Sync,
    V: VitalsRepositoryTrait + Send + Sync,
    E: VitalsEstimatorTrait + Send + Sync,
    C: NotificationChannelTrait + Send + Sync,
{
    /// Process one batch of device readings
    async fn ingest_batch(
        &self,
        readings: Vec<DeviceReading>,
        context: IngestContext,
    ) -> Result<BatchSummary, IngestionError> {
        self.authenticator
            .authorize(&context.credentials)
            .map_err(|e| match e {
                DeviceAuthError::MissingConfig => IngestionError::Configuration(e.to_string()),
                other => IngestionError::Unauthorized(other.to_string()),
            })?;

        if readings.is_empty() {
            return Err(IngestionError::EmptyBatch);
        }

        let mut summary = BatchSummary {
            received: readings.len(),
            ..BatchSummary::default()
        };

        for reading in &readings {
            match self.process_reading(reading, context.session_id.as_deref()).await {
                ReadingOutcome::Processed { alert_fired } => {
                    summary.processed += 1;
                    if alert_fired {
                        summary.alerts_fired += 1;
                    }
                }
                ReadingOutcome::Skipped => summary.skipped += 1,
                ReadingOutcome::Failed => summary.failed += 1,
            }
        }

        info!(
            "Batch complete: received={} processed={} skipped={} failed={} alerts_fired={}",
            summary.received, summary.processed, summary.skipped, summary.failed, summary.alerts_fired
        );

        if summary.failed > 0 {
            return Err(IngestionError::Persistence {
                failed: summary.failed,
                total: summary.received,
            });
        }

        Ok(summary)
    }
}

/// Summarize recent readings for the estimator context
fn summarize_history(records: &[HealthVitalRecord]) -> String {
    if records.is_empty() {
        return "no prior readings".to_string();
    }

    let count = records.len();
    let avg_heart_rate = records.iter().map(|r| r.heart_rate).sum::<f64>() / count as f64;
    let avg_spo2 = records.iter().map(|r| r.spo2).sum::<f64>() / count as f64;

    format!(
        "{} prior readings, avg HR {:.0} bpm, avg SpO2 {:.1}%",
        count, avg_heart_rate, avg_spo2
    )
}

/// Create the default ingestion service wired from the environment
pub fn create_default_ingestion_service(
) -> IngestionService<PatientProfileRepository, VitalsRepository, AiVitalsEstimator, HttpNotificationChannel> {
    IngestionService::new(
        DeviceAuthenticator::from_env(),
        create_default_profile_service(),
        VitalsRepository::new(),
        create_default_estimation_engine(),
        create_default_notification_dispatcher(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::vitals::EstimationResult;
    use crate::services::device_auth::DeviceAuthConfig;
    use crate::services::estimation::{FALLBACK_CONFIDENCE, FALLBACK_REASONING};
    use crate::testing::{
        FailingEstimator, MockNotificationChannel, MockPatientProfileRepository, MockVitalsRepository,
        ScriptedEstimator,
    };

    fn authenticator() -> DeviceAuthenticator {
        DeviceAuthenticator::new(DeviceAuthConfig {
            expected_device_id: Some("wearable-007".to_string()),
            expected_api_key: Some("device-secret".to_string()),
            internal_secret: Some("internal-secret".to_string()),
        })
    }

    fn valid_credentials() -> DeviceCredentials {
        DeviceCredentials {
            device_id: Some("wearable-007".to_string()),
            api_key: Some("device-secret".to_string()),
            internal_secret: None,
        }
    }

    fn data_profile() -> vital_sentry_data::models::profile::PatientProfile {
        vital_sentry_data::models::profile::PatientProfile {
            patient_id: "patient-1".to_string(),
            device_id: "wearable-007".to_string(),
            name: "Ada Example".to_string(),
            age: 54,
            gender: "female".to_string(),
            has_diabetes: false,
            has_hypertension: false,
            has_heart_condition: false,
            baseline_heart_rate: Some(68.0),
            baseline_spo2: Some(97.0),
            max_heart_rate: None,
            min_heart_rate: None,
            min_spo2: None,
            max_systolic: None,
            max_glucose: None,
        }
    }

    fn reading(heart_rate: f64, spo2: f64, temperature: f64) -> DeviceReading {
        DeviceReading {
            device_id: "wearable-007".to_string(),
            timestamp: "2026-01-01T08:00:00Z".to_string(),
            heart_rate,
            spo2,
            temperature,
            ppg: 0.42,
        }
    }

    fn normal_estimate() -> EstimationResult {
        EstimationResult {
            systolic: 118.0,
            diastolic: 76.0,
            glucose: 95.0,
            confidence: 0.85,
            reasoning: "model estimate".to_string(),
        }
    }

    struct TestHarness {
        vitals: MockVitalsRepository,
        channel: MockNotificationChannel,
    }

    fn service_with(
        vitals: MockVitalsRepository,
        channel: MockNotificationChannel,
        estimator: ScriptedEstimator,
    ) -> (
        IngestionService<MockPatientProfileRepository, MockVitalsRepository, ScriptedEstimator, MockNotificationChannel>,
        TestHarness,
    ) {
        let service = IngestionService::new(
            authenticator(),
            ProfileService::new(MockPatientProfileRepository::with_profiles(vec![data_profile()])),
            vitals.clone(),
            EstimationEngine::new(estimator),
            NotificationDispatcher::new(channel.clone(), "ops-room".to_string()),
        );
        (service, TestHarness { vitals, channel })
    }

    #[tokio::test]
    async fn test_high_heart_rate_fires_critical_alert() {
        // Scenario A: HR 130 with default thresholds
        let (service, harness) = service_with(
            MockVitalsRepository::new(),
            MockNotificationChannel::new(),
            ScriptedEstimator::returning(normal_estimate()),
        );

        let summary = service
            .ingest_batch(
                vec![reading(130.0, 98.0, 37.0)],
                IngestContext {
                    credentials: valid_credentials(),
                    session_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.alerts_fired, 1);

        let vitals = harness.vitals.stored_vitals();
        assert_eq!(vitals.len(), 1);
        assert!(vitals[0].alert_triggered);

        let alerts = harness.vitals.stored_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].severity, "Critical");
        assert!(alerts[0].message.contains("130"));

        let sent = harness.channel.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ops-room");
        assert!(sent[0].1.contains("Ada Example"));
    }

    #[tokio::test]
    async fn test_estimator_failure_degrades_to_fallback_without_alert() {
        // Scenario B: normal vitals, estimator unavailable
        let vitals = MockVitalsRepository::new();
        let channel = MockNotificationChannel::new();
        let service = IngestionService::new(
            authenticator(),
            ProfileService::new(MockPatientProfileRepository::with_profiles(vec![data_profile()])),
            vitals.clone(),
            EstimationEngine::new(FailingEstimator),
            NotificationDispatcher::new(channel.clone(), "ops-room".to_string()),
        );

        let summary = service
            .ingest_batch(
                vec![reading(70.0, 98.0, 36.8)],
                IngestContext {
                    credentials: valid_credentials(),
                    session_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.alerts_fired, 0);

        let stored = vitals.stored_vitals();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].confidence, FALLBACK_CONFIDENCE);
        assert_eq!(stored[0].reasoning, FALLBACK_REASONING);
        assert!(!stored[0].alert_triggered);
        assert!(vitals.stored_alerts().is_empty());
        assert!(channel.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_device_is_skipped_and_batch_succeeds() {
        // Scenario C: no profile for the device
        let vitals = MockVitalsRepository::new();
        let service = IngestionService::new(
            authenticator(),
            ProfileService::new(MockPatientProfileRepository::new()),
            vitals.clone(),
            EstimationEngine::new(ScriptedEstimator::returning(normal_estimate())),
            NotificationDispatcher::new(MockNotificationChannel::new(), "ops-room".to_string()),
        );

        let summary = service
            .ingest_batch(
                vec![reading(70.0, 98.0, 36.8)],
                IngestContext {
                    credentials: valid_credentials(),
                    session_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.processed, 0);
        assert_eq!(summary.skipped, 1);
        assert!(vitals.stored_vitals().is_empty());
        assert!(vitals.stored_alerts().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_credentials_reject_batch_before_processing() {
        // Scenario D: bad API key
        let (service, harness) = service_with(
            MockVitalsRepository::new(),
            MockNotificationChannel::new(),
            ScriptedEstimator::returning(normal_estimate()),
        );

        let result = service
            .ingest_batch(
                vec![reading(130.0, 98.0, 37.0)],
                IngestContext {
                    credentials: DeviceCredentials {
                        device_id: Some("wearable-007".to_string()),
                        api_key: Some("wrong-secret".to_string()),
                        internal_secret: None,
                    },
                    session_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(IngestionError::Unauthorized(_))));
        assert!(harness.vitals.stored_vitals().is_empty());
        assert!(harness.vitals.stored_alerts().is_empty());
    }

    #[tokio::test]
    async fn test_missing_server_config_is_a_configuration_error() {
        let service = IngestionService::new(
            DeviceAuthenticator::new(DeviceAuthConfig::default()),
            ProfileService::new(MockPatientProfileRepository::with_profiles(vec![data_profile()])),
            MockVitalsRepository::new(),
            EstimationEngine::new(ScriptedEstimator::returning(normal_estimate())),
            NotificationDispatcher::new(MockNotificationChannel::new(), "ops-room".to_string()),
        );

        let result = service
            .ingest_batch(
                vec![reading(70.0, 98.0, 36.8)],
                IngestContext {
                    credentials: valid_credentials(),
                    session_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(IngestionError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_empty_batch_is_rejected() {
        let (service, _) = service_with(
            MockVitalsRepository::new(),
            MockNotificationChannel::new(),
            ScriptedEstimator::returning(normal_estimate()),
        );

        let result = service
            .ingest_batch(
                Vec::new(),
                IngestContext {
                    credentials: valid_credentials(),
                    session_id: None,
                },
            )
            .await;

        assert!(matches!(result, Err(IngestionError::EmptyBatch)));
    }

    #[tokio::test]
    async fn test_alert_write_failure_keeps_vital_and_fails_batch() {
        // The vital written before the failed alert write must survive
        let (service, harness) = service_with(
            MockVitalsRepository::new().with_alert_write_failure(),
            MockNotificationChannel::new(),
            ScriptedEstimator::returning(normal_estimate()),
        );

        let result = service
            .ingest_batch(
                vec![reading(130.0, 98.0, 37.0)],
                IngestContext {
                    credentials: valid_credentials(),
                    session_id: None,
                },
            )
            .await;

        assert!(matches!(
            result,
            Err(IngestionError::Persistence { failed: 1, total: 1 })
        ));
        assert_eq!(harness.vitals.stored_vitals().len(), 1);
        assert!(harness.vitals.stored_alerts().is_empty());
        // No notification for an alert that was never recorded
        assert!(harness.channel.sent_messages().is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_ingestion() {
        let (service, harness) = service_with(
            MockVitalsRepository::new(),
            MockNotificationChannel::new().with_send_failure(),
            ScriptedEstimator::returning(normal_estimate()),
        );

        let summary = service
            .ingest_batch(
                vec![reading(130.0, 98.0, 37.0)],
                IngestContext {
                    credentials: valid_credentials(),
                    session_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.processed, 1);
        assert_eq!(summary.alerts_fired, 1);
        assert_eq!(harness.vitals.stored_alerts().len(), 1);
    }

    #[tokio::test]
    async fn test_session_receives_full_report() {
        let (service, harness) = service_with(
            MockVitalsRepository::new(),
            MockNotificationChannel::new(),
            ScriptedEstimator::returning(normal_estimate()),
        );

        service
            .ingest_batch(
                vec![reading(70.0, 98.0, 36.8)],
                IngestContext {
                    credentials: valid_credentials(),
                    session_id: Some("session-42".to_string()),
                },
            )
            .await
            .unwrap();

        let sent = harness.channel.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "session-42");
        assert!(sent[0].1.contains("Reading processed"));
        assert!(sent[0].1.contains("Alert: no"));
    }

    #[tokio::test]
    async fn test_confidence_gated_estimate_cannot_fire_alert() {
        // A fallback-confidence estimate far beyond the BP threshold
        let gated = EstimationResult {
            systolic: 220.0,
            diastolic: 120.0,
            glucose: 400.0,
            confidence: 0.3,
            reasoning: FALLBACK_REASONING.to_string(),
        };
        let (service, harness) = service_with(
            MockVitalsRepository::new(),
            MockNotificationChannel::new(),
            ScriptedEstimator::returning(gated),
        );

        let summary = service
            .ingest_batch(
                vec![reading(70.0, 98.0, 36.8)],
                IngestContext {
                    credentials: valid_credentials(),
                    session_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.alerts_fired, 0);
        assert!(harness.vitals.stored_alerts().is_empty());
    }

    #[tokio::test]
    async fn test_mixed_batch_continues_past_skips() {
        let vitals = MockVitalsRepository::new();
        let service = IngestionService::new(
            authenticator(),
            ProfileService::new(MockPatientProfileRepository::with_profiles(vec![data_profile()])),
            vitals.clone(),
            EstimationEngine::new(ScriptedEstimator::returning(normal_estimate())),
            NotificationDispatcher::new(MockNotificationChannel::new(), "ops-room".to_string()),
        );

        let mut unknown = reading(70.0, 98.0, 36.8);
        unknown.device_id = "unregistered-device".to_string();

        let summary = service
            .ingest_batch(
                vec![unknown, reading(70.0, 98.0, 36.8)],
                IngestContext {
                    credentials: DeviceCredentials {
                        device_id: None,
                        api_key: None,
                        internal_secret: Some("internal-secret".to_string()),
                    },
                    session_id: None,
                },
            )
            .await
            .unwrap();

        assert_eq!(summary.received, 2);
        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.processed, 1);
        assert_eq!(vitals.stored_vitals().len(), 1);
    }

    #[test]
    fn test_summarize_history() {
        assert_eq!(summarize_history(&[]), "no prior readings");

        let records = vec![
            HealthVitalRecord {
                id: "v1".to_string(),
                patient_id: "patient-1".to_string(),
                device_id: "wearable-007".to_string(),
                timestamp: "2026-01-01T08:00:00Z".to_string(),
                heart_rate: 70.0,
                spo2: 98.0,
                temperature: 36.8,
                ppg: 0.42,
                estimated_systolic: 118.0,
                estimated_diastolic: 76.0,
                estimated_glucose: 95.0,
                confidence: 0.85,
                reasoning: "model estimate".to_string(),
                alert_triggered: false,
                created_at: "2026-01-01T08:00:01Z".to_string(),
            },
            HealthVitalRecord {
                id: "v2".to_string(),
                patient_id: "patient-1".to_string(),
                device_id: "wearable-007".to_string(),
                timestamp: "2026-01-01T09:00:00Z".to_string(),
                heart_rate: 74.0,
                spo2: 97.0,
                temperature: 36.9,
                ppg: 0.40,
                estimated_systolic: 120.0,
                estimated_diastolic: 78.0,
                estimated_glucose: 97.0,
                confidence: 0.85,
                reasoning: "model estimate".to_string(),
                alert_triggered: false,
                created_at: "2026-01-01T09:00:01Z".to_string(),
            },
        ];

        assert_eq!(
            summarize_history(&records),
            "2 prior readings, avg HR 72 bpm, avg SpO2 97.5%"
        );
    }
}
