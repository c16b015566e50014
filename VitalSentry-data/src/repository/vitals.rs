use chrono::Utc;
use tracing::debug;
use uuid::Uuid;
use async_trait::async_trait;

use crate::models::vitals::{AlertRecord, HealthVitalRecord, NewAlertRecord, NewVitalRecord};
use crate::database::get_db_pool;
use super::errors::RepositoryError;
use super::storage::DatabaseStorage;

/// Repository trait for the append-only vitals and alerts stores
#[async_trait]
pub trait VitalsRepositoryTrait {
    /// Append a health vital record. Assigns the record id and creation time.
    async fn append_vital(&self, record: NewVitalRecord) -> Result<HealthVitalRecord, RepositoryError>;

    /// Append an alert record. Assigns the alert id and creation time.
    async fn append_alert(&self, record: NewAlertRecord) -> Result<AlertRecord, RepositoryError>;

    /// Get the most recent vital records for a patient, newest first
    async fn get_recent_for_patient(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<HealthVitalRecord>, RepositoryError>;

    /// Get vital records for a patient within a timestamp range, oldest first
    async fn get_for_patient_in_range(
        &self,
        patient_id: &str,
        start: Option<String>,
        end: Option<String>,
    ) -> Result<Vec<HealthVitalRecord>, RepositoryError>;

    /// Get all alerts for a patient, newest first
    async fn get_alerts_for_patient(&self, patient_id: &str) -> Result<Vec<AlertRecord>, RepositoryError>;
}

/// SQLite-backed repository for vitals and alerts.
///
/// Both tables are append-only. Persistence errors propagate to the caller;
/// there is no in-memory fallback, since a silently dropped vital or alert
/// would defeat the point of the pipeline.
#[derive(Debug, Clone, Default)]
pub struct VitalsRepository;

impl VitalsRepository {
    /// Create a new repository
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl VitalsRepositoryTrait for VitalsRepository {
    /// Append a health vital record
    async fn append_vital(&self, record: NewVitalRecord) -> Result<HealthVitalRecord, RepositoryError> {
        let stored = HealthVitalRecord {
            id: Uuid::new_v4().to_string(),
            patient_id: record.patient_id,
            device_id: record.device_id,
            timestamp: record.timestamp,
            heart_rate: record.heart_rate,
            spo2: record.spo2,
            temperature: record.temperature,
            ppg: record.ppg,
            estimated_systolic: record.estimated_systolic,
            estimated_diastolic: record.estimated_diastolic,
            estimated_glucose: record.estimated_glucose,
            confidence: record.confidence,
            reasoning: record.reasoning,
            alert_triggered: record.alert_triggered,
            created_at: Utc::now().to_rfc3339(),
        };

        let pool = get_db_pool().map_err(|e| RepositoryError::Database(e.to_string().into()))?;
        debug!("Appending health vital record: {}", stored.id);
        DatabaseStorage::insert_vital(&pool, &stored)?;

        Ok(stored)
    }

    /// Append an alert record
    async fn append_alert(&self, record: NewAlertRecord) -> Result<AlertRecord, RepositoryError> {
        let stored = AlertRecord {
            id: Uuid::new_v4().to_string(),
            patient_id: record.patient_id,
            device_id: record.device_id,
            timestamp: record.timestamp,
            heart_rate: record.heart_rate,
            spo2: record.spo2,
            temperature: record.temperature,
            estimated_systolic: record.estimated_systolic,
            estimated_glucose: record.estimated_glucose,
            message: record.message,
            severity: record.severity,
            acknowledged: false,
            acknowledged_at: None,
            created_at: Utc::now().to_rfc3339(),
        };

        let pool = get_db_pool().map_err(|e| RepositoryError::Database(e.to_string().into()))?;
        debug!("Appending alert record: {}", stored.id);
        DatabaseStorage::insert_alert(&pool, &stored)?;

        Ok(stored)
    }

    /// Get the most recent vital records for a patient
    async fn get_recent_for_patient(
        &self,
        patient_id: &str,
        limit: usize,
    ) -> Result<Vec<HealthVitalRecord>, RepositoryError> {
        let pool = get_db_pool().map_err(|e| RepositoryError::Database(e.to_string().into()))?;
        DatabaseStorage::get_recent_for_patient(&pool, patient_id, limit)
    }

    /// Get vital records for a patient within a timestamp range
    async fn get_for_patient_in_range(
        &self,
        patient_id: &str,
        start: Option<String>,
        end: Option<String>,
    ) -> Result<Vec<HealthVitalRecord>, RepositoryError> {
        let pool = get_db_pool().map_err(|e| RepositoryError::Database(e.to_string().into()))?;
        DatabaseStorage::get_for_patient_in_range(&pool, patient_id, start.as_deref(), end.as_deref())
    }

    /// Get all alerts for a patient
    async fn get_alerts_for_patient(&self, patient_id: &str) -> Result<Vec<AlertRecord>, RepositoryError> {
        let pool = get_db_pool().map_err(|e| RepositoryError::Database(e.to_string().into()))?;
        DatabaseStorage::get_alerts_for_patient(&pool, patient_id)
    }
}

/// Mock vitals repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// Mock implementation of VitalsRepository for testing.
    ///
    /// Stores records in memory and can be configured to fail the vital or
    /// alert write, which lets callers exercise the non-transactional
    /// vital-then-alert ordering.
    #[derive(Clone, Default)]
    pub struct MockVitalsRepository {
        vitals: Arc<Mutex<Vec<HealthVitalRecord>>>,
        alerts: Arc<Mutex<Vec<AlertRecord>>>,
        fail_vital_write: bool,
        fail_alert_write: bool,
    }

    impl MockVitalsRepository {
        /// Create a new empty mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Configure the mock to fail every vital write
        pub fn with_vital_write_failure(mut self) -> Self {
            self.fail_vital_write = true;
            self
        }

        /// Configure the mock to fail every alert write
        pub fn with_alert_write_failure(mut self) -> Self {
            self.fail_alert_write = true;
            self
        }

        /// Snapshot of the stored vital records
        pub fn stored_vitals(&self) -> Vec<HealthVitalRecord> {
            self.vitals.lock().unwrap().clone()
        }

        /// Snapshot of the stored alert records
        pub fn stored_alerts(&self) -> Vec<AlertRecord> {
            self.alerts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl VitalsRepositoryTrait for MockVitalsRepository {
        async fn append_vital(&self, record: NewVitalRecord) -> Result<HealthVitalRecord, RepositoryError> {
            if self.fail_vital_write {
                return Err(RepositoryError::Database(
                    "mock is configured to fail vital writes".to_string().into(),
                ));
            }

            let stored = HealthVitalRecord {
                id: Uuid::new_v4().to_string(),
                patient_id: record.patient_id,
                device_id: record.device_id,
                timestamp: record.timestamp,
                heart_rate: record.heart_rate,
                spo2: record.spo2,
                temperature: record.temperature,
                ppg: record.ppg,
                estimated_systolic: record.estimated_systolic,
                estimated_diastolic: record.estimated_diastolic,
                estimated_glucose: record.estimated_glucose,
                confidence: record.confidence,
                reasoning: record.reasoning,
                alert_triggered: record.alert_triggered,
                created_at: Utc::now().to_rfc3339(),
            };

            self.vitals.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn append_alert(&self, record: NewAlertRecord) -> Result<AlertRecord, RepositoryError> {
            if self.fail_alert_write {
                return Err(RepositoryError::Database(
                    "mock is configured to fail alert writes".to_string().into(),
                ));
            }

            let stored = AlertRecord {
                id: Uuid::new_v4().to_string(),
                patient_id: record.patient_id,
                device_id: record.device_id,
                timestamp: record.timestamp,
                heart_rate: record.heart_rate,
                spo2: record.spo2,
                temperature: record.temperature,
                estimated_systolic: record.estimated_systolic,
                estimated_glucose: record.estimated_glucose,
                message: record.message,
                severity: record.severity,
                acknowledged: false,
                acknowledged_at: None,
                created_at: Utc::now().to_rfc3339(),
            };

            self.alerts.lock().unwrap().push(stored.clone());
            Ok(stored)
        }

        async fn get_recent_for_patient(
            &self,
            patient_id: &str,
            limit: usize,
        ) -> Result<Vec<HealthVitalRecord>, RepositoryError> {
            let mut records: Vec<HealthVitalRecord> = self
                .vitals
                .lock()
                .unwrap()
                .iter()
                .filter(|r| r.patient_id == patient_id)
                .cloned()
                .collect();

            records.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
            records.truncate(limit);
            Ok(records)
        }

        async fn get_for_patient_in_range(
            &self,
            patient_id: &str,
            start: Option<String>,
            end: Option<String>,
        ) -> Result<Vec<HealthVitalRecord>, RepositoryError> {
            let mut records: Vec<HealthVitalRecord> = self
                .vitals
                .lock()
                .unwrap()
                .iter()
                .filter(|r| {
                    if r.patient_id != patient_id {
                        return false;
                    }
                    if let Some(start) = &start {
                        if r.timestamp < *start {
                            return false;
                        }
                    }
                    if let Some(end) = &end {
                        if r.timestamp > *end {
                            return false;
                        }
                    }
                    true
                })
                .cloned()
                .collect();

            records.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
            Ok(records)
        }

        async fn get_alerts_for_patient(&self, patient_id: &str) -> Result<Vec<AlertRecord>, RepositoryError> {
            let mut records: Vec<AlertRecord> = self
                .alerts
                .lock()
                .unwrap()
                .iter()
                .filter(|a| a.patient_id == patient_id)
                .cloned()
                .collect();

            records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
            Ok(records)
        }
    }

    #[cfg(test)]
    mod behavior {
        use super::*;

        fn sample_new_vital() -> NewVitalRecord {
            NewVitalRecord {
                patient_id: "patient-1".to_string(),
                device_id: "device-1".to_string(),
                timestamp: "2026-01-01T08:00:00Z".to_string(),
                heart_rate: 72.0,
                spo2: 98.0,
                temperature: 36.8,
                ppg: 0.42,
                estimated_systolic: 118.0,
                estimated_diastolic: 76.0,
                estimated_glucose: 92.0,
                confidence: 0.85,
                reasoning: "model estimate".to_string(),
                alert_triggered: false,
            }
        }

        #[tokio::test]
        async fn test_mock_append_assigns_id_and_created_at() {
            let repo = MockVitalsRepository::new();
            let stored = repo.append_vital(sample_new_vital()).await.unwrap();
            assert!(!stored.id.is_empty());
            assert!(!stored.created_at.is_empty());
            assert_eq!(repo.stored_vitals().len(), 1);
        }

        #[tokio::test]
        async fn test_mock_append_is_not_deduplicated() {
            // Re-ingesting an identical reading yields two independent records
            let repo = MockVitalsRepository::new();
            let first = repo.append_vital(sample_new_vital()).await.unwrap();
            let second = repo.append_vital(sample_new_vital()).await.unwrap();
            assert_ne!(first.id, second.id);
            assert_eq!(repo.stored_vitals().len(), 2);
        }

        #[tokio::test]
        async fn test_mock_write_failure_injection() {
            let repo = MockVitalsRepository::new().with_alert_write_failure();
            assert!(repo.append_vital(sample_new_vital()).await.is_ok());

            let alert = NewAlertRecord {
                patient_id: "patient-1".to_string(),
                device_id: "device-1".to_string(),
                timestamp: "2026-01-01T08:00:00Z".to_string(),
                heart_rate: 130.0,
                spo2: 98.0,
                temperature: 37.0,
                estimated_systolic: 120.0,
                estimated_glucose: 95.0,
                message: "High heart rate: 130 bpm".to_string(),
                severity: "Critical".to_string(),
            };
            assert!(repo.append_alert(alert).await.is_err());

            // The vital written before the failed alert is still retrievable
            assert_eq!(repo.stored_vitals().len(), 1);
            assert!(repo.stored_alerts().is_empty());
        }
    }
}
