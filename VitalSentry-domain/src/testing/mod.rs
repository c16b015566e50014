// Testing utilities and mock implementations for the domain layer
// Available to unit tests and when the "mock" feature is enabled

// Re-export useful test mocks from the data layer
pub use vital_sentry_data::repository::tests::MockVitalsRepository;
pub use vital_sentry_data::repository::profile_tests::MockPatientProfileRepository;

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use async_trait::async_trait;

use crate::entities::vitals::EstimationResult;
use crate::health::{ComponentStatus, HealthComponent, HealthServiceTrait, SystemHealth, SystemStatus};
use crate::services::estimation::{EstimationRequest, EstimatorError, VitalsEstimatorTrait};
use crate::services::notifications::{NotificationChannelTrait, NotificationError};

/// Estimator that always returns a fixed result
#[derive(Clone)]
pub struct ScriptedEstimator {
    result: EstimationResult,
}

impl ScriptedEstimator {
    /// Create an estimator returning the given result on every call
    pub fn returning(result: EstimationResult) -> Self {
        Self { result }
    }
}

#[async_trait]
impl VitalsEstimatorTrait for ScriptedEstimator {
    async fn estimate(&self, _request: &EstimationRequest) -> Result<EstimationResult, EstimatorError> {
        Ok(self.result.clone())
    }
}

/// Estimator that always fails, as an unavailable AI service would
#[derive(Clone, Copy)]
pub struct FailingEstimator;

#[async_trait]
impl VitalsEstimatorTrait for FailingEstimator {
    async fn estimate(&self, _request: &EstimationRequest) -> Result<EstimationResult, EstimatorError> {
        Err(EstimatorError::Service("mock estimator is configured to fail".to_string()))
    }
}

/// Notification channel that records every send
#[derive(Clone, Default)]
pub struct MockNotificationChannel {
    sent: Arc<Mutex<Vec<(String, String)>>>,
    fail_sends: bool,
}

impl MockNotificationChannel {
    /// Create a new recording channel
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the channel to fail every send
    pub fn with_send_failure(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// Snapshot of (destination, text) pairs sent so far
    pub fn sent_messages(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationChannelTrait for MockNotificationChannel {
    async fn notify(&self, destination: &str, text: &str) -> Result<(), NotificationError> {
        if self.fail_sends {
            return Err(NotificationError::Channel(
                "mock channel is configured to fail".to_string(),
            ));
        }

        self.sent
            .lock()
            .unwrap()
            .push((destination.to_string(), text.to_string()));
        Ok(())
    }
}

/// Mock implementation of health services for testing system health
#[derive(Debug)]
pub struct MockHealthService {
    /// Database component status
    database_status: ComponentStatus,
}

impl Default for MockHealthService {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHealthService {
    /// Create a new mock health service with all components healthy
    pub fn new() -> Self {
        Self {
            database_status: ComponentStatus::Healthy,
        }
    }

    /// Configure the mock with an unhealthy database
    pub fn with_unhealthy_database(mut self) -> Self {
        self.database_status = ComponentStatus::Unhealthy;
        self
    }
}

#[async_trait]
impl HealthServiceTrait for MockHealthService {
    async fn get_system_health(&self) -> SystemHealth {
        let mut components = HashMap::new();
        components.insert(
            "database".to_string(),
            HealthComponent {
                status: self.database_status.clone(),
                details: match self.database_status {
                    ComponentStatus::Unhealthy => Some("Database connection failed".to_string()),
                    _ => None,
                },
            },
        );
        components.insert(
            "api".to_string(),
            HealthComponent {
                status: ComponentStatus::Healthy,
                details: None,
            },
        );

        let status = match self.database_status {
            ComponentStatus::Healthy => SystemStatus::Healthy,
            ComponentStatus::Degraded => SystemStatus::Degraded,
            ComponentStatus::Unhealthy => SystemStatus::Unhealthy,
        };

        SystemHealth { status, components }
    }

    async fn check_database_status(&self) -> Result<bool, String> {
        match self.database_status {
            ComponentStatus::Healthy | ComponentStatus::Degraded => Ok(true),
            ComponentStatus::Unhealthy => Err("Database connection failed".to_string()),
        }
    }
}

/// Factory function to create a mock health service
pub fn create_mock_health_service() -> MockHealthService {
    MockHealthService::new()
}
