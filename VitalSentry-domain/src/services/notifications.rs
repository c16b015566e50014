//! Alert and report notifications
//!
//! Delivery is best-effort: a failed send is logged and never propagates
//! into the ingestion result. Alerts go to the fixed operator
//! destination; when the ingestion request originated from an interactive
//! session, that session also receives a full report of the reading.

use std::env;
use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::entities::vitals::{AlertSeverity, DeviceReading, EstimationResult};

/// Notification delivery errors
#[derive(Debug, Error)]
pub enum NotificationError {
    /// The send exceeded its deadline
    #[error("Notification channel timed out")]
    Timeout,

    /// Transport-level failure
    #[error("Notification request failed: {0}")]
    Http(String),

    /// The channel answered with a non-success status
    #[error("Notification channel error: {0}")]
    Channel(String),
}

/// Trait for outbound notification channels
#[async_trait]
pub trait NotificationChannelTrait {
    /// Deliver a text message to a destination on the channel
    async fn notify(&self, destination: &str, text: &str) -> Result<(), NotificationError>;
}

/// Configuration for the outbound notification channel
#[derive(Debug, Clone)]
pub struct NotifierConfig {
    /// Webhook endpoint messages are POSTed to
    pub webhook_url: String,

    /// Fixed operator/clinician destination for alerts
    pub operator_destination: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,
}

impl NotifierConfig {
    /// Read the notifier configuration from the environment.
    /// Returns `None` when no channel is configured.
    pub fn from_env() -> Option<Self> {
        let webhook_url = env::var("NOTIFY_WEBHOOK_URL").ok()?;
        let operator_destination = env::var("NOTIFY_DESTINATION").ok()?;

        let timeout_seconds = env::var("NOTIFY_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(10);

        Some(Self {
            webhook_url,
            operator_destination,
            timeout_seconds,
        })
    }
}

/// Message body POSTed to the notification webhook
#[derive(Debug, Serialize)]
struct NotifyPayload<'a> {
    destination: &'a str,
    text: &'a str,
}

/// HTTP webhook notification channel
pub struct HttpNotificationChannel {
    client: reqwest::Client,
    webhook_url: String,
}

impl HttpNotificationChannel {
    /// Create a channel with the request timeout baked in
    pub fn new(webhook_url: String, timeout_seconds: u64) -> Result<Self, NotificationError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| NotificationError::Http(e.to_string()))?;

        Ok(Self {
            client,
            webhook_url,
        })
    }
}

#[async_trait]
impl NotificationChannelTrait for HttpNotificationChannel {
    /// Deliver a text message via the webhook
    async fn notify(&self, destination: &str, text: &str) -> Result<(), NotificationError> {
        debug!("Sending notification to {}", destination);

        let response = self
            .client
            .post(&self.webhook_url)
            .json(&NotifyPayload { destination, text })
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    NotificationError::Timeout
                } else {
                    NotificationError::Http(e.to_string())
                }
            })?;

        if !response.status().is_success() {
            return Err(NotificationError::Channel(format!(
                "status {}",
                response.status()
            )));
        }

        Ok(())
    }
}

/// Format the operator-facing alert message
pub fn format_alert_text(patient_name: &str, severity: AlertSeverity, message: &str) -> String {
    format!("[{}] Alert for {}: {}", severity, patient_name, message)
}

/// Format the full-report message echoed to the originating session
pub fn format_report_text(
    patient_name: &str,
    reading: &DeviceReading,
    estimate: &EstimationResult,
    alert_triggered: bool,
) -> String {
    format!(
        "Reading processed for {} at {}: HR {:.0} bpm, SpO2 {:.1}%, temp {:.1}°C, \
         estimated BP {:.0}/{:.0} mmHg, estimated glucose {:.0} mg/dL \
         (confidence {:.2}). Alert: {}",
        patient_name,
        reading.timestamp,
        reading.heart_rate,
        reading.spo2,
        reading.temperature,
        estimate.systolic,
        estimate.diastolic,
        estimate.glucose,
        estimate.confidence,
        if alert_triggered { "yes" } else { "no" },
    )
}

/// Dispatches alert and report notifications over a channel.
///
/// An unconfigured dispatcher silently drops messages; that is the normal
/// state in tests and in deployments without a messaging channel.
pub struct NotificationDispatcher<C: NotificationChannelTrait> {
    channel: Option<C>,
    operator_destination: Option<String>,
}

impl<C: NotificationChannelTrait> NotificationDispatcher<C> {
    /// Create a dispatcher with a channel and the fixed operator destination
    pub fn new(channel: C, operator_destination: String) -> Self {
        Self {
            channel: Some(channel),
            operator_destination: Some(operator_destination),
        }
    }

    /// Create a dispatcher that drops all messages
    pub fn disabled() -> Self {
        Self {
            channel: None,
            operator_destination: None,
        }
    }

    /// Send an alert to the operator destination. Best-effort.
    pub async fn dispatch_alert(&self, patient_name: &str, severity: AlertSeverity, message: &str) {
        let (channel, destination) = match (&self.channel, &self.operator_destination) {
            (Some(channel), Some(destination)) => (channel, destination),
            _ => {
                debug!("Notification channel not configured, dropping alert");
                return;
            }
        };

        let text = format_alert_text(patient_name, severity, message);
        match channel.notify(destination, &text).await {
            Ok(()) => info!("Alert notification sent for {}", patient_name),
            Err(e) => warn!("Failed to send alert notification: {}", e),
        }
    }

    /// Echo a full report of the processed reading to the originating
    /// session. Best-effort.
    pub async fn dispatch_report(
        &self,
        session_id: &str,
        patient_name: &str,
        reading: &DeviceReading,
        estimate: &EstimationResult,
        alert_triggered: bool,
    ) {
        let channel = match &self.channel {
            Some(channel) => channel,
            None => {
                debug!("Notification channel not configured, dropping report");
                return;
            }
        };

        let text = format_report_text(patient_name, reading, estimate, alert_triggered);
        if let Err(e) = channel.notify(session_id, &text).await {
            warn!("Failed to send report notification: {}", e);
        }
    }
}

/// Create the default dispatcher from the environment.
/// Without `NOTIFY_WEBHOOK_URL`/`NOTIFY_DESTINATION` dispatch is disabled.
pub fn create_default_notification_dispatcher() -> NotificationDispatcher<HttpNotificationChannel> {
    match NotifierConfig::from_env() {
        Some(config) => match HttpNotificationChannel::new(config.webhook_url, config.timeout_seconds) {
            Ok(channel) => NotificationDispatcher::new(channel, config.operator_destination),
            Err(e) => {
                warn!("Failed to build notification client ({}), notifications disabled", e);
                NotificationDispatcher::disabled()
            }
        },
        None => {
            info!("Notification channel not configured, notifications disabled");
            NotificationDispatcher::disabled()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockNotificationChannel;

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
    fn test_alert_text_format() {
        let text = format_alert_text("Ada Example", AlertSeverity::Critical, "High heart rate: 130 bpm");
        assert_eq!(text, "[Critical] Alert for Ada Example: High heart rate: 130 bpm");
    }

    #[test]
    fn test_report_text_contains_vitals_and_estimates() {
        let text = format_report_text("Ada Example", &sample_reading(), &sample_estimate(), true);
        assert!(text.contains("HR 130 bpm"));
        assert!(text.contains("SpO2 98.0%"));
        assert!(text.contains("122/78 mmHg"));
        assert!(text.contains("Alert: yes"));
    }

    #[tokio::test]
    async fn test_dispatch_alert_sends_to_operator() {
        let channel = MockNotificationChannel::new();
        let dispatcher = NotificationDispatcher::new(channel.clone(), "ops-room".to_string());

        dispatcher
            .dispatch_alert("Ada Example", AlertSeverity::Critical, "High heart rate: 130 bpm")
            .await;

        let sent = channel.sent_messages();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "ops-room");
        assert!(sent[0].1.contains("Critical"));
    }

    #[tokio::test]
    async fn test_dispatch_failures_are_swallowed() {
        let channel = MockNotificationChannel::new().with_send_failure();
        let dispatcher = NotificationDispatcher::new(channel, "ops-room".to_string());

        // Must not panic or propagate
        dispatcher
            .dispatch_alert("Ada Example", AlertSeverity::High, "High temperature: 38.5°C")
            .await;
    }

    #[tokio::test]
    async fn test_disabled_dispatcher_drops_messages() {
        let dispatcher = NotificationDispatcher::<MockNotificationChannel>::disabled();
        dispatcher
            .dispatch_report("session-1", "Ada Example", &sample_reading(), &sample_estimate(), false)
            .await;
    }
}
