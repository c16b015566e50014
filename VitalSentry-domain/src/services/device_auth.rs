//! Device authentication for inbound reading batches
//!
//! A batch is accepted when the caller presents the registered device id
//! together with its shared-secret API key, or when an internal service
//! presents the pre-shared internal secret. Validation is pure: no side
//! effects, and any denial aborts the whole batch before a single reading
//! is processed.

use std::env;
use thiserror::Error;
use tracing::{debug, warn};

/// Device authentication errors
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DeviceAuthError {
    /// Server-side credentials are not configured; distinct from a
    /// credential mismatch and reported as an internal error
    #[error("Device credentials are not configured on the server")]
    MissingConfig,

    /// The declared device id does not match the registered device
    #[error("Unknown device identifier")]
    DeviceIdMismatch,

    /// The presented secret does not match
    #[error("Invalid device credentials")]
    CredentialMismatch,
}

/// Who was authorized to submit the batch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthorizedCaller {
    /// A registered wearable device
    Device,

    /// A service-to-service caller holding the internal secret
    InternalService,
}

/// Credentials presented with an ingestion request
#[derive(Debug, Clone, Default)]
pub struct DeviceCredentials {
    /// Declared device identifier
    pub device_id: Option<String>,

    /// Shared-secret API key for the device
    pub api_key: Option<String>,

    /// Pre-shared internal service secret, if the caller is internal
    pub internal_secret: Option<String>,
}

/// Expected credentials, read from the environment at startup
#[derive(Debug, Clone, Default)]
pub struct DeviceAuthConfig {
    /// Registered device identifier
    pub expected_device_id: Option<String>,

    /// Shared-secret API key the device must present
    pub expected_api_key: Option<String>,

    /// Pre-shared secret for internal service calls
    pub internal_secret: Option<String>,
}

impl DeviceAuthConfig {
    /// Read the expected credentials from the environment
    pub fn from_env() -> Self {
        Self {
            expected_device_id: env::var("DEVICE_ID").ok(),
            expected_api_key: env::var("DEVICE_API_KEY").ok(),
            internal_secret: env::var("INTERNAL_API_SECRET").ok(),
        }
    }
}

/// Validates that an inbound batch originates from a recognized source
#[derive(Debug, Clone)]
pub struct DeviceAuthenticator {
    config: DeviceAuthConfig,
}

impl DeviceAuthenticator {
    /// Create an authenticator with explicit configuration
    pub fn new(config: DeviceAuthConfig) -> Self {
        Self { config }
    }

    /// Create an authenticator configured from the environment
    pub fn from_env() -> Self {
        Self::new(DeviceAuthConfig::from_env())
    }

    /// Authorize a caller.
    ///
    /// An internal secret, when presented, is checked against the
    /// configured internal secret and bypasses the per-device check.
    /// Otherwise the declared device id and API key must both match.
    pub fn authorize(&self, credentials: &DeviceCredentials) -> Result<AuthorizedCaller, DeviceAuthError> {
        if let Some(presented) = &credentials.internal_secret {
            let expected = self
                .config
                .internal_secret
                .as_ref()
                .ok_or(DeviceAuthError::MissingConfig)?;

            if constant_time_eq(presented.as_bytes(), expected.as_bytes()) {
                debug!("Batch authorized via internal service secret");
                return Ok(AuthorizedCaller::InternalService);
            }

            warn!("Internal service secret mismatch");
            return Err(DeviceAuthError::CredentialMismatch);
        }

        let expected_device_id = self
            .config
            .expected_device_id
            .as_ref()
            .ok_or(DeviceAuthError::MissingConfig)?;
        let expected_api_key = self
            .config
            .expected_api_key
            .as_ref()
            .ok_or(DeviceAuthError::MissingConfig)?;

        let device_id = credentials
            .device_id
            .as_deref()
            .ok_or(DeviceAuthError::DeviceIdMismatch)?;
        if device_id != expected_device_id {
            warn!("Device id mismatch: {}", device_id);
            return Err(DeviceAuthError::DeviceIdMismatch);
        }

        let api_key = credentials
            .api_key
            .as_deref()
            .ok_or(DeviceAuthError::CredentialMismatch)?;
        if !constant_time_eq(api_key.as_bytes(), expected_api_key.as_bytes()) {
            warn!("API key mismatch for device {}", device_id);
            return Err(DeviceAuthError::CredentialMismatch);
        }

        debug!("Batch authorized for device {}", device_id);
        Ok(AuthorizedCaller::Device)
    }
}

/// Compare two byte strings without short-circuiting on the first
/// differing byte. Length differences still return early; the secrets
/// compared here have fixed, non-sensitive lengths.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut diff = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
