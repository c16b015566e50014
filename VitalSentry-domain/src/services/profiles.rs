use thiserror::Error;
use tracing::debug;

use crate::entities::conversions;
use crate::entities::vitals::PatientProfile;
use vital_sentry_data::repository::{PatientProfileRepository, PatientProfileRepositoryTrait, RepositoryError};

/// Profile resolution errors
#[derive(Debug, Error)]
pub enum ProfileServiceError {
    /// Repository error
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

/// Resolves patient profiles for devices and patients.
///
/// A missing mapping is not an error: it is returned as `None` so the
/// caller can skip the reading and continue the batch.
pub struct ProfileService<R: PatientProfileRepositoryTrait> {
    repository: R,
}

impl<R: PatientProfileRepositoryTrait> ProfileService<R> {
    /// Create a new profile service
    pub fn new(repository: R) -> Self {
        Self { repository }
    }

    /// Map repository errors to service errors
    fn map_repo_error(&self, err: RepositoryError) -> ProfileServiceError {
        ProfileServiceError::RepositoryError(err.to_string())
    }

    /// Resolve the profile registered for a device
    pub async fn resolve_by_device(&self, device_id: &str) -> Result<Option<PatientProfile>, ProfileServiceError> {
        let data_profile = self
            .repository
            .get_by_device_id(device_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        match data_profile {
            Some(profile) => {
                debug!("Resolved profile {} for device {}", profile.patient_id, device_id);
                Ok(Some(conversions::convert_to_domain_profile(profile)))
            }
            None => Ok(None),
        }
    }

    /// Resolve a profile by patient id
    pub async fn resolve_by_patient(&self, patient_id: &str) -> Result<Option<PatientProfile>, ProfileServiceError> {
        let data_profile = self
            .repository
            .get_by_patient_id(patient_id)
            .await
            .map_err(|e| self.map_repo_error(e))?;

        Ok(data_profile.map(conversions::convert_to_domain_profile))
    }
}

/// Create a default profile service using the repository from the data layer
pub fn create_default_profile_service() -> ProfileService<PatientProfileRepository> {
    ProfileService::new(PatientProfileRepository::new())
}
