use async_trait::async_trait;
use tracing::debug;

use crate::models::profile::PatientProfile;
use crate::database::get_db_pool;
use super::errors::RepositoryError;
use super::storage::DatabaseStorage;

/// Repository trait for the read-mostly patient profile store
#[async_trait]
pub trait PatientProfileRepositoryTrait {
    /// Look up the profile registered for a device. `None` means no mapping.
    async fn get_by_device_id(&self, device_id: &str) -> Result<Option<PatientProfile>, RepositoryError>;

    /// Look up a profile by patient id
    async fn get_by_patient_id(&self, patient_id: &str) -> Result<Option<PatientProfile>, RepositoryError>;
}

/// SQLite-backed patient profile repository
#[derive(Debug, Clone, Default)]
pub struct PatientProfileRepository;

impl PatientProfileRepository {
    /// Create a new repository
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PatientProfileRepositoryTrait for PatientProfileRepository {
    /// Look up the profile registered for a device
    async fn get_by_device_id(&self, device_id: &str) -> Result<Option<PatientProfile>, RepositoryError> {
        let pool = get_db_pool().map_err(|e| RepositoryError::Database(e.to_string().into()))?;
        debug!("Resolving patient profile for device: {}", device_id);
        DatabaseStorage::get_profile_by_device(&pool, device_id)
    }

    /// Look up a profile by patient id
    async fn get_by_patient_id(&self, patient_id: &str) -> Result<Option<PatientProfile>, RepositoryError> {
        let pool = get_db_pool().map_err(|e| RepositoryError::Database(e.to_string().into()))?;
        DatabaseStorage::get_profile_by_patient(&pool, patient_id)
    }
}

/// Mock profile repository for testing
#[cfg(any(test, feature = "mock"))]
pub mod tests {
    use super::*;

    /// Mock implementation of PatientProfileRepository with preloaded profiles
    #[derive(Clone, Default)]
    pub struct MockPatientProfileRepository {
        profiles: Vec<PatientProfile>,
    }

    impl MockPatientProfileRepository {
        /// Create a new empty mock repository
        pub fn new() -> Self {
            Self::default()
        }

        /// Create a mock repository with predefined profiles
        pub fn with_profiles(profiles: Vec<PatientProfile>) -> Self {
            Self { profiles }
        }
    }

    #[async_trait]
    impl PatientProfileRepositoryTrait for MockPatientProfileRepository {
        async fn get_by_device_id(&self, device_id: &str) -> Result<Option<PatientProfile>, RepositoryError> {
            Ok(self.profiles.iter().find(|p| p.device_id == device_id).cloned())
        }

        async fn get_by_patient_id(&self, patient_id: &str) -> Result<Option<PatientProfile>, RepositoryError> {
            Ok(self.profiles.iter().find(|p| p.patient_id == patient_id).cloned())
        }
    }

    #[cfg(test)]
    mod behavior {
        use super::*;

        fn sample_profile() -> PatientProfile {
            PatientProfile {
                patient_id: "patient-1".to_string(),
                device_id: "device-1".to_string(),
                name: "Ada Example".to_string(),
                age: 54,
                gender: "female".to_string(),
                has_diabetes: false,
                has_hypertension: true,
                has_heart_condition: false,
                baseline_heart_rate: Some(68.0),
                baseline_spo2: Some(97.0),
                max_heart_rate: None,
                min_heart_rate: None,
                min_spo2: None,
                max_systolic: Some(135.0),
                max_glucose: None,
            }
        }

        #[tokio::test]
        async fn test_mock_lookup_by_device() {
            let repo = MockPatientProfileRepository::with_profiles(vec![sample_profile()]);

            let found = repo.get_by_device_id("device-1").await.unwrap();
            assert!(found.is_some());
            assert_eq!(found.unwrap().patient_id, "patient-1");

            let missing = repo.get_by_device_id("device-2").await.unwrap();
            assert!(missing.is_none());
        }

        #[tokio::test]
        async fn test_mock_lookup_by_patient() {
            let repo = MockPatientProfileRepository::with_profiles(vec![sample_profile()]);

            let found = repo.get_by_patient_id("patient-1").await.unwrap();
            assert_eq!(found.unwrap().device_id, "device-1");
        }
    }
}
