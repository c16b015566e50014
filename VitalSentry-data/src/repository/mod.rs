// Repository module structure
pub mod errors;
mod vitals;
mod profiles;
mod storage;

// Re-export commonly used types
pub use errors::RepositoryError;
pub use vitals::{VitalsRepository, VitalsRepositoryTrait};
pub use profiles::{PatientProfileRepository, PatientProfileRepositoryTrait};

// Re-export test modules for both testing and when mock feature is enabled
#[cfg(any(test, feature = "mock"))]
pub use vitals::tests;
#[cfg(any(test, feature = "mock"))]
pub use profiles::tests as profile_tests;
