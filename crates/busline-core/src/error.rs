//! Error taxonomy shared by the registry, the credential store and the API layer.

use std::path::PathBuf;

use thiserror::Error;

use crate::models::DriverId;

#[derive(Debug, Error)]
pub enum TrackerError {
    /// No session, or the session has expired.
    #[error("not authenticated")]
    Unauthenticated,

    /// Coordinates or accuracy that are missing or not finite numbers.
    #[error("{0}")]
    Validation(String),

    #[error("no location yet for driver {0}")]
    NotFound(DriverId),

    /// No driver has ever reported a position.
    #[error("no locations yet")]
    Empty,

    #[error("storage unavailable at {}: {reason}", path.display())]
    StorageUnavailable { path: PathBuf, reason: String },
}

impl TrackerError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn storage(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::StorageUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_error_names_the_file() {
        let err = TrackerError::storage("/data/locations.json", "permission denied");
        assert_eq!(
            err.to_string(),
            "storage unavailable at /data/locations.json: permission denied"
        );
    }

    #[test]
    fn not_found_names_the_driver() {
        let err = TrackerError::NotFound(DriverId::from("driver9"));
        assert_eq!(err.to_string(), "no location yet for driver driver9");
    }
}
