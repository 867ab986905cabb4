//! Location registry: latest position per driver, written through to disk.

use std::collections::BTreeMap;
use std::path::PathBuf;

use busline_core::{DriverId, PositionRecord, TrackerError};
use chrono::{DateTime, Local};
use tokio::sync::RwLock;
use tracing::{debug, error, info, warn};

use super::json_file::{read_if_exists, write_pretty};

pub type LocationSnapshot = BTreeMap<DriverId, PositionRecord>;

/// Thread-safe map of driver id to last reported position.
///
/// Every upsert holds the write lock across both the in-memory insert and the
/// full-snapshot rewrite, so the file always matches some linear order of
/// upserts. A failed write restores the previous record before the lock is
/// released.
#[derive(Debug)]
pub struct LocationRegistry {
    path: PathBuf,
    records: RwLock<LocationSnapshot>,
}

impl LocationRegistry {
    /// Load the snapshot at `path`.
    ///
    /// An unparseable file is treated as empty. A missing file is created
    /// with an empty snapshot.
    pub async fn initialize(path: impl Into<PathBuf>) -> Result<Self, TrackerError> {
        let path = path.into();

        let records = match read_if_exists(&path).await? {
            Some(bytes) => match serde_json::from_slice::<LocationSnapshot>(&bytes) {
                Ok(records) => {
                    info!("Loaded {} driver locations from {}", records.len(), path.display());
                    records
                }
                Err(err) => {
                    warn!(
                        "Ignoring unreadable location snapshot {}: {}",
                        path.display(),
                        err
                    );
                    LocationSnapshot::new()
                }
            },
            None => {
                let empty = LocationSnapshot::new();
                write_pretty(&path, &empty).await?;
                info!("Created empty location snapshot at {}", path.display());
                empty
            }
        };

        Ok(Self {
            path,
            records: RwLock::new(records),
        })
    }

    /// Replace `identity`'s position with a record captured at `now`.
    pub async fn upsert(
        &self,
        identity: &DriverId,
        latitude: f64,
        longitude: f64,
        accuracy: f64,
        now: DateTime<Local>,
    ) -> Result<PositionRecord, TrackerError> {
        let record = PositionRecord::new(identity.clone(), latitude, longitude, accuracy, &now)?;

        let mut records = self.records.write().await;
        let previous = records.insert(identity.clone(), record.clone());

        if let Err(err) = write_pretty(&self.path, &*records).await {
            match previous {
                Some(previous) => {
                    records.insert(identity.clone(), previous);
                }
                None => {
                    records.remove(identity);
                }
            }
            error!("Failed to persist location for {}: {}", identity, err);
            return Err(err);
        }

        debug!(
            driver = %identity,
            lat = record.latitude,
            lng = record.longitude,
            accuracy = record.accuracy,
            "Location updated"
        );
        Ok(record)
    }

    /// Snapshot of every driver's latest position.
    pub async fn get_all(&self) -> Result<LocationSnapshot, TrackerError> {
        let records = self.records.read().await;
        if records.is_empty() {
            return Err(TrackerError::Empty);
        }
        Ok(records.clone())
    }

    pub async fn get_one(&self, identity: &str) -> Result<PositionRecord, TrackerError> {
        self.records
            .read()
            .await
            .get(identity)
            .cloned()
            .ok_or_else(|| TrackerError::NotFound(DriverId::from(identity)))
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}
