//! Core data models for the busline service.

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Duration, Local, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;

/// Exact-second, local-time format used for `PositionRecord::captured_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Opaque driver account identifier. Compared byte-for-byte.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverId(String);

impl DriverId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DriverId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for DriverId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<String> for DriverId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for DriverId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Most recent position reported by one driver.
///
/// Field names on the wire (and in the persisted snapshot) are the short
/// forms existing clients already consume: `lat`, `lng`, `accuracy`,
/// `timestamp`, `driver`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRecord {
    #[serde(rename = "lat")]
    pub latitude: f64,
    #[serde(rename = "lng")]
    pub longitude: f64,
    /// Reported accuracy radius in meters.
    #[serde(default)]
    pub accuracy: f64,
    #[serde(rename = "timestamp")]
    pub captured_at: String,
    #[serde(rename = "driver")]
    pub owner: DriverId,
}

impl PositionRecord {
    /// Build a record captured at `now`.
    ///
    /// Latitude and longitude only need to be finite; out-of-range values
    /// are stored as reported. Accuracy must be finite and non-negative.
    pub fn new(
        owner: DriverId,
        latitude: f64,
        longitude: f64,
        accuracy: f64,
        now: &DateTime<Local>,
    ) -> Result<Self, TrackerError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(TrackerError::validation("invalid lat/lng"));
        }
        if !accuracy.is_finite() || accuracy < 0.0 {
            return Err(TrackerError::validation("invalid accuracy"));
        }

        Ok(Self {
            latitude,
            longitude,
            accuracy,
            captured_at: format_captured_at(now),
            owner,
        })
    }
}

/// Render a capture instant the way records store it.
pub fn format_captured_at(now: &DateTime<Local>) -> String {
    now.format(TIMESTAMP_FORMAT).to_string()
}

/// An authenticated driver session, resolved by the request layer and
/// handed to the operations that need an identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub driver: DriverId,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn new(driver: DriverId, now: DateTime<Utc>, ttl: Duration) -> Self {
        Self {
            driver,
            expires_at: now
                .checked_add_signed(ttl)
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 3, 9, h, m, s)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn record_serializes_with_short_field_names() {
        let record =
            PositionRecord::new(DriverId::from("driver1"), 40.0, -73.0, 5.0, &at(8, 15, 2))
                .unwrap();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(
            value,
            serde_json::json!({
                "lat": 40.0,
                "lng": -73.0,
                "accuracy": 5.0,
                "timestamp": "2024-03-09 08:15:02",
                "driver": "driver1"
            })
        );
    }

    #[test]
    fn record_accepts_out_of_range_coordinates() {
        let record =
            PositionRecord::new(DriverId::from("bus"), 123.4, -500.0, 0.0, &at(0, 0, 0)).unwrap();
        assert_eq!(record.latitude, 123.4);
        assert_eq!(record.longitude, -500.0);
    }

    #[test]
    fn record_rejects_non_finite_coordinates() {
        let now = at(12, 0, 0);
        for (lat, lng) in [(f64::NAN, 1.0), (1.0, f64::INFINITY), (f64::NEG_INFINITY, 0.0)] {
            let err = PositionRecord::new(DriverId::from("bus"), lat, lng, 0.0, &now).unwrap_err();
            assert!(matches!(err, TrackerError::Validation(_)));
        }
    }

    #[test]
    fn record_rejects_negative_accuracy() {
        let err = PositionRecord::new(DriverId::from("bus"), 1.0, 2.0, -3.0, &at(12, 0, 0))
            .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
    }

    #[test]
    fn missing_accuracy_deserializes_as_zero() {
        let record: PositionRecord = serde_json::from_value(serde_json::json!({
            "lat": 1.5,
            "lng": 2.5,
            "timestamp": "2024-01-01 00:00:00",
            "driver": "driver2"
        }))
        .unwrap();
        assert_eq!(record.accuracy, 0.0);
        assert_eq!(record.owner.as_str(), "driver2");
    }

    #[test]
    fn driver_ids_are_not_normalized() {
        assert_ne!(DriverId::from("driver1"), DriverId::from("Driver1"));
        assert_ne!(DriverId::from("driver1"), DriverId::from("driver1 "));
    }

    #[test]
    fn session_expires_at_ttl() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let session = Session::new(DriverId::from("driver1"), now, Duration::minutes(30));

        assert!(!session.is_expired(now + Duration::minutes(29)));
        assert!(session.is_expired(now + Duration::minutes(30)));
    }
}
