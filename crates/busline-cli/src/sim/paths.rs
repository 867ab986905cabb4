//! Route shapes a simulated bus can drive.

use std::f64::consts::PI;

/// Meters per degree of latitude (approximate).
const METERS_PER_DEG_LAT: f64 = 111_320.0;

/// A position over time for a simulated bus.
pub trait RoutePath: Send + Sync {
    /// (lat, lng) at `t` seconds from departure.
    fn position_at(&self, t: f64) -> (f64, f64);

    /// Seconds until the route is complete, if it ends.
    fn duration_s(&self) -> Option<f64> {
        None
    }
}

/// A loop around a center point, like a campus shuttle.
pub struct CircularRoute {
    pub center_lat: f64,
    pub center_lng: f64,
    pub radius_m: f64,
    pub speed_mps: f64,
    period_s: f64,
}

impl CircularRoute {
    pub fn new(center_lat: f64, center_lng: f64, radius_m: f64, speed_mps: f64) -> Self {
        let circumference = 2.0 * PI * radius_m;
        let period_s = if speed_mps > 0.0 {
            circumference / speed_mps
        } else {
            f64::INFINITY
        };

        Self {
            center_lat,
            center_lng,
            radius_m,
            speed_mps,
            period_s,
        }
    }

    /// Seconds for one full lap.
    pub fn period_s(&self) -> f64 {
        self.period_s
    }
}

impl RoutePath for CircularRoute {
    fn position_at(&self, t: f64) -> (f64, f64) {
        let angle = if self.period_s.is_finite() {
            2.0 * PI * t / self.period_s
        } else {
            0.0
        };

        let lat_offset = (self.radius_m / METERS_PER_DEG_LAT) * angle.cos();
        let lng_offset = (self.radius_m / (METERS_PER_DEG_LAT * self.center_lat.to_radians().cos()))
            * angle.sin();

        (self.center_lat + lat_offset, self.center_lng + lng_offset)
    }
}

/// Straight run from one stop to another; the bus waits at the end.
pub struct LinearRoute {
    pub start: (f64, f64),
    pub end: (f64, f64),
    pub speed_mps: f64,
    pub distance_m: f64,
    duration_s: f64,
}

impl LinearRoute {
    pub fn new(start: (f64, f64), end: (f64, f64), speed_mps: f64) -> Self {
        let distance_m = haversine_distance(start.0, start.1, end.0, end.1);
        let duration_s = if speed_mps > 0.0 {
            distance_m / speed_mps
        } else {
            0.0
        };

        Self {
            start,
            end,
            speed_mps,
            distance_m,
            duration_s,
        }
    }
}

impl RoutePath for LinearRoute {
    fn position_at(&self, t: f64) -> (f64, f64) {
        let progress = if self.duration_s > 0.0 {
            (t / self.duration_s).clamp(0.0, 1.0)
        } else {
            1.0
        };

        (
            self.start.0 + progress * (self.end.0 - self.start.0),
            self.start.1 + progress * (self.end.1 - self.start.1),
        )
    }

    fn duration_s(&self) -> Option<f64> {
        Some(self.duration_s)
    }
}

/// Great-circle distance in meters.
fn haversine_distance(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    const R: f64 = 6_371_000.0;

    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let dphi = (lat2 - lat1).to_radians();
    let dlambda = (lng2 - lng1).to_radians();

    let a = (dphi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (dlambda / 2.0).sin().powi(2);

    2.0 * R * a.sqrt().atan2((1.0 - a).sqrt())
}
