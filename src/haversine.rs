//! Great-circle distance and the assumed-speed travel estimate.
//!
//! Less accurate than a road network (ignores roads) but always available,
//! so it backs every routing failure.

use crate::traits::{Leg, RouteProvider};

/// Earth radius in miles.
const EARTH_RADIUS_MI: f64 = 3959.0;

/// Average driving speed assumption for time estimation.
const DEFAULT_SPEED_MPH: f64 = 30.0;

/// Haversine distance between two (lat, lng) points in miles.
pub fn distance_miles(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().min(1.0).asin();

    EARTH_RADIUS_MI * c
}

/// Straight-line distance at an assumed speed.
#[derive(Debug, Clone)]
pub struct HaversineEstimate {
    /// Assumed average driving speed in mph.
    pub speed_mph: f64,
}

impl Default for HaversineEstimate {
    fn default() -> Self {
        Self {
            speed_mph: DEFAULT_SPEED_MPH,
        }
    }
}

impl HaversineEstimate {
    pub fn new(speed_mph: f64) -> Self {
        Self { speed_mph }
    }

    pub fn leg(&self, from: (f64, f64), to: (f64, f64)) -> Leg {
        let miles = distance_miles(from, to);
        Leg {
            miles,
            hours: miles / self.speed_mph,
        }
    }
}

impl RouteProvider for HaversineEstimate {
    fn route(&self, from: (f64, f64), to: (f64, f64)) -> Option<Leg> {
        Some(self.leg(from, to))
    }
}
