//! OSRM HTTP adapter for driving legs.

use std::time::Duration;

use serde::Deserialize;
use tracing::debug;

use crate::throttle::Throttle;
use crate::traits::{Leg, RouteProvider};

const METERS_PER_MILE: f64 = 1609.344;

#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    pub profile: String,
    pub timeout_secs: u64,
    /// Minimum delay between two requests, to respect the server's rate limit.
    pub min_spacing_ms: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
            min_spacing_ms: 200,
        }
    }
}

/// Clones share the connection pool; each clone paces its own requests.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
    throttle: Throttle,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        let throttle = Throttle::new(Duration::from_millis(config.min_spacing_ms));

        Ok(Self {
            config,
            client,
            throttle,
        })
    }

    fn route_url(&self, from: (f64, f64), to: (f64, f64)) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=false",
            self.config.base_url, self.config.profile, from.1, from.0, to.1, to.0
        )
    }
}

impl RouteProvider for OsrmClient {
    fn route(&self, from: (f64, f64), to: (f64, f64)) -> Option<Leg> {
        let url = self.route_url(from, to);

        let response = self.throttle.run(|| {
            self.client
                .get(&url)
                .send()
                .and_then(|resp| resp.error_for_status())
                .and_then(|resp| resp.json::<OsrmRouteResponse>())
        });

        match response {
            Ok(body) => {
                let leg = body.into_leg();
                if leg.is_none() {
                    debug!(%url, "OSRM response had no usable route");
                }
                leg
            }
            Err(err) => {
                debug!(%url, error = %err, "OSRM request failed");
                None
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct OsrmRouteResponse {
    code: Option<String>,
    routes: Option<Vec<OsrmRoute>>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    /// Meters.
    distance: f64,
    /// Seconds.
    duration: f64,
}

impl OsrmRouteResponse {
    fn into_leg(self) -> Option<Leg> {
        if self.code.as_deref().is_some_and(|code| code != "Ok") {
            return None;
        }
        let route = self.routes?.into_iter().next()?;
        if !route.distance.is_finite() || !route.duration.is_finite() || route.distance < 0.0 || route.duration < 0.0 {
            return None;
        }
        Some(Leg {
            miles: route.distance / METERS_PER_MILE,
            hours: route.duration / 3600.0,
        })
    }
}
