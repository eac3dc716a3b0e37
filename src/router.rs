//! Route resolution with the geodesic fallback, plus a memoising provider.

use std::collections::HashMap;
use std::sync::Mutex;

use tracing::debug;

use crate::haversine::HaversineEstimate;
use crate::traits::{Leg, RouteProvider};

/// A provider that never answers; every resolution uses the fallback.
#[derive(Debug, Clone, Copy, Default)]
pub struct Offline;

impl RouteProvider for Offline {
    fn route(&self, _from: (f64, f64), _to: (f64, f64)) -> Option<Leg> {
        None
    }
}

/// Resolves legs through a network provider, falling back to a straight-line
/// estimate whenever the network is not allowed or does not answer.
#[derive(Debug, Clone)]
pub struct Router<P> {
    provider: P,
    fallback: HaversineEstimate,
}

impl Router<Offline> {
    pub fn offline(fallback_speed_mph: f64) -> Self {
        Self::new(Offline, fallback_speed_mph)
    }
}

impl<P: RouteProvider> Router<P> {
    pub fn new(provider: P, fallback_speed_mph: f64) -> Self {
        Self {
            provider,
            fallback: HaversineEstimate::new(fallback_speed_mph),
        }
    }

    /// Never fails: provider errors degrade to the estimate.
    pub fn resolve(&self, origin: (f64, f64), destination: (f64, f64), allow_network: bool) -> Leg {
        if allow_network {
            if let Some(leg) = self.provider.route(origin, destination) {
                return leg;
            }
            debug!(?origin, ?destination, "routing unavailable, using straight-line estimate");
        }
        self.fallback.leg(origin, destination)
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }
}

/// Memoises successful legs of the wrapped provider by coordinate pair.
#[derive(Debug)]
pub struct CachedRoutes<P> {
    inner: P,
    cache: Mutex<HashMap<String, Leg>>,
}

impl<P: RouteProvider> CachedRoutes<P> {
    pub fn new(inner: P) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.cache.lock().map(|cache| cache.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<P: RouteProvider> RouteProvider for CachedRoutes<P> {
    fn route(&self, from: (f64, f64), to: (f64, f64)) -> Option<Leg> {
        let key = format!("{}|{}", location_key(from), location_key(to));
        if let Ok(cache) = self.cache.lock() {
            if let Some(leg) = cache.get(&key) {
                return Some(*leg);
            }
        }

        let leg = self.inner.route(from, to)?;
        if let Ok(mut cache) = self.cache.lock() {
            cache.insert(key, leg);
        }
        Some(leg)
    }
}

fn location_key(location: (f64, f64)) -> String {
    format!("{:.6},{:.6}", location.0, location.1)
}
