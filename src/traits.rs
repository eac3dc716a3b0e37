//! Seams between the cost model and its routing backends.

/// A one-way driving leg.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Leg {
    pub miles: f64,
    pub hours: f64,
}

impl Leg {
    pub const ZERO: Leg = Leg {
        miles: 0.0,
        hours: 0.0,
    };
}

/// Provides a driving leg between two (lat, lng) points.
///
/// Returns `None` when the backend cannot answer; callers substitute an
/// estimate instead of failing.
pub trait RouteProvider {
    fn route(&self, from: (f64, f64), to: (f64, f64)) -> Option<Leg>;
}

impl<P: RouteProvider + ?Sized> RouteProvider for &P {
    fn route(&self, from: (f64, f64), to: (f64, f64)) -> Option<Leg> {
        (**self).route(from, to)
    }
}

impl<P: RouteProvider + ?Sized> RouteProvider for Box<P> {
    fn route(&self, from: (f64, f64), to: (f64, f64)) -> Option<Leg> {
        (**self).route(from, to)
    }
}
