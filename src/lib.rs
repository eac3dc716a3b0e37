//! commute-burden core
//!
//! Annual commute cost of rotation schedules, the best home location for a
//! schedule, and reassignment of blocks across schedules to lower the total.

pub mod traits;
pub mod config;
pub mod error;
pub mod model;
pub mod haversine;
pub mod throttle;
pub mod osrm;
pub mod router;
pub mod burden;
pub mod search;
pub mod matrix;
pub mod optimizer;
pub mod loader;
pub mod validation;

pub use error::{BurdenError, BurdenResult};
