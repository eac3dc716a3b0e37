//! Tunable constants of the cost model and the two searches.

use serde::{Deserialize, Serialize};

/// Constants of the commute cost model.
#[derive(Debug, Clone)]
pub struct CostModel {
    /// Daily trip multiplier for a regular block.
    pub standard_trip_multiplier: f64,
    /// Daily trip multiplier when the weekday exception applies.
    pub weekday_exception_trip_multiplier: f64,
    /// Commuting days per week.
    pub workdays_per_week: f64,
    /// Assumed average speed (mph) for the geodesic fallback.
    pub fallback_speed_mph: f64,
}

impl Default for CostModel {
    fn default() -> Self {
        Self {
            standard_trip_multiplier: 3.0,
            weekday_exception_trip_multiplier: 2.0,
            workdays_per_week: 5.0,
            fallback_speed_mph: 30.0,
        }
    }
}

/// One stop of the fixed multi-site schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct FixedSiteVisit {
    pub site: String,
    pub visits: u32,
}

impl FixedSiteVisit {
    pub fn new(site: impl Into<String>, visits: u32) -> Self {
        Self {
            site: site.into(),
            visits,
        }
    }
}

/// Rules used once at load time to tag blocks.
#[derive(Debug, Clone)]
pub struct ClassificationRules {
    /// Sites with on-site housing; blocks there cost nothing.
    pub zero_commute_sites: Vec<String>,
    /// Marker in a block name or site list meaning the site is not assigned yet.
    pub unresolved_marker: String,
    /// Category label of the block that follows the fixed multi-site schedule.
    pub fixed_multi_site_category: String,
    /// Sites visited by the fixed multi-site block and how often. Must be
    /// set before any such block is evaluated; the default is empty.
    pub fixed_multi_site_schedule: Vec<FixedSiteVisit>,
}

impl Default for ClassificationRules {
    fn default() -> Self {
        Self {
            zero_commute_sites: vec!["Nemours Children's Hospital".to_string()],
            unresolved_marker: "To Be Determined".to_string(),
            fixed_multi_site_category: "Pediatrics".to_string(),
            fixed_multi_site_schedule: Vec::new(),
        }
    }
}

/// Geographic bounding box of the home-location grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Default for Bounds {
    /// Central Florida, covering the clinical sites of the default configuration.
    fn default() -> Self {
        Self {
            north: 29.5,
            south: 27.0,
            east: -80.5,
            west: -82.9,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SearchOptions {
    pub bounds: Bounds,
    /// Cells per side; the grid has `(grid_size + 1)^2` points.
    pub grid_size: usize,
    /// Coarse candidates re-evaluated with live routing.
    pub refine_count: usize,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            bounds: Bounds::default(),
            grid_size: 20,
            refine_count: 5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AnnealOptions {
    pub iterations: usize,
    /// Starting temperature, in hours of burden.
    pub initial_temperature: f64,
    /// Geometric cooling factor applied after every iteration.
    pub cooling_rate: f64,
    pub seed: u64,
}

impl Default for AnnealOptions {
    fn default() -> Self {
        Self {
            iterations: 10_000,
            initial_temperature: 50.0,
            cooling_rate: 0.9995,
            seed: 0,
        }
    }
}
