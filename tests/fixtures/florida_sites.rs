//! Central Florida clinical sites and a small schedule built on them.
//!
//! Coordinates are approximate building locations from OpenStreetMap.

#![allow(dead_code)]

use commute_burden::config::{ClassificationRules, FixedSiteVisit};
use commute_burden::model::{BlockSpec, Context, LatLng, Location, Track, TrackEntry};

/// A named site with coordinates.
#[derive(Debug, Clone)]
pub struct Site {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Site {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn position(&self) -> LatLng {
        LatLng::new(self.lat, self.lng)
    }
}

pub const NEMOURS: &str = "Nemours Children's Hospital";
pub const ORLANDO_HEALTH: &str = "Orlando Health ORMC";
pub const ADVENT_ORLANDO: &str = "AdventHealth Orlando";
pub const TAMPA_GENERAL: &str = "Tampa General Hospital";
pub const LAKELAND: &str = "Lakeland Regional Health";
pub const OSCEOLA: &str = "Osceola Regional Medical Center";
pub const HALIFAX: &str = "Halifax Health Daytona";

// ============================================================================
// Hospitals
// ============================================================================

pub const SITES: &[Site] = &[
    Site::new(NEMOURS, 28.3772, -81.2733),
    Site::new(ORLANDO_HEALTH, 28.5264, -81.3781),
    Site::new(ADVENT_ORLANDO, 28.5745, -81.3686),
    Site::new(TAMPA_GENERAL, 27.9373, -82.4594),
    Site::new(LAKELAND, 28.0630, -81.9555),
    Site::new(OSCEOLA, 28.2983, -81.4040),
    Site::new(HALIFAX, 29.2006, -81.0536),
];

// ============================================================================
// Home candidates
// ============================================================================

pub const HOMES: &[Site] = &[
    Site::new("Downtown Orlando", 28.5383, -81.3792),
    Site::new("Kissimmee", 28.2920, -81.4076),
    Site::new("Winter Haven", 28.0222, -81.7329),
    Site::new("Brandon", 27.9378, -82.2859),
    Site::new("Sanford", 28.8003, -81.2731),
];

pub fn locations() -> Vec<Location> {
    SITES
        .iter()
        .map(|site| Location::new(site.name, site.lat, site.lng))
        .collect()
}

pub fn blocks() -> Vec<BlockSpec> {
    vec![
        BlockSpec::new("Surgery @ Orlando", &[ORLANDO_HEALTH], 4, false),
        BlockSpec::new("Surgery @ Tampa", &[TAMPA_GENERAL], 4, false),
        BlockSpec::new("Surgery @ Nemours", &[NEMOURS], 4, false),
        BlockSpec::new("Medicine @ AdventHealth", &[ADVENT_ORLANDO], 4, true),
        BlockSpec::new("Medicine @ Lakeland", &[LAKELAND], 4, true),
        BlockSpec::new("Medicine @ Split", &[ADVENT_ORLANDO, LAKELAND], 4, false),
        BlockSpec::new("Elective @ Osceola", &[OSCEOLA], 4, false),
        BlockSpec::new("Elective @ Daytona", &[HALIFAX], 4, false),
        BlockSpec::new("Elective @ To Be Determined", &["To Be Determined"], 4, false),
        BlockSpec::new("Pediatrics", &[NEMOURS], 4, false),
    ]
}

pub fn rules() -> ClassificationRules {
    ClassificationRules {
        fixed_multi_site_schedule: vec![
            FixedSiteVisit::new(NEMOURS, 2),
            FixedSiteVisit::new(ORLANDO_HEALTH, 2),
            FixedSiteVisit::new(OSCEOLA, 1),
        ],
        ..ClassificationRules::default()
    }
}

pub fn tracks() -> Vec<Track> {
    vec![
        Track::new(
            "Track 1",
            vec![
                TrackEntry::new("1", "Surgery @ Tampa"),
                TrackEntry::new("2", "Medicine @ AdventHealth"),
                TrackEntry::new("3", "Elective @ Daytona"),
                TrackEntry::new("4", "Pediatrics"),
            ],
        ),
        Track::new(
            "Track 2",
            vec![
                TrackEntry::new("1", "Surgery @ Orlando"),
                TrackEntry::new("2", "Medicine @ Lakeland"),
                TrackEntry::new("3", "Elective @ Osceola"),
                TrackEntry::new("4", "Pediatrics"),
            ],
        ),
        Track::new(
            "Track 3",
            vec![
                TrackEntry::new("1", "Surgery @ Nemours"),
                TrackEntry::new("2", "Medicine @ Split"),
                TrackEntry::new("3", "Elective @ To Be Determined"),
                TrackEntry::new("4", "Surgery @ Tampa"),
            ],
        ),
        Track::new(
            "Track 4",
            vec![
                TrackEntry::new("1", "Surgery @ Orlando"),
                TrackEntry::new("2", "Medicine @ Lakeland"),
                TrackEntry::spanning(&["3", "4"], "Elective @ Daytona"),
            ],
        ),
    ]
}

pub fn context() -> Context {
    Context::new(locations(), blocks(), tracks(), rules())
}
