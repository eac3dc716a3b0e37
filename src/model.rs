//! Domain model: locations, classified blocks, tracks and the immutable
//! context they are evaluated in.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ClassificationRules;

/// A WGS-84 coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// A named site.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub position: LatLng,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            position: LatLng::new(lat, lng),
        }
    }
}

/// A block as it appears in the variance table, before classification.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSpec {
    pub name: String,
    pub sites: Vec<String>,
    pub weeks: u32,
    pub weekday_exception: bool,
}

impl BlockSpec {
    pub fn new(name: impl Into<String>, sites: &[&str], weeks: u32, weekday_exception: bool) -> Self {
        Self {
            name: name.into(),
            sites: sites.iter().map(|site| site.to_string()).collect(),
            weeks,
            weekday_exception,
        }
    }
}

/// How a block's burden is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Regular,
    /// On-site housing; no commute.
    ZeroCommute,
    /// Follows the configured fixed multi-site visit schedule.
    FixedMultiSite,
    /// Site not assigned yet; estimated from resolved siblings.
    Unresolved,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub sites: Vec<String>,
    pub weeks: u32,
    pub weekday_exception: bool,
    /// Leading type label, used to gate swaps and match siblings.
    pub category: String,
    pub kind: BlockKind,
}

impl Block {
    pub fn classify(spec: BlockSpec, rules: &ClassificationRules) -> Self {
        let category = type_label(&spec.name).to_string();

        let unresolved = spec.name.contains(&rules.unresolved_marker)
            || spec.sites.iter().any(|site| site.contains(&rules.unresolved_marker));
        let zero_commute = spec
            .sites
            .iter()
            .any(|site| rules.zero_commute_sites.iter().any(|zero| zero == site));

        let kind = if unresolved {
            BlockKind::Unresolved
        } else if category == rules.fixed_multi_site_category {
            BlockKind::FixedMultiSite
        } else if zero_commute {
            BlockKind::ZeroCommute
        } else {
            BlockKind::Regular
        };

        Self {
            name: spec.name,
            sites: spec.sites,
            weeks: spec.weeks,
            weekday_exception: spec.weekday_exception,
            category,
            kind,
        }
    }
}

/// Text before the first `@`, trimmed. `"Elective @ Site A"` has label `"Elective"`.
pub fn type_label(name: &str) -> &str {
    name.split('@').next().unwrap_or(name).trim()
}

/// One scheduled block, occupying one or more adjacent time slots.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackEntry {
    pub slots: Vec<String>,
    pub block: String,
}

impl TrackEntry {
    pub fn new(slot: impl Into<String>, block: impl Into<String>) -> Self {
        Self {
            slots: vec![slot.into()],
            block: block.into(),
        }
    }

    pub fn spanning(slots: &[&str], block: impl Into<String>) -> Self {
        Self {
            slots: slots.iter().map(|slot| slot.to_string()).collect(),
            block: block.into(),
        }
    }
}

/// One person's schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub name: String,
    pub entries: Vec<TrackEntry>,
}

impl Track {
    pub fn new(name: impl Into<String>, entries: Vec<TrackEntry>) -> Self {
        Self {
            name: name.into(),
            entries,
        }
    }

    pub fn block_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.block.as_str())
    }
}

/// Immutable configuration every evaluator reads from.
#[derive(Debug, Clone)]
pub struct Context {
    locations: HashMap<String, LatLng>,
    blocks: Vec<Block>,
    block_index: HashMap<String, usize>,
    tracks: Vec<Track>,
    rules: ClassificationRules,
}

impl Context {
    pub fn new(
        locations: Vec<Location>,
        block_specs: Vec<BlockSpec>,
        tracks: Vec<Track>,
        rules: ClassificationRules,
    ) -> Self {
        let locations = locations
            .into_iter()
            .map(|location| (location.name, location.position))
            .collect();

        let mut blocks = Vec::with_capacity(block_specs.len());
        let mut block_index = HashMap::new();
        for spec in block_specs {
            if block_index.contains_key(&spec.name) {
                warn!(block = %spec.name, "duplicate block definition ignored");
                continue;
            }
            block_index.insert(spec.name.clone(), blocks.len());
            blocks.push(Block::classify(spec, &rules));
        }

        Self {
            locations,
            blocks,
            block_index,
            tracks,
            rules,
        }
    }

    pub fn location(&self, name: &str) -> Option<LatLng> {
        self.locations.get(name).copied()
    }

    pub fn block(&self, name: &str) -> Option<&Block> {
        self.block_index.get(name).map(|&index| &self.blocks[index])
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, name: &str) -> Option<&Track> {
        self.tracks.iter().find(|track| track.name == name)
    }

    pub fn rules(&self) -> &ClassificationRules {
        &self.rules
    }

    /// Resolved blocks whose name starts with `label`, in definition order.
    pub fn resolved_siblings<'a>(&'a self, label: &'a str) -> impl Iterator<Item = &'a Block> + 'a {
        self.blocks
            .iter()
            .filter(move |block| block.kind != BlockKind::Unresolved && block.name.starts_with(label))
    }

    /// Distinct block names used by any track, in order of first appearance.
    pub fn distinct_track_blocks(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut names = Vec::new();
        for track in &self.tracks {
            for name in track.block_names() {
                if seen.insert(name) {
                    names.push(name.to_string());
                }
            }
        }
        names
    }
}
