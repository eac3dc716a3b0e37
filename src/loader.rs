//! CSV configuration tables.
//!
//! # Locations.csv
//!
//! ```csv
//! name,latitude,longitude
//! Nemours Children's Hospital,28.3772,-81.2733
//! ```
//!
//! # Variance.csv
//!
//! ```csv
//! rotation,sites,weeks,weekday_exception
//! Surgery @ Orlando,"Orlando Health,AdventHealth Orlando",4,n
//! ```
//!
//! `sites` is a comma-separated list inside one field. `weekday_exception`
//! is `y` or `n`.
//!
//! # Tracks.csv
//!
//! ```csv
//! track,Block 1,Block 2,Block 3
//! Track A,Surgery @ Orlando,Surgery @ Orlando,Medicine @ Tampa
//! ```
//!
//! Each row is one track; columns after the first are time slots. Empty
//! cells are skipped. Adjacent cells naming the same block form one entry
//! spanning those slots, and that entry is costed once for the block's
//! `weeks`. A track that really holds two back-to-back instances of a
//! one-slot block must name them differently (for example `Surgery @ Orlando`
//! and `Surgery @ Orlando II`), otherwise the pair counts as one block.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use serde::Deserialize;

use crate::config::ClassificationRules;
use crate::error::{BurdenError, BurdenResult};
use crate::model::{BlockSpec, Context, Location, Track, TrackEntry};

pub const LOCATIONS_FILE: &str = "Locations.csv";
pub const VARIANCE_FILE: &str = "Variance.csv";
pub const TRACKS_FILE: &str = "Tracks.csv";

#[derive(Deserialize)]
struct LocationRecord {
    #[serde(alias = "Name", alias = "location", alias = "Location")]
    name: String,
    #[serde(alias = "Latitude", alias = "lat")]
    latitude: f64,
    #[serde(alias = "Longitude", alias = "lng", alias = "lon")]
    longitude: f64,
}

#[derive(Deserialize)]
struct VarianceRecord {
    #[serde(alias = "Rotation", alias = "block", alias = "Block")]
    rotation: String,
    #[serde(alias = "Sites", alias = "locations", alias = "Locations")]
    sites: String,
    #[serde(alias = "Weeks", alias = "block_length")]
    weeks: u32,
    #[serde(alias = "Weekday Exception", alias = "weekday")]
    weekday_exception: String,
}

pub fn read_locations<R: Read>(reader: R) -> BurdenResult<Vec<Location>> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut locations = Vec::new();
    for record in csv.deserialize::<LocationRecord>() {
        let record = record?;
        locations.push(Location::new(record.name, record.latitude, record.longitude));
    }
    Ok(locations)
}

pub fn read_blocks<R: Read>(reader: R) -> BurdenResult<Vec<BlockSpec>> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut blocks = Vec::new();
    for record in csv.deserialize::<VarianceRecord>() {
        let record = record?;
        let weekday_exception = parse_flag(&record.weekday_exception).ok_or_else(|| {
            BurdenError::Config(format!(
                "block {:?}: weekday exception must be y or n, got {:?}",
                record.rotation, record.weekday_exception
            ))
        })?;
        let sites = record
            .sites
            .split(',')
            .map(str::trim)
            .filter(|site| !site.is_empty())
            .map(str::to_string)
            .collect();
        blocks.push(BlockSpec {
            name: record.rotation,
            sites,
            weeks: record.weeks,
            weekday_exception,
        });
    }
    Ok(blocks)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => Some(true),
        "n" | "no" | "" => Some(false),
        _ => None,
    }
}

pub fn read_tracks<R: Read>(reader: R) -> BurdenResult<Vec<Track>> {
    let mut csv = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);
    let slots: Vec<String> = csv.headers()?.iter().skip(1).map(str::to_string).collect();

    let mut tracks = Vec::new();
    for record in csv.records() {
        let record = record?;
        let mut cells = record.iter();
        let Some(name) = cells.next().filter(|name| !name.is_empty()) else {
            continue;
        };

        let mut entries: Vec<TrackEntry> = Vec::new();
        let mut previous_filled = false;
        for (slot, block) in slots.iter().zip(cells) {
            if block.is_empty() {
                previous_filled = false;
                continue;
            }
            let continues = previous_filled && entries.last().is_some_and(|last| last.block == block);
            if continues {
                if let Some(last) = entries.last_mut() {
                    last.slots.push(slot.clone());
                }
            } else {
                entries.push(TrackEntry::new(slot.clone(), block));
            }
            previous_filled = true;
        }
        tracks.push(Track::new(name, entries));
    }
    Ok(tracks)
}

/// Writes tracks in the `Tracks.csv` shape; multi-slot entries repeat in each slot.
/// Two adjacent entries with the same block name read back as one entry.
pub fn write_tracks<W: Write>(tracks: &[Track], writer: W) -> BurdenResult<()> {
    let mut slots: Vec<&str> = Vec::new();
    for track in tracks {
        for entry in &track.entries {
            for slot in &entry.slots {
                if !slots.contains(&slot.as_str()) {
                    slots.push(slot);
                }
            }
        }
    }

    let mut csv = csv::Writer::from_writer(writer);
    let mut header = vec!["track"];
    header.extend(slots.iter().copied());
    csv.write_record(&header)?;

    for track in tracks {
        let mut row = vec![""; slots.len() + 1];
        row[0] = track.name.as_str();
        for entry in &track.entries {
            for slot in &entry.slots {
                if let Some(column) = slots.iter().position(|name| name == slot) {
                    row[column + 1] = entry.block.as_str();
                }
            }
        }
        csv.write_record(&row)?;
    }
    csv.flush()?;
    Ok(())
}

/// Reads the three tables from `dir` and classifies the blocks.
pub fn load_context(dir: &Path, rules: ClassificationRules) -> BurdenResult<Context> {
    let locations = read_locations(File::open(dir.join(LOCATIONS_FILE))?)?;
    let blocks = read_blocks(File::open(dir.join(VARIANCE_FILE))?)?;
    let tracks = read_tracks(File::open(dir.join(TRACKS_FILE))?)?;
    Ok(Context::new(locations, blocks, tracks, rules))
}
