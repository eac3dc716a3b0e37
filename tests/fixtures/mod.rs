//! Test fixtures for commute-burden.
//!
//! Provides realistic test data including:
//! - Real central Florida hospital locations (from OpenStreetMap)
//! - A small rotation table and four tracks built on them

pub mod florida_sites;

pub use florida_sites::*;
