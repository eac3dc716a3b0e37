//! Two-phase home-location search.
//!
//! Phase 1 scores a regular grid with straight-line estimates (cheap, no
//! network, parallel). Phase 2 re-scores the best few candidates with live
//! routing, one request at a time, and keeps the lowest.

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, warn};

use crate::burden::{BlockDetail, Burden, BurdenEvaluator, TrackBurden};
use crate::config::{Bounds, SearchOptions};
use crate::error::{BurdenError, BurdenResult};
use crate::model::{LatLng, Track};
use crate::traits::RouteProvider;

/// `(grid_size + 1)^2` points from south-west to north-east, row by row
/// (latitude outer, longitude inner).
pub fn grid_points(bounds: &Bounds, grid_size: usize) -> Vec<LatLng> {
    if grid_size == 0 {
        return vec![LatLng::new(
            (bounds.north + bounds.south) / 2.0,
            (bounds.east + bounds.west) / 2.0,
        )];
    }

    let lat_step = (bounds.north - bounds.south) / grid_size as f64;
    let lng_step = (bounds.east - bounds.west) / grid_size as f64;
    let mut points = Vec::with_capacity((grid_size + 1) * (grid_size + 1));
    for i in 0..=grid_size {
        for j in 0..=grid_size {
            points.push(LatLng::new(
                bounds.south + lat_step * i as f64,
                bounds.west + lng_step * j as f64,
            ));
        }
    }
    points
}

/// A scored coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub point: LatLng,
    pub hours: f64,
}

/// Result of a two-phase search.
#[derive(Debug, Clone)]
pub struct SearchOutcome<T> {
    pub point: LatLng,
    pub burden: T,
    /// False when every refinement failed and the coarse score was kept.
    pub refined: bool,
    /// Phase-1 candidates that were sent to refinement, best first.
    pub shortlist: Vec<Candidate>,
}

trait Hours {
    fn hours(&self) -> f64;
}

impl Hours for Burden {
    fn hours(&self) -> f64 {
        self.hours
    }
}

impl Hours for TrackBurden {
    fn hours(&self) -> f64 {
        self.hours
    }
}

fn two_phase<T, C, R>(points: &[LatLng], refine_count: usize, coarse: C, mut refine: R) -> BurdenResult<SearchOutcome<T>>
where
    T: Hours + Send,
    C: Fn(LatLng) -> BurdenResult<T> + Sync,
    R: FnMut(LatLng) -> BurdenResult<T>,
{
    let mut scored = points
        .par_iter()
        .map(|&point| coarse(point).map(|burden| (point, burden)))
        .collect::<BurdenResult<Vec<_>>>()?;
    // Stable: equal scores keep grid order.
    scored.sort_by(|a, b| a.1.hours().total_cmp(&b.1.hours()));
    scored.truncate(refine_count.max(1));

    let shortlist: Vec<Candidate> = scored
        .iter()
        .map(|(point, burden)| Candidate {
            point: *point,
            hours: burden.hours(),
        })
        .collect();

    let mut best: Option<(LatLng, T)> = None;
    for (rank, candidate) in shortlist.iter().enumerate() {
        match refine(candidate.point) {
            Ok(burden) => {
                debug!(rank, coarse = candidate.hours, refined = burden.hours(), "refined candidate");
                // Strict comparison: ties go to the better coarse rank.
                let better = best.as_ref().is_none_or(|(_, current)| burden.hours() < current.hours());
                if better {
                    best = Some((candidate.point, burden));
                }
            }
            Err(err) => {
                warn!(rank, point = ?candidate.point, error = %err, "refinement failed, candidate skipped");
            }
        }
    }

    match best {
        Some((point, burden)) => Ok(SearchOutcome {
            point,
            burden,
            refined: true,
            shortlist,
        }),
        None => {
            let (point, burden) = scored
                .into_iter()
                .next()
                .ok_or_else(|| BurdenError::Config("empty search grid".to_string()))?;
            Ok(SearchOutcome {
                point,
                burden,
                refined: false,
                shortlist,
            })
        }
    }
}

/// Best home for a whole track.
pub fn search_track<P: RouteProvider>(
    evaluator: &BurdenEvaluator<'_, P>,
    track: &Track,
    options: &SearchOptions,
) -> BurdenResult<SearchOutcome<TrackBurden>> {
    let points = grid_points(&options.bounds, options.grid_size);
    let offline = evaluator.offline_router();
    let coarse = BurdenEvaluator::new(evaluator.context(), &offline, evaluator.cost_model().clone());

    two_phase(
        &points,
        options.refine_count,
        |point| coarse.evaluate_track(track, point, false),
        |point| evaluator.evaluate_track(track, point, true),
    )
}

/// Best home for a single block.
pub fn search_block<P: RouteProvider>(
    evaluator: &BurdenEvaluator<'_, P>,
    block: &str,
    options: &SearchOptions,
) -> BurdenResult<SearchOutcome<Burden>> {
    let points = grid_points(&options.bounds, options.grid_size);
    let offline = evaluator.offline_router();
    let coarse = BurdenEvaluator::new(evaluator.context(), &offline, evaluator.cost_model().clone());

    two_phase(
        &points,
        options.refine_count,
        |point| coarse.evaluate_named(block, point, false),
        |point| evaluator.evaluate_named(block, point, true),
    )
}

/// Per-track optimal-location record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackOptimum {
    pub track: String,
    pub optimal_location: LatLng,
    pub min_commute_burden: f64,
    pub total_miles: f64,
    pub total_weeks: f64,
    pub block_details: Vec<BlockDetail>,
    pub refined: bool,
}

/// Per-block optimal-location record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockOptimum {
    pub block: String,
    pub optimal_location: LatLng,
    /// Hours over the whole block at the optimal location.
    pub min_burden: f64,
    pub total_hours: f64,
    pub total_miles: f64,
    pub avg_hours_per_week: f64,
    pub block_length_weeks: f64,
    pub refined: bool,
}

pub fn optimize_track<P: RouteProvider>(
    evaluator: &BurdenEvaluator<'_, P>,
    track: &Track,
    options: &SearchOptions,
) -> BurdenResult<TrackOptimum> {
    let outcome = search_track(evaluator, track, options)?;
    Ok(TrackOptimum {
        track: track.name.clone(),
        optimal_location: outcome.point,
        min_commute_burden: outcome.burden.hours,
        total_miles: outcome.burden.miles,
        total_weeks: outcome.burden.weeks,
        block_details: outcome.burden.details,
        refined: outcome.refined,
    })
}

pub fn optimize_block<P: RouteProvider>(
    evaluator: &BurdenEvaluator<'_, P>,
    block: &str,
    options: &SearchOptions,
) -> BurdenResult<BlockOptimum> {
    let outcome = search_block(evaluator, block, options)?;
    let burden = outcome.burden;
    let avg_hours_per_week = if burden.weeks > 0.0 {
        burden.hours / burden.weeks
    } else {
        0.0
    };
    Ok(BlockOptimum {
        block: block.to_string(),
        optimal_location: outcome.point,
        min_burden: burden.hours,
        total_hours: burden.hours,
        total_miles: burden.miles,
        avg_hours_per_week,
        block_length_weeks: burden.weeks,
        refined: outcome.refined,
    })
}
