//! Checks a burden matrix against direct recomputation.

use serde::Serialize;
use tracing::{info, warn};

use crate::burden::BurdenEvaluator;
use crate::error::BurdenResult;
use crate::matrix::BurdenMatrix;
use crate::model::LatLng;
use crate::traits::RouteProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Verdict {
    Pass,
    Warn,
    Fail,
}

/// Percentage-difference limits for the verdict.
#[derive(Debug, Clone, Copy)]
pub struct Tolerance {
    pub pass_pct: f64,
    pub warn_pct: f64,
}

impl Default for Tolerance {
    fn default() -> Self {
        Self {
            pass_pct: 5.0,
            warn_pct: 10.0,
        }
    }
}

impl Tolerance {
    pub fn verdict(&self, pct: f64) -> Verdict {
        if pct < self.pass_pct {
            Verdict::Pass
        } else if pct < self.warn_pct {
            Verdict::Warn
        } else {
            Verdict::Fail
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FidelitySample {
    pub track: String,
    pub point: LatLng,
    pub matrix_hours: f64,
    pub recomputed_hours: f64,
    pub pct_diff: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FidelityReport {
    pub samples: Vec<FidelitySample>,
    pub max_pct_diff: f64,
    pub mean_pct_diff: f64,
    pub verdict: Verdict,
}

/// `|a - b| / b` in percent; zero reference only matches zero.
pub fn pct_diff(matrix_hours: f64, recomputed_hours: f64) -> f64 {
    if recomputed_hours == 0.0 {
        if matrix_hours == 0.0 { 0.0 } else { 100.0 }
    } else {
        (matrix_hours - recomputed_hours).abs() / recomputed_hours.abs() * 100.0
    }
}

/// Rows checked for one track: its matrix optimum plus `extra` evenly spaced rows.
fn sample_rows(best_row: usize, rows: usize, extra: usize) -> Vec<usize> {
    let mut sampled = vec![best_row];
    if extra > 0 && rows > 0 {
        let stride = (rows / extra).max(1);
        sampled.extend((0..rows).step_by(stride).take(extra).filter(|&row| row != best_row));
    }
    sampled
}

/// Compare matrix row sums with the evaluator for every track of the context.
pub fn validate_matrix<P: RouteProvider>(
    evaluator: &BurdenEvaluator<'_, P>,
    matrix: &BurdenMatrix,
    extra_rows_per_track: usize,
    allow_network: bool,
    tolerance: Tolerance,
) -> BurdenResult<FidelityReport> {
    let mut samples = Vec::new();

    for track in evaluator.context().tracks() {
        let columns = matrix.columns_for(track)?;
        let best = matrix.evaluate_columns(&columns)?;

        for row in sample_rows(best.row, matrix.burdens.len(), extra_rows_per_track) {
            let point = matrix.test_points[row];
            let matrix_hours = matrix.row_sum(row, &columns);
            let recomputed_hours = evaluator.evaluate_track(track, point, allow_network)?.hours;
            samples.push(FidelitySample {
                track: track.name.clone(),
                point,
                matrix_hours,
                recomputed_hours,
                pct_diff: pct_diff(matrix_hours, recomputed_hours),
            });
        }
    }

    let max_pct_diff = samples.iter().map(|sample| sample.pct_diff).fold(0.0, f64::max);
    let mean_pct_diff = if samples.is_empty() {
        0.0
    } else {
        samples.iter().map(|sample| sample.pct_diff).sum::<f64>() / samples.len() as f64
    };
    let verdict = tolerance.verdict(max_pct_diff);

    match verdict {
        Verdict::Pass => info!(samples = samples.len(), max_pct_diff, mean_pct_diff, "matrix fidelity PASS"),
        Verdict::Warn => warn!(samples = samples.len(), max_pct_diff, mean_pct_diff, "matrix fidelity WARN"),
        Verdict::Fail => warn!(samples = samples.len(), max_pct_diff, mean_pct_diff, "matrix fidelity FAIL"),
    }

    Ok(FidelityReport {
        samples,
        max_pct_diff,
        mean_pct_diff,
        verdict,
    })
}
