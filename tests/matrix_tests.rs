//! Burden matrix build, persistence and fidelity.

mod fixtures;

use std::cell::Cell;

use commute_burden::burden::BurdenEvaluator;
use commute_burden::config::{Bounds, CostModel, SearchOptions};
use commute_burden::haversine::HaversineEstimate;
use commute_burden::matrix::{BurdenMatrix, MatrixBuilder};
use commute_burden::router::Router;
use commute_burden::traits::{Leg, RouteProvider};
use commute_burden::validation::{Tolerance, Verdict, validate_matrix};

/// Straight-line estimate that counts how often it is asked.
struct Counting {
    inner: HaversineEstimate,
    calls: Cell<usize>,
}

impl Counting {
    fn new() -> Self {
        Self {
            inner: HaversineEstimate::new(35.0),
            calls: Cell::new(0),
        }
    }
}

impl RouteProvider for Counting {
    fn route(&self, from: (f64, f64), to: (f64, f64)) -> Option<Leg> {
        self.calls.set(self.calls.get() + 1);
        self.inner.route(from, to)
    }
}

fn options() -> SearchOptions {
    SearchOptions {
        grid_size: 4,
        ..SearchOptions::default()
    }
}

#[test]
fn matrix_shape_matches_grid_and_track_blocks() {
    let ctx = fixtures::context();
    let router = Router::new(HaversineEstimate::new(35.0), 30.0);
    let evaluator = BurdenEvaluator::new(&ctx, &router, CostModel::default());

    let matrix = MatrixBuilder::new(&evaluator, &options()).build().expect("matrix");
    assert_eq!(matrix.test_points.len(), 25);
    assert_eq!(matrix.burdens.len(), 25);
    assert_eq!(matrix.rotations, ctx.distinct_track_blocks());
    assert!(matrix.burdens.iter().all(|row| row.len() == matrix.rotations.len()));
    assert!(matrix.burdens.iter().flatten().all(|hours| *hours >= 0.0));
    assert!(matrix.is_complete());
}

#[test]
fn matrix_lookup_matches_recomputation() {
    let ctx = fixtures::context();
    let router = Router::new(HaversineEstimate::new(35.0), 30.0);
    let evaluator = BurdenEvaluator::new(&ctx, &router, CostModel::default());
    let matrix = MatrixBuilder::new(&evaluator, &options()).build().expect("matrix");

    let report = validate_matrix(&evaluator, &matrix, 5, true, Tolerance::default()).expect("report");
    assert_eq!(report.verdict, Verdict::Pass);
    assert!(report.max_pct_diff < 1e-6);
    assert!(report.samples.len() >= ctx.tracks().len());
}

#[test]
fn matrix_against_offline_recomputation_flags_drift() {
    let ctx = fixtures::context();
    // Network legs at half the fallback speed double every routed block.
    let router = Router::new(HaversineEstimate::new(15.0), 30.0);
    let evaluator = BurdenEvaluator::new(&ctx, &router, CostModel::default());
    let matrix = MatrixBuilder::new(&evaluator, &options()).build().expect("matrix");

    let report = validate_matrix(&evaluator, &matrix, 2, false, Tolerance::default()).expect("report");
    assert_eq!(report.verdict, Verdict::Fail);
}

#[test]
fn matrix_track_evaluation_returns_grid_argmin() {
    let ctx = fixtures::context();
    let router = Router::new(HaversineEstimate::new(35.0), 30.0);
    let evaluator = BurdenEvaluator::new(&ctx, &router, CostModel::default());
    let matrix = MatrixBuilder::new(&evaluator, &options()).build().expect("matrix");

    for track in ctx.tracks() {
        let estimate = matrix.evaluate_track(track).expect("estimate");
        for row in 0..matrix.test_points.len() {
            let direct = evaluator
                .evaluate_track(track, matrix.test_points[row], true)
                .expect("direct");
            assert!(estimate.burden <= direct.hours + 1e-9);
        }
        assert_eq!(estimate.point, matrix.test_points[estimate.row]);
    }
}

#[test]
fn build_to_persists_and_resumes() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("burden_matrix.json");
    let ctx = fixtures::context();

    let full = {
        let router = Router::new(Counting::new(), 30.0);
        let evaluator = BurdenEvaluator::new(&ctx, &router, CostModel::default());
        let matrix = MatrixBuilder::new(&evaluator, &options()).build_to(&path).expect("matrix");
        assert!(router.provider().calls.get() > 0);
        matrix
    };
    assert_eq!(BurdenMatrix::load(&path).expect("load"), full);

    // Simulate an interrupted run: keep only the first ten rows.
    let mut partial = full.clone();
    partial.burdens.truncate(10);
    partial.save(&path).expect("save");

    let router = Router::new(Counting::new(), 30.0);
    let evaluator = BurdenEvaluator::new(&ctx, &router, CostModel::default());
    let resumed = MatrixBuilder::new(&evaluator, &options()).build_to(&path).expect("resumed");
    let resumed_calls = router.provider().calls.get();

    let router = Router::new(Counting::new(), 30.0);
    let evaluator = BurdenEvaluator::new(&ctx, &router, CostModel::default());
    MatrixBuilder::new(&evaluator, &options()).build().expect("fresh");
    let fresh_calls = router.provider().calls.get();

    assert_eq!(resumed.burdens, full.burdens);
    assert!(resumed_calls < fresh_calls);
    assert_eq!(BurdenMatrix::load(&path).expect("load").burdens, full.burdens);
}

#[test]
fn incompatible_artifact_is_rebuilt() {
    let dir = tempfile::tempdir().expect("create temp dir");
    let path = dir.path().join("burden_matrix.json");
    let ctx = fixtures::context();
    let router = Router::new(HaversineEstimate::new(35.0), 30.0);
    let evaluator = BurdenEvaluator::new(&ctx, &router, CostModel::default());

    let other = SearchOptions {
        grid_size: 2,
        bounds: Bounds {
            north: 28.6,
            south: 28.0,
            east: -81.0,
            west: -81.6,
        },
        ..SearchOptions::default()
    };
    MatrixBuilder::new(&evaluator, &other).build_to(&path).expect("other");

    let matrix = MatrixBuilder::new(&evaluator, &options()).build_to(&path).expect("matrix");
    assert_eq!(matrix.test_points.len(), 25);
    assert!(matrix.is_complete());
}
