//! Precomputed burden of every block at every grid point.
//!
//! Building the table costs one routed evaluation per (point, block) pair, so
//! it runs offline, persists after every row and resumes from a partial
//! artifact. Consumers only ever do lookups.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::burden::BurdenEvaluator;
use crate::config::{Bounds, SearchOptions};
use crate::error::{BurdenError, BurdenResult};
use crate::model::{LatLng, Track};
use crate::search::grid_points;
use crate::traits::RouteProvider;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatrixMetadata {
    pub grid_size: usize,
    pub bounds: Bounds,
    /// Unix seconds of the last write.
    pub generated_at: u64,
}

/// Rows are test points, columns are block ("rotation") names, cells are hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BurdenMatrix {
    pub metadata: MatrixMetadata,
    pub rotations: Vec<String>,
    pub test_points: Vec<LatLng>,
    /// May hold fewer rows than `test_points` while a build is in progress.
    pub burdens: Vec<Vec<f64>>,
}

/// Track burden at its best grid point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatrixEstimate {
    pub burden: f64,
    pub point: LatLng,
    pub row: usize,
}

impl BurdenMatrix {
    pub fn new(metadata: MatrixMetadata, rotations: Vec<String>, test_points: Vec<LatLng>, burdens: Vec<Vec<f64>>) -> BurdenResult<Self> {
        let matrix = Self {
            metadata,
            rotations,
            test_points,
            burdens,
        };
        matrix.check_shape()?;
        Ok(matrix)
    }

    fn check_shape(&self) -> BurdenResult<()> {
        if self.burdens.len() > self.test_points.len() {
            return Err(BurdenError::Config(format!(
                "matrix has {} rows for {} test points",
                self.burdens.len(),
                self.test_points.len()
            )));
        }
        if let Some((row, values)) = self
            .burdens
            .iter()
            .enumerate()
            .find(|(_, values)| values.len() != self.rotations.len())
        {
            return Err(BurdenError::Config(format!(
                "matrix row {} has {} columns, expected {}",
                row,
                values.len(),
                self.rotations.len()
            )));
        }
        Ok(())
    }

    pub fn is_complete(&self) -> bool {
        self.burdens.len() == self.test_points.len()
    }

    pub fn column(&self, block: &str) -> Option<usize> {
        self.rotations.iter().position(|name| name == block)
    }

    /// Column of every entry of `track`, in entry order.
    pub fn columns_for(&self, track: &Track) -> BurdenResult<Vec<usize>> {
        track
            .block_names()
            .map(|name| self.column(name).ok_or_else(|| BurdenError::BlockNotInMatrix(name.to_string())))
            .collect()
    }

    pub fn row_sum(&self, row: usize, columns: &[usize]) -> f64 {
        let values = &self.burdens[row];
        columns.iter().map(|&column| values[column]).sum()
    }

    /// Minimum row sum over the given columns. A partially built table is
    /// rejected since its minimum only covers the rows written so far.
    pub fn evaluate_columns(&self, columns: &[usize]) -> BurdenResult<MatrixEstimate> {
        if !self.is_complete() {
            return Err(BurdenError::Config(format!(
                "burden matrix is incomplete: {} of {} rows",
                self.burdens.len(),
                self.test_points.len()
            )));
        }
        let mut best: Option<MatrixEstimate> = None;
        for row in 0..self.burdens.len() {
            let burden = self.row_sum(row, columns);
            if best.is_none_or(|current| burden < current.burden) {
                best = Some(MatrixEstimate {
                    burden,
                    point: self.test_points[row],
                    row,
                });
            }
        }
        best.ok_or_else(|| BurdenError::Config("burden matrix has no rows".to_string()))
    }

    pub fn evaluate_track(&self, track: &Track) -> BurdenResult<MatrixEstimate> {
        let columns = self.columns_for(track)?;
        self.evaluate_columns(&columns)
    }

    pub fn load(path: &Path) -> BurdenResult<Self> {
        let reader = BufReader::new(File::open(path)?);
        let matrix: Self = serde_json::from_reader(reader)?;
        matrix.check_shape()?;
        Ok(matrix)
    }

    /// Writes through a temporary file so a crash never leaves a truncated artifact.
    pub fn save(&self, path: &Path) -> BurdenResult<()> {
        let tmp_path = path.with_extension("tmp");
        let mut writer = BufWriter::new(File::create(&tmp_path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        drop(writer);
        fs::rename(tmp_path, path)?;
        Ok(())
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|duration| duration.as_secs())
        .unwrap_or(0)
}

pub struct MatrixBuilder<'e, 'a, P> {
    evaluator: &'e BurdenEvaluator<'a, P>,
    bounds: Bounds,
    grid_size: usize,
}

impl<'e, 'a, P: RouteProvider> MatrixBuilder<'e, 'a, P> {
    pub fn new(evaluator: &'e BurdenEvaluator<'a, P>, options: &SearchOptions) -> Self {
        Self {
            evaluator,
            bounds: options.bounds,
            grid_size: options.grid_size,
        }
    }

    fn empty(&self) -> BurdenMatrix {
        BurdenMatrix {
            metadata: MatrixMetadata {
                grid_size: self.grid_size,
                bounds: self.bounds,
                generated_at: unix_now(),
            },
            rotations: self.evaluator.context().distinct_track_blocks(),
            test_points: grid_points(&self.bounds, self.grid_size),
            burdens: Vec::new(),
        }
    }

    fn compute_row(&self, rotations: &[String], point: LatLng) -> BurdenResult<Vec<f64>> {
        let ctx = self.evaluator.context();
        let mut row = Vec::with_capacity(rotations.len());
        for name in rotations {
            let hours = match ctx.block(name) {
                Some(block) => self.evaluator.evaluate(block, point, true)?.hours,
                None => {
                    warn!(block = %name, "block used by a track has no definition; column filled with zero");
                    0.0
                }
            };
            row.push(hours);
        }
        Ok(row)
    }

    fn fill(&self, matrix: &mut BurdenMatrix, mut on_row: impl FnMut(&BurdenMatrix) -> BurdenResult<()>) -> BurdenResult<()> {
        let total = matrix.test_points.len();
        while matrix.burdens.len() < total {
            let row = matrix.burdens.len();
            let values = self.compute_row(&matrix.rotations, matrix.test_points[row])?;
            matrix.burdens.push(values);
            matrix.metadata.generated_at = unix_now();
            on_row(&*matrix)?;
            info!(row = row + 1, total, "burden matrix row complete");
        }
        Ok(())
    }

    /// Build the whole table in memory.
    pub fn build(&self) -> BurdenResult<BurdenMatrix> {
        let mut matrix = self.empty();
        self.fill(&mut matrix, |_| Ok(()))?;
        Ok(matrix)
    }

    /// Build into `path`, saving after every row and resuming from a compatible
    /// partial artifact already there.
    pub fn build_to(&self, path: &Path) -> BurdenResult<BurdenMatrix> {
        let fresh = self.empty();
        let mut matrix = match BurdenMatrix::load(path) {
            Ok(existing) if self.compatible(&existing, &fresh) => {
                info!(rows = existing.burdens.len(), total = existing.test_points.len(), "resuming burden matrix");
                existing
            }
            Ok(_) => {
                warn!(path = %path.display(), "existing burden matrix does not match this configuration; rebuilding");
                fresh
            }
            Err(BurdenError::Io(_)) => fresh,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "unreadable burden matrix; rebuilding");
                fresh
            }
        };

        self.fill(&mut matrix, |partial| partial.save(path))?;
        if matrix.burdens.is_empty() {
            matrix.save(path)?;
        }
        Ok(matrix)
    }

    fn compatible(&self, existing: &BurdenMatrix, fresh: &BurdenMatrix) -> bool {
        existing.metadata.grid_size == fresh.metadata.grid_size
            && existing.metadata.bounds == fresh.metadata.bounds
            && existing.rotations == fresh.rotations
            && existing.test_points == fresh.test_points
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matrix() -> BurdenMatrix {
        BurdenMatrix::new(
            MatrixMetadata {
                grid_size: 1,
                bounds: Bounds::default(),
                generated_at: 0,
            },
            vec!["A".to_string(), "B".to_string(), "C".to_string()],
            vec![LatLng::new(0.0, 0.0), LatLng::new(1.0, 0.0), LatLng::new(2.0, 0.0)],
            vec![vec![1.0, 5.0, 2.0], vec![3.0, 1.0, 1.0], vec![0.5, 4.0, 9.0]],
        )
        .expect("matrix")
    }

    #[test]
    fn test_evaluate_columns_returns_argmin() {
        let m = matrix();
        let estimate = m.evaluate_columns(&[0, 1]).expect("estimate");
        assert_eq!(estimate.row, 1);
        assert_eq!(estimate.burden, 4.0);
        assert_eq!(estimate.point, LatLng::new(1.0, 0.0));

        let single = m.evaluate_columns(&[0]).expect("estimate");
        assert_eq!(single.row, 2);
    }

    #[test]
    fn test_repeated_columns_count_twice() {
        let m = matrix();
        assert_eq!(m.row_sum(0, &[0, 0, 2]), 4.0);
    }

    #[test]
    fn test_unknown_block_is_reported() {
        let m = matrix();
        let track = Track::new("T", vec![crate::model::TrackEntry::new("1", "Z")]);
        match m.evaluate_track(&track) {
            Err(BurdenError::BlockNotInMatrix(name)) => assert_eq!(name, "Z"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_shape_is_checked() {
        let result = BurdenMatrix::new(
            MatrixMetadata {
                grid_size: 0,
                bounds: Bounds::default(),
                generated_at: 0,
            },
            vec!["A".to_string()],
            vec![LatLng::new(0.0, 0.0)],
            vec![vec![1.0, 2.0]],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_artifact_field_names() {
        let json = serde_json::to_value(matrix()).expect("json");
        assert!(json.get("testPoints").is_some());
        assert!(json.get("rotations").is_some());
        assert!(json["metadata"].get("gridSize").is_some());
        assert!(json["metadata"].get("generatedAt").is_some());
        assert_eq!(json["testPoints"][1]["lat"], 1.0);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("matrix.json");
        let m = matrix();
        m.save(&path).expect("save");
        assert_eq!(BurdenMatrix::load(&path).expect("load"), m);
        assert!(!path.with_extension("tmp").exists());
    }

    #[test]
    fn test_reload_keeps_every_bit() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("matrix.json");
        let mut m = matrix();
        m.burdens[0] = vec![219.74510380064697, 203.16982723033232, 0.1 + 0.2];
        m.burdens[1] = vec![1.0 / 3.0, 2.0_f64.sqrt() * 71.3, 1e-17 + 88.88888888888889];
        m.save(&path).expect("save");

        let loaded = BurdenMatrix::load(&path).expect("load");
        for (saved, reloaded) in m.burdens.iter().flatten().zip(loaded.burdens.iter().flatten()) {
            assert_eq!(saved.to_bits(), reloaded.to_bits());
        }
    }

    #[test]
    fn test_partial_matrix_is_not_evaluated() {
        let mut m = matrix();
        m.burdens.truncate(2);
        assert!(!m.is_complete());
        match m.evaluate_columns(&[0, 1]) {
            Err(BurdenError::Config(message)) => assert!(message.contains("2 of 3")),
            other => panic!("unexpected {other:?}"),
        }
        let track = Track::new("T", vec![crate::model::TrackEntry::new("1", "A")]);
        assert!(m.evaluate_track(&track).is_err());
    }
}
