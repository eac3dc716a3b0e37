//! Block reassignment across tracks by simulated annealing.
//!
//! Every move picks a time slot and exchanges the blocks two tracks hold in
//! it. A move is legal only when both entries share a category and cover the
//! exact same time slots, so the number of instances of each block per slot
//! never changes. Track costs come from the burden matrix, which keeps each
//! move evaluation free of I/O.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::AnnealOptions;
use crate::error::BurdenResult;
use crate::matrix::BurdenMatrix;
use crate::model::{Context, LatLng, Track, TrackEntry, type_label};

#[derive(Debug, Clone)]
struct BlockSlot {
    entry: TrackEntry,
    category: String,
}

#[derive(Debug, Clone)]
struct WorkingTrack {
    name: String,
    slots: Vec<BlockSlot>,
    /// Matrix column of each slot's block.
    columns: Vec<usize>,
    burden: f64,
    point: LatLng,
}

/// Why a proposed exchange was not applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapRejection {
    SameTrack,
    /// One of the tracks has no entry covering that slot.
    MissingSlot,
    CategoryMismatch,
    SlotMismatch,
    /// Both entries already hold the same block.
    Identical,
}

/// An applied exchange; pass back to [`Assignment::undo`] to revert it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Swap {
    pub first: usize,
    pub second: usize,
    /// Index into [`Assignment::slot_labels`].
    pub slot: usize,
    /// Change of the system total.
    pub delta: f64,
    entries: [usize; 2],
    previous: [(f64, LatLng); 2],
}

/// Working copy of every track with its matrix burden.
#[derive(Debug, Clone)]
pub struct Assignment<'m> {
    matrix: &'m BurdenMatrix,
    tracks: Vec<WorkingTrack>,
    /// Every slot label in first-appearance order.
    labels: Vec<String>,
    total: f64,
}

impl<'m> Assignment<'m> {
    pub fn new(ctx: &Context, matrix: &'m BurdenMatrix) -> BurdenResult<Self> {
        let mut tracks = Vec::with_capacity(ctx.tracks().len());
        let mut labels: Vec<String> = Vec::new();
        for track in ctx.tracks() {
            for slot in track.entries.iter().flat_map(|entry| &entry.slots) {
                if !labels.contains(slot) {
                    labels.push(slot.clone());
                }
            }

            let columns = matrix.columns_for(track)?;
            let estimate = matrix.evaluate_columns(&columns)?;
            let slots = track
                .entries
                .iter()
                .map(|entry| BlockSlot {
                    category: ctx
                        .block(&entry.block)
                        .map(|block| block.category.clone())
                        .unwrap_or_else(|| type_label(&entry.block).to_string()),
                    entry: entry.clone(),
                })
                .collect();
            tracks.push(WorkingTrack {
                name: track.name.clone(),
                slots,
                columns,
                burden: estimate.burden,
                point: estimate.point,
            });
        }
        let total = tracks.iter().map(|track| track.burden).sum();

        Ok(Self {
            matrix,
            tracks,
            labels,
            total,
        })
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.total
    }

    pub fn track_burden(&self, track: usize) -> f64 {
        self.tracks[track].burden
    }

    pub fn slot_labels(&self) -> &[String] {
        &self.labels
    }

    /// Index of the entry of `track` covering `slot`.
    fn entry_at(&self, track: usize, slot: &str) -> Option<usize> {
        self.tracks[track]
            .slots
            .iter()
            .position(|block| block.entry.slots.iter().any(|label| label == slot))
    }

    /// Entry indices of the two tracks at `slot` if the exchange is legal.
    fn locate(&self, first: usize, second: usize, slot: &str) -> Result<[usize; 2], SwapRejection> {
        if first == second {
            return Err(SwapRejection::SameTrack);
        }
        let (Some(i), Some(j)) = (self.entry_at(first, slot), self.entry_at(second, slot)) else {
            return Err(SwapRejection::MissingSlot);
        };
        let (a, b) = (&self.tracks[first].slots[i], &self.tracks[second].slots[j]);
        if a.category != b.category {
            return Err(SwapRejection::CategoryMismatch);
        }
        if a.entry.slots != b.entry.slots {
            return Err(SwapRejection::SlotMismatch);
        }
        if a.entry.block == b.entry.block {
            return Err(SwapRejection::Identical);
        }
        Ok([i, j])
    }

    pub fn check(&self, first: usize, second: usize, slot: &str) -> Result<(), SwapRejection> {
        self.locate(first, second, slot).map(|_| ())
    }

    fn exchange(&mut self, first: usize, second: usize, entries: [usize; 2]) {
        let (low, high) = (first.min(second), first.max(second));
        let (head, tail) = self.tracks.split_at_mut(high);
        let (low_track, high_track) = (&mut head[low], &mut tail[0]);
        let (a, i, b, j) = if first < second {
            (low_track, entries[0], high_track, entries[1])
        } else {
            (high_track, entries[0], low_track, entries[1])
        };
        std::mem::swap(&mut a.slots[i].entry.block, &mut b.slots[j].entry.block);
        std::mem::swap(&mut a.columns[i], &mut b.columns[j]);
    }

    /// Exchange the blocks the two tracks hold in `slot` and re-cost both.
    pub fn swap(&mut self, first: usize, second: usize, slot: &str) -> Result<Swap, SwapRejection> {
        let entries = self.locate(first, second, slot)?;
        let slot = self
            .labels
            .iter()
            .position(|label| label == slot)
            .ok_or(SwapRejection::MissingSlot)?;

        let previous = [
            (self.tracks[first].burden, self.tracks[first].point),
            (self.tracks[second].burden, self.tracks[second].point),
        ];
        self.exchange(first, second, entries);

        let mut delta = 0.0;
        for (index, (old_burden, _)) in [first, second].into_iter().zip(previous) {
            let track = &mut self.tracks[index];
            // Columns come from this matrix, so rows exist whenever the initial evaluation succeeded.
            if let Ok(estimate) = self.matrix.evaluate_columns(&track.columns) {
                track.burden = estimate.burden;
                track.point = estimate.point;
            }
            delta += track.burden - old_burden;
        }
        self.total += delta;

        Ok(Swap {
            first,
            second,
            slot,
            delta,
            entries,
            previous,
        })
    }

    pub fn undo(&mut self, swap: Swap) {
        self.exchange(swap.first, swap.second, swap.entries);
        for (index, (burden, point)) in [swap.first, swap.second].into_iter().zip(swap.previous) {
            self.tracks[index].burden = burden;
            self.tracks[index].point = point;
        }
        self.total -= swap.delta;
    }

    /// Current assignment in the input track shape.
    pub fn tracks(&self) -> Vec<Track> {
        self.tracks
            .iter()
            .map(|track| Track::new(track.name.clone(), track.slots.iter().map(|slot| slot.entry.clone()).collect()))
            .collect()
    }

    fn burdens(&self) -> Vec<(f64, LatLng)> {
        self.tracks.iter().map(|track| (track.burden, track.point)).collect()
    }
}

/// Burden of one track before and after optimization.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackChange {
    pub track: String,
    pub before: f64,
    pub after: f64,
    pub best_point: LatLng,
}

#[derive(Debug, Clone)]
pub struct AnnealReport {
    /// Best assignment found, same shape as the input tracks.
    pub tracks: Vec<Track>,
    pub initial_total: f64,
    pub best_total: f64,
    pub changes: Vec<TrackChange>,
    pub accepted: usize,
    pub rejected: usize,
    pub invalid: usize,
    /// `(iteration, best_total)` at every new best.
    pub improvements: Vec<(usize, f64)>,
}

pub fn anneal(ctx: &Context, matrix: &BurdenMatrix, options: &AnnealOptions) -> BurdenResult<AnnealReport> {
    let mut state = Assignment::new(ctx, matrix)?;
    let mut rng = SmallRng::seed_from_u64(options.seed);

    let initial = state.burdens();
    let initial_total = state.total();
    let mut best_tracks = state.tracks();
    let mut best_burdens = initial.clone();
    let mut best_total = initial_total;

    let mut temperature = options.initial_temperature;
    let mut accepted = 0;
    let mut rejected = 0;
    let mut invalid = 0;
    let mut improvements = Vec::new();

    let track_count = state.len();
    if track_count >= 2 {
        for iteration in 0..options.iterations {
            let first = rng.gen_range(0..track_count);
            let mut second = rng.gen_range(0..track_count - 1);
            if second >= first {
                second += 1;
            }

            let labels = state.slot_labels().len();
            let swap = if labels == 0 {
                Err(SwapRejection::MissingSlot)
            } else {
                let slot = state.slot_labels()[rng.gen_range(0..labels)].clone();
                state.swap(first, second, &slot)
            };

            match swap {
                Ok(swap) => {
                    let accept = swap.delta < 0.0
                        || (temperature > 0.0 && rng.gen_range(0.0..1.0) < (-swap.delta / temperature).exp());
                    if accept {
                        accepted += 1;
                        if state.total() < best_total {
                            best_total = state.total();
                            best_tracks = state.tracks();
                            best_burdens = state.burdens();
                            improvements.push((iteration, best_total));
                        }
                    } else {
                        rejected += 1;
                        state.undo(swap);
                    }
                }
                Err(_) => invalid += 1,
            }

            temperature *= options.cooling_rate;
        }
    }

    let changes = best_tracks
        .iter()
        .zip(initial.iter().zip(best_burdens.iter()))
        .map(|(track, ((before, _), (after, point)))| TrackChange {
            track: track.name.clone(),
            before: *before,
            after: *after,
            best_point: *point,
        })
        .collect();

    info!(
        initial_total,
        best_total,
        accepted,
        rejected,
        invalid,
        "annealing finished"
    );

    Ok(AnnealReport {
        tracks: best_tracks,
        initial_total,
        best_total,
        changes,
        accepted,
        rejected,
        invalid,
        improvements,
    })
}
