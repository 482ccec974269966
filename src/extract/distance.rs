//! Signed nearest-foci distance between a base channel and a candidate
//! channel.
//!
//! For every point of a base trajectory, candidate trajectories are scanned
//! for a point at the identical scan line; the match with the smallest
//! absolute distance wins, first encounter breaking exact ties. Base points
//! with no time-aligned candidate anywhere are dropped from the series
//! rather than zero-filled.
//!
//! Sign convention follows image coordinates (positions increase downward):
//! `distance = base − candidate`, so a candidate below the base gives a
//! negative value.

use crate::trajectory::{Trajectory, TrajectorySet};
use serde::Serialize;

/// Per-base-trajectory distance series against one candidate channel.
#[derive(Clone, Debug, Default, Serialize)]
pub struct DistanceSeries {
    /// Scan-line indices of the matched base points.
    pub time: Vec<usize>,
    /// Signed distances in position pixels, aligned with `time`.
    pub distance: Vec<f32>,
}

impl DistanceSeries {
    pub fn len(&self) -> usize {
        self.time.len()
    }

    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }
}

/// Nearest signed distances from each base trajectory to a candidate set.
/// Returns one series per base trajectory, in base order.
pub fn nearest_distances(base: &TrajectorySet, candidates: &TrajectorySet) -> Vec<DistanceSeries> {
    base.iter()
        .map(|traj| series_for(traj, candidates))
        .collect()
}

fn series_for(base: &Trajectory, candidates: &TrajectorySet) -> DistanceSeries {
    let mut series = DistanceSeries::default();
    for point in base.points() {
        let mut best: Option<f32> = None;
        for cand in candidates {
            let Some(cand_pos) = cand.position_at(point.time) else {
                continue;
            };
            let distance = point.position - cand_pos;
            if best.map_or(true, |b| distance.abs() < b.abs()) {
                best = Some(distance);
            }
        }
        if let Some(distance) = best {
            series.time.push(point.time);
            series.distance.push(distance);
        }
    }
    series
}
