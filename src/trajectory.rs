//! Tracked trajectories and the operations shared by both trackers.
//!
//! A trajectory is an ordered `(time, position)` path for one focus, with
//! strictly increasing scan-line indices. Positions are sub-pixel floats in
//! the coordinates of the image the tracker ran on; if that image was
//! cropped by a mask, the session re-adds the row offset when exporting
//! calibrated series.

use crate::image::Calibration;
use serde::{Deserialize, Serialize};

/// One sample of a tracked focus.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryPoint {
    /// Scan-line index (time axis).
    pub time: usize,
    /// Sub-pixel position along the scanned line.
    pub position: f32,
}

/// Ordered path of one focus across scan lines, length >= 1.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Trajectory {
    points: Vec<TrajectoryPoint>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self { points: Vec::new() }
    }

    /// Start a trajectory from its first detection.
    pub fn starting_at(time: usize, position: f32) -> Self {
        Self {
            points: vec![TrajectoryPoint { time, position }],
        }
    }

    /// Append a sample. Panics in debug builds if time does not advance;
    /// the trackers only ever push forward.
    pub fn push(&mut self, time: usize, position: f32) {
        debug_assert!(
            self.points.last().map_or(true, |p| time > p.time),
            "trajectory time must strictly increase: {} after {:?}",
            time,
            self.points.last()
        );
        self.points.push(TrajectoryPoint { time, position });
    }

    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<&TrajectoryPoint> {
        self.points.first()
    }

    pub fn last(&self) -> Option<&TrajectoryPoint> {
        self.points.last()
    }

    /// Position recorded at an exact scan line, if any.
    pub fn position_at(&self, time: usize) -> Option<f32> {
        self.points
            .binary_search_by_key(&time, |p| p.time)
            .ok()
            .map(|i| self.points[i].position)
    }

    /// Calibrated (seconds, nanometres) series for export. `row_offset`
    /// restores absolute positions after mask cropping.
    pub fn calibrated(&self, calib: &Calibration, row_offset: usize) -> CalibratedTrace {
        CalibratedTrace {
            time_s: self
                .points
                .iter()
                .map(|p| p.time as f64 * calib.line_time_s)
                .collect(),
            position_nm: self
                .points
                .iter()
                .map(|p| (p.position as f64 + row_offset as f64) * calib.pixel_size_nm)
                .collect(),
        }
    }
}

/// Physical-unit view of one trajectory, ready for export collaborators.
#[derive(Clone, Debug, Serialize)]
pub struct CalibratedTrace {
    pub time_s: Vec<f64>,
    pub position_nm: Vec<f64>,
}

/// All trajectories from one tracker invocation on one channel.
pub type TrajectorySet = Vec<Trajectory>;

/// Drop trajectories shorter than `min_len` points, preserving the order
/// of the survivors. Applying it twice with the same threshold is a no-op.
pub fn filter_line_length(set: TrajectorySet, min_len: usize) -> TrajectorySet {
    set.into_iter().filter(|t| t.len() >= min_len).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn traj(times: &[usize]) -> Trajectory {
        let mut t = Trajectory::new();
        for &time in times {
            t.push(time, time as f32);
        }
        t
    }

    #[test]
    fn filter_drops_short_trajectories_in_order() {
        let set = vec![traj(&[0, 1, 2]), traj(&[4]), traj(&[0, 1, 2, 3])];
        let filtered = filter_line_length(set, 3);
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].len(), 3);
        assert_eq!(filtered[1].len(), 4);
    }

    #[test]
    fn filter_is_idempotent() {
        let set = vec![traj(&[0, 1]), traj(&[0, 1, 2, 3, 4])];
        let once = filter_line_length(set, 3);
        let twice = filter_line_length(once.clone(), 3);
        assert_eq!(once.len(), twice.len());
        assert_eq!(once[0].points(), twice[0].points());
    }

    #[test]
    fn calibrated_trace_applies_offset_and_scalars() {
        let mut t = Trajectory::new();
        t.push(2, 3.0);
        let calib = Calibration::new(100.0, 0.5);
        let trace = t.calibrated(&calib, 4);
        assert_eq!(trace.time_s, vec![1.0]);
        assert_eq!(trace.position_nm, vec![700.0]);
    }

    #[test]
    fn position_at_finds_exact_time_only() {
        let t = traj(&[1, 3, 5]);
        assert_eq!(t.position_at(3), Some(3.0));
        assert_eq!(t.position_at(2), None);
    }
}
