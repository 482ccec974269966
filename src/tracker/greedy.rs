//! Greedy frame-linking tracker.
//!
//! Walks the kymograph one scan line at a time, left to right. Peaks above
//! `pixel_threshold` become link candidates; every open trajectory predicts
//! where its focus should be (last position advanced by the expected
//! velocity, with a Gaussian spread that grows with diffusion over the
//! unobserved gap) and candidates attach to the best-scoring prediction
//! within `sigma_cutoff` standard deviations. Unclaimed candidates open new
//! trajectories; trajectories that stay unmatched for more than `window`
//! scan lines close and are emitted.
//!
//! A scan line with no candidates is not an error: every open trajectory
//! just ages by one line.

use super::params::GreedyParams;
use crate::image::ChannelImage;
use crate::trajectory::{Trajectory, TrajectorySet};
use log::debug;

struct OpenTrack {
    traj: Trajectory,
    last_time: usize,
    last_pos: f32,
    /// Creation sequence number, the final assignment tie-break.
    created: usize,
}

impl OpenTrack {
    /// Predicted position and spread after `gap` unobserved scan lines.
    fn predict(&self, time: usize, params: &GreedyParams) -> (f32, f32) {
        let gap = (time - self.last_time) as f32;
        let predicted = self.last_pos + params.velocity * gap;
        let sigma = params.effective_sigma();
        let spread = (sigma * sigma + params.diffusion * gap).sqrt();
        (predicted, spread)
    }
}

/// Track foci by greedy nearest-prediction linking.
pub fn track_greedy(image: &ChannelImage, params: &GreedyParams) -> TrajectorySet {
    let half = ((params.line_width / 2.0).round() as usize).max(1);
    let mut open: Vec<OpenTrack> = Vec::new();
    let mut finished: Vec<OpenTrack> = Vec::new();
    let mut created = 0usize;
    let mut peaks = Vec::new();

    for t in 0..image.lines {
        find_peaks(image.line(t), half, params.pixel_threshold, &mut peaks);

        // Candidates are processed top to bottom; a trajectory takes at
        // most one candidate per scan line.
        let mut claimed = vec![false; open.len()];
        for &peak in &peaks {
            let pos = peak as f32;
            let mut best: Option<(usize, f32, f32)> = None;
            for (i, track) in open.iter().enumerate() {
                if claimed[i] {
                    continue;
                }
                let (predicted, spread) = track.predict(t, params);
                let raw = (pos - predicted).abs();
                let normalized = raw / spread;
                if normalized > params.sigma_cutoff {
                    continue;
                }
                let better = match best {
                    None => true,
                    Some((j, bn, br)) => {
                        normalized < bn
                            || (normalized == bn && raw < br)
                            || (normalized == bn && raw == br && track.created < open[j].created)
                    }
                };
                if better {
                    best = Some((i, normalized, raw));
                }
            }
            match best {
                Some((i, _, _)) => {
                    claimed[i] = true;
                    open[i].traj.push(t, pos);
                    open[i].last_time = t;
                    open[i].last_pos = pos;
                }
                None => {
                    open.push(OpenTrack {
                        traj: Trajectory::starting_at(t, pos),
                        last_time: t,
                        last_pos: pos,
                        created,
                    });
                    claimed.push(true);
                    created += 1;
                }
            }
        }

        // Retire trajectories that outstayed the disappearance window.
        let mut i = 0;
        while i < open.len() {
            if t - open[i].last_time > params.window {
                finished.push(open.swap_remove(i));
            } else {
                i += 1;
            }
        }
    }

    finished.append(&mut open);
    finished.sort_by_key(|t| t.created);
    debug!(
        "track_greedy: {} trajectories over {} scan lines",
        finished.len(),
        image.lines
    );
    finished.into_iter().map(|t| t.traj).collect()
}

/// Local maxima of one scan line over a `±half` neighborhood, strictly
/// above `threshold`. A flat plateau reports its first pixel only.
fn find_peaks(line: &[f32], half: usize, threshold: f32, out: &mut Vec<usize>) {
    out.clear();
    if line.is_empty() {
        return;
    }
    for p in 0..line.len() {
        let v = line[p];
        if v <= threshold {
            continue;
        }
        let lo = p.saturating_sub(half);
        let hi = (p + half).min(line.len() - 1);
        let mut is_peak = true;
        for q in lo..=hi {
            if q == p {
                continue;
            }
            // Earlier equal values win the plateau.
            if line[q] > v || (line[q] == v && q < p) {
                is_peak = false;
                break;
            }
        }
        if is_peak {
            out.push(p);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn image_from_columns(columns: &[&[f32]]) -> ChannelImage {
        let positions = columns[0].len();
        let mut img = ChannelImage::new(positions, columns.len());
        for (t, col) in columns.iter().enumerate() {
            img.line_mut(t).copy_from_slice(col);
        }
        img
    }

    fn diagonal_image(positions: usize, lines: usize) -> ChannelImage {
        let mut img = ChannelImage::new(positions, lines);
        for t in 0..lines {
            img.set(t, t.min(positions - 1), 100.0);
        }
        img
    }

    #[test]
    fn peaks_respect_threshold_and_plateaus() {
        let mut out = Vec::new();
        find_peaks(&[0.0, 5.0, 5.0, 0.0, 3.0, 0.0], 1, 2.0, &mut out);
        assert_eq!(out, vec![1, 4]);
        find_peaks(&[1.0, 1.0, 1.0], 1, 2.0, &mut out);
        assert!(out.is_empty());
    }

    #[test]
    fn single_diagonal_line_yields_one_trajectory() {
        let img = diagonal_image(12, 10);
        let params = GreedyParams {
            pixel_threshold: 50.0,
            window: 2,
            sigma_cutoff: 3.0,
            min_line_length: 0,
            ..Default::default()
        };
        let set = track_greedy(&img, &params);
        assert_eq!(set.len(), 1, "expected one trajectory, got {}", set.len());
        assert_eq!(set[0].len(), 10);
        for (i, p) in set[0].points().iter().enumerate() {
            assert_eq!(p.time, i);
            assert_eq!(p.position, i as f32);
        }
    }

    #[test]
    fn time_strictly_increases_in_every_trajectory() {
        let mut img = diagonal_image(16, 12);
        // Second, static focus plus some clutter.
        for t in 0..12 {
            img.set(t, 14, 80.0);
        }
        let params = GreedyParams {
            pixel_threshold: 10.0,
            window: 1,
            sigma_cutoff: 2.0,
            ..Default::default()
        };
        for traj in track_greedy(&img, &params) {
            for pair in traj.points().windows(2) {
                assert!(pair[1].time > pair[0].time);
            }
        }
    }

    #[test]
    fn gap_within_window_keeps_trajectory_open() {
        // Focus at row 3, missing on scan lines 2 and 3, back on 4.
        let on: &[f32] = &[0.0, 0.0, 0.0, 90.0, 0.0, 0.0];
        let off: &[f32] = &[0.0; 6];
        let img = image_from_columns(&[on, on, off, off, on, on]);
        let params = GreedyParams {
            pixel_threshold: 50.0,
            window: 2,
            sigma_cutoff: 3.0,
            ..Default::default()
        };
        let set = track_greedy(&img, &params);
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].len(), 4);
    }

    #[test]
    fn gap_beyond_window_splits_trajectory() {
        let on: &[f32] = &[0.0, 0.0, 0.0, 90.0, 0.0, 0.0];
        let off: &[f32] = &[0.0; 6];
        let img = image_from_columns(&[on, off, off, off, on, on]);
        let params = GreedyParams {
            pixel_threshold: 50.0,
            window: 2,
            sigma_cutoff: 3.0,
            ..Default::default()
        };
        let set = track_greedy(&img, &params);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn velocity_model_follows_fast_drift() {
        // Focus moving 2 px per scan line; with the matching velocity
        // prior the link survives a tight sigma.
        let mut img = ChannelImage::new(24, 8);
        for t in 0..8 {
            img.set(t, 2 * t + 1, 100.0);
        }
        let params = GreedyParams {
            pixel_threshold: 50.0,
            sigma: Some(0.8),
            velocity: 2.0,
            sigma_cutoff: 1.5,
            window: 0,
            ..Default::default()
        };
        let set = track_greedy(&img, &params);
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].len(), 8);
    }

    #[test]
    fn empty_image_yields_empty_set() {
        let img = ChannelImage::new(8, 8);
        let set = track_greedy(&img, &GreedyParams::default());
        assert!(set.is_empty());
    }
}
