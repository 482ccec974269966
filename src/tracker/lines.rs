//! Geometric line-following tracker.
//!
//! Builds a ridge-response field (negative second derivative of the
//! Gaussian-smoothed intensity along the position axis, smoothing scale
//! `line_width / 2`) and follows ridges through time:
//!
//! - Seeds are response maxima above `start_threshold`, visited strongest
//!   first, capped at `max_lines` trajectories.
//! - From a seed the line extends scan line by scan line, both forward and
//!   backward, picking the neighborhood pixel above
//!   `continuation_threshold` that minimizes
//!   `positional distance + angle_weight × angular deviation` from the
//!   current direction. Equal costs resolve to the smaller raw distance,
//!   then the lower row.
//! - Pixels claimed by an accepted trajectory (a `±half` band around each
//!   point) are off limits to later seeds and extensions, so trajectories
//!   never overlap.
//!
//! Counts are normalized by the channel maximum before differentiation, so
//! the thresholds are in derivative units of a 0..1 image regardless of
//! laser power.

use super::params::LineParams;
use crate::image::ChannelImage;
use crate::trajectory::{Trajectory, TrajectorySet};
use log::debug;
use nalgebra::Vector2;

/// Track foci by following ridges of the derivative field.
pub fn track_lines(image: &ChannelImage, params: &LineParams) -> TrajectorySet {
    let sigma = (params.line_width / 2.0).max(0.5);
    let response = ridge_response(image, sigma);
    let half = (params.line_width / 2.0).ceil() as usize;

    let mut seeds: Vec<(f32, usize, usize)> = Vec::new();
    for t in 0..response.lines {
        for (p, &r) in response.line(t).iter().enumerate() {
            if r > params.start_threshold {
                seeds.push((r, t, p));
            }
        }
    }
    // Strongest starts first; scan order breaks exact ties.
    seeds.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap().then(a.1.cmp(&b.1)).then(a.2.cmp(&b.2)));

    let mut claimed = vec![false; response.positions * response.lines];
    let mut set: TrajectorySet = Vec::new();

    for &(_, t0, p0) in &seeds {
        if set.len() >= params.max_lines {
            break;
        }
        if claimed[t0 * response.positions + p0] {
            continue;
        }

        let mut follower = Follower {
            response: &response,
            claimed: &mut claimed,
            half,
            params,
        };
        let traj = follower.follow(t0, p0);
        set.push(traj);
    }

    debug!(
        "track_lines: {} trajectories from {} seed candidates",
        set.len(),
        seeds.len()
    );
    set
}

struct Follower<'a> {
    response: &'a ChannelImage,
    claimed: &'a mut Vec<bool>,
    half: usize,
    params: &'a LineParams,
}

impl Follower<'_> {
    /// Trace one ridge from a seed, backward then forward in time.
    fn follow(&mut self, t0: usize, p0: usize) -> Trajectory {
        let start = self.refine(t0, p0);
        self.claim(t0, p0);

        // Backward sweep first, then reverse so time increases.
        let mut back: Vec<(usize, f32, usize)> = Vec::new();
        let mut prev = (t0, start, p0);
        let mut dir = Vector2::new(-1.0f32, 0.0);
        while prev.0 > 0 {
            let Some((row, pos)) = self.step(prev.0 - 1, prev.1, dir) else {
                break;
            };
            dir = Vector2::new(-1.0, pos - prev.1).normalize();
            self.claim(prev.0 - 1, row);
            back.push((prev.0 - 1, pos, row));
            prev = (prev.0 - 1, pos, row);
        }

        let mut traj = Trajectory::new();
        for &(t, pos, _) in back.iter().rev() {
            traj.push(t, pos);
        }
        traj.push(t0, start);

        let mut prev = (t0, start, p0);
        let mut dir = Vector2::new(1.0f32, 0.0);
        while prev.0 + 1 < self.response.lines {
            let Some((row, pos)) = self.step(prev.0 + 1, prev.1, dir) else {
                break;
            };
            dir = Vector2::new(1.0, pos - prev.1).normalize();
            self.claim(prev.0 + 1, row);
            traj.push(prev.0 + 1, pos);
            prev = (prev.0 + 1, pos, row);
        }
        traj
    }

    /// Best continuation in scan line `t` around `from_pos`, or `None` if
    /// no unclaimed pixel beats `continuation_threshold` there.
    fn step(&self, t: usize, from_pos: f32, dir: Vector2<f32>) -> Option<(usize, f32)> {
        let positions = self.response.positions;
        let center = from_pos.round() as isize;
        let search = self.params.line_width.ceil() as isize;
        let lo = (center - search).max(0) as usize;
        let hi = ((center + search) as usize).min(positions.saturating_sub(1));

        let sign = dir.x.signum();
        let mut best: Option<(f32, f32, usize)> = None; // (cost, raw, row)
        for row in lo..=hi {
            if self.claimed[t * positions + row] {
                continue;
            }
            if self.response.get(t, row) <= self.params.continuation_threshold {
                continue;
            }
            let raw = (row as f32 - from_pos).abs();
            let step = Vector2::new(sign, row as f32 - from_pos).normalize();
            let angle = dir.dot(&step).clamp(-1.0, 1.0).acos();
            let cost = raw + self.params.angle_weight * angle;
            let better = match best {
                None => true,
                Some((bc, br, brow)) => {
                    cost < bc
                        || (cost == bc && raw < br)
                        || (cost == bc && raw == br && row < brow)
                }
            };
            if better {
                best = Some((cost, raw, row));
            }
        }
        best.map(|(_, _, row)| (row, self.refine(t, row)))
    }

    /// Intensity-weighted sub-pixel position over the band around `row`.
    fn refine(&self, t: usize, row: usize) -> f32 {
        let lo = row.saturating_sub(self.half);
        let hi = (row + self.half).min(self.response.positions - 1);
        let line = self.response.line(t);
        let mut weight = 0.0f32;
        let mut moment = 0.0f32;
        for (q, &r) in line[lo..=hi].iter().enumerate() {
            if r > 0.0 {
                weight += r;
                moment += r * (lo + q) as f32;
            }
        }
        if weight > 0.0 {
            moment / weight
        } else {
            row as f32
        }
    }

    /// Reserve the band around a consumed ridge pixel.
    fn claim(&mut self, t: usize, row: usize) {
        let lo = row.saturating_sub(self.half);
        let hi = (row + self.half).min(self.response.positions - 1);
        for q in lo..=hi {
            self.claimed[t * self.response.positions + q] = true;
        }
    }
}

/// Negative second derivative of the Gaussian-smoothed, max-normalized
/// image along the position axis. Positive on bright ridges, ~0 on flat
/// background. Borders clamp, matching the gradient convention elsewhere
/// in the pipeline.
fn ridge_response(image: &ChannelImage, sigma: f32) -> ChannelImage {
    if image.positions == 0 || image.lines == 0 {
        return ChannelImage::new(image.positions, image.lines);
    }
    let max = image.max_count();
    let scale = if max > 0.0 { 1.0 / max } else { 0.0 };

    let radius = (3.0 * sigma).ceil() as isize;
    // Discrete Gaussian, then the (sigma^2 - x^2)/sigma^2 ridge factor;
    // the kernel sums to ~0 so constant input stays quiet.
    let mut gauss: Vec<f32> = (-radius..=radius)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let norm: f32 = gauss.iter().sum();
    for g in &mut gauss {
        *g /= norm;
    }
    let kernel: Vec<f32> = gauss
        .iter()
        .enumerate()
        .map(|(k, g)| {
            let x = (k as isize - radius) as f32;
            g * (sigma * sigma - x * x) / (sigma * sigma)
        })
        .collect();

    let mut out = ChannelImage::new(image.positions, image.lines);
    let last = image.positions as isize - 1;
    for t in 0..image.lines {
        let src = image.line(t);
        let dst = out.line_mut(t);
        for p in 0..image.positions {
            let mut acc = 0.0f32;
            for (k, &kv) in kernel.iter().enumerate() {
                let q = (p as isize + k as isize - radius).clamp(0, last) as usize;
                acc += src[q] * kv;
            }
            dst[p] = acc * scale;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line_image(positions: usize, lines: usize, rows: &[usize]) -> ChannelImage {
        let mut img = ChannelImage::new(positions, lines);
        for t in 0..lines {
            img.set(t, rows[t.min(rows.len() - 1)], 100.0);
        }
        img
    }

    #[test]
    fn ridge_response_peaks_on_the_line() {
        let img = line_image(21, 4, &[10, 10, 10, 10]);
        let resp = ridge_response(&img, 2.0);
        for t in 0..4 {
            let line = resp.line(t);
            let peak = line
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.partial_cmp(b.1).unwrap())
                .unwrap()
                .0;
            assert_eq!(peak, 10);
            assert!(line[10] > 0.01);
            assert!(line[0].abs() < 1e-3, "flat background should stay quiet");
        }
    }

    #[test]
    fn horizontal_line_is_followed_end_to_end() {
        let img = line_image(15, 12, &[7]);
        let params = LineParams {
            max_lines: 5,
            min_line_length: 0,
            ..Default::default()
        };
        let set = track_lines(&img, &params);
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].len(), 12);
        for p in set[0].points() {
            assert!((p.position - 7.0).abs() < 1.0, "position {}", p.position);
        }
    }

    #[test]
    fn sloped_line_is_followed() {
        let rows: Vec<usize> = (0..10).map(|t| 3 + t).collect();
        let img = line_image(20, 10, &rows);
        let params = LineParams {
            min_line_length: 0,
            ..Default::default()
        };
        let set = track_lines(&img, &params);
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].len(), 10);
        for pair in set[0].points().windows(2) {
            assert!(pair[1].time == pair[0].time + 1);
            assert!(pair[1].position > pair[0].position - 0.5);
        }
    }

    #[test]
    fn max_lines_caps_trajectory_count() {
        // Three well-separated horizontal lines, cap of two.
        let mut img = ChannelImage::new(40, 8);
        for t in 0..8 {
            img.set(t, 5, 100.0);
            img.set(t, 20, 90.0);
            img.set(t, 35, 80.0);
        }
        let params = LineParams {
            max_lines: 2,
            min_line_length: 0,
            ..Default::default()
        };
        let set = track_lines(&img, &params);
        assert_eq!(set.len(), 2);
        // Strongest line first.
        let first_mean: f32 = set[0].points().iter().map(|p| p.position).sum::<f32>()
            / set[0].len() as f32;
        assert!((first_mean - 5.0).abs() < 2.0);
    }

    #[test]
    fn claimed_pixels_are_not_reused() {
        let img = line_image(15, 10, &[7]);
        let params = LineParams {
            max_lines: 10,
            min_line_length: 0,
            ..Default::default()
        };
        let set = track_lines(&img, &params);
        // One bright line must not spawn several stacked trajectories.
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn flat_image_produces_no_trajectories() {
        let img = ChannelImage::new(16, 16);
        let set = track_lines(&img, &LineParams::default());
        assert!(set.is_empty());
    }
}
