//! Summed photon counts in a band around each trajectory point.
//!
//! Sampling runs against the original, unmasked image: masking can clip
//! true signal that still belongs to the focus, and raw counts are what the
//! downstream quantification wants. Positions must therefore be absolute,
//! i.e. any mask crop offset re-added before calling in here.

use crate::image::ChannelImage;
use crate::trajectory::Trajectory;

/// Sum counts over an inclusive `± ceil(line_width / 2)` band of positions
/// centered at the rounded trajectory position, clamped to the image, one
/// value per trajectory point.
pub fn sample_summed_intensity(
    image: &ChannelImage,
    trajectory: &Trajectory,
    line_width: f32,
) -> Vec<f32> {
    let half = (line_width / 2.0).ceil() as usize;
    trajectory
        .points()
        .iter()
        .map(|point| {
            if point.time >= image.lines || image.positions == 0 {
                return 0.0;
            }
            let center = point.position.round().max(0.0) as usize;
            let lo = center.saturating_sub(half);
            let hi = (center + half).min(image.positions - 1);
            image.line(point.time)[lo..=hi].iter().sum()
        })
        .collect()
}
