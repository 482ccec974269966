//! Data extraction over accepted trajectories: summed band intensities and
//! signed nearest-foci distances between channels.

pub mod distance;
pub mod intensity;

pub use distance::{nearest_distances, DistanceSeries};
pub use intensity::sample_summed_intensity;
