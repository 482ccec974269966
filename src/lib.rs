//! Focus tracking for fluorescence kymographs.
//!
//! A kymograph is a line-scan image with one spatial axis and one time
//! axis; moving point sources ("foci") appear as bright lines. This crate
//! recovers those lines as trajectories:
//!
//! - [`image`] – photon-count channel grids and calibration scalars.
//! - [`mask`] – rectangle and polyline region-of-interest masks.
//! - [`tracker`] – the greedy frame-linking and geometric line-following
//!   algorithms behind one [`TrackerParams`] dispatch.
//! - [`trajectory`] – trajectory model, length filter, calibrated export.
//! - [`extract`] – summed band intensities and signed nearest-foci
//!   distances.
//! - [`session`] – the review/retry orchestration and batch driver.
//!
//! File-format decoding, interactive region selection and spreadsheet
//! export are collaborator concerns and stay outside this crate.

pub mod config;
pub mod error;
pub mod extract;
pub mod image;
pub mod mask;
pub mod session;
pub mod tracker;
pub mod trajectory;

// --- High-level re-exports -------------------------------------------------

pub use crate::error::{KymoError, Result};
pub use crate::image::{Calibration, ChannelImage};
pub use crate::mask::RegionMask;
pub use crate::session::{Recording, SessionOptions, SessionResult, TrackingSession};
pub use crate::tracker::{GreedyParams, LineParams, TrackerParams};
pub use crate::trajectory::{Trajectory, TrajectorySet};

/// Small prelude for quick experiments.
///
/// ```no_run
/// use kymotrack::prelude::*;
///
/// # fn main() {
/// let mut image = ChannelImage::new(64, 256);
/// image.set(10, 32, 50.0);
///
/// let params = TrackerParams::Greedy(GreedyParams {
///     pixel_threshold: 10.0,
///     ..Default::default()
/// });
/// let set = params.track(&image);
/// println!("{} trajectories", set.len());
/// # }
/// ```
pub mod prelude {
    pub use crate::image::{Calibration, ChannelImage};
    pub use crate::mask::RegionMask;
    pub use crate::tracker::{GreedyParams, LineParams, TrackerParams};
    pub use crate::trajectory::{filter_line_length, Trajectory, TrajectorySet};
}
