//! Runtime configuration for the demo tool.
//!
//! A JSON file describes one run: the input channel image, calibration,
//! the analysis region, tracker parameters, and where to write outputs.
//! The mask arrives as raw UI coordinates and is resolved against the
//! image dimensions after loading.

use crate::error::Result as KymoResult;
use crate::image::Calibration;
use crate::mask::RegionMask;
use crate::tracker::TrackerParams;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct OutputConfig {
    /// Trajectories + settings report as pretty JSON.
    pub json_out: Option<PathBuf>,
    /// Binary mapped-lines overlay PNG for eyeballing the result.
    pub overlay_out: Option<PathBuf>,
}

/// Region mask as the UI hands it over, before dimension checks.
#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum MaskConfig {
    Rectangle {
        top: usize,
        bottom: usize,
    },
    Polyline {
        /// Ordered `(column, row)` control points, first row is the top.
        points: Vec<(usize, usize)>,
    },
}

impl MaskConfig {
    /// Resolve into a validated mask for an image of the given shape.
    pub fn resolve(&self, positions: usize, lines: usize) -> KymoResult<RegionMask> {
        match self {
            Self::Rectangle { top, bottom } => {
                let mask = RegionMask::rectangle(*top, *bottom)?;
                mask.validate(positions, lines)?;
                Ok(mask)
            }
            Self::Polyline { points } => RegionMask::from_control_points(points, lines, positions),
        }
    }
}

fn default_calibration() -> Calibration {
    // 100 nm pixels at 10 ms per scan line, a typical C-Trap setting.
    Calibration::new(100.0, 0.01)
}

#[derive(Clone, Debug, Deserialize)]
pub struct RunConfig {
    /// Grayscale PNG standing in for one photon-count channel.
    pub input: PathBuf,
    #[serde(default = "default_calibration")]
    pub calibration: Calibration,
    pub mask: MaskConfig,
    #[serde(default)]
    pub tracker: TrackerParams,
    #[serde(default)]
    pub output: OutputConfig,
}

pub fn load_config(path: &Path) -> Result<RunConfig, String> {
    let contents = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config {}: {e}", path.display()))?;
    let config: RunConfig = serde_json::from_str(&contents)
        .map_err(|e| format!("Failed to parse config {}: {e}", path.display()))?;
    config
        .tracker
        .validate()
        .map_err(|e| format!("Invalid tracker parameters in {}: {e}", path.display()))?;
    Ok(config)
}
