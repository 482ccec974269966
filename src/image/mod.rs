//! Photon-count channel images and calibration scalars.
//!
//! A kymograph channel is a dense grid of non-negative photon counts with
//! one spatial axis (pixel position along the scanned line) and one time
//! axis (scan-line number). Storage is scan-line major: each scan line is a
//! contiguous `positions`-length slice, so the trackers can walk the image
//! one timepoint at a time without striding.

pub mod io;

use crate::error::{KymoError, Result};
use serde::{Deserialize, Serialize};

/// Spatial and temporal calibration attached to a recording.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Calibration {
    /// Physical size of one position pixel in nanometres.
    pub pixel_size_nm: f64,
    /// Duration of one scan line in seconds.
    pub line_time_s: f64,
}

impl Calibration {
    pub fn new(pixel_size_nm: f64, line_time_s: f64) -> Self {
        Self {
            pixel_size_nm,
            line_time_s,
        }
    }
}

/// Owned single-channel kymograph in scan-line-major layout.
///
/// Counts are stored as `f32`; loaders hand over integer photon counts and
/// the trackers only ever read them.
#[derive(Clone, Debug)]
pub struct ChannelImage {
    /// Pixels per scan line (spatial axis length).
    pub positions: usize,
    /// Number of scan lines (time axis length).
    pub lines: usize,
    /// Backing storage, one scan line after another.
    pub data: Vec<f32>,
}

impl ChannelImage {
    /// Zero-initialized channel of `positions × lines`.
    pub fn new(positions: usize, lines: usize) -> Self {
        Self {
            positions,
            lines,
            data: vec![0.0; positions * lines],
        }
    }

    /// Rebuild a channel from a flat per-pixel stream as delivered by the
    /// vendor loaders: pixel index varies fastest, scan line slowest.
    pub fn from_raw(positions: usize, data: Vec<f32>) -> Result<Self> {
        if positions == 0 || data.len() % positions != 0 {
            return Err(KymoError::InputShape(format!(
                "raw stream of {} samples does not divide into {}-pixel scan lines",
                data.len(),
                positions
            )));
        }
        let lines = data.len() / positions;
        Ok(Self {
            positions,
            lines,
            data,
        })
    }

    #[inline]
    fn idx(&self, line: usize, position: usize) -> usize {
        line * self.positions + position
    }

    /// Photon count at (scan line, position).
    #[inline]
    pub fn get(&self, line: usize, position: usize) -> f32 {
        self.data[self.idx(line, position)]
    }

    /// Set the count at (scan line, position).
    #[inline]
    pub fn set(&mut self, line: usize, position: usize, v: f32) {
        let i = self.idx(line, position);
        self.data[i] = v;
    }

    /// Borrow one scan line as a contiguous slice.
    #[inline]
    pub fn line(&self, line: usize) -> &[f32] {
        let start = line * self.positions;
        &self.data[start..start + self.positions]
    }

    #[inline]
    pub fn line_mut(&mut self, line: usize) -> &mut [f32] {
        let start = line * self.positions;
        let end = start + self.positions;
        &mut self.data[start..end]
    }

    /// Largest photon count in the channel (0.0 for an empty image).
    pub fn max_count(&self) -> f32 {
        self.data.iter().copied().fold(0.0, f32::max)
    }

    /// Rescale counts into 0..=255 for display overlays, position-major
    /// (row-major with rows = positions) as viewers expect.
    pub fn to_display_u8(&self) -> Vec<u8> {
        let max = self.max_count();
        let scale = if max > 0.0 { 255.0 / max } else { 0.0 };
        let mut out = vec![0u8; self.positions * self.lines];
        for t in 0..self.lines {
            let line = self.line(t);
            for (p, &v) in line.iter().enumerate() {
                out[p * self.lines + t] = (v * scale) as u8;
            }
        }
        out
    }
}

/// Verify that all channels of a recording agree on dimensions.
pub fn check_channel_shapes(channels: &[&ChannelImage]) -> Result<()> {
    let Some(first) = channels.first() else {
        return Ok(());
    };
    for ch in &channels[1..] {
        if ch.positions != first.positions || ch.lines != first.lines {
            return Err(KymoError::InputShape(format!(
                "channel shapes differ: {}x{} vs {}x{}",
                first.positions, first.lines, ch.positions, ch.lines
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_raw_splits_scan_lines() {
        let img = ChannelImage::from_raw(3, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
        assert_eq!(img.lines, 2);
        assert_eq!(img.line(1), &[3.0, 4.0, 5.0]);
        assert_eq!(img.get(1, 0), 3.0);
    }

    #[test]
    fn from_raw_rejects_ragged_stream() {
        assert!(ChannelImage::from_raw(4, vec![0.0; 7]).is_err());
    }

    #[test]
    fn shape_check_flags_mismatch() {
        let a = ChannelImage::new(8, 4);
        let b = ChannelImage::new(8, 5);
        assert!(check_channel_shapes(&[&a, &a]).is_ok());
        assert!(check_channel_shapes(&[&a, &b]).is_err());
    }
}
