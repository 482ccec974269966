//! Tracking session orchestration.
//!
//! One session drives the whole per-recording workflow: crop each selected
//! channel to the region mask, run the chosen tracker, hand the result to a
//! review step, and either accept it or re-run with edited parameters. The
//! review loop is human-in-the-loop calibration and deliberately unbounded;
//! a rejected attempt discards its trajectory set wholesale.
//!
//! On accept the set is length-filtered, shifted back to absolute image
//! coordinates, and fed to the requested extractions (band intensities
//! against the original unmasked image, nearest-foci distances against a
//! base channel). Parameters carry over from channel to channel and from
//! recording to recording, and every accepted run leaves a record for the
//! final settings report.
//!
//! Batch processing is strictly sequential; a recording that fails its
//! shape checks is logged and skipped without aborting the batch.

use crate::error::Result;
use crate::extract::{nearest_distances, sample_summed_intensity, DistanceSeries};
use crate::image::{check_channel_shapes, Calibration, ChannelImage};
use crate::mask::RegionMask;
use crate::tracker::TrackerParams;
use crate::trajectory::{filter_line_length, CalibratedTrace, Trajectory, TrajectorySet};
use log::{debug, warn};
use serde::Serialize;

/// Color channel of a recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ChannelLabel {
    Red,
    Green,
    Blue,
}

impl ChannelLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Red => "Red",
            Self::Green => "Green",
            Self::Blue => "Blue",
        }
    }
}

/// One kymograph recording, already decoded by a loader collaborator.
#[derive(Clone, Debug)]
pub struct Recording {
    pub name: String,
    pub calibration: Calibration,
    pub channels: Vec<(ChannelLabel, ChannelImage)>,
}

/// Verdict of the review step after one tracking attempt.
#[derive(Clone, Debug)]
pub enum ReviewDecision {
    Accept,
    Retry(TrackerParams),
}

/// Review step deciding whether a tracking attempt stands.
///
/// Interactive frontends show the mapped lines and prompt; batch tools use
/// [`AcceptFirst`] or a closure.
pub trait Review {
    fn review(
        &mut self,
        channel: ChannelLabel,
        set: &TrajectorySet,
        params: &TrackerParams,
    ) -> ReviewDecision;
}

impl<F> Review for F
where
    F: FnMut(ChannelLabel, &TrajectorySet, &TrackerParams) -> ReviewDecision,
{
    fn review(
        &mut self,
        channel: ChannelLabel,
        set: &TrajectorySet,
        params: &TrackerParams,
    ) -> ReviewDecision {
        self(channel, set, params)
    }
}

/// Accepts every first attempt. The non-interactive default.
pub struct AcceptFirst;

impl Review for AcceptFirst {
    fn review(&mut self, _: ChannelLabel, _: &TrajectorySet, _: &TrackerParams) -> ReviewDecision {
        ReviewDecision::Accept
    }
}

/// What to track and extract per recording.
#[derive(Clone, Debug, Default)]
pub struct SessionOptions {
    /// Channels to track; `None` tracks every channel the recording has.
    pub track_channels: Option<Vec<ChannelLabel>>,
    /// Sum photon counts in a `line_width`-derived band around each point.
    pub extract_intensities: bool,
    /// Compute signed nearest-foci distances from this channel to every
    /// other tracked channel.
    pub distance_base: Option<ChannelLabel>,
}

impl SessionOptions {
    fn tracks(&self, label: ChannelLabel) -> bool {
        self.track_channels
            .as_ref()
            .map_or(true, |wanted| wanted.contains(&label))
    }
}

/// Final parameters of one accepted run, for the settings report.
#[derive(Clone, Debug, Serialize)]
pub struct ParameterRecord {
    pub recording: String,
    pub channel: ChannelLabel,
    pub params: TrackerParams,
}

/// Accepted result for one channel.
#[derive(Clone, Debug, Serialize)]
pub struct ChannelResult {
    pub channel: ChannelLabel,
    /// Trajectories in absolute image coordinates, length-filtered.
    pub trajectories: TrajectorySet,
    /// Summed band intensity per trajectory, aligned with its points.
    pub intensities: Option<Vec<Vec<f32>>>,
    /// Signed distance series per base trajectory, one entry per candidate
    /// channel. Only populated on the distance-base channel.
    pub distances: Vec<(ChannelLabel, Vec<DistanceSeries>)>,
}

impl ChannelResult {
    /// Calibrated (seconds, nanometres) view of the trajectories.
    pub fn calibrated_traces(&self, calibration: &Calibration) -> Vec<CalibratedTrace> {
        self.trajectories
            .iter()
            .map(|t| t.calibrated(calibration, 0))
            .collect()
    }
}

/// Everything a recording's session produced.
#[derive(Clone, Debug, Serialize)]
pub struct SessionResult {
    pub recording: String,
    pub calibration: Calibration,
    pub channels: Vec<ChannelResult>,
}

/// Per-batch tracking orchestrator; owns the evolving parameters, the mask
/// and the accumulated settings history.
pub struct TrackingSession<R: Review> {
    mask: RegionMask,
    params: TrackerParams,
    options: SessionOptions,
    review: R,
    history: Vec<ParameterRecord>,
}

impl<R: Review> TrackingSession<R> {
    pub fn new(mask: RegionMask, params: TrackerParams, options: SessionOptions, review: R) -> Self {
        Self {
            mask,
            params,
            options,
            review,
            history: Vec::new(),
        }
    }

    /// Parameters as of the latest accepted run.
    pub fn params(&self) -> &TrackerParams {
        &self.params
    }

    /// Accumulated settings records across all processed recordings.
    pub fn history(&self) -> &[ParameterRecord] {
        &self.history
    }

    pub fn into_history(self) -> Vec<ParameterRecord> {
        self.history
    }

    /// Run the full mask → track → review → filter → extract pipeline on
    /// one recording.
    pub fn run(&mut self, recording: &Recording) -> Result<SessionResult> {
        let images: Vec<&ChannelImage> = recording.channels.iter().map(|(_, i)| i).collect();
        check_channel_shapes(&images)?;
        if let Some((_, first)) = recording.channels.first() {
            self.mask.validate(first.positions, first.lines)?;
        }
        self.params.validate()?;

        let mut channels = Vec::with_capacity(recording.channels.len());
        for (label, image) in &recording.channels {
            if !self.options.tracks(*label) {
                continue;
            }
            let trajectories = self.track_channel(*label, image)?;
            self.history.push(ParameterRecord {
                recording: recording.name.clone(),
                channel: *label,
                params: self.params.clone(),
            });

            let intensities = self.options.extract_intensities.then(|| {
                let line_width = self.params.line_width();
                trajectories
                    .iter()
                    .map(|t| sample_summed_intensity(image, t, line_width))
                    .collect()
            });

            channels.push(ChannelResult {
                channel: *label,
                trajectories,
                intensities,
                distances: Vec::new(),
            });
        }

        self.extract_distances(&mut channels);

        Ok(SessionResult {
            recording: recording.name.clone(),
            calibration: recording.calibration,
            channels,
        })
    }

    /// Review loop for one channel: track, ask, retry until accepted.
    fn track_channel(&mut self, label: ChannelLabel, image: &ChannelImage) -> Result<TrajectorySet> {
        let cropped = self.mask.cropped(image)?;
        loop {
            let set = self.params.track(&cropped.image);
            debug!(
                "{}: {} trajectories over {} scan lines",
                label.as_str(),
                set.len(),
                image.lines
            );
            match self.review.review(label, &set, &self.params) {
                ReviewDecision::Accept => {
                    let filtered = filter_line_length(set, self.params.min_line_length());
                    let absolute = filtered
                        .iter()
                        .map(|t| shift_positions(t, cropped.row_offset as f32))
                        .collect();
                    return Ok(absolute);
                }
                ReviewDecision::Retry(new_params) => {
                    new_params.validate()?;
                    self.params = new_params;
                }
            }
        }
    }

    fn extract_distances(&self, channels: &mut [ChannelResult]) {
        let Some(base_label) = self.options.distance_base else {
            return;
        };
        let Some(base_idx) = channels.iter().position(|c| c.channel == base_label) else {
            warn!(
                "distance base channel {} was not tracked; skipping distance extraction",
                base_label.as_str()
            );
            return;
        };
        let base_set = channels[base_idx].trajectories.clone();
        let mut distances = Vec::new();
        for (i, other) in channels.iter().enumerate() {
            if i == base_idx {
                continue;
            }
            distances.push((other.channel, nearest_distances(&base_set, &other.trajectories)));
        }
        channels[base_idx].distances = distances;
    }
}

/// Shift trajectory positions back to absolute image rows after cropping.
fn shift_positions(traj: &Trajectory, offset: f32) -> Trajectory {
    let mut out = Trajectory::new();
    for p in traj.points() {
        out.push(p.time, p.position + offset);
    }
    out
}

/// Process recordings strictly one after another. A recording whose shape
/// checks fail is logged and skipped; the rest of the batch continues.
pub fn process_batch<R: Review>(
    session: &mut TrackingSession<R>,
    recordings: &[Recording],
) -> Vec<SessionResult> {
    let mut results = Vec::new();
    for recording in recordings {
        match session.run(recording) {
            Ok(result) => results.push(result),
            Err(err) => warn!("skipping {}: {err}", recording.name),
        }
    }
    results
}
