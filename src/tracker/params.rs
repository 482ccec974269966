//! Parameter records for the two tracking algorithms.
//!
//! Each record is a plain struct with defaults matching the interactive
//! workflow's starting values. Overrides arrive as `key=value` text from
//! the operator between attempts; [`set_field`](GreedyParams::set_field)
//! parses the value into the field's type and rejects unknown keys and
//! garbage values outright instead of coercing them, leaving the previous
//! value untouched on failure.

use crate::error::{KymoError, Result};
use serde::{Deserialize, Serialize};

/// Parameters of the greedy frame-linking tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GreedyParams {
    /// Expected line width in pixels (> 0). Also sets the local-maximum
    /// neighborhood for peak detection.
    pub line_width: f32,
    /// Intensity threshold; local maxima above it become candidates.
    pub pixel_threshold: f32,
    /// Scan lines a focus may stay undetected and still continue its
    /// trajectory.
    pub window: usize,
    /// Positional uncertainty in pixels. `None` falls back to
    /// `line_width / 2`.
    pub sigma: Option<f32>,
    /// Expected drift in pixels per scan line.
    pub velocity: f32,
    /// Expected diffusion constant in pixels² per scan line (>= 0).
    pub diffusion: f32,
    /// Link cutoff in standard deviations of the predicted position (> 0).
    pub sigma_cutoff: f32,
    /// Minimum trajectory length in points for the post-filter.
    pub min_line_length: usize,
}

impl Default for GreedyParams {
    fn default() -> Self {
        Self {
            line_width: 5.0,
            pixel_threshold: 1.0,
            window: 8,
            sigma: None,
            velocity: 0.0,
            diffusion: 0.0,
            sigma_cutoff: 1.0,
            min_line_length: 100,
        }
    }
}

impl GreedyParams {
    /// Effective positional uncertainty.
    pub fn effective_sigma(&self) -> f32 {
        self.sigma.unwrap_or(self.line_width / 2.0)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.line_width > 0.0) {
            return Err(invalid("line_width must be > 0", self.line_width));
        }
        if self.pixel_threshold < 0.0 {
            return Err(invalid("pixel_threshold must be >= 0", self.pixel_threshold));
        }
        if let Some(s) = self.sigma {
            if !(s > 0.0) {
                return Err(invalid("sigma must be > 0 when set", s));
            }
        }
        if self.diffusion < 0.0 {
            return Err(invalid("diffusion must be >= 0", self.diffusion));
        }
        if !(self.sigma_cutoff > 0.0) {
            return Err(invalid("sigma_cutoff must be > 0", self.sigma_cutoff));
        }
        Ok(())
    }

    /// Apply one `key=value` override. On any failure the record is left
    /// unchanged.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        match key {
            "line_width" => next.line_width = parse_f32(key, value)?,
            "pixel_threshold" => next.pixel_threshold = parse_f32(key, value)?,
            "window" => next.window = parse_usize(key, value)?,
            "sigma" => {
                next.sigma = if value.eq_ignore_ascii_case("none") {
                    None
                } else {
                    Some(parse_f32(key, value)?)
                }
            }
            "velocity" | "vel" => next.velocity = parse_f32(key, value)?,
            "diffusion" => next.diffusion = parse_f32(key, value)?,
            "sigma_cutoff" => next.sigma_cutoff = parse_f32(key, value)?,
            "min_line_length" | "filter_line_length" => {
                next.min_line_length = parse_usize(key, value)?
            }
            _ => return Err(unknown_key(key)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

/// Parameters of the derivative-based line-following tracker.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineParams {
    /// Expected line width in pixels (> 0); sets the smoothing scale and
    /// the continuation search radius.
    pub line_width: f32,
    /// Maximum number of trajectories to start.
    pub max_lines: usize,
    /// Ridge-response threshold for starting a trajectory.
    pub start_threshold: f32,
    /// Ridge-response threshold for extending a trajectory.
    pub continuation_threshold: f32,
    /// Weight of angular deviation against positional distance when
    /// choosing the continuation; larger values prefer straighter lines.
    pub angle_weight: f32,
    /// Minimum trajectory length in points for the post-filter.
    pub min_line_length: usize,
}

impl Default for LineParams {
    fn default() -> Self {
        Self {
            line_width: 5.0,
            max_lines: 10,
            start_threshold: 0.005,
            continuation_threshold: 0.005,
            angle_weight: 10.0,
            min_line_length: 50,
        }
    }
}

impl LineParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.line_width > 0.0) {
            return Err(invalid("line_width must be > 0", self.line_width));
        }
        if self.max_lines == 0 {
            return Err(KymoError::InvalidParameter(
                "max_lines must be > 0".into(),
            ));
        }
        if !(self.start_threshold > 0.0) {
            return Err(invalid("start_threshold must be > 0", self.start_threshold));
        }
        if !(self.continuation_threshold > 0.0) {
            return Err(invalid(
                "continuation_threshold must be > 0",
                self.continuation_threshold,
            ));
        }
        if self.angle_weight < 0.0 {
            return Err(invalid("angle_weight must be >= 0", self.angle_weight));
        }
        Ok(())
    }

    /// Apply one `key=value` override. On any failure the record is left
    /// unchanged.
    pub fn set_field(&mut self, key: &str, value: &str) -> Result<()> {
        let mut next = self.clone();
        match key {
            "line_width" => next.line_width = parse_f32(key, value)?,
            "max_lines" => next.max_lines = parse_usize(key, value)?,
            "start_threshold" => next.start_threshold = parse_f32(key, value)?,
            "continuation_threshold" => next.continuation_threshold = parse_f32(key, value)?,
            "angle_weight" => next.angle_weight = parse_f32(key, value)?,
            "min_line_length" | "filter_line_length" => {
                next.min_line_length = parse_usize(key, value)?
            }
            _ => return Err(unknown_key(key)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn parse_f32(key: &str, value: &str) -> Result<f32> {
    value.trim().parse::<f32>().map_err(|_| {
        KymoError::InvalidParameter(format!("{key}: `{value}` is not a number"))
    })
}

fn parse_usize(key: &str, value: &str) -> Result<usize> {
    value.trim().parse::<usize>().map_err(|_| {
        KymoError::InvalidParameter(format!("{key}: `{value}` is not a non-negative integer"))
    })
}

fn invalid(msg: &str, got: f32) -> KymoError {
    KymoError::InvalidParameter(format!("{msg}, got {got}"))
}

fn unknown_key(key: &str) -> KymoError {
    KymoError::InvalidParameter(format!("unknown parameter `{key}`"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn greedy_sigma_defaults_to_half_line_width() {
        let p = GreedyParams {
            line_width: 6.0,
            ..Default::default()
        };
        assert_eq!(p.effective_sigma(), 3.0);
        let q = GreedyParams {
            sigma: Some(1.5),
            ..Default::default()
        };
        assert_eq!(q.effective_sigma(), 1.5);
    }

    #[test]
    fn set_field_parses_typed_values() {
        let mut p = GreedyParams::default();
        p.set_field("window", "3").unwrap();
        assert_eq!(p.window, 3);
        p.set_field("sigma", "2.5").unwrap();
        assert_eq!(p.sigma, Some(2.5));
        p.set_field("sigma", "none").unwrap();
        assert_eq!(p.sigma, None);
        // The legacy alias still works.
        p.set_field("vel", "-0.25").unwrap();
        assert_eq!(p.velocity, -0.25);
    }

    #[test]
    fn set_field_rejects_unknown_keys_and_garbage() {
        let mut p = GreedyParams::default();
        assert!(p.set_field("bead_line_width", "8").is_err());
        let before = p.clone();
        assert!(p.set_field("window", "8.5").is_err());
        assert_eq!(p, before);
    }

    #[test]
    fn validation_catches_bad_ranges() {
        let mut p = LineParams::default();
        assert!(p.set_field("line_width", "0").is_err());
        assert!(p.set_field("max_lines", "0").is_err());
        assert!(LineParams::default().validate().is_ok());
    }

    #[test]
    fn params_round_trip_through_json() {
        let p = GreedyParams {
            sigma: Some(2.0),
            velocity: 0.1,
            ..Default::default()
        };
        let json = serde_json::to_string(&p).unwrap();
        let q: GreedyParams = serde_json::from_str(&json).unwrap();
        assert_eq!(p, q);
    }
}
