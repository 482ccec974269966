//! Region-of-interest masks restricting tracking to a band of positions.
//!
//! Kymographs from optical-trap recordings usually carry a stationary
//! reference bead at the top and a mobile lower boundary; two mask shapes
//! cover the practical cases:
//!
//! - **Rectangle**: a fixed `[top, bottom)` band applied to every scan line.
//! - **Polyline**: a fixed top row plus a per-scan-line bottom boundary
//!   built from user control points. The boundary is horizontal at the
//!   second point's row until that point's column, floor-interpolates
//!   between consecutive points, and extrapolates the final slope through
//!   the last scan line, clamped to the image height.
//!
//! Applying a mask either zeroes everything outside the band (same-size
//! copy) or additionally crops rows to tighten the tracking input. Cropping
//! shifts positions by `row_offset`, which must be re-added when reporting
//! absolute coordinates.

use crate::error::{KymoError, Result};
use crate::image::ChannelImage;

/// Resolved analysis region for one recording. Built once per session from
/// UI-provided coordinates, then immutable.
#[derive(Clone, Debug)]
pub enum RegionMask {
    Rectangle {
        top: usize,
        bottom: usize,
    },
    Polyline {
        top: usize,
        /// Exclusive bottom row per scan line, `boundary.len() == lines`.
        boundary: Vec<usize>,
    },
}

/// A channel restricted to its mask band, rows cropped to the band extent.
#[derive(Clone, Debug)]
pub struct MaskedImage {
    pub image: ChannelImage,
    /// Rows removed above the band; add back for absolute positions.
    pub row_offset: usize,
}

impl RegionMask {
    /// Fixed band `[top, bottom)` across all scan lines.
    pub fn rectangle(top: usize, bottom: usize) -> Result<Self> {
        if top >= bottom {
            return Err(KymoError::InputShape(format!(
                "rectangle mask needs top < bottom, got top={top} bottom={bottom}"
            )));
        }
        Ok(Self::Rectangle { top, bottom })
    }

    /// Build a polyline mask from ordered `(column, row)` control points.
    ///
    /// The first point's row fixes the top of the band; the remaining
    /// points trace the bottom boundary.
    pub fn from_control_points(
        points: &[(usize, usize)],
        lines: usize,
        positions: usize,
    ) -> Result<Self> {
        if points.len() < 2 {
            return Err(KymoError::InputShape(format!(
                "polyline mask needs at least 2 control points, got {}",
                points.len()
            )));
        }
        if lines == 0 {
            return Err(KymoError::InputShape("image has no scan lines".into()));
        }
        let top = points[0].1;

        let mut boundary = vec![0usize; lines];
        let (first_col, first_row) = points[1];

        // Horizontal stretch before the first boundary point.
        let horizontal_end = first_col.min(lines);
        boundary[..horizontal_end].fill(first_row.min(positions));

        let mut prev_col = first_col;
        let mut prev_row = first_row as f64;
        let mut slope = 0.0f64;
        for &(col, row) in &points[2..] {
            if col <= prev_col {
                return Err(KymoError::InputShape(format!(
                    "polyline control points must increase in column: {col} after {prev_col}"
                )));
            }
            slope = (row as f64 - prev_row) / (col - prev_col) as f64;
            for c in prev_col..col.min(lines) {
                let v = (prev_row + (c - prev_col) as f64 * slope).floor();
                boundary[c] = clamp_row(v, positions);
            }
            prev_col = col;
            prev_row = row as f64;
        }
        // Last segment's slope carries through to the end of the kymograph.
        for c in prev_col..lines {
            let v = (prev_row + (c - prev_col) as f64 * slope).floor();
            boundary[c] = clamp_row(v, positions);
        }

        let mask = Self::Polyline { top, boundary };
        mask.validate(positions, lines)?;
        Ok(mask)
    }

    /// Top row of the band.
    pub fn top(&self) -> usize {
        match self {
            Self::Rectangle { top, .. } | Self::Polyline { top, .. } => *top,
        }
    }

    /// Exclusive bottom row for a given scan line.
    pub fn bottom(&self, line: usize) -> usize {
        match self {
            Self::Rectangle { bottom, .. } => *bottom,
            Self::Polyline { boundary, .. } => boundary[line],
        }
    }

    /// Check the mask against an image's dimensions.
    pub fn validate(&self, positions: usize, lines: usize) -> Result<()> {
        match self {
            Self::Rectangle { top, bottom } => {
                if *bottom > positions || *top >= *bottom {
                    return Err(KymoError::InputShape(format!(
                        "rectangle mask [{top}, {bottom}) outside image of {positions} positions"
                    )));
                }
            }
            Self::Polyline { top, boundary } => {
                if boundary.len() != lines {
                    return Err(KymoError::InputShape(format!(
                        "boundary covers {} scan lines, image has {lines}",
                        boundary.len()
                    )));
                }
                for (c, &b) in boundary.iter().enumerate() {
                    if b > positions || *top >= b {
                        return Err(KymoError::InputShape(format!(
                            "boundary row {b} at scan line {c} conflicts with top {top} \
                             (image of {positions} positions)"
                        )));
                    }
                }
            }
        }
        Ok(())
    }

    /// Same-size copy with all samples outside the band zeroed.
    pub fn masked(&self, image: &ChannelImage) -> Result<ChannelImage> {
        self.validate(image.positions, image.lines)?;
        let mut out = ChannelImage::new(image.positions, image.lines);
        let top = self.top();
        for t in 0..image.lines {
            let bottom = self.bottom(t);
            let src = image.line(t);
            let dst = out.line_mut(t);
            dst[top..bottom].copy_from_slice(&src[top..bottom]);
        }
        Ok(out)
    }

    /// Banded copy with rows cropped to `[top, max bottom)`. Tracking runs
    /// on this smaller array; positions come back offset by `row_offset`.
    pub fn cropped(&self, image: &ChannelImage) -> Result<MaskedImage> {
        self.validate(image.positions, image.lines)?;
        let top = self.top();
        let max_bottom = match self {
            Self::Rectangle { bottom, .. } => *bottom,
            Self::Polyline { boundary, .. } => boundary.iter().copied().max().unwrap_or(top),
        };
        let mut out = ChannelImage::new(max_bottom.saturating_sub(top), image.lines);
        for t in 0..image.lines {
            let bottom = self.bottom(t);
            let src = image.line(t);
            out.line_mut(t)[..bottom - top].copy_from_slice(&src[top..bottom]);
        }
        Ok(MaskedImage {
            image: out,
            row_offset: top,
        })
    }
}

fn clamp_row(v: f64, positions: usize) -> usize {
    if v <= 0.0 {
        0
    } else {
        (v as usize).min(positions)
    }
}
