//! Synthetic kymograph generators for integration tests.

use kymotrack::image::ChannelImage;

/// A single focus drifting `slope` position pixels per scan line from
/// `start_row`, drawn at `intensity` on a zero background.
pub fn drifting_focus(
    positions: usize,
    lines: usize,
    start_row: usize,
    slope: f32,
    intensity: f32,
) -> ChannelImage {
    let mut img = ChannelImage::new(positions, lines);
    for t in 0..lines {
        let row = (start_row as f32 + slope * t as f32).round();
        if row >= 0.0 && (row as usize) < positions {
            img.set(t, row as usize, intensity);
        }
    }
    img
}

/// A stationary focus at `row` for every scan line.
pub fn static_focus(positions: usize, lines: usize, row: usize, intensity: f32) -> ChannelImage {
    drifting_focus(positions, lines, row, 0.0, intensity)
}

/// Merge two channels by per-pixel sum; shapes must match.
pub fn overlay(a: &ChannelImage, b: &ChannelImage) -> ChannelImage {
    assert_eq!(a.positions, b.positions);
    assert_eq!(a.lines, b.lines);
    let mut out = a.clone();
    for (o, &v) in out.data.iter_mut().zip(b.data.iter()) {
        *o += v;
    }
    out
}
