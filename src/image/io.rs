//! I/O helpers for the demo tool: PNG in/out and JSON reports.
//!
//! The vendor container formats (TDMS/HDF5) are loader concerns outside
//! this crate; the demo binary accepts a grayscale PNG standing in for one
//! photon-count channel.

use super::ChannelImage;
use image::{GrayImage, Luma};
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Load a grayscale PNG as a photon-count channel. Image rows map to
/// positions and image columns to scan lines, matching how kymographs are
/// displayed.
pub fn load_channel_png(path: &Path) -> Result<ChannelImage, String> {
    let img = image::open(path)
        .map_err(|e| format!("Failed to open {}: {e}", path.display()))?
        .into_luma8();
    let positions = img.height() as usize;
    let lines = img.width() as usize;
    let mut out = ChannelImage::new(positions, lines);
    for (x, y, px) in img.enumerate_pixels() {
        out.set(x as usize, y as usize, px.0[0] as f32);
    }
    Ok(out)
}

/// Save a display-rescaled channel to a grayscale PNG (positions down,
/// time rightward).
pub fn save_channel_png(image: &ChannelImage, path: &Path) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let buf = image.to_display_u8();
    let out: GrayImage =
        GrayImage::from_raw(image.lines as u32, image.positions as u32, buf)
            .ok_or_else(|| "Failed to create image buffer".to_string())?;
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Save a binary mapped-lines overlay: tracked pixels white on black.
/// Mirrors the quality-control figure the interactive workflow shows after
/// each tracking attempt.
pub fn save_overlay_png(
    positions: usize,
    lines: usize,
    tracked: &[(usize, usize)],
    path: &Path,
) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let mut out = GrayImage::new(lines as u32, positions as u32);
    for &(t, p) in tracked {
        if t < lines && p < positions {
            out.put_pixel(t as u32, p as u32, Luma([255u8]));
        }
    }
    out.save(path)
        .map_err(|e| format!("Failed to save {}: {e}", path.display()))
}

/// Serialize a value as pretty JSON to `path`, creating parent directories.
pub fn write_json_file<T: Serialize>(path: &Path, value: &T) -> Result<(), String> {
    ensure_parent_dir(path)?;
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| format!("Failed to serialize JSON for {}: {e}", path.display()))?;
    fs::write(path, json).map_err(|e| format!("Failed to write JSON {}: {e}", path.display()))
}

fn ensure_parent_dir(path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create {}: {e}", parent.display()))?;
        }
    }
    Ok(())
}
