mod common;

use common::synthetic_image::{drifting_focus, overlay, static_focus};
use kymotrack::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

#[test]
fn greedy_tracks_one_diagonal_line_end_to_end() {
    init_logging();
    let image = drifting_focus(40, 30, 2, 1.0, 100.0);
    let params = TrackerParams::Greedy(GreedyParams {
        pixel_threshold: 50.0,
        window: 2,
        sigma_cutoff: 3.0,
        min_line_length: 0,
        ..Default::default()
    });
    let set = params.track(&image);
    assert_eq!(set.len(), 1, "expected one trajectory, got {}", set.len());
    assert_eq!(set[0].len(), 30);
    for pair in set[0].points().windows(2) {
        assert!(pair[1].time > pair[0].time, "time must strictly increase");
    }
}

#[test]
fn greedy_separates_two_parallel_foci() {
    init_logging();
    let image = overlay(
        &static_focus(40, 25, 8, 100.0),
        &static_focus(40, 25, 30, 100.0),
    );
    let params = TrackerParams::Greedy(GreedyParams {
        pixel_threshold: 50.0,
        window: 2,
        sigma_cutoff: 3.0,
        min_line_length: 10,
        ..Default::default()
    });
    let set = kymotrack::trajectory::filter_line_length(params.track(&image), 10);
    assert_eq!(set.len(), 2);
    let mut rows: Vec<f32> = set.iter().map(|t| t.points()[0].position).collect();
    rows.sort_by(|a, b| a.partial_cmp(b).unwrap());
    assert_eq!(rows, vec![8.0, 30.0]);
}

#[test]
fn lines_tracker_follows_crossing_free_traces() {
    init_logging();
    let image = overlay(
        &static_focus(48, 20, 10, 100.0),
        &drifting_focus(48, 20, 30, 0.5, 100.0),
    );
    let params = TrackerParams::Lines(LineParams {
        max_lines: 4,
        min_line_length: 0,
        ..Default::default()
    });
    let set = params.track(&image);
    assert_eq!(set.len(), 2);
    for traj in &set {
        assert!(traj.len() >= 18, "trace cut short at {} points", traj.len());
        for pair in traj.points().windows(2) {
            assert!(pair[1].time > pair[0].time);
        }
    }
}

#[test]
fn masked_tracking_excludes_reference_bead() {
    init_logging();
    // Stationary "bead" at row 2, mobile focus around row 20.
    let image = overlay(
        &static_focus(40, 30, 2, 200.0),
        &drifting_focus(40, 30, 18, 0.2, 100.0),
    );
    let mask = RegionMask::rectangle(10, 35).unwrap();
    let cropped = mask.cropped(&image).unwrap();
    let params = TrackerParams::Greedy(GreedyParams {
        pixel_threshold: 50.0,
        window: 2,
        sigma_cutoff: 3.0,
        min_line_length: 0,
        ..Default::default()
    });
    let set = params.track(&cropped.image);
    assert_eq!(set.len(), 1, "the bead must not be tracked");
    // Cropped coordinates plus the offset give absolute rows.
    let absolute = set[0].points()[0].position + cropped.row_offset as f32;
    assert_eq!(absolute, 18.0);
}

#[test]
fn reloaded_params_reproduce_identical_output() {
    init_logging();
    let image = drifting_focus(32, 24, 4, 0.75, 90.0);
    let params = TrackerParams::Greedy(GreedyParams {
        pixel_threshold: 40.0,
        window: 3,
        sigma: Some(2.0),
        velocity: 0.75,
        sigma_cutoff: 2.5,
        min_line_length: 0,
        ..Default::default()
    });

    let json = serde_json::to_string(&params).unwrap();
    let reloaded: TrackerParams = serde_json::from_str(&json).unwrap();
    assert_eq!(params, reloaded);

    let a = params.track(&image);
    let b = reloaded.track(&image);
    assert_eq!(a.len(), b.len());
    for (ta, tb) in a.iter().zip(&b) {
        assert_eq!(ta.points(), tb.points());
    }
}

#[test]
fn both_trackers_handle_an_empty_region() {
    init_logging();
    let image = kymotrack::ChannelImage::new(20, 20);
    let greedy = TrackerParams::Greedy(GreedyParams::default());
    let lines = TrackerParams::Lines(LineParams::default());
    assert!(greedy.track(&image).is_empty());
    assert!(lines.track(&image).is_empty());
}
