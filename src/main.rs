use kymotrack::config::{load_config, RunConfig};
use kymotrack::image::io::{load_channel_png, save_overlay_png, write_json_file};
use kymotrack::session::{AcceptFirst, ChannelLabel, Recording, SessionOptions, TrackingSession};
use serde::Serialize;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

#[derive(Serialize)]
struct RunReport<'a> {
    result: &'a kymotrack::SessionResult,
    settings: &'a [kymotrack::session::ParameterRecord],
}

fn run() -> Result<(), String> {
    let config_path = env::args()
        .nth(1)
        .ok_or_else(|| "usage: kymotrack <config.json>".to_string())?;
    let config = load_config(Path::new(&config_path))?;

    let image = load_channel_png(&config.input)?;
    let mask = config
        .mask
        .resolve(image.positions, image.lines)
        .map_err(|e| e.to_string())?;

    let recording = Recording {
        name: config
            .input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "kymograph".into()),
        calibration: config.calibration,
        channels: vec![(ChannelLabel::Green, image)],
    };

    let mut session = TrackingSession::new(
        mask,
        config.tracker.clone(),
        SessionOptions {
            extract_intensities: true,
            ..Default::default()
        },
        AcceptFirst,
    );
    let result = session.run(&recording).map_err(|e| e.to_string())?;

    for channel in &result.channels {
        println!(
            "{}: {} trajectories",
            channel.channel.as_str(),
            channel.trajectories.len()
        );
    }

    write_outputs(&config, &result, &recording, session.history())?;
    Ok(())
}

fn write_outputs(
    config: &RunConfig,
    result: &kymotrack::SessionResult,
    recording: &Recording,
    history: &[kymotrack::session::ParameterRecord],
) -> Result<(), String> {
    if let Some(path) = &config.output.json_out {
        let report = RunReport {
            result,
            settings: history,
        };
        write_json_file(path, &report)?;
        println!("JSON report written to {}", path.display());
    }

    if let Some(path) = &config.output.overlay_out {
        let (_, image) = &recording.channels[0];
        let tracked: Vec<(usize, usize)> = result
            .channels
            .iter()
            .flat_map(|c| c.trajectories.iter())
            .flat_map(|t| t.points())
            .map(|p| (p.time, p.position.round() as usize))
            .collect();
        save_overlay_png(image.positions, image.lines, &tracked, path)?;
        println!("Overlay written to {}", path.display());
    }
    Ok(())
}
