//! Show what the encoder will work with.

use std::path::PathBuf;

use trimcrop_common::config::AppConfig;
use trimcrop_conversion::bitrate;
use trimcrop_conversion::FfmpegEngine;

pub async fn run(
    config: &AppConfig,
    input: PathBuf,
    size: Option<u32>,
    json: bool,
) -> anyhow::Result<()> {
    let engine = FfmpegEngine::new(config.engine.clone());
    let probe = engine
        .probe(&input)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to probe {}: {e}", input.display()))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&probe)?);
        return Ok(());
    }

    let target = size.unwrap_or(config.editor.default_target_size_mb);
    println!("Source: {}", input.display());
    println!("  Duration:      {:.2}s", probe.duration_secs);
    match (probe.width, probe.height) {
        (Some(w), Some(h)) => println!("  Dimensions:    {w}x{h}"),
        _ => println!("  Dimensions:    unknown"),
    }
    if probe.has_audio {
        println!("  Audio bitrate: {:.1} kbit/s", probe.audio_kbps);
    } else {
        println!("  Audio:         none");
    }
    println!(
        "  Minimum size:  {:.2}MB",
        bitrate::min_size_mb(probe.audio_kbps, probe.duration_secs)
    );

    match bitrate::plan(target, probe.duration_secs, probe.audio_kbps) {
        Ok(plan) => println!("  Plan for {target}MB: video {} kbit/s", plan.video_kbps),
        Err(rejection) => println!("  Plan for {target}MB: {rejection}"),
    }
    println!(
        "  Output:        {}",
        engine.output_path(&input, target).display()
    );
    Ok(())
}
