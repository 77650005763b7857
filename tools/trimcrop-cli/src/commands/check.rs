//! Check that the conversion binaries are usable.

use std::path::Path;

use trimcrop_common::config::{config_file_path, AppConfig};
use trimcrop_conversion::FfmpegEngine;

pub fn run(config: &AppConfig, config_path: Option<&Path>, write_config: bool) -> anyhow::Result<()> {
    println!("Trimcrop System Check");
    println!("{}", "=".repeat(50));

    match config_path {
        Some(path) => println!("[OK] Config: {}", path.display()),
        None => println!("[OK] Config: defaults or user config directory"),
    }

    if write_config {
        config
            .save()
            .map_err(|e| anyhow::anyhow!("Failed to write config: {e}"))?;
        println!("[OK] Wrote config: {}", config_file_path().display());
    }

    let engine = FfmpegEngine::new(config.engine.clone());
    let status = engine.check_binaries();
    for (name, bin, ok) in [
        ("ffmpeg", &config.engine.ffmpeg_bin, status.ffmpeg),
        ("ffprobe", &config.engine.ffprobe_bin, status.ffprobe),
    ] {
        if ok {
            println!("[OK] {name}: {bin}");
        } else {
            println!("[MISSING] {name}: {bin} could not be executed");
        }
    }

    match &config.engine.output_dir {
        Some(dir) => println!("[OK] Output directory: {}", dir.display()),
        None => match trimcrop_common::config::default_video_dir() {
            Some(dir) => println!("[OK] Output directory: {} (user videos)", dir.display()),
            None => println!("[WARN] Output directory: next to each input"),
        },
    }

    println!();
    if status.all_present() {
        println!("All required tools are available. Trimcrop is ready.");
        Ok(())
    } else {
        anyhow::bail!("Some required tools are missing. Install ffmpeg or set engine.ffmpeg_bin/ffprobe_bin in the config.")
    }
}
