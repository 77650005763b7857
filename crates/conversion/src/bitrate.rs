//! Bitrate planning for a target output size.
//!
//! Sizes are in megabytes, rates in kbit/s (1 MB = 8192 kbit).

use serde::{Deserialize, Serialize};

/// Kilobits per megabyte.
pub const KBIT_PER_MB: f64 = 8192.0;

/// Container and rate-control overhead allowance.
pub const OVERHEAD_FACTOR: f64 = 1.048576;

/// Encoder settings that land the output under the target size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BitratePlan {
    pub target_size_mb: u32,
    pub duration_secs: f64,
    pub audio_kbps: f64,
    pub video_kbps: u32,
}

/// Why a target size cannot be reached.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum PlanRejection {
    #[error("clip has no playable duration")]
    NoDuration,

    #[error("video can not be compressed to {target_mb}MB (audio alone needs {min_size_mb:.2}MB)")]
    TargetTooSmall { target_mb: u32, min_size_mb: f64 },
}

/// Smallest output the audio track alone allows.
pub fn min_size_mb(audio_kbps: f64, duration_secs: f64) -> f64 {
    audio_kbps * duration_secs / KBIT_PER_MB
}

/// Video bitrate that fills `size_mb` after audio.
pub fn target_video_kbps(size_mb: f64, duration_secs: f64, audio_kbps: f64) -> f64 {
    size_mb * KBIT_PER_MB / (OVERHEAD_FACTOR * duration_secs) - audio_kbps
}

/// Plan the encode of `duration_secs` of media into `target_mb`.
pub fn plan(target_mb: u32, duration_secs: f64, audio_kbps: f64) -> Result<BitratePlan, PlanRejection> {
    if !duration_secs.is_finite() || duration_secs <= 0.0 {
        return Err(PlanRejection::NoDuration);
    }
    let audio_kbps = if audio_kbps.is_finite() { audio_kbps.max(0.0) } else { 0.0 };

    let min_size = min_size_mb(audio_kbps, duration_secs);
    let too_small = PlanRejection::TargetTooSmall {
        target_mb,
        min_size_mb: min_size,
    };
    if min_size >= target_mb as f64 {
        return Err(too_small);
    }

    let video_kbps = target_video_kbps(target_mb as f64, duration_secs, audio_kbps).floor();
    if video_kbps < 1.0 {
        return Err(too_small);
    }

    Ok(BitratePlan {
        target_size_mb: target_mb,
        duration_secs,
        audio_kbps,
        video_kbps: video_kbps as u32,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_min_size() {
        // 128 kbit/s for 64s is exactly 1MB
        assert!((min_size_mb(128.0, 64.0) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_plan_for_eight_megabytes() {
        let plan = plan(8, 60.0, 125.0).unwrap();
        // 8 * 8192 / (1.048576 * 60) - 125 = 916.67
        assert_eq!(plan.video_kbps, 916);
        assert_eq!(plan.target_size_mb, 8);
    }

    #[test]
    fn test_plan_without_audio() {
        let plan = plan(8, 60.0, 0.0).unwrap();
        assert_eq!(plan.video_kbps, 1041);
    }

    #[test]
    fn test_target_below_audio_floor_is_rejected() {
        let err = plan(1, 600.0, 128.0).unwrap_err();
        assert!(matches!(err, PlanRejection::TargetTooSmall { target_mb: 1, .. }));
        assert!(err.to_string().contains("1MB"));
    }

    #[test]
    fn test_zero_duration_is_rejected() {
        assert_eq!(plan(8, 0.0, 128.0), Err(PlanRejection::NoDuration));
        assert_eq!(plan(8, f64::NAN, 128.0), Err(PlanRejection::NoDuration));
    }
}
