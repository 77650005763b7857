//! Trim, crop, and compress a clip.

use std::path::PathBuf;

use trimcrop_common::config::AppConfig;
use trimcrop_session_model::crop::CropRect;
use trimcrop_common::error::TrimcropResult;
use trimcrop_session_model::range::{RangeBound, TimeRange};
use trimcrop_session_model::request::ConversionRequest;

pub struct ExportArgs {
    pub input: PathBuf,
    pub start: Option<f64>,
    pub end: Option<f64>,
    pub crop: Option<String>,
    pub size: Option<u32>,
    pub dry_run: bool,
}

pub async fn run(config: &AppConfig, args: ExportArgs) -> anyhow::Result<()> {
    println!("Exporting: {}", args.input.display());
    check_range(args.start, args.end, config.editor.min_span_secs)?;
    let mut session = super::open_session(config, &args.input).await?;

    if let Some(end) = args.end {
        session.set_range_bound(RangeBound::End, end)?;
    }
    if let Some(start) = args.start {
        session.set_range_bound(RangeBound::Start, start)?;
    }
    if let Some(raw) = &args.crop {
        session.set_crop_mode(true);
        let crop = session.set_crop(parse_crop(raw)?)?;
        if crop.is_full_frame() {
            println!("  Crop too small, exporting the full frame");
        }
    }
    if let Some(size) = args.size {
        session.set_target_size(size)?;
    }

    let view = session.view();
    if let (Some(duration), Some(range)) = (view.duration, view.range) {
        println!(
            "  Range: {:.2}s .. {:.2}s of {:.2}s",
            range.start, range.end, duration
        );
    }
    println!("  Target size: {}MB", view.target_size_mb);

    if args.dry_run {
        let request = ConversionRequest::from_snapshot(&session.snapshot());
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    session.export()?;
    let output = super::follow_job(&mut session).await?;
    println!("Export complete: {output}");
    Ok(())
}

/// Reject an explicit `--start`/`--end` pair that cannot form a range.
///
/// A single bound is left to the session, which snaps it against the clip.
fn check_range(start: Option<f64>, end: Option<f64>, min_span: f64) -> TrimcropResult<()> {
    if let (Some(start), Some(end)) = (start, end) {
        TimeRange::try_new(start, end, min_span)?;
    }
    Ok(())
}

/// Parse `X,Y,WIDTH,HEIGHT` in percent.
fn parse_crop(raw: &str) -> anyhow::Result<CropRect> {
    let parts = raw
        .split(',')
        .map(|part| part.trim().parse::<f64>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!("Invalid crop '{raw}': {e}"))?;
    match parts.as_slice() {
        [x, y, width, height] => Ok(CropRect::new(*x, *y, *width, *height)),
        _ => anyhow::bail!("Invalid crop '{raw}': expected X,Y,WIDTH,HEIGHT"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trimcrop_common::error::TrimcropError;

    #[test]
    fn test_parse_crop() {
        let crop = parse_crop("10, 20,30,40").unwrap();
        assert_eq!(crop, CropRect::new(10.0, 20.0, 30.0, 40.0));
        assert!(parse_crop("10,20,30").is_err());
        assert!(parse_crop("a,b,c,d").is_err());
    }

    #[test]
    fn test_check_range() {
        assert!(check_range(Some(5.0), Some(20.0), 0.5).is_ok());
        assert!(check_range(Some(5.0), None, 0.5).is_ok());
        assert!(check_range(None, None, 0.5).is_ok());
        assert!(matches!(
            check_range(Some(20.0), Some(5.0), 0.5),
            Err(TrimcropError::InvalidRange { .. })
        ));
        assert!(check_range(Some(5.0), Some(5.2), 0.5).is_err());
    }
}
