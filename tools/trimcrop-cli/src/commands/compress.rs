//! Compress a whole clip to the target size.
//!
//! Follows the automatic path: the export is requested on entry through the
//! debounced trigger and fires once the window has passed.

use std::path::PathBuf;
use std::time::Instant;

use trimcrop_common::config::AppConfig;

pub async fn run(config: &AppConfig, input: PathBuf, size: Option<u32>) -> anyhow::Result<()> {
    println!("Compressing: {}", input.display());
    let mut session = super::open_session(config, &input).await?;
    if let Some(size) = size {
        session.set_target_size(size)?;
    }

    session.request_auto_export(Instant::now());
    loop {
        if session.tick(Instant::now())?.is_some() {
            break;
        }
        match session.auto_export_deadline() {
            Some(deadline) => {
                tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await
            }
            None => anyhow::bail!("automatic export was dropped"),
        }
    }

    let output = super::follow_job(&mut session).await?;
    println!("Compressed: {output}");
    Ok(())
}
