//! CLI handler for the one-shot record command.
//!
//! Runs a complete session in-process: start, wait out the duration, stop,
//! print what came out. Useful for trying the pipeline without the service.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::app;
use crate::cli::RecordCliArgs;
use crate::config::Config;
use crate::session::SessionStatusHandle;

pub async fn handle_record_command(args: RecordCliArgs) -> Result<()> {
    let mut config = Config::load()?;
    if args.retain_audio {
        config.behavior.retain_audio = true;
    }

    let status = SessionStatusHandle::default();
    let mut machine = app::build_machine(&config, status)?;

    machine
        .start()
        .await
        .context("Failed to start recording")?;

    println!("Recording for {} seconds...", args.duration);
    let mut remaining = args.duration;
    while remaining > 0 {
        let step = remaining.min(5);
        tokio::time::sleep(Duration::from_secs(step)).await;
        remaining -= step;
        if remaining > 0 {
            info!("{} seconds remaining", remaining);
        }
    }

    let outcome = machine.stop().await.context("Failed to stop recording")?;

    println!("{}", outcome.message);
    if let Some(path) = &outcome.transcript_path {
        println!("Transcript: {}", path.display());
    }
    if let Some(path) = &outcome.summary_path {
        println!("Summary: {}", path.display());
    }

    Ok(())
}
