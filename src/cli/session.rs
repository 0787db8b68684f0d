//! CLI handler for session commands.
//!
//! All commands talk to a running service over its HTTP API.

use anyhow::{bail, Context, Result};
use serde_json::Value;

use crate::cli::{SessionCliArgs, SessionCommand};
use crate::config::Config;

pub async fn handle_session_command(args: SessionCliArgs) -> Result<()> {
    let config = Config::load()?;
    let base_url = format!("http://127.0.0.1:{}", config.server.port);

    match args.command {
        SessionCommand::Start => start_session(&base_url).await,
        SessionCommand::Stop => stop_session(&base_url).await,
        SessionCommand::Status => show_status(&base_url).await,
    }
}

async fn start_session(base_url: &str) -> Result<()> {
    let json = post(base_url, "/start").await?;
    print_reply(&json);
    Ok(())
}

async fn stop_session(base_url: &str) -> Result<()> {
    let json = post(base_url, "/stop").await?;
    print_reply(&json);

    if let Some(path) = json.get("transcript_path").and_then(|v| v.as_str()) {
        println!("Transcript: {path}");
    }
    if let Some(path) = json.get("summary_path").and_then(|v| v.as_str()) {
        println!("Summary: {path}");
    }

    Ok(())
}

async fn show_status(base_url: &str) -> Result<()> {
    let client = reqwest::Client::new();
    let response = client
        .get(format!("{base_url}/status"))
        .send()
        .await
        .context("Failed to connect to minuter service. Is it running?")?;

    let json: Value = response.json().await?;

    println!(
        "Phase: {} (for {}s)",
        json.get("phase").and_then(|v| v.as_str()).unwrap_or("unknown"),
        json.get("seconds_in_phase").and_then(|v| v.as_u64()).unwrap_or(0),
    );

    if let Some(seconds) = json.get("recording_seconds").and_then(|v| v.as_u64()) {
        println!("Recording for: {seconds}s");
    }
    if let Some(error) = json.get("last_error").and_then(|v| v.as_str()) {
        println!("Last error: {error}");
    }

    Ok(())
}

async fn post(base_url: &str, path: &str) -> Result<Value> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("{base_url}{path}"))
        .send()
        .await
        .context("Failed to connect to minuter service. Is it running?")?;

    let status = response.status();
    let json: Value = response.json().await?;

    if !status.is_success() {
        bail!(
            "Service error: {}",
            json.get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Unknown error")
        );
    }

    Ok(json)
}

fn print_reply(json: &Value) {
    let message = json
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("No message");
    println!("{message}");
}
