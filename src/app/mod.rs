use crate::api::{ApiCommand, ApiServer, CommandReply};
use crate::audio::{CpalBackend, Recorder};
use crate::config::Config;
use crate::global;
use crate::session::{SessionMachine, SessionOptions, SessionStatusHandle};
use crate::summarizer::OllamaSummarizer;
use crate::transcription::{Transcriber, WhisperApiEngine};
use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{error, info};

pub async fn run_service() -> Result<()> {
    info!("Starting minuter service");

    let config = Config::load()?;
    let port = config.server.port;

    let (tx, mut rx) = mpsc::channel::<ApiCommand>(10);
    let status_handle = SessionStatusHandle::default();
    let mut machine = build_machine(&config, status_handle.clone())?;

    let api_server = ApiServer::new(tx, status_handle.clone(), port);
    tokio::spawn(async move {
        if let Err(e) = api_server.start().await {
            error!("API server failed: {}", e);
        }
    });

    info!("Minuter is ready!");
    info!("Start a session:  curl -X POST http://127.0.0.1:{port}/start");
    info!("Stop and process: curl -X POST http://127.0.0.1:{port}/stop");

    while let Some(command) = rx.recv().await {
        match command {
            ApiCommand::StartSession { reply } => {
                let result = match machine.start().await {
                    Ok(()) => CommandReply {
                        success: true,
                        message: "Recording started.".to_string(),
                    },
                    Err(e) => {
                        error!("Failed to start session: {}", e);
                        CommandReply {
                            success: false,
                            message: format!("Could not start recording: {e}."),
                        }
                    }
                };
                let _ = reply.send(result);
            }
            ApiCommand::StopSession { reply } => {
                // Processing runs inline; the reply carries the real outcome.
                let result = match machine.stop().await {
                    Ok(outcome) => {
                        info!("{}", outcome.message);
                        CommandReply {
                            success: outcome.success,
                            message: outcome.message,
                        }
                    }
                    Err(e) => CommandReply {
                        success: false,
                        message: format!("Could not stop recording: {e}."),
                    },
                };
                let _ = reply.send(result);
            }
        }
    }

    Ok(())
}

/// Assemble a session machine from the production parts the config names.
pub fn build_machine(
    config: &Config,
    status: SessionStatusHandle,
) -> Result<SessionMachine> {
    let recorder = Recorder::new(Arc::new(CpalBackend::new()));

    let engine = WhisperApiEngine::new(
        config.transcription.endpoint.clone(),
        config.transcription.language.clone(),
        Duration::from_secs(config.transcription.timeout_seconds),
    )?;
    let transcriber = Transcriber::new(Box::new(engine))?;

    let summarizer = OllamaSummarizer::new(
        config.summarizer.endpoint.clone(),
        config.summarizer.model.clone(),
        Duration::from_secs(config.summarizer.timeout_seconds),
    )?;

    Ok(SessionMachine::new(
        recorder,
        transcriber,
        Box::new(summarizer),
        status,
        SessionOptions {
            sessions_dir: global::sessions_dir()?,
            capture: config.capture.clone(),
            retain_audio: config.behavior.retain_audio,
        },
    ))
}
