//! Session orchestrator.
//!
//! Sequences capture, transcription and summarization for one session at a
//! time: Idle → Recording → Processing → Idle. Processing runs synchronously
//! on the caller's task; whatever fails inside it is folded into the outcome
//! and the machine still lands back in Idle. Collaborators are injected
//! through the constructor.

use std::path::PathBuf;

use tracing::{error, info, warn};

use crate::audio::{AudioBuffer, CaptureConfig, CaptureError, Recorder};
use crate::summarizer::{Summary, SummaryService};
use crate::transcription::{Transcriber, Transcript, TranscriptionError};

use super::artifacts;
use super::status::{SessionPhase, SessionStatusHandle};

pub struct SessionOptions {
    pub sessions_dir: PathBuf,
    pub capture: CaptureConfig,
    /// Keep the captured WAV next to the text artifacts.
    pub retain_audio: bool,
}

/// What a stopped session produced. The message is meant to be spoken or
/// printed as-is and tells the caller what to do next.
#[derive(Debug)]
pub struct SessionOutcome {
    pub success: bool,
    pub message: String,
    pub transcript_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
    pub transcript_chars: usize,
    pub audio_seconds: f64,
}

pub struct SessionMachine {
    recorder: Recorder,
    transcriber: Transcriber,
    summarizer: Box<dyn SummaryService>,
    status: SessionStatusHandle,
    options: SessionOptions,
    started_at: Option<chrono::DateTime<chrono::Local>>,
}

impl SessionMachine {
    pub fn new(
        recorder: Recorder,
        transcriber: Transcriber,
        summarizer: Box<dyn SummaryService>,
        status: SessionStatusHandle,
        options: SessionOptions,
    ) -> Self {
        Self {
            recorder,
            transcriber,
            summarizer,
            status,
            options,
            started_at: None,
        }
    }

    /// Idle → Recording. On failure the machine stays Idle.
    pub async fn start(&mut self) -> Result<(), CaptureError> {
        let state = self.status.get().await;
        if state.phase != SessionPhase::Idle {
            return Err(CaptureError::AlreadyRecording);
        }

        self.recorder.start(self.options.capture.clone())?;
        self.started_at = Some(chrono::Local::now());
        self.status.begin_recording().await;

        info!("Session recording started");
        Ok(())
    }

    /// Recording → Processing → Idle. Drains the capture, transcribes,
    /// summarizes (only for non-empty transcripts) and persists whatever
    /// succeeded.
    pub async fn stop(&mut self) -> Result<SessionOutcome, CaptureError> {
        let state = self.status.get().await;
        if state.phase != SessionPhase::Recording {
            return Err(CaptureError::NotRecording);
        }

        self.status.begin_processing().await;

        let buffer = match self.recorder.stop() {
            Ok(buffer) => buffer,
            Err(e) => {
                // Capture state went sideways; do not wedge in Processing.
                self.status.finish(Some(e.to_string()), None, None).await;
                self.started_at = None;
                return Err(e);
            }
        };

        let outcome = self.process(buffer).await;

        let error = if outcome.success {
            None
        } else {
            Some(outcome.message.clone())
        };
        self.status
            .finish(
                error,
                outcome.transcript_path.clone(),
                outcome.summary_path.clone(),
            )
            .await;
        self.started_at = None;

        Ok(outcome)
    }

    /// Side-effect-free snapshot of the current state.
    pub async fn status(&self) -> super::status::SessionState {
        self.status.get().await
    }

    async fn process(&self, buffer: AudioBuffer) -> SessionOutcome {
        let started = self.started_at.unwrap_or_else(chrono::Local::now);
        let stamp = artifacts::session_stamp(&started);
        let paths = artifacts::artifact_paths(&self.options.sessions_dir, &stamp);
        let audio_seconds = buffer.duration_seconds();

        if self.options.retain_audio && !buffer.is_empty() {
            if let Err(e) = buffer.write_wav(&paths.audio) {
                warn!("Failed to keep session audio: {e:#}");
            }
        }

        // An empty capture is "no speech detected", not a failure.
        let transcript = match self.transcriber.transcribe(&buffer).await {
            Ok(transcript) => transcript,
            Err(TranscriptionError::EmptyAudio) => Transcript::silent(buffer.sample_rate()),
            Err(e) => {
                error!("Transcription failed: {e}");
                return SessionOutcome {
                    success: false,
                    message: format!(
                        "Recording captured {audio_seconds:.1}s of audio but transcription \
                         failed: {e}. Retry the session."
                    ),
                    transcript_path: None,
                    summary_path: None,
                    transcript_chars: 0,
                    audio_seconds,
                };
            }
        };

        let transcript_path = match artifacts::write_text(&paths.transcript, &transcript.text) {
            Ok(()) => Some(paths.transcript.clone()),
            Err(e) => {
                error!("Failed to write transcript artifact: {e:#}");
                None
            }
        };

        // Guarded: a silent transcript gets the fixed placeholder without a
        // service round-trip.
        let summary_result = if transcript.is_empty() {
            Ok(Summary::placeholder())
        } else {
            self.summarizer.summarize(&transcript).await
        };

        match summary_result {
            Ok(summary) => {
                let summary_path = match artifacts::write_text(&paths.summary, &summary.text) {
                    Ok(()) => Some(paths.summary.clone()),
                    Err(e) => {
                        error!("Failed to write summary artifact: {e:#}");
                        None
                    }
                };

                let message = if transcript.is_empty() {
                    "No speech detected; the transcript is empty and nothing was summarized."
                        .to_string()
                } else {
                    format!(
                        "Session complete: {audio_seconds:.1}s of audio, {} transcript chars, \
                         summary saved.",
                        transcript.text.len()
                    )
                };

                SessionOutcome {
                    success: true,
                    message,
                    transcript_path,
                    summary_path,
                    transcript_chars: transcript.text.len(),
                    audio_seconds,
                }
            }
            Err(e) => {
                warn!("Summarization failed, transcript kept: {e}");
                SessionOutcome {
                    success: false,
                    message: format!(
                        "Transcription succeeded but summarization failed: {e}. The transcript \
                         is saved; re-run summarization from it."
                    ),
                    transcript_path,
                    summary_path: None,
                    transcript_chars: transcript.text.len(),
                    audio_seconds,
                }
            }
        }
    }
}
