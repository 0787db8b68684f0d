//! Speech engine abstraction and the transcription adapter.

use async_trait::async_trait;
use thiserror::Error;
use tracing::debug;

use crate::audio::{normalize, AudioBuffer};

use super::cleaner::TranscriptCleaner;

#[derive(Debug, Error)]
pub enum TranscriptionError {
    #[error("no audio captured")]
    EmptyAudio,
    #[error("speech engine unavailable: {0}")]
    EngineUnavailable(String),
}

/// A finished transcript, tied to the audio it came from.
/// Empty text means no speech was detected; that is not a failure.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    pub audio_duration_seconds: f64,
    pub sample_rate: u32,
}

impl Transcript {
    /// The transcript of a capture that held no audio at all.
    pub fn silent(sample_rate: u32) -> Self {
        Self {
            text: String::new(),
            audio_duration_seconds: 0.0,
            sample_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// A speech-to-text engine taking mono f32 PCM at a fixed rate.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    fn name(&self) -> &'static str;

    /// Sample rate the engine expects its input at.
    fn sample_rate(&self) -> u32;

    async fn transcribe(&self, samples: &[f32]) -> Result<String, TranscriptionError>;
}

/// Normalizes captured audio into the engine's format and invokes it.
pub struct Transcriber {
    engine: Box<dyn SpeechEngine>,
    cleaner: TranscriptCleaner,
}

impl Transcriber {
    pub fn new(engine: Box<dyn SpeechEngine>) -> anyhow::Result<Self> {
        Ok(Self {
            engine,
            cleaner: TranscriptCleaner::new()?,
        })
    }

    pub fn engine_name(&self) -> &'static str {
        self.engine.name()
    }

    /// Transcribe a capture. The buffer is only read, never mutated.
    pub async fn transcribe(&self, buffer: &AudioBuffer) -> Result<Transcript, TranscriptionError> {
        if buffer.is_empty() {
            return Err(TranscriptionError::EmptyAudio);
        }

        let samples = normalize::prepare_for_engine(
            &buffer.interleaved(),
            buffer.sample_rate(),
            buffer.channels(),
            self.engine.sample_rate(),
        );

        debug!(
            "Prepared {} samples ({:.1}s) for engine {}",
            samples.len(),
            buffer.duration_seconds(),
            self.engine.name()
        );

        let raw = self.engine.transcribe(&samples).await?;
        let text = self.cleaner.clean(&raw);

        Ok(Transcript {
            text,
            audio_duration_seconds: buffer.duration_seconds(),
            sample_rate: buffer.sample_rate(),
        })
    }
}
