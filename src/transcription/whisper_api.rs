//! HTTP speech engine.
//!
//! Talks to a whisper-style server: the prepared mono PCM is packed into an
//! in-memory WAV, base64-encoded and posted as JSON. Any transport failure,
//! timeout or non-success status maps to `EngineUnavailable`; the engine is
//! either there or it is not.

use std::io::Cursor;
use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::transcriber::{SpeechEngine, TranscriptionError};

/// Whisper models are trained on 16kHz mono input.
const ENGINE_SAMPLE_RATE: u32 = 16_000;

#[derive(Debug, Serialize)]
struct TranscribePayload {
    /// Base64-encoded WAV.
    content: String,
    language: String,
    timestamps: bool,
}

#[derive(Debug, Deserialize)]
struct TranscribeResponse {
    text: String,
}

pub struct WhisperApiEngine {
    client: reqwest::Client,
    endpoint: String,
    language: String,
}

impl WhisperApiEngine {
    pub fn new(endpoint: String, language: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!("Initialized whisper engine with endpoint: {}", endpoint);

        Ok(Self {
            client,
            endpoint,
            language,
        })
    }

    /// Pack mono f32 samples into an in-memory 16kHz WAV.
    fn wav_bytes(samples: &[f32]) -> Result<Vec<u8>, hound::Error> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: ENGINE_SAMPLE_RATE,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer = hound::WavWriter::new(&mut cursor, spec)?;
            for &sample in samples {
                writer.write_sample(sample)?;
            }
            writer.finalize()?;
        }

        Ok(cursor.into_inner())
    }
}

#[async_trait]
impl SpeechEngine for WhisperApiEngine {
    fn name(&self) -> &'static str {
        "whisper-api"
    }

    fn sample_rate(&self) -> u32 {
        ENGINE_SAMPLE_RATE
    }

    async fn transcribe(&self, samples: &[f32]) -> Result<String, TranscriptionError> {
        let wav = Self::wav_bytes(samples)
            .map_err(|e| TranscriptionError::EngineUnavailable(format!("wav encoding: {e}")))?;

        debug!(
            "Posting {} samples ({} wav bytes) to {}",
            samples.len(),
            wav.len(),
            self.endpoint
        );

        let payload = TranscribePayload {
            content: BASE64.encode(&wav),
            language: self.language.clone(),
            timestamps: false,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    TranscriptionError::EngineUnavailable("request timed out".to_string())
                } else {
                    TranscriptionError::EngineUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TranscriptionError::EngineUnavailable(format!(
                "engine returned {status}: {body}"
            )));
        }

        let parsed: TranscribeResponse = response
            .json()
            .await
            .map_err(|e| TranscriptionError::EngineUnavailable(format!("bad response: {e}")))?;

        info!("Transcription complete: {} chars", parsed.text.len());
        Ok(parsed.text)
    }
}
