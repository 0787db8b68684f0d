//! Summarization over a local Ollama endpoint.
//!
//! One `POST {endpoint}/api/generate` call per transcript, non-streaming,
//! with a request timeout standing in for cancellation. The endpoint being
//! down, an error status, or a timeout all map to `ServiceUnavailable`.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::transcription::Transcript;

use super::{SummarizationError, Summary, SummaryService};

const GENERATE_PATH: &str = "/api/generate";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaSummarizer {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl OllamaSummarizer {
    pub fn new(endpoint: String, model: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        info!(
            "Initialized summarizer: model {} at {}",
            model, endpoint
        );

        Ok(Self {
            client,
            endpoint,
            model,
        })
    }

    /// Instruction prompt wrapping the transcript, asking for headed,
    /// itemized notes.
    fn build_prompt(transcript: &str) -> String {
        format!(
            "Analyze this meeting transcript and provide a structured summary:\n\
             \n\
             MEETING SUMMARY\n\
             ===============\n\
             \n\
             KEY DECISIONS:\n\
             - [decisions that were made]\n\
             \n\
             ACTION ITEMS:\n\
             - [tasks and who owns them]\n\
             \n\
             DEADLINES & DATES:\n\
             - [any deadlines or dates mentioned]\n\
             \n\
             IMPORTANT POINTS:\n\
             - [significant discussion points]\n\
             \n\
             NEXT STEPS:\n\
             - [planned follow-up actions]\n\
             \n\
             TRANSCRIPT:\n\
             {transcript}\n\
             \n\
             Be thorough and capture all important information."
        )
    }

    /// One generate round-trip. Rejects an empty prompt before touching the
    /// network.
    async fn generate(&self, prompt: &str) -> Result<String, SummarizationError> {
        if prompt.trim().is_empty() {
            return Err(SummarizationError::EmptyInput);
        }

        let url = format!("{}{}", self.endpoint.trim_end_matches('/'), GENERATE_PATH);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions { temperature: 0.3 },
        };

        debug!("Posting {} prompt chars to {}", prompt.len(), url);

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    SummarizationError::ServiceUnavailable("request timed out".to_string())
                } else {
                    SummarizationError::ServiceUnavailable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SummarizationError::ServiceUnavailable(format!(
                "endpoint returned {status}"
            )));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            SummarizationError::ServiceUnavailable(format!("bad response: {e}"))
        })?;

        Ok(parsed.response)
    }
}

#[async_trait]
impl SummaryService for OllamaSummarizer {
    fn name(&self) -> &'static str {
        "ollama"
    }

    async fn summarize(&self, transcript: &Transcript) -> Result<Summary, SummarizationError> {
        if transcript.is_empty() {
            // Nothing to send; skip the round-trip entirely.
            return Ok(Summary::placeholder());
        }

        let prompt = Self::build_prompt(&transcript.text);
        let text = self.generate(&prompt).await?;

        info!("Summary generated: {} chars", text.len());
        Ok(Summary { text })
    }
}
