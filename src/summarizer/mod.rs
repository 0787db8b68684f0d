//! Summarization: turn a transcript into structured meeting notes.

pub mod ollama;

pub use ollama::OllamaSummarizer;

use async_trait::async_trait;
use thiserror::Error;

use crate::transcription::Transcript;

/// Fixed summary used when there is no speech to summarize.
pub const NO_SPEECH_SUMMARY: &str =
    "Nothing to summarize: no speech was detected in the recording.";

#[derive(Debug, Error)]
pub enum SummarizationError {
    #[error("summarization service unavailable: {0}")]
    ServiceUnavailable(String),
    #[error("transcript text is empty")]
    EmptyInput,
}

/// Prose produced from exactly one transcript. Whatever the model returned
/// is kept verbatim; there is no schema validation pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub text: String,
}

impl Summary {
    pub fn placeholder() -> Self {
        Self {
            text: NO_SPEECH_SUMMARY.to_string(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        self.text == NO_SPEECH_SUMMARY
    }
}

#[async_trait]
pub trait SummaryService: Send + Sync {
    fn name(&self) -> &'static str;

    async fn summarize(&self, transcript: &Transcript) -> Result<Summary, SummarizationError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholder_detection() {
        assert!(Summary::placeholder().is_placeholder());
        assert!(!Summary {
            text: "Decisions were made.".to_string()
        }
        .is_placeholder());
    }
}
