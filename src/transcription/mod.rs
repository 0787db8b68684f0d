//! Transcription: the adapter that turns captured audio into a transcript.

pub mod cleaner;
pub mod transcriber;
pub mod whisper_api;

pub use cleaner::TranscriptCleaner;
pub use transcriber::{SpeechEngine, Transcriber, Transcript, TranscriptionError};
pub use whisper_api::WhisperApiEngine;
