//! Session state shared between the machine and its callers.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Phase of the session lifecycle. The cycle is
/// Idle → Recording → Processing → Idle; Processing never regresses to
/// Recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionPhase {
    Idle,
    Recording,
    Processing,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Recording => "recording",
            Self::Processing => "processing",
        }
    }
}

/// Current session state, readable by API handlers.
#[derive(Debug, Clone)]
pub struct SessionState {
    pub phase: SessionPhase,
    /// When the current phase was entered.
    pub phase_since: chrono::DateTime<chrono::Utc>,
    /// When the active session started recording, if one is running.
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    pub last_error: Option<String>,
    /// Artifacts from the most recently completed session.
    pub transcript_path: Option<PathBuf>,
    pub summary_path: Option<PathBuf>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: SessionPhase::Idle,
            phase_since: chrono::Utc::now(),
            started_at: None,
            last_error: None,
            transcript_path: None,
            summary_path: None,
        }
    }
}

impl SessionState {
    /// Seconds spent in the current phase.
    pub fn seconds_in_phase(&self) -> u64 {
        let elapsed = chrono::Utc::now() - self.phase_since;
        elapsed.num_seconds().max(0) as u64
    }

    /// Seconds since the active session started recording.
    pub fn recording_seconds(&self) -> Option<u64> {
        self.started_at.map(|started| {
            let elapsed = chrono::Utc::now() - started;
            elapsed.num_seconds().max(0) as u64
        })
    }
}

/// Thread-safe handle for sharing session state between the machine and API
/// handlers.
#[derive(Clone, Default)]
pub struct SessionStatusHandle {
    inner: Arc<Mutex<SessionState>>,
}

impl SessionStatusHandle {
    pub async fn get(&self) -> SessionState {
        self.inner.lock().await.clone()
    }

    pub async fn begin_recording(&self) {
        let mut state = self.inner.lock().await;
        let now = chrono::Utc::now();
        state.phase = SessionPhase::Recording;
        state.phase_since = now;
        state.started_at = Some(now);
        state.last_error = None;
        state.transcript_path = None;
        state.summary_path = None;
    }

    pub async fn begin_processing(&self) {
        let mut state = self.inner.lock().await;
        state.phase = SessionPhase::Processing;
        state.phase_since = chrono::Utc::now();
    }

    /// Return to Idle, keeping the outcome visible to status readers.
    pub async fn finish(
        &self,
        error: Option<String>,
        transcript_path: Option<PathBuf>,
        summary_path: Option<PathBuf>,
    ) {
        let mut state = self.inner.lock().await;
        state.phase = SessionPhase::Idle;
        state.phase_since = chrono::Utc::now();
        state.started_at = None;
        state.last_error = error;
        state.transcript_path = transcript_path;
        state.summary_path = summary_path;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_as_str() {
        assert_eq!(SessionPhase::Idle.as_str(), "idle");
        assert_eq!(SessionPhase::Recording.as_str(), "recording");
        assert_eq!(SessionPhase::Processing.as_str(), "processing");
    }

    #[test]
    fn test_phase_serialization() {
        let json = serde_json::to_string(&SessionPhase::Recording).unwrap();
        assert_eq!(json, "\"recording\"");

        let parsed: SessionPhase = serde_json::from_str("\"processing\"").unwrap();
        assert_eq!(parsed, SessionPhase::Processing);
    }

    #[test]
    fn test_state_default() {
        let state = SessionState::default();
        assert_eq!(state.phase, SessionPhase::Idle);
        assert!(state.started_at.is_none());
        assert!(state.last_error.is_none());
        assert!(state.transcript_path.is_none());
        assert!(state.summary_path.is_none());
    }

    #[tokio::test]
    async fn test_begin_recording_resets_outcome() {
        let handle = SessionStatusHandle::default();
        handle
            .finish(
                Some("old error".to_string()),
                Some(PathBuf::from("/tmp/t.txt")),
                None,
            )
            .await;

        handle.begin_recording().await;
        let state = handle.get().await;
        assert_eq!(state.phase, SessionPhase::Recording);
        assert!(state.started_at.is_some());
        assert!(state.last_error.is_none());
        assert!(state.transcript_path.is_none());
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let handle = SessionStatusHandle::default();

        handle.begin_recording().await;
        assert_eq!(handle.get().await.phase, SessionPhase::Recording);

        handle.begin_processing().await;
        let state = handle.get().await;
        assert_eq!(state.phase, SessionPhase::Processing);
        // Recording start time survives the phase change.
        assert!(state.started_at.is_some());

        handle
            .finish(None, Some(PathBuf::from("/tmp/t.txt")), None)
            .await;
        let state = handle.get().await;
        assert_eq!(state.phase, SessionPhase::Idle);
        assert!(state.started_at.is_none());
        assert_eq!(state.transcript_path, Some(PathBuf::from("/tmp/t.txt")));
    }

    #[tokio::test]
    async fn test_finish_with_error() {
        let handle = SessionStatusHandle::default();
        handle.begin_recording().await;
        handle.begin_processing().await;
        handle.finish(Some("engine down".to_string()), None, None).await;

        let state = handle.get().await;
        assert_eq!(state.phase, SessionPhase::Idle);
        assert_eq!(state.last_error, Some("engine down".to_string()));
    }
}
