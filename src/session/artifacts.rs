//! Per-session artifact files.
//!
//! Each session writes up to three files into the sessions directory, all
//! named from the same start timestamp: the transcript, the summary, and
//! optionally the captured audio. Consumers just read UTF-8 text.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::info;

pub struct ArtifactPaths {
    pub transcript: PathBuf,
    pub summary: PathBuf,
    pub audio: PathBuf,
}

/// Timestamp component shared by all of a session's artifacts.
pub fn session_stamp(started: &chrono::DateTime<chrono::Local>) -> String {
    started.format("%Y%m%d_%H%M%S").to_string()
}

pub fn artifact_paths(dir: &Path, stamp: &str) -> ArtifactPaths {
    ArtifactPaths {
        transcript: dir.join(format!("session_{stamp}_transcript.txt")),
        summary: dir.join(format!("session_{stamp}_summary.txt")),
        audio: dir.join(format!("session_{stamp}.wav")),
    }
}

pub fn write_text(path: &Path, text: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create artifact directory {parent:?}"))?;
    }

    std::fs::write(path, text).with_context(|| format!("Failed to write artifact {path:?}"))?;

    info!("Artifact written: {:?} ({} chars)", path, text.len());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_deterministic() {
        let started = chrono::Local::now();
        let stamp = session_stamp(&started);
        let first = artifact_paths(Path::new("/data/sessions"), &stamp);
        let second = artifact_paths(Path::new("/data/sessions"), &stamp);

        assert_eq!(first.transcript, second.transcript);
        assert_eq!(
            first.transcript,
            PathBuf::from(format!("/data/sessions/session_{stamp}_transcript.txt"))
        );
        assert_eq!(
            first.summary,
            PathBuf::from(format!("/data/sessions/session_{stamp}_summary.txt"))
        );
        assert_eq!(
            first.audio,
            PathBuf::from(format!("/data/sessions/session_{stamp}.wav"))
        );
    }

    #[test]
    fn test_stamp_format() {
        let started = chrono::Local::now();
        let stamp = session_stamp(&started);
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.chars().nth(8), Some('_'));
    }

    #[test]
    fn test_write_text_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("transcript.txt");

        write_text(&path, "hello world").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello world");
    }

    #[test]
    fn test_write_text_empty_content_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");

        write_text(&path, "").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
