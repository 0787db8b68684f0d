//! Cleanup of raw speech-engine output.
//!
//! Whisper-style engines emit per-segment lines, sometimes prefixed with
//! `[00:00:00.000 --> 00:00:03.280]` markers depending on server settings.
//! The cleaner strips the markers and joins segments into one paragraph.

use anyhow::Result;
use regex::Regex;
use tracing::debug;

pub struct TranscriptCleaner {
    timestamp_marker: Regex,
}

impl TranscriptCleaner {
    pub fn new() -> Result<Self> {
        // Both `.` and `:` millisecond separators show up in the wild.
        let timestamp_marker =
            Regex::new(r"\[\d{2}:\d{2}:\d{2}[:.]\d{3}\s*-->\s*\d{2}:\d{2}:\d{2}[:.]\d{3}\]\s*")?;

        Ok(Self { timestamp_marker })
    }

    pub fn clean(&self, raw: &str) -> String {
        let mut joined = String::new();

        for line in raw.lines() {
            let stripped = self.timestamp_marker.replace_all(line, "");
            let trimmed = stripped.trim();
            if trimmed.is_empty() {
                continue;
            }
            if !joined.is_empty() {
                joined.push(' ');
            }
            joined.push_str(trimmed);
        }

        let result = joined.trim().to_string();
        debug!("Cleaned {} chars to {} chars", raw.len(), result.len());
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_timestamp_markers() {
        let cleaner = TranscriptCleaner::new().unwrap();
        let raw = "[00:00:00.000 --> 00:00:03.280] hello there\n[00:00:03.280 --> 00:00:05.000] general";
        assert_eq!(cleaner.clean(raw), "hello there general");
    }

    #[test]
    fn test_colon_millisecond_separator() {
        let cleaner = TranscriptCleaner::new().unwrap();
        assert_eq!(
            cleaner.clean("[00:00:00:000 --> 00:00:03:280] spoken words"),
            "spoken words"
        );
    }

    #[test]
    fn test_plain_text_passes_through_trimmed() {
        let cleaner = TranscriptCleaner::new().unwrap();
        assert_eq!(cleaner.clean("  already clean  "), "already clean");
    }

    #[test]
    fn test_blank_lines_dropped() {
        let cleaner = TranscriptCleaner::new().unwrap();
        assert_eq!(cleaner.clean("one\n\n\ntwo"), "one two");
    }

    #[test]
    fn test_empty_input_stays_empty() {
        let cleaner = TranscriptCleaner::new().unwrap();
        assert_eq!(cleaner.clean(""), "");
    }
}
