use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Finalized summary of one completed session. Built exactly once, on the
/// transition to `Completed`, and handed to a [`ResultSink`] on submit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionResult {
    /// Tag identifying the text source ("paragraph", "code", ...).
    pub mode: String,
    pub wpm: u32,
    pub accuracy_percent: u8,
    pub duration_secs: u32,
    pub character_count: u32,
    pub correct_characters: u32,
    pub errors: u32,
    /// Per-key mistake counts accumulated over the session, keyed by the
    /// lowercased character that was actually typed.
    pub key_errors: HashMap<char, u32>,
    pub completed_at: DateTime<Local>,
}

#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("result store error: {0}")]
    Storage(#[from] rusqlite::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("result encoding error: {0}")]
    Encoding(#[from] serde_json::Error),
    #[error("csv export error: {0}")]
    Csv(#[from] csv::Error),
    #[error("stored timestamp is malformed: {0}")]
    Timestamp(#[from] chrono::ParseError),
}

/// Durable destination for finished sessions. The engine delivers each
/// result at most once and stays `Completed` on failure so the caller can
/// retry.
pub trait ResultSink {
    fn submit(&mut self, result: &SessionResult) -> Result<(), SinkError>;
}

/// In-process sink, used by tests and as a fallback when no database is
/// available.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub submitted: Vec<SessionResult>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResultSink for MemorySink {
    fn submit(&mut self, result: &SessionResult) -> Result<(), SinkError> {
        self.submitted.push(result.clone());
        Ok(())
    }
}

/// Sink that refuses every submission; lets tests exercise the retry path.
#[derive(Debug, Default)]
pub struct FailingSink;

impl ResultSink for FailingSink {
    fn submit(&mut self, _result: &SessionResult) -> Result<(), SinkError> {
        Err(SinkError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            "sink rejected result",
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_result() -> SessionResult {
        SessionResult {
            mode: "paragraph".into(),
            wpm: 42,
            accuracy_percent: 97,
            duration_secs: 60,
            character_count: 210,
            correct_characters: 204,
            errors: 6,
            key_errors: HashMap::from([('x', 2), ('q', 1)]),
            completed_at: Local::now(),
        }
    }

    #[test]
    fn memory_sink_records_submissions() {
        let mut sink = MemorySink::new();
        let result = sample_result();
        sink.submit(&result).unwrap();
        assert_eq!(sink.submitted.len(), 1);
        assert_eq!(sink.submitted[0], result);
    }

    #[test]
    fn failing_sink_always_errors() {
        let mut sink = FailingSink;
        assert!(sink.submit(&sample_result()).is_err());
    }

    #[test]
    fn result_roundtrips_through_json() {
        let result = sample_result();
        let json = serde_json::to_string(&result).unwrap();
        let back: SessionResult = serde_json::from_str(&json).unwrap();
        assert_eq!(result, back);
    }
}
