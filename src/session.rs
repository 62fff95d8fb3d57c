use crate::metrics;
use crate::result::{ResultSink, SessionResult, SinkError};
use chrono::Local;
use std::collections::HashMap;

/// Lifecycle of a single timed typing attempt.
///
/// `Idle -> Running <-> Paused -> Completed -> Submitted`, with `reset`
/// re-arming from any phase. Completion is driven by the clock tick, never
/// by user action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Running,
    Paused,
    Completed,
    Submitted,
}

/// One timed typing drill: owns the target text, the typed buffer, the
/// clock, and the per-key error ledger, and derives live metrics from them.
///
/// The engine is driven entirely by external calls (`on_input`, `tick`,
/// `start`, `pause`, `reset`, `submit`) arriving from the UI event loop.
/// Calls that are invalid for the current phase are silently ignored, so
/// stray events (a late tick after reset, input before start) cannot
/// corrupt a session.
#[derive(Debug)]
pub struct Session {
    target_chars: Vec<char>,
    typed_chars: Vec<char>,
    elapsed_secs: u32,
    time_limit_secs: u32,
    phase: SessionPhase,
    key_errors: HashMap<char, u32>,
    mode: String,
    result: Option<SessionResult>,
}

impl Session {
    pub fn new(target: &str, time_limit_secs: u32, mode: &str) -> Self {
        Self {
            target_chars: target.chars().collect(),
            typed_chars: Vec::new(),
            elapsed_secs: 0,
            time_limit_secs,
            phase: SessionPhase::Idle,
            key_errors: HashMap::new(),
            mode: mode.to_string(),
            result: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn mode(&self) -> &str {
        &self.mode
    }

    pub fn target_text(&self) -> String {
        self.target_chars.iter().collect()
    }

    pub fn target_chars(&self) -> &[char] {
        &self.target_chars
    }

    pub fn typed_text(&self) -> String {
        self.typed_chars.iter().collect()
    }

    pub fn typed_chars(&self) -> &[char] {
        &self.typed_chars
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn time_limit_secs(&self) -> u32 {
        self.time_limit_secs
    }

    pub fn remaining_secs(&self) -> u32 {
        self.time_limit_secs.saturating_sub(self.elapsed_secs)
    }

    pub fn key_errors(&self) -> &HashMap<char, u32> {
        &self.key_errors
    }

    /// The finalized result, present once the session has completed.
    pub fn result(&self) -> Option<&SessionResult> {
        self.result.as_ref()
    }

    pub fn has_finished(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Completed | SessionPhase::Submitted
        )
    }

    pub fn wpm(&self) -> u32 {
        metrics::words_per_minute(&self.typed_text(), self.elapsed_secs)
    }

    pub fn accuracy_percent(&self) -> u8 {
        metrics::accuracy_percent(&self.typed_chars, &self.target_chars)
    }

    pub fn progress_percent(&self) -> f64 {
        metrics::progress_percent(self.typed_chars.len(), self.target_chars.len())
    }

    /// Begin or resume the clock. A no-op unless the session is `Idle` or
    /// `Paused`; resuming never resets elapsed time.
    pub fn start(&mut self) {
        if matches!(self.phase, SessionPhase::Idle | SessionPhase::Paused) {
            self.phase = SessionPhase::Running;
        }
    }

    /// Freeze the clock, retaining the typed buffer, elapsed time, and the
    /// error ledger. A no-op unless `Running`.
    pub fn pause(&mut self) {
        if self.phase == SessionPhase::Running {
            self.phase = SessionPhase::Paused;
        }
    }

    /// Re-arm back to `Idle`, clearing the typed buffer, the clock, the
    /// error ledger, and any pending result. `new_target` swaps in a fresh
    /// target text; `None` reuses the current one.
    pub fn reset(&mut self, new_target: Option<&str>) {
        if let Some(target) = new_target {
            self.target_chars = target.chars().collect();
        }
        self.typed_chars.clear();
        self.elapsed_secs = 0;
        self.key_errors.clear();
        self.result = None;
        self.phase = SessionPhase::Idle;
    }

    /// Replace the typed buffer with `new_text`, attributing at most one
    /// new mistake to the error ledger.
    ///
    /// Ignored unless `Running`. When the buffer grew, the single character
    /// at the previous length is compared against the target; a mismatch
    /// increments the (lowercased) key's error count. Deletions never touch
    /// the ledger: it records every mistaken keystroke ever made, not the
    /// current diff state. Input past the end of the target is discarded.
    pub fn on_input(&mut self, new_text: &str) {
        if self.phase != SessionPhase::Running {
            return;
        }

        let mut new_chars: Vec<char> = new_text.chars().collect();
        if new_chars.len() > self.target_chars.len() {
            new_chars.truncate(self.target_chars.len());
        }

        let prev_len = self.typed_chars.len();
        if new_chars.len() > prev_len {
            let appended = new_chars[prev_len];
            if self.target_chars.get(prev_len) != Some(&appended) {
                let key = appended.to_lowercase().next().unwrap_or(appended);
                *self.key_errors.entry(key).or_insert(0) += 1;
            }
        }

        self.typed_chars = new_chars;
    }

    /// Advance the clock by one second. Ignored unless `Running`; on
    /// reaching the time limit the session completes, input freezes, and
    /// the final [`SessionResult`] is snapshotted for `submit`.
    pub fn tick(&mut self) {
        if self.phase != SessionPhase::Running {
            return;
        }

        self.elapsed_secs += 1;
        if self.elapsed_secs >= self.time_limit_secs {
            self.phase = SessionPhase::Completed;
            self.result = Some(self.finalize());
        }
    }

    /// Deliver the finalized result to `sink`. Returns `Ok(true)` when a
    /// result was delivered, `Ok(false)` when the call was a no-op (not yet
    /// completed, or already submitted). On sink failure the session stays
    /// `Completed` so the caller may retry.
    pub fn submit(&mut self, sink: &mut dyn ResultSink) -> Result<bool, SinkError> {
        if self.phase != SessionPhase::Completed {
            return Ok(false);
        }
        let result = match &self.result {
            Some(result) => result,
            None => return Ok(false),
        };
        sink.submit(result)?;
        self.phase = SessionPhase::Submitted;
        Ok(true)
    }

    fn finalize(&self) -> SessionResult {
        let character_count = self.typed_chars.len() as u32;
        let accuracy_percent = self.accuracy_percent();
        // Correct count is derived from the rounded percentage rather than
        // recounted, to stay numerically identical to previously stored
        // rows. Can be off by one from a direct comparison.
        let correct_characters =
            ((f64::from(accuracy_percent) / 100.0) * f64::from(character_count)).round() as u32;

        SessionResult {
            mode: self.mode.clone(),
            wpm: self.wpm(),
            accuracy_percent,
            duration_secs: self.elapsed_secs,
            character_count,
            correct_characters,
            errors: character_count - correct_characters,
            key_errors: self.key_errors.clone(),
            completed_at: Local::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::{FailingSink, MemorySink};
    use assert_matches::assert_matches;

    fn running_session(target: &str, secs: u32) -> Session {
        let mut session = Session::new(target, secs, "paragraph");
        session.start();
        session
    }

    #[test]
    fn new_session_is_idle_and_empty() {
        let session = Session::new("hello world", 60, "paragraph");

        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.typed_text(), "");
        assert_eq!(session.elapsed_secs(), 0);
        assert_eq!(session.remaining_secs(), 60);
        assert!(session.key_errors().is_empty());
        assert!(session.result().is_none());
    }

    #[test]
    fn start_transitions_idle_to_running() {
        let mut session = Session::new("hello", 60, "paragraph");
        session.start();
        assert_eq!(session.phase(), SessionPhase::Running);

        // no-op when already running
        session.start();
        assert_eq!(session.phase(), SessionPhase::Running);
    }

    #[test]
    fn pause_freezes_clock_and_resume_keeps_elapsed() {
        let mut session = running_session("hello", 60);
        session.tick();
        session.tick();
        session.pause();
        assert_eq!(session.phase(), SessionPhase::Paused);

        // ticks while paused must not advance the clock
        session.tick();
        assert_eq!(session.elapsed_secs(), 2);

        session.start();
        assert_eq!(session.phase(), SessionPhase::Running);
        assert_eq!(session.elapsed_secs(), 2);
    }

    #[test]
    fn input_ignored_while_idle() {
        let mut session = Session::new("hello", 60, "paragraph");
        session.on_input("h");
        assert_eq!(session.typed_text(), "");
        assert!(session.key_errors().is_empty());
    }

    #[test]
    fn input_ignored_while_paused() {
        let mut session = running_session("hello", 60);
        session.on_input("h");
        session.pause();
        session.on_input("he");

        assert_eq!(session.typed_text(), "h");
    }

    #[test]
    fn input_ignored_after_completion() {
        let mut session = running_session("hi", 1);
        session.on_input("h");
        session.tick();
        assert_eq!(session.phase(), SessionPhase::Completed);

        session.on_input("hi");
        assert_eq!(session.typed_text(), "h");
        assert!(session.key_errors().is_empty());
    }

    #[test]
    fn correct_keystroke_leaves_ledger_empty() {
        let mut session = running_session("cat", 60);
        session.on_input("c");
        assert!(session.key_errors().is_empty());
    }

    #[test]
    fn mistake_is_recorded_under_lowercased_key() {
        let mut session = running_session("cat", 60);
        session.on_input("c");
        session.on_input("cX");

        assert_eq!(session.key_errors().get(&'x'), Some(&1));
    }

    #[test]
    fn backspace_never_decrements_ledger() {
        // type "c", mistype "x", correct it, finish the word
        let mut session = running_session("cat", 60);
        session.on_input("c");
        session.on_input("cx");
        assert_eq!(session.key_errors().get(&'x'), Some(&1));

        session.on_input("c");
        session.on_input("ca");
        assert_eq!(session.key_errors().get(&'x'), Some(&1));
        assert_eq!(session.key_errors().len(), 1);

        session.on_input("cat");
        assert_eq!(session.accuracy_percent(), 100);
        assert_eq!(session.key_errors().get(&'x'), Some(&1));
    }

    #[test]
    fn ledger_total_is_monotonic_across_arbitrary_edits() {
        let mut session = running_session("the quick brown", 60);
        let inputs = ["t", "tx", "t", "th", "thz", "th", "the", "the ", "the q"];
        let mut last_total = 0u32;

        for input in inputs {
            session.on_input(input);
            let total: u32 = session.key_errors().values().sum();
            assert!(total >= last_total, "ledger shrank after {input:?}");
            last_total = total;
        }
        assert_eq!(last_total, 2);
    }

    #[test]
    fn input_is_capped_at_target_length() {
        let mut session = running_session("hi", 60);
        session.on_input("h");
        session.on_input("hi");
        session.on_input("hix");

        assert_eq!(session.typed_text(), "hi");
        assert!(session.key_errors().is_empty());
        assert_eq!(session.progress_percent(), 100.0);
    }

    #[test]
    fn accuracy_defaults_to_hundred_on_empty_buffer() {
        let session = running_session("hello", 60);
        assert_eq!(session.accuracy_percent(), 100);
    }

    #[test]
    fn wpm_matches_naive_word_count_over_elapsed_minutes() {
        let mut session = running_session("a b c d e f g h i j and more", 60);
        for _ in 0..30 {
            session.tick();
        }
        session.on_input("a b c d e f g h i j");
        // 10 words in half a minute
        assert_eq!(session.wpm(), 20);
    }

    #[test]
    fn wpm_is_zero_before_clock_advances() {
        let mut session = running_session("hello there", 60);
        session.on_input("hello");
        assert_eq!(session.wpm(), 0);
    }

    #[test]
    fn completes_after_exactly_the_time_limit() {
        let mut session = running_session("hello", 3);
        session.tick();
        session.tick();
        assert_eq!(session.phase(), SessionPhase::Running);

        session.tick();
        assert_eq!(session.phase(), SessionPhase::Completed);
        assert!(session.result().is_some());
    }

    #[test]
    fn empty_session_finalizes_clean() {
        // run the clock out without typing anything
        let mut session = running_session("some target text", 60);
        for _ in 0..60 {
            session.tick();
        }

        assert_eq!(session.phase(), SessionPhase::Completed);
        let result = session.result().unwrap();
        assert_eq!(result.character_count, 0);
        assert_eq!(result.accuracy_percent, 100);
        assert_eq!(result.errors, 0);
        assert_eq!(result.wpm, 0);
        assert_eq!(result.duration_secs, 60);
    }

    #[test]
    fn finalized_result_uses_rounded_percentage_derivation() {
        let mut session = running_session("test", 2);
        session.on_input("t");
        session.on_input("tx");
        session.on_input("txs");
        session.tick();
        session.on_input("txst");
        session.tick();

        let result = session.result().unwrap();
        assert_eq!(result.accuracy_percent, 75);
        assert_eq!(result.character_count, 4);
        assert_eq!(result.correct_characters, 3);
        assert_eq!(result.errors, 1);
        assert_eq!(result.key_errors.get(&'x'), Some(&1));
        assert_eq!(result.mode, "paragraph");
    }

    #[test]
    fn submit_delivers_exactly_once() {
        let mut session = running_session("hi", 1);
        session.on_input("hi");
        session.tick();

        let mut sink = MemorySink::new();
        assert_matches!(session.submit(&mut sink), Ok(true));
        assert_eq!(session.phase(), SessionPhase::Submitted);

        assert_matches!(session.submit(&mut sink), Ok(false));
        assert_eq!(sink.submitted.len(), 1);
    }

    #[test]
    fn submit_before_completion_is_a_noop() {
        let mut session = running_session("hi", 60);
        let mut sink = MemorySink::new();
        assert_matches!(session.submit(&mut sink), Ok(false));
        assert!(sink.submitted.is_empty());
        assert_eq!(session.phase(), SessionPhase::Running);
    }

    #[test]
    fn failed_submit_leaves_session_completed_for_retry() {
        let mut session = running_session("hi", 1);
        session.tick();

        let mut bad_sink = FailingSink;
        assert!(session.submit(&mut bad_sink).is_err());
        assert_eq!(session.phase(), SessionPhase::Completed);

        let mut good_sink = MemorySink::new();
        assert_matches!(session.submit(&mut good_sink), Ok(true));
        assert_eq!(session.phase(), SessionPhase::Submitted);
    }

    #[test]
    fn reset_clears_everything_from_any_phase() {
        let mut session = running_session("cat", 2);
        session.on_input("cx");
        session.tick();
        session.tick();
        assert_eq!(session.phase(), SessionPhase::Completed);

        session.reset(Some("new target"));
        assert_eq!(session.phase(), SessionPhase::Idle);
        assert_eq!(session.typed_text(), "");
        assert_eq!(session.elapsed_secs(), 0);
        assert!(session.key_errors().is_empty());
        assert!(session.result().is_none());
        assert_eq!(session.target_text(), "new target");
    }

    #[test]
    fn reset_without_target_reuses_current_text() {
        let mut session = running_session("keep me", 60);
        session.on_input("k");
        session.reset(None);

        assert_eq!(session.target_text(), "keep me");
        assert_eq!(session.typed_text(), "");
    }

    #[test]
    fn late_tick_after_reset_does_not_mutate_new_session() {
        let mut session = running_session("hello", 60);
        session.tick();
        session.reset(None);

        // a stale timer firing after reset must be inert
        session.tick();
        assert_eq!(session.elapsed_secs(), 0);
        assert_eq!(session.phase(), SessionPhase::Idle);
    }

    #[test]
    fn metrics_frozen_outside_running() {
        let mut session = running_session("hello world", 60);
        for _ in 0..10 {
            session.tick();
        }
        session.on_input("hello");
        session.pause();

        let (wpm, acc, progress) = (
            session.wpm(),
            session.accuracy_percent(),
            session.progress_percent(),
        );
        session.on_input("hello w");
        session.tick();

        assert_eq!(session.wpm(), wpm);
        assert_eq!(session.accuracy_percent(), acc);
        assert_eq!(session.progress_percent(), progress);
    }

    #[test]
    fn unicode_input_is_compared_per_character() {
        let mut session = running_session("héllo", 60);
        session.on_input("h");
        session.on_input("hé");
        assert_eq!(session.accuracy_percent(), 100);

        session.on_input("héx");
        assert_eq!(session.key_errors().get(&'x'), Some(&1));
        assert_eq!(session.accuracy_percent(), 67);
    }
}
