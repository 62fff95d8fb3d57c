//! Aggregate statistics over stored results: overall averages, consistency,
//! recent-versus-older trend, and the cross-session key-error totals that
//! feed adaptive practice.

use crate::metrics::{mean, std_dev};
use crate::store::StoredResult;
use itertools::Itertools;
use std::collections::HashMap;

/// How many of the most recent sessions count as "recent" for the trend
/// comparison.
const RECENT_WINDOW: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SkillLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl SkillLevel {
    pub fn description(&self) -> &'static str {
        match self {
            SkillLevel::Beginner => "Building fundamentals",
            SkillLevel::Intermediate => "Developing fluency",
            SkillLevel::Advanced => "Pushing speed and precision",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PerformanceSummary {
    pub total_sessions: usize,
    pub avg_wpm: f64,
    pub best_wpm: u32,
    pub worst_wpm: u32,
    pub avg_accuracy: f64,
    pub total_errors: u64,
    /// Errors over all characters ever typed, as a percentage.
    pub error_rate_percent: f64,
    /// Spread of WPM across sessions; lower means more consistent.
    pub wpm_std_dev: f64,
    pub recent_avg_wpm: f64,
    /// Average over everything before the recent window; `None` until there
    /// is older history to compare against.
    pub older_avg_wpm: Option<f64>,
    pub skill: SkillLevel,
}

impl PerformanceSummary {
    /// Positive means the recent window is faster than older history.
    pub fn wpm_trend(&self) -> Option<f64> {
        self.older_avg_wpm.map(|older| self.recent_avg_wpm - older)
    }
}

/// Summarize history, expected most-recent-first as the store returns it.
/// `None` when there is no history at all.
pub fn summarize(results: &[StoredResult]) -> Option<PerformanceSummary> {
    if results.is_empty() {
        return None;
    }

    let wpms: Vec<f64> = results.iter().map(|r| f64::from(r.wpm)).collect();
    let accuracies: Vec<f64> = results
        .iter()
        .map(|r| f64::from(r.accuracy_percent))
        .collect();

    let avg_wpm = mean(&wpms).unwrap_or(0.0);
    let avg_accuracy = mean(&accuracies).unwrap_or(0.0);

    let total_errors: u64 = results.iter().map(|r| u64::from(r.errors)).sum();
    let total_characters: u64 = results.iter().map(|r| u64::from(r.character_count)).sum();
    let error_rate_percent = if total_characters > 0 {
        total_errors as f64 / total_characters as f64 * 100.0
    } else {
        0.0
    };

    let window = RECENT_WINDOW.min(results.len());
    let recent_avg_wpm = mean(&wpms[..window]).unwrap_or(0.0);
    let older_avg_wpm = mean(&wpms[window..]);

    Some(PerformanceSummary {
        total_sessions: results.len(),
        avg_wpm,
        best_wpm: results.iter().map(|r| r.wpm).max().unwrap_or(0),
        worst_wpm: results.iter().map(|r| r.wpm).min().unwrap_or(0),
        avg_accuracy,
        total_errors,
        error_rate_percent,
        wpm_std_dev: std_dev(&wpms).unwrap_or(0.0),
        recent_avg_wpm,
        older_avg_wpm,
        skill: skill_level(avg_wpm, avg_accuracy),
    })
}

/// Sum key-error maps across sessions.
pub fn aggregate_key_errors(results: &[StoredResult]) -> HashMap<char, u32> {
    let mut totals: HashMap<char, u32> = HashMap::new();
    for result in results {
        for (key, count) in &result.key_errors {
            *totals.entry(*key).or_insert(0) += count;
        }
    }
    totals
}

/// The `n` keys with the most accumulated errors, worst first. Ties break
/// alphabetically so the output is stable.
pub fn problem_keys(totals: &HashMap<char, u32>, n: usize) -> Vec<(char, u32)> {
    totals
        .iter()
        .map(|(key, count)| (*key, *count))
        .sorted_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)))
        .take(n)
        .collect()
}

pub fn skill_level(avg_wpm: f64, avg_accuracy: f64) -> SkillLevel {
    if avg_wpm < 40.0 || avg_accuracy < 85.0 {
        SkillLevel::Beginner
    } else if avg_wpm < 70.0 || avg_accuracy < 92.0 {
        SkillLevel::Intermediate
    } else {
        SkillLevel::Advanced
    }
}
