//! Pure metric formulas shared by the session engine and history analysis.

/// Number of words in the typed buffer, counted by a naive split on single
/// spaces. Consecutive spaces therefore contribute empty tokens, matching
/// how the live WPM readout has always been computed; stored history
/// depends on this counting staying put.
pub fn word_count(typed: &str) -> usize {
    if typed.is_empty() {
        return 0;
    }
    typed.split(' ').count()
}

/// Words per minute over elapsed whole seconds. Zero until the clock has
/// actually advanced.
pub fn words_per_minute(typed: &str, elapsed_secs: u32) -> u32 {
    if elapsed_secs == 0 {
        return 0;
    }
    let minutes = f64::from(elapsed_secs) / 60.0;
    (word_count(typed) as f64 / minutes).round() as u32
}

/// Percentage of positionally-correct characters in the typed buffer.
/// An empty buffer scores 100; a typed character with no counterpart in
/// the target counts as incorrect.
pub fn accuracy_percent(typed: &[char], target: &[char]) -> u8 {
    if typed.is_empty() {
        return 100;
    }
    let correct = typed
        .iter()
        .enumerate()
        .filter(|(idx, c)| target.get(*idx) == Some(*c))
        .count();
    ((correct as f64 / typed.len() as f64) * 100.0).round() as u8
}

/// How far through the target the typed buffer has advanced, as a
/// percentage. An empty target reports 0.
pub fn progress_percent(typed_len: usize, target_len: usize) -> f64 {
    if target_len == 0 {
        return 0.0;
    }
    (typed_len as f64 / target_len as f64) * 100.0
}

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

pub fn std_dev(data: &[f64]) -> Option<f64> {
    match (mean(data), data.len()) {
        (Some(data_mean), count) if count > 0 => {
            let variance = data
                .iter()
                .map(|value| {
                    let diff = data_mean - *value;

                    diff * diff
                })
                .sum::<f64>()
                / count as f64;

            Some(variance.sqrt())
        }
        _ => None,
    }
}
