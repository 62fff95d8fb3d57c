//! Target-text providers for a session. The engine consumes an opaque
//! string; everything about where it came from lives here.

use crate::corpus::{Lesson, LessonSet, ParagraphSet, Snippet, SnippetSet};
use clap::ValueEnum;
use itertools::Itertools;
use rand::seq::SliceRandom;
use std::collections::HashMap;

/// How many words make up one composed lesson drill.
const WORDS_PER_DRILL: usize = 40;

/// Tag identifying the kind of text a session was typed against. Forwarded
/// verbatim into the stored result, so renames break history grouping.
#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum, strum_macros::Display)]
#[strum(serialize_all = "kebab-case")]
pub enum PracticeMode {
    Paragraph,
    Code,
    #[strum(serialize = "touch-typing")]
    Lesson,
    Adaptive,
    /// Caller-supplied text; not selectable from the command line.
    #[value(skip)]
    Custom,
}

impl PracticeMode {
    /// Inverse of `Display`, accepting both the stored history tag and the
    /// command-line value name for the lesson mode.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "paragraph" => Some(Self::Paragraph),
            "code" => Some(Self::Code),
            "touch-typing" | "lesson" => Some(Self::Lesson),
            "adaptive" => Some(Self::Adaptive),
            "custom" => Some(Self::Custom),
            _ => None,
        }
    }
}

/// Supplies the target string for a session. Implementations must return a
/// complete string; a session is never started without one.
pub trait TextSource {
    fn next_text(&mut self) -> String;
    fn mode(&self) -> PracticeMode;

    /// One-line description shown above the prompt, if any.
    fn banner(&self) -> Option<String> {
        None
    }
}

/// A caller-supplied text, typed as-is.
pub struct FixedSource {
    text: String,
}

impl FixedSource {
    pub fn new(text: String) -> Self {
        Self { text }
    }
}

impl TextSource for FixedSource {
    fn next_text(&mut self) -> String {
        self.text.clone()
    }

    fn mode(&self) -> PracticeMode {
        PracticeMode::Custom
    }
}

/// Random pick from the embedded paragraph corpus.
pub struct ParagraphSource {
    set: ParagraphSet,
}

impl ParagraphSource {
    pub fn new() -> Self {
        Self {
            set: ParagraphSet::load(),
        }
    }
}

impl Default for ParagraphSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TextSource for ParagraphSource {
    fn next_text(&mut self) -> String {
        let mut rng = rand::thread_rng();
        self.set
            .paragraphs
            .choose(&mut rng)
            .cloned()
            .unwrap_or_default()
    }

    fn mode(&self) -> PracticeMode {
        PracticeMode::Paragraph
    }
}

/// Random pick from the embedded code snippet corpus, optionally filtered
/// by language.
pub struct SnippetSource {
    pool: Vec<Snippet>,
}

impl SnippetSource {
    pub fn new(language: Option<&str>) -> Self {
        let set = SnippetSet::load();
        let pool: Vec<Snippet> = match language {
            Some(lang) => {
                let filtered: Vec<Snippet> = set
                    .snippets
                    .iter()
                    .filter(|s| s.language.eq_ignore_ascii_case(lang))
                    .cloned()
                    .collect();
                if filtered.is_empty() {
                    log::warn!("no snippets for language {lang:?}, using full corpus");
                    set.snippets
                } else {
                    filtered
                }
            }
            None => set.snippets,
        };
        Self { pool }
    }
}

impl TextSource for SnippetSource {
    fn next_text(&mut self) -> String {
        let mut rng = rand::thread_rng();
        self.pool
            .choose(&mut rng)
            .map(|s| s.code.clone())
            .unwrap_or_default()
    }

    fn mode(&self) -> PracticeMode {
        PracticeMode::Code
    }
}

/// Composes a drill of random words from one touch-typing lesson.
pub struct LessonSource {
    lesson: Lesson,
    words_per_drill: usize,
}

impl LessonSource {
    /// Out-of-range indexes clamp to the last lesson.
    pub fn new(lesson_index: usize) -> Self {
        let set = LessonSet::load();
        let clamped = lesson_index.min(set.lessons.len() - 1);
        if clamped != lesson_index {
            log::warn!("lesson index {lesson_index} out of range, using {clamped}");
        }
        Self {
            lesson: set.lessons[clamped].clone(),
            words_per_drill: WORDS_PER_DRILL,
        }
    }

    pub fn lesson_name(&self) -> &str {
        &self.lesson.name
    }

    pub fn focus_keys(&self) -> &str {
        &self.lesson.keys
    }
}

impl TextSource for LessonSource {
    fn next_text(&mut self) -> String {
        let mut rng = rand::thread_rng();
        let mut words = Vec::with_capacity(self.words_per_drill);
        for _ in 0..self.words_per_drill {
            if let Some(word) = self.lesson.words.choose(&mut rng) {
                words.push(word.as_str());
            }
        }
        words.join(" ")
    }

    fn mode(&self) -> PracticeMode {
        PracticeMode::Lesson
    }

    fn banner(&self) -> Option<String> {
        Some(format!(
            "{} - focus keys: {}",
            self.lesson.name, self.lesson.keys
        ))
    }
}

/// Composes a drill biased toward the user's weakest keys.
///
/// Words are scored by the accumulated error counts of the characters they
/// contain; the drill samples from the highest-scoring third of the pool so
/// weak keys come up often without the text degenerating into one word.
pub struct AdaptiveSource {
    pool: Vec<String>,
    key_error_totals: HashMap<char, u32>,
    words_per_drill: usize,
}

impl AdaptiveSource {
    pub fn new(key_error_totals: HashMap<char, u32>) -> Self {
        let set = LessonSet::load();
        let pool = set
            .lessons
            .into_iter()
            .flat_map(|lesson| lesson.words)
            .collect();
        Self {
            pool,
            key_error_totals,
            words_per_drill: WORDS_PER_DRILL,
        }
    }

    fn word_score(&self, word: &str) -> u32 {
        word.chars()
            .map(|c| {
                let key = c.to_lowercase().next().unwrap_or(c);
                self.key_error_totals.get(&key).copied().unwrap_or(0)
            })
            .sum()
    }
}

impl TextSource for AdaptiveSource {
    fn next_text(&mut self) -> String {
        let mut rng = rand::thread_rng();

        if self.key_error_totals.is_empty() {
            // Nothing to adapt to yet; plain random drill
            let mut words = Vec::with_capacity(self.words_per_drill);
            for _ in 0..self.words_per_drill {
                if let Some(word) = self.pool.choose(&mut rng) {
                    words.push(word.as_str());
                }
            }
            return words.join(" ");
        }

        let mut scored: Vec<(&String, u32)> = self
            .pool
            .iter()
            .map(|word| (word, self.word_score(word)))
            .collect();
        scored.sort_by(|a, b| b.1.cmp(&a.1));

        // Sample from the top third so weak keys dominate without the
        // drill collapsing onto a handful of words
        let pool_size = (scored.len() / 3).max(1);
        let selection_pool = &scored[0..pool_size];

        let mut words = Vec::with_capacity(self.words_per_drill);
        for _ in 0..self.words_per_drill {
            if let Some((word, _)) = selection_pool.choose(&mut rng) {
                words.push(word.as_str());
            }
        }
        words.join(" ")
    }

    fn mode(&self) -> PracticeMode {
        PracticeMode::Adaptive
    }

    fn banner(&self) -> Option<String> {
        let targets = crate::analysis::problem_keys(&self.key_error_totals, 5);
        if targets.is_empty() {
            return None;
        }
        let keys: String = targets
            .iter()
            .map(|(key, _)| *key)
            .map(|c| if c == ' ' { '␣' } else { c })
            .join(" ");
        Some(format!("adaptive drill - weak keys: {keys}"))
    }
}
