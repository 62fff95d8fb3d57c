//! Embedded practice corpora: paragraphs, code snippets, and the
//! touch-typing lesson word lists.

use include_dir::{include_dir, Dir};
use serde::Deserialize;
use serde_json::from_str;

static CORPUS_DIR: Dir = include_dir!("src/corpus");

#[derive(Deserialize, Clone, Debug)]
pub struct ParagraphSet {
    pub name: String,
    pub paragraphs: Vec<String>,
}

/// A touch-typing lesson: the keys it drills and the words composable from
/// those keys.
#[derive(Deserialize, Clone, Debug)]
pub struct Lesson {
    pub name: String,
    pub keys: String,
    pub words: Vec<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct LessonSet {
    pub lessons: Vec<Lesson>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct Snippet {
    pub language: String,
    pub code: String,
}

#[derive(Deserialize, Clone, Debug)]
pub struct SnippetSet {
    pub snippets: Vec<Snippet>,
}

impl ParagraphSet {
    pub fn load() -> Self {
        from_str(read_corpus_file("paragraphs.json")).expect("Unable to deserialize paragraph set")
    }
}

impl LessonSet {
    pub fn load() -> Self {
        from_str(read_corpus_file("lessons.json")).expect("Unable to deserialize lesson set")
    }
}

impl SnippetSet {
    pub fn load() -> Self {
        from_str(read_corpus_file("snippets.json")).expect("Unable to deserialize snippet set")
    }
}

fn read_corpus_file(file_name: &str) -> &'static str {
    CORPUS_DIR
        .get_file(file_name)
        .expect("Corpus file not found")
        .contents_utf8()
        .expect("Unable to interpret corpus file as a string")
}
