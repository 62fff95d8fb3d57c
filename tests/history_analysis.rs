//! End-to-end over the read side: sessions land in the store, history
//! analysis aggregates them, and the adaptive source picks up the weak keys.

use keystride::analysis;
use keystride::result::ResultSink;
use keystride::session::Session;
use keystride::source::{AdaptiveSource, TextSource};
use keystride::store::SqliteResultStore;
use tempfile::tempdir;

fn complete_session(target: &str, typed: &str, secs: u32, mode: &str) -> Session {
    let mut session = Session::new(target, secs, mode);
    session.start();
    let mut buffer = String::new();
    for c in typed.chars() {
        buffer.push(c);
        session.on_input(&buffer);
    }
    for _ in 0..secs {
        session.tick();
    }
    session
}

#[test]
fn history_summary_over_submitted_sessions() {
    let dir = tempdir().unwrap();
    let mut store = SqliteResultStore::open(dir.path().join("results.db")).unwrap();

    for (typed, mode) in [
        ("the quick brown", "paragraph"),
        ("the quick brXwn", "paragraph"),
        ("the quick", "touch-typing"),
    ] {
        let mut session = complete_session("the quick brown", typed, 30, mode);
        assert!(session.submit(&mut store).unwrap());
    }

    let rows = store.all().unwrap();
    assert_eq!(rows.len(), 3);

    let summary = analysis::summarize(&rows).unwrap();
    assert_eq!(summary.total_sessions, 3);
    assert!(summary.avg_wpm > 0.0);
    assert!(summary.avg_accuracy > 90.0);
    assert!(summary.best_wpm >= summary.worst_wpm);

    let totals = analysis::aggregate_key_errors(&rows);
    assert_eq!(totals.get(&'x'), Some(&1));
}

#[test]
fn adaptive_source_feeds_on_stored_key_errors() {
    let dir = tempdir().unwrap();
    let mut store = SqliteResultStore::open(dir.path().join("results.db")).unwrap();

    // repeatedly botch 'z' against a z-heavy target
    for _ in 0..3 {
        let mut session = complete_session("zzzz", "xxxx", 5, "paragraph");
        assert!(session.submit(&mut store).unwrap());
    }

    let rows = store.recent(10).unwrap();
    let totals = analysis::aggregate_key_errors(&rows);
    assert_eq!(totals.get(&'x'), Some(&12));

    let worst = analysis::problem_keys(&totals, 1);
    assert_eq!(worst[0].0, 'x');

    let mut source = AdaptiveSource::new(totals);
    let drill = source.next_text();
    assert_eq!(drill.split(' ').count(), 40);
    // the pool favors words containing the weak key
    assert!(drill.contains('x'));
}
