use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::collections::HashMap;
use std::io::{self, stdin};
use std::path::PathBuf;
use std::time::{Duration, SystemTime};
use time_humanize::HumanTime;

use keystride::{
    analysis,
    app::App,
    config::{Config, ConfigStore, FileConfigStore},
    result::{MemorySink, ResultSink},
    runtime::{CrosstermEventSource, EventSource},
    source::{
        AdaptiveSource, FixedSource, LessonSource, ParagraphSource, PracticeMode, SnippetSource,
        TextSource,
    },
    store::SqliteResultStore,
    ui,
};

/// terminal typing trainer with timed drills and per-key analytics
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing trainer: timed paragraph, code, and touch-typing drills with live WPM and accuracy, a persistent result history, and adaptive practice that targets your weakest keys."
)]
struct Cli {
    /// number of seconds per session
    #[clap(short = 's', long)]
    seconds: Option<u32>,

    /// practice mode
    #[clap(short = 'm', long, value_enum)]
    mode: Option<PracticeMode>,

    /// touch-typing lesson index (0 = home row .. 4 = mixed)
    #[clap(short = 'l', long)]
    lesson: Option<usize>,

    /// snippet language for code mode (rust, python, javascript)
    #[clap(long)]
    language: Option<String>,

    /// custom text to type instead of a generated drill
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// print session history and aggregate stats, then exit
    #[clap(long)]
    history: bool,

    /// export the full history to a CSV file, then exit
    #[clap(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();
    let config = FileConfigStore::new().load();

    if cli.history || cli.export.is_some() {
        let store = SqliteResultStore::open_default()?;
        if let Some(path) = &cli.export {
            let rows = store.export_csv(path)?;
            println!("exported {rows} sessions to {}", path.display());
        }
        if cli.history {
            print_history(&store)?;
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let seconds = cli.seconds.unwrap_or(config.seconds).max(1);
    let mode = cli
        .mode
        .or_else(|| PracticeMode::from_tag(&config.mode))
        .unwrap_or(PracticeMode::Paragraph);

    let (sink, key_error_totals) = open_sink(mode);
    let source = build_source(&cli, &config, mode, key_error_totals);
    let mut app = App::new(source, sink, seconds);

    run_tui(&mut app)?;
    Ok(())
}

/// Open the result store, degrading to an in-memory sink (results lost on
/// exit) when the database cannot be opened. Adaptive mode also needs the
/// recent key-error totals, pulled here while we still own the store.
fn open_sink(mode: PracticeMode) -> (Box<dyn ResultSink>, HashMap<char, u32>) {
    match SqliteResultStore::open_default() {
        Ok(store) => {
            let mut totals = HashMap::new();
            if mode == PracticeMode::Adaptive {
                match store.recent(10) {
                    Ok(rows) => totals = analysis::aggregate_key_errors(&rows),
                    Err(e) => log::warn!("could not load history for adaptive drill: {e}"),
                }
            }
            (Box::new(store), totals)
        }
        Err(e) => {
            log::warn!("results database unavailable, results will not persist: {e}");
            (Box::new(MemorySink::new()), HashMap::new())
        }
    }
}

fn build_source(
    cli: &Cli,
    config: &Config,
    mode: PracticeMode,
    key_error_totals: HashMap<char, u32>,
) -> Box<dyn TextSource> {
    if let Some(text) = &cli.prompt {
        return Box::new(FixedSource::new(text.clone()));
    }

    match mode {
        PracticeMode::Code => Box::new(SnippetSource::new(
            cli.language
                .as_deref()
                .or(config.snippet_language.as_deref()),
        )),
        PracticeMode::Lesson => Box::new(LessonSource::new(cli.lesson.unwrap_or(config.lesson))),
        PracticeMode::Adaptive => Box::new(AdaptiveSource::new(key_error_totals)),
        PracticeMode::Paragraph | PracticeMode::Custom => Box::new(ParagraphSource::new()),
    }
}

fn run_tui(app: &mut App) -> Result<(), Box<dyn std::error::Error>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let events = CrosstermEventSource::new(Duration::from_secs(1));

    let run_result = (|| -> Result<(), Box<dyn std::error::Error>> {
        while !app.quit {
            terminal.draw(|f| ui::draw(app, f))?;
            match events.recv() {
                Ok(event) => app.on_event(event),
                Err(_) => break,
            }
        }
        Ok(())
    })();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    run_result
}

fn print_history(store: &SqliteResultStore) -> Result<(), Box<dyn std::error::Error>> {
    let results = store.all()?;
    let summary = match analysis::summarize(&results) {
        Some(summary) => summary,
        None => {
            println!("No sessions recorded yet.");
            return Ok(());
        }
    };

    println!(
        "{} sessions  |  {:.1} wpm avg (best {}, worst {})  |  {:.1}% accuracy",
        summary.total_sessions,
        summary.avg_wpm,
        summary.best_wpm,
        summary.worst_wpm,
        summary.avg_accuracy,
    );
    println!(
        "error rate {:.2}%  |  wpm spread {:.1}  |  level: {} ({})",
        summary.error_rate_percent,
        summary.wpm_std_dev,
        summary.skill,
        summary.skill.description(),
    );
    if let Some(trend) = summary.wpm_trend() {
        println!(
            "recent {:.1} wpm vs older {:.1} wpm ({}{:.1})",
            summary.recent_avg_wpm,
            summary.older_avg_wpm.unwrap_or(0.0),
            if trend >= 0.0 { "+" } else { "" },
            trend,
        );
    }

    let totals = analysis::aggregate_key_errors(&results);
    let worst = analysis::problem_keys(&totals, 5);
    if !worst.is_empty() {
        let formatted: Vec<String> = worst
            .iter()
            .map(|(key, count)| format!("'{key}' ×{count}"))
            .collect();
        println!("weakest keys: {}", formatted.join(", "));
    }

    println!();
    for row in results.iter().take(10) {
        let when = HumanTime::from(SystemTime::from(row.completed_at));
        println!(
            "{:>4} wpm  {:>3}% acc  {:>4}s  {:<12} {}",
            row.wpm, row.accuracy_percent, row.duration_secs, row.mode, when,
        );
    }

    Ok(())
}
