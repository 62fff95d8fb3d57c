use crate::app_dirs::AppDirs;
use crate::result::{ResultSink, SessionResult, SinkError};
use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// One persisted session, as read back from the database.
#[derive(Debug, Clone)]
pub struct StoredResult {
    pub id: i64,
    pub completed_at: DateTime<Local>,
    pub mode: String,
    pub wpm: u32,
    pub accuracy_percent: u8,
    pub duration_secs: u32,
    pub character_count: u32,
    pub correct_characters: u32,
    pub errors: u32,
    pub key_errors: HashMap<char, u32>,
}

/// SQLite-backed result store. One row per completed session; the per-key
/// error map is stored as a JSON column next to the scalar metrics.
#[derive(Debug)]
pub struct SqliteResultStore {
    conn: Connection,
}

impl SqliteResultStore {
    /// Open (and create if needed) the store at the default location.
    pub fn open_default() -> Result<Self, SinkError> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("keystride_results.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SinkError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;

        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS typing_results (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                completed_at TEXT NOT NULL,
                mode TEXT NOT NULL,
                wpm INTEGER NOT NULL,
                accuracy INTEGER NOT NULL,
                duration_secs INTEGER NOT NULL,
                character_count INTEGER NOT NULL,
                correct_characters INTEGER NOT NULL,
                errors INTEGER NOT NULL,
                key_errors TEXT NOT NULL
            )
            "#,
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_typing_results_completed_at
             ON typing_results(completed_at)",
            [],
        )?;

        Ok(Self { conn })
    }

    pub fn insert(&self, result: &SessionResult) -> Result<i64, SinkError> {
        self.conn.execute(
            r#"
            INSERT INTO typing_results
            (completed_at, mode, wpm, accuracy, duration_secs,
             character_count, correct_characters, errors, key_errors)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                result.completed_at.to_rfc3339(),
                result.mode,
                result.wpm,
                result.accuracy_percent,
                result.duration_secs,
                result.character_count,
                result.correct_characters,
                result.errors,
                serde_json::to_string(&result.key_errors)?,
            ],
        )?;

        Ok(self.conn.last_insert_rowid())
    }

    /// Most recent sessions first.
    pub fn recent(&self, limit: usize) -> Result<Vec<StoredResult>, SinkError> {
        self.query_results(
            "SELECT id, completed_at, mode, wpm, accuracy, duration_secs,
                    character_count, correct_characters, errors, key_errors
             FROM typing_results
             ORDER BY completed_at DESC
             LIMIT ?1",
            params![limit as i64],
        )
    }

    /// Entire history, most recent first.
    pub fn all(&self) -> Result<Vec<StoredResult>, SinkError> {
        self.query_results(
            "SELECT id, completed_at, mode, wpm, accuracy, duration_secs,
                    character_count, correct_characters, errors, key_errors
             FROM typing_results
             ORDER BY completed_at DESC",
            params![],
        )
    }

    pub fn count(&self) -> Result<u64, SinkError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM typing_results", [], |row| row.get(0))?;
        Ok(count as u64)
    }

    /// Dump the whole history to a CSV file. Returns the number of rows
    /// written.
    pub fn export_csv<P: AsRef<Path>>(&self, path: P) -> Result<usize, SinkError> {
        let results = self.all()?;
        let mut writer = csv::Writer::from_path(path)?;

        writer.write_record([
            "completed_at",
            "mode",
            "wpm",
            "accuracy",
            "duration_secs",
            "character_count",
            "correct_characters",
            "errors",
        ])?;

        for row in &results {
            writer.write_record([
                row.completed_at.to_rfc3339(),
                row.mode.clone(),
                row.wpm.to_string(),
                row.accuracy_percent.to_string(),
                row.duration_secs.to_string(),
                row.character_count.to_string(),
                row.correct_characters.to_string(),
                row.errors.to_string(),
            ])?;
        }
        writer.flush()?;

        Ok(results.len())
    }

    fn query_results(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<StoredResult>, SinkError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, u32>(3)?,
                row.get::<_, u8>(4)?,
                row.get::<_, u32>(5)?,
                row.get::<_, u32>(6)?,
                row.get::<_, u32>(7)?,
                row.get::<_, u32>(8)?,
                row.get::<_, String>(9)?,
            ))
        })?;

        let mut results = Vec::new();
        for row in rows {
            let (
                id,
                completed_at,
                mode,
                wpm,
                accuracy_percent,
                duration_secs,
                character_count,
                correct_characters,
                errors,
                key_errors,
            ) = row?;

            results.push(StoredResult {
                id,
                completed_at: DateTime::parse_from_rfc3339(&completed_at)?.with_timezone(&Local),
                mode,
                wpm,
                accuracy_percent,
                duration_secs,
                character_count,
                correct_characters,
                errors,
                key_errors: serde_json::from_str(&key_errors)?,
            });
        }
        Ok(results)
    }
}

impl ResultSink for SqliteResultStore {
    fn submit(&mut self, result: &SessionResult) -> Result<(), SinkError> {
        self.insert(result)?;
        Ok(())
    }
}
