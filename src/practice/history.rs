//! Practice history storage and retrieval using SQLite.
//!
//! Manages persistent storage of analyzed practice sessions with
//! timestamps, for the history viewer and streak display.

use anyhow::Result;
use chrono::{DateTime, Local};
use rusqlite::{params, Connection};
use std::path::{Path, PathBuf};

/// A single analyzed practice session in the history.
#[derive(Debug, Clone)]
pub struct PracticeEntry {
    /// Unique identifier for this session
    pub id: i64,
    /// Title of the article that was read
    pub article_title: String,
    pub pronunciation_score: u8,
    pub fluency_score: u8,
    pub feedback: String,
    /// When this session was analyzed
    pub created_at: DateTime<Local>,
}

/// Manages the practice history database.
pub struct HistoryManager {
    /// Path to the SQLite database file
    database_path: PathBuf,
    /// Connection to the database (lazy-loaded)
    connection: Option<Connection>,
}

impl HistoryManager {
    /// Creates a new history manager for the given data directory.
    ///
    /// # Errors
    /// - If the data directory cannot be created
    pub fn new(data_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(data_dir)?;
        let database_path = data_dir.join("practice_history.db");

        Ok(Self {
            database_path,
            connection: None,
        })
    }

    /// Opens a history manager under the default data directory.
    pub fn open_default() -> Result<Self> {
        let data_dir = dirs::home_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))?
            .join(".local")
            .join("share")
            .join("speakai");
        Self::new(&data_dir)
    }

    /// Initializes the database connection and creates tables if necessary.
    fn get_connection(&mut self) -> Result<&Connection> {
        if self.connection.is_none() {
            let connection = Connection::open(&self.database_path)?;

            connection.execute(
                "CREATE TABLE IF NOT EXISTS practice_sessions (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    article_title TEXT NOT NULL,
                    pronunciation_score INTEGER NOT NULL,
                    fluency_score INTEGER NOT NULL,
                    feedback TEXT NOT NULL,
                    created_at TEXT NOT NULL
                )",
                [],
            )?;

            self.connection = Some(connection);
        }

        Ok(self.connection.as_ref().unwrap())
    }

    /// Saves an analyzed practice session.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If insertion fails
    pub fn save_session(
        &mut self,
        article_title: &str,
        pronunciation_score: u8,
        fluency_score: u8,
        feedback: &str,
    ) -> Result<()> {
        let connection = self.get_connection()?;
        let timestamp = Local::now().to_rfc3339();

        connection.execute(
            "INSERT INTO practice_sessions
                (article_title, pronunciation_score, fluency_score, feedback, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                article_title,
                pronunciation_score,
                fluency_score,
                feedback,
                timestamp
            ],
        )?;

        tracing::debug!("Practice session saved to history");
        Ok(())
    }

    /// Retrieves all practice sessions ordered by most recent first.
    ///
    /// # Errors
    /// - If database connection fails
    /// - If query execution or timestamp parsing fails
    pub fn get_all_sessions(&mut self) -> Result<Vec<PracticeEntry>> {
        let connection = self.get_connection()?;

        let mut statement = connection.prepare(
            "SELECT id, article_title, pronunciation_score, fluency_score, feedback, created_at
             FROM practice_sessions ORDER BY created_at DESC, id DESC",
        )?;

        let entries = statement
            .query_map([], |row| {
                let timestamp_str = row.get::<_, String>(5)?;
                let created_at = DateTime::parse_from_rfc3339(&timestamp_str)
                    .map(|dt| dt.with_timezone(&Local))
                    .map_err(|_| {
                        rusqlite::Error::InvalidParameterName(
                            "Invalid timestamp format".to_string(),
                        )
                    })?;

                Ok(PracticeEntry {
                    id: row.get(0)?,
                    article_title: row.get(1)?,
                    pronunciation_score: row.get::<_, i64>(2)? as u8,
                    fluency_score: row.get::<_, i64>(3)? as u8,
                    feedback: row.get(4)?,
                    created_at,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn saved_sessions_come_back_most_recent_first() {
        let dir = TempDir::new().unwrap();
        let mut history = HistoryManager::new(dir.path()).unwrap();

        history
            .save_session("The Power of Habit", 8, 7, "Good attempt")
            .unwrap();
        history
            .save_session("A Walk in the City", 9, 9, "Excellent pacing")
            .unwrap();

        let sessions = history.get_all_sessions().unwrap();
        assert_eq!(sessions.len(), 2);
        assert_eq!(sessions[0].article_title, "A Walk in the City");
        assert_eq!(sessions[0].pronunciation_score, 9);
        assert_eq!(sessions[1].fluency_score, 7);
    }

    #[test]
    fn empty_history_yields_no_sessions() {
        let dir = TempDir::new().unwrap();
        let mut history = HistoryManager::new(dir.path()).unwrap();
        assert!(history.get_all_sessions().unwrap().is_empty());
    }
}
