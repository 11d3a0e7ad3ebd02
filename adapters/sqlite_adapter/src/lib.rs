use rusqlite::{params, Connection};
use telescrape_core::domain::CleanedRecord;
use telescrape_core::error::PipelineError;
use telescrape_core::ports::{CleanedWriter, Result};
use telescrape_core::utils::format_timestamp;

pub const TABLE_NAME: &str = "telegram_messages";

fn storage_error(err: rusqlite::Error) -> PipelineError {
    PipelineError::Storage(err.to_string())
}

/// SQLite implementation of the CleanedWriter trait
/// Each write replaces the table contents inside a single transaction.
pub struct SqliteCleanedStore {
    db_path: String,
}

impl SqliteCleanedStore {
    /// Creates a new SqliteCleanedStore with the given database path
    pub fn new(db_path: String) -> Self {
        Self { db_path }
    }

    fn create_table(conn: &Connection) -> rusqlite::Result<()> {
        // message_id is not a key: distinct unparseable ids all coerce to 0
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {TABLE_NAME} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                channel_title TEXT NOT NULL,
                channel_username TEXT NOT NULL,
                message_id INTEGER NOT NULL,
                message_date TEXT,
                message TEXT NOT NULL,
                media_path TEXT NOT NULL,
                emoji_used TEXT NOT NULL,
                youtube_links TEXT NOT NULL
            );
            "#
        ))
    }
}

impl CleanedWriter for SqliteCleanedStore {
    fn write(&self, records: &[CleanedRecord]) -> Result<()> {
        let mut conn = Connection::open(&self.db_path).map_err(storage_error)?;
        Self::create_table(&conn).map_err(storage_error)?;

        let tx = conn.transaction().map_err(storage_error)?;
        tx.execute(&format!("DELETE FROM {TABLE_NAME}"), [])
            .map_err(storage_error)?;
        {
            let mut stmt = tx
                .prepare(&format!(
                    r#"
                    INSERT INTO {TABLE_NAME} (
                        channel_title, channel_username, message_id, message_date,
                        message, media_path, emoji_used, youtube_links
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                    "#
                ))
                .map_err(storage_error)?;

            for record in records {
                stmt.execute(params![
                    record.channel_title,
                    record.channel_username,
                    record.message_id,
                    record.message_date.as_ref().map(format_timestamp),
                    record.message,
                    record.media_path,
                    record.emoji_used,
                    record.youtube_links,
                ])
                .map_err(storage_error)?;
            }
        }
        tx.commit().map_err(storage_error)?;
        Ok(())
    }
}
