use anyhow::{Context, Result};
use rusqlite::Connection;

pub fn apply(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        PRAGMA foreign_keys = ON;
        CREATE TABLE IF NOT EXISTS storages (
            key TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            position INTEGER NOT NULL,
            created_at INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS folders (
            key TEXT NOT NULL,
            storage_key TEXT NOT NULL,
            name TEXT NOT NULL,
            position INTEGER NOT NULL,
            PRIMARY KEY (storage_key, key),
            FOREIGN KEY (storage_key) REFERENCES storages(key) ON DELETE CASCADE
        );

        CREATE INDEX IF NOT EXISTS folders_by_position ON folders(storage_key, position);
        "#,
    )
    .context("applying schema migrations")?;
    Ok(())
}
