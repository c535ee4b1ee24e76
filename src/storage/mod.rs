use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use rusqlite::config::DbConfig;
use rusqlite::{params, Connection, OptionalExtension};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::config::{ConfigPaths, StorageOptions};
use crate::nav::{Folder, Storage, StorageMap};

mod schema;

const NAME_LIMIT: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageSummary {
    pub key: String,
    pub name: String,
    pub folder_count: usize,
    pub created_at: i64,
}

/// Handle to the catalog of storages and folders shown in the sidebar.
#[derive(Clone)]
pub struct StorageHandle {
    db_path: Arc<PathBuf>,
    options: Arc<StorageOptions>,
}

impl StorageHandle {
    pub fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&*self.db_path)
            .with_context(|| format!("opening database {}", self.db_path.display()))?;
        prepare_connection(&conn, &self.options)?;
        Ok(conn)
    }

    pub fn with_connection<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T>,
    {
        let conn = self.connect()?;
        f(&conn)
    }

    /// Snapshot of every storage with its folders, in sidebar order.
    pub fn load_tree(&self) -> Result<StorageMap> {
        self.with_connection(|conn| {
            let mut folders: HashMap<String, Vec<Folder>> = HashMap::new();
            let mut stmt = conn.prepare(
                "SELECT storage_key, key, name FROM folders ORDER BY storage_key, position, rowid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    Folder {
                        key: row.get(1)?,
                        name: row.get(2)?,
                    },
                ))
            })?;
            for row in rows {
                let (storage_key, folder) = row.context("reading folder row")?;
                folders.entry(storage_key).or_default().push(folder);
            }

            let mut stmt =
                conn.prepare("SELECT key, name FROM storages ORDER BY position, rowid")?;
            let storages = stmt
                .query_map([], |row| {
                    Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()
                .context("reading storage rows")?;

            let tree: StorageMap = storages
                .into_iter()
                .map(|(key, name)| {
                    let children = folders.remove(&key).unwrap_or_default();
                    Storage::new(key, name, children)
                })
                .collect();
            Ok(tree)
        })
    }

    pub fn list_storages(&self) -> Result<Vec<StorageSummary>> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT s.key, s.name, COUNT(f.key), s.created_at
                 FROM storages s
                 LEFT JOIN folders f ON f.storage_key = s.key
                 GROUP BY s.key
                 ORDER BY s.position, s.rowid",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(StorageSummary {
                    key: row.get(0)?,
                    name: row.get(1)?,
                    folder_count: row.get::<_, i64>(2)? as usize,
                    created_at: row.get(3)?,
                })
            })?;
            rows.collect::<Result<Vec<_>, _>>()
                .context("fetching storage summaries")
        })
    }

    pub fn add_storage(&self, name: &str) -> Result<String> {
        let name = normalize_name(name, "storage")?;
        let key = new_key();
        self.with_connection(|conn| {
            let now = OffsetDateTime::now_utc().unix_timestamp();
            conn.execute(
                "INSERT INTO storages (key, name, position, created_at)
                 VALUES (?1, ?2, (SELECT COALESCE(MAX(position), -1) + 1 FROM storages), ?3)",
                params![key, name, now],
            )
            .context("inserting storage")?;
            Ok(())
        })?;
        tracing::debug!(%key, %name, "added storage");
        Ok(key)
    }

    pub fn rename_storage(&self, key: &str, name: &str) -> Result<()> {
        let name = normalize_name(name, "storage")?;
        self.with_connection(|conn| {
            let updated = conn.execute(
                "UPDATE storages SET name = ?1 WHERE key = ?2",
                params![name, key],
            )?;
            if updated == 0 {
                bail!("storage '{key}' not found");
            }
            Ok(())
        })
    }

    /// Removes the storage and, by cascade, its folders. Returns the folder count removed.
    pub fn remove_storage(&self, key: &str) -> Result<usize> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        let folders: i64 = tx.query_row(
            "SELECT COUNT(*) FROM folders WHERE storage_key = ?1",
            params![key],
            |row| row.get(0),
        )?;
        let removed = tx.execute("DELETE FROM storages WHERE key = ?1", params![key])?;
        if removed == 0 {
            bail!("storage '{key}' not found");
        }
        tx.commit()?;
        tracing::debug!(%key, folders, "removed storage");
        Ok(folders as usize)
    }

    pub fn add_folder(&self, storage_key: &str, name: &str) -> Result<String> {
        let name = normalize_name(name, "folder")?;
        let key = new_key();
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;
        ensure_storage_exists(&tx, storage_key)?;
        tx.execute(
            "INSERT INTO folders (key, storage_key, name, position)
             VALUES (?1, ?2, ?3,
                     (SELECT COALESCE(MAX(position), -1) + 1 FROM folders WHERE storage_key = ?2))",
            params![key, storage_key, name],
        )
        .context("inserting folder")?;
        tx.commit()?;
        tracing::debug!(%storage_key, %key, %name, "added folder");
        Ok(key)
    }

    pub fn remove_folder(&self, storage_key: &str, folder_key: &str) -> Result<()> {
        self.with_connection(|conn| {
            let removed = conn.execute(
                "DELETE FROM folders WHERE storage_key = ?1 AND key = ?2",
                params![storage_key, folder_key],
            )?;
            if removed == 0 {
                bail!("folder '{folder_key}' not found in storage '{storage_key}'");
            }
            Ok(())
        })
    }
}

fn ensure_storage_exists(conn: &Connection, storage_key: &str) -> Result<()> {
    let exists = conn
        .query_row(
            "SELECT 1 FROM storages WHERE key = ?1",
            params![storage_key],
            |_row| Ok(()),
        )
        .optional()?
        .is_some();
    if !exists {
        bail!("storage '{storage_key}' not found");
    }
    Ok(())
}

/// Keys end up in router paths, so they must never contain '/'.
fn new_key() -> String {
    Uuid::new_v4().simple().to_string()
}

fn normalize_name(raw: &str, kind: &str) -> Result<String> {
    let mut name = raw.trim().to_string();
    if name.is_empty() {
        bail!("{kind} name cannot be empty");
    }
    if name.chars().count() > NAME_LIMIT {
        name = name.chars().take(NAME_LIMIT).collect();
    }
    Ok(name)
}

pub fn init(paths: &ConfigPaths, storage: &StorageOptions) -> Result<StorageHandle> {
    let db_path = &paths.database_path;
    let existed = db_path.exists();
    if let Some(parent) = db_path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating data directory {}", parent.display()))?;
    }
    let conn = Connection::open(db_path)
        .with_context(|| format!("opening database {}", db_path.display()))?;
    prepare_connection(&conn, storage)?;
    schema::apply(&conn)?;
    if !existed {
        seed_initial_storage(&conn)?;
    }
    Ok(StorageHandle {
        db_path: Arc::new(db_path.clone()),
        options: Arc::new(storage.clone()),
    })
}

fn prepare_connection(conn: &Connection, storage: &StorageOptions) -> Result<()> {
    conn.set_db_config(DbConfig::SQLITE_DBCONFIG_ENABLE_FKEY, true)
        .context("enabling foreign keys")?;
    conn.pragma_update(None, "journal_mode", "WAL")
        .context("setting journal_mode=WAL")?;
    conn.pragma_update(None, "synchronous", "NORMAL")
        .context("setting synchronous=NORMAL")?;
    conn.pragma_update(
        None,
        "wal_autocheckpoint",
        storage.wal_autocheckpoint.to_string(),
    )
    .context("setting wal_autocheckpoint")?;
    Ok(())
}

fn seed_initial_storage(conn: &Connection) -> Result<()> {
    let existing: Option<String> = conn
        .query_row("SELECT key FROM storages LIMIT 1", [], |row| row.get(0))
        .optional()
        .context("checking for existing storages")?;
    if existing.is_some() {
        return Ok(());
    }

    tracing::info!("seeding first-run storage");
    let now = OffsetDateTime::now_utc().unix_timestamp();
    let storage_key = new_key();
    conn.execute(
        "INSERT INTO storages (key, name, position, created_at) VALUES (?1, ?2, 0, ?3)",
        params![storage_key, "Notes", now],
    )
    .context("inserting seed storage")?;
    conn.execute(
        "INSERT INTO folders (key, storage_key, name, position) VALUES (?1, ?2, ?3, 0)",
        params![new_key(), storage_key, "Default"],
    )
    .context("inserting seed folder")?;
    Ok(())
}
