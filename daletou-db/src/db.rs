use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use std::path::Path;

pub const HISTORY_KEY: &str = "dlt_history";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS kv (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);
";

/// Stockage durable de l'historique encodé (une seule clé).
pub trait HistoryStore: Send {
    fn load_history(&self) -> Result<Option<String>>;
    fn save_history(&mut self, encoded: &str) -> Result<()>;
}

pub fn db_path() -> std::path::PathBuf {
    let mut path = std::env::current_dir().unwrap_or_default();
    path.push("data");
    path.push("daletou.db");
    path
}

pub fn open_db(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Impossible de créer le répertoire {:?}", parent))?;
    }
    let conn = Connection::open(path)
        .with_context(|| format!("Impossible d'ouvrir la base {:?}", path))?;
    Ok(conn)
}

pub fn migrate(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)
        .context("Échec de la migration")?;
    Ok(())
}

pub fn get_value(conn: &Connection, key: &str) -> Result<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()
        .with_context(|| format!("Échec de la lecture de la clé {key}"))?;
    Ok(value)
}

pub fn put_value(conn: &Connection, key: &str, value: &str) -> Result<()> {
    conn.execute(
        "INSERT INTO kv (key, value, updated_at) VALUES (?1, ?2, datetime('now'))
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        rusqlite::params![key, value],
    ).with_context(|| format!("Échec de l'écriture de la clé {key}"))?;
    Ok(())
}

pub fn updated_at(conn: &Connection, key: &str) -> Result<Option<String>> {
    let ts = conn
        .query_row("SELECT updated_at FROM kv WHERE key = ?1", [key], |row| row.get(0))
        .optional()?;
    Ok(ts)
}

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = open_db(path)?;
        migrate(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self { conn })
    }

    pub fn last_saved_at(&self) -> Result<Option<String>> {
        updated_at(&self.conn, HISTORY_KEY)
    }
}

impl HistoryStore for SqliteStore {
    fn load_history(&self) -> Result<Option<String>> {
        get_value(&self.conn, HISTORY_KEY)
    }

    fn save_history(&mut self, encoded: &str) -> Result<()> {
        let tx = self.conn.transaction()
            .context("Impossible de démarrer la transaction")?;
        put_value(&tx, HISTORY_KEY, encoded)?;
        tx.commit().context("Échec du commit")?;
        Ok(())
    }
}

/// Stockage volatil, utilisé par les tests et le mode sans persistance.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Option<String>,
    pub(crate) fail_reads: bool,
    pub(crate) fail_writes: bool,
}

impl MemoryStore {
    pub fn with_value(encoded: &str) -> Self {
        Self {
            value: Some(encoded.to_string()),
            ..Self::default()
        }
    }
}

impl HistoryStore for MemoryStore {
    fn load_history(&self) -> Result<Option<String>> {
        if self.fail_reads {
            anyhow::bail!("Lecture refusée");
        }
        Ok(self.value.clone())
    }

    fn save_history(&mut self, encoded: &str) -> Result<()> {
        if self.fail_writes {
            anyhow::bail!("Écriture refusée");
        }
        self.value = Some(encoded.to_string());
        Ok(())
    }
}
