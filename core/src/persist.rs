use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use anyhow::{Context, Result, anyhow};
use rusqlite::{Connection, params};
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Storage keys for the logical state buckets.
pub mod keys {
    pub const FOOD_LOGS: &str = "foodLogs";
    pub const WORKOUT_LOGS: &str = "workoutLogs";
    pub const WEIGHT_HISTORY: &str = "weightHistory";
    pub const TRACKER_DEFS: &str = "trackerDefs";
    pub const TRACKER_LOGS: &str = "trackerLogs";
    pub const USER_GOALS: &str = "userGoals";
    pub const DEVICE_ID: &str = "deviceId";
}

/// Key → JSON-text storage. Values must round-trip losslessly; writes are
/// visible to an immediately following read.
pub trait Persistence: Send + Sync {
    fn save(&self, key: &str, value: &str) -> Result<()>;
    fn load(&self, key: &str) -> Result<Option<String>>;
}

/// SQLite-backed key-value store. Writes are serialized through a mutex so
/// the store stays usable if a background task ever shares it.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::migrate(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn migrate(conn: &Connection) -> Result<()> {
        let version: i64 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

        if version < 1 {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS kv (
                    key TEXT PRIMARY KEY NOT NULL,
                    value TEXT NOT NULL,
                    updated_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%SZ', 'now'))
                );

                PRAGMA user_version = 1;",
            )?;
        }

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| anyhow!("storage lock poisoned"))
    }
}

impl Persistence for SqliteStore {
    fn save(&self, key: &str, value: &str) -> Result<()> {
        let now = chrono::Local::now().to_rfc3339();
        self.conn()?.execute(
            "INSERT INTO kv (key, value, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            params![key, value, now],
        )?;
        Ok(())
    }

    fn load(&self, key: &str) -> Result<Option<String>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query(params![key])?;
        if let Some(row) = rows.next()? {
            Ok(Some(row.get(0)?))
        } else {
            Ok(None)
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(
    persist: &dyn Persistence,
    key: &str,
    value: &T,
) -> Result<()> {
    let text = serde_json::to_string(value)
        .with_context(|| format!("Failed to serialize '{key}'"))?;
    persist.save(key, &text)
}

/// Load a stored value; a missing key or a corrupt snapshot falls back to
/// the type's default rather than propagating a parse failure.
#[must_use]
pub fn load_json<T: DeserializeOwned + Default>(persist: &dyn Persistence, key: &str) -> T {
    match persist.load(key) {
        Ok(Some(text)) => serde_json::from_str(&text).unwrap_or_default(),
        Ok(None) | Err(_) => T::default(),
    }
}
