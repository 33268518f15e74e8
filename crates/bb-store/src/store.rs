use std::path::Path;

use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use bb_core::{CoreError, KeyValueStore, Notifier, Trigger};

use crate::error::{Result, StoreError};
use crate::schema;

/// A notification row that has not been cancelled.
#[derive(Clone, Debug, PartialEq)]
pub struct PendingNotification {
    pub id: String,
    pub title: String,
    pub body: String,
    /// `None` means immediate.
    pub trigger_secs: Option<u64>,
    pub created_at: String,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        schema::initialize(&conn)?;
        Ok(Self { conn })
    }

    // --- Metadata ---

    pub fn get_metadata(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM metadata WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).optional()?;
        Ok(result)
    }

    pub fn set_metadata(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO metadata (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    // --- Key-value ---

    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let result = stmt.query_row([key], |row| row.get(0)).optional()?;
        Ok(result)
    }

    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_remove(&self, key: &str) -> Result<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }

    // --- Notification outbox ---

    pub fn insert_notification(&self, title: &str, body: &str, trigger: Trigger) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        let trigger_secs = trigger
            .delay_secs()
            .map(i64::try_from)
            .transpose()
            .map_err(|_| StoreError::InvalidData(format!("trigger delay too large for {title}")))?;
        self.conn.execute(
            "INSERT INTO notifications (id, title, body, trigger_secs) VALUES (?1, ?2, ?3, ?4)",
            params![id, title, body, trigger_secs],
        )?;
        Ok(id)
    }

    pub fn cancel_notification(&self, id: &str) -> Result<()> {
        let rows = self
            .conn
            .execute("UPDATE notifications SET cancelled = 1 WHERE id = ?1", [id])?;
        if rows == 0 {
            return Err(StoreError::InvalidData(format!(
                "notification not found: {id}"
            )));
        }
        Ok(())
    }

    pub fn pending_notifications(&self) -> Result<Vec<PendingNotification>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, title, body, trigger_secs, created_at
             FROM notifications WHERE cancelled = 0 ORDER BY rowid",
        )?;

        stmt.query_map([], |row| {
            let trigger_secs: Option<i64> = row.get(3)?;
            Ok(PendingNotification {
                id: row.get(0)?,
                title: row.get(1)?,
                body: row.get(2)?,
                trigger_secs: trigger_secs.map(|s| s.max(0) as u64),
                created_at: row.get(4)?,
            })
        })?
        .collect::<std::result::Result<_, _>>()
        .map_err(StoreError::from)
    }

    /// Device token, generated on first use and then stable.
    pub fn push_token(&self) -> Result<String> {
        if let Some(token) = self.get_metadata("push_token")? {
            return Ok(token);
        }
        let token = Uuid::new_v4().to_string();
        self.set_metadata("push_token", &token)?;
        Ok(token)
    }
}

impl KeyValueStore for Store {
    fn get(&self, key: &str) -> bb_core::Result<Option<String>> {
        Ok(self.kv_get(key)?)
    }

    fn set(&mut self, key: &str, value: &str) -> bb_core::Result<()> {
        Ok(self.kv_set(key, value)?)
    }

    fn remove(&mut self, key: &str) -> bb_core::Result<()> {
        self.kv_remove(key).map_err(CoreError::from)
    }
}

impl Notifier for Store {
    fn schedule(&mut self, title: &str, body: &str, trigger: Trigger) -> Option<String> {
        match self.insert_notification(title, body, trigger) {
            Ok(id) => {
                tracing::info!("scheduled notification {id}: {title}");
                Some(id)
            }
            Err(e) => {
                tracing::error!("failed to schedule notification: {e}");
                None
            }
        }
    }

    fn cancel(&mut self, id: &str) {
        if let Err(e) = self.cancel_notification(id) {
            tracing::warn!("failed to cancel notification: {e}");
        }
    }

    fn register_for_push(&mut self) -> Option<String> {
        self.push_token()
            .inspect_err(|e| tracing::error!("push registration failed: {e}"))
            .ok()
    }
}
