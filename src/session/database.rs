use super::{unix_timestamp, SessionDriver, SessionEntries, SessionRecord};
use crate::crypto::Cipher;
use crate::db::{DbHandle, SqlValue};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

/// One row per session in `table`: `session_id`, sealed `payload`, `last_activity`
#[derive(Clone)]
pub struct DatabaseDriver {
    db: DbHandle,
    cipher: Cipher,
    table: String,
    lifetime: u64,
    table_ready: Arc<OnceCell<()>>,
}

impl DatabaseDriver {
    pub fn new(db: DbHandle, cipher: Cipher, table: &str, lifetime: u64) -> Result<Self> {
        if table.is_empty()
            || !table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::config(format!("Invalid session table name '{}'", table)));
        }

        Ok(Self {
            db,
            cipher,
            table: table.to_string(),
            lifetime,
            table_ready: Arc::new(OnceCell::new()),
        })
    }

    async fn ensure_table(&self) -> Result<()> {
        self.table_ready
            .get_or_try_init(|| async {
                let sql = format!(
                    "CREATE TABLE IF NOT EXISTS {} (\
                     session_id VARCHAR(64) PRIMARY KEY, \
                     payload TEXT NOT NULL, \
                     last_activity BIGINT NOT NULL)",
                    self.table
                );
                self.db.execute(&sql, &[]).await?;
                log::debug!("Session table '{}' ready", self.table);
                Ok::<(), Error>(())
            })
            .await?;
        Ok(())
    }

    async fn delete_row(&self, id: &str) -> Result<()> {
        let sql = format!(
            "DELETE FROM {} WHERE session_id = {}",
            self.table,
            self.db.placeholder(1)
        );
        self.db.execute(&sql, &[id.into()]).await?;
        Ok(())
    }
}

#[async_trait]
impl SessionDriver for DatabaseDriver {
    fn name(&self) -> &'static str {
        "database"
    }

    async fn load(&self, token: &str) -> Result<Option<SessionRecord>> {
        self.ensure_table().await?;

        let sql = format!(
            "SELECT payload, last_activity FROM {} WHERE session_id = {}",
            self.table,
            self.db.placeholder(1)
        );
        let row = match self.db.row(&sql, &[token.into()]).await? {
            Some(row) => row,
            None => return Ok(None),
        };

        let last_activity = row["last_activity"].as_u64().unwrap_or(0);
        if unix_timestamp() >= last_activity.saturating_add(self.lifetime) {
            log::debug!("Session {} expired", token);
            self.delete_row(token).await?;
            return Ok(None);
        }

        let payload = row["payload"].as_str().unwrap_or_default();
        match self.cipher.open::<SessionEntries>(payload) {
            Ok(entries) => Ok(Some(SessionRecord {
                id: token.to_string(),
                entries,
            })),
            Err(e) => {
                log::warn!("Discarding unreadable session {}: {}", token, e);
                self.delete_row(token).await?;
                Ok(None)
            }
        }
    }

    async fn save(&self, id: &str, entries: &SessionEntries) -> Result<String> {
        self.ensure_table().await?;
        let payload = self.cipher.seal(entries)?;

        self.delete_row(id).await?;
        let sql = format!(
            "INSERT INTO {} (session_id, payload, last_activity) VALUES ({}, {}, {})",
            self.table,
            self.db.placeholder(1),
            self.db.placeholder(2),
            self.db.placeholder(3)
        );
        self.db
            .execute(
                &sql,
                &[
                    id.into(),
                    payload.into(),
                    SqlValue::Int(unix_timestamp() as i64),
                ],
            )
            .await?;

        Ok(id.to_string())
    }

    async fn destroy(&self, id: &str) -> Result<()> {
        self.ensure_table().await?;
        self.delete_row(id).await
    }
}
