use crate::config::Config;
use rusqlite::{Connection, OptionalExtension, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

/// Where invites for new voice channels get posted in one guild.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InviterRecord {
    pub guild_id: String,
    pub category_id: String,
    pub text_channel_id: String,
}

impl Database {
    pub fn new(config: &Config) -> Result<Self> {
        Self::open(&config.database_url)
    }

    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs a synchronous database call on the blocking thread pool.
    pub async fn run_blocking<T, F>(&self, f: F) -> anyhow::Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Database) -> anyhow::Result<T> + Send + 'static,
    {
        let db = self.clone();
        tokio::task::spawn_blocking(move || f(&db)).await?
    }

    pub fn execute_init(&self) -> anyhow::Result<()> {
        info!("Database: Initializing schema...");
        let sql = "
            CREATE TABLE IF NOT EXISTS inviter (
                guild_id TEXT PRIMARY KEY,
                category TEXT NOT NULL,
                text_channel TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS voice_channels (
                channel_id TEXT PRIMARY KEY,
                message_id TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS inv_whitelist (
                uid TEXT PRIMARY KEY
            );
        ";
        let conn = self.lock();
        conn.execute_batch(sql)?;
        debug!("Database: Schema initialized successfully");
        Ok(())
    }

    // --- Inviter ---

    pub fn set_inviter(&self, guild_id: &str, category_id: &str, text_channel_id: &str) -> anyhow::Result<()> {
        debug!("Database: Setting inviter for guild {} -> category {} / channel {}", guild_id, category_id, text_channel_id);
        let conn = self.lock();
        conn.execute(
            "INSERT INTO inviter (guild_id, category, text_channel) VALUES (?1, ?2, ?3)
             ON CONFLICT(guild_id) DO UPDATE SET category = ?2, text_channel = ?3",
            (guild_id, category_id, text_channel_id),
        )?;
        Ok(())
    }

    pub fn unset_inviter(&self, guild_id: &str) -> anyhow::Result<usize> {
        let conn = self.lock();
        let count = conn.execute("DELETE FROM inviter WHERE guild_id = ?1", (guild_id,))?;
        Ok(count)
    }

    pub fn get_inviter(&self, guild_id: &str) -> anyhow::Result<Option<InviterRecord>> {
        let conn = self.lock();
        let record = conn
            .query_row(
                "SELECT guild_id, category, text_channel FROM inviter WHERE guild_id = ?1",
                [guild_id],
                |row| {
                    Ok(InviterRecord {
                        guild_id: row.get(0)?,
                        category_id: row.get(1)?,
                        text_channel_id: row.get(2)?,
                    })
                },
            )
            .optional()?;
        Ok(record)
    }

    pub fn save_voice_invite(&self, channel_id: &str, message_id: &str) -> anyhow::Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO voice_channels (channel_id, message_id) VALUES (?1, ?2)
             ON CONFLICT(channel_id) DO UPDATE SET message_id = ?2",
            (channel_id, message_id),
        )?;
        Ok(())
    }

    pub fn get_voice_invite(&self, channel_id: &str) -> anyhow::Result<Option<String>> {
        let conn = self.lock();
        let message_id = conn
            .query_row(
                "SELECT message_id FROM voice_channels WHERE channel_id = ?1",
                [channel_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(message_id)
    }

    pub fn delete_voice_invite(&self, channel_id: &str) -> anyhow::Result<usize> {
        let conn = self.lock();
        let count = conn.execute("DELETE FROM voice_channels WHERE channel_id = ?1", (channel_id,))?;
        Ok(count)
    }

    // --- Whitelist ---

    pub fn add_to_whitelist(&self, user_id: &str) -> anyhow::Result<()> {
        let conn = self.lock();
        conn.execute(
            "INSERT INTO inv_whitelist (uid) VALUES (?1) ON CONFLICT(uid) DO NOTHING",
            (user_id,),
        )?;
        Ok(())
    }

    pub fn remove_from_whitelist(&self, user_id: &str) -> anyhow::Result<usize> {
        let conn = self.lock();
        let count = conn.execute("DELETE FROM inv_whitelist WHERE uid = ?1", (user_id,))?;
        Ok(count)
    }

    pub fn is_whitelisted(&self, user_id: &str) -> anyhow::Result<bool> {
        let conn = self.lock();
        let exists = conn
            .prepare("SELECT 1 FROM inv_whitelist WHERE uid = ?1")?
            .exists([user_id])?;
        Ok(exists)
    }
}
