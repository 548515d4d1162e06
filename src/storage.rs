// 🗄️ Local storage - the client's only durable state
// A tiny key-value table in SQLite: session token, cached user, theme.

use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

use crate::error::ApiResult;
use crate::models::User;
use crate::theme::Theme;

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";
pub const THEME_KEY: &str = "theme";

pub struct LocalStore {
    conn: Connection,
    /// Last `PRAGMA data_version` we observed
    seen_version: i64,
}

impl LocalStore {
    pub fn open(path: &Path) -> ApiResult<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::setup(Connection::open(path)?)
    }

    pub fn open_in_memory() -> ApiResult<Self> {
        Self::setup(Connection::open_in_memory()?)
    }

    fn setup(conn: Connection) -> ApiResult<Self> {
        // WAL so a second terminal can read while another writes
        let _mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key TEXT PRIMARY KEY NOT NULL,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )",
            [],
        )?;

        let seen_version = data_version(&conn)?;
        Ok(Self { conn, seen_version })
    }

    // ========================================================================
    // RAW KEY-VALUE ACCESS
    // ========================================================================

    pub fn get(&self, key: &str) -> ApiResult<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(value)
    }

    pub fn set(&self, key: &str, value: &str) -> ApiResult<()> {
        self.conn.execute(
            "INSERT INTO kv (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> ApiResult<()> {
        self.conn.execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    // ========================================================================
    // SESSION
    // ========================================================================

    pub fn token(&self) -> ApiResult<Option<String>> {
        Ok(self.get(TOKEN_KEY)?.filter(|t| !t.is_empty()))
    }

    /// A corrupt cache entry reads as "no user", never as an error.
    pub fn cached_user(&self) -> ApiResult<Option<User>> {
        let raw = match self.get(USER_KEY)? {
            Some(raw) => raw,
            None => return Ok(None),
        };
        match serde_json::from_str(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!("Ignoring unreadable cached user: {}", e);
                Ok(None)
            }
        }
    }

    pub fn cache_user(&self, user: &User) -> ApiResult<()> {
        let json = serde_json::to_string(user)?;
        self.set(USER_KEY, &json)
    }

    pub fn save_session(&self, token: &str, user: &User) -> ApiResult<()> {
        let tx = self.conn.unchecked_transaction()?;
        self.set(TOKEN_KEY, token)?;
        self.cache_user(user)?;
        tx.commit()?;
        Ok(())
    }

    /// Sign-out: token and user go, the theme stays.
    pub fn clear_session(&self) -> ApiResult<()> {
        self.remove(USER_KEY)?;
        self.remove(TOKEN_KEY)
    }

    // ========================================================================
    // THEME
    // ========================================================================

    pub fn theme(&self) -> ApiResult<Option<Theme>> {
        Ok(self.get(THEME_KEY)?.and_then(|raw| raw.parse().ok()))
    }

    pub fn set_theme(&self, theme: Theme) -> ApiResult<()> {
        self.set(THEME_KEY, theme.as_str())
    }

    // ========================================================================
    // CHANGE DETECTION
    // ========================================================================

    /// True when some other connection committed since the previous call.
    /// Writes made through this store do not count.
    pub fn has_external_changes(&mut self) -> ApiResult<bool> {
        let current = data_version(&self.conn)?;
        let changed = current != self.seen_version;
        self.seen_version = current;
        Ok(changed)
    }
}

fn data_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("PRAGMA data_version", [], |row| row.get(0))
}
