//! SQLite session store.
//!
//! Sessions live in a single `sessions` table:
//!
//! | column  | type    | notes                         |
//! |---------|---------|-------------------------------|
//! | id      | INTEGER | primary key, autoincrement    |
//! | host    | TEXT    |                               |
//! | valid   | INTEGER | 1 until revoked               |
//! | key     | TEXT    | unique, indexed; token `jti`  |
//! | note    | TEXT    |                               |
//! | expired | INTEGER | UNIX seconds                  |
//! | created | INTEGER | UNIX seconds                  |
//!
//! rusqlite is synchronous, so every query runs on the blocking pool behind a
//! shared connection.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{Connection, OptionalExtension};
use tracing::{debug, info};

use crate::errors::StoreError;
use crate::session::{NewSession, SessionKey, SessionRecord};
use crate::store::SessionStore;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS sessions (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        host TEXT NOT NULL,
        valid INTEGER NOT NULL DEFAULT 1,
        key TEXT NOT NULL UNIQUE,
        note TEXT NOT NULL,
        expired INTEGER NOT NULL,
        created INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_sessions_key ON sessions(key);
"#;

/// Session store backed by an SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteSessionStore {
    conn: Arc<Mutex<Connection>>,
    path: Option<PathBuf>,
    created: bool,
}

impl SqliteSessionStore {
    /// Open (or create) the database at `path` and make sure the schema exists.
    ///
    /// Missing parent directories are created. Running this against an
    /// existing database leaves its rows untouched.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let io_err = |source| StoreError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }

        let created = !path.exists();
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA)?;

        info!(path = %path.display(), created, "Session database ready");

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: Some(path.to_path_buf()),
            created,
        })
    }

    /// Private in-memory database, mostly for tests.
    pub fn in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(SCHEMA)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            path: None,
            created: true,
        })
    }

    /// Database file, `None` for in-memory stores.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Whether `open` had to create the database file.
    pub fn was_created(&self) -> bool {
        self.created
    }

    async fn run<T, F>(&self, op: &'static str, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || f(&conn.lock()))
            .await
            .map_err(|e| StoreError::Internal(format!("blocking task failed during {op}: {e}")))?
    }
}

fn is_constraint_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn lookup(&self, key: &SessionKey) -> Result<Option<SessionRecord>, StoreError> {
        let key = key.clone();

        self.run("lookup", move |conn| {
            let record = conn
                .query_row(
                    r#"
                    SELECT id, host, valid, key, note, expired, created
                    FROM sessions
                    WHERE key = ?1
                    LIMIT 1
                    "#,
                    rusqlite::params![key.as_str()],
                    |row| {
                        Ok(SessionRecord {
                            id: row.get(0)?,
                            host: row.get(1)?,
                            valid: row.get::<_, i64>(2)? != 0,
                            key: SessionKey::from_string(row.get::<_, String>(3)?),
                            note: row.get(4)?,
                            expired: row.get(5)?,
                            created: row.get(6)?,
                        })
                    },
                )
                .optional()?;
            Ok(record)
        })
        .await
    }

    async fn insert(&self, session: NewSession) -> Result<SessionRecord, StoreError> {
        self.run("insert", move |conn| {
            let inserted = conn.execute(
                r#"
                INSERT INTO sessions (host, valid, key, note, expired, created)
                VALUES (?1, 1, ?2, ?3, ?4, ?5)
                "#,
                rusqlite::params![
                    session.host,
                    session.key.as_str(),
                    session.note,
                    session.expired,
                    session.created,
                ],
            );

            match inserted {
                Ok(_) => {
                    let record = session.into_record(conn.last_insert_rowid());
                    debug!(key = %record.key, id = record.id, "Recorded session");
                    Ok(record)
                }
                Err(e) if is_constraint_violation(&e) => {
                    Err(StoreError::DuplicateKey(session.key.to_string()))
                }
                Err(e) => Err(e.into()),
            }
        })
        .await
    }

    async fn revoke(&self, key: &SessionKey) -> Result<bool, StoreError> {
        let key = key.clone();

        self.run("revoke", move |conn| {
            let updated = conn.execute(
                "UPDATE sessions SET valid = 0 WHERE key = ?1",
                rusqlite::params![key.as_str()],
            )?;
            if updated > 0 {
                debug!(key = %key, "Revoked session");
            }
            Ok(updated > 0)
        })
        .await
    }
}
