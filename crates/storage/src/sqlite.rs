//! SQLite-backed storage gateway.

use {
    anyhow::Context,
    async_trait::async_trait,
    sqlx::{
        SqlitePool,
        sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    },
};

use pontoon_common::{SessionId, UserId};

use crate::gateway::{SessionRecord, StorageGateway, UpgradeError};

/// Current schema version written after a successful upgrade.
const SCHEMA_VERSION: i64 = 1;

/// Migration sections, applied in order. Each statement is idempotent so the
/// upgrade can be re-run safely.
const MIGRATIONS: &[(&str, &str)] = &[
    (
        "version",
        "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER NOT NULL)",
    ),
    (
        "sessions",
        r#"CREATE TABLE IF NOT EXISTS sessions (
            session_id  TEXT PRIMARY KEY,
            account_id  TEXT NOT NULL,
            credentials TEXT NOT NULL DEFAULT '{}'
        )"#,
    ),
    (
        "sessions-account-index",
        "CREATE INDEX IF NOT EXISTS idx_sessions_account ON sessions (account_id)",
    ),
];

pub struct SqliteStorage {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    session_id: String,
    account_id: String,
    credentials: String,
}

impl SessionRow {
    fn into_record(self) -> anyhow::Result<SessionRecord> {
        let credentials = serde_json::from_str(&self.credentials)
            .with_context(|| format!("corrupt credential blob for session {}", self.session_id))?;
        Ok(SessionRecord {
            session_id: SessionId::new(self.session_id),
            account_id: UserId::new(self.account_id),
            credentials,
        })
    }
}

impl SqliteStorage {
    /// Open (creating if missing) the database file at `path`.
    pub async fn open(path: &str) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .connect_with(options)
            .await
            .with_context(|| format!("failed to open database at {path}"))?;
        Ok(Self { pool })
    }

    /// In-memory database, used in tests.
    pub async fn in_memory() -> anyhow::Result<Self> {
        let pool = SqlitePool::connect("sqlite::memory:").await?;
        Ok(Self { pool })
    }

    async fn stored_version(&self) -> anyhow::Result<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version LIMIT 1")
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(v,)| v))
    }
}

#[async_trait]
impl StorageGateway for SqliteStorage {
    async fn upgrade(&self) -> Result<(), UpgradeError> {
        for &(section, sql) in MIGRATIONS {
            sqlx::query(sql)
                .execute(&self.pool)
                .await
                .map_err(|e| UpgradeError {
                    section,
                    source: e.into(),
                })?;
        }

        let stored = self
            .stored_version()
            .await
            .map_err(|e| UpgradeError {
                section: "version",
                source: e,
            })?;
        match stored {
            Some(v) if v > SCHEMA_VERSION => {
                return Err(UpgradeError {
                    section: "version",
                    source: anyhow::anyhow!(
                        "database schema version {v} is newer than supported version {SCHEMA_VERSION}"
                    ),
                });
            },
            Some(v) if v == SCHEMA_VERSION => {},
            _ => {
                sqlx::query("DELETE FROM schema_version")
                    .execute(&self.pool)
                    .await
                    .map_err(|e| UpgradeError {
                        section: "version",
                        source: e.into(),
                    })?;
                sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
                    .bind(SCHEMA_VERSION)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| UpgradeError {
                        section: "version",
                        source: e.into(),
                    })?;
            },
        }
        tracing::debug!(version = SCHEMA_VERSION, "schema up to date");
        Ok(())
    }

    async fn list_sessions(&self) -> anyhow::Result<Vec<SessionRecord>> {
        let rows: Vec<SessionRow> =
            sqlx::query_as("SELECT session_id, account_id, credentials FROM sessions ORDER BY session_id")
                .fetch_all(&self.pool)
                .await?;
        rows.into_iter().map(SessionRow::into_record).collect()
    }

    async fn put_session(&self, record: &SessionRecord) -> anyhow::Result<()> {
        let credentials = serde_json::to_string(&record.credentials)?;
        sqlx::query(
            r#"INSERT INTO sessions (session_id, account_id, credentials)
               VALUES (?, ?, ?)
               ON CONFLICT(session_id) DO UPDATE SET
                 account_id = excluded.account_id,
                 credentials = excluded.credentials"#,
        )
        .bind(record.session_id.as_str())
        .bind(record.account_id.as_str())
        .bind(credentials)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn delete_session(&self, id: &SessionId) -> anyhow::Result<()> {
        sqlx::query("DELETE FROM sessions WHERE session_id = ?")
            .bind(id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
