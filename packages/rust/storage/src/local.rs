//! Embedded libSQL backend for offline use.
//!
//! Schema lives in [`crate::migrations`]. Timestamps are stored as
//! fixed-width RFC 3339 strings so text ordering matches time ordering;
//! `rowid` breaks ties between rows written in the same microsecond.

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{Connection, Database, Row, params};
use tracing::instrument;
use uuid::Uuid;

use contentflow_shared::{ContentFlowError, ContentVersion, NewPrd, Prd, PrdId, Result, Stage};

use crate::ContentStore;
use crate::migrations;

/// Content store backed by a local libSQL file.
pub struct LocalStore {
    #[allow(dead_code)]
    db: Database,
    conn: Connection,
}

impl LocalStore {
    /// Open or create a database at `path` and apply pending migrations.
    pub async fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| ContentFlowError::io(parent, e))?;
            }
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(storage_err)?;
        let conn = db.connect().map_err(storage_err)?;

        let store = Self { db, conn };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<()> {
        let current_version = self.schema_version().await;

        for migration in migrations::all_migrations() {
            if migration.version > current_version {
                tracing::info!(
                    version = migration.version,
                    description = migration.description,
                    "applying migration"
                );
                self.conn
                    .execute_batch(migration.sql)
                    .await
                    .map_err(|e| {
                        ContentFlowError::Storage(format!(
                            "migration v{} failed: {e}",
                            migration.version
                        ))
                    })?;
            }
        }
        Ok(())
    }

    /// Current schema version, or 0 on a fresh file.
    async fn schema_version(&self) -> u32 {
        let result = self
            .conn
            .query("SELECT MAX(version) FROM schema_migrations", params![])
            .await;

        match result {
            Ok(mut rows) => match rows.next().await {
                Ok(Some(row)) => row.get::<u32>(0).unwrap_or(0),
                _ => 0,
            },
            // Table doesn't exist yet
            Err(_) => 0,
        }
    }
}

#[async_trait]
impl ContentStore for LocalStore {
    #[instrument(skip_all, fields(prd_id = %id))]
    async fn get_prd(&self, id: PrdId) -> Result<Option<Prd>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, title, body, created_at FROM prd WHERE id = ?1",
                params![id.to_string()],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_prd(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_prds(&self) -> Result<Vec<Prd>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, title, body, created_at FROM prd
                 ORDER BY created_at DESC, rowid DESC",
                params![],
            )
            .await
            .map_err(storage_err)?;

        let mut prds = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            prds.push(row_to_prd(&row)?);
        }
        Ok(prds)
    }

    #[instrument(skip_all, fields(title = %new_prd.title))]
    async fn create_prd(&self, new_prd: NewPrd) -> Result<Prd> {
        let prd = Prd {
            id: PrdId::new(),
            title: new_prd.title,
            body: new_prd.body,
            created_at: Some(Utc::now()),
        };
        let created_at = prd.created_at.map(format_ts).unwrap_or_default();

        self.conn
            .execute(
                "INSERT INTO prd (id, title, body, created_at) VALUES (?1, ?2, ?3, ?4)",
                params![
                    prd.id.to_string(),
                    prd.title.as_str(),
                    prd.body.as_str(),
                    created_at
                ],
            )
            .await
            .map_err(storage_err)?;

        tracing::debug!(prd_id = %prd.id, "created prd");
        Ok(prd)
    }

    #[instrument(skip_all, fields(prd_id = %prd_id, stage = %stage))]
    async fn get_latest_version(
        &self,
        prd_id: PrdId,
        stage: Stage,
    ) -> Result<Option<ContentVersion>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, prd_id, stage, content, created_at FROM content_version
                 WHERE prd_id = ?1 AND stage = ?2
                 ORDER BY created_at DESC, rowid DESC
                 LIMIT 1",
                params![prd_id.to_string(), stage.as_str()],
            )
            .await
            .map_err(storage_err)?;

        match rows.next().await.map_err(storage_err)? {
            Some(row) => Ok(Some(row_to_version(&row)?)),
            None => Ok(None),
        }
    }

    #[instrument(skip_all, fields(prd_id = %prd_id))]
    async fn list_versions(&self, prd_id: PrdId) -> Result<Vec<ContentVersion>> {
        let mut rows = self
            .conn
            .query(
                "SELECT id, prd_id, stage, content, created_at FROM content_version
                 WHERE prd_id = ?1
                 ORDER BY created_at ASC, rowid ASC",
                params![prd_id.to_string()],
            )
            .await
            .map_err(storage_err)?;

        let mut versions = Vec::new();
        while let Some(row) = rows.next().await.map_err(storage_err)? {
            versions.push(row_to_version(&row)?);
        }
        Ok(versions)
    }

    #[instrument(skip_all, fields(prd_id = %prd_id, stage = %stage))]
    async fn insert_version(
        &self,
        prd_id: PrdId,
        stage: Stage,
        content: serde_json::Value,
    ) -> Result<Vec<ContentVersion>> {
        let version = ContentVersion {
            id: Uuid::now_v7().to_string(),
            prd_id,
            stage,
            content,
            created_at: Utc::now(),
        };
        let content_json = serde_json::to_string(&version.content)
            .map_err(|e| ContentFlowError::Storage(format!("encode content: {e}")))?;

        self.conn
            .execute(
                "INSERT INTO content_version (id, prd_id, stage, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    version.id.as_str(),
                    prd_id.to_string(),
                    stage.as_str(),
                    content_json,
                    format_ts(version.created_at)
                ],
            )
            .await
            .map_err(storage_err)?;

        tracing::debug!(version_id = %version.id, "inserted content version");
        Ok(vec![version])
    }
}

// ---------------------------------------------------------------------------
// Row mapping
// ---------------------------------------------------------------------------

fn storage_err(e: libsql::Error) -> ContentFlowError {
    ContentFlowError::Storage(e.to_string())
}

fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ContentFlowError::Storage(format!("bad timestamp '{raw}': {e}")))
}

fn parse_id(raw: &str) -> Result<PrdId> {
    raw.parse()
        .map_err(|_| ContentFlowError::Storage(format!("bad prd id '{raw}'")))
}

fn row_to_prd(row: &Row) -> Result<Prd> {
    let id = row.get::<String>(0).map_err(storage_err)?;
    let created_at = row.get::<String>(3).map_err(storage_err)?;
    Ok(Prd {
        id: parse_id(&id)?,
        title: row.get::<String>(1).map_err(storage_err)?,
        body: row.get::<String>(2).map_err(storage_err)?,
        created_at: Some(parse_ts(&created_at)?),
    })
}

fn row_to_version(row: &Row) -> Result<ContentVersion> {
    let prd_id = row.get::<String>(1).map_err(storage_err)?;
    let stage = row.get::<String>(2).map_err(storage_err)?;
    let content = row.get::<String>(3).map_err(storage_err)?;
    let created_at = row.get::<String>(4).map_err(storage_err)?;

    Ok(ContentVersion {
        id: row.get::<String>(0).map_err(storage_err)?,
        prd_id: parse_id(&prd_id)?,
        stage: stage
            .parse()
            .map_err(|_| ContentFlowError::Storage(format!("bad stage '{stage}'")))?,
        content: serde_json::from_str(&content)
            .map_err(|e| ContentFlowError::Storage(format!("decode content: {e}")))?,
        created_at: parse_ts(&created_at)?,
    })
}
