//! In-memory content store.
//!
//! Every write gets a `created_at` strictly greater than the previous one,
//! so "latest" is deterministic even for back-to-back inserts.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use tokio::sync::Mutex;
use uuid::Uuid;

use contentflow_shared::{ContentVersion, NewPrd, Prd, PrdId, Result, Stage};

use crate::ContentStore;

#[derive(Default)]
struct Tables {
    prds: Vec<Prd>,
    versions: Vec<ContentVersion>,
    last_ts: Option<DateTime<Utc>>,
}

impl Tables {
    fn next_timestamp(&mut self) -> DateTime<Utc> {
        let now = Utc::now();
        let ts = match self.last_ts {
            Some(last) if now <= last => last + Duration::microseconds(1),
            _ => now,
        };
        self.last_ts = Some(ts);
        ts
    }
}

/// Content store kept entirely in process memory.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a PRD with a caller-chosen id.
    pub async fn insert_prd(&self, prd: Prd) {
        let mut tables = self.tables.lock().await;
        let created_at = match prd.created_at {
            Some(ts) => ts,
            None => tables.next_timestamp(),
        };
        tables.prds.push(Prd {
            created_at: Some(created_at),
            ..prd
        });
    }
}

#[async_trait]
impl ContentStore for MemoryStore {
    async fn get_prd(&self, id: PrdId) -> Result<Option<Prd>> {
        let tables = self.tables.lock().await;
        Ok(tables.prds.iter().find(|p| p.id == id).cloned())
    }

    async fn list_prds(&self) -> Result<Vec<Prd>> {
        let tables = self.tables.lock().await;
        let mut prds = tables.prds.clone();
        // Stable sort keeps later inserts first among equal timestamps.
        prds.reverse();
        prds.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(prds)
    }

    async fn create_prd(&self, new_prd: NewPrd) -> Result<Prd> {
        let mut tables = self.tables.lock().await;
        let prd = Prd {
            id: PrdId::new(),
            title: new_prd.title,
            body: new_prd.body,
            created_at: Some(tables.next_timestamp()),
        };
        tables.prds.push(prd.clone());
        Ok(prd)
    }

    async fn get_latest_version(
        &self,
        prd_id: PrdId,
        stage: Stage,
    ) -> Result<Option<ContentVersion>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .versions
            .iter()
            .filter(|v| v.prd_id == prd_id && v.stage == stage)
            .max_by_key(|v| v.created_at)
            .cloned())
    }

    async fn list_versions(&self, prd_id: PrdId) -> Result<Vec<ContentVersion>> {
        let tables = self.tables.lock().await;
        let mut versions: Vec<ContentVersion> = tables
            .versions
            .iter()
            .filter(|v| v.prd_id == prd_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.created_at);
        Ok(versions)
    }

    async fn insert_version(
        &self,
        prd_id: PrdId,
        stage: Stage,
        content: serde_json::Value,
    ) -> Result<Vec<ContentVersion>> {
        let mut tables = self.tables.lock().await;
        let version = ContentVersion {
            id: Uuid::now_v7().to_string(),
            prd_id,
            stage,
            content,
            created_at: tables.next_timestamp(),
        };
        tables.versions.push(version.clone());
        Ok(vec![version])
    }
}
