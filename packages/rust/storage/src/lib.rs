//! Persistence layer for PRDs and their content versions.
//!
//! [`ContentStore`] is the seam the pipeline talks to. Three backends
//! implement it:
//!
//! - [`SupabaseStore`]: the hosted PostgREST API (production)
//! - [`LocalStore`]: an embedded libSQL file (offline use)
//! - [`MemoryStore`]: process memory (tests, dry runs)
//!
//! `content_version` is an append-only log. Multiple rows per
//! `(prd_id, stage)` may exist and readers always take the newest.

mod local;
mod memory;
mod migrations;
mod supabase;

use async_trait::async_trait;

use contentflow_shared::{ContentVersion, NewPrd, Prd, PrdId, Result, Stage};

pub use local::LocalStore;
pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

/// Read/append access to PRDs and content versions.
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Look up a PRD by id.
    async fn get_prd(&self, id: PrdId) -> Result<Option<Prd>>;

    /// All PRDs, newest first.
    async fn list_prds(&self) -> Result<Vec<Prd>>;

    /// Store a new PRD and return it with its assigned id.
    async fn create_prd(&self, new_prd: NewPrd) -> Result<Prd>;

    /// Newest version of `stage` for a PRD, if any.
    async fn get_latest_version(
        &self,
        prd_id: PrdId,
        stage: Stage,
    ) -> Result<Option<ContentVersion>>;

    /// Every version of a PRD, oldest first.
    async fn list_versions(&self, prd_id: PrdId) -> Result<Vec<ContentVersion>>;

    /// Append a version and return the stored rows.
    async fn insert_version(
        &self,
        prd_id: PrdId,
        stage: Stage,
        content: serde_json::Value,
    ) -> Result<Vec<ContentVersion>>;
}
