//! Supabase backend, speaking PostgREST over HTTP.
//!
//! Each call maps to one request against `/rest/v1/<table>`. The
//! service-role key is sent as both `apikey` and bearer token.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::instrument;
use url::Url;

use contentflow_shared::{
    ContentFlowError, ContentVersion, NewPrd, Prd, PrdId, Result, Stage, SupabaseCredentials,
};

use crate::ContentStore;

const USER_AGENT: &str = concat!("contentflow/", env!("CARGO_PKG_VERSION"));

const PRD_TABLE: &str = "prd";
const VERSION_TABLE: &str = "content_version";
const PRD_COLUMNS: &str = "id,title,body,created_at";
const VERSION_COLUMNS: &str = "id,prd_id,stage,content,created_at";

/// Content store backed by a Supabase project.
#[derive(Debug, Clone)]
pub struct SupabaseStore {
    client: Client,
    base_url: Url,
    service_role: String,
}

#[derive(Serialize)]
struct VersionInsert<'a> {
    prd_id: PrdId,
    stage: Stage,
    content: &'a serde_json::Value,
}

impl SupabaseStore {
    /// Build a store from resolved credentials.
    pub fn new(credentials: &SupabaseCredentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(credentials.timeout_secs))
            .build()
            .map_err(|e| ContentFlowError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: credentials.url.clone(),
            service_role: credentials.service_role.clone(),
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!(
            "{}/rest/v1/{table}",
            self.base_url.as_str().trim_end_matches('/')
        )
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_role)
            .bearer_auth(&self.service_role)
    }

    fn select(&self, table: &str, query: &[(&str, String)]) -> RequestBuilder {
        self.authorized(self.client.get(self.table_url(table)))
            .query(query)
    }

    fn insert<T: Serialize + ?Sized>(&self, table: &str, row: &T) -> RequestBuilder {
        self.authorized(self.client.post(self.table_url(table)))
            .header("Prefer", "return=representation")
            .json(row)
    }
}

/// Send a request and decode a JSON array of rows.
async fn fetch_rows<T: DeserializeOwned>(table: &str, request: RequestBuilder) -> Result<Vec<T>> {
    let response = request
        .send()
        .await
        .map_err(|e| ContentFlowError::Network(format!("{table}: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(storage_status(table, status, &body));
    }

    response
        .json::<Vec<T>>()
        .await
        .map_err(|e| ContentFlowError::Storage(format!("{table}: unreadable response: {e}")))
}

fn storage_status(table: &str, status: StatusCode, body: &str) -> ContentFlowError {
    ContentFlowError::Storage(format!("{table}: HTTP {status}: {}", body.trim()))
}

#[async_trait]
impl ContentStore for SupabaseStore {
    #[instrument(skip_all, fields(prd_id = %id))]
    async fn get_prd(&self, id: PrdId) -> Result<Option<Prd>> {
        let request = self.select(
            PRD_TABLE,
            &[
                ("select", PRD_COLUMNS.to_string()),
                ("id", format!("eq.{id}")),
                ("limit", "1".to_string()),
            ],
        );
        let rows: Vec<Prd> = fetch_rows(PRD_TABLE, request).await?;
        Ok(rows.into_iter().next())
    }

    async fn list_prds(&self) -> Result<Vec<Prd>> {
        let request = self.select(
            PRD_TABLE,
            &[
                ("select", PRD_COLUMNS.to_string()),
                ("order", "created_at.desc".to_string()),
            ],
        );
        fetch_rows(PRD_TABLE, request).await
    }

    #[instrument(skip_all, fields(title = %new_prd.title))]
    async fn create_prd(&self, new_prd: NewPrd) -> Result<Prd> {
        let request = self.insert(PRD_TABLE, &new_prd);
        let rows: Vec<Prd> = fetch_rows(PRD_TABLE, request).await?;
        let prd = rows
            .into_iter()
            .next()
            .ok_or_else(|| ContentFlowError::Storage(format!("{PRD_TABLE}: insert returned no rows")))?;
        tracing::debug!(prd_id = %prd.id, "created prd");
        Ok(prd)
    }

    #[instrument(skip_all, fields(prd_id = %prd_id, stage = %stage))]
    async fn get_latest_version(
        &self,
        prd_id: PrdId,
        stage: Stage,
    ) -> Result<Option<ContentVersion>> {
        let request = self.select(
            VERSION_TABLE,
            &[
                ("select", VERSION_COLUMNS.to_string()),
                ("prd_id", format!("eq.{prd_id}")),
                ("stage", format!("eq.{stage}")),
                ("order", "created_at.desc".to_string()),
                ("limit", "1".to_string()),
            ],
        );
        let rows: Vec<ContentVersion> = fetch_rows(VERSION_TABLE, request).await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip_all, fields(prd_id = %prd_id))]
    async fn list_versions(&self, prd_id: PrdId) -> Result<Vec<ContentVersion>> {
        let request = self.select(
            VERSION_TABLE,
            &[
                ("select", VERSION_COLUMNS.to_string()),
                ("prd_id", format!("eq.{prd_id}")),
                ("order", "created_at.asc".to_string()),
            ],
        );
        fetch_rows(VERSION_TABLE, request).await
    }

    #[instrument(skip_all, fields(prd_id = %prd_id, stage = %stage))]
    async fn insert_version(
        &self,
        prd_id: PrdId,
        stage: Stage,
        content: serde_json::Value,
    ) -> Result<Vec<ContentVersion>> {
        let row = VersionInsert {
            prd_id,
            stage,
            content: &content,
        };
        let request = self.insert(VERSION_TABLE, &row);
        let inserted: Vec<ContentVersion> = fetch_rows(VERSION_TABLE, request).await?;
        tracing::debug!(rows = inserted.len(), "inserted content version");
        Ok(inserted)
    }
}
