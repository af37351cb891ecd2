//! Route handlers and the HTTP error mapping.
//!
//! Every keyed route checks `x-api-key` before looking at the request body.
//! Failures render as `{"detail": <code>}`; a draft that fails fact-checking
//! renders as a 422 carrying the full report.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{error, info};

use contentflow_core::{RunOutcome, SilentProgress};
use contentflow_shared::{ContentFlowError, FactCheckReport, NewPrd, PrdId};
use contentflow_storage::ContentStore;

use crate::server::AppState;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Everything a handler can fail with.
#[derive(Debug)]
pub(crate) enum ApiError {
    Failed(ContentFlowError),
    /// The draft was written but did not pass fact-checking.
    Rejected(FactCheckReport),
    /// PRD creation input was incomplete.
    InvalidPrd(String),
}

impl From<ContentFlowError> for ApiError {
    fn from(err: ContentFlowError) -> Self {
        Self::Failed(err)
    }
}

/// HTTP status for a domain error.
pub(crate) fn status_for(err: &ContentFlowError) -> StatusCode {
    match err {
        ContentFlowError::Unauthorized => StatusCode::UNAUTHORIZED,
        ContentFlowError::Validation { .. } => StatusCode::BAD_REQUEST,
        ContentFlowError::PrdNotFound => StatusCode::NOT_FOUND,
        ContentFlowError::MissingStage(_) => StatusCode::CONFLICT,
        ContentFlowError::Config { .. }
        | ContentFlowError::Network(_)
        | ContentFlowError::Storage(_)
        | ContentFlowError::Io { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            Self::Failed(err) => {
                let status = status_for(&err);
                if status.is_server_error() {
                    error!(error = %err, "request failed");
                }
                (status, Json(json!({ "detail": err.code() }))).into_response()
            }
            Self::Rejected(report) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(json!({ "detail": { "factcheck": report } })),
            )
                .into_response(),
            Self::InvalidPrd(message) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "ok": false, "error": message })),
            )
                .into_response(),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(crate) async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

#[derive(Debug, Deserialize)]
pub(crate) struct RunBody {
    prd_id: String,
}

/// `POST /run`: research → draft → fact-check for one PRD.
pub(crate) async fn run_pipeline(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<RunBody>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    state.authorize(&headers)?;
    let Json(body) = body.map_err(|rejection| ContentFlowError::validation(rejection.body_text()))?;
    let prd_id: PrdId = body.prd_id.parse()?;

    info!(%prd_id, "run requested");
    match state.pipeline.run(prd_id, &SilentProgress).await? {
        RunOutcome::Completed(result) => Ok(Json(json!({
            "ok": true,
            "run_id": result.run_id,
            "result": {
                "research": result.research,
                "draft": result.draft,
                "factcheck": result.factcheck,
            },
        }))),
        RunOutcome::Rejected(report) => Err(ApiError::Rejected(report)),
    }
}

/// `POST /prd`
pub(crate) async fn create_prd(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Json<NewPrd>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    state.authorize(&headers)?;
    let new_prd = body.map(|Json(new_prd)| new_prd).unwrap_or_default();
    if let Err(err) = new_prd.validate() {
        return Err(ApiError::InvalidPrd(err.code()));
    }

    let prd = state.pipeline.store().create_prd(new_prd).await?;
    info!(prd_id = %prd.id, "prd created");
    Ok((StatusCode::CREATED, Json(json!({ "ok": true, "prd": prd }))))
}

/// `GET /prd`
pub(crate) async fn list_prds(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Value>, ApiError> {
    state.authorize(&headers)?;
    let prds = state.pipeline.store().list_prds().await?;
    Ok(Json(json!({ "ok": true, "prds": prds })))
}

/// `GET /prd/{id}/versions`
pub(crate) async fn list_versions(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    state.authorize(&headers)?;
    let prd_id: PrdId = id.parse()?;
    let versions = state.pipeline.store().list_versions(prd_id).await?;
    Ok(Json(json!({ "ok": true, "versions": versions })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use contentflow_core::Pipeline;
    use contentflow_shared::{Prd, Stage};
    use contentflow_storage::MemoryStore;
    use tokio::net::TcpListener;

    use crate::server::{API_KEY_HEADER, router};

    const KEY: &str = "test-agents-key";

    struct TestServer {
        base: String,
        store: Arc<MemoryStore>,
        client: reqwest::Client,
    }

    impl TestServer {
        async fn start(api_key: Option<&str>) -> Self {
            let store = Arc::new(MemoryStore::new());
            let state = AppState::new(Pipeline::new(store.clone()), api_key.map(String::from));

            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            tokio::spawn(async move {
                axum::serve(listener, router(state)).await.unwrap();
            });

            Self {
                base: format!("http://{addr}"),
                store,
                client: reqwest::Client::new(),
            }
        }

        fn url(&self, path: &str) -> String {
            format!("{}{path}", self.base)
        }

        async fn post_run(&self, key: &str, body: &str) -> (u16, Value) {
            let response = self
                .client
                .post(self.url("/run"))
                .header(API_KEY_HEADER, key)
                .header("content-type", "application/json")
                .body(body.to_string())
                .send()
                .await
                .unwrap();
            let status = response.status().as_u16();
            (status, response.json().await.unwrap())
        }

        async fn seed_prd(&self, title: &str, body: &str) -> PrdId {
            let id = PrdId::new();
            self.store
                .insert_prd(Prd {
                    id,
                    title: title.into(),
                    body: body.into(),
                    created_at: None,
                })
                .await;
            id
        }
    }

    // -----------------------------------------------------------------------
    // Health and auth
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn health_needs_no_key() {
        let server = TestServer::start(None).await;
        let response = reqwest::get(server.url("/health")).await.unwrap();
        assert_eq!(response.status().as_u16(), 200);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "ok": true }));
    }

    #[tokio::test]
    async fn wrong_key_is_unauthorized() {
        let server = TestServer::start(Some(KEY)).await;
        let prd_id = server.seed_prd("Solar Launch", "Body.").await;

        let (status, body) = server
            .post_run("nope", &json!({ "prd_id": prd_id }).to_string())
            .await;
        assert_eq!(status, 401);
        assert_eq!(body, json!({ "detail": "bad key" }));
    }

    #[tokio::test]
    async fn unset_key_rejects_everything() {
        let server = TestServer::start(None).await;
        let (status, _) = server
            .post_run("", &json!({ "prd_id": PrdId::new() }).to_string())
            .await;
        assert_eq!(status, 401);
    }

    #[tokio::test]
    async fn key_is_checked_before_body() {
        let server = TestServer::start(Some(KEY)).await;
        let (status, _) = server.post_run("nope", "{not json").await;
        assert_eq!(status, 401);
    }

    // -----------------------------------------------------------------------
    // POST /run
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let server = TestServer::start(Some(KEY)).await;

        let (status, _) = server.post_run(KEY, "{not json").await;
        assert_eq!(status, 400);

        let (status, _) = server.post_run(KEY, "{}").await;
        assert_eq!(status, 400);
    }

    #[tokio::test]
    async fn invalid_uuid_is_bad_request() {
        let server = TestServer::start(Some(KEY)).await;
        let (status, body) = server
            .post_run(KEY, &json!({ "prd_id": "not-a-uuid" }).to_string())
            .await;
        assert_eq!(status, 400);
        assert_eq!(body["detail"], "prd_id must be a valid UUID");
    }

    #[tokio::test]
    async fn unknown_prd_is_not_found() {
        let server = TestServer::start(Some(KEY)).await;
        let (status, body) = server
            .post_run(KEY, &json!({ "prd_id": PrdId::new() }).to_string())
            .await;
        assert_eq!(status, 404);
        assert_eq!(body, json!({ "detail": "prd_not_found" }));
    }

    #[tokio::test]
    async fn successful_run_returns_all_stages() {
        let server = TestServer::start(Some(KEY)).await;
        let prd_id = server
            .seed_prd("Solar Launch", "Compact launch overview.")
            .await;

        let (status, body) = server
            .post_run(KEY, &json!({ "prd_id": prd_id }).to_string())
            .await;
        assert_eq!(status, 200);
        assert_eq!(body["ok"], true);
        assert!(
            body["run_id"]
                .as_str()
                .unwrap()
                .starts_with("research+draft+fact-")
        );
        assert_eq!(body["result"]["research"]["stage"], "research");
        assert!(
            body["result"]["draft"]["draft_preview"]
                .as_str()
                .unwrap()
                .starts_with("Solar Launch")
        );
        assert_eq!(body["result"]["factcheck"]["status"], "PASS");
        assert_eq!(
            body["result"]["factcheck"]["inserted"][0]["stage"],
            "fact_checked"
        );
    }

    #[tokio::test]
    async fn failed_factcheck_is_unprocessable() {
        let server = TestServer::start(Some(KEY)).await;
        let prd_id = server
            .seed_prd("Solar Launch", "Compact launch overview.")
            .await;
        server
            .store
            .insert_version(
                prd_id,
                Stage::Research,
                "- Panel efficiency\n- Storage upgrade\n- Market timing".into(),
            )
            .await
            .unwrap();

        let (status, body) = server
            .post_run(KEY, &json!({ "prd_id": prd_id }).to_string())
            .await;
        assert_eq!(status, 422);
        assert_eq!(body["detail"]["factcheck"]["status"], "FAIL");
        assert_eq!(body["detail"]["factcheck"]["score"], 6);
    }

    // -----------------------------------------------------------------------
    // PRD routes
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_and_list_prds() {
        let server = TestServer::start(Some(KEY)).await;

        let response = server
            .client
            .post(server.url("/prd"))
            .header(API_KEY_HEADER, KEY)
            .json(&json!({ "title": "Solar Launch", "body": "Compact launch overview." }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 201);
        let created: Value = response.json().await.unwrap();
        assert_eq!(created["ok"], true);
        assert_eq!(created["prd"]["title"], "Solar Launch");

        let listed: Value = server
            .client
            .get(server.url("/prd"))
            .header(API_KEY_HEADER, KEY)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(listed["prds"].as_array().unwrap().len(), 1);
        assert_eq!(listed["prds"][0]["id"], created["prd"]["id"]);
    }

    #[tokio::test]
    async fn create_prd_requires_title_and_body() {
        let server = TestServer::start(Some(KEY)).await;
        let response = server
            .client
            .post(server.url("/prd"))
            .header(API_KEY_HEADER, KEY)
            .json(&json!({ "title": "Only a title" }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body, json!({ "ok": false, "error": "Missing title/body" }));
    }

    #[tokio::test]
    async fn prd_routes_are_keyed() {
        let server = TestServer::start(Some(KEY)).await;
        let response = server.client.get(server.url("/prd")).send().await.unwrap();
        assert_eq!(response.status().as_u16(), 401);
    }

    #[tokio::test]
    async fn versions_follow_a_run_in_order() {
        let server = TestServer::start(Some(KEY)).await;
        let prd_id = server
            .seed_prd("Solar Launch", "Compact launch overview.")
            .await;
        server
            .post_run(KEY, &json!({ "prd_id": prd_id }).to_string())
            .await;

        let body: Value = server
            .client
            .get(server.url(&format!("/prd/{prd_id}/versions")))
            .header(API_KEY_HEADER, KEY)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        let stages: Vec<&str> = body["versions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["stage"].as_str().unwrap())
            .collect();
        assert_eq!(stages, vec!["research", "draft", "fact_checked"]);
    }

    #[tokio::test]
    async fn versions_reject_malformed_id() {
        let server = TestServer::start(Some(KEY)).await;
        let response = server
            .client
            .get(server.url("/prd/not-a-uuid/versions"))
            .header(API_KEY_HEADER, KEY)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 400);
    }

    // -----------------------------------------------------------------------
    // Status mapping
    // -----------------------------------------------------------------------

    #[test]
    fn domain_errors_map_to_statuses() {
        assert_eq!(
            status_for(&ContentFlowError::MissingStage(Stage::Draft)),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_for(&ContentFlowError::Storage("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(&ContentFlowError::validation("bad")),
            StatusCode::BAD_REQUEST
        );
    }

    #[tokio::test]
    async fn missing_stage_renders_conflict_detail() {
        let response = ApiError::from(ContentFlowError::MissingStage(Stage::Research)).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body, json!({ "detail": "missing_research" }));
    }
}
