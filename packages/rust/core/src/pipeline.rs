//! Pipeline orchestration: research → draft → fact-check.
//!
//! Every step reads its inputs from the store, so steps can be re-run
//! independently. Writes are append-only; re-running a step adds a newer
//! version instead of replacing the old one.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use contentflow_agents::{compose_draft, score_draft};
use contentflow_shared::{
    ContentFlowError, ContentVersion, FactCheckReport, Prd, PrdId, Result, Stage,
};
use contentflow_storage::ContentStore;

/// Research text inserted when a PRD has no research yet.
pub const STUB_RESEARCH: &str = "Research notes (stub):\n\
- Goal clarified\n\
- Three differentiators documented\n\
- Success metrics outlined\n\
(Replace with LangGraph-powered research stage).";

/// Characters of the draft returned as a preview.
pub const DRAFT_PREVIEW_CHARS: usize = 240;

/// Output of the writer step.
#[derive(Debug, Clone, Serialize)]
pub struct WriterResult {
    pub draft_preview: String,
    pub inserted: Vec<ContentVersion>,
}

/// A completed run whose draft passed fact-checking.
#[derive(Debug, Clone)]
pub struct RunResult {
    /// `research+draft+fact-<uuid>`.
    pub run_id: String,
    pub research: ContentVersion,
    pub draft: WriterResult,
    pub factcheck: FactCheckReport,
}

/// How a full run ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(RunResult),
    /// The draft was written but failed fact-checking; nothing was marked
    /// fact-checked.
    Rejected(FactCheckReport),
}

/// Progress callback for pipeline runs.
pub trait StageReporter: Send + Sync {
    /// Called when a step starts.
    fn stage(&self, name: &str);
    /// Called once the run has an outcome.
    fn done(&self, outcome: &RunOutcome);
}

/// No-op reporter for headless/test usage.
pub struct SilentProgress;

impl StageReporter for SilentProgress {
    fn stage(&self, _name: &str) {}
    fn done(&self, _outcome: &RunOutcome) {}
}

/// Runs the content pipeline against a [`ContentStore`].
#[derive(Clone)]
pub struct Pipeline {
    store: Arc<dyn ContentStore>,
}

impl Pipeline {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ContentStore> {
        &self.store
    }

    async fn require_prd(&self, prd_id: PrdId) -> Result<Prd> {
        self.store
            .get_prd(prd_id)
            .await?
            .ok_or(ContentFlowError::PrdNotFound)
    }

    async fn require_stage(&self, prd_id: PrdId, stage: Stage) -> Result<ContentVersion> {
        self.store
            .get_latest_version(prd_id, stage)
            .await?
            .ok_or(ContentFlowError::MissingStage(stage))
    }

    /// Latest research for the PRD, inserting the stub when there is none.
    ///
    /// Does not check that the PRD exists.
    #[instrument(skip_all, fields(prd_id = %prd_id))]
    pub async fn ensure_research_stage(&self, prd_id: PrdId) -> Result<ContentVersion> {
        if let Some(existing) = self
            .store
            .get_latest_version(prd_id, Stage::Research)
            .await?
        {
            return Ok(existing);
        }

        info!("no research found, inserting stub");
        self.store
            .insert_version(prd_id, Stage::Research, STUB_RESEARCH.into())
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| ContentFlowError::Storage("failed to insert research stub".into()))
    }

    /// Compose a draft from the PRD and its latest research and store it.
    #[instrument(skip_all, fields(prd_id = %prd_id))]
    pub async fn run_writer_step(&self, prd_id: PrdId) -> Result<WriterResult> {
        let prd = self.require_prd(prd_id).await?;
        let research = self.require_stage(prd_id, Stage::Research).await?;

        let draft = compose_draft(&prd, &research.text());
        let draft_preview: String = draft.chars().take(DRAFT_PREVIEW_CHARS).collect();

        let inserted = self
            .store
            .insert_version(prd_id, Stage::Draft, draft.into())
            .await?;
        info!(rows = inserted.len(), "draft stored");

        Ok(WriterResult {
            draft_preview,
            inserted,
        })
    }

    /// Score the latest draft. A PASS is stored as a `fact_checked`
    /// version and the stored rows are attached to the returned report.
    #[instrument(skip_all, fields(prd_id = %prd_id))]
    pub async fn run_factcheck_step(&self, prd_id: PrdId) -> Result<FactCheckReport> {
        let prd = self.require_prd(prd_id).await?;
        let research = self.require_stage(prd_id, Stage::Research).await?;
        let draft = self.require_stage(prd_id, Stage::Draft).await?;

        let mut report = score_draft(&prd, &research.text(), &draft.text()).into_report();
        info!(
            status = ?report.status,
            score = report.score,
            issues = report.issues.len(),
            "fact-check complete"
        );

        if report.passed() {
            let content = serde_json::to_value(&report)
                .map_err(|e| ContentFlowError::Storage(format!("encode report: {e}")))?;
            let inserted = self
                .store
                .insert_version(prd_id, Stage::FactChecked, content)
                .await?;
            report.inserted = Some(inserted);
        }

        Ok(report)
    }

    /// Run every step for one PRD.
    ///
    /// Storage and lookup failures are errors; a failed fact-check is a
    /// [`RunOutcome::Rejected`] value.
    #[instrument(skip_all, fields(prd_id = %prd_id))]
    pub async fn run(&self, prd_id: PrdId, reporter: &dyn StageReporter) -> Result<RunOutcome> {
        reporter.stage("Checking PRD");
        self.require_prd(prd_id).await?;

        reporter.stage("Research");
        let research = self.ensure_research_stage(prd_id).await?;

        reporter.stage("Writing draft");
        let draft = self.run_writer_step(prd_id).await?;

        reporter.stage("Fact-checking");
        let factcheck = self.run_factcheck_step(prd_id).await?;

        let outcome = if factcheck.passed() {
            let run_id = format!("research+draft+fact-{}", Uuid::new_v4());
            info!(%run_id, "run completed");
            RunOutcome::Completed(RunResult {
                run_id,
                research,
                draft,
                factcheck,
            })
        } else {
            warn!(score = factcheck.score, "draft rejected by fact-check");
            RunOutcome::Rejected(factcheck)
        };

        reporter.done(&outcome);
        Ok(outcome)
    }
}
