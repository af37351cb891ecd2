//! Core pipeline orchestration for ContentFlow.
//!
//! Ties the content agents to a [`contentflow_storage::ContentStore`]:
//! research stub → draft → fact-check, each step persisted as a new
//! content version.

pub mod pipeline;

pub use pipeline::{
    DRAFT_PREVIEW_CHARS, Pipeline, RunOutcome, RunResult, STUB_RESEARCH, SilentProgress,
    StageReporter, WriterResult,
};
