//! Content agents for the ContentFlow pipeline.
//!
//! - [`writer`] composes a deterministic draft from a PRD and research notes
//! - [`fact_checker`] scores a draft and classifies it PASS or FAIL
//!
//! Both agents are pure functions of their inputs. Persistence lives in
//! `contentflow-core`.

mod text;

pub mod fact_checker;
pub mod writer;

pub use fact_checker::{
    DraftScore, PASS_SCORE_THRESHOLD, classify, count_research_hits, extract_keywords,
    extract_research_bullets, score_draft,
};
pub use writer::compose_draft;
