//! Heuristic fact checker for composed drafts.
//!
//! Scores a draft on three fixed rules, in order:
//!
//! 1. research alignment: how many research bullets the draft quotes
//! 2. keyword alignment: how many PRD keywords the draft mentions
//! 3. vague language: hype terms, tolerated only when research exists
//!
//! Each rule appends either a check or an issue. A draft passes only with a
//! score of at least [`PASS_SCORE_THRESHOLD`] and no issues at all.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use contentflow_shared::{FactCheckReport, FactCheckStatus, Prd};

use crate::text::{bullet_lines, split_sentences, take_chars};

/// Minimum score for a PASS.
pub const PASS_SCORE_THRESHOLD: i32 = 7;

/// Keyword hits needed for the keyword check.
pub const MIN_KEYWORD_MATCHES: usize = 2;

/// Research bullet hits needed for the research check.
pub const MIN_RESEARCH_MATCHES: usize = 2;

/// Maximum keywords taken from a PRD.
pub const MAX_KEYWORDS: usize = 12;

/// Hype terms that need research backing.
pub const VAGUE_TERMS: [&str; 3] = ["revolutionize", "unprecedented", "game-changing"];

const SNIPPET_CHARS: usize = 80;
const MAX_SENTENCE_BULLETS: usize = 6;
const MAX_RESEARCH_POINTS: i32 = 5;
const MAX_KEYWORD_POINTS: i32 = 4;

/// Score breakdown for one draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftScore {
    pub score: i32,
    /// Rules the draft satisfied, in evaluation order.
    pub checks: Vec<String>,
    /// Rules the draft failed, in evaluation order.
    pub issues: Vec<String>,
}

impl DraftScore {
    pub fn status(&self) -> FactCheckStatus {
        classify(self.score, &self.issues)
    }

    /// Turn the score into an unpersisted report.
    pub fn into_report(self) -> FactCheckReport {
        FactCheckReport {
            status: self.status(),
            score: self.score,
            checks: self.checks,
            issues: self.issues,
            inserted: None,
        }
    }
}

/// PASS iff `score >= PASS_SCORE_THRESHOLD` and there are no issues.
pub fn classify(score: i32, issues: &[String]) -> FactCheckStatus {
    if score >= PASS_SCORE_THRESHOLD && issues.is_empty() {
        FactCheckStatus::Pass
    } else {
        FactCheckStatus::Fail
    }
}

/// Derive up to [`MAX_KEYWORDS`] keywords from the PRD title and body.
///
/// Tokens are lowercase ASCII alphanumeric runs. A token qualifies when it
/// occurs more than once or is longer than five characters. Keywords keep
/// the order in which tokens first appear.
pub fn extract_keywords(prd: &Prd) -> Vec<String> {
    static TOKEN_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"[a-zA-Z0-9]+").expect("valid regex"));

    let text = format!(
        "{} {}",
        prd.title.trim().to_lowercase(),
        prd.body.trim().to_lowercase()
    );

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for token in TOKEN_RE.find_iter(&text).map(|m| m.as_str()) {
        let count = counts.entry(token).or_insert(0);
        if *count == 0 {
            order.push(token);
        }
        *count += 1;
    }

    order
        .into_iter()
        .filter(|token| counts[token] > 1 || token.len() > 5)
        .take(MAX_KEYWORDS)
        .map(str::to_string)
        .collect()
}

/// Lowercased research bullets, falling back to at most six sentences when
/// the research has no usable lines.
pub fn extract_research_bullets(research_text: &str) -> Vec<String> {
    let bullets: Vec<String> = bullet_lines(research_text)
        .map(str::to_lowercase)
        .collect();
    if !bullets.is_empty() {
        return bullets;
    }
    split_sentences(research_text)
        .into_iter()
        .take(MAX_SENTENCE_BULLETS)
        .map(str::to_lowercase)
        .collect()
}

/// Count bullets whose first 80 characters appear verbatim in the draft.
pub fn count_research_hits(draft: &str, research_bullets: &[String]) -> usize {
    let draft_lower = draft.to_lowercase();
    research_bullets
        .iter()
        .map(|bullet| take_chars(bullet, SNIPPET_CHARS))
        .filter(|snippet| !snippet.is_empty() && draft_lower.contains(snippet))
        .count()
}

/// Score a draft against the PRD and the research it was written from.
pub fn score_draft(prd: &Prd, research_text: &str, draft: &str) -> DraftScore {
    let mut checks = Vec::new();
    let mut issues = Vec::new();
    let mut score: i32 = 0;
    let draft_lower = draft.to_lowercase();

    let research_bullets = extract_research_bullets(research_text);
    let research_hits = count_research_hits(draft, &research_bullets);
    if research_hits >= MIN_RESEARCH_MATCHES {
        checks.push(format!("matched {research_hits} research bullets"));
        score += points(research_hits, MAX_RESEARCH_POINTS);
    } else {
        issues.push("Draft cites too few research insights".to_string());
    }

    let keywords = extract_keywords(prd);
    let keyword_hits = keywords
        .iter()
        .filter(|keyword| draft_lower.contains(keyword.as_str()))
        .count();
    if keyword_hits >= MIN_KEYWORD_MATCHES {
        checks.push(format!("found {keyword_hits} PRD keywords"));
        score += points(keyword_hits, MAX_KEYWORD_POINTS);
    } else {
        issues.push("Draft needs more alignment with PRD terminology".to_string());
    }

    let has_vague_terms = VAGUE_TERMS.iter().any(|term| draft_lower.contains(term));
    if has_vague_terms && research_bullets.is_empty() {
        issues.push("Vague claims detected without supporting research".to_string());
        score -= 2;
    } else if has_vague_terms {
        checks.push("Vague language supported by research context".to_string());
        score += 1;
    }

    debug!(
        score,
        research_hits,
        keyword_hits,
        keywords = keywords.len(),
        issues = issues.len(),
        "scored draft"
    );

    DraftScore {
        score,
        checks,
        issues,
    }
}

fn points(hits: usize, cap: i32) -> i32 {
    i32::try_from(hits).unwrap_or(i32::MAX).min(cap)
}
