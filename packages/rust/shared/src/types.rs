//! Core domain types for the ContentFlow content pipeline.

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::ContentFlowError;

// ---------------------------------------------------------------------------
// PrdId
// ---------------------------------------------------------------------------

/// UUID wrapper for PRD identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrdId(pub Uuid);

impl PrdId {
    /// Generate a new time-sortable PRD identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for PrdId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PrdId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for PrdId {
    type Err = ContentFlowError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|_| ContentFlowError::validation("prd_id must be a valid UUID"))
    }
}

// ---------------------------------------------------------------------------
// Prd
// ---------------------------------------------------------------------------

/// A product requirements document, as stored in the `prd` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prd {
    pub id: PrdId,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub body: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Input for creating a PRD.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPrd {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl NewPrd {
    /// Reject PRDs with a blank title or body.
    pub fn validate(&self) -> crate::Result<()> {
        if self.title.trim().is_empty() || self.body.trim().is_empty() {
            return Err(ContentFlowError::validation("Missing title/body"));
        }
        Ok(())
    }
}

fn null_as_empty<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Stage / ContentVersion
// ---------------------------------------------------------------------------

/// Pipeline stage a [`ContentVersion`] belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Research,
    Draft,
    FactChecked,
}

impl Stage {
    /// Wire name, as stored in the `stage` column.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Research => "research",
            Self::Draft => "draft",
            Self::FactChecked => "fact_checked",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Stage {
    type Err = ContentFlowError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "research" => Ok(Self::Research),
            "draft" => Ok(Self::Draft),
            "fact_checked" => Ok(Self::FactChecked),
            other => Err(ContentFlowError::validation(format!(
                "unknown stage '{other}'"
            ))),
        }
    }
}

/// One append-only row of the `content_version` log.
///
/// Multiple versions per `(prd_id, stage)` may exist; the one with the
/// greatest `created_at` is the latest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentVersion {
    pub id: String,
    pub prd_id: PrdId,
    pub stage: Stage,
    /// Plain text for research/draft, a JSON report for fact_checked.
    #[serde(default)]
    pub content: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ContentVersion {
    /// Content as text: strings as-is, `null` as empty, anything else as
    /// compact JSON.
    pub fn text(&self) -> Cow<'_, str> {
        match &self.content {
            serde_json::Value::String(s) => Cow::Borrowed(s.as_str()),
            serde_json::Value::Null => Cow::Borrowed(""),
            other => Cow::Owned(other.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// FactCheckReport
// ---------------------------------------------------------------------------

/// Outcome classification of a fact-check run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FactCheckStatus {
    Pass,
    Fail,
}

/// Fact-check report, returned to callers and persisted on PASS.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactCheckReport {
    pub status: FactCheckStatus,
    pub score: i32,
    pub checks: Vec<String>,
    pub issues: Vec<String>,
    /// Rows written for this report; only set after a PASS was persisted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inserted: Option<Vec<ContentVersion>>,
}

impl FactCheckReport {
    /// Whether the draft cleared the fact-check gate.
    pub fn passed(&self) -> bool {
        self.status == FactCheckStatus::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prd_id_roundtrip() {
        let id = PrdId::new();
        let s = id.to_string();
        let parsed: PrdId = s.parse().expect("parse PrdId");
        assert_eq!(id, parsed);
    }

    #[test]
    fn prd_id_rejects_garbage() {
        let err = "not-a-uuid".parse::<PrdId>().unwrap_err();
        assert_eq!(err.code(), "prd_id must be a valid UUID");
    }

    #[test]
    fn prd_null_fields_become_empty() {
        let json = r#"{"id":"0190b4a0-7c2e-7d3a-9f1e-2a3b4c5d6e7f","title":null,"body":null}"#;
        let prd: Prd = serde_json::from_str(json).expect("deserialize prd");
        assert_eq!(prd.title, "");
        assert_eq!(prd.body, "");
        assert!(prd.created_at.is_none());
    }

    #[test]
    fn new_prd_requires_title_and_body() {
        let ok = NewPrd {
            title: "Solar Launch".into(),
            body: "Compact launch overview.".into(),
        };
        assert!(ok.validate().is_ok());

        let blank = NewPrd {
            title: "  ".into(),
            body: "Body".into(),
        };
        assert_eq!(blank.validate().unwrap_err().code(), "Missing title/body");
    }

    #[test]
    fn stage_wire_names() {
        assert_eq!(
            serde_json::to_string(&Stage::FactChecked).unwrap(),
            "\"fact_checked\""
        );
        assert_eq!("draft".parse::<Stage>().unwrap(), Stage::Draft);
        assert!("published".parse::<Stage>().is_err());
    }

    #[test]
    fn content_version_text_handles_json_content() {
        let version = ContentVersion {
            id: "v1".into(),
            prd_id: PrdId::new(),
            stage: Stage::FactChecked,
            content: serde_json::json!({"status": "PASS"}),
            created_at: Utc::now(),
        };
        assert_eq!(version.text(), r#"{"status":"PASS"}"#);

        let empty = ContentVersion {
            content: serde_json::Value::Null,
            ..version
        };
        assert_eq!(empty.text(), "");
    }

    #[test]
    fn report_omits_inserted_until_persisted() {
        let report = FactCheckReport {
            status: FactCheckStatus::Fail,
            score: 3,
            checks: vec!["found 3 PRD keywords".into()],
            issues: vec!["Draft cites too few research insights".into()],
            inserted: None,
        };
        let json = serde_json::to_value(&report).expect("serialize");
        assert_eq!(json["status"], "FAIL");
        assert!(json.get("inserted").is_none());
        assert!(!report.passed());
    }
}
