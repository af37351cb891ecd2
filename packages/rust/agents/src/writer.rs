//! Deterministic draft composer.
//!
//! Turns a PRD and the latest research notes into a short blog-style draft:
//! title, intro, a "Key Points" list and a fixed call to action. The output
//! depends only on the inputs, so the same PRD and research always yield the
//! same bytes.

use contentflow_shared::Prd;

use crate::text::{bullet_lines, collapse_whitespace, split_sentences, truncate_at_word};

/// Minimum number of key points in a draft.
pub const MIN_KEY_POINTS: usize = 3;

/// Maximum number of key points in a draft.
pub const MAX_KEY_POINTS: usize = 6;

/// Maximum characters of PRD body quoted in the intro.
pub const INTRO_MAX_CHARS: usize = 320;

const DEFAULT_TITLE: &str = "Untitled Concept";

const FILLER_POINT: &str = "Further detail to be refined with the team.";

/// Compose a draft from a PRD and research notes.
///
/// Never fails: blank titles, empty bodies and empty research all fall back
/// to fixed text.
pub fn compose_draft(prd: &Prd, research_text: &str) -> String {
    let title = match prd.title.trim() {
        "" => DEFAULT_TITLE,
        t => t,
    };

    let intro = intro_sentence(title, &prd.body);

    let fallback_source = if prd.body.is_empty() {
        research_text
    } else {
        prd.body.as_str()
    };
    let points = ensure_min_points(extract_points(research_text), fallback_source);

    let closing = format!(
        "Interested in shaping the next iteration of {title}? \
         Share feedback and help steer the roadmap."
    );

    let mut lines: Vec<String> = vec![
        title.to_string(),
        String::new(),
        intro,
        String::new(),
        "Key Points:".to_string(),
    ];
    lines.extend(points.iter().map(|point| format!("- {point}")));
    lines.push(String::new());
    lines.push(closing);

    lines.join("\n").trim().to_string()
}

fn intro_sentence(title: &str, body: &str) -> String {
    let compact = collapse_whitespace(body);
    let summary = truncate_at_word(&compact, INTRO_MAX_CHARS);
    if summary.is_empty() {
        format!("{title} is a concept under exploration within ContentFlow AI.")
    } else {
        format!("{title} aims to deliver {summary}.")
    }
}

/// Up to [`MAX_KEY_POINTS`] bullet lines, or sentences when the research has
/// no usable lines.
fn extract_points(research_text: &str) -> Vec<&str> {
    let points: Vec<&str> = bullet_lines(research_text).take(MAX_KEY_POINTS).collect();
    if !points.is_empty() {
        return points;
    }
    split_sentences(research_text)
        .into_iter()
        .take(MAX_KEY_POINTS)
        .collect()
}

/// Backfill to [`MIN_KEY_POINTS`] from `fallback_source` sentences, then with
/// filler text.
fn ensure_min_points<'a>(mut points: Vec<&'a str>, fallback_source: &'a str) -> Vec<&'a str> {
    if points.len() >= MIN_KEY_POINTS {
        return points;
    }
    for sentence in split_sentences(fallback_source) {
        if points.len() >= MIN_KEY_POINTS {
            break;
        }
        points.push(sentence);
    }
    while points.len() < MIN_KEY_POINTS {
        points.push(FILLER_POINT);
    }
    points.truncate(MAX_KEY_POINTS);
    points
}

#[cfg(test)]
mod tests {
    use super::*;
    use contentflow_shared::PrdId;

    fn make_prd(title: &str, body: &str) -> Prd {
        Prd {
            id: PrdId::new(),
            title: title.into(),
            body: body.into(),
            created_at: None,
        }
    }

    fn bullet_lines_of(draft: &str) -> Vec<&str> {
        draft.lines().filter(|l| l.starts_with("- ")).collect()
    }

    #[test]
    fn basic_draft_has_title_points_and_closing() {
        let prd = make_prd("Solar Launch", "Compact launch overview.");
        let draft = compose_draft(&prd, "- Panel efficiency\n- Storage upgrade\n- Market timing");
        let lines: Vec<&str> = draft.lines().collect();

        assert_eq!(lines[0], "Solar Launch");
        assert!(lines.contains(&"Key Points:"));
        assert_eq!(
            bullet_lines_of(&draft),
            vec!["- Panel efficiency", "- Storage upgrade", "- Market timing"]
        );
        assert!(
            lines
                .last()
                .unwrap()
                .starts_with("Interested in shaping the next iteration of Solar Launch?")
        );
    }

    #[test]
    fn empty_research_falls_back_to_body_sentences() {
        let body = "First insight. Second detail with context. Third angle for consideration.";
        let prd = make_prd("Fallback Test", body);
        let draft = compose_draft(&prd, "");

        assert_eq!(
            bullet_lines_of(&draft),
            vec![
                "- First insight.",
                "- Second detail with context.",
                "- Third angle for consideration."
            ]
        );
        assert!(draft.lines().any(|l| l == "Key Points:"));
        assert!(
            draft
                .lines()
                .last()
                .unwrap()
                .starts_with("Interested in shaping the next iteration of Fallback Test?")
        );
    }

    #[test]
    fn long_body_is_truncated_at_word_boundary() {
        let long_body = vec!["This detail explains the roadmap"; 40].join(" ");
        let prd = make_prd("Long Body Project", &long_body);
        let draft = compose_draft(
            &prd,
            "- Hardware readiness\n- Supply chain checks\n- Pilot schedule",
        );
        let lines: Vec<&str> = draft.lines().collect();

        let prefix = "Long Body Project aims to deliver ";
        assert!(lines[2].starts_with(prefix));
        let intro_body = lines[2][prefix.len()..].trim_end_matches('.');
        assert!(intro_body.chars().count() <= INTRO_MAX_CHARS);
        assert!(intro_body.ends_with("explains"));
        assert!(long_body.starts_with(intro_body));
        assert_eq!(bullet_lines_of(&draft).len(), 3);
    }

    #[test]
    fn spaceless_body_is_hard_cut() {
        let body = "x".repeat(400);
        let draft = compose_draft(&make_prd("Dense", &body), "- a\n- b\n- c");
        let intro = draft.lines().nth(2).unwrap();
        assert_eq!(intro, format!("Dense aims to deliver {}.", "x".repeat(320)));
    }

    #[test]
    fn body_whitespace_is_collapsed_in_intro() {
        let prd = make_prd("Tidy", "  multi\n\nline   body  ");
        let draft = compose_draft(&prd, "- a\n- b\n- c");
        assert_eq!(draft.lines().nth(2), Some("Tidy aims to deliver multi line body."));
    }

    #[test]
    fn empty_inputs_produce_complete_document() {
        let draft = compose_draft(&make_prd("", ""), "");
        let expected = "Untitled Concept\n\
\n\
Untitled Concept is a concept under exploration within ContentFlow AI.\n\
\n\
Key Points:\n\
- Further detail to be refined with the team.\n\
- Further detail to be refined with the team.\n\
- Further detail to be refined with the team.\n\
\n\
Interested in shaping the next iteration of Untitled Concept? Share feedback and help steer the roadmap.";
        assert_eq!(draft, expected);
    }

    #[test]
    fn blank_title_uses_default() {
        let draft = compose_draft(&make_prd("   ", "Body."), "- a\n- b\n- c");
        assert!(draft.starts_with("Untitled Concept\n"));
    }

    #[test]
    fn points_are_capped_at_six() {
        let research = (1..=8)
            .map(|i| format!("- point {i}"))
            .collect::<Vec<_>>()
            .join("\n");
        let draft = compose_draft(&make_prd("Cap", "Body."), &research);
        let bullets = bullet_lines_of(&draft);
        assert_eq!(bullets.len(), MAX_KEY_POINTS);
        assert_eq!(bullets[5], "- point 6");
    }

    #[test]
    fn mixed_markers_are_stripped() {
        let research = "\u{2022} Unicode point\n** double star\n-no space";
        let draft = compose_draft(&make_prd("Markers", "Body."), research);
        assert_eq!(
            bullet_lines_of(&draft),
            vec!["- Unicode point", "- double star", "- no space"]
        );
    }

    #[test]
    fn short_research_is_backfilled_from_body_then_filler() {
        let prd = make_prd("Backfill", "Alpha. Beta. Gamma.");
        let draft = compose_draft(&prd, "- Only one point");
        assert_eq!(
            bullet_lines_of(&draft),
            vec!["- Only one point", "- Alpha.", "- Beta."]
        );

        let draft = compose_draft(&make_prd("Filler", "Lone sentence."), "- First");
        assert_eq!(
            bullet_lines_of(&draft),
            vec![
                "- First",
                "- Lone sentence.",
                "- Further detail to be refined with the team."
            ]
        );
    }

    #[test]
    fn empty_body_backfills_from_research_sentences() {
        let draft = compose_draft(&make_prd("Notes", ""), "One. Two.");
        // The single research line is one point; backfill re-splits the same
        // text into sentences without deduplicating.
        assert_eq!(
            bullet_lines_of(&draft),
            vec!["- One. Two.", "- One.", "- Two."]
        );
    }

    #[test]
    fn carriage_return_research_yields_separate_points() {
        let prd = make_prd("Solar Launch", "Compact launch overview.");
        let draft = compose_draft(&prd, "- Panel efficiency\r- Storage upgrade\r- Market timing");
        assert_eq!(
            bullet_lines_of(&draft),
            vec!["- Panel efficiency", "- Storage upgrade", "- Market timing"]
        );
        assert!(!draft.contains('\r'));
    }

    #[test]
    fn composition_is_deterministic() {
        let prd = make_prd("Repeatable", "Same input, same output.");
        let research = "- Panel efficiency\n- Storage upgrade";
        assert_eq!(compose_draft(&prd, research), compose_draft(&prd, research));
    }
}
