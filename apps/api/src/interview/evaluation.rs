//! Evaluation parser — turns free-text evaluator output into a structured
//! score record.
//!
//! The generation backend promises JSON but delivers whatever it likes, so
//! extraction is an ordered chain of pure steps:
//!
//!   strict parse → sanitize and reparse → brace-scan and reparse →
//!   deterministic default
//!
//! Each step either yields a parsed value or hands off to the next; the
//! final step always succeeds. This module never returns an error.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::interview::prompts::{EVALUATION_PROMPT_TEMPLATE, EVALUATION_SYSTEM};
use crate::interview::{QaPair, Violation};
use crate::llm_client::prompts::JSON_ONLY_INSTRUCTION;
use crate::llm_client::Generate;

/// Per-question score, clamped to [0, 20].
pub const MAX_QUESTION_SCORE: u8 = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionEvaluation {
    pub question: String,
    pub answer: String,
    pub score: u8,
    pub feedback: String,
    pub masked: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub questions: Vec<QuestionEvaluation>,
    pub total_score: u32,
    pub overall_feedback: String,
    pub violations: Vec<Violation>,
}

/// Loosely-typed mirror of the requested JSON shape. Every field is optional
/// so partially-conforming output still parses; defaults are applied in
/// `finalize`.
#[derive(Debug, Default, Deserialize)]
struct RawEvaluation {
    #[serde(default)]
    questions: Vec<RawQuestionEvaluation>,
    #[serde(default)]
    total_score: Option<i64>,
    #[serde(default)]
    overall_feedback: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawQuestionEvaluation {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default)]
    score: Option<f64>,
    #[serde(default)]
    feedback: Option<String>,
    #[serde(default)]
    masked: Option<bool>,
}

/// Runs the evaluation call and parses the response. Generation failure and
/// unparseable output both degrade to the deterministic fallback — the
/// interview flow always completes with a structured result.
pub async fn evaluate(
    llm: &dyn Generate,
    qa_history: &[QaPair],
    violations: &[Violation],
) -> EvaluationResult {
    let prompt = EVALUATION_PROMPT_TEMPLATE
        .replace("{transcript}", &render_transcript(qa_history))
        .replace("{violations}", &render_violations(violations));
    let system = format!("{EVALUATION_SYSTEM} {JSON_ONLY_INSTRUCTION}");

    match llm.complete(&prompt, &system).await {
        Ok(text) => parse_evaluation(&text, qa_history, violations),
        Err(e) => {
            warn!("evaluation call failed, using deterministic fallback: {e}");
            fallback_evaluation(qa_history, violations)
        }
    }
}

/// Parses evaluator output through the full fallback chain.
pub fn parse_evaluation(
    text: &str,
    qa_history: &[QaPair],
    violations: &[Violation],
) -> EvaluationResult {
    match extract_raw(text) {
        Some(raw) => finalize(raw, qa_history, violations),
        None => {
            warn!("evaluator output could not be parsed, using deterministic fallback");
            fallback_evaluation(qa_history, violations)
        }
    }
}

/// Renders the transcript in `Q1:/A1:` form for the evaluation prompt.
pub fn render_transcript(qa_history: &[QaPair]) -> String {
    let mut out = String::new();
    for (i, pair) in qa_history.iter().enumerate() {
        out.push_str(&format!(
            "Q{n}: {q}\nA{n}: {a}\n",
            n = i + 1,
            q = pair.question.trim(),
            a = pair.answer.trim()
        ));
    }
    out
}

/// Renders the violation list, one `name at timestamp` line per entry, or
/// "None".
pub fn render_violations(violations: &[Violation]) -> String {
    if violations.is_empty() {
        return "None".to_string();
    }
    violations
        .iter()
        .map(|v| format!("- {} at {}", v.name, v.timestamp.to_rfc3339()))
        .collect::<Vec<_>>()
        .join("\n")
}

// ────────────────────────────────────────────────────────────────────────────
// Extraction chain
// ────────────────────────────────────────────────────────────────────────────

fn extract_raw(text: &str) -> Option<RawEvaluation> {
    if let Some(raw) = parse_strict(text) {
        return Some(raw);
    }
    let sanitized = sanitize(text);
    if let Some(raw) = parse_strict(&sanitized) {
        return Some(raw);
    }
    scan_balanced_object(&sanitized).and_then(parse_strict)
}

fn parse_strict(text: &str) -> Option<RawEvaluation> {
    serde_json::from_str(text).ok()
}

/// Normalizes the common ways models mangle JSON: code fences, a stray
/// quoting wrapper, single-quoted keys/values, bare object keys.
fn sanitize(text: &str) -> String {
    let text = strip_code_fences(text);
    let text = strip_wrapping_quotes(text);
    let text = normalize_single_quotes(text);
    quote_bare_keys(&text)
}

/// Strips ```json ... ``` or ``` ... ``` code fences.
fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or_else(|| stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or_else(|| stripped.trim_start())
    } else {
        text
    }
}

/// Strips one pair of quotes wrapping the whole object, e.g. `"{...}"`.
fn strip_wrapping_quotes(text: &str) -> &str {
    let trimmed = text.trim();
    for quote in ['"', '\''] {
        if let Some(inner) = trimmed
            .strip_prefix(quote)
            .and_then(|s| s.strip_suffix(quote))
        {
            if inner.trim_start().starts_with('{') {
                return inner;
            }
        }
    }
    trimmed
}

/// Converts single-quoted keys/values to double-quoted form, escaping any
/// double quotes inside them. Apostrophes inside double-quoted strings are
/// left alone.
fn normalize_single_quotes(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_double = false;
    let mut in_single = false;
    let mut escaped = false;

    for c in text.chars() {
        if escaped {
            if in_single && c == '\'' {
                // \' inside a single-quoted token becomes a plain apostrophe
                out.push('\'');
            } else {
                out.push('\\');
                out.push(c);
            }
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '"' if in_single => out.push_str("\\\""),
            '"' => {
                in_double = !in_double;
                out.push('"');
            }
            '\'' if !in_double => {
                in_single = !in_single;
                out.push('"');
            }
            _ => out.push(c),
        }
    }
    if escaped {
        out.push('\\');
    }
    out
}

/// Quotes bare object keys: `{total_score: 5}` → `{"total_score": 5}`.
fn quote_bare_keys(text: &str) -> String {
    // Compiled per call; evaluation runs once per completed interview.
    match regex::Regex::new(r#"([{,]\s*)([A-Za-z_][A-Za-z0-9_]*)\s*:"#) {
        Ok(re) => re.replace_all(text, "$1\"$2\":").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Returns the first balanced `{...}` region, ignoring braces inside string
/// literals. Content after the region is discarded.
fn scan_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' if in_string => escaped = true,
            '"' => in_string = !in_string,
            '{' if !in_string => depth += 1,
            '}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + c.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

// ────────────────────────────────────────────────────────────────────────────
// Defaults and fallback
// ────────────────────────────────────────────────────────────────────────────

/// Applies missing-key defaults and clamps scores into range.
fn finalize(raw: RawEvaluation, qa_history: &[QaPair], violations: &[Violation]) -> EvaluationResult {
    let questions: Vec<QuestionEvaluation> = raw
        .questions
        .into_iter()
        .enumerate()
        .map(|(i, q)| {
            let pair = qa_history.get(i);
            QuestionEvaluation {
                question: q
                    .question
                    .or_else(|| pair.map(|p| p.question.clone()))
                    .unwrap_or_default(),
                answer: q
                    .answer
                    .or_else(|| pair.map(|p| p.answer.clone()))
                    .unwrap_or_default(),
                score: q
                    .score
                    .map(|s| s.round().clamp(0.0, MAX_QUESTION_SCORE as f64) as u8)
                    .unwrap_or(0),
                feedback: q.feedback.unwrap_or_default(),
                masked: q.masked.unwrap_or(false),
            }
        })
        .collect();

    let score_sum: u32 = questions.iter().map(|q| q.score as u32).sum();
    let total_score = raw
        .total_score
        .map(|t| t.clamp(0, 100) as u32)
        .unwrap_or(score_sum);

    let overall_feedback = raw
        .overall_feedback
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| {
            format!(
                "Evaluation completed with {} policy violation(s) recorded.",
                violations.len()
            )
        });

    EvaluationResult {
        questions,
        total_score,
        overall_feedback,
        violations: violations.to_vec(),
    }
}

/// Terminal safety net: one zero-scored record per transcript entry. Never
/// fails, never calls out.
pub fn fallback_evaluation(qa_history: &[QaPair], violations: &[Violation]) -> EvaluationResult {
    let questions = qa_history
        .iter()
        .map(|pair| QuestionEvaluation {
            question: pair.question.clone(),
            answer: pair.answer.clone(),
            score: 0,
            feedback: "evaluation failed".to_string(),
            masked: false,
        })
        .collect();

    EvaluationResult {
        questions,
        total_score: 0,
        overall_feedback: format!(
            "Automatic evaluation failed: the evaluator response could not be parsed. \
            All answers were scored 0. {} policy violation(s) were recorded.",
            violations.len()
        ),
        violations: violations.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn history(n: usize) -> Vec<QaPair> {
        (1..=n)
            .map(|i| QaPair {
                question: format!("Question {i}?"),
                answer: format!("Answer {i}."),
            })
            .collect()
    }

    fn violation(name: &str) -> Violation {
        Violation {
            name: name.to_string(),
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_clean_json_parses_directly() {
        let text = r#"{
            "questions": [
                {"question": "Q?", "answer": "A.", "score": 18, "feedback": "good", "masked": false}
            ],
            "total_score": 18,
            "overall_feedback": "Solid."
        }"#;
        let result = parse_evaluation(text, &history(1), &[]);
        assert_eq!(result.total_score, 18);
        assert_eq!(result.questions[0].score, 18);
        assert_eq!(result.overall_feedback, "Solid.");
    }

    #[test]
    fn test_non_json_falls_back_to_zero_scores() {
        let result = parse_evaluation("not json at all", &history(3), &[]);
        assert_eq!(result.total_score, 0);
        assert_eq!(result.questions.len(), 3);
        assert!(result.questions.iter().all(|q| q.score == 0));
        assert!(result.questions.iter().all(|q| q.feedback == "evaluation failed"));
        assert!(!result.overall_feedback.is_empty());
    }

    #[test]
    fn test_code_fenced_json_is_unwrapped() {
        let text = "```json\n{\"questions\": [], \"total_score\": 40, \"overall_feedback\": \"ok\"}\n```";
        let result = parse_evaluation(text, &history(2), &[]);
        assert_eq!(result.total_score, 40);
    }

    #[test]
    fn test_single_quoted_json_is_normalized() {
        let text = "{'questions': [{'question': 'Q?', 'answer': 'A.', 'score': 10, 'feedback': 'fine', 'masked': false}], 'total_score': 10, 'overall_feedback': 'ok'}";
        let result = parse_evaluation(text, &history(1), &[]);
        assert_eq!(result.total_score, 10);
        assert_eq!(result.questions[0].feedback, "fine");
    }

    #[test]
    fn test_bare_keys_are_quoted() {
        let text = "{questions: [], total_score: 33, overall_feedback: \"fine\"}";
        let result = parse_evaluation(text, &history(1), &[]);
        assert_eq!(result.total_score, 33);
    }

    #[test]
    fn test_prose_around_object_is_discarded_by_brace_scan() {
        let text = "Here is my evaluation:\n{\"questions\": [], \"total_score\": 55, \"overall_feedback\": \"ok\"}\nHope that helps!";
        let result = parse_evaluation(text, &history(1), &[]);
        assert_eq!(result.total_score, 55);
    }

    #[test]
    fn test_braces_inside_strings_do_not_confuse_the_scan() {
        let text = "{\"questions\": [], \"total_score\": 7, \"overall_feedback\": \"use {} carefully\"} trailing";
        let result = parse_evaluation(text, &history(1), &[]);
        assert_eq!(result.total_score, 7);
        assert_eq!(result.overall_feedback, "use {} carefully");
    }

    #[test]
    fn test_missing_total_score_defaults_to_sum() {
        let text = r#"{
            "questions": [
                {"question": "Q1?", "answer": "A1.", "score": 12, "feedback": "x", "masked": false},
                {"question": "Q2?", "answer": "A2.", "score": 8, "feedback": "y", "masked": true}
            ],
            "overall_feedback": "mixed"
        }"#;
        let result = parse_evaluation(text, &history(2), &[]);
        assert_eq!(result.total_score, 20);
        assert!(result.questions[1].masked);
    }

    #[test]
    fn test_missing_overall_feedback_names_violation_count() {
        let text = r#"{"questions": [], "total_score": 0}"#;
        let violations = vec![violation("tab_switch"), violation("paste_burst")];
        let result = parse_evaluation(text, &history(1), &violations);
        assert!(result.overall_feedback.contains('2'));
        assert_eq!(result.violations.len(), 2);
    }

    #[test]
    fn test_scores_are_clamped_to_range() {
        let text = r#"{
            "questions": [
                {"question": "Q?", "answer": "A.", "score": 95, "feedback": "", "masked": false},
                {"question": "Q?", "answer": "A.", "score": -4, "feedback": "", "masked": false}
            ]
        }"#;
        let result = parse_evaluation(text, &history(2), &[]);
        assert_eq!(result.questions[0].score, 20);
        assert_eq!(result.questions[1].score, 0);
    }

    #[test]
    fn test_missing_question_fields_default_from_transcript() {
        let text = r#"{"questions": [{"score": 5}], "total_score": 5, "overall_feedback": "ok"}"#;
        let result = parse_evaluation(text, &history(1), &[]);
        assert_eq!(result.questions[0].question, "Question 1?");
        assert_eq!(result.questions[0].answer, "Answer 1.");
    }

    #[test]
    fn test_fallback_echoes_violations() {
        let violations = vec![violation("screen_share_lost")];
        let result = fallback_evaluation(&history(5), &violations);
        assert_eq!(result.total_score, 0);
        assert_eq!(result.questions.len(), 5);
        assert_eq!(result.violations.len(), 1);
        assert!(result.overall_feedback.contains("could not be parsed"));
    }

    #[test]
    fn test_render_transcript_enumerates_pairs() {
        let rendered = render_transcript(&history(2));
        assert!(rendered.contains("Q1: Question 1?"));
        assert!(rendered.contains("A2: Answer 2."));
    }

    #[test]
    fn test_render_violations_none_when_empty() {
        assert_eq!(render_violations(&[]), "None");
        let rendered = render_violations(&[violation("tab_switch")]);
        assert!(rendered.contains("tab_switch at "));
    }
}
