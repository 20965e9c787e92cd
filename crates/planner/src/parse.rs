//! Parsing of free-text reasoning output into typed plan and decision
//! objects.
//!
//! Model output is never trusted: every field the engine reads is validated
//! here, and anything unparseable becomes a typed error rather than a
//! half-filled state record.

use switchboard_core::error::PlannerError;
use switchboard_core::plan::{ExecutorDecision, PlanStep};

/// Parse a numbered plan from model output.
///
/// Accepted line shapes, one step per line:
/// - `1. [agent_name] do the thing`
/// - `1. agent_name: do the thing`
///
/// Lines that match neither shape are skipped; an output with no parseable
/// step at all is a [`PlannerError::PlanParse`].
pub fn parse_plan_lines(text: &str) -> Result<Vec<PlanStep>, PlannerError> {
    let mut steps = Vec::new();

    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Strip a leading "N." or "N)" marker
        let Some(rest) = strip_number_prefix(line) else {
            continue;
        };

        if let Some((agent, action)) = split_step(rest) {
            if action.is_empty() {
                continue;
            }
            steps.push(PlanStep {
                step_index: steps.len(),
                agent_hint: agent.to_lowercase(),
                action_description: action.to_string(),
            });
        }
    }

    if steps.is_empty() {
        return Err(PlannerError::PlanParse(format!(
            "no plan steps found in reasoning output: {}",
            preview(text)
        )));
    }

    Ok(steps)
}

fn strip_number_prefix(line: &str) -> Option<&str> {
    let digits_end = line.find(|c: char| !c.is_ascii_digit())?;
    if digits_end == 0 {
        return None;
    }
    let rest = &line[digits_end..];
    rest.strip_prefix('.')
        .or_else(|| rest.strip_prefix(')'))
        .map(str::trim_start)
}

fn split_step(rest: &str) -> Option<(&str, &str)> {
    // `[agent] action`
    if let Some(bracketed) = rest.strip_prefix('[') {
        let (agent, action) = bracketed.split_once(']')?;
        return Some((agent.trim(), action.trim()));
    }
    // `agent: action`
    let (agent, action) = rest.split_once(':')?;
    let agent = agent.trim();
    // Agent names are single identifiers; anything with spaces is prose
    if agent.is_empty() || agent.contains(char::is_whitespace) {
        return None;
    }
    Some((agent, action.trim()))
}

/// The decision object shape emitted by the executor prompt.
#[derive(serde::Deserialize)]
struct DecisionWire {
    goto: String,
    query: String,
    #[serde(default)]
    reason: String,
    #[serde(default)]
    replan: bool,
    #[serde(default)]
    confidence: Option<f32>,
}

/// Parse an executor decision from model output.
///
/// Accepts a bare JSON object or one wrapped in a fenced code block:
/// `{"goto": "...", "query": "...", "reason": "...", "replan": false,
/// "confidence": 0.9}`.
pub fn parse_decision(text: &str) -> Result<ExecutorDecision, PlannerError> {
    let json = extract_json_object(text).ok_or_else(|| {
        PlannerError::DecisionParse(format!(
            "no JSON object found in executor output: {}",
            preview(text)
        ))
    })?;

    let wire: DecisionWire = serde_json::from_str(json)
        .map_err(|e| PlannerError::DecisionParse(format!("invalid decision object: {e}")))?;

    let goto = wire.goto.trim();
    if goto.is_empty() {
        return Err(PlannerError::DecisionParse(
            "decision has an empty 'goto' agent".into(),
        ));
    }

    // "none" means the executor found no applicable agent; the engine
    // treats an empty agent list as a normal outcome, not an error
    let agent_name = if goto.eq_ignore_ascii_case("none") {
        String::new()
    } else {
        goto.to_lowercase()
    };

    Ok(ExecutorDecision {
        agent_name,
        sub_query: wire.query,
        reason: wire.reason,
        replan: wire.replan,
        confidence: wire.confidence.unwrap_or(0.5).clamp(0.0, 1.0),
    })
}

/// Find the outermost `{...}` in possibly-fenced model output.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end <= start {
        return None;
    }
    Some(&text[start..=end])
}

fn preview(text: &str) -> String {
    let trimmed = text.trim();
    let mut end = trimmed.len().min(120);
    while !trimmed.is_char_boundary(end) {
        end -= 1;
    }
    if end < trimmed.len() {
        format!("{}…", &trimmed[..end])
    } else {
        trimmed.to_string()
    }
}
