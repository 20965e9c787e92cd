//! Response combination: one final answer out of N agent answers.
//!
//! A single response is used verbatim. Multiple responses are concatenated
//! with per-agent labels, and every source list is merged in invocation
//! order.

use switchboard_core::invoker::{AgentResponse, SourceRef};

/// Text returned when the routing decision selected no agent at all.
/// This is a normal outcome, not an error.
pub const NO_AGENT_RESPONSE: &str = "No applicable agent was found for this request.";

/// Merge N agent responses into one final answer and a combined source list.
pub fn combine_responses(responses: &[AgentResponse]) -> (String, Vec<SourceRef>) {
    match responses {
        [] => (NO_AGENT_RESPONSE.to_string(), Vec::new()),
        [single] => (single.response_text.clone(), single.sources.clone()),
        many => {
            let text = many
                .iter()
                .map(|r| format!("[{}]\n{}", r.agent_name, r.response_text))
                .collect::<Vec<_>>()
                .join("\n\n");
            (text, merge_sources(many))
        }
    }
}

/// All sources across the given responses, in response order, deduplicated.
pub fn merge_sources(responses: &[AgentResponse]) -> Vec<SourceRef> {
    let mut merged: Vec<SourceRef> = Vec::new();
    for response in responses {
        for source in &response.sources {
            if !merged.contains(source) {
                merged.push(source.clone());
            }
        }
    }
    merged
}
