//! HTTP planner/executor implementation.
//!
//! Sends planning and next-action prompts to an OpenAI-compatible
//! `/chat/completions` endpoint and parses the responses into typed plan
//! steps and decisions. Works with OpenAI, OpenRouter, Ollama, vLLM, and
//! any compatible proxy.

use async_trait::async_trait;
use serde::Deserialize;
use switchboard_config::PlannerConfig;
use switchboard_core::error::PlannerError;
use switchboard_core::plan::{AgentDescriptor, ExecutorDecision, PlanStep};
use switchboard_core::planner::Planner;
use tracing::{debug, warn};

use crate::parse::{parse_decision, parse_plan_lines};

/// Planner client for OpenAI-compatible reasoning endpoints.
pub struct HttpPlanner {
    base_url: String,
    api_key: String,
    model: String,
    client: reqwest::Client,
}

impl HttpPlanner {
    /// Build from planner configuration. The configured timeout applies to
    /// every request this client sends.
    pub fn new(config: &PlannerConfig) -> Result<Self, PlannerError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| PlannerError::Network(e.to_string()))?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
            client,
        })
    }

    /// One round-trip to the chat endpoint, returning the assistant text.
    async fn complete(&self, prompt: String) -> Result<String, PlannerError> {
        let url = format!("{}/chat/completions", self.base_url);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "system", "content": prompt}],
            "temperature": 0.2,
        });

        debug!(model = %self.model, "Sending reasoning request");

        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PlannerError::Timeout(e.to_string())
                } else {
                    PlannerError::Network(e.to_string())
                }
            })?;

        let status = response.status().as_u16();

        if status == 429 {
            return Err(PlannerError::RateLimited {
                retry_after_secs: 5,
            });
        }

        if status == 401 || status == 403 {
            return Err(PlannerError::AuthenticationFailed(
                "Invalid API key or insufficient permissions".into(),
            ));
        }

        if status != 200 {
            let error_body = response.text().await.unwrap_or_default();
            warn!(status, body = %error_body, "Reasoning endpoint returned error");
            return Err(PlannerError::ApiError {
                status_code: status,
                message: error_body,
            });
        }

        let api_response: ApiResponse =
            response.json().await.map_err(|e| PlannerError::ApiError {
                status_code: 200,
                message: format!("Failed to parse response: {e}"),
            })?;

        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| PlannerError::ApiError {
                status_code: 200,
                message: "No choices in response".into(),
            })?;

        Ok(choice.message.content.unwrap_or_default())
    }

    fn plan_prompt(query: &str, catalog: &[AgentDescriptor], guidelines: &str) -> String {
        let agent_list: String = catalog
            .iter()
            .map(|a| format!("- {}: {}", a.name, a.description))
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            "You are a query-routing planner. Break this request into numbered steps, \
            one per line, in the format: N. [agent_name] action description.\n\n\
            Available agents:\n{agent_list}\n\n\
            Guidelines:\n{guidelines}\n\n\
            Request: {query}\n\n\
            Use only the listed agent names. Be concise."
        )
    }

    fn decision_prompt(query: &str, step: &PlanStep, guidelines: &str) -> String {
        format!(
            "You are executing one step of a routing plan.\n\n\
            Original request: {query}\n\
            Current step: [{agent}] {action}\n\n\
            Guidelines:\n{guidelines}\n\n\
            Respond with a single JSON object: {{\"goto\": \"agent_name\", \
            \"query\": \"sub-query for that agent\", \"reason\": \"why\", \
            \"replan\": false, \"confidence\": 0.0}}. \
            Set \"replan\" to true only if the plan no longer fits the request. \
            If no listed agent applies, set \"goto\" to \"none\".",
            agent = step.agent_hint,
            action = step.action_description,
        )
    }
}

#[async_trait]
impl Planner for HttpPlanner {
    fn name(&self) -> &str {
        "openai_compat"
    }

    async fn plan(
        &self,
        query: &str,
        catalog: &[AgentDescriptor],
        guidelines: &str,
    ) -> Result<Vec<PlanStep>, PlannerError> {
        let prompt = Self::plan_prompt(query, catalog, guidelines);
        let content = self.complete(prompt).await?;
        let steps = parse_plan_lines(&content)?;
        debug!(steps = steps.len(), "Parsed plan");
        Ok(steps)
    }

    async fn decide_next(
        &self,
        query: &str,
        current_step: &PlanStep,
        guidelines: &str,
    ) -> Result<ExecutorDecision, PlannerError> {
        let prompt = Self::decision_prompt(query, current_step, guidelines);
        let content = self.complete(prompt).await?;
        let decision = parse_decision(&content)?;
        debug!(
            agent = %decision.agent_name,
            replan = decision.replan,
            confidence = decision.confidence,
            "Parsed executor decision"
        );
        Ok(decision)
    }
}

// --- API types (internal) ---

#[derive(Debug, Deserialize)]
struct ApiResponse {
    choices: Vec<ApiChoice>,
}

#[derive(Debug, Deserialize)]
struct ApiChoice {
    message: ApiMessage,
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<AgentDescriptor> {
        vec![
            AgentDescriptor {
                name: "structured_data".into(),
                description: "Answers questions over business tables".into(),
            },
            AgentDescriptor {
                name: "doc_search".into(),
                description: "Retrieves documents".into(),
            },
        ]
    }

    #[test]
    fn constructor_normalizes_base_url() {
        let config = PlannerConfig {
            base_url: "http://localhost:8000/v1/".into(),
            api_key: Some("sk-test".into()),
            model: "planner-model".into(),
            timeout_secs: 10,
            guidelines: String::new(),
        };
        let planner = HttpPlanner::new(&config).unwrap();
        assert_eq!(planner.base_url, "http://localhost:8000/v1");
        assert_eq!(planner.name(), "openai_compat");
    }

    #[test]
    fn plan_prompt_embeds_catalog_and_guidelines() {
        let prompt =
            HttpPlanner::plan_prompt("total sales?", &catalog(), "Prefer structured data.");
        assert!(prompt.contains("structured_data: Answers questions"));
        assert!(prompt.contains("doc_search"));
        assert!(prompt.contains("Prefer structured data."));
        assert!(prompt.contains("total sales?"));
    }

    #[test]
    fn decision_prompt_embeds_step() {
        let step = PlanStep {
            step_index: 0,
            agent_hint: "structured_data".into(),
            action_description: "Query sales totals".into(),
        };
        let prompt = HttpPlanner::decision_prompt("total sales?", &step, "");
        assert!(prompt.contains("[structured_data] Query sales totals"));
        assert!(prompt.contains("\"goto\""));
        assert!(prompt.contains("\"replan\""));
    }

    #[test]
    fn api_response_parses_without_content() {
        let data = r#"{"choices":[{"message":{}}]}"#;
        let parsed: ApiResponse = serde_json::from_str(data).unwrap();
        assert!(parsed.choices[0].message.content.is_none());
    }
}
