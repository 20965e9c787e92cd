//! Configuration loading and validation for Switchboard.
//!
//! Loads configuration from a TOML file with environment variable overrides
//! (`SWITCHBOARD_PLANNER_API_KEY`, `SWITCHBOARD_PLANNER_URL`). Validates all
//! settings before the engine is built. Configuration is read-only at
//! request time.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use switchboard_core::plan::AgentDescriptor;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// The root configuration structure.
#[derive(Clone, Serialize, Deserialize, Default)]
pub struct SupervisorConfig {
    /// Downstream agent catalog
    #[serde(default)]
    pub agents: Vec<AgentConfig>,

    /// Reasoning-model endpoint settings
    #[serde(default)]
    pub planner: PlannerConfig,

    /// Engine limits and thresholds
    #[serde(default)]
    pub engine: EngineConfig,
}

/// One downstream agent: name, description for the planner, and endpoint
/// for the invocation client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Registered agent name (plain string, resolved via this config)
    pub name: String,

    /// What the agent specializes in (shown to the planner)
    pub description: String,

    /// HTTP endpoint the invocation client POSTs to
    pub endpoint: String,

    /// Per-agent request timeout
    #[serde(default = "default_agent_timeout")]
    pub timeout_secs: u64,
}

fn default_agent_timeout() -> u64 {
    30
}

/// Reasoning-model endpoint settings for the planner/executor client.
#[derive(Clone, Serialize, Deserialize)]
pub struct PlannerConfig {
    /// Base URL of an OpenAI-compatible chat endpoint
    #[serde(default = "default_planner_url")]
    pub base_url: String,

    /// API key for the reasoning endpoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Model name
    #[serde(default = "default_planner_model")]
    pub model: String,

    /// Request timeout
    #[serde(default = "default_planner_timeout")]
    pub timeout_secs: u64,

    /// Static routing guidelines embedded in planner prompts
    #[serde(default)]
    pub guidelines: String,
}

fn default_planner_url() -> String {
    "https://api.openai.com/v1".into()
}
fn default_planner_model() -> String {
    "gpt-4o".into()
}
fn default_planner_timeout() -> u64 {
    60
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            base_url: default_planner_url(),
            api_key: None,
            model: default_planner_model(),
            timeout_secs: default_planner_timeout(),
            guidelines: String::new(),
        }
    }
}

/// Redact a secret for Debug output.
fn redact(s: &Option<String>) -> &'static str {
    match s {
        Some(_) => "[REDACTED]",
        None => "None",
    }
}

impl std::fmt::Debug for PlannerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlannerConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .field("timeout_secs", &self.timeout_secs)
            .field("guidelines", &self.guidelines)
            .finish()
    }
}

impl std::fmt::Debug for SupervisorConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupervisorConfig")
            .field("agents", &self.agents)
            .field("planner", &self.planner)
            .field("engine", &self.engine)
            .finish()
    }
}

/// Engine limits and thresholds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Hard bound on plan/replan iterations per request
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Most recent history entries kept per session
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,

    /// Routing confidence above which a long-term pattern is written
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f32,

    /// TTL for short-term memory writes
    #[serde(default = "default_short_term_ttl")]
    pub short_term_ttl_secs: u64,
}

fn default_max_iterations() -> u32 {
    10
}
fn default_history_limit() -> usize {
    30
}
fn default_confidence_threshold() -> f32 {
    0.8
}
fn default_short_term_ttl() -> u64 {
    switchboard_core::memory::DEFAULT_TTL_SECS
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            history_limit: default_history_limit(),
            confidence_threshold: default_confidence_threshold(),
            short_term_ttl_secs: default_short_term_ttl(),
        }
    }
}

impl SupervisorConfig {
    /// Load from a TOML file, then apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: SupervisorConfig = toml::from_str(&content)?;
        config.apply_env_overrides();
        debug!(agents = config.agents.len(), "Loaded supervisor config");
        Ok(config)
    }

    /// Apply `SWITCHBOARD_*` environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("SWITCHBOARD_PLANNER_API_KEY") {
            if !key.is_empty() {
                self.planner.api_key = Some(key);
            }
        }
        if let Ok(url) = std::env::var("SWITCHBOARD_PLANNER_URL") {
            if !url.is_empty() {
                self.planner.base_url = url;
            }
        }
    }

    /// Validate the configuration before the engine is built.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.agents.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one agent must be configured".into(),
            ));
        }

        let mut seen = HashSet::new();
        for agent in &self.agents {
            if agent.name.trim().is_empty() {
                return Err(ConfigError::Invalid("agent name must not be empty".into()));
            }
            if !seen.insert(agent.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate agent name: {}",
                    agent.name
                )));
            }
            if agent.endpoint.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "agent '{}' has an empty endpoint",
                    agent.name
                )));
            }
        }

        if self.engine.max_iterations == 0 {
            return Err(ConfigError::Invalid(
                "engine.max_iterations must be at least 1".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.engine.confidence_threshold) {
            return Err(ConfigError::Invalid(format!(
                "engine.confidence_threshold must be in [0, 1], got {}",
                self.engine.confidence_threshold
            )));
        }

        Ok(())
    }

    /// The catalog view of the configured agents, handed to the planner.
    pub fn catalog(&self) -> Vec<AgentDescriptor> {
        self.agents
            .iter()
            .map(|a| AgentDescriptor {
                name: a.name.clone(),
                description: a.description.clone(),
            })
            .collect()
    }
}
