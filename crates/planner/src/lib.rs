//! Planner/executor client for Switchboard.
//!
//! Talks to an OpenAI-compatible reasoning endpoint and turns free-text
//! model output into validated plan steps and routing decisions.

pub mod http;
pub mod parse;

pub use http::HttpPlanner;
pub use parse::{parse_decision, parse_plan_lines};
