//! # Switchboard Engine
//!
//! The supervisor workflow engine: a directed graph of steps with
//! conditional branching that takes a user query, plans which downstream
//! agents to call, invokes them, combines their answers, persists
//! conversational memory, and emits a final response.
//!
//! ```text
//! load_state → plan_request → execute_plan → invoke_agents
//!                   ▲              ▲               │
//!                   │              │               ▼
//!                   │              │        combine_responses
//!                   │(replan)      │(next step)    │
//!                   └───────── advance_plan ◄──────┘
//!                                  │
//!                                  ▼
//!                           update_memory → log_observability → END
//! ```
//!
//! Any node failure routes to `handle_error`, which records the error on
//! the state record and terminates with `status = failed`. The loop is
//! bounded by a maximum iteration count so forced replans always terminate.

pub mod combine;
pub mod engine;
pub mod response;

pub use combine::{combine_responses, merge_sources};
pub use engine::{SupervisorEngine, WorkflowNode};
pub use response::SupervisorResponse;
