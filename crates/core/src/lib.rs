//! # Switchboard Core
//!
//! Domain types, traits, and error definitions for the Switchboard supervisor
//! engine. This crate defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every subsystem is defined as a trait here. Implementations live in their
//! respective crates. This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod error;
pub mod invoker;
pub mod memory;
pub mod plan;
pub mod planner;
pub mod state;

// Re-export key types at crate root for ergonomics
pub use error::{EngineError, InvocationError, MemoryError, PlannerError};
pub use invoker::{AgentInvoker, AgentResponse, SourceRef};
pub use memory::{LongTermMemory, MemoryEntry, ShortTermMemory, DEFAULT_TTL_SECS};
pub use plan::{AgentDescriptor, ExecutorDecision, PlanStep, RoutingDecision};
pub use planner::Planner;
pub use state::{HistoryMessage, Role, SessionState, SessionStatus};
