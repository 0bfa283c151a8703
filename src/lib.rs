//! Arbiter - composable behavior-tree decision engine for simulated agents
//!
//! Each tick, for each agent, the engine evaluates a constant tree of
//! interrupt checks, then the agent's primary behavior tree with any active
//! directive overlay spliced in, walking composite nodes down to leaf
//! generators until one produces an action. Trees are registered once,
//! validated, frozen, and shared read-only by every decision cycle; what an
//! individual generator decides is entirely the host's business.

pub mod action;
pub mod agent;
pub mod capability;
pub mod core;
pub mod driver;
mod evaluator;
pub mod tree;

pub use action::Action;
pub use agent::{AgentDecisionState, Directive, SavedDecisionState};
pub use capability::{
    AgentStateAccessor, CandidateGenerator, DecisionContext, Predicate, PriorityScorer,
};
pub use crate::core::config::EngineConfig;
pub use crate::core::error::{ConfigError, DirectiveError, GeneratorError};
pub use crate::core::types::{ActionTag, AgentId, AnchorTag};
pub use driver::DecisionDriver;
pub use tree::{NodeSpec, RegistryBuilder, TreeRegistry, TreeSpec};
