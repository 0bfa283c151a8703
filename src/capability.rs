//! Capability seams for external collaborators
//!
//! The engine defines tree structure and evaluation order; everything that
//! actually looks at the world plugs in through these traits. Plain closures
//! implement all of them, which keeps test trees and small hosts terse.

use crate::core::error::GeneratorError;
use crate::core::types::{AgentId, AnchorTag};

/// Per-call context handed to every capability during one evaluation pass
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    /// The agent this cycle decides for
    pub agent: AgentId,
    /// Forced re-decision (e.g. current action was interrupted externally)
    pub forced: bool,
    /// Anchor point of the agent's active directive, if any
    pub directive_anchor: Option<&'a AnchorTag>,
}

/// Leaf capability: produce a concrete action or decline.
///
/// Implementations must complete synchronously; a cycle is one bounded call
/// and intermediate tree state is not resumable. Failures are contained by
/// the evaluator and downgraded to "this node yields nothing".
pub trait CandidateGenerator<A>: Send + Sync {
    fn produce(&self, ctx: &DecisionContext<'_>) -> Result<Option<A>, GeneratorError>;
}

impl<A, F> CandidateGenerator<A> for F
where
    F: Fn(&DecisionContext<'_>) -> Result<Option<A>, GeneratorError> + Send + Sync,
{
    fn produce(&self, ctx: &DecisionContext<'_>) -> Result<Option<A>, GeneratorError> {
        self(ctx)
    }
}

/// Gate for Conditional nodes. Must be side-effect free over world state.
pub trait Predicate: Send + Sync {
    fn test(&self, ctx: &DecisionContext<'_>) -> bool;
}

impl<F> Predicate for F
where
    F: Fn(&DecisionContext<'_>) -> bool + Send + Sync,
{
    fn test(&self, ctx: &DecisionContext<'_>) -> bool {
        self(ctx)
    }
}

/// Per-child dynamic score for PrioritySorter nodes.
///
/// Scores are recomputed on every evaluation, so ordering may change with
/// agent state between cycles. Ties keep declaration order.
pub trait PriorityScorer: Send + Sync {
    fn score(&self, ctx: &DecisionContext<'_>) -> f32;
}

impl<F> PriorityScorer for F
where
    F: Fn(&DecisionContext<'_>) -> f32 + Send + Sync,
{
    fn score(&self, ctx: &DecisionContext<'_>) -> f32 {
        self(ctx)
    }
}

/// Liveness view the driver consults immediately before committing a result.
///
/// If the agent vanished from the world mid-cycle the result is discarded
/// instead of being written into stale state.
pub trait AgentStateAccessor: Send + Sync {
    fn is_alive(&self, agent: AgentId) -> bool;
}

impl<F> AgentStateAccessor for F
where
    F: Fn(AgentId) -> bool + Send + Sync,
{
    fn is_alive(&self, agent: AgentId) -> bool {
        self(agent)
    }
}
