//! Decision cycle driver
//!
//! Orchestrates one decision cycle per agent per tick: constant tree first,
//! then the primary tree with the agent's directive overlay, then commit.
//! The driver owns every agent's decision state; tree definitions are read
//! from the shared frozen registry. Cycles for different agents are
//! independent, which is what lets `decide_all` fan out over rayon with no
//! cross-agent locking.

use crate::action::Action;
use crate::agent::{AgentDecisionState, Directive, SavedDecisionState};
use crate::capability::{AgentStateAccessor, DecisionContext};
use crate::core::config::EngineConfig;
use crate::core::error::{ConfigError, DirectiveError};
use crate::core::types::{AgentId, AnchorTag, DefId, NodeId};
use crate::evaluator::{evaluate, EvalEnv};
use crate::tree::registry::TreeRegistry;
use ahash::AHashMap;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use std::sync::Arc;

/// Phases of one decision cycle, re-entered every tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CyclePhase {
    Idle,
    EvaluatingConstant,
    EvaluatingPrimary,
    Committed,
}

/// Drives decision cycles for a population of agents
pub struct DecisionDriver<A> {
    registry: Arc<TreeRegistry<A>>,
    accessor: Arc<dyn AgentStateAccessor>,
    constant_def: DefId,
    primary_def: DefId,
    /// Safe no-op payload substituted when the primary root yields nothing
    fallback: A,
    agents: AHashMap<AgentId, AgentDecisionState<A>>,
}

impl<A> std::fmt::Debug for DecisionDriver<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionDriver")
            .field("constant_def", &self.constant_def)
            .field("primary_def", &self.primary_def)
            .field("agents", &self.agents.len())
            .finish()
    }
}

impl<A: Clone> DecisionDriver<A> {
    pub fn new(
        registry: Arc<TreeRegistry<A>>,
        config: &EngineConfig,
        accessor: Arc<dyn AgentStateAccessor>,
        fallback: A,
    ) -> Result<Self, ConfigError> {
        let constant_def = registry
            .def(&config.constant_tree)
            .ok_or_else(|| ConfigError::UnknownTree(config.constant_tree.clone()))?;
        let primary_def = registry
            .def(&config.primary_tree)
            .ok_or_else(|| ConfigError::UnknownTree(config.primary_tree.clone()))?;
        Ok(Self {
            registry,
            accessor,
            constant_def,
            primary_def,
            fallback,
            agents: AHashMap::new(),
        })
    }

    pub fn add_agent(&mut self, agent: AgentId) {
        self.agents.entry(agent).or_default();
    }

    pub fn remove_agent(&mut self, agent: AgentId) -> bool {
        self.agents.remove(&agent).is_some()
    }

    pub fn agent_count(&self) -> usize {
        self.agents.len()
    }

    pub fn current_action(&self, agent: AgentId) -> Option<&Action<A>> {
        self.agents.get(&agent).and_then(|s| s.current())
    }

    /// Run one decision cycle for one agent.
    ///
    /// Deterministic for fixed agent state and seed: the only randomness is
    /// the Random node's weighted draw, fed from a ChaCha stream derived
    /// from `(seed, agent)`.
    pub fn decide(&mut self, agent: AgentId, forced: bool, seed: u64) -> Option<Action<A>> {
        let Some(state) = self.agents.get_mut(&agent) else {
            tracing::warn!(agent = ?agent, "decide called for unknown agent");
            return None;
        };
        run_cycle(
            &self.registry,
            self.accessor.as_ref(),
            self.constant_def,
            self.primary_def,
            &self.fallback,
            agent,
            state,
            forced,
            seed,
        )
    }

    /// Run one decision cycle for every agent, in parallel.
    ///
    /// Per-agent results are identical to calling [`decide`] serially with
    /// the same seed: each agent's RNG stream depends only on the shared
    /// seed and its own id.
    ///
    /// [`decide`]: DecisionDriver::decide
    pub fn decide_all(&mut self, forced: bool, seed: u64)
    where
        A: Send + Sync,
    {
        let registry = &self.registry;
        let accessor = self.accessor.as_ref();
        let fallback = &self.fallback;
        let (constant_def, primary_def) = (self.constant_def, self.primary_def);

        let entries: Vec<(AgentId, &mut AgentDecisionState<A>)> =
            self.agents.iter_mut().map(|(k, v)| (*k, v)).collect();
        entries.into_par_iter().for_each(|(agent, state)| {
            run_cycle(
                registry,
                accessor,
                constant_def,
                primary_def,
                fallback,
                agent,
                state,
                forced,
                seed,
            );
        });
    }

    /// Overlay `tree` onto the primary tree at `anchor` for this agent,
    /// replacing any existing directive. On failure the previous directive
    /// is left untouched.
    pub fn assign_directive(
        &mut self,
        agent: AgentId,
        tree: &str,
        anchor: impl Into<AnchorTag>,
    ) -> Result<(), DirectiveError> {
        let anchor = anchor.into();
        if self.registry.def(tree).is_none() {
            return Err(DirectiveError::UnknownTree(tree.to_string()));
        }
        if !self.registry.has_anchor(self.primary_def, &anchor) {
            return Err(DirectiveError::UnknownAnchor { anchor });
        }
        let state = self
            .agents
            .get_mut(&agent)
            .ok_or(DirectiveError::UnknownAgent(agent))?;
        state.set_directive(Directive {
            tree: tree.to_string(),
            anchor,
        });
        Ok(())
    }

    pub fn clear_directive(&mut self, agent: AgentId) {
        if let Some(state) = self.agents.get_mut(&agent) {
            state.clear_directive();
        }
    }

    pub fn suspend_autonomy(&mut self, agent: AgentId, suspended: bool) {
        if let Some(state) = self.agents.get_mut(&agent) {
            state.set_suspended(suspended);
        }
    }

    /// Queue an explicit action for the agent's next QueuedOverride node.
    /// A still-unclaimed previous action is replaced.
    pub fn queue_override(&mut self, agent: AgentId, payload: A) {
        if let Some(state) = self.agents.get_mut(&agent) {
            state.queue_override(Action::new(payload));
        }
    }

    pub fn save_state(&self, agent: AgentId) -> Option<SavedDecisionState> {
        self.agents.get(&agent).map(|s| s.save())
    }

    /// Restore a persisted snapshot. A directive naming content this
    /// registry does not know is dropped with a diagnostic; old save data
    /// must not wedge the agent.
    pub fn restore_state(&mut self, agent: AgentId, mut saved: SavedDecisionState) {
        if let Some(directive) = &saved.directive {
            let known = self.registry.def(&directive.tree).is_some()
                && self.registry.has_anchor(self.primary_def, &directive.anchor);
            if !known {
                tracing::warn!(
                    agent = ?agent,
                    tree = %directive.tree,
                    "saved directive references unknown content, dropping"
                );
                saved.directive = None;
            }
        }
        if let Some(state) = self.agents.get_mut(&agent) {
            state.restore(saved);
        }
    }
}

/// Derive an agent's RNG stream from the shared per-tick seed
fn agent_seed(seed: u64, agent: AgentId) -> u64 {
    let bits = agent.0.as_u128();
    seed ^ (bits as u64) ^ ((bits >> 64) as u64)
}

#[allow(clippy::too_many_arguments)]
fn run_cycle<A: Clone>(
    registry: &TreeRegistry<A>,
    accessor: &dyn AgentStateAccessor,
    constant_def: DefId,
    primary_def: DefId,
    fallback: &A,
    agent: AgentId,
    state: &mut AgentDecisionState<A>,
    forced: bool,
    seed: u64,
) -> Option<Action<A>> {
    let mut rng = ChaCha8Rng::seed_from_u64(agent_seed(seed, agent));

    // Resolve the directive once up front; the anchor tag is cloned out so
    // the overlay survives the mutable borrows below
    let directive: Option<(AnchorTag, NodeId)> = state.directive().and_then(|d| {
        match registry.def(&d.tree) {
            Some(def) => Some((d.anchor.clone(), registry.root(def))),
            None => {
                tracing::warn!(agent = ?agent, tree = %d.tree, "active directive names unknown tree, ignoring");
                None
            }
        }
    });

    let mut result: Option<Action<A>> = None;
    let mut phase = CyclePhase::Idle;
    loop {
        phase = match phase {
            CyclePhase::Idle => {
                if state.suspended() {
                    CyclePhase::EvaluatingPrimary
                } else {
                    CyclePhase::EvaluatingConstant
                }
            }

            CyclePhase::EvaluatingConstant => {
                // The directive never affects the constant tree
                let mut env = EvalEnv {
                    registry,
                    ctx: DecisionContext {
                        agent,
                        forced,
                        directive_anchor: None,
                    },
                    rng: &mut rng,
                    pending: state.pending_override_mut(),
                    directive: None,
                    in_directive: false,
                };
                result = evaluate(&mut env, registry.root(constant_def));
                if result.is_some() {
                    CyclePhase::Committed
                } else {
                    CyclePhase::EvaluatingPrimary
                }
            }

            CyclePhase::EvaluatingPrimary => {
                let mut env = EvalEnv {
                    registry,
                    ctx: DecisionContext {
                        agent,
                        forced,
                        directive_anchor: directive.as_ref().map(|(tag, _)| tag),
                    },
                    rng: &mut rng,
                    pending: state.pending_override_mut(),
                    directive: directive.as_ref().map(|(tag, root)| (tag, *root)),
                    in_directive: false,
                };
                result = evaluate(&mut env, registry.root(primary_def));
                if result.is_none() {
                    // A well-formed primary root always resolves to some
                    // default; reaching this is an internal defect in the
                    // tree content, not a normal outcome
                    tracing::error!(
                        agent = ?agent,
                        tree = registry.def_name(primary_def),
                        "primary tree yielded no action, substituting fallback"
                    );
                    result = Some(Action::new(fallback.clone()));
                }
                CyclePhase::Committed
            }

            // The loop exits below as soon as a commit happens
            CyclePhase::Committed => unreachable!(),
        };

        if phase == CyclePhase::Committed {
            // Liveness gate: the agent may have been removed mid-cycle;
            // never write into stale state
            if !accessor.is_alive(agent) {
                tracing::debug!(agent = ?agent, "agent gone before commit, discarding result");
                return None;
            }
            let action = result?;
            state.commit(action.clone());
            return Some(action);
        }
    }
}
