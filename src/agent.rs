//! Per-agent decision state
//!
//! One record per agent, exclusively owned and single-writer: only that
//! agent's own decision cycle mutates it. The directive and suspension flag
//! survive save boundaries through `SavedDecisionState`; the current action
//! and the pending override are transient.

use crate::action::Action;
use crate::core::types::AnchorTag;
use serde::{Deserialize, Serialize};

/// A per-agent overlay: evaluate `tree` at the `anchor` attachment point of
/// the primary tree, ahead of the slot's other children
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub tree: String,
    pub anchor: AnchorTag,
}

/// Mutable decision record for one agent
#[derive(Debug, Clone)]
pub struct AgentDecisionState<A> {
    /// Result of the last committed decision cycle
    current: Option<Action<A>>,
    /// Explicit action queued from outside, claimed by a QueuedOverride node
    pending_override: Option<Action<A>>,
    directive: Option<Directive>,
    /// When set, the constant tree is skipped entirely (manual control,
    /// drafted agents and the like)
    suspended: bool,
}

impl<A> Default for AgentDecisionState<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> AgentDecisionState<A> {
    pub fn new() -> Self {
        Self {
            current: None,
            pending_override: None,
            directive: None,
            suspended: false,
        }
    }

    pub fn current(&self) -> Option<&Action<A>> {
        self.current.as_ref()
    }

    pub(crate) fn commit(&mut self, action: Action<A>) {
        self.current = Some(action);
    }

    pub fn directive(&self) -> Option<&Directive> {
        self.directive.as_ref()
    }

    pub(crate) fn set_directive(&mut self, directive: Directive) {
        self.directive = Some(directive);
    }

    pub(crate) fn clear_directive(&mut self) {
        self.directive = None;
    }

    pub fn suspended(&self) -> bool {
        self.suspended
    }

    pub(crate) fn set_suspended(&mut self, suspended: bool) {
        self.suspended = suspended;
    }

    pub(crate) fn queue_override(&mut self, action: Action<A>) {
        self.pending_override = Some(action);
    }

    pub(crate) fn pending_override_mut(&mut self) -> &mut Option<Action<A>> {
        &mut self.pending_override
    }

    pub fn has_pending_override(&self) -> bool {
        self.pending_override.is_some()
    }

    /// Flat snapshot of everything that persists across a save boundary
    pub fn save(&self) -> SavedDecisionState {
        SavedDecisionState {
            directive: self.directive.clone(),
            suspended: self.suspended,
        }
    }

    /// Restore a snapshot. Validation against the registry is the driver's
    /// job; this only copies the fields.
    pub(crate) fn restore(&mut self, saved: SavedDecisionState) {
        self.directive = saved.directive;
        self.suspended = saved.suspended;
    }
}

/// Serializable slice of decision state: active directive plus the
/// autonomy-suspended flag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedDecisionState {
    pub directive: Option<Directive>,
    pub suspended: bool,
}
