//! Arena node representation
//!
//! The frozen registry stores every node of every definition in one arena,
//! addressed by `NodeId`. Children and subtree targets are indices, so the
//! whole graph is acyclic by construction once validation passes and sharing
//! a definition from many reference sites costs nothing.

use crate::capability::{CandidateGenerator, Predicate, PriorityScorer};
use crate::core::types::{ActionTag, AnchorTag, DefId, NodeId};
use std::sync::Arc;

/// A compiled decision node
pub enum DecisionNode<A> {
    Sequence {
        children: Vec<NodeId>,
    },
    PrioritySorter {
        children: Vec<(NodeId, Arc<dyn PriorityScorer>)>,
    },
    Random {
        children: Vec<NodeId>,
        weights: Vec<f32>,
    },
    Conditional {
        predicate: Arc<dyn Predicate>,
        children: Vec<NodeId>,
    },
    Tagger {
        tag: ActionTag,
        children: Vec<NodeId>,
    },
    /// Resolved reference to another definition's root; evaluation jumps to
    /// the shared definition, never to a copy
    SubtreeRef {
        def: DefId,
    },
    /// Attachment slot. `spliced` holds tag-matching definitions in
    /// registration order; `fallback` holds the slot's inline children.
    Anchor {
        tag: AnchorTag,
        spliced: Vec<DefId>,
        fallback: Vec<NodeId>,
    },
    QueuedOverride,
    Generator {
        producer: Arc<dyn CandidateGenerator<A>>,
    },
}

/// A registered, frozen tree definition
pub struct TreeDefinition {
    pub name: String,
    pub root: NodeId,
    pub insertion_tag: Option<AnchorTag>,
}
