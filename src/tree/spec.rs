//! Host-facing tree description
//!
//! Hosts assemble `TreeSpec`s with the constructors here and hand batches of
//! them to the registry builder. Specs are plain owned values; the builder
//! flattens them into the arena form at freeze time.

use crate::capability::{CandidateGenerator, Predicate, PriorityScorer};
use crate::core::types::{ActionTag, AnchorTag};
use std::sync::Arc;

/// A named tree definition offered for registration
pub struct TreeSpec<A> {
    pub name: String,
    /// When set, this definition also splices into every anchor point
    /// carrying the same tag, across all registered trees.
    pub insertion_tag: Option<AnchorTag>,
    pub root: NodeSpec<A>,
}

impl<A> TreeSpec<A> {
    pub fn new(name: impl Into<String>, root: NodeSpec<A>) -> Self {
        Self {
            name: name.into(),
            insertion_tag: None,
            root,
        }
    }

    pub fn tagged(name: impl Into<String>, tag: impl Into<AnchorTag>, root: NodeSpec<A>) -> Self {
        Self {
            name: name.into(),
            insertion_tag: Some(tag.into()),
            root,
        }
    }
}

/// One node of a tree description
pub enum NodeSpec<A> {
    /// Fixed declared order, first non-null child wins
    Sequence(Vec<NodeSpec<A>>),
    /// Children re-scored per call, evaluated best-first, stable on ties
    PrioritySorter(Vec<(NodeSpec<A>, Arc<dyn PriorityScorer>)>),
    /// One weighted draw; the chosen child's result stands, null or not
    Random(Vec<(NodeSpec<A>, f32)>),
    /// Predicate gate over a Sequence; false short-circuits to null
    Conditional {
        predicate: Arc<dyn Predicate>,
        children: Vec<NodeSpec<A>>,
    },
    /// Sequence whose non-null result gets a category tag stamped on
    Tagger {
        tag: ActionTag,
        children: Vec<NodeSpec<A>>,
    },
    /// Evaluate another registered definition in place, by name
    SubtreeRef(String),
    /// Evaluate every definition carrying this insertion tag, in
    /// registration order
    SubtreeByTag(AnchorTag),
    /// Declared attachment slot: directive overlay, then tag splices, then
    /// the inline fallback children
    Anchor {
        tag: AnchorTag,
        fallback: Vec<NodeSpec<A>>,
    },
    /// Claim the agent's pending explicit action, if one is queued
    QueuedOverride,
    /// Leaf: externally supplied producer
    Generator(Arc<dyn CandidateGenerator<A>>),
}

impl<A> NodeSpec<A> {
    pub fn sequence(children: Vec<NodeSpec<A>>) -> Self {
        NodeSpec::Sequence(children)
    }

    pub fn priority(children: Vec<(NodeSpec<A>, Arc<dyn PriorityScorer>)>) -> Self {
        NodeSpec::PrioritySorter(children)
    }

    /// Pair a child with its scorer for use in [`NodeSpec::priority`]
    pub fn scored(
        child: NodeSpec<A>,
        scorer: impl PriorityScorer + 'static,
    ) -> (NodeSpec<A>, Arc<dyn PriorityScorer>) {
        (child, Arc::new(scorer))
    }

    /// Random node with uniform weights
    pub fn random(children: Vec<NodeSpec<A>>) -> Self {
        NodeSpec::Random(children.into_iter().map(|c| (c, 1.0)).collect())
    }

    pub fn random_weighted(children: Vec<(NodeSpec<A>, f32)>) -> Self {
        NodeSpec::Random(children)
    }

    pub fn conditional(predicate: impl Predicate + 'static, children: Vec<NodeSpec<A>>) -> Self {
        NodeSpec::Conditional {
            predicate: Arc::new(predicate),
            children,
        }
    }

    pub fn tagger(tag: impl Into<ActionTag>, child: NodeSpec<A>) -> Self {
        NodeSpec::Tagger {
            tag: tag.into(),
            children: vec![child],
        }
    }

    pub fn subtree(name: impl Into<String>) -> Self {
        NodeSpec::SubtreeRef(name.into())
    }

    pub fn subtree_by_tag(tag: impl Into<AnchorTag>) -> Self {
        NodeSpec::SubtreeByTag(tag.into())
    }

    pub fn anchor(tag: impl Into<AnchorTag>) -> Self {
        NodeSpec::Anchor {
            tag: tag.into(),
            fallback: Vec::new(),
        }
    }

    pub fn anchor_with_fallback(tag: impl Into<AnchorTag>, fallback: Vec<NodeSpec<A>>) -> Self {
        NodeSpec::Anchor {
            tag: tag.into(),
            fallback,
        }
    }

    pub fn queued_override() -> Self {
        NodeSpec::QueuedOverride
    }

    pub fn generator(producer: impl CandidateGenerator<A> + 'static) -> Self {
        NodeSpec::Generator(Arc::new(producer))
    }
}
