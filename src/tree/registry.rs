//! Tree registration and the frozen registry
//!
//! Two-phase lifecycle: a `RegistryBuilder` accumulates batches of tree
//! specs, validating each batch atomically (a rejected batch leaves the
//! builder untouched), then `freeze` compiles everything into an immutable
//! `TreeRegistry` that decision cycles read without synchronization. The
//! phase split is enforced by ownership: `freeze` consumes the builder, so
//! no registration can happen after the registry exists.

use crate::core::config::MAX_EVAL_DEPTH;
use crate::core::error::ConfigError;
use crate::core::types::{AnchorTag, DefId, NodeId};
use crate::tree::node::{DecisionNode, TreeDefinition};
use crate::tree::spec::{NodeSpec, TreeSpec};
use ahash::{AHashMap, AHashSet};

/// Accumulates and validates tree definitions before the freeze
pub struct RegistryBuilder<A> {
    specs: Vec<TreeSpec<A>>,
    by_name: AHashMap<String, usize>,
}

impl<A> Default for RegistryBuilder<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> RegistryBuilder<A> {
    pub fn new() -> Self {
        Self {
            specs: Vec::new(),
            by_name: AHashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    /// Register a batch of definitions.
    ///
    /// The batch is validated as a whole against everything already
    /// registered: duplicate names, dangling subtree references and
    /// reference cycles all reject the batch wholesale, leaving prior
    /// registrations in their last valid state.
    pub fn register(&mut self, batch: Vec<TreeSpec<A>>) -> Result<(), ConfigError> {
        // Duplicate names, within the batch and against existing defs
        let mut batch_names: AHashSet<&str> = AHashSet::new();
        for spec in &batch {
            if self.by_name.contains_key(&spec.name) || !batch_names.insert(&spec.name) {
                return Err(ConfigError::DuplicateName(spec.name.clone()));
            }
        }

        // Merged name table: existing defs then the batch, in order
        let mut merged: AHashMap<&str, usize> = AHashMap::new();
        for (i, spec) in self.specs.iter().enumerate() {
            merged.insert(&spec.name, i);
        }
        for (i, spec) in batch.iter().enumerate() {
            merged.insert(&spec.name, self.specs.len() + i);
        }

        // Dangling subtree references (by-tag references resolve at freeze,
        // an empty tag set is legal)
        let all: Vec<&TreeSpec<A>> = self.specs.iter().chain(batch.iter()).collect();
        let mut edges: Vec<Vec<usize>> = Vec::with_capacity(all.len());
        for spec in &all {
            let mut refs = NodeRefs::default();
            collect_refs(&spec.root, &mut refs);
            let mut out = Vec::with_capacity(refs.names.len());
            for name in &refs.names {
                match merged.get(name.as_str()) {
                    Some(&idx) => out.push(idx),
                    None => return Err(ConfigError::DanglingRef(name.clone())),
                }
            }
            edges.push(out);
        }

        // Cycle detection across subtree-reference edges
        if let Some(cycle) = find_cycle(&edges) {
            let path = cycle.iter().map(|&i| all[i].name.clone()).collect();
            return Err(ConfigError::Cycle { path });
        }

        // Batch accepted; apply atomically
        for spec in batch {
            self.by_name.insert(spec.name.clone(), self.specs.len());
            self.specs.push(spec);
        }
        Ok(())
    }

    /// Freeze with the default depth limit
    pub fn freeze(self) -> Result<TreeRegistry<A>, ConfigError> {
        self.freeze_with_limit(MAX_EVAL_DEPTH)
    }

    /// Resolve tag splices, compile the arena and freeze the registry.
    ///
    /// Tag-based edges (anchor splices and subtree-by-tag references) are
    /// only final once every batch is in, so cycle detection runs again here
    /// over the full edge set, followed by the static depth check.
    pub fn freeze_with_limit(self, max_depth: usize) -> Result<TreeRegistry<A>, ConfigError> {
        // Members of each insertion tag, in registration order
        let mut tag_members: AHashMap<AnchorTag, Vec<usize>> = AHashMap::new();
        for (i, spec) in self.specs.iter().enumerate() {
            if let Some(tag) = &spec.insertion_tag {
                tag_members.entry(tag.clone()).or_default().push(i);
            }
        }

        // Full edge set: subtree refs plus every tag-resolved edge
        let mut edges: Vec<Vec<usize>> = Vec::with_capacity(self.specs.len());
        for spec in &self.specs {
            let mut refs = NodeRefs::default();
            collect_refs(&spec.root, &mut refs);
            let mut out: Vec<usize> = refs
                .names
                .iter()
                .map(|name| self.by_name[name])
                .collect();
            for tag in refs.tags.iter().chain(refs.anchors.iter()) {
                if let Some(members) = tag_members.get(tag) {
                    out.extend_from_slice(members);
                }
            }
            edges.push(out);
        }
        if let Some(cycle) = find_cycle(&edges) {
            let path = cycle.iter().map(|&i| self.specs[i].name.clone()).collect();
            return Err(ConfigError::Cycle { path });
        }

        // Compile every spec into the shared arena
        let by_name: AHashMap<String, DefId> = self
            .by_name
            .iter()
            .map(|(name, &i)| (name.clone(), DefId(i as u32)))
            .collect();
        let mut nodes: Vec<DecisionNode<A>> = Vec::new();
        let mut defs: Vec<TreeDefinition> = Vec::with_capacity(self.specs.len());
        for spec in self.specs {
            let root = compile_node(spec.root, &spec.name, &by_name, &tag_members, &mut nodes)?;
            defs.push(TreeDefinition {
                name: spec.name,
                root,
                insertion_tag: spec.insertion_tag,
            });
        }

        let registry = TreeRegistry {
            nodes,
            defs,
            by_name,
            anchors: Vec::new(),
        };

        // Static depth guard: a pack that nests beyond the limit fails here
        // instead of recursing deep at evaluation time
        let mut depth_memo: Vec<Option<usize>> = vec![None; registry.defs.len()];
        for i in 0..registry.defs.len() {
            let depth = registry.def_depth(DefId(i as u32), &mut depth_memo);
            if depth > max_depth {
                return Err(ConfigError::TooDeep {
                    tree: registry.defs[i].name.clone(),
                    max: max_depth,
                });
            }
        }

        // Per-definition transitive anchor sets, for directive validation
        let mut anchors: Vec<Option<AHashSet<AnchorTag>>> = vec![None; registry.defs.len()];
        for i in 0..registry.defs.len() {
            registry.collect_anchors(DefId(i as u32), &mut anchors);
        }
        let anchors = anchors.into_iter().map(|set| set.unwrap_or_default()).collect();

        Ok(TreeRegistry { anchors, ..registry })
    }
}

/// Immutable, frozen store of compiled tree definitions.
///
/// Safe to share across arbitrarily many concurrent decision cycles; nothing
/// here mutates after `freeze`.
pub struct TreeRegistry<A> {
    nodes: Vec<DecisionNode<A>>,
    defs: Vec<TreeDefinition>,
    by_name: AHashMap<String, DefId>,
    /// Transitive anchor tags reachable from each definition
    anchors: Vec<AHashSet<AnchorTag>>,
}

impl<A> std::fmt::Debug for TreeRegistry<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TreeRegistry")
            .field("nodes", &self.nodes.len())
            .field("defs", &self.defs.len())
            .finish()
    }
}

impl<A> TreeRegistry<A> {
    pub fn def(&self, name: &str) -> Option<DefId> {
        self.by_name.get(name).copied()
    }

    pub fn def_name(&self, def: DefId) -> &str {
        &self.defs[def.index()].name
    }

    pub fn root(&self, def: DefId) -> NodeId {
        self.defs[def.index()].root
    }

    pub fn node(&self, id: NodeId) -> &DecisionNode<A> {
        &self.nodes[id.index()]
    }

    pub fn def_count(&self) -> usize {
        self.defs.len()
    }

    /// Whether `tag` is a declared attachment point anywhere in `def`,
    /// including through subtree references and tag splices
    pub fn has_anchor(&self, def: DefId, tag: &AnchorTag) -> bool {
        self.anchors[def.index()].contains(tag)
    }

    fn def_depth(&self, def: DefId, memo: &mut Vec<Option<usize>>) -> usize {
        if let Some(depth) = memo[def.index()] {
            return depth;
        }
        let depth = self.node_depth(self.root(def), memo);
        memo[def.index()] = Some(depth);
        depth
    }

    fn node_depth(&self, id: NodeId, memo: &mut Vec<Option<usize>>) -> usize {
        let children_depth = match self.node(id) {
            DecisionNode::Sequence { children }
            | DecisionNode::Conditional { children, .. }
            | DecisionNode::Tagger { children, .. }
            | DecisionNode::Random { children, .. } => children
                .iter()
                .map(|&c| self.node_depth(c, memo))
                .max()
                .unwrap_or(0),
            DecisionNode::PrioritySorter { children } => children
                .iter()
                .map(|&(c, _)| self.node_depth(c, memo))
                .max()
                .unwrap_or(0),
            DecisionNode::SubtreeRef { def } => self.def_depth(*def, memo),
            DecisionNode::Anchor { spliced, fallback, .. } => {
                let a = spliced
                    .iter()
                    .map(|&d| self.def_depth(d, memo))
                    .max()
                    .unwrap_or(0);
                let b = fallback
                    .iter()
                    .map(|&c| self.node_depth(c, memo))
                    .max()
                    .unwrap_or(0);
                a.max(b)
            }
            DecisionNode::QueuedOverride | DecisionNode::Generator { .. } => 0,
        };
        1 + children_depth
    }

    fn collect_anchors(&self, def: DefId, memo: &mut Vec<Option<AHashSet<AnchorTag>>>) {
        if memo[def.index()].is_some() {
            return;
        }
        // Mark before walking; the graph is acyclic so this only guards
        // against recomputing shared definitions
        memo[def.index()] = Some(AHashSet::new());
        let mut set = AHashSet::new();
        self.anchors_under(self.root(def), &mut set, memo);
        memo[def.index()] = Some(set);
    }

    fn anchors_under(
        &self,
        id: NodeId,
        set: &mut AHashSet<AnchorTag>,
        memo: &mut Vec<Option<AHashSet<AnchorTag>>>,
    ) {
        match self.node(id) {
            DecisionNode::Sequence { children }
            | DecisionNode::Conditional { children, .. }
            | DecisionNode::Tagger { children, .. }
            | DecisionNode::Random { children, .. } => {
                for &c in children {
                    self.anchors_under(c, set, memo);
                }
            }
            DecisionNode::PrioritySorter { children } => {
                for &(c, _) in children {
                    self.anchors_under(c, set, memo);
                }
            }
            DecisionNode::SubtreeRef { def } => {
                let def = *def;
                self.collect_anchors(def, memo);
                if let Some(sub) = &memo[def.index()] {
                    set.extend(sub.iter().cloned());
                }
            }
            DecisionNode::Anchor { tag, spliced, fallback } => {
                set.insert(tag.clone());
                for &d in spliced {
                    self.collect_anchors(d, memo);
                    if let Some(sub) = &memo[d.index()] {
                        set.extend(sub.iter().cloned());
                    }
                }
                for &c in fallback {
                    self.anchors_under(c, set, memo);
                }
            }
            DecisionNode::QueuedOverride | DecisionNode::Generator { .. } => {}
        }
    }
}

/// References a spec node tree makes to other definitions
#[derive(Default)]
struct NodeRefs {
    /// SubtreeRef targets, by name
    names: Vec<String>,
    /// SubtreeByTag targets
    tags: Vec<AnchorTag>,
    /// Anchor tags (splice targets land under these)
    anchors: Vec<AnchorTag>,
}

fn collect_refs<A>(node: &NodeSpec<A>, out: &mut NodeRefs) {
    match node {
        NodeSpec::Sequence(children)
        | NodeSpec::Conditional { children, .. }
        | NodeSpec::Tagger { children, .. } => {
            for c in children {
                collect_refs(c, out);
            }
        }
        NodeSpec::PrioritySorter(children) => {
            for (c, _) in children {
                collect_refs(c, out);
            }
        }
        NodeSpec::Random(children) => {
            for (c, _) in children {
                collect_refs(c, out);
            }
        }
        NodeSpec::SubtreeRef(name) => out.names.push(name.clone()),
        NodeSpec::SubtreeByTag(tag) => out.tags.push(tag.clone()),
        NodeSpec::Anchor { tag, fallback } => {
            out.anchors.push(tag.clone());
            for c in fallback {
                collect_refs(c, out);
            }
        }
        NodeSpec::QueuedOverride | NodeSpec::Generator(_) => {}
    }
}

/// Depth-first cycle search over an adjacency list. Returns the cycle as a
/// closed path of indices (first element repeated at the end).
fn find_cycle(edges: &[Vec<usize>]) -> Option<Vec<usize>> {
    #[derive(Clone, Copy, PartialEq)]
    enum Color {
        White,
        Grey,
        Black,
    }

    fn visit(
        i: usize,
        edges: &[Vec<usize>],
        colors: &mut [Color],
        stack: &mut Vec<usize>,
    ) -> Option<Vec<usize>> {
        colors[i] = Color::Grey;
        stack.push(i);
        for &next in &edges[i] {
            match colors[next] {
                Color::Grey => {
                    let start = stack.iter().position(|&n| n == next).unwrap_or(0);
                    let mut path: Vec<usize> = stack[start..].to_vec();
                    path.push(next);
                    return Some(path);
                }
                Color::White => {
                    if let Some(path) = visit(next, edges, colors, stack) {
                        return Some(path);
                    }
                }
                Color::Black => {}
            }
        }
        stack.pop();
        colors[i] = Color::Black;
        None
    }

    let mut colors = vec![Color::White; edges.len()];
    let mut stack = Vec::new();
    for i in 0..edges.len() {
        if colors[i] == Color::White {
            if let Some(path) = visit(i, edges, &mut colors, &mut stack) {
                return Some(path);
            }
        }
    }
    None
}

fn compile_node<A>(
    node: NodeSpec<A>,
    tree: &str,
    by_name: &AHashMap<String, DefId>,
    tag_members: &AHashMap<AnchorTag, Vec<usize>>,
    arena: &mut Vec<DecisionNode<A>>,
) -> Result<NodeId, ConfigError> {
    let compiled = match node {
        NodeSpec::Sequence(children) => DecisionNode::Sequence {
            children: compile_children(children, tree, by_name, tag_members, arena)?,
        },
        NodeSpec::PrioritySorter(children) => {
            let mut out = Vec::with_capacity(children.len());
            for (child, scorer) in children {
                let id = compile_node(child, tree, by_name, tag_members, arena)?;
                out.push((id, scorer));
            }
            DecisionNode::PrioritySorter { children: out }
        }
        NodeSpec::Random(children) => {
            if children.is_empty() {
                return Err(ConfigError::EmptyRandom(tree.to_string()));
            }
            let mut ids = Vec::with_capacity(children.len());
            let mut weights = Vec::with_capacity(children.len());
            for (child, weight) in children {
                if !weight.is_finite() || weight <= 0.0 {
                    return Err(ConfigError::InvalidWeight {
                        tree: tree.to_string(),
                        weight,
                    });
                }
                ids.push(compile_node(child, tree, by_name, tag_members, arena)?);
                weights.push(weight);
            }
            DecisionNode::Random {
                children: ids,
                weights,
            }
        }
        NodeSpec::Conditional { predicate, children } => DecisionNode::Conditional {
            predicate,
            children: compile_children(children, tree, by_name, tag_members, arena)?,
        },
        NodeSpec::Tagger { tag, children } => DecisionNode::Tagger {
            tag,
            children: compile_children(children, tree, by_name, tag_members, arena)?,
        },
        NodeSpec::SubtreeRef(name) => match by_name.get(&name) {
            Some(&def) => DecisionNode::SubtreeRef { def },
            None => return Err(ConfigError::DanglingRef(name)),
        },
        NodeSpec::SubtreeByTag(tag) => {
            // Expands to the tagged definitions in registration order; an
            // empty tag set compiles to an empty sequence that yields null
            let members = tag_members.get(&tag).cloned().unwrap_or_default();
            let mut children = Vec::with_capacity(members.len());
            for i in members {
                arena.push(DecisionNode::SubtreeRef { def: DefId(i as u32) });
                children.push(NodeId((arena.len() - 1) as u32));
            }
            DecisionNode::Sequence { children }
        }
        NodeSpec::Anchor { tag, fallback } => {
            let spliced = tag_members
                .get(&tag)
                .map(|members| members.iter().map(|&i| DefId(i as u32)).collect())
                .unwrap_or_default();
            DecisionNode::Anchor {
                tag,
                spliced,
                fallback: compile_children(fallback, tree, by_name, tag_members, arena)?,
            }
        }
        NodeSpec::QueuedOverride => DecisionNode::QueuedOverride,
        NodeSpec::Generator(producer) => DecisionNode::Generator { producer },
    };
    arena.push(compiled);
    Ok(NodeId((arena.len() - 1) as u32))
}

fn compile_children<A>(
    children: Vec<NodeSpec<A>>,
    tree: &str,
    by_name: &AHashMap<String, DefId>,
    tag_members: &AHashMap<AnchorTag, Vec<usize>>,
    arena: &mut Vec<DecisionNode<A>>,
) -> Result<Vec<NodeId>, ConfigError> {
    let mut out = Vec::with_capacity(children.len());
    for child in children {
        out.push(compile_node(child, tree, by_name, tag_members, arena)?);
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::DecisionContext;
    use crate::core::error::GeneratorError;

    fn noop() -> NodeSpec<&'static str> {
        NodeSpec::generator(|_: &DecisionContext<'_>| {
            Ok::<Option<&'static str>, GeneratorError>(None)
        })
    }

    #[test]
    fn test_register_and_freeze_minimal() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(vec![TreeSpec::new("main", NodeSpec::sequence(vec![noop()]))])
            .unwrap();
        let registry = builder.freeze().unwrap();
        assert_eq!(registry.def_count(), 1);
        assert!(registry.def("main").is_some());
        assert!(registry.def("other").is_none());
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut builder = RegistryBuilder::new();
        builder.register(vec![TreeSpec::new("main", noop())]).unwrap();
        let err = builder
            .register(vec![TreeSpec::new("main", noop())])
            .unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateName(name) if name == "main"));
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_dangling_ref_rejected() {
        let mut builder = RegistryBuilder::<&str>::new();
        let err = builder
            .register(vec![TreeSpec::new("main", NodeSpec::subtree("missing"))])
            .unwrap_err();
        assert!(matches!(err, ConfigError::DanglingRef(name) if name == "missing"));
        assert!(builder.is_empty());
    }

    #[test]
    fn test_forward_ref_within_batch_ok() {
        let mut builder = RegistryBuilder::<&str>::new();
        builder
            .register(vec![
                TreeSpec::new("main", NodeSpec::subtree("helper")),
                TreeSpec::new("helper", noop()),
            ])
            .unwrap();
        assert_eq!(builder.len(), 2);
    }

    #[test]
    fn test_cycle_rejected_and_builder_recovers() {
        let mut builder = RegistryBuilder::<&str>::new();
        let err = builder
            .register(vec![
                TreeSpec::new("a", NodeSpec::subtree("b")),
                TreeSpec::new("b", NodeSpec::subtree("a")),
            ])
            .unwrap_err();
        match err {
            ConfigError::Cycle { path } => {
                assert!(path.len() >= 3);
                assert_eq!(path.first(), path.last());
            }
            other => panic!("expected cycle error, got {other}"),
        }
        assert!(builder.is_empty());

        // Rejection must not poison the builder
        builder
            .register(vec![TreeSpec::new("a", noop())])
            .unwrap();
        assert_eq!(builder.len(), 1);
    }

    #[test]
    fn test_diamond_sharing_is_not_a_cycle() {
        let mut builder = RegistryBuilder::<&str>::new();
        builder
            .register(vec![
                TreeSpec::new("shared", noop()),
                TreeSpec::new("left", NodeSpec::subtree("shared")),
                TreeSpec::new("right", NodeSpec::subtree("shared")),
                TreeSpec::new(
                    "main",
                    NodeSpec::sequence(vec![
                        NodeSpec::subtree("left"),
                        NodeSpec::subtree("right"),
                    ]),
                ),
            ])
            .unwrap();
        builder.freeze().unwrap();
    }

    #[test]
    fn test_tag_splice_cycle_rejected_at_freeze() {
        // A tagged def that anchors its own tag would expand forever
        let mut builder = RegistryBuilder::<&str>::new();
        builder
            .register(vec![TreeSpec::tagged(
                "recursive",
                "slot",
                NodeSpec::anchor("slot"),
            )])
            .unwrap();
        let err = builder.freeze().unwrap_err();
        assert!(matches!(err, ConfigError::Cycle { .. }));
    }

    #[test]
    fn test_anchor_splice_registration_order() {
        let mut builder = RegistryBuilder::<&str>::new();
        builder
            .register(vec![TreeSpec::new("main", NodeSpec::anchor("slot"))])
            .unwrap();
        builder
            .register(vec![TreeSpec::tagged("first", "slot", noop())])
            .unwrap();
        builder
            .register(vec![TreeSpec::tagged("second", "slot", noop())])
            .unwrap();
        let registry = builder.freeze().unwrap();

        let main = registry.def("main").unwrap();
        match registry.node(registry.root(main)) {
            DecisionNode::Anchor { spliced, .. } => {
                let names: Vec<&str> =
                    spliced.iter().map(|&d| registry.def_name(d)).collect();
                assert_eq!(names, vec!["first", "second"]);
            }
            _ => panic!("expected anchor at main root"),
        }
    }

    #[test]
    fn test_subtree_by_tag_expands_in_order() {
        let mut builder = RegistryBuilder::<&str>::new();
        builder
            .register(vec![
                TreeSpec::tagged("d1", "jobs", noop()),
                TreeSpec::tagged("d2", "jobs", noop()),
                TreeSpec::new("main", NodeSpec::subtree_by_tag("jobs")),
            ])
            .unwrap();
        let registry = builder.freeze().unwrap();
        let main = registry.def("main").unwrap();
        match registry.node(registry.root(main)) {
            DecisionNode::Sequence { children } => {
                assert_eq!(children.len(), 2);
                let names: Vec<&str> = children
                    .iter()
                    .map(|&c| match registry.node(c) {
                        DecisionNode::SubtreeRef { def } => registry.def_name(*def),
                        _ => panic!("expected subtree ref"),
                    })
                    .collect();
                assert_eq!(names, vec!["d1", "d2"]);
            }
            _ => panic!("expected sequence"),
        }
    }

    #[test]
    fn test_empty_random_rejected_at_freeze() {
        let mut builder = RegistryBuilder::<&str>::new();
        builder
            .register(vec![TreeSpec::new("main", NodeSpec::random(vec![]))])
            .unwrap();
        let err = builder.freeze().unwrap_err();
        assert!(matches!(err, ConfigError::EmptyRandom(tree) if tree == "main"));
    }

    #[test]
    fn test_bad_weight_rejected_at_freeze() {
        let mut builder = RegistryBuilder::<&str>::new();
        builder
            .register(vec![TreeSpec::new(
                "main",
                NodeSpec::random_weighted(vec![(noop(), -1.0)]),
            )])
            .unwrap();
        let err = builder.freeze().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidWeight { .. }));
    }

    #[test]
    fn test_depth_guard() {
        let mut builder = RegistryBuilder::<&str>::new();
        let mut node = noop();
        for _ in 0..10 {
            node = NodeSpec::sequence(vec![node]);
        }
        builder.register(vec![TreeSpec::new("deep", node)]).unwrap();
        let err = builder.freeze_with_limit(5).unwrap_err();
        assert!(matches!(err, ConfigError::TooDeep { tree, max: 5 } if tree == "deep"));
    }

    #[test]
    fn test_transitive_anchor_lookup() {
        let mut builder = RegistryBuilder::<&str>::new();
        builder
            .register(vec![
                TreeSpec::new("inner", NodeSpec::anchor("duty_slot")),
                TreeSpec::new("main", NodeSpec::sequence(vec![NodeSpec::subtree("inner")])),
            ])
            .unwrap();
        let registry = builder.freeze().unwrap();
        let main = registry.def("main").unwrap();
        assert!(registry.has_anchor(main, &AnchorTag::from("duty_slot")));
        assert!(!registry.has_anchor(main, &AnchorTag::from("other_slot")));
    }
}
