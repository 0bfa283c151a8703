//! Node evaluation
//!
//! One evaluation pass walks the frozen arena from a definition root down to
//! the first leaf that produces an action. The pass is fully synchronous and
//! bounded by the registry's static depth check; the only mutable state it
//! touches is the per-agent pending-override slot and the seeded RNG stream.

use crate::action::Action;
use crate::capability::DecisionContext;
use crate::core::types::{AnchorTag, NodeId};
use crate::tree::node::DecisionNode;
use crate::tree::registry::TreeRegistry;
use ordered_float::OrderedFloat;
use rand::distributions::{Distribution, WeightedIndex};
use rand_chacha::ChaCha8Rng;
use std::cmp::Reverse;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Everything one evaluation pass needs
pub(crate) struct EvalEnv<'a, A> {
    pub registry: &'a TreeRegistry<A>,
    pub ctx: DecisionContext<'a>,
    pub rng: &'a mut ChaCha8Rng,
    /// The agent's queued explicit action, claimed by QueuedOverride nodes
    pub pending: &'a mut Option<Action<A>>,
    /// Active directive, resolved to its anchor tag and tree root
    pub directive: Option<(&'a AnchorTag, NodeId)>,
    /// Set while evaluating inside the directive overlay, so an anchor tag
    /// that also appears in the directive's own tree does not re-expand it
    pub in_directive: bool,
}

/// Evaluate one node. Exactly one action or none results from any node.
pub(crate) fn evaluate<A>(env: &mut EvalEnv<'_, A>, id: NodeId) -> Option<Action<A>> {
    let registry = env.registry;
    match registry.node(id) {
        DecisionNode::Sequence { children } => evaluate_in_order(env, children),

        DecisionNode::PrioritySorter { children } => {
            // Scores are recomputed every call; the stable sort keeps
            // declaration order on ties
            let mut order: Vec<(usize, f32)> = children
                .iter()
                .enumerate()
                .map(|(i, (_, scorer))| (i, scorer.score(&env.ctx)))
                .collect();
            order.sort_by_key(|&(_, score)| Reverse(OrderedFloat(score)));
            for (i, _) in order {
                if let Some(action) = evaluate(env, children[i].0) {
                    return Some(action);
                }
            }
            None
        }

        DecisionNode::Random { children, weights } => {
            // One draw, one child; a null result stands without falling back
            // to the other siblings
            let dist = match WeightedIndex::new(weights.iter().copied()) {
                Ok(dist) => dist,
                Err(err) => {
                    tracing::warn!(error = %err, "random node weights rejected at draw");
                    return None;
                }
            };
            let chosen = children[dist.sample(&mut *env.rng)];
            evaluate(env, chosen)
        }

        DecisionNode::Conditional { predicate, children } => {
            if !predicate.test(&env.ctx) {
                return None;
            }
            evaluate_in_order(env, children)
        }

        DecisionNode::Tagger { tag, children } => {
            let mut result = evaluate_in_order(env, children)?;
            result.stamp(tag);
            Some(result)
        }

        DecisionNode::SubtreeRef { def } => evaluate(env, registry.root(*def)),

        DecisionNode::Anchor { tag, spliced, fallback } => {
            if !env.in_directive {
                if let Some((anchor, root)) = env.directive {
                    if anchor == tag {
                        env.in_directive = true;
                        let result = evaluate(env, root);
                        env.in_directive = false;
                        if result.is_some() {
                            return result;
                        }
                    }
                }
            }
            for &def in spliced {
                if let Some(action) = evaluate(env, registry.root(def)) {
                    return Some(action);
                }
            }
            evaluate_in_order(env, fallback)
        }

        DecisionNode::QueuedOverride => env.pending.take(),

        DecisionNode::Generator { producer } => {
            let ctx = env.ctx;
            match catch_unwind(AssertUnwindSafe(|| producer.produce(&ctx))) {
                Ok(Ok(payload)) => payload.map(Action::new),
                Ok(Err(err)) => {
                    tracing::warn!(agent = ?ctx.agent, error = %err, "generator failed, node yields nothing");
                    None
                }
                Err(_) => {
                    tracing::warn!(agent = ?ctx.agent, "generator panicked, node yields nothing");
                    None
                }
            }
        }
    }
}

fn evaluate_in_order<A>(env: &mut EvalEnv<'_, A>, children: &[NodeId]) -> Option<Action<A>> {
    for &child in children {
        if let Some(action) = evaluate(env, child) {
            return Some(action);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::error::GeneratorError;
    use crate::core::types::{ActionTag, AgentId};
    use crate::tree::registry::RegistryBuilder;
    use crate::tree::spec::{NodeSpec, TreeSpec};
    use rand::SeedableRng;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn yields(value: &'static str) -> NodeSpec<&'static str> {
        NodeSpec::generator(move |_: &DecisionContext<'_>| {
            Ok::<_, GeneratorError>(Some(value))
        })
    }

    fn declines() -> NodeSpec<&'static str> {
        NodeSpec::generator(|_: &DecisionContext<'_>| Ok::<Option<&'static str>, GeneratorError>(None))
    }

    /// Generator that counts invocations before declining
    fn counting(counter: Arc<AtomicUsize>) -> NodeSpec<&'static str> {
        NodeSpec::generator(move |_: &DecisionContext<'_>| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok::<Option<&'static str>, GeneratorError>(None)
        })
    }

    fn eval_main(
        registry: &TreeRegistry<&'static str>,
        seed: u64,
    ) -> Option<Action<&'static str>> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let mut pending = None;
        let mut env = EvalEnv {
            registry,
            ctx: DecisionContext {
                agent: AgentId::new(),
                forced: false,
                directive_anchor: None,
            },
            rng: &mut rng,
            pending: &mut pending,
            directive: None,
            in_directive: false,
        };
        let main = registry.def("main").unwrap();
        evaluate(&mut env, registry.root(main))
    }

    fn freeze(root: NodeSpec<&'static str>) -> TreeRegistry<&'static str> {
        let mut builder = RegistryBuilder::new();
        builder.register(vec![TreeSpec::new("main", root)]).unwrap();
        builder.freeze().unwrap()
    }

    #[test]
    fn test_sequence_first_success_short_circuits() {
        let later = Arc::new(AtomicUsize::new(0));
        let registry = freeze(NodeSpec::sequence(vec![
            declines(),
            yields("action_x"),
            counting(later.clone()),
        ]));
        let result = eval_main(&registry, 0).unwrap();
        assert_eq!(*result.payload(), "action_x");
        assert_eq!(later.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_sequence_all_decline_yields_none() {
        let registry = freeze(NodeSpec::sequence(vec![declines(), declines()]));
        assert!(eval_main(&registry, 0).is_none());
    }

    #[test]
    fn test_conditional_false_evaluates_nothing() {
        let count = Arc::new(AtomicUsize::new(0));
        let registry = freeze(NodeSpec::conditional(
            |_: &DecisionContext<'_>| false,
            vec![counting(count.clone()), yields("unreachable")],
        ));
        assert!(eval_main(&registry, 0).is_none());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_conditional_true_behaves_as_sequence() {
        let registry = freeze(NodeSpec::conditional(
            |_: &DecisionContext<'_>| true,
            vec![declines(), yields("behind_gate")],
        ));
        assert_eq!(*eval_main(&registry, 0).unwrap().payload(), "behind_gate");
    }

    #[test]
    fn test_random_same_seed_same_child() {
        let registry = freeze(NodeSpec::random(vec![
            yields("x"),
            yields("y"),
            yields("z"),
        ]));
        let first = eval_main(&registry, 7).unwrap();
        for _ in 0..10 {
            assert_eq!(eval_main(&registry, 7).unwrap(), first);
        }
    }

    #[test]
    fn test_random_evaluates_exactly_one_child() {
        let count = Arc::new(AtomicUsize::new(0));
        let registry = freeze(NodeSpec::random(vec![
            counting(count.clone()),
            counting(count.clone()),
            counting(count.clone()),
        ]));
        // All children decline; no fallback draw may happen
        assert!(eval_main(&registry, 3).is_none());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_random_null_does_not_fall_back() {
        // Heavy weight on a declining child: the draw's result stands
        let registry = freeze(NodeSpec::random_weighted(vec![
            (declines(), 1_000_000.0),
            (yields("rare"), 0.000_001),
        ]));
        let mut produced = 0;
        for seed in 0..20 {
            if eval_main(&registry, seed).is_some() {
                produced += 1;
            }
        }
        assert_eq!(produced, 0);
    }

    #[test]
    fn test_priority_sorter_orders_by_score() {
        let registry = freeze(NodeSpec::priority(vec![
            NodeSpec::scored(yields("low"), |_: &DecisionContext<'_>| 1.0),
            NodeSpec::scored(yields("high"), |_: &DecisionContext<'_>| 5.0),
        ]));
        assert_eq!(*eval_main(&registry, 0).unwrap().payload(), "high");
    }

    #[test]
    fn test_priority_sorter_ties_keep_declaration_order() {
        let registry = freeze(NodeSpec::priority(vec![
            NodeSpec::scored(yields("first"), |_: &DecisionContext<'_>| 2.0),
            NodeSpec::scored(yields("second"), |_: &DecisionContext<'_>| 2.0),
        ]));
        assert_eq!(*eval_main(&registry, 0).unwrap().payload(), "first");
    }

    #[test]
    fn test_priority_sorter_skips_declining_high_scorer() {
        let registry = freeze(NodeSpec::priority(vec![
            NodeSpec::scored(yields("low"), |_: &DecisionContext<'_>| 1.0),
            NodeSpec::scored(declines(), |_: &DecisionContext<'_>| 9.0),
        ]));
        assert_eq!(*eval_main(&registry, 0).unwrap().payload(), "low");
    }

    #[test]
    fn test_tagger_stamps_non_null_result() {
        let registry = freeze(NodeSpec::tagger("survival", yields("eat")));
        let result = eval_main(&registry, 0).unwrap();
        assert_eq!(result.tag(), Some(&ActionTag::from("survival")));
    }

    #[test]
    fn test_tagger_passes_null_through_untagged() {
        let registry = freeze(NodeSpec::tagger("survival", declines()));
        assert!(eval_main(&registry, 0).is_none());
    }

    #[test]
    fn test_inner_tagger_wins_over_outer() {
        let registry = freeze(NodeSpec::tagger(
            "outer",
            NodeSpec::tagger("inner", yields("work")),
        ));
        let result = eval_main(&registry, 0).unwrap();
        assert_eq!(result.tag(), Some(&ActionTag::from("inner")));
    }

    #[test]
    fn test_subtree_ref_evaluates_shared_definition() {
        let mut builder = RegistryBuilder::new();
        builder
            .register(vec![
                TreeSpec::new("helper", yields("from_helper")),
                TreeSpec::new(
                    "main",
                    NodeSpec::sequence(vec![declines(), NodeSpec::subtree("helper")]),
                ),
            ])
            .unwrap();
        let registry = builder.freeze().unwrap();
        assert_eq!(*eval_main(&registry, 0).unwrap().payload(), "from_helper");
    }

    #[test]
    fn test_queued_override_claims_and_clears() {
        let registry = freeze(NodeSpec::sequence(vec![
            NodeSpec::queued_override(),
            yields("fallthrough"),
        ]));
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut pending = Some(Action::new("queued"));
        let mut env = EvalEnv {
            registry: &registry,
            ctx: DecisionContext {
                agent: AgentId::new(),
                forced: false,
                directive_anchor: None,
            },
            rng: &mut rng,
            pending: &mut pending,
            directive: None,
            in_directive: false,
        };
        let main = registry.def("main").unwrap();
        let result = evaluate(&mut env, registry.root(main)).unwrap();
        assert_eq!(*result.payload(), "queued");
        assert!(pending.is_none());

        // Slot now empty: evaluation passes through to the next sibling
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut pending = None;
        let mut env = EvalEnv {
            registry: &registry,
            ctx: DecisionContext {
                agent: AgentId::new(),
                forced: false,
                directive_anchor: None,
            },
            rng: &mut rng,
            pending: &mut pending,
            directive: None,
            in_directive: false,
        };
        let result = evaluate(&mut env, registry.root(main)).unwrap();
        assert_eq!(*result.payload(), "fallthrough");
    }

    #[test]
    fn test_generator_error_degrades_to_null() {
        let registry = freeze(NodeSpec::sequence(vec![
            NodeSpec::generator(|_: &DecisionContext<'_>| {
                Err::<Option<&'static str>, _>(GeneratorError::from("no path to target"))
            }),
            yields("next_sibling"),
        ]));
        assert_eq!(*eval_main(&registry, 0).unwrap().payload(), "next_sibling");
    }

    #[test]
    fn test_generator_panic_degrades_to_null() {
        let registry = freeze(NodeSpec::sequence(vec![
            NodeSpec::generator(|_: &DecisionContext<'_>| -> Result<Option<&'static str>, GeneratorError> {
                panic!("generator bug")
            }),
            yields("survivor"),
        ]));
        assert_eq!(*eval_main(&registry, 0).unwrap().payload(), "survivor");
    }

    #[test]
    fn test_anchor_without_directive_uses_fallback() {
        let registry = freeze(NodeSpec::anchor_with_fallback(
            "duty_slot",
            vec![yields("default_duty")],
        ));
        assert_eq!(*eval_main(&registry, 0).unwrap().payload(), "default_duty");
    }

    #[test]
    fn test_empty_anchor_yields_null() {
        let registry = freeze(NodeSpec::sequence(vec![
            NodeSpec::anchor("duty_slot"),
            yields("after_slot"),
        ]));
        assert_eq!(*eval_main(&registry, 0).unwrap().payload(), "after_slot");
    }
}
