//! Headless decision-engine demo
//!
//! Drives a small population of needs-based agents through the engine for a
//! fixed number of ticks and logs what each tree phase selects. Generators
//! here are deliberately toy-grade; the point is the wiring: registration,
//! freeze, directives, queued overrides and the parallel cycle driver.

use ahash::AHashMap;
use arbiter::{
    AgentId, DecisionContext, DecisionDriver, EngineConfig, GeneratorError, NodeSpec,
    RegistryBuilder, TreeSpec,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

/// Headless multi-agent decision simulation
#[derive(Parser, Debug)]
#[command(name = "arbiter_sim")]
#[command(about = "Run the decision engine over a toy agent population")]
struct Args {
    /// Number of simulated agents
    #[arg(long, default_value_t = 20)]
    agents: usize,

    /// Ticks to simulate
    #[arg(long, default_value_t = 100)]
    ticks: u64,

    /// Random seed for deterministic runs
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Optional engine config TOML (defaults to built-in tree names)
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Toy action payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum SimAction {
    Idle,
    Wander,
    Eat,
    Sleep,
    Flee,
    Haul,
    Patrol,
}

/// Per-agent needs the generators read. The main loop is the only writer and
/// only mutates between ticks, so decision passes see a stable snapshot.
#[derive(Debug, Clone, Copy, Default)]
struct Needs {
    hunger: f32,
    fatigue: f32,
    threatened: bool,
}

type World = Arc<RwLock<AHashMap<AgentId, Needs>>>;

fn need_of(world: &World, agent: AgentId) -> Needs {
    world.read().expect("world lock poisoned").get(&agent).copied().unwrap_or_default()
}

fn build_registry(world: &World) -> RegistryBuilder<SimAction> {
    let mut builder = RegistryBuilder::new();

    // Constant tree: interrupt checks that preempt everything
    let threat_world = world.clone();
    let interrupts = TreeSpec::new(
        "interrupts",
        NodeSpec::conditional(
            move |ctx: &DecisionContext<'_>| need_of(&threat_world, ctx.agent).threatened,
            vec![NodeSpec::tagger(
                "danger",
                NodeSpec::generator(|_: &DecisionContext<'_>| {
                    Ok::<_, GeneratorError>(Some(SimAction::Flee))
                }),
            )],
        ),
    );

    // Primary tree: explicit orders, then needs by pressure, then duty slot,
    // then idle filler
    let eat_world = world.clone();
    let eat_score = world.clone();
    let sleep_world = world.clone();
    let sleep_score = world.clone();
    let behavior = TreeSpec::new(
        "behavior",
        NodeSpec::sequence(vec![
            NodeSpec::queued_override(),
            NodeSpec::priority(vec![
                NodeSpec::scored(
                    NodeSpec::generator(move |ctx: &DecisionContext<'_>| {
                        if need_of(&eat_world, ctx.agent).hunger > 0.5 {
                            Ok::<_, GeneratorError>(Some(SimAction::Eat))
                        } else {
                            Ok(None)
                        }
                    }),
                    move |ctx: &DecisionContext<'_>| need_of(&eat_score, ctx.agent).hunger,
                ),
                NodeSpec::scored(
                    NodeSpec::generator(move |ctx: &DecisionContext<'_>| {
                        if need_of(&sleep_world, ctx.agent).fatigue > 0.6 {
                            Ok::<_, GeneratorError>(Some(SimAction::Sleep))
                        } else {
                            Ok(None)
                        }
                    }),
                    move |ctx: &DecisionContext<'_>| need_of(&sleep_score, ctx.agent).fatigue,
                ),
            ]),
            NodeSpec::anchor("duty_slot"),
            NodeSpec::random_weighted(vec![
                (
                    NodeSpec::generator(|_: &DecisionContext<'_>| {
                        Ok::<_, GeneratorError>(Some(SimAction::Wander))
                    }),
                    3.0,
                ),
                (
                    NodeSpec::generator(|_: &DecisionContext<'_>| {
                        Ok::<_, GeneratorError>(Some(SimAction::Idle))
                    }),
                    1.0,
                ),
            ]),
        ]),
    );

    // Duty packs splice into the anchor in registration order
    let haul_world = world.clone();
    let haul = TreeSpec::tagged(
        "haul_duty",
        "duty_slot",
        NodeSpec::tagger(
            "work",
            NodeSpec::generator(move |ctx: &DecisionContext<'_>| {
                // Only fed agents haul; the hungry fall through to idling
                if need_of(&haul_world, ctx.agent).hunger < 0.3 {
                    Ok::<_, GeneratorError>(Some(SimAction::Haul))
                } else {
                    Ok(None)
                }
            }),
        ),
    );
    let patrol = TreeSpec::new(
        "patrol_duty",
        NodeSpec::tagger(
            "work",
            NodeSpec::generator(|_: &DecisionContext<'_>| {
                Ok::<_, GeneratorError>(Some(SimAction::Patrol))
            }),
        ),
    );

    builder
        .register(vec![interrupts, behavior, haul, patrol])
        .expect("static tree content must register");
    builder
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();
    tracing::info!(agents = args.agents, ticks = args.ticks, seed = args.seed, "starting arbiter_sim");

    let config = match &args.config {
        Some(path) => EngineConfig::load(path).expect("failed to load engine config"),
        None => EngineConfig::new("interrupts", "behavior"),
    };

    let world: World = Arc::new(RwLock::new(AHashMap::new()));
    let registry = Arc::new(
        build_registry(&world)
            .freeze_with_limit(config.max_depth)
            .expect("static tree content must freeze"),
    );

    let alive_world = world.clone();
    let accessor = Arc::new(move |agent: AgentId| {
        alive_world.read().expect("world lock poisoned").contains_key(&agent)
    });
    let mut driver = DecisionDriver::new(registry, &config, accessor, SimAction::Idle)
        .expect("config must name registered trees");

    let mut agents = Vec::with_capacity(args.agents);
    {
        let mut needs = world.write().expect("world lock poisoned");
        for _ in 0..args.agents {
            let agent = AgentId::new();
            needs.insert(agent, Needs::default());
            driver.add_agent(agent);
            agents.push(agent);
        }
    }

    // One agent gets a standing patrol directive, another an explicit order
    if let Some(&patroller) = agents.first() {
        driver
            .assign_directive(patroller, "patrol_duty", "duty_slot")
            .expect("duty_slot is declared in the primary tree");
    }
    if let Some(&ordered) = agents.get(1) {
        driver.queue_override(ordered, SimAction::Patrol);
    }

    for tick in 0..args.ticks {
        driver.decide_all(false, args.seed.wrapping_add(tick));

        let mut counts: AHashMap<SimAction, usize> = AHashMap::new();
        for &agent in &agents {
            if let Some(action) = driver.current_action(agent) {
                *counts.entry(*action.payload()).or_default() += 1;
            }
        }
        tracing::info!(tick, ?counts, "tick complete");

        // Advance needs so the priority sorter has something to chew on
        let mut needs = world.write().expect("world lock poisoned");
        for (i, (_, n)) in needs.iter_mut().enumerate() {
            n.hunger = (n.hunger + 0.013 + (i % 5) as f32 * 0.002).min(1.0);
            n.fatigue = (n.fatigue + 0.009).min(1.0);
            n.threatened = tick % 37 == 0 && i % 7 == 0;
        }
        for &agent in &agents {
            let Some(action) = driver.current_action(agent) else {
                continue;
            };
            let payload = *action.payload();
            if let Some(n) = needs.get_mut(&agent) {
                match payload {
                    SimAction::Eat => n.hunger = 0.0,
                    SimAction::Sleep => n.fatigue = 0.0,
                    _ => {}
                }
            }
        }
    }

    tracing::info!("simulation finished");
}
