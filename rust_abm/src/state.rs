use std::any::Any;
use std::fmt;

use krabmaga::engine::{agent::Agent, schedule::Schedule, state::State};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::config::Config;
use crate::error::Result;
use crate::registry::{AgentFactory, AgentRegistry};
use crate::scheduler::{DayScheduler, Scheduler};
use crate::world::World;

// ─────────────────────────────────────────────────────────────────────────────
// Labour market state (implements krabmaga State)
// ─────────────────────────────────────────────────────────────────────────────

/// Central simulation state: the world, the day scheduler and the run
/// configuration.
///
/// This implements the krabmaga `State` trait. The only agent stored in the
/// krabmaga `Schedule` is a [`DayAgent`] proxy; execution order among
/// labour-market agents is decided by the [`DayScheduler`], and the actual
/// agent data lives in the world's registry.
pub struct LabourMarket {
    pub world: World,
    pub scheduler: DayScheduler,
    pub config: Config,
}

impl LabourMarket {
    /// Build the boards and population described by `config` with the
    /// standard agent types.
    pub fn new(config: Config) -> Result<Self> {
        Self::with_factory(config, AgentFactory::standard())
    }

    pub fn with_factory(config: Config, factory: AgentFactory) -> Result<Self> {
        let mut world = World::new(AgentRegistry::new(factory), config.seed);
        world.reset_boards(&config.boards);
        world.reload(&config.population)?;

        let scheduler = DayScheduler::new(config.days_per_week, config.ordering.policy());
        let mut market = LabourMarket {
            world,
            scheduler,
            config,
        };
        market.scheduler.refresh(&mut market.world);
        Ok(market)
    }

    /// One day: every scheduled agent acts, then the order is resynchronised
    /// with the population.
    pub fn tick(&mut self) {
        self.scheduler.step(&mut self.world);
        self.scheduler.refresh(&mut self.world);
    }

    /// Run `iterations` days through a krabmaga schedule.
    pub fn run(&mut self, iterations: u64) {
        tracing::info!(
            target: "market",
            iterations,
            agents = self.world.registry.len(),
            boards = self.world.boards.len(),
            "simulation started"
        );

        let mut schedule = Schedule::new();
        self.init(&mut schedule);
        for _ in 0..iterations {
            schedule.step(self);
        }

        tracing::info!(target: "market", day = self.scheduler.day(), "simulation finished");
    }

    /// Run for the configured number of iterations.
    pub fn run_configured(&mut self) {
        self.run(self.config.iterations);
    }

    /// Reload population and boards from the configuration and reseed.
    pub fn rebuild(&mut self) -> Result<()> {
        self.world.rng = StdRng::seed_from_u64(self.config.seed);
        self.world.reset_boards(&self.config.boards);
        self.world.reload(&self.config.population)?;
        self.scheduler.reset();
        self.scheduler.refresh(&mut self.world);
        Ok(())
    }

    pub fn day(&self) -> u64 {
        self.scheduler.day()
    }
}

impl State for LabourMarket {
    /// Schedule the day proxy; it runs once per krabmaga step.
    fn init(&mut self, schedule: &mut Schedule) {
        schedule.schedule_repeating(Box::new(DayAgent), 0.0, 0);
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_state_mut(&mut self) -> &mut dyn State {
        self
    }

    fn as_state(&self) -> &dyn State {
        self
    }

    fn reset(&mut self) {
        // The configuration was already accepted once at construction.
        if let Err(err) = self.rebuild() {
            tracing::warn!(target: "market", error = %err, "reset failed");
        }
    }

    /// Reconcile created/destroyed agents before the next day.
    fn after_step(&mut self, _schedule: &mut Schedule) {
        self.scheduler.refresh(&mut self.world);
    }

    fn update(&mut self, _step: u64) {}
}

// ─────────────────────────────────────────────────────────────────────────────
// krabmaga Agent proxy for the day scheduler
// ─────────────────────────────────────────────────────────────────────────────

/// Proxy agent that advances the day scheduler within the krabmaga schedule.
#[derive(Clone)]
pub struct DayAgent;

impl fmt::Display for DayAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DayAgent")
    }
}

impl Agent for DayAgent {
    fn step(&mut self, state: &mut dyn State) {
        let state = state
            .as_any_mut()
            .downcast_mut::<LabourMarket>()
            .expect("state should be LabourMarket");
        state.scheduler.step(&mut state.world);
    }
}
