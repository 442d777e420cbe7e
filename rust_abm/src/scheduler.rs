use std::cmp::Ordering;
use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::ids::AgentId;
use crate::registry::AgentRegistry;
use crate::world::World;

// ─────────────────────────────────────────────────────────────────────────────
// Ordering policies
// ─────────────────────────────────────────────────────────────────────────────

/// Re-sorts the execution order after every refresh.
pub trait OrderingPolicy: Send + Sync {
    fn reorder(&mut self, order: &mut Vec<AgentId>, registry: &AgentRegistry, rng: &mut StdRng);
}

/// Keep survivors in place and newcomers in arrival order.
#[derive(Clone, Copy, Debug, Default)]
pub struct InsertionOrder;

impl OrderingPolicy for InsertionOrder {
    fn reorder(&mut self, _order: &mut Vec<AgentId>, _registry: &AgentRegistry, _rng: &mut StdRng) {}
}

/// Fresh uniform shuffle every refresh.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomOrder;

impl OrderingPolicy for RandomOrder {
    fn reorder(&mut self, order: &mut Vec<AgentId>, _registry: &AgentRegistry, rng: &mut StdRng) {
        order.shuffle(rng);
    }
}

/// Workers with the highest reservation wage act first; non-workers go
/// last. Ties keep id order.
#[derive(Clone, Copy, Debug, Default)]
pub struct ReservationWageOrder;

impl OrderingPolicy for ReservationWageOrder {
    fn reorder(&mut self, order: &mut Vec<AgentId>, registry: &AgentRegistry, _rng: &mut StdRng) {
        let wage = |id: &AgentId| registry.worker(*id).map(|w| w.reservation_wage());
        order.sort_by(|a, b| match (wage(a), wage(b)) {
            (Some(x), Some(y)) => y.total_cmp(&x).then(a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        });
    }
}

/// Serializable choice of ordering policy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderingKind {
    Insertion,
    Random,
    ReservationWage,
}

impl OrderingKind {
    pub fn policy(self) -> Box<dyn OrderingPolicy> {
        match self {
            OrderingKind::Insertion => Box::new(InsertionOrder),
            OrderingKind::Random => Box::new(RandomOrder),
            OrderingKind::ReservationWage => Box::new(ReservationWageOrder),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Scheduler
// ─────────────────────────────────────────────────────────────────────────────

/// Drop ids that are no longer live, keeping the survivors' relative order,
/// then append live ids the order has not seen yet.
pub fn synchronise(order: &mut Vec<AgentId>, live: &[AgentId]) {
    let live_set: HashSet<AgentId> = live.iter().copied().collect();
    order.retain(|id| live_set.contains(id));

    let mut held: HashSet<AgentId> = order.iter().copied().collect();
    for &id in live {
        if held.insert(id) {
            order.push(id);
        }
    }
}

/// Decides in which order agents act each tick.
pub trait Scheduler {
    /// Current execution order.
    fn order(&self) -> &[AgentId];

    fn order_mut(&mut self) -> &mut Vec<AgentId>;

    /// Run one tick of behaviour for every scheduled agent.
    fn step(&mut self, world: &mut World);

    /// Policy-specific re-sort, run at the end of every refresh.
    fn reorder(&mut self, world: &mut World);

    /// Bring the order in line with the live population.
    fn refresh(&mut self, world: &mut World) {
        let live = world.registry.agent_ids();
        synchronise(self.order_mut(), &live);
        self.reorder(world);
        tracing::trace!(target: "scheduler", scheduled = self.order().len(), "refreshed");
    }
}

/// Calendar scheduler: one tick is a day and every `days_per_week`-th day
/// closes a week.
pub struct DayScheduler {
    order: Vec<AgentId>,
    policy: Box<dyn OrderingPolicy>,
    day: u64,
    days_per_week: u64,
}

impl DayScheduler {
    pub fn new(days_per_week: u64, policy: Box<dyn OrderingPolicy>) -> Self {
        DayScheduler {
            order: Vec::new(),
            policy,
            day: 0,
            days_per_week,
        }
    }

    /// Days stepped so far.
    pub fn day(&self) -> u64 {
        self.day
    }

    pub fn reset(&mut self) {
        self.order.clear();
        self.day = 0;
    }

    pub fn is_week_boundary(&self, day: u64) -> bool {
        self.days_per_week > 0 && day % self.days_per_week == 0
    }
}

impl Scheduler for DayScheduler {
    fn order(&self) -> &[AgentId] {
        &self.order
    }

    fn order_mut(&mut self) -> &mut Vec<AgentId> {
        &mut self.order
    }

    fn step(&mut self, world: &mut World) {
        self.day += 1;
        let week = self.is_week_boundary(self.day);
        for &id in &self.order {
            world.step_agent(id, week);
        }
    }

    fn reorder(&mut self, world: &mut World) {
        self.policy
            .reorder(&mut self.order, &world.registry, &mut world.rng);
    }
}
