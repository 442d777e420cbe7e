use std::collections::{BTreeMap, BTreeSet};

use crate::agents::{
    Agent, AgentBuilder, AgentKind, BuildContext, Firm, FirmBuilder, Household, HouseholdBuilder,
    Query, Worker, WorkerBuilder,
};
use crate::config::{AgentSpec, Parameters};
use crate::error::{AbmError, Result};
use crate::ids::{AgentId, IdRegistry};

// ─────────────────────────────────────────────────────────────────────────────
// Factory
// ─────────────────────────────────────────────────────────────────────────────

/// Maps agent type names to the builder that constructs them.
#[derive(Default)]
pub struct AgentFactory {
    builders: BTreeMap<String, Box<dyn AgentBuilder>>,
}

impl AgentFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factory with the built-in types: `Worker`, `SpecialisingWorker`,
    /// `Household` and `Firm`.
    pub fn standard() -> Self {
        let mut builders: BTreeMap<String, Box<dyn AgentBuilder>> = BTreeMap::new();
        builders.insert("Worker".into(), Box::new(WorkerBuilder::generalist()));
        builders.insert("SpecialisingWorker".into(), Box::new(WorkerBuilder::specialising()));
        builders.insert("Household".into(), Box::new(HouseholdBuilder));
        builders.insert("Firm".into(), Box::new(FirmBuilder));
        AgentFactory { builders }
    }

    pub fn register(&mut self, name: &str, builder: impl AgentBuilder + 'static) -> Result<()> {
        if self.builders.contains_key(name) {
            return Err(AbmError::DuplicateAgentType(name.to_string()));
        }
        self.builders.insert(name.to_string(), Box::new(builder));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.builders.contains_key(name)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Registry
// ─────────────────────────────────────────────────────────────────────────────

/// Owns every live agent, indexed by id and by type name.
///
/// Iteration and query results follow ascending id order.
pub struct AgentRegistry {
    factory: AgentFactory,
    ids: IdRegistry,
    agents: BTreeMap<AgentId, Agent>,
    by_name: BTreeMap<String, BTreeSet<AgentId>>,
}

impl AgentRegistry {
    pub fn new(factory: AgentFactory) -> Self {
        AgentRegistry {
            factory,
            ids: IdRegistry::new(),
            agents: BTreeMap::new(),
            by_name: BTreeMap::new(),
        }
    }

    pub fn standard() -> Self {
        Self::new(AgentFactory::standard())
    }

    pub fn factory(&self) -> &AgentFactory {
        &self.factory
    }

    /// Register an additional agent type.
    pub fn register_builder(&mut self, name: &str, builder: impl AgentBuilder + 'static) -> Result<()> {
        self.factory.register(name, builder)
    }

    // ─── Lifecycle ──────────────────────────────────────────────────────────

    /// Build an agent of type `name`, give it a fresh id and index it.
    pub fn create(&mut self, name: &str, params: &Parameters) -> Result<AgentId> {
        let builder = self
            .factory
            .builders
            .get(name)
            .ok_or_else(|| AbmError::UnknownAgentType(name.to_string()))?;
        let id = self.ids.next_id();

        let built = builder.build(&BuildContext {
            id,
            name,
            params,
            registry: self,
        });
        let kind = match built {
            Ok(kind) => kind,
            Err(err) => {
                self.ids.release(id);
                return Err(err);
            }
        };

        self.agents.insert(id, Agent::new(id, name, kind));
        self.by_name.entry(name.to_string()).or_default().insert(id);
        self.link(id);

        tracing::debug!(target: "registry", agent_id = id, agent_type = name, "created");
        Ok(id)
    }

    /// Remove an agent, tell its registered peers and recycle its id.
    /// Unknown ids are ignored.
    pub fn destroy(&mut self, id: AgentId) {
        let Some(agent) = self.agents.remove(&id) else {
            return;
        };

        if let Some(bucket) = self.by_name.get_mut(agent.name()) {
            bucket.remove(&id);
            if bucket.is_empty() {
                self.by_name.remove(agent.name());
            }
        }

        for peer in agent.registered() {
            if let Some(peer) = self.agents.get_mut(peer) {
                peer.deregister(id);
            }
        }

        self.ids.release(id);
        tracing::debug!(target: "registry", agent_id = id, agent_type = agent.name(), "destroyed");
    }

    /// Replace the whole population with the agents described by `specs`.
    ///
    /// Cleared agents are dropped without teardown and their ids go back to
    /// the pool, so reloading the same specs reproduces the same ids.
    pub fn reload(&mut self, specs: &[AgentSpec]) -> Result<()> {
        for id in std::mem::take(&mut self.agents).into_keys() {
            self.ids.release(id);
        }
        self.by_name.clear();

        for spec in specs {
            for _ in 0..spec.count {
                self.create(&spec.name, &spec.parameters)?;
            }
        }

        tracing::debug!(target: "registry", agents = self.agents.len(), "reloaded");
        Ok(())
    }

    /// Wire a freshly created agent to the agents its state refers to.
    fn link(&mut self, id: AgentId) {
        let (household, friends) = match self.agents.get(&id).map(|a| &a.kind) {
            Some(AgentKind::Worker(w)) => (w.household(), Vec::new()),
            Some(AgentKind::Household(h)) => (None, h.friends().to_vec()),
            _ => (None, Vec::new()),
        };

        if let Some(household_id) = household {
            if let Some(agent) = self.agents.get_mut(&household_id) {
                if let Some(h) = agent.as_household_mut() {
                    h.add_member(id);
                }
                agent.register(id);
            }
            if let Some(agent) = self.agents.get_mut(&id) {
                agent.register(household_id);
            }
        }

        for friend in friends {
            self.connect(id, friend);
        }
    }

    fn connect(&mut self, a: AgentId, b: AgentId) {
        for (this, other) in [(a, b), (b, a)] {
            if let Some(agent) = self.agents.get_mut(&this) {
                if let Some(h) = agent.as_household_mut() {
                    h.add_friend(other);
                }
                agent.register(other);
            }
        }
    }

    /// Make two households friends in the referral network.
    pub fn befriend(&mut self, a: AgentId, b: AgentId) -> Result<()> {
        for id in [a, b] {
            if self.household(id).is_none() {
                return Err(AbmError::UnknownAgent(id));
            }
        }
        if a != b {
            self.connect(a, b);
        }
        Ok(())
    }

    /// Befriend each household with the next one and close the loop, so
    /// every household in a ring of three or more has exactly two friends.
    pub fn befriend_ring(&mut self, households: &[AgentId]) -> Result<()> {
        for pair in households.windows(2) {
            self.befriend(pair[0], pair[1])?;
        }
        if let [first, .., last] = households {
            if households.len() > 2 {
                self.befriend(*last, *first)?;
            }
        }
        Ok(())
    }

    /// Run `f` on an agent taken out of the registry, so it can read every
    /// other agent while mutating itself. `None` if the id is not live.
    pub(crate) fn with_detached<T>(
        &mut self,
        id: AgentId,
        f: impl FnOnce(&mut Agent, &AgentRegistry) -> T,
    ) -> Option<T> {
        let mut agent = self.agents.remove(&id)?;
        let out = f(&mut agent, self);
        self.agents.insert(id, agent);
        Some(out)
    }

    // ─── Lookup ─────────────────────────────────────────────────────────────

    pub fn get_by_id(&self, id: AgentId) -> Option<&Agent> {
        self.agents.get(&id)
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        self.agents.get_mut(&id)
    }

    /// Agents for which every clause of `query` holds.
    pub fn get_by_attribute(&self, query: &Query) -> Vec<&Agent> {
        self.agents.values().filter(|a| query.matches(a)).collect()
    }

    /// Ids of all live agents, ascending.
    pub fn agent_ids(&self) -> Vec<AgentId> {
        self.agents.keys().copied().collect()
    }

    pub fn ids_of_type(&self, name: &str) -> Vec<AgentId> {
        self.by_name
            .get(name)
            .map(|ids| ids.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn contains(&self, id: AgentId) -> bool {
        self.agents.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.agents.values()
    }

    pub fn worker(&self, id: AgentId) -> Option<&Worker> {
        self.agents.get(&id).and_then(Agent::as_worker)
    }

    pub fn worker_mut(&mut self, id: AgentId) -> Option<&mut Worker> {
        self.agents.get_mut(&id).and_then(Agent::as_worker_mut)
    }

    pub fn household(&self, id: AgentId) -> Option<&Household> {
        self.agents.get(&id).and_then(Agent::as_household)
    }

    pub fn firm(&self, id: AgentId) -> Option<&Firm> {
        self.agents.get(&id).and_then(Agent::as_firm)
    }

    pub fn firm_mut(&mut self, id: AgentId) -> Option<&mut Firm> {
        self.agents.get_mut(&id).and_then(Agent::as_firm_mut)
    }

    /// The workers of a household, resolved through the registry.
    pub fn household_workers(&self, id: AgentId) -> Vec<&Worker> {
        self.household(id)
            .map(|h| h.members().iter().filter_map(|&m| self.worker(m)).collect())
            .unwrap_or_default()
    }
}

impl Default for AgentRegistry {
    fn default() -> Self {
        Self::standard()
    }
}
