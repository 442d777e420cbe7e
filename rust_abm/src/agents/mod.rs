pub mod firm;
pub mod household;
pub mod worker;

pub use firm::{Employer, Firm, FirmBuilder};
pub use household::{Household, HouseholdBuilder};
pub use worker::{
    Application, Employment, SearchParams, Specialising, StepContext, TrainingState, Worker,
    WorkerBuilder,
};

use crate::config::Parameters;
use crate::error::Result;
use crate::ids::AgentId;
use crate::registry::AgentRegistry;

// ─────────────────────────────────────────────────────────────────────────────
// Agent record
// ─────────────────────────────────────────────────────────────────────────────

/// Behaviour-specific state of an agent.
#[derive(Clone, Debug)]
pub enum AgentKind {
    Worker(Worker),
    Household(Household),
    Firm(Firm),
}

/// A live agent: identity, type name, destruction subscribers and its state.
///
/// Agents are only created and destroyed through [`AgentRegistry`], which
/// owns them. Every cross-agent link is an id resolved through the registry.
#[derive(Clone, Debug)]
pub struct Agent {
    id: AgentId,
    name: String,
    registered: Vec<AgentId>,
    pub kind: AgentKind,
}

impl Agent {
    pub(crate) fn new(id: AgentId, name: &str, kind: AgentKind) -> Self {
        Agent {
            id,
            name: name.to_string(),
            registered: Vec::new(),
            kind,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Peers told about this agent's destruction.
    pub fn registered(&self) -> &[AgentId] {
        &self.registered
    }

    pub fn register(&mut self, peer: AgentId) {
        if peer != self.id && !self.registered.contains(&peer) {
            self.registered.push(peer);
        }
    }

    /// Forget `peer`, typically because it was destroyed. Also drops any
    /// link the agent's own state holds to it.
    pub fn deregister(&mut self, peer: AgentId) {
        self.registered.retain(|&p| p != peer);
        match &mut self.kind {
            AgentKind::Worker(worker) => worker.forget(peer),
            AgentKind::Household(household) => household.forget(peer),
            AgentKind::Firm(_) => {}
        }
    }

    pub fn as_worker(&self) -> Option<&Worker> {
        match &self.kind {
            AgentKind::Worker(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_worker_mut(&mut self) -> Option<&mut Worker> {
        match &mut self.kind {
            AgentKind::Worker(w) => Some(w),
            _ => None,
        }
    }

    pub fn as_household(&self) -> Option<&Household> {
        match &self.kind {
            AgentKind::Household(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_household_mut(&mut self) -> Option<&mut Household> {
        match &mut self.kind {
            AgentKind::Household(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_firm(&self) -> Option<&Firm> {
        match &self.kind {
            AgentKind::Firm(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_firm_mut(&mut self) -> Option<&mut Firm> {
        match &mut self.kind {
            AgentKind::Firm(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_employer_mut(&mut self) -> Option<&mut dyn Employer> {
        match &mut self.kind {
            AgentKind::Firm(f) => Some(f),
            _ => None,
        }
    }

    /// Current value of a named attribute, used by attribute queries.
    pub fn attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "id" => return Some(AttrValue::Id(self.id)),
            "name" => return Some(AttrValue::Text(self.name.clone())),
            _ => {}
        }
        match &self.kind {
            AgentKind::Worker(w) => w.attribute(key),
            AgentKind::Household(h) => h.attribute(key),
            AgentKind::Firm(f) => f.attribute(key),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Attribute queries
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Id(AgentId),
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<f64> for AttrValue {
    fn from(v: f64) -> Self {
        AttrValue::Float(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

impl AttrValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            AttrValue::Float(v) => Some(*v),
            AttrValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }
}

type AttrPredicate = Box<dyn Fn(Option<&AttrValue>) -> bool>;

enum Predicate {
    Equals(AttrValue),
    Satisfies(AttrPredicate),
}

/// Conjunction of attribute tests. An agent lacking an attribute never
/// equals a literal; predicates see `None` for it.
#[derive(Default)]
pub struct Query {
    clauses: Vec<(String, Predicate)>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, key: &str, value: impl Into<AttrValue>) -> Self {
        self.clauses
            .push((key.to_string(), Predicate::Equals(value.into())));
        self
    }

    pub fn matching<F>(mut self, key: &str, predicate: F) -> Self
    where
        F: Fn(Option<&AttrValue>) -> bool + 'static,
    {
        self.clauses
            .push((key.to_string(), Predicate::Satisfies(Box::new(predicate))));
        self
    }

    pub fn matches(&self, agent: &Agent) -> bool {
        self.clauses.iter().all(|(key, predicate)| {
            let value = agent.attribute(key);
            match predicate {
                Predicate::Equals(wanted) => value.as_ref() == Some(wanted),
                Predicate::Satisfies(f) => f(value.as_ref()),
            }
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builders
// ─────────────────────────────────────────────────────────────────────────────

/// Everything a builder may look at while constructing an agent.
pub struct BuildContext<'a> {
    pub id: AgentId,
    pub name: &'a str,
    pub params: &'a Parameters,
    pub registry: &'a AgentRegistry,
}

/// Constructs the state of one agent type from its parameters.
pub trait AgentBuilder: Send + Sync {
    fn build(&self, ctx: &BuildContext<'_>) -> Result<AgentKind>;
}

impl<F> AgentBuilder for F
where
    F: Fn(&BuildContext<'_>) -> Result<AgentKind> + Send + Sync,
{
    fn build(&self, ctx: &BuildContext<'_>) -> Result<AgentKind> {
        self(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn firm(id: AgentId) -> Agent {
        Agent::new(id, "Firm", AgentKind::Firm(Firm::new()))
    }

    #[test]
    fn register_is_idempotent_and_skips_self() {
        let mut agent = firm(3);
        agent.register(5);
        agent.register(5);
        agent.register(3);
        assert_eq!(agent.registered(), &[5]);
    }

    #[test]
    fn deregister_twice_is_noop() {
        let mut agent = firm(1);
        agent.register(2);
        agent.register(4);
        agent.deregister(2);
        agent.deregister(2);
        assert_eq!(agent.registered(), &[4]);
    }

    #[test]
    fn query_literal_and_predicate() {
        let agent = firm(8);
        assert!(Query::new().eq("name", "Firm").matches(&agent));
        assert!(!Query::new().eq("name", "Worker").matches(&agent));
        assert!(Query::new()
            .matching("id", |v| v == Some(&AttrValue::Id(8)))
            .matches(&agent));
        assert!(!Query::new().eq("employed", true).matches(&agent));
        assert!(Query::new()
            .matching("employed", |v| v.is_none())
            .matches(&agent));
    }
}
