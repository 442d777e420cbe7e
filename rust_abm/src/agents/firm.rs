use crate::agents::{AgentBuilder, AgentKind, AttrValue, BuildContext};
use crate::error::Result;
use crate::ids::AgentId;

/// Receives applications. How (and whether) an employer hires is outside the
/// matching engine; it only ever calls [`Employer::apply`].
pub trait Employer {
    fn apply(&mut self, vacancy_id: u64, worker_id: AgentId);
}

/// Minimal employer that queues incoming applications for external hiring
/// logic to collect.
#[derive(Clone, Debug, Default)]
pub struct Firm {
    applications: Vec<(u64, AgentId)>,
}

impl Firm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pending `(vacancy id, worker id)` applications in arrival order.
    pub fn applications(&self) -> &[(u64, AgentId)] {
        &self.applications
    }

    pub fn take_applications(&mut self) -> Vec<(u64, AgentId)> {
        std::mem::take(&mut self.applications)
    }

    pub(crate) fn attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "applications" => Some(AttrValue::Int(self.applications.len() as i64)),
            _ => None,
        }
    }
}

impl Employer for Firm {
    fn apply(&mut self, vacancy_id: u64, worker_id: AgentId) {
        self.applications.push((vacancy_id, worker_id));
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FirmBuilder;

impl AgentBuilder for FirmBuilder {
    fn build(&self, _ctx: &BuildContext<'_>) -> Result<AgentKind> {
        Ok(AgentKind::Firm(Firm::new()))
    }
}
