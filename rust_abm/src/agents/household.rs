use crate::agents::{AgentBuilder, AgentKind, AttrValue, BuildContext};
use crate::config::ParamReader;
use crate::error::{AbmError, Result};
use crate::ids::AgentId;

// ─────────────────────────────────────────────────────────────────────────────
// Household state
// ─────────────────────────────────────────────────────────────────────────────

/// A group of workers plus its links in the referral network.
///
/// Members are added by the registry when a worker naming this household is
/// created; friendships are symmetric and maintained by the registry too.
#[derive(Clone, Debug, Default)]
pub struct Household {
    members: Vec<AgentId>,
    friends: Vec<AgentId>,
}

impl Household {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ids of the workers belonging to this household.
    pub fn members(&self) -> &[AgentId] {
        &self.members
    }

    /// Ids of befriended households.
    pub fn friends(&self) -> &[AgentId] {
        &self.friends
    }

    pub(crate) fn add_member(&mut self, worker: AgentId) {
        if !self.members.contains(&worker) {
            self.members.push(worker);
        }
    }

    pub(crate) fn add_friend(&mut self, household: AgentId) {
        if !self.friends.contains(&household) {
            self.friends.push(household);
        }
    }

    pub(crate) fn forget(&mut self, peer: AgentId) {
        self.members.retain(|&m| m != peer);
        self.friends.retain(|&f| f != peer);
    }

    pub(crate) fn attribute(&self, key: &str) -> Option<AttrValue> {
        match key {
            "size" => Some(AttrValue::Int(self.members.len() as i64)),
            "friend_count" => Some(AttrValue::Int(self.friends.len() as i64)),
            _ => None,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builds households. The optional `friends` parameter lists existing
/// households to befriend once this one is registered.
#[derive(Clone, Copy, Debug, Default)]
pub struct HouseholdBuilder;

impl AgentBuilder for HouseholdBuilder {
    fn build(&self, ctx: &BuildContext<'_>) -> Result<AgentKind> {
        let reader = ParamReader::new(ctx.name, ctx.params);
        let mut household = Household::new();
        for friend in reader.unsigned_list("friends")? {
            if ctx.registry.household(friend).is_none() {
                return Err(AbmError::UnknownAgent(friend));
            }
            household.add_friend(friend);
        }
        Ok(AgentKind::Household(household))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn forget_drops_member_and_friend_links() {
        let mut household = Household::new();
        household.add_member(4);
        household.add_member(4);
        household.add_member(6);
        household.add_friend(2);
        household.add_friend(4);

        household.forget(4);

        assert_eq!(household.members(), &[6]);
        assert_eq!(household.friends(), &[2]);
        assert_eq!(household.attribute("size"), Some(AttrValue::Int(1)));
    }
}
