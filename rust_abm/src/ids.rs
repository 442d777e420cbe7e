use std::collections::BTreeSet;

/// Unique identifier of a live agent.
pub type AgentId = u64;

/// Hands out agent identifiers and recycles the ones freed by destruction.
///
/// Released ids are reused smallest-first; once the pool is empty the
/// counter advances. The counter is never reset, so an id can only come back
/// through [`IdRegistry::release`].
#[derive(Clone, Debug, Default)]
pub struct IdRegistry {
    next: AgentId,
    pool: BTreeSet<AgentId>,
}

impl IdRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> AgentId {
        if let Some(id) = self.pool.pop_first() {
            return id;
        }
        let id = self.next;
        self.next += 1;
        id
    }

    /// Return `id` to the pool. The caller guarantees it is no longer live.
    pub fn release(&mut self, id: AgentId) {
        debug_assert!(id < self.next, "released id {id} was never issued");
        self.pool.insert(id);
    }

    /// Number of ids waiting to be reused.
    pub fn pooled(&self) -> usize {
        self.pool.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_advances_when_pool_is_empty() {
        let mut ids = IdRegistry::new();
        assert_eq!(ids.next_id(), 0);
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
    }

    #[test]
    fn released_ids_are_reused_smallest_first() {
        let mut ids = IdRegistry::new();
        for _ in 0..5 {
            ids.next_id();
        }
        ids.release(3);
        ids.release(1);
        assert_eq!(ids.pooled(), 2);
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 3);
        assert_eq!(ids.next_id(), 5);
    }
}
