use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::AgentId;
use crate::skills::Specialisation;

/// Identifies one vacancy: the posting employer and its own vacancy number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct JobReference {
    pub employer_id: AgentId,
    pub vacancy_id: u64,
}

impl JobReference {
    pub fn new(employer_id: AgentId, vacancy_id: u64) -> Self {
        JobReference {
            employer_id,
            vacancy_id,
        }
    }
}

/// What a worker learns about a vacancy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct JobDetails {
    pub wage: f64,
    pub specialisation: Option<Specialisation>,
}

impl JobDetails {
    pub fn new(wage: f64, specialisation: Option<Specialisation>) -> Self {
        JobDetails {
            wage,
            specialisation,
        }
    }
}

/// Index of a board inside the simulation's board list.
pub type BoardId = usize;

/// A vacancy directory. Iteration follows reference order so that seeded runs
/// replay identically.
#[derive(Clone, Debug, Default)]
pub struct JobBoard {
    board: BTreeMap<JobReference, JobDetails>,
    popularity: Option<f64>,
}

impl JobBoard {
    pub fn new(popularity: Option<f64>) -> Self {
        JobBoard {
            board: BTreeMap::new(),
            popularity,
        }
    }

    /// Relative weight used when a worker picks one of its boards.
    pub fn popularity(&self) -> Option<f64> {
        self.popularity
    }

    pub fn set_popularity(&mut self, popularity: Option<f64>) {
        self.popularity = popularity;
    }

    /// Post a vacancy, replacing any earlier posting under the same reference.
    pub fn register(
        &mut self,
        employer_id: AgentId,
        vacancy_id: u64,
        wage: f64,
        specialisation: Option<Specialisation>,
    ) {
        self.board.insert(
            JobReference::new(employer_id, vacancy_id),
            JobDetails::new(wage, specialisation),
        );
    }

    pub fn deregister(&mut self, employer_id: AgentId, vacancy_id: u64) {
        self.board.remove(&JobReference::new(employer_id, vacancy_id));
    }

    pub fn get(&self, reference: &JobReference) -> Option<&JobDetails> {
        self.board.get(reference)
    }

    pub fn keys(&self) -> btree_map::Keys<'_, JobReference, JobDetails> {
        self.board.keys()
    }

    pub fn values(&self) -> btree_map::Values<'_, JobReference, JobDetails> {
        self.board.values()
    }

    pub fn items(&self) -> btree_map::Iter<'_, JobReference, JobDetails> {
        self.board.iter()
    }

    pub fn len(&self) -> usize {
        self.board.len()
    }

    pub fn is_empty(&self) -> bool {
        self.board.is_empty()
    }
}
