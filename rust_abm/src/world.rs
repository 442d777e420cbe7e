use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::agents::{Application, StepContext};
use crate::config::{AgentSpec, BoardSpec, ParamReader, Parameters};
use crate::error::{AbmError, Result};
use crate::ids::AgentId;
use crate::jobs::{BoardId, JobBoard};
use crate::registry::AgentRegistry;

/// Everything agents act upon: the population, the job boards and the
/// simulation's single random generator.
pub struct World {
    pub registry: AgentRegistry,
    pub boards: Vec<JobBoard>,
    pub rng: StdRng,
}

impl World {
    pub fn new(registry: AgentRegistry, seed: u64) -> Self {
        World {
            registry,
            boards: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    // ─── Boards ─────────────────────────────────────────────────────────────

    pub fn add_board(&mut self, popularity: Option<f64>) -> BoardId {
        self.boards.push(JobBoard::new(popularity));
        self.boards.len() - 1
    }

    /// Replace all boards with fresh, empty ones.
    pub fn reset_boards(&mut self, specs: &[BoardSpec]) {
        self.boards = specs.iter().map(|s| JobBoard::new(s.popularity)).collect();
    }

    pub fn board(&self, id: BoardId) -> Option<&JobBoard> {
        self.boards.get(id)
    }

    pub fn board_mut(&mut self, id: BoardId) -> Option<&mut JobBoard> {
        self.boards.get_mut(id)
    }

    /// Subscribe a worker to a board.
    pub fn subscribe(&mut self, worker: AgentId, board: BoardId) -> Result<()> {
        if board >= self.boards.len() {
            return Err(AbmError::UnknownBoard(board));
        }
        self.registry
            .worker_mut(worker)
            .ok_or(AbmError::UnknownAgent(worker))?
            .add_job_board(board);
        Ok(())
    }

    // ─── Population ─────────────────────────────────────────────────────────

    /// Create an agent, rejecting workers subscribed to boards that do not
    /// exist.
    pub fn create(&mut self, name: &str, params: &Parameters) -> Result<AgentId> {
        let id = self.registry.create(name, params)?;
        if let Err(err) = self.check_boards(id) {
            self.registry.destroy(id);
            return Err(err);
        }
        Ok(id)
    }

    pub fn destroy(&mut self, id: AgentId) {
        self.registry.destroy(id);
    }

    /// Replace the population. Board references in `specs` are checked
    /// first, so a rejected reload leaves the current population untouched.
    pub fn reload(&mut self, specs: &[AgentSpec]) -> Result<()> {
        for spec in specs.iter().filter(|s| s.count > 0) {
            let reader = ParamReader::new(&spec.name, &spec.parameters);
            if let Some(&missing) = reader
                .unsigned_list("boards")?
                .iter()
                .find(|&&b| b as usize >= self.boards.len())
            {
                return Err(AbmError::UnknownBoard(missing as usize));
            }
        }

        self.registry.reload(specs)?;

        // Custom builders may subscribe workers without a `boards` parameter.
        let invalid: Vec<(AgentId, AbmError)> = self
            .registry
            .agent_ids()
            .into_iter()
            .filter_map(|id| self.check_boards(id).err().map(|e| (id, e)))
            .collect();
        let Some((_, err)) = invalid.first().cloned() else {
            return Ok(());
        };
        for (id, _) in invalid {
            self.registry.destroy(id);
        }
        Err(err)
    }

    fn check_boards(&self, id: AgentId) -> Result<()> {
        let Some(worker) = self.registry.worker(id) else {
            return Ok(());
        };
        match worker.boards().iter().find(|&&b| b >= self.boards.len()) {
            Some(&missing) => Err(AbmError::UnknownBoard(missing)),
            None => Ok(()),
        }
    }

    // ─── Stepping ───────────────────────────────────────────────────────────

    /// Run one agent's daily behaviour, then hand its applications to the
    /// employers concerned. Ids that are no longer live are skipped.
    pub fn step_agent(&mut self, id: AgentId, week: bool) {
        let mut outbox = Vec::new();
        let World {
            registry,
            boards,
            rng,
        } = self;

        registry.with_detached(id, |agent, agents| {
            if let Some(worker) = agent.as_worker_mut() {
                let mut ctx = StepContext {
                    agent_id: id,
                    week,
                    agents,
                    boards: boards.as_slice(),
                    rng,
                    outbox: &mut outbox,
                };
                worker.step(&mut ctx);
            }
        });

        self.deliver(outbox);
    }

    fn deliver(&mut self, applications: Vec<Application>) {
        for application in applications {
            let employer_id = application.reference.employer_id;
            match self
                .registry
                .get_mut(employer_id)
                .and_then(|a| a.as_employer_mut())
            {
                Some(employer) => {
                    employer.apply(application.reference.vacancy_id, application.worker_id)
                }
                None => tracing::debug!(
                    target: "market",
                    employer_id,
                    worker_id = application.worker_id,
                    "application to missing employer dropped"
                ),
            }
        }
    }
}
