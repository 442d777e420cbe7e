use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;

use crate::agents::{AgentBuilder, AgentKind, AttrValue, BuildContext};
use crate::config::ParamReader;
use crate::error::{AbmError, Result};
use crate::ids::AgentId;
use crate::jobs::{BoardId, JobBoard, JobDetails, JobReference};
use crate::registry::AgentRegistry;
use crate::sampling::{access_order, bernoulli, weighted_choice, AccessMethod};
use crate::skills::{Skill, Specialisation};

// ─────────────────────────────────────────────────────────────────────────────
// Parameters and sub-states
// ─────────────────────────────────────────────────────────────────────────────

/// Search-and-application hyperparameters.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchParams {
    /// Weekly reservation-wage decrement while unemployed.
    pub alpha: f64,
    pub search_rate: f64,
    /// Probability of searching a board rather than the network when both
    /// are available.
    pub pi: f64,
    pub search_max: usize,
    pub application_rate: f64,
    pub application_max: usize,
    pub search_method: AccessMethod,
    pub application_method: AccessMethod,
}

impl SearchParams {
    fn from_reader(reader: &ParamReader<'_>) -> Result<Self> {
        Ok(SearchParams {
            alpha: reader.non_negative("alpha")?,
            search_rate: reader.rate("search_rate")?,
            pi: reader.rate("pi")?,
            search_max: reader.unsigned("search_max")? as usize,
            application_rate: reader.rate("application_rate")?,
            application_max: reader.unsigned("application_max")? as usize,
            search_method: reader.parse("search_method")?,
            application_method: reader.parse("application_method")?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Employment {
    pub employer_id: AgentId,
    pub vacancy_id: u64,
    pub wage: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrainingState {
    Idle,
    Training { target: Specialisation, days: u32 },
}

/// Capability of workers that can retrain into a new specialisation.
#[derive(Clone, Debug, PartialEq)]
pub struct Specialising {
    /// Highest tier a worker may take without holding the specialisation.
    pub max_general_skill: Skill,
    pub unemployment_limit: u32,
    pub training_rate: f64,
    state: TrainingState,
    search_history: BTreeMap<Specialisation, u32>,
}

impl Specialising {
    pub fn new(max_general_skill: Skill, unemployment_limit: u32, training_rate: f64) -> Self {
        Specialising {
            max_general_skill,
            unemployment_limit,
            training_rate,
            state: TrainingState::Idle,
            search_history: BTreeMap::new(),
        }
    }

    pub fn state(&self) -> TrainingState {
        self.state
    }

    /// How often each out-of-reach specialisation turned up while searching.
    pub fn search_history(&self) -> &BTreeMap<Specialisation, u32> {
        &self.search_history
    }
}

/// A vacancy application waiting to be handed to its employer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Application {
    pub reference: JobReference,
    pub worker_id: AgentId,
}

/// What a worker can see and touch during its turn.
///
/// The stepping worker is detached from `agents` for the duration, so peers
/// are read-only and the worker cannot observe itself through the registry.
pub struct StepContext<'a> {
    pub agent_id: AgentId,
    pub week: bool,
    pub agents: &'a AgentRegistry,
    pub boards: &'a [JobBoard],
    pub rng: &'a mut StdRng,
    pub outbox: &'a mut Vec<Application>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Worker
// ─────────────────────────────────────────────────────────────────────────────

/// A job-searching worker. Specialisation-aware behaviour is switched on by
/// the optional [`Specialising`] capability.
#[derive(Clone, Debug)]
pub struct Worker {
    household: Option<AgentId>,
    employment: Option<Employment>,
    reservation_wage: f64,
    skill: Skill,
    specialisations: BTreeSet<Specialisation>,
    boards: Vec<BoardId>,
    jobs: BTreeMap<JobReference, JobDetails>,
    seen: BTreeSet<JobReference>,
    search: SearchParams,
    time_unemployed: u32,
    specialising: Option<Specialising>,
}

impl Worker {
    pub fn new(household: Option<AgentId>, reservation_wage: f64, search: SearchParams) -> Self {
        Worker {
            household,
            employment: None,
            reservation_wage,
            skill: Skill::ElementaryOccupations,
            specialisations: BTreeSet::new(),
            boards: Vec::new(),
            jobs: BTreeMap::new(),
            seen: BTreeSet::new(),
            search,
            time_unemployed: 0,
            specialising: None,
        }
    }

    pub fn with_skill(
        mut self,
        skill: Skill,
        specialisations: impl IntoIterator<Item = Specialisation>,
    ) -> Self {
        self.skill = skill;
        self.specialisations = specialisations.into_iter().collect();
        self
    }

    pub fn with_specialising(mut self, specialising: Specialising) -> Self {
        self.specialising = Some(specialising);
        self
    }

    // ─── Accessors ──────────────────────────────────────────────────────────

    pub fn household(&self) -> Option<AgentId> {
        self.household
    }

    pub fn employment(&self) -> Option<Employment> {
        self.employment
    }

    pub fn is_employed(&self) -> bool {
        self.employment.is_some()
    }

    pub fn reservation_wage(&self) -> f64 {
        self.reservation_wage
    }

    pub fn skill(&self) -> Skill {
        self.skill
    }

    pub fn specialisations(&self) -> &BTreeSet<Specialisation> {
        &self.specialisations
    }

    pub fn boards(&self) -> &[BoardId] {
        &self.boards
    }

    /// Vacancies discovered but not yet applied to.
    pub fn jobs(&self) -> &BTreeMap<JobReference, JobDetails> {
        &self.jobs
    }

    pub fn has_seen(&self, reference: &JobReference) -> bool {
        self.seen.contains(reference)
    }

    pub fn search_params(&self) -> &SearchParams {
        &self.search
    }

    pub fn time_unemployed(&self) -> u32 {
        self.time_unemployed
    }

    pub fn specialising(&self) -> Option<&Specialising> {
        self.specialising.as_ref()
    }

    pub fn is_training(&self) -> bool {
        matches!(
            self.specialising.as_ref().map(|s| s.state),
            Some(TrainingState::Training { .. })
        )
    }

    pub(crate) fn attribute(&self, key: &str) -> Option<AttrValue> {
        Some(match key {
            "employed" => AttrValue::Bool(self.is_employed()),
            "training" => AttrValue::Bool(self.is_training()),
            "specialising" => AttrValue::Bool(self.specialising.is_some()),
            "reservation_wage" => AttrValue::Float(self.reservation_wage),
            "skill" => AttrValue::Int(self.skill.level() as i64),
            "time_unemployed" => AttrValue::Int(self.time_unemployed as i64),
            "household" => AttrValue::Id(self.household?),
            "employer" => AttrValue::Id(self.employment?.employer_id),
            "wage" => AttrValue::Float(self.employment?.wage),
            "discovered" => AttrValue::Int(self.jobs.len() as i64),
            _ => return None,
        })
    }

    // ─── Employment interface ───────────────────────────────────────────────

    /// Take a job. Ignored while already employed.
    pub fn employ(&mut self, employer_id: AgentId, vacancy_id: u64, wage: f64) {
        if self.employment.is_none() {
            self.employment = Some(Employment {
                employer_id,
                vacancy_id,
                wage,
            });
        }
    }

    /// Lose the job; the reservation wage resets to the wage just earned.
    pub fn unemploy(&mut self) {
        if let Some(employment) = self.employment.take() {
            self.reservation_wage = employment.wage;
            self.time_unemployed = 0;
        }
    }

    /// Subscribe to a job board; repeated subscriptions are ignored.
    pub fn add_job_board(&mut self, board: BoardId) {
        if !self.boards.contains(&board) {
            self.boards.push(board);
        }
    }

    pub(crate) fn forget(&mut self, peer: AgentId) {
        if self.household == Some(peer) {
            self.household = None;
        }
    }

    // ─── Per-tick behaviour ─────────────────────────────────────────────────

    /// One day of behaviour. `ctx.week` marks the last day of a week.
    pub fn step(&mut self, ctx: &mut StepContext<'_>) {
        if self.is_employed() {
            return;
        }
        if self.is_training() {
            self.continue_training(ctx.agent_id);
            return;
        }

        if ctx.week {
            self.reservation_wage = (self.reservation_wage - self.search.alpha).max(0.0);
        }

        if self.unemployment_limit_reached() && self.start_training(ctx) {
            return;
        }

        self.search(ctx);
        self.apply(ctx);
        self.find_training_opportunities();
        self.time_unemployed += 1;
    }

    // ─── Job discovery ──────────────────────────────────────────────────────

    /// Look for vacancies on a board or through the household's friends.
    pub fn search(&mut self, ctx: &mut StepContext<'_>) {
        let agents = ctx.agents;
        let friends: &[AgentId] = self
            .household
            .and_then(|h| agents.household(h))
            .map(|h| h.friends())
            .unwrap_or(&[]);

        let has_boards = !self.boards.is_empty();
        let has_network = !friends.is_empty();
        if !(has_boards || has_network) {
            return;
        }
        if !bernoulli(ctx.rng, self.search.search_rate) {
            return;
        }

        let use_board = if has_boards && has_network {
            bernoulli(ctx.rng, self.search.pi)
        } else {
            has_boards
        };

        if use_board {
            self.search_board(ctx);
        } else {
            self.search_network(ctx, friends);
        }
    }

    fn search_board(&mut self, ctx: &mut StepContext<'_>) {
        let weights: Vec<f64> = self
            .boards
            .iter()
            .map(|&b| ctx.boards.get(b).and_then(JobBoard::popularity).unwrap_or(0.0))
            .collect();
        let Some(choice) = weighted_choice(ctx.rng, &weights) else {
            return;
        };
        let Some(board) = ctx.boards.get(self.boards[choice]) else {
            return;
        };

        let candidates: Vec<(JobReference, JobDetails)> =
            board.items().map(|(r, d)| (*r, *d)).collect();
        let mut budget = self.search.search_max;
        self.scan(ctx.rng, &candidates, &mut budget);
    }

    fn search_network(&mut self, ctx: &mut StepContext<'_>, friends: &[AgentId]) {
        let agents = ctx.agents;
        let mut budget = self.search.search_max;

        for &friend in friends {
            for peer in agents.household_workers(friend) {
                if budget == 0 {
                    return;
                }
                let candidates: Vec<(JobReference, JobDetails)> =
                    peer.jobs().iter().map(|(r, d)| (*r, *d)).collect();
                self.scan(ctx.rng, &candidates, &mut budget);
            }
        }
    }

    /// Walk `candidates` in search order, spending one unit of `budget` per
    /// vacancy looked at and keeping those that pay at least the
    /// reservation wage.
    fn scan(&mut self, rng: &mut StdRng, candidates: &[(JobReference, JobDetails)], budget: &mut usize) {
        let wages: Vec<f64> = candidates.iter().map(|(_, d)| d.wage).collect();
        for index in access_order(rng, self.search.search_method, &wages) {
            if *budget == 0 {
                break;
            }
            *budget -= 1;
            let (reference, details) = candidates[index];
            if details.wage >= self.reservation_wage {
                self.discover(reference, details);
            }
        }
    }

    /// Remember a vacancy unless it has been seen before.
    pub fn discover(&mut self, reference: JobReference, details: JobDetails) {
        if self.seen.insert(reference) {
            self.jobs.insert(reference, details);
        }
    }

    fn clear(&mut self, references: &[JobReference]) {
        for reference in references {
            self.seen.remove(reference);
            self.jobs.remove(reference);
        }
    }

    // ─── Applications ───────────────────────────────────────────────────────

    /// Apply to the best (or random) eligible discovered vacancies.
    pub fn apply(&mut self, ctx: &mut StepContext<'_>) {
        if self.jobs.is_empty() {
            return;
        }
        if !bernoulli(ctx.rng, self.search.application_rate) {
            return;
        }

        let candidates: Vec<(JobReference, f64)> = self
            .jobs
            .iter()
            .filter(|(_, d)| self.is_eligible(d))
            .map(|(r, d)| (*r, d.wage))
            .collect();
        let wages: Vec<f64> = candidates.iter().map(|(_, w)| *w).collect();

        let applied: Vec<JobReference> =
            access_order(ctx.rng, self.search.application_method, &wages)
                .into_iter()
                .take(self.search.application_max)
                .map(|i| candidates[i].0)
                .collect();

        for reference in &applied {
            tracing::trace!(
                target: "worker",
                worker_id = ctx.agent_id,
                employer_id = reference.employer_id,
                vacancy_id = reference.vacancy_id,
                "application"
            );
            ctx.outbox.push(Application {
                reference: *reference,
                worker_id: ctx.agent_id,
            });
        }
        self.clear(&applied);
    }

    /// Whether the worker may apply to a vacancy. Generalists take anything;
    /// specialising workers need the specialisation unless the job's tier is
    /// within their general skill.
    pub fn is_eligible(&self, details: &JobDetails) -> bool {
        let (Some(specialising), Some(required)) = (&self.specialising, details.specialisation)
        else {
            return true;
        };
        self.specialisations.contains(&required) || required.skill() <= specialising.max_general_skill
    }

    // ─── Training ───────────────────────────────────────────────────────────

    /// Move vacancies the worker is not qualified for into the search
    /// history, dropping them from the discovered set.
    pub fn find_training_opportunities(&mut self) {
        if self.specialising.is_none() || self.jobs.is_empty() {
            return;
        }

        let diverted: Vec<(JobReference, Specialisation)> = self
            .jobs
            .iter()
            .filter(|(_, d)| !self.is_eligible(d))
            .filter_map(|(r, d)| d.specialisation.map(|s| (*r, s)))
            .collect();
        if diverted.is_empty() {
            return;
        }

        if let Some(specialising) = self.specialising.as_mut() {
            for (_, specialisation) in &diverted {
                *specialising.search_history.entry(*specialisation).or_insert(0) += 1;
            }
        }
        let references: Vec<JobReference> = diverted.into_iter().map(|(r, _)| r).collect();
        self.clear(&references);
    }

    fn unemployment_limit_reached(&self) -> bool {
        self.specialising
            .as_ref()
            .is_some_and(|s| self.time_unemployed >= s.unemployment_limit)
    }

    /// Try to enter training. Returns whether training started.
    fn start_training(&mut self, ctx: &mut StepContext<'_>) -> bool {
        let Some(specialising) = self.specialising.as_mut() else {
            return false;
        };
        if specialising.search_history.is_empty() {
            return false;
        }
        if !bernoulli(ctx.rng, specialising.training_rate) {
            return false;
        }

        let options: Vec<(Specialisation, f64)> = specialising
            .search_history
            .iter()
            .map(|(s, count)| (*s, *count as f64))
            .collect();
        let weights: Vec<f64> = options.iter().map(|(_, w)| *w).collect();
        let Some(choice) = weighted_choice(ctx.rng, &weights) else {
            return false;
        };
        let target = options[choice].0;

        specialising.search_history.clear();
        specialising.state = TrainingState::Training { target, days: 0 };
        self.time_unemployed = 0;

        tracing::debug!(
            target: "worker",
            worker_id = ctx.agent_id,
            specialisation = %target,
            days_required = target.days_to_specialise(),
            "training started"
        );
        true
    }

    fn continue_training(&mut self, agent_id: AgentId) {
        let Some(specialising) = self.specialising.as_mut() else {
            return;
        };
        let TrainingState::Training { target, days } = specialising.state else {
            return;
        };

        let days = days + 1;
        if days < target.days_to_specialise() {
            specialising.state = TrainingState::Training { target, days };
            return;
        }

        specialising.state = TrainingState::Idle;
        self.train(target);
        tracing::debug!(
            target: "worker",
            worker_id = agent_id,
            specialisation = %target,
            skill = %self.skill,
            "training completed"
        );
    }

    /// Acquire a specialisation, raising the skill tier if it is higher.
    pub fn train(&mut self, specialisation: Specialisation) {
        self.specialisations.insert(specialisation);
        self.skill = self.skill.max(specialisation.skill());
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Builder
// ─────────────────────────────────────────────────────────────────────────────

/// Builds workers from parameters. With `specialising` set the worker also
/// gets the retraining capability and its extra required parameters.
#[derive(Clone, Copy, Debug, Default)]
pub struct WorkerBuilder {
    pub specialising: bool,
}

impl WorkerBuilder {
    pub fn generalist() -> Self {
        WorkerBuilder {
            specialising: false,
        }
    }

    pub fn specialising() -> Self {
        WorkerBuilder { specialising: true }
    }
}

impl AgentBuilder for WorkerBuilder {
    fn build(&self, ctx: &BuildContext<'_>) -> Result<AgentKind> {
        let reader = ParamReader::new(ctx.name, ctx.params);

        let household = reader.unsigned("household")?;
        if ctx.registry.household(household).is_none() {
            return Err(AbmError::UnknownAgent(household));
        }

        let mut worker = Worker::new(
            Some(household),
            reader.non_negative("reservation_wage")?,
            SearchParams::from_reader(&reader)?,
        );
        for board in reader.unsigned_list("boards")? {
            worker.add_job_board(board as BoardId);
        }

        let skill = if self.specialising || reader.has("skill") {
            reader.parse::<Skill>("skill")?
        } else {
            Skill::ElementaryOccupations
        };
        let specialisations = reader.parsed_list::<Specialisation>("specialisations")?;
        worker = worker.with_skill(skill, specialisations);

        if self.specialising {
            worker = worker.with_specialising(Specialising::new(
                reader.parse("max_general_skill")?,
                reader.unsigned("unemployment_limit")? as u32,
                reader.rate("training_rate")?,
            ));
        }

        Ok(AgentKind::Worker(worker))
    }
}
