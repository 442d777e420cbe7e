//! Python bindings, built with the `python` feature through
//! [PyO3](https://pyo3.rs).

use krabmaga::engine::schedule::Schedule;
use krabmaga::engine::state::State;
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_distr::{Distribution, LogNormal};

use crate::config::{BoardSpec, Config};
use crate::error::AbmError;
use crate::ids::AgentId;
use crate::params;
use crate::scheduler::Scheduler;
use crate::skills::{Skill, Specialisation};
use crate::state::LabourMarket;

fn to_py(err: AbmError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Python-visible day record
// ─────────────────────────────────────────────────────────────────────────────

/// Labour-market aggregates at the end of one simulated day.
///
/// All fields are read-only from Python.
#[pyclass(get_all)]
#[derive(Clone, Debug)]
pub struct PyDayRecord {
    pub day: u64,
    pub workers: usize,
    pub unemployed: usize,
    pub training: usize,
    pub mean_reservation_wage: f64,
    pub applications: usize,
}

#[pymethods]
impl PyDayRecord {
    fn __repr__(&self) -> String {
        format!(
            "PyDayRecord(day={}, unemployed={}, training={}, mean_reservation_wage={:.2})",
            self.day, self.unemployed, self.training, self.mean_reservation_wage
        )
    }

    /// Convert to a plain Python dict for easy interop with pandas / polars.
    fn to_dict(&self) -> std::collections::HashMap<String, f64> {
        let mut m = std::collections::HashMap::new();
        m.insert("day".to_string(), self.day as f64);
        m.insert("workers".to_string(), self.workers as f64);
        m.insert("unemployed".to_string(), self.unemployed as f64);
        m.insert("training".to_string(), self.training as f64);
        m.insert("mean_reservation_wage".to_string(), self.mean_reservation_wage);
        m.insert("applications".to_string(), self.applications as f64);
        m
    }
}

/// Summarise the day, then drain every firm's queue so the next record only
/// counts that day's applications.
fn record(market: &mut LabourMarket, firms: &[AgentId]) -> PyDayRecord {
    let registry = &market.world.registry;
    let workers: Vec<_> = registry.iter().filter_map(|a| a.as_worker()).collect();
    let wages: f64 = workers.iter().map(|w| w.reservation_wage()).sum();

    let mut summary = PyDayRecord {
        day: market.day(),
        workers: workers.len(),
        unemployed: workers.iter().filter(|w| !w.is_employed()).count(),
        training: workers.iter().filter(|w| w.is_training()).count(),
        mean_reservation_wage: if workers.is_empty() {
            0.0
        } else {
            wages / workers.len() as f64
        },
        applications: 0,
    };

    for &id in firms {
        if let Some(firm) = market.world.registry.firm_mut(id) {
            summary.applications += firm.take_applications().len();
        }
    }
    summary
}

// ─────────────────────────────────────────────────────────────────────────────
// Main simulation entry point
// ─────────────────────────────────────────────────────────────────────────────

/// Run a labour-market simulation and return per-day aggregate statistics.
///
/// Households are linked into a friendship ring, every worker subscribes to
/// every board, and each board is seeded with `vacancies` postings whose
/// wages are log-normally distributed and whose specialisations are drawn
/// uniformly.
///
/// Args:
///     n_households: Number of household agents to create.
///     workers_per_household: Specialising workers per household.
///     n_firms: Number of firm agents posting vacancies.
///     n_boards: Number of job boards.
///     vacancies: Vacancies posted on each board.
///     days: Number of days to simulate.
///     seed: Random seed for reproducibility.
///
/// Returns:
///     A list of :class:`PyDayRecord` objects, one per day.
#[pyfunction]
#[pyo3(signature = (
    n_households=100,
    workers_per_household=2,
    n_firms=20,
    n_boards=2,
    vacancies=200,
    days=365,
    seed=42,
))]
fn run_simulation(
    n_households: usize,
    workers_per_household: usize,
    n_firms: usize,
    n_boards: usize,
    vacancies: u64,
    days: u64,
    seed: u64,
) -> PyResult<Vec<PyDayRecord>> {
    let config = Config {
        seed,
        iterations: days,
        boards: (0..n_boards)
            .map(|i| BoardSpec {
                popularity: Some((i + 1) as f64),
            })
            .collect(),
        ..Config::default()
    };
    let mut market = LabourMarket::new(config).map_err(to_py)?;

    let mut firms = Vec::with_capacity(n_firms);
    for _ in 0..n_firms {
        firms.push(market.world.create("Firm", &params! {}).map_err(to_py)?);
    }

    let wage_dist =
        LogNormal::new(3.0, 0.5).map_err(|e| PyValueError::new_err(e.to_string()))?;
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));
    if !firms.is_empty() {
        for board in market.world.boards.iter_mut() {
            for vacancy_id in 0..vacancies {
                let employer = firms[(vacancy_id as usize) % firms.len()];
                let specialisation = Specialisation::ALL.choose(&mut rng).copied();
                board.register(employer, vacancy_id, wage_dist.sample(&mut rng), specialisation);
            }
        }
    }

    let boards: Vec<u64> = (0..n_boards as u64).collect();
    let mut households = Vec::with_capacity(n_households);
    for _ in 0..n_households {
        let household = market.world.create("Household", &params! {}).map_err(to_py)?;
        households.push(household);

        for _ in 0..workers_per_household {
            let worker = params! {
                "household" => household,
                "reservation_wage" => wage_dist.sample(&mut rng),
                "alpha" => 0.5,
                "search_rate" => 0.8,
                "pi" => 0.5,
                "search_max" => 10usize,
                "application_rate" => 0.5,
                "application_max" => 3usize,
                "search_method" => "Ordered",
                "application_method" => "Ordered",
                "boards" => boards.clone(),
                "skill" => Skill::ElementaryOccupations.level() as u64,
                "max_general_skill" => Skill::ElementaryOccupations.level() as u64,
                "unemployment_limit" => 90u64,
                "training_rate" => 0.1,
            };
            market
                .world
                .create("SpecialisingWorker", &worker)
                .map_err(to_py)?;
        }
    }
    market
        .world
        .registry
        .befriend_ring(&households)
        .map_err(to_py)?;
    market.scheduler.refresh(&mut market.world);

    let mut schedule = Schedule::new();
    market.init(&mut schedule);

    let mut records = Vec::with_capacity(days as usize);
    for _ in 0..days {
        schedule.step(&mut market);
        records.push(record(&mut market, &firms));
    }
    Ok(records)
}

// ─────────────────────────────────────────────────────────────────────────────
// Module definition
// ─────────────────────────────────────────────────────────────────────────────

/// Rust-backed labour-market simulation core.
#[pymodule]
#[pyo3(name = "labour_abm")]
fn labour_abm_module(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<PyDayRecord>()?;
    m.add_function(wrap_pyfunction!(run_simulation, m)?)?;
    Ok(())
}
