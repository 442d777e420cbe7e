//! End-to-end labour-market scenarios driven through the public API.

use labour_abm::{
    params, AbmError, AgentId, AgentSpec, BoardSpec, Config, JobReference, LabourMarket,
    OrderingKind, Parameters, Query, Scheduler, Skill, Specialisation, World,
};
use labour_abm::{AgentRegistry, AttrValue};

// === FIXTURES ===

fn worker_params(household: AgentId, reservation_wage: f64) -> Parameters {
    params! {
        "household" => household,
        "reservation_wage" => reservation_wage,
        "alpha" => 1.0,
        "search_rate" => 1.0,
        "pi" => 1.0,
        "search_max" => 10usize,
        "application_rate" => 1.0,
        "application_max" => 1usize,
        "search_method" => "Ordered",
        "application_method" => "Ordered",
    }
}

fn with(mut params: Parameters, key: &str, value: impl Into<labour_abm::ParamValue>) -> Parameters {
    params.insert(key.to_string(), value.into());
    params
}

/// One household (id 0), one firm (id 1), three workers (ids 2..=4) on a
/// single board.
fn small_market(ordering: OrderingKind) -> LabourMarket {
    let worker = with(worker_params(0, 10.0), "boards", vec![0u64]);
    let config = Config {
        seed: 7,
        ordering,
        boards: vec![BoardSpec {
            popularity: Some(1.0),
        }],
        population: vec![
            AgentSpec::new("Household", 1, Parameters::new()),
            AgentSpec::new("Firm", 1, Parameters::new()),
            AgentSpec::new("Worker", 3, worker),
        ],
        ..Config::default()
    };
    LabourMarket::new(config).unwrap()
}

fn post(market: &mut LabourMarket, wages: &[f64]) {
    let board = market.world.board_mut(0).unwrap();
    for (vacancy, &wage) in wages.iter().enumerate() {
        board.register(1, vacancy as u64, wage, None);
    }
}

// === SCENARIOS ===

#[test]
fn population_is_built_from_config() {
    let market = small_market(OrderingKind::Insertion);
    let registry = &market.world.registry;

    assert_eq!(registry.agent_ids(), vec![0, 1, 2, 3, 4]);
    assert_eq!(registry.ids_of_type("Worker"), vec![2, 3, 4]);
    assert_eq!(registry.household(0).unwrap().members(), &[2, 3, 4]);
    assert_eq!(market.scheduler.order(), &[0, 1, 2, 3, 4]);
}

#[test]
fn every_worker_applies_to_the_best_vacancy() {
    let mut market = small_market(OrderingKind::Insertion);
    post(&mut market, &[12.0, 30.0, 8.0, 25.0]);

    market.tick();

    assert_eq!(market.day(), 1);
    let firm = market.world.registry.firm(1).unwrap();
    assert_eq!(firm.applications(), &[(1, 2), (1, 3), (1, 4)]);

    // The runner-up stays discovered; the one below the reservation wage was
    // never kept.
    let worker = market.world.registry.worker(2).unwrap();
    let kept: Vec<u64> = worker.jobs().keys().map(|r| r.vacancy_id).collect();
    assert_eq!(kept, vec![0, 3]);
    assert!(!worker.has_seen(&JobReference::new(1, 2)));

    let firm = market.world.registry.firm_mut(1).unwrap();
    assert_eq!(firm.take_applications().len(), 3);
    market.tick();
    assert_eq!(market.world.registry.firm(1).unwrap().applications(), &[(1, 2), (1, 3), (1, 4)]);
}

#[test]
fn krabmaga_run_decays_reservation_wage_weekly() {
    let config = Config {
        population: vec![
            AgentSpec::new("Household", 1, Parameters::new()),
            AgentSpec::new("Worker", 1, worker_params(0, 20.0)),
        ],
        ..Config::default()
    };
    let mut market = LabourMarket::new(config).unwrap();

    market.run(6);
    assert_eq!(market.world.registry.worker(1).unwrap().reservation_wage(), 20.0);

    market.run(8);
    let worker = market.world.registry.worker(1).unwrap();
    assert_eq!(market.day(), 14);
    assert_eq!(worker.reservation_wage(), 18.0);
    assert_eq!(worker.time_unemployed(), 14);
}

#[test]
fn configured_run_covers_every_iteration() {
    let config = Config {
        iterations: 21,
        population: vec![
            AgentSpec::new("Household", 1, Parameters::new()),
            AgentSpec::new("Worker", 1, worker_params(0, 20.0)),
        ],
        ..Config::default()
    };
    let mut market = LabourMarket::new(config).unwrap();

    market.run_configured();

    assert_eq!(market.day(), 21);
    assert_eq!(market.world.registry.worker(1).unwrap().reservation_wage(), 17.0);
}

#[test]
fn unemployment_resets_reservation_wage_to_last_wage() {
    let mut market = small_market(OrderingKind::Insertion);
    market.run(7);
    assert_eq!(market.world.registry.worker(2).unwrap().reservation_wage(), 9.0);

    let worker = market.world.registry.worker_mut(2).unwrap();
    worker.employ(1, 0, 14.0);
    worker.unemploy();
    assert_eq!(worker.reservation_wage(), 14.0);
    assert_eq!(worker.time_unemployed(), 0);
}

#[test]
fn network_search_reads_friends_discoveries() {
    let mut world = World::new(AgentRegistry::standard(), 3);
    let board = world.add_board(Some(1.0));
    let firm = world.create("Firm", &Parameters::new()).unwrap();
    let home = world.create("Household", &Parameters::new()).unwrap();
    let neighbour = world
        .create("Household", &params! { "friends" => vec![home] })
        .unwrap();

    let seeker = world
        .create("Worker", &with(worker_params(home, 15.0), "application_rate", 0.0))
        .unwrap();
    let scout_params = with(
        with(worker_params(neighbour, 0.0), "application_rate", 0.0),
        "boards",
        vec![board as u64],
    );
    let scout = world.create("Worker", &scout_params).unwrap();

    {
        let jobs = world.board_mut(board).unwrap();
        jobs.register(firm, 0, 10.0, None);
        jobs.register(firm, 1, 20.0, None);
        jobs.register(firm, 2, 30.0, None);
    }

    world.step_agent(scout, false);
    assert_eq!(world.registry.worker(scout).unwrap().jobs().len(), 3);

    world.step_agent(seeker, false);
    let found: Vec<u64> = world
        .registry
        .worker(seeker)
        .unwrap()
        .jobs()
        .keys()
        .map(|r| r.vacancy_id)
        .collect();
    assert_eq!(found, vec![1, 2]);
    assert_eq!(world.registry.household(home).unwrap().friends(), &[neighbour]);
}

#[test]
fn specialising_worker_retrains_then_applies() {
    let mut config = Config {
        boards: vec![BoardSpec { popularity: None }],
        population: vec![
            AgentSpec::new("Household", 1, Parameters::new()),
            AgentSpec::new("Firm", 1, Parameters::new()),
        ],
        ..Config::default()
    };
    let worker = with(
        with(
            with(
                with(worker_params(0, 10.0), "alpha", 0.0),
                "boards",
                vec![0u64],
            ),
            "max_general_skill",
            "ElementaryOccupations",
        ),
        "unemployment_limit",
        5u64,
    );
    let worker = with(with(worker, "training_rate", 1.0), "skill", "ElementaryOccupations");
    config
        .population
        .push(AgentSpec::new("SpecialisingWorker", 1, worker));

    let mut market = LabourMarket::new(config).unwrap();
    market
        .world
        .board_mut(0)
        .unwrap()
        .register(1, 0, 50.0, Some(Specialisation::IctProfessional));
    let id = 2;

    for _ in 0..5 {
        market.tick();
    }
    let worker = market.world.registry.worker(id).unwrap();
    assert_eq!(worker.time_unemployed(), 5);
    assert!(worker.jobs().is_empty());
    assert_eq!(
        worker.specialising().unwrap().search_history().get(&Specialisation::IctProfessional),
        Some(&5)
    );
    assert!(market.world.registry.firm(1).unwrap().applications().is_empty());

    market.tick();
    assert!(market.world.registry.worker(id).unwrap().is_training());
    let training = market
        .world
        .registry
        .get_by_attribute(&Query::new().eq("training", true));
    assert_eq!(training.len(), 1);
    assert_eq!(training[0].id(), id);

    for _ in 0..Specialisation::IctProfessional.days_to_specialise() {
        market.tick();
    }
    let worker = market.world.registry.worker(id).unwrap();
    assert!(!worker.is_training());
    assert_eq!(worker.skill(), Skill::Professionals);
    assert!(worker.specialisations().contains(&Specialisation::IctProfessional));

    market.tick();
    assert_eq!(market.world.registry.firm(1).unwrap().applications(), &[(0, id)]);
}

#[test]
fn destroyed_agents_leave_the_schedule_and_their_links() {
    let mut market = small_market(OrderingKind::Insertion);

    market.world.destroy(3);
    market.world.destroy(3);
    market.tick();
    assert_eq!(market.scheduler.order(), &[0, 1, 2, 4]);
    assert_eq!(market.world.registry.household(0).unwrap().members(), &[2, 4]);

    market.world.destroy(0);
    assert_eq!(market.world.registry.worker(2).unwrap().household(), None);
    market.scheduler.refresh(&mut market.world);
    assert_eq!(market.scheduler.order(), &[1, 2, 4]);

    let reused = market
        .world
        .create("Household", &Parameters::new())
        .unwrap();
    assert_eq!(reused, 0);
    market.tick();
    assert_eq!(market.scheduler.order(), &[1, 2, 4, 0]);
}

#[test]
fn attribute_queries_filter_the_population() {
    let market = small_market(OrderingKind::Insertion);
    let registry = &market.world.registry;

    let workers = registry.get_by_attribute(&Query::new().eq("name", "Worker"));
    assert_eq!(workers.len(), 3);

    let choosy = registry.get_by_attribute(
        &Query::new()
            .eq("employed", false)
            .matching("reservation_wage", |v| v.and_then(AttrValue::as_f64) >= Some(10.0)),
    );
    assert_eq!(choosy.len(), 3);

    assert!(registry
        .get_by_attribute(&Query::new().eq("size", 4i64))
        .is_empty());
}

#[test]
fn invalid_population_is_rejected() {
    let config = Config {
        population: vec![AgentSpec::new("Robot", 1, Parameters::new())],
        ..Config::default()
    };
    assert_eq!(
        LabourMarket::new(config).err(),
        Some(AbmError::UnknownAgentType("Robot".into()))
    );

    let mut missing = worker_params(0, 1.0);
    missing.remove("pi");
    let config = Config {
        population: vec![
            AgentSpec::new("Household", 1, Parameters::new()),
            AgentSpec::new("Worker", 1, missing),
        ],
        ..Config::default()
    };
    assert_eq!(
        LabourMarket::new(config).err(),
        Some(AbmError::MissingParameter {
            agent: "Worker".into(),
            key: "pi".into(),
        })
    );

    let config = Config {
        population: vec![
            AgentSpec::new("Household", 1, Parameters::new()),
            AgentSpec::new("Worker", 1, with(worker_params(0, 1.0), "boards", vec![2u64])),
        ],
        ..Config::default()
    };
    assert_eq!(LabourMarket::new(config).err(), Some(AbmError::UnknownBoard(2)));
}

// === DETERMINISM ===

type Snapshot = Vec<(AgentId, f64, Vec<JobReference>, u32)>;

fn snapshot(market: &LabourMarket) -> (Snapshot, Vec<(u64, AgentId)>) {
    let registry = &market.world.registry;
    let workers = registry
        .iter()
        .filter_map(|a| a.as_worker().map(|w| (a.id(), w)))
        .map(|(id, w)| {
            (
                id,
                w.reservation_wage(),
                w.jobs().keys().copied().collect(),
                w.time_unemployed(),
            )
        })
        .collect();
    let applications = registry.firm(1).unwrap().applications().to_vec();
    (workers, applications)
}

fn random_market() -> LabourMarket {
    let worker = with(
        with(
            with(worker_params(0, 10.0), "search_method", "Random"),
            "application_method",
            "Random",
        ),
        "boards",
        vec![0u64],
    );
    let worker = with(with(worker, "search_rate", 0.6), "application_rate", 0.3);
    let config = Config {
        seed: 99,
        ordering: OrderingKind::Random,
        boards: vec![BoardSpec {
            popularity: Some(1.0),
        }],
        population: vec![
            AgentSpec::new("Household", 1, Parameters::new()),
            AgentSpec::new("Firm", 1, Parameters::new()),
            AgentSpec::new("Worker", 6, worker),
        ],
        ..Config::default()
    };
    LabourMarket::new(config).unwrap()
}

#[test]
fn same_seed_same_trajectory() {
    let wages: Vec<f64> = (0..20).map(|i| 5.0 + i as f64).collect();

    let mut a = random_market();
    let mut b = random_market();
    post(&mut a, &wages);
    post(&mut b, &wages);
    a.run(30);
    b.run(30);

    assert_eq!(snapshot(&a), snapshot(&b));
}

#[test]
fn rebuild_replays_from_day_zero() {
    let wages: Vec<f64> = (0..20).map(|i| 5.0 + i as f64).collect();

    let mut market = random_market();
    post(&mut market, &wages);
    market.run(30);
    let first = snapshot(&market);

    market.rebuild().unwrap();
    assert_eq!(market.day(), 0);
    assert!(market.world.board(0).unwrap().is_empty());
    post(&mut market, &wages);
    market.run(30);

    assert_eq!(snapshot(&market), first);
}
