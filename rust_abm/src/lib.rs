/*!
# `labour_abm`: decentralised labour-market simulation core

Worker and household agents look for vacancies on job boards or through
their households' friends, filter them against a reservation wage that
decays while unemployed, apply to the best (or random) ones, and retrain into
specialisations they keep seeing but cannot take.

The crate is split into:

* an agent lifecycle layer: [`IdRegistry`], [`AgentFactory`] and
  [`AgentRegistry`] (create, destroy, attribute queries, reload);
* the search-and-matching engine in [`agents::worker`];
* [`JobBoard`] vacancy directories;
* a [`DayScheduler`] that orders agents each day and resynchronises after
  population changes;
* [`LabourMarket`], the [krABMaga](https://github.com/krABMaga/krABMaga)
  `State` that drives the scheduler for a fixed number of days.

Python bindings are available with the `python` feature.

## Quick start

```no_run
use labour_abm::{params, AgentSpec, BoardSpec, Config, LabourMarket};

let worker = params! {
    "household" => 0u64,
    "reservation_wage" => 20.0,
    "alpha" => 0.5,
    "search_rate" => 0.8,
    "pi" => 0.5,
    "search_max" => 10usize,
    "application_rate" => 0.5,
    "application_max" => 3usize,
    "search_method" => "Ordered",
    "application_method" => "Random",
    "boards" => vec![0u64],
};
let config = Config {
    boards: vec![BoardSpec { popularity: Some(1.0) }],
    population: vec![
        AgentSpec::new("Household", 1, Default::default()),
        AgentSpec::new("Worker", 4, worker),
    ],
    ..Config::default()
};

let mut market = LabourMarket::new(config).unwrap();
market.run(365);
```
*/

pub mod agents;
pub mod config;
pub mod error;
pub mod ids;
pub mod jobs;
pub mod registry;
pub mod sampling;
pub mod scheduler;
pub mod skills;
pub mod state;
pub mod world;

#[cfg(feature = "python")]
mod python;

pub use agents::{Agent, AgentBuilder, AgentKind, AttrValue, BuildContext, Query};
pub use config::{AgentSpec, BoardSpec, Config, ParamValue, Parameters};
pub use error::{AbmError, Result};
pub use ids::{AgentId, IdRegistry};
pub use jobs::{BoardId, JobBoard, JobDetails, JobReference};
pub use registry::{AgentFactory, AgentRegistry};
pub use sampling::AccessMethod;
pub use scheduler::{DayScheduler, OrderingKind, OrderingPolicy, Scheduler};
pub use skills::{Skill, Specialisation};
pub use state::LabourMarket;
pub use world::World;
