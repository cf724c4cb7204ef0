pub mod config;
pub mod error;
pub mod generator;
pub mod league;
pub mod models;
pub mod poisson;
pub mod sampler;
pub mod schedule;
pub mod simulator;
pub mod sqlite_store;
pub mod standings;
pub mod store;

pub use error::{LeagueError, Result};
pub use models::{Fixture, LeagueTable, MatchResult, Team, TeamStanding};
pub use sampler::Model;
pub use simulator::{Prediction, SimulationConfig, simulate};
