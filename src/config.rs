use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::sampler::Model;
use crate::simulator::SimulationConfig;

const CACHE_DIR: &str = "league_sim";
const DB_FILE: &str = "league.sqlite";

pub const DEFAULT_SIMS: usize = 5000;
const MAX_SIMS: usize = 1_000_000;

#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: Option<PathBuf>,
    pub sims: usize,
    pub seed: Option<u64>,
    pub parallel: bool,
    pub deadline: Option<Duration>,
    pub default_model: Model,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            sims: DEFAULT_SIMS,
            seed: None,
            parallel: true,
            deadline: None,
            default_model: Model::Poisson,
        }
    }
}

impl Config {
    /// Reads `.env` (if present) and then the process environment.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        let defaults = Self::default();
        Self {
            db_path: env::var("LEAGUE_DB_PATH")
                .ok()
                .filter(|val| !val.trim().is_empty())
                .map(PathBuf::from)
                .or(defaults.db_path),
            sims: env::var("LEAGUE_SIMS")
                .ok()
                .and_then(|val| val.trim().parse::<usize>().ok())
                .unwrap_or(defaults.sims)
                .clamp(1, MAX_SIMS),
            seed: env::var("LEAGUE_SEED")
                .ok()
                .and_then(|val| val.trim().parse::<u64>().ok()),
            parallel: env_bool("LEAGUE_PARALLEL").unwrap_or(defaults.parallel),
            deadline: env::var("LEAGUE_DEADLINE_MS")
                .ok()
                .and_then(|val| val.trim().parse::<u64>().ok())
                .filter(|ms| *ms > 0)
                .map(Duration::from_millis),
            default_model: env::var("LEAGUE_DEFAULT_MODEL")
                .ok()
                .and_then(|val| Model::from_key(&val).ok())
                .unwrap_or(defaults.default_model),
        }
    }

    /// Simulation settings for one prediction. The deadline clock starts now.
    pub fn simulation(&self, sims: usize) -> SimulationConfig {
        let mut cfg = SimulationConfig::new(sims).parallel(self.parallel);
        if let Some(seed) = self.seed {
            cfg = cfg.with_seed(seed);
        }
        if let Some(budget) = self.deadline {
            cfg = cfg.with_budget(budget);
        }
        cfg
    }
}

fn env_bool(key: &str) -> Option<bool> {
    parse_bool(&env::var(key).ok()?)
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

pub fn default_db_path() -> Option<PathBuf> {
    app_cache_dir().map(|dir| dir.join(DB_FILE))
}

pub fn app_cache_dir() -> Option<PathBuf> {
    // Prefer XDG cache.
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(CACHE_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(CACHE_DIR))
}
