use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LeagueError, Result};
use crate::models::{Fixture, LeagueTable, Team};
use crate::sampler::Model;
use crate::standings::{apply_result, champion};

#[derive(Debug, Clone, Default)]
pub struct SimulationConfig {
    pub trials: usize,
    /// Base seed. Trial `i` draws from stream `i` of this seed, so results do not
    /// depend on how trials are spread over threads.
    pub seed: Option<u64>,
    pub parallel: bool,
    pub deadline: Option<Instant>,
    pub cancel: Option<Arc<AtomicBool>>,
}

impl SimulationConfig {
    pub fn new(trials: usize) -> Self {
        Self {
            trials,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.deadline = Some(Instant::now() + budget);
        self
    }

    pub fn with_cancel(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    fn should_stop(&self) -> bool {
        if let Some(flag) = &self.cancel {
            if flag.load(Ordering::Relaxed) {
                return true;
            }
        }
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub model: String,
    pub sims: usize,
    /// Champion share per team. Teams that never finished top are absent.
    pub probs: BTreeMap<u32, f64>,
    #[serde(default)]
    pub team_names: BTreeMap<u32, String>,
}

impl Prediction {
    pub fn probability(&self, team_id: u32) -> f64 {
        self.probs.get(&team_id).copied().unwrap_or(0.0)
    }

    /// Highest-probability team; ties go to the lower id.
    pub fn favourite(&self) -> Option<(u32, f64)> {
        self.probs
            .iter()
            .fold(None, |best: Option<(u32, f64)>, (id, p)| match best {
                Some((_, bp)) if bp >= *p => best,
                _ => Some((*id, *p)),
            })
    }
}

/// Monte Carlo champion estimate: plays out `remaining` `cfg.trials` times on
/// independent copies of `table` and counts who finishes top.
///
/// Every team named by a fixture must be in `teams` and in `table`. With nothing
/// left to play the current leader is certain and no trials run.
pub fn simulate(
    teams: &[Team],
    table: &LeagueTable,
    remaining: &[Fixture],
    model: Model,
    cfg: &SimulationConfig,
) -> Result<Prediction> {
    if cfg.trials == 0 {
        return Err(LeagueError::InvalidTrials);
    }
    if table.is_empty() {
        return Err(LeagueError::EmptyTable);
    }
    let roster: HashMap<u32, &Team> = teams.iter().map(|t| (t.id, t)).collect();
    check_fixture_teams(&roster, table, remaining)?;

    let team_names = teams.iter().map(|t| (t.id, t.name.clone())).collect();

    if remaining.is_empty() {
        let leader = champion(table)?;
        info!(model = model.key(), leader, "season complete, no trials needed");
        return Ok(Prediction {
            model: model.name().to_string(),
            sims: cfg.trials,
            probs: BTreeMap::from([(leader, 1.0)]),
            team_names,
        });
    }

    let seed = cfg.seed.unwrap_or_else(rand::random);
    info!(
        model = model.key(),
        trials = cfg.trials,
        fixtures = remaining.len(),
        parallel = cfg.parallel,
        "starting season simulation"
    );
    let started = Instant::now();

    let play = |trial: usize| -> Result<u32> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(trial as u64);
        play_out(teams, &roster, table, remaining, model, &mut rng)
    };

    let winners: Vec<u32> = if cfg.parallel {
        let completed = AtomicUsize::new(0);
        let out = (0..cfg.trials)
            .into_par_iter()
            .map(|trial| {
                if cfg.should_stop() {
                    return Err(LeagueError::Cancelled {
                        completed: completed.load(Ordering::Relaxed),
                    });
                }
                let champ = play(trial)?;
                completed.fetch_add(1, Ordering::Relaxed);
                Ok(champ)
            })
            .collect::<Result<Vec<_>>>();
        if out.is_err() {
            warn!(
                completed = completed.load(Ordering::Relaxed),
                "season simulation stopped early"
            );
        }
        out?
    } else {
        let mut out = Vec::with_capacity(cfg.trials);
        for trial in 0..cfg.trials {
            if cfg.should_stop() {
                warn!(completed = trial, "season simulation stopped early");
                return Err(LeagueError::Cancelled { completed: trial });
            }
            out.push(play(trial)?);
        }
        out
    };

    let mut wins: HashMap<u32, usize> = HashMap::new();
    for id in winners {
        *wins.entry(id).or_default() += 1;
    }
    let total = cfg.trials as f64;
    let probs = wins
        .into_iter()
        .map(|(id, count)| (id, count as f64 / total))
        .collect();

    let elapsed_ms = started.elapsed().as_millis() as u64;
    debug!(elapsed_ms, "season simulation done");
    Ok(Prediction {
        model: model.name().to_string(),
        sims: cfg.trials,
        probs,
        team_names,
    })
}

/// One trial: plays every fixture in order on a private copy of the table.
fn play_out(
    teams: &[Team],
    roster: &HashMap<u32, &Team>,
    table: &LeagueTable,
    remaining: &[Fixture],
    model: Model,
    rng: &mut ChaCha8Rng,
) -> Result<u32> {
    let mut sim_table = table.clone();
    let mut sampler = model.trial(teams);
    for fixture in remaining {
        let (Some(home), Some(away)) = (
            roster.get(&fixture.home_team_id),
            roster.get(&fixture.away_team_id),
        ) else {
            return Err(LeagueError::UnknownTeams {
                ids: vec![fixture.home_team_id, fixture.away_team_id],
            });
        };
        let (hg, ag) = sampler.sample(home, away, &sim_table, rng);
        apply_result(&mut sim_table, &fixture.with_score(hg, ag))?;
    }
    champion(&sim_table)
}

fn check_fixture_teams(
    roster: &HashMap<u32, &Team>,
    table: &LeagueTable,
    remaining: &[Fixture],
) -> Result<()> {
    let mut missing = BTreeSet::new();
    for f in remaining {
        for id in [f.home_team_id, f.away_team_id] {
            if !roster.contains_key(&id) || !table.contains(id) {
                missing.insert(id);
            }
        }
    }
    if missing.is_empty() {
        Ok(())
    } else {
        Err(LeagueError::UnknownTeams {
            ids: missing.into_iter().collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::AtomicBool;
    use std::time::Duration;

    use super::{Prediction, SimulationConfig, simulate};
    use crate::error::LeagueError;
    use crate::models::{Fixture, Team};
    use crate::sampler::Model;
    use crate::standings::table_for_teams;

    fn league() -> (Vec<Team>, Vec<Fixture>) {
        let teams = vec![
            Team::new(1, "A", 90),
            Team::new(2, "B", 70),
            Team::new(3, "C", 55),
        ];
        let fixtures = vec![
            Fixture::new(1, 1, 2),
            Fixture::new(2, 2, 3),
            Fixture::new(3, 3, 1),
        ];
        (teams, fixtures)
    }

    #[test]
    fn probabilities_sum_to_one() {
        let (teams, fixtures) = league();
        let table = table_for_teams(&teams).unwrap();
        for model in Model::ALL {
            let cfg = SimulationConfig::new(400).with_seed(1);
            let pred = simulate(&teams, &table, &fixtures, model, &cfg).unwrap();
            let sum: f64 = pred.probs.values().sum();
            assert!((sum - 1.0).abs() < 1e-9, "{model:?} sums to {sum}");
            assert!(pred.probs.values().all(|p| *p > 0.0));
        }
    }

    #[test]
    fn seeded_runs_match_across_parallelism() {
        let (teams, fixtures) = league();
        let table = table_for_teams(&teams).unwrap();
        let seq = SimulationConfig::new(300).with_seed(99);
        let par = SimulationConfig::new(300).with_seed(99).parallel(true);
        let a = simulate(&teams, &table, &fixtures, Model::Elo, &seq).unwrap();
        let b = simulate(&teams, &table, &fixtures, Model::Elo, &par).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn caller_table_is_not_mutated() {
        let (teams, fixtures) = league();
        let table = table_for_teams(&teams).unwrap();
        let before = table.clone();
        let cfg = SimulationConfig::new(50).with_seed(3);
        simulate(&teams, &table, &fixtures, Model::Poisson, &cfg).unwrap();
        assert_eq!(table, before);
    }

    #[test]
    fn cancelled_flag_stops_before_first_trial() {
        let (teams, fixtures) = league();
        let table = table_for_teams(&teams).unwrap();
        let flag = Arc::new(AtomicBool::new(true));
        let cfg = SimulationConfig::new(10).with_cancel(flag);
        assert_eq!(
            simulate(&teams, &table, &fixtures, Model::Poisson, &cfg).unwrap_err(),
            LeagueError::Cancelled { completed: 0 }
        );
    }

    #[test]
    fn expired_budget_is_reported() {
        let (teams, fixtures) = league();
        let table = table_for_teams(&teams).unwrap();
        let cfg = SimulationConfig::new(10).with_budget(Duration::ZERO).parallel(true);
        assert!(matches!(
            simulate(&teams, &table, &fixtures, Model::Poisson, &cfg),
            Err(LeagueError::Cancelled { .. })
        ));
    }

    #[test]
    fn favourite_prefers_highest_then_lowest_id() {
        let pred = Prediction {
            model: "x".to_string(),
            sims: 4,
            probs: [(3, 0.25), (1, 0.375), (2, 0.375)].into_iter().collect(),
            team_names: Default::default(),
        };
        assert_eq!(pred.favourite(), Some((1, 0.375)));
        assert_eq!(pred.probability(9), 0.0);
    }
}
