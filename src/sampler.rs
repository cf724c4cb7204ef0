use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};
use serde::{Deserialize, Serialize};

use crate::error::LeagueError;
use crate::models::{LeagueTable, Team};
use crate::poisson::{sample_poisson, strength_share_lambda, uniform};

// Strength-share Poisson: goal budgets split by the pair's strength ratio.
const POISSON_HOME_GOALS: f64 = 3.0;
const POISSON_AWAY_GOALS: f64 = 2.5;

// Strength / STRENGTH_SCALE is the base scoring rate for the independent-rate models.
const STRENGTH_SCALE: f64 = 50.0;
const BIVARIATE_SHARED: f64 = 0.3;
const ZERO_INFLATION: f64 = 0.12;
const JITTER_SPAN: f64 = 0.2;
const NOISE_STDDEV: f64 = 0.1;

// Logistic coefficients on (home, away) goals-per-game.
const LOGIT_B0: f64 = 0.1;
const LOGIT_B1: f64 = 0.05;
const LOGIT_B2: f64 = -0.03;

#[derive(Debug, Clone, Copy)]
pub struct EloConfig {
    pub k: f64,
    pub base_rating: f64,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k: 20.0,
            base_rating: 1500.0,
        }
    }
}

/// Closed set of outcome models. Selected by key at the edges (`"elo"`, `"bt"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Model {
    Poisson,
    Elo,
    BradleyTerry,
    Logistic,
    Mlp,
    BivariatePoisson,
    ZeroInflatedPoisson,
    JitteredPoisson,
    NoisyPoisson,
}

impl Model {
    pub const ALL: [Model; 9] = [
        Model::Poisson,
        Model::Elo,
        Model::BradleyTerry,
        Model::Logistic,
        Model::Mlp,
        Model::BivariatePoisson,
        Model::ZeroInflatedPoisson,
        Model::JitteredPoisson,
        Model::NoisyPoisson,
    ];

    pub fn key(self) -> &'static str {
        match self {
            Model::Poisson => "poisson",
            Model::Elo => "elo",
            Model::BradleyTerry => "bt",
            Model::Logistic => "logistic",
            Model::Mlp => "mlp",
            Model::BivariatePoisson => "bivariate",
            Model::ZeroInflatedPoisson => "zip",
            Model::JitteredPoisson => "jitter",
            Model::NoisyPoisson => "noise",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Model::Poisson => "Poisson Monte Carlo",
            Model::Elo => "Elo Monte Carlo",
            Model::BradleyTerry => "Bradley-Terry Monte Carlo",
            Model::Logistic => "Logistic Regression MC",
            Model::Mlp => "MLP Neural Net MC",
            Model::BivariatePoisson => "Bivariate Poisson",
            Model::ZeroInflatedPoisson => "Zero-Inflated Poisson",
            Model::JitteredPoisson => "Jittered Poisson",
            Model::NoisyPoisson => "Noisy Poisson",
        }
    }

    /// Resolves a boundary key. An empty key means the default Poisson model.
    pub fn from_key(key: &str) -> Result<Self, LeagueError> {
        let k = key.trim().to_ascii_lowercase();
        if k.is_empty() {
            return Ok(Model::Poisson);
        }
        Model::ALL
            .into_iter()
            .find(|m| m.key() == k)
            .ok_or_else(|| LeagueError::UnknownModel(key.to_string()))
    }

    /// Fresh per-trial sampler. Elo ratings start at the base rating for every team.
    pub fn trial<'a>(self, teams: impl IntoIterator<Item = &'a Team>) -> TrialSampler {
        let ratings = match self {
            Model::Elo => {
                let cfg = EloConfig::default();
                teams
                    .into_iter()
                    .map(|t| (t.id, cfg.base_rating))
                    .collect()
            }
            _ => HashMap::new(),
        };
        TrialSampler {
            model: self,
            elo: EloConfig::default(),
            ratings,
        }
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Model {
    type Err = LeagueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Model::from_key(s)
    }
}

/// Sampler state scoped to one simulated season.
///
/// Only the Elo model carries state (ratings updated after every fixture); the other
/// models are pure functions of their inputs and the random stream.
#[derive(Debug, Clone)]
pub struct TrialSampler {
    model: Model,
    elo: EloConfig,
    ratings: HashMap<u32, f64>,
}

impl TrialSampler {
    pub fn rating(&self, team_id: u32) -> Option<f64> {
        self.ratings.get(&team_id).copied()
    }

    /// Draws one score line for `home` vs `away`.
    ///
    /// `table` is the trial's current simulated standings; only table-driven models
    /// read it.
    pub fn sample<R: Rng + ?Sized>(
        &mut self,
        home: &Team,
        away: &Team,
        table: &LeagueTable,
        rng: &mut R,
    ) -> (u32, u32) {
        match self.model {
            Model::Poisson => {
                let lh = strength_share_lambda(home.strength, away.strength, POISSON_HOME_GOALS);
                let la = strength_share_lambda(away.strength, home.strength, POISSON_AWAY_GOALS);
                let hg = sample_poisson(lh, rng);
                let ag = sample_poisson(la, rng);
                (hg, ag)
            }
            Model::Elo => self.sample_elo(home.id, away.id, rng),
            Model::BradleyTerry => {
                let p_home = bradley_terry(home.strength, away.strength);
                binary(uniform(rng) < p_home)
            }
            Model::Logistic => {
                let p_home = logistic_home_prob(
                    goals_per_game(table, home.id),
                    goals_per_game(table, away.id),
                );
                binary(uniform(rng) < p_home)
            }
            Model::Mlp => {
                let probs = predict_outcome(f64::from(home.strength), f64::from(away.strength));
                let r = uniform(rng);
                if r < probs.home {
                    (1, 0)
                } else if r < probs.home + probs.draw {
                    (1, 1)
                } else {
                    (0, 1)
                }
            }
            Model::BivariatePoisson => {
                let hg = sample_poisson(base_rate(home) + BIVARIATE_SHARED, rng);
                let ag = sample_poisson(base_rate(away) + BIVARIATE_SHARED, rng);
                (hg, ag)
            }
            Model::ZeroInflatedPoisson => {
                if uniform(rng) < ZERO_INFLATION {
                    return (0, 0);
                }
                let hg = sample_poisson(base_rate(home), rng);
                let ag = sample_poisson(base_rate(away), rng);
                (hg, ag)
            }
            Model::JitteredPoisson => {
                let lh = base_rate(home) + JITTER_SPAN * uniform(rng);
                let hg = sample_poisson(lh, rng);
                let la = base_rate(away) + JITTER_SPAN * uniform(rng);
                let ag = sample_poisson(la, rng);
                (hg, ag)
            }
            Model::NoisyPoisson => {
                let z: f64 = StandardNormal.sample(rng);
                let boost = NOISE_STDDEV * z;
                let hg = sample_poisson(base_rate(home) + boost, rng);
                let ag = sample_poisson(base_rate(away) + boost, rng);
                (hg, ag)
            }
        }
    }

    fn sample_elo<R: Rng + ?Sized>(&mut self, home: u32, away: u32, rng: &mut R) -> (u32, u32) {
        let base = self.elo.base_rating;
        let ra = *self.ratings.entry(home).or_insert(base);
        let rb = *self.ratings.entry(away).or_insert(base);
        let ea = expected_score(ra, rb);
        let eb = 1.0 - ea;

        // No draws: one uniform decides the winner.
        let (hg, ag) = binary(uniform(rng) < ea);

        let k = self.elo.k;
        self.ratings.insert(home, ra + k * (f64::from(hg) - ea));
        self.ratings.insert(away, rb + k * (f64::from(ag) - eb));
        (hg, ag)
    }
}

fn binary(home_wins: bool) -> (u32, u32) {
    if home_wins { (1, 0) } else { (0, 1) }
}

fn base_rate(team: &Team) -> f64 {
    f64::from(team.strength) / STRENGTH_SCALE
}

/// Goals scored per game so far, with `played + 1` so an unplayed team reads 0.
fn goals_per_game(table: &LeagueTable, team_id: u32) -> f64 {
    table
        .get(team_id)
        .map(|row| f64::from(row.goals_for) / f64::from(row.played + 1))
        .unwrap_or(0.0)
}

/// Elo expected score of `r_a` against `r_b`.
pub fn expected_score(r_a: f64, r_b: f64) -> f64 {
    1.0 / (1.0 + 10.0_f64.powf((r_b - r_a) / 400.0))
}

pub fn bradley_terry(home_strength: u32, away_strength: u32) -> f64 {
    let (sa, sb) = (f64::from(home_strength), f64::from(away_strength));
    if sa + sb <= 0.0 {
        return 0.5;
    }
    sa / (sa + sb)
}

pub fn logistic_home_prob(home_gpg: f64, away_gpg: f64) -> f64 {
    let x = LOGIT_B0 + LOGIT_B1 * home_gpg + LOGIT_B2 * away_gpg;
    1.0 / (1.0 + (-x).exp())
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OutcomeProbs {
    pub home: f64,
    pub draw: f64,
    pub away: f64,
}

/// Fixed-weight 2-2-3 network: strengths scaled to [0, 1], ReLU hidden layer,
/// softmax over (home win, draw, away win).
pub fn predict_outcome(home_strength: f64, away_strength: f64) -> OutcomeProbs {
    let hs = home_strength / 100.0;
    let aw = away_strength / 100.0;

    let h1 = (0.8 * hs - 0.5 * aw + 0.1).max(0.0);
    let h2 = (-0.3 * hs + 0.9 * aw - 0.2).max(0.0);

    let out_h = 1.2 * h1 - 0.7 * h2 + 0.2;
    let out_d = 0.5 * h1 + 0.5 * h2 + 0.1;
    let out_a = -0.6 * h1 + 1.3 * h2 + 0.2;

    let (eh, ed, ea) = (out_h.exp(), out_d.exp(), out_a.exp());
    let sum = eh + ed + ea;
    OutcomeProbs {
        home: eh / sum,
        draw: ed / sum,
        away: ea / sum,
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{Model, bradley_terry, expected_score, logistic_home_prob, predict_outcome};
    use crate::error::LeagueError;
    use crate::models::{LeagueTable, Team};
    use crate::standings::table_for_teams;

    fn pair() -> (Team, Team) {
        (Team::new(1, "Home", 80), Team::new(2, "Away", 60))
    }

    #[test]
    fn keys_round_trip() {
        for model in Model::ALL {
            assert_eq!(Model::from_key(model.key()).unwrap(), model);
        }
        assert_eq!(Model::from_key("").unwrap(), Model::Poisson);
        assert_eq!(" ELO ".parse::<Model>().unwrap(), Model::Elo);
        assert_eq!(
            Model::from_key("xgboost").unwrap_err(),
            LeagueError::UnknownModel("xgboost".to_string())
        );
    }

    #[test]
    fn elo_expectation_is_symmetric() {
        assert!((expected_score(1500.0, 1500.0) - 0.5).abs() < 1e-12);
        let a = expected_score(1600.0, 1400.0);
        let b = expected_score(1400.0, 1600.0);
        assert!((a + b - 1.0).abs() < 1e-12);
        assert!(a > 0.75);
    }

    #[test]
    fn elo_ratings_are_zero_sum_within_a_trial() {
        let (home, away) = pair();
        let table = table_for_teams(&[home.clone(), away.clone()]).unwrap();
        let mut trial = Model::Elo.trial([&home, &away]);
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..25 {
            trial.sample(&home, &away, &table, &mut rng);
        }
        let total = trial.rating(1).unwrap() + trial.rating(2).unwrap();
        assert!((total - 3000.0).abs() < 1e-9);
        assert!((trial.rating(1).unwrap() - 1500.0).abs() > 0.0);
    }

    #[test]
    fn binary_models_never_draw() {
        let (home, away) = pair();
        let table = table_for_teams(&[home.clone(), away.clone()]).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for model in [Model::Elo, Model::BradleyTerry, Model::Logistic] {
            let mut trial = model.trial([&home, &away]);
            for _ in 0..200 {
                let (h, a) = trial.sample(&home, &away, &table, &mut rng);
                assert!(matches!((h, a), (1, 0) | (0, 1)), "{model:?} gave {h}-{a}");
            }
        }
    }

    #[test]
    fn bradley_terry_uses_strength_share() {
        assert!((bradley_terry(100, 1) - 100.0 / 101.0).abs() < 1e-12);
        assert!((bradley_terry(0, 0) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn logistic_base_probability() {
        let p = logistic_home_prob(0.0, 0.0);
        assert!((p - 1.0 / (1.0 + (-0.1_f64).exp())).abs() < 1e-12);
        assert!(logistic_home_prob(3.0, 0.0) > p);
        assert!(logistic_home_prob(0.0, 3.0) < p);
    }

    #[test]
    fn mlp_probabilities_are_normalized() {
        for (h, a) in [(50.0, 100.0), (75.0, 75.0), (100.0, 50.0)] {
            let p = predict_outcome(h, a);
            assert!((p.home + p.draw + p.away - 1.0).abs() < 1e-12);
        }
        let strong_home = predict_outcome(100.0, 50.0);
        let strong_away = predict_outcome(50.0, 100.0);
        assert!(strong_home.home > strong_away.home);
        assert!(strong_away.away > strong_home.away);
    }

    #[test]
    fn mlp_maps_categories_to_goal_lines() {
        let (home, away) = pair();
        let table = LeagueTable::default();
        let mut trial = Model::Mlp.trial([&home, &away]);
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        for _ in 0..300 {
            let score = trial.sample(&home, &away, &table, &mut rng);
            assert!(matches!(score, (1, 0) | (1, 1) | (0, 1)));
        }
    }

    #[test]
    fn zero_inflated_produces_goalless_draws_often() {
        let (home, away) = pair();
        let table = LeagueTable::default();
        let mut trial = Model::ZeroInflatedPoisson.trial([&home, &away]);
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let n = 5_000;
        let nil_nil = (0..n)
            .filter(|_| trial.sample(&home, &away, &table, &mut rng) == (0, 0))
            .count();
        // 12% forced plus e^-(1.6+1.2) ~ 6% of the rest.
        let rate = nil_nil as f64 / n as f64;
        assert!(rate > 0.13 && rate < 0.22, "rate {rate}");
    }

    fn mean_goals(model: Model, seed: u64) -> (f64, f64) {
        let (home, away) = pair();
        let table = LeagueTable::default();
        let mut trial = model.trial([&home, &away]);
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let n = 20_000;
        let (mut hg, mut ag) = (0u64, 0u64);
        for _ in 0..n {
            let (h, a) = trial.sample(&home, &away, &table, &mut rng);
            hg += u64::from(h);
            ag += u64::from(a);
        }
        (hg as f64 / n as f64, ag as f64 / n as f64)
    }

    #[test]
    fn poisson_splits_three_and_two_and_a_half_goals_by_strength_share() {
        // 80 vs 60: 80/140 * 3.0 and 60/140 * 2.5.
        let (h, a) = mean_goals(Model::Poisson, 21);
        assert!((h - 80.0 / 140.0 * 3.0).abs() < 0.05, "home {h}");
        assert!((a - 60.0 / 140.0 * 2.5).abs() < 0.05, "away {a}");
    }

    #[test]
    fn bivariate_adds_shared_term_to_strength_rate() {
        // 80/50 + 0.3 and 60/50 + 0.3.
        let (h, a) = mean_goals(Model::BivariatePoisson, 22);
        assert!((h - 1.9).abs() < 0.05, "home {h}");
        assert!((a - 1.5).abs() < 0.05, "away {a}");
    }

    #[test]
    fn jitter_raises_rate_by_a_tenth_on_average() {
        // strength/50 plus 0.2 * U(0, 1), mean 0.1.
        let (h, a) = mean_goals(Model::JitteredPoisson, 23);
        assert!((h - 1.7).abs() < 0.05, "home {h}");
        assert!((a - 1.3).abs() < 0.05, "away {a}");
    }

    #[test]
    fn same_seed_same_scores() {
        let (home, away) = pair();
        let table = table_for_teams(&[home.clone(), away.clone()]).unwrap();
        for model in Model::ALL {
            let mut a = model.trial([&home, &away]);
            let mut b = model.trial([&home, &away]);
            let mut ra = ChaCha8Rng::seed_from_u64(77);
            let mut rb = ChaCha8Rng::seed_from_u64(77);
            for _ in 0..20 {
                assert_eq!(
                    a.sample(&home, &away, &table, &mut ra),
                    b.sample(&home, &away, &table, &mut rb)
                );
            }
        }
    }
}
