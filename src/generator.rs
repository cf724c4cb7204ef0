use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::models::{MatchResult, Team};
use crate::poisson::{sample_poisson, strength_share_lambda};

const HOME_GOAL_BUDGET: f64 = 3.0;
const AWAY_GOAL_BUDGET: f64 = 2.5;

/// Produces a "real" result for a fixture that is actually being played.
pub trait MatchGenerator {
    /// Returns the result with `week` set to 0; the caller stamps the week.
    fn generate(&mut self, home: &Team, away: &Team) -> MatchResult;
}

/// Strength-share Poisson generator: home goals average 3.0 and away goals 2.5
/// times each side's share of the pair's combined strength.
#[derive(Debug, Clone)]
pub struct PoissonGenerator {
    rng: ChaCha8Rng,
}

impl PoissonGenerator {
    pub fn new() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Default for PoissonGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl MatchGenerator for PoissonGenerator {
    fn generate(&mut self, home: &Team, away: &Team) -> MatchResult {
        let lh = strength_share_lambda(home.strength, away.strength, HOME_GOAL_BUDGET);
        let la = strength_share_lambda(away.strength, home.strength, AWAY_GOAL_BUDGET);
        MatchResult {
            week: 0,
            home_team_id: home.id,
            away_team_id: away.id,
            home_goals: sample_poisson(lh, &mut self.rng),
            away_goals: sample_poisson(la, &mut self.rng),
        }
    }
}
