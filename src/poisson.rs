use rand::Rng;

/// One uniform draw in [0, 1).
#[inline]
pub fn uniform<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.r#gen::<f64>()
}

/// Poisson draw by multiplying uniforms until the product falls to `e^-lambda`.
///
/// Consumes `k + 1` uniforms for a result of `k`. Non-positive rates score nothing
/// and consume no randomness.
pub fn sample_poisson<R: Rng + ?Sized>(lambda: f64, rng: &mut R) -> u32 {
    if lambda.is_nan() || lambda <= 0.0 {
        return 0;
    }
    let limit = (-lambda).exp();
    let mut k = 0u32;
    let mut p = 1.0;
    while p > limit {
        k += 1;
        p *= uniform(rng);
    }
    k - 1
}

/// Expected goals for one side, proportional to its share of the pair's strength.
pub fn strength_share_lambda(strength: u32, opponent: u32, max_goals: f64) -> f64 {
    let total = f64::from(strength) + f64::from(opponent);
    if total <= 0.0 {
        return max_goals / 2.0;
    }
    f64::from(strength) / total * max_goals
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use super::{sample_poisson, strength_share_lambda};

    #[test]
    fn zero_rate_never_scores() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        assert_eq!(sample_poisson(0.0, &mut rng), 0);
        assert_eq!(sample_poisson(-1.0, &mut rng), 0);
    }

    #[test]
    fn sample_mean_tracks_rate() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let n = 20_000;
        let total: u64 = (0..n).map(|_| u64::from(sample_poisson(1.7, &mut rng))).sum();
        let mean = total as f64 / n as f64;
        assert!((mean - 1.7).abs() < 0.06, "mean {mean}");
    }

    #[test]
    fn equal_strengths_split_goal_budget() {
        assert!((strength_share_lambda(75, 75, 3.0) - 1.5).abs() < 1e-12);
        assert!((strength_share_lambda(100, 50, 2.5) - 2.5 * 2.0 / 3.0).abs() < 1e-12);
    }
}
