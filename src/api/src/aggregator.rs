//! Win-probability aggregation from pairwise comparisons.
//!
//! Turns a qualifying grid into a normalized win-probability distribution,
//! either by querying a pairwise oracle for every pair of drivers or, when no
//! oracle is available, by weighting drivers inversely to grid position.

use std::collections::BTreeMap;

/// Driver id -> qualifying (grid) position.
pub type QualifyingPositions = BTreeMap<String, i64>;

/// Driver id -> win probability, rounded to 3 decimals.
pub type WinProbabilities = BTreeMap<String, f64>;

/// Minimum number of drivers a caller must supply before aggregating.
pub const MIN_DRIVERS: usize = 2;

/// Offset added to the grid position in the no-oracle weighting.
pub const GRID_WEIGHT_OFFSET: f64 = 0.1;

/// Probability substituted for any pair the oracle could not answer.
pub const NEUTRAL_PROBABILITY: f64 = 0.5;

/// Estimates the probability that driver A finishes ahead of driver B.
///
/// Implementations are shared across concurrent requests and must not
/// mutate state per call.
pub trait PairwiseOracle: Send + Sync {
    /// Probability in [0, 1] that the driver starting at `pos_a` finishes
    /// ahead of the driver starting at `pos_b`. `pos_diff` is `pos_a - pos_b`.
    fn probability_ahead(&self, pos_a: i64, pos_b: i64, pos_diff: i64) -> anyhow::Result<f64>;
}

impl<F> PairwiseOracle for F
where
    F: Fn(i64, i64, i64) -> anyhow::Result<f64> + Send + Sync,
{
    fn probability_ahead(&self, pos_a: i64, pos_b: i64, pos_diff: i64) -> anyhow::Result<f64> {
        self(pos_a, pos_b, pos_diff)
    }
}

/// Round to 3 decimal places.
pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

/// Whether the grid is large enough to aggregate.
pub fn has_enough_drivers(positions: &QualifyingPositions) -> bool {
    positions.len() >= MIN_DRIVERS
}

/// Caller-side checks before aggregating: at least two drivers, no empty ids.
pub fn validate_grid(positions: &QualifyingPositions) -> Result<(), String> {
    if !has_enough_drivers(positions) {
        return Err("qualifying_pos must include at least two drivers".to_string());
    }
    if positions.keys().any(|driver| driver.is_empty()) {
        return Err("qualifying_pos driver ids must be non-empty".to_string());
    }
    Ok(())
}

/// Compute the win-probability distribution for a grid.
///
/// With an oracle, every unordered pair is evaluated exactly once and each
/// driver accumulates its expected pairwise wins; scores are then normalized.
/// Without one, the inverse-grid heuristic is used. Never fails: oracle
/// errors count as a coin flip and a non-positive total falls back to a
/// uniform distribution.
pub fn aggregate(
    positions: &QualifyingPositions,
    oracle: Option<&dyn PairwiseOracle>,
) -> WinProbabilities {
    match oracle {
        Some(oracle) => pairwise_distribution(positions, oracle),
        None => grid_weight_distribution(positions),
    }
}

/// Inverse-grid weighting used when no oracle is loaded.
///
/// weight(d) = 1 / (position(d) + 0.1), normalized over all drivers.
pub fn grid_weight_distribution(positions: &QualifyingPositions) -> WinProbabilities {
    let weights: BTreeMap<&String, f64> = positions
        .iter()
        .map(|(driver, &pos)| (driver, 1.0 / (pos as f64 + GRID_WEIGHT_OFFSET)))
        .collect();

    // Positions below zero give negative weights; normalizing those would
    // leave probabilities outside [0, 1].
    let invalid = weights.iter().find(|(_, w)| !(w.is_finite() && **w > 0.0));
    if let Some((driver, &weight)) = invalid {
        tracing::warn!(
            driver = driver.as_str(),
            weight,
            "Grid weight is not positive, using uniform distribution"
        );
        return uniform_distribution(positions);
    }
    let total: f64 = weights.values().sum();

    weights
        .into_iter()
        .map(|(driver, w)| (driver.clone(), round3(w / total)))
        .collect()
}

/// Pairwise aggregation over every unordered pair of drivers.
pub fn pairwise_distribution(
    positions: &QualifyingPositions,
    oracle: &dyn PairwiseOracle,
) -> WinProbabilities {
    let drivers: Vec<(&String, i64)> = positions.iter().map(|(d, &p)| (d, p)).collect();
    let mut scores = vec![0.0_f64; drivers.len()];
    let mut neutral_substitutions = 0usize;
    let mut pairs = 0usize;

    for i in 0..drivers.len() {
        for j in (i + 1)..drivers.len() {
            let (driver_a, pos_a) = drivers[i];
            let (driver_b, pos_b) = drivers[j];
            pairs += 1;

            let p = match query_pair(oracle, driver_a, pos_a, driver_b, pos_b) {
                Some(p) => p,
                None => {
                    neutral_substitutions += 1;
                    NEUTRAL_PROBABILITY
                }
            };

            scores[i] += p;
            scores[j] += 1.0 - p;
        }
    }

    tracing::debug!(
        drivers = drivers.len(),
        pairs,
        neutral_substitutions,
        "Pairwise aggregation complete"
    );

    let total: f64 = scores.iter().sum();
    if total <= 0.0 {
        tracing::warn!(total, "Pairwise scores sum to zero, using uniform distribution");
        return uniform_distribution(positions);
    }

    drivers
        .iter()
        .zip(scores)
        .map(|((driver, _), score)| ((*driver).clone(), round3(score / total)))
        .collect()
}

/// Query the oracle for one pair, returning `None` when the answer is unusable.
fn query_pair(
    oracle: &dyn PairwiseOracle,
    driver_a: &str,
    pos_a: i64,
    driver_b: &str,
    pos_b: i64,
) -> Option<f64> {
    let Some(pos_diff) = pos_a.checked_sub(pos_b) else {
        tracing::warn!(
            driver_a,
            driver_b,
            pos_a,
            pos_b,
            "Grid position difference overflows, treating pair as even"
        );
        return None;
    };

    match oracle.probability_ahead(pos_a, pos_b, pos_diff) {
        Ok(p) if (0.0..=1.0).contains(&p) => Some(p),
        Ok(p) => {
            tracing::warn!(
                driver_a,
                driver_b,
                value = p,
                "Oracle returned an out-of-range probability, treating pair as even"
            );
            None
        }
        Err(e) => {
            tracing::warn!(
                driver_a,
                driver_b,
                error = %e,
                "Oracle failed, treating pair as even"
            );
            None
        }
    }
}

/// Every driver gets 1/N.
pub fn uniform_distribution(positions: &QualifyingPositions) -> WinProbabilities {
    let share = round3(1.0 / positions.len() as f64);
    positions.keys().map(|d| (d.clone(), share)).collect()
}
