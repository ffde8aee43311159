//! Fan-battle prediction scoring.

use std::collections::BTreeMap;

/// Points available for a predicted position of 0; each place below costs one.
pub const POINTS_CEILING: i64 = 25;

/// Driver id -> predicted finishing position.
pub type BattlePrediction = BTreeMap<String, i64>;

/// Score a fan prediction.
///
/// Each driver earns `max(0, 25 - pos)` points, so P1 is worth 24 and
/// anything from P25 down is worth nothing.
pub fn compute_score(prediction: &BattlePrediction) -> i64 {
    prediction
        .values()
        .map(|&pos| POINTS_CEILING.saturating_sub(pos).max(0))
        .fold(0, i64::saturating_add)
}

/// Check a submission before it is stored.
pub fn validate_submission(user_id: &str) -> Result<(), String> {
    if user_id.is_empty() {
        return Err("user_id required".to_string());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prediction(entries: &[(&str, i64)]) -> BattlePrediction {
        entries.iter().map(|(d, p)| (d.to_string(), *p)).collect()
    }

    #[test]
    fn test_empty_prediction_scores_zero() {
        assert_eq!(compute_score(&BattlePrediction::new()), 0);
    }

    #[test]
    fn test_compute_score() {
        // 24 + 23 + 22
        let p = prediction(&[("VER", 1), ("LEC", 2), ("HAM", 3)]);
        assert_eq!(compute_score(&p), 69);
    }

    #[test]
    fn test_positions_past_ceiling_score_nothing() {
        let p = prediction(&[("VER", 25), ("LEC", 40), ("HAM", 24)]);
        assert_eq!(compute_score(&p), 1);
    }

    #[test]
    fn test_extreme_negative_position_does_not_overflow() {
        let p = prediction(&[("VER", i64::MIN), ("LEC", -10)]);
        assert_eq!(compute_score(&p), i64::MAX);
    }

    #[test]
    fn test_validate_submission() {
        assert!(validate_submission("fan42").is_ok());
        assert_eq!(validate_submission("").unwrap_err(), "user_id required");
    }
}
