use serde::Deserialize;

use crate::models::game_match::{RemainingCups, Side, CUPS_PER_SIDE};

pub const DEFAULT_K_FACTOR: f64 = 120.0;
pub const DEFAULT_INITIAL_RATING: i32 = 1000;

/// Weight of the outcome alone, before any cup margin is applied
const BASE_WEIGHT: f64 = 0.6;
/// Extra weight granted by a full ten-cup margin
const MARGIN_WEIGHT: f64 = 0.4;

/// Tunables of the rating formula
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct EloConfig {
    pub k_factor: f64,
    pub initial_rating: i32,
}

impl Default for EloConfig {
    fn default() -> Self {
        Self {
            k_factor: DEFAULT_K_FACTOR,
            initial_rating: DEFAULT_INITIAL_RATING,
        }
    }
}

/// Logistic win expectation of `player_rating` against `opponent_rating`
pub fn expected_score(player_rating: f64, opponent_rating: f64) -> f64 {
    1.0 / (1.0 + 10f64.powf((opponent_rating - player_rating) / 400.0))
}

/// Rating change for one side of a finished match.
///
/// `player_cups` / `opponent_cups` are the cups still standing on each side and
/// must lie within `0..=10`. Rounds half up, so `-12.5` becomes `-12`.
pub fn rating_delta(
    player_rating: f64,
    opponent_rating: f64,
    did_win: bool,
    player_cups: i32,
    opponent_cups: i32,
    k_factor: f64,
) -> i32 {
    let expected = expected_score(player_rating, opponent_rating);
    let outcome = if did_win { 1.0 } else { 0.0 };
    let margin = (player_cups - opponent_cups).abs() as f64 / CUPS_PER_SIDE as f64;
    let raw = k_factor * (outcome - expected) * (BASE_WEIGHT + MARGIN_WEIGHT * margin);
    (raw + 0.5).floor() as i32
}

/// Mean rating of a roster. An empty roster has no average.
pub fn team_average(ratings: &[i32]) -> Option<f64> {
    if ratings.is_empty() {
        return None;
    }
    let sum: i64 = ratings.iter().map(|r| *r as i64).sum();
    Some(sum as f64 / ratings.len() as f64)
}

/// Deltas for both sides of a match. Each side is computed from its own
/// perspective, so the two values are not necessarily exact negatives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeamDeltas {
    pub team_a: i32,
    pub team_b: i32,
}

impl TeamDeltas {
    pub fn compute(
        average_a: f64,
        average_b: f64,
        winner_a: bool,
        winner_b: bool,
        remaining: RemainingCups,
        config: &EloConfig,
    ) -> Self {
        let team_a = rating_delta(
            average_a,
            average_b,
            winner_a,
            remaining.for_side(Side::A),
            remaining.for_side(Side::B),
            config.k_factor,
        );
        let team_b = rating_delta(
            average_b,
            average_a,
            winner_b,
            remaining.for_side(Side::B),
            remaining.for_side(Side::A),
            config.k_factor,
        );
        Self { team_a, team_b }
    }

    pub fn for_side(&self, side: Side) -> i32 {
        match side {
            Side::A => self.team_a,
            Side::B => self.team_b,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_even_match_even_cups() {
        assert_eq!(rating_delta(1000.0, 1000.0, true, 5, 5, DEFAULT_K_FACTOR), 36);
        assert_eq!(rating_delta(1000.0, 1000.0, false, 5, 5, DEFAULT_K_FACTOR), -36);
    }

    #[test]
    fn test_full_margin_win() {
        assert_eq!(rating_delta(1000.0, 1000.0, true, 10, 0, DEFAULT_K_FACTOR), 60);
        assert_eq!(rating_delta(1000.0, 1000.0, false, 0, 10, DEFAULT_K_FACTOR), -60);
    }

    #[test]
    fn test_expected_score_is_symmetric() {
        let favourite = expected_score(1200.0, 1000.0);
        let underdog = expected_score(1000.0, 1200.0);
        assert!(favourite > 0.5);
        assert!((favourite + underdog - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_favourite_gains_less_than_underdog() {
        let favourite_win = rating_delta(1200.0, 1000.0, true, 5, 0, DEFAULT_K_FACTOR);
        let underdog_win = rating_delta(1000.0, 1200.0, true, 5, 0, DEFAULT_K_FACTOR);
        assert!(favourite_win > 0);
        assert!(underdog_win > favourite_win);
    }

    #[test]
    fn test_rounds_half_up() {
        // k = 25: 25 * -0.5 * 1.0 = -12.5
        assert_eq!(rating_delta(1000.0, 1000.0, false, 0, 10, 25.0), -12);
        // k = 25: 25 * 0.5 * 1.0 = 12.5
        assert_eq!(rating_delta(1000.0, 1000.0, true, 10, 0, 25.0), 13);
    }

    #[test]
    fn test_team_average() {
        assert_eq!(team_average(&[]), None);
        assert_eq!(team_average(&[1000]), Some(1000.0));
        assert_eq!(team_average(&[1000, 1061]), Some(1030.5));
    }

    #[test]
    fn test_team_deltas_use_own_perspective() {
        let remaining = RemainingCups { team_a: 10, team_b: 0 };
        let deltas = TeamDeltas::compute(1000.0, 1000.0, true, false, remaining, &EloConfig::default());
        assert_eq!(deltas, TeamDeltas { team_a: 60, team_b: -60 });

        let uneven = TeamDeltas::compute(1100.0, 1000.0, true, false, RemainingCups { team_a: 3, team_b: 0 }, &EloConfig::default());
        assert!(uneven.team_a > 0);
        assert!(uneven.team_b < 0);
        assert_eq!(uneven.for_side(Side::A), uneven.team_a);
    }
}
