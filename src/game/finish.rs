use uuid::Uuid;

use crate::error::GameError;
use crate::game::rating::{team_average, EloConfig, TeamDeltas};
use crate::game::shot_ledger::ShotLedger;
use crate::models::game_match::{Match, MatchFinish, RemainingCups, RosterEntry, Side};

/// A request to end a match. The store scores it while holding the match lock,
/// so the shot log it reads is the one the match finishes with.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FinishRequest {
    pub match_id: Uuid,
    pub winner: Side,
    pub override_cups: Option<RemainingCups>,
    pub rating: EloConfig,
}

/// Decide everything a finish writes: winner, remaining cups and both deltas.
///
/// Remaining cups are the caller's override when given, else the ledger's count
/// clamped to the rack. Team averages come from the ratings on the roster entries.
pub fn score_finish(
    game_match: &Match,
    ledger: &ShotLedger,
    request: &FinishRequest,
) -> Result<MatchFinish, GameError> {
    if game_match.is_finished() {
        return Err(GameError::consistency(format!(
            "Match {} is already finished",
            game_match.id
        )));
    }
    let (Some(average_a), Some(average_b)) = (
        team_average(&ratings_of(&game_match.team_a)),
        team_average(&ratings_of(&game_match.team_b)),
    ) else {
        return Err(GameError::consistency(format!(
            "Match {} has an empty team and cannot be scored",
            game_match.id
        )));
    };

    let remaining_cups = match request.override_cups {
        Some(cups) => {
            cups.validate()?;
            cups
        }
        None => ledger.remaining_cups().clamped(),
    };

    let deltas = TeamDeltas::compute(
        average_a,
        average_b,
        request.winner == Side::A,
        request.winner == Side::B,
        remaining_cups,
        &request.rating,
    );

    Ok(MatchFinish {
        match_id: game_match.id,
        winner: request.winner,
        remaining_cups,
        elo_variation_team_a: deltas.team_a,
        elo_variation_team_b: deltas.team_b,
    })
}

fn ratings_of(roster: &[RosterEntry]) -> Vec<i32> {
    roster.iter().map(|entry| entry.rating).collect()
}
