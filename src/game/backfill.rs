use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

use crate::game::rating::{team_average, EloConfig, TeamDeltas};
use crate::game::shot_ledger::ShotLedger;
use crate::models::game_match::{Match, MatchDelta, RemainingCups, RosterEntry};
use crate::models::shot::Shot;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ReplayOutcome {
    pub ratings: BTreeMap<Uuid, i32>,
    pub match_deltas: Vec<MatchDelta>,
    pub skipped: Vec<Uuid>,
}

/// Recompute every rating from scratch by folding the finished matches in
/// chronological order over a fresh rating table.
///
/// Ratings stored on the roster entries are ignored; every known player starts at
/// `config.initial_rating`, and roster members missing from `player_ids` are seeded
/// the same way on first sight. Matches with an empty side are skipped and reported.
pub fn replay(
    player_ids: &[Uuid],
    matches: &[Match],
    shots_by_match: &HashMap<Uuid, Vec<Shot>>,
    config: &EloConfig,
) -> ReplayOutcome {
    let mut ratings: BTreeMap<Uuid, i32> = player_ids
        .iter()
        .map(|id| (*id, config.initial_rating))
        .collect();
    let mut match_deltas = Vec::new();
    let mut skipped = Vec::new();

    // sort_by_key is stable, so matches created in the same instant keep their input order
    let mut finished: Vec<&Match> = matches.iter().filter(|m| m.is_finished()).collect();
    finished.sort_by_key(|m| m.created_at);

    for game_match in finished {
        if game_match.has_empty_side() {
            tracing::warn!("Skipping match {} due to empty team", game_match.id);
            skipped.push(game_match.id);
            continue;
        }
        let average_a = roster_average(&mut ratings, &game_match.team_a, config);
        let average_b = roster_average(&mut ratings, &game_match.team_b, config);
        let (Some(average_a), Some(average_b)) = (average_a, average_b) else {
            continue;
        };

        let remaining = shots_by_match
            .get(&game_match.id)
            .map(|shots| ShotLedger::new(shots.clone()).remaining_cups())
            .unwrap_or_else(RemainingCups::full_rack)
            .clamped();

        let deltas = TeamDeltas::compute(
            average_a,
            average_b,
            game_match.winner_a,
            game_match.winner_b,
            remaining,
            config,
        );

        apply_delta(&mut ratings, &game_match.team_a, deltas.team_a);
        apply_delta(&mut ratings, &game_match.team_b, deltas.team_b);

        match_deltas.push(MatchDelta {
            match_id: game_match.id,
            elo_variation_team_a: deltas.team_a,
            elo_variation_team_b: deltas.team_b,
        });
    }

    ReplayOutcome {
        ratings,
        match_deltas,
        skipped,
    }
}

fn roster_average(
    ratings: &mut BTreeMap<Uuid, i32>,
    roster: &[RosterEntry],
    config: &EloConfig,
) -> Option<f64> {
    let current: Vec<i32> = roster
        .iter()
        .map(|entry| *ratings.entry(entry.player_id).or_insert(config.initial_rating))
        .collect();
    team_average(&current)
}

fn apply_delta(ratings: &mut BTreeMap<Uuid, i32>, roster: &[RosterEntry], delta: i32) {
    for entry in roster {
        if let Some(rating) = ratings.get_mut(&entry.player_id) {
            *rating += delta;
        }
    }
}
