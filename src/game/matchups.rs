use std::collections::HashMap;
use uuid::Uuid;

use crate::models::game_match::{Match, RosterEntry};
use crate::models::matchup::{MatchupStats, Matchups};
use crate::models::shot::Shot;

#[derive(Debug, Default, Clone, Copy)]
struct ShotTally {
    hits: u32,
    total: u32,
}

/// Keeps aggregates in first-encounter order so the final sort can stay stable
#[derive(Debug, Default)]
struct MatchupTable {
    index: HashMap<Uuid, usize>,
    entries: Vec<MatchupStats>,
}

impl MatchupTable {
    fn record(&mut self, other: &RosterEntry, won: bool, shots: ShotTally) {
        let position = match self.index.get(&other.player_id) {
            Some(position) => *position,
            None => {
                self.entries.push(MatchupStats::new(other.player_id, other.name.clone()));
                self.index.insert(other.player_id, self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        let stats = &mut self.entries[position];
        stats.games += 1;
        if won {
            stats.wins += 1;
        } else {
            stats.losses += 1;
        }
        stats.shots_hit += shots.hits;
        stats.shots_total += shots.total;
    }

    fn into_sorted(mut self) -> Vec<MatchupStats> {
        // Stable: equal game counts keep first-encounter order
        self.entries.sort_by(|a, b| b.games.cmp(&a.games));
        self.entries
    }
}

/// Head-to-head and teammate aggregates for `player_id`.
///
/// `matches` must be ordered newest first; only finished matches the player took part
/// in are counted. Every opponent and partner entry is credited with the queried
/// player's own shots in the shared match, not with the other player's shots.
pub fn compute_matchups(player_id: Uuid, matches: &[Match], player_shots: &[Shot]) -> Matchups {
    let mut shots_by_match: HashMap<Uuid, ShotTally> = HashMap::new();
    for shot in player_shots.iter().filter(|s| s.player_id == player_id) {
        let tally = shots_by_match.entry(shot.match_id).or_default();
        tally.total += 1;
        if shot.effect.is_hit() {
            tally.hits += 1;
        }
    }

    let mut opponents = MatchupTable::default();
    let mut partners = MatchupTable::default();

    for game_match in matches.iter().filter(|m| m.is_finished()) {
        let Some(side) = game_match.side_of(player_id) else {
            continue;
        };
        let won = game_match.is_winner(side);
        let shots = shots_by_match.get(&game_match.id).copied().unwrap_or_default();

        for opponent in game_match.roster(side.opponent()) {
            opponents.record(opponent, won, shots);
        }
        for mate in game_match
            .roster(side)
            .iter()
            .filter(|mate| mate.player_id != player_id)
        {
            partners.record(mate, won, shots);
        }
    }

    Matchups {
        by_opponents: opponents.into_sorted(),
        by_partners: partners.into_sorted(),
    }
}
