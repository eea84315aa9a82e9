use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::db::store::MatchStore;
use crate::error::GameError;
use crate::game::finish::{score_finish, FinishRequest};
use crate::game::shot_ledger::{check_shot_against_match, ShotLedger};
use crate::models::common::SortOrder;
use crate::models::game_match::{
    CleanupReport, Match, MatchDelta, MatchFilter, MatchFinish, MatchStatus, RosterEntry, Side,
};
use crate::models::player::Player;
use crate::models::shot::{NewShot, Shot, ShotFilter};

#[derive(Debug, Clone)]
struct StoredMatch {
    id: Uuid,
    status: MatchStatus,
    team_a: Vec<Uuid>,
    team_b: Vec<Uuid>,
    winner_a: bool,
    winner_b: bool,
    elo_variation_team_a: Option<i32>,
    elo_variation_team_b: Option<i32>,
    created_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
struct StoreState {
    players: Vec<Player>,
    matches: Vec<StoredMatch>,
    shots: Vec<Shot>,
}

impl StoreState {
    fn player(&self, player_id: Uuid) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    fn stored_match(&self, match_id: Uuid) -> Option<&StoredMatch> {
        self.matches.iter().find(|m| m.id == match_id)
    }

    fn roster(&self, player_ids: &[Uuid]) -> Vec<RosterEntry> {
        player_ids
            .iter()
            .filter_map(|id| self.player(*id))
            .map(|p| RosterEntry {
                player_id: p.id,
                name: p.name.clone(),
                rating: p.rating,
            })
            .collect()
    }

    fn materialize(&self, stored: &StoredMatch) -> Match {
        Match {
            id: stored.id,
            status: stored.status,
            team_a: self.roster(&stored.team_a),
            team_b: self.roster(&stored.team_b),
            winner_a: stored.winner_a,
            winner_b: stored.winner_b,
            elo_variation_team_a: stored.elo_variation_team_a,
            elo_variation_team_b: stored.elo_variation_team_b,
            created_at: stored.created_at,
            finished_at: stored.finished_at,
        }
    }

    fn shots_of(&self, match_id: Uuid) -> Vec<Shot> {
        self.shots
            .iter()
            .filter(|s| s.match_id == match_id)
            .cloned()
            .collect()
    }

    fn add_to_rating(&mut self, player_ids: &[Uuid], delta: i32) {
        for player in self.players.iter_mut().filter(|p| player_ids.contains(&p.id)) {
            player.rating += delta;
        }
    }
}

/// Process-local store used by the test suite and for running without PostgreSQL.
///
/// The write lock is the per-match lock of every operation. Multi-row writes work on
/// a copy of the state and swap it in only when they completed, so a failed write
/// leaves nothing behind.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MatchStore for InMemoryStore {
    async fn create_player(&self, name: &str, rating: i32) -> Result<Player, GameError> {
        let mut state = self.state.write().await;
        let player = Player {
            id: Uuid::new_v4(),
            name: name.to_string(),
            rating,
            created_at: Utc::now(),
        };
        state.players.push(player.clone());
        Ok(player)
    }

    async fn get_player(&self, player_id: Uuid) -> Result<Option<Player>, GameError> {
        let state = self.state.read().await;
        Ok(state.player(player_id).cloned())
    }

    async fn list_players(&self) -> Result<Vec<Player>, GameError> {
        let state = self.state.read().await;
        let mut players = state.players.clone();
        players.sort_by(|a, b| b.rating.cmp(&a.rating));
        Ok(players)
    }

    async fn create_match(&self, team_a: &[Uuid], team_b: &[Uuid]) -> Result<Match, GameError> {
        let mut state = self.state.write().await;
        if let Some(missing) = team_a
            .iter()
            .chain(team_b.iter())
            .find(|id| state.player(**id).is_none())
        {
            return Err(GameError::not_found(format!("Player {} not found", missing)));
        }

        let stored = StoredMatch {
            id: Uuid::new_v4(),
            status: MatchStatus::Ongoing,
            team_a: team_a.to_vec(),
            team_b: team_b.to_vec(),
            winner_a: false,
            winner_b: false,
            elo_variation_team_a: None,
            elo_variation_team_b: None,
            created_at: Utc::now(),
            finished_at: None,
        };
        let created = state.materialize(&stored);
        state.matches.push(stored);
        Ok(created)
    }

    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>, GameError> {
        let state = self.state.read().await;
        Ok(state.stored_match(match_id).map(|m| state.materialize(m)))
    }

    async fn list_matches(&self, filter: &MatchFilter, order: SortOrder) -> Result<Vec<Match>, GameError> {
        let state = self.state.read().await;
        let mut selected: Vec<&StoredMatch> = state
            .matches
            .iter()
            .filter(|m| filter.status.map_or(true, |status| m.status == status))
            .filter(|m| {
                filter.player_id.map_or(true, |player_id| {
                    m.team_a.contains(&player_id) || m.team_b.contains(&player_id)
                })
            })
            .collect();
        selected.sort_by_key(|m| m.created_at);
        if order == SortOrder::Descending {
            selected.reverse();
        }
        Ok(selected.into_iter().map(|m| state.materialize(m)).collect())
    }

    async fn finish_match(&self, request: &FinishRequest) -> Result<MatchFinish, GameError> {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();

        let game_match = next
            .stored_match(request.match_id)
            .map(|m| next.materialize(m))
            .ok_or_else(|| GameError::not_found(format!("Match {} not found", request.match_id)))?;
        let ledger = ShotLedger::new(next.shots_of(request.match_id));
        let finish = score_finish(&game_match, &ledger, request)?;

        let stored = next
            .matches
            .iter_mut()
            .find(|m| m.id == finish.match_id)
            .ok_or_else(|| GameError::not_found(format!("Match {} not found", finish.match_id)))?;
        stored.status = MatchStatus::Finished;
        stored.winner_a = finish.winner == Side::A;
        stored.winner_b = finish.winner == Side::B;
        stored.elo_variation_team_a = Some(finish.elo_variation_team_a);
        stored.elo_variation_team_b = Some(finish.elo_variation_team_b);
        stored.finished_at = Some(Utc::now());
        let (team_a, team_b) = (stored.team_a.clone(), stored.team_b.clone());

        next.add_to_rating(&team_a, finish.elo_variation_team_a);
        next.add_to_rating(&team_b, finish.elo_variation_team_b);

        *guard = next;
        Ok(finish)
    }

    async fn append_shot(&self, new: &NewShot) -> Result<Shot, GameError> {
        let mut state = self.state.write().await;
        let game_match = state
            .stored_match(new.match_id)
            .map(|m| state.materialize(m))
            .ok_or_else(|| GameError::not_found(format!("Match {} not found", new.match_id)))?;
        check_shot_against_match(&game_match, new)?;

        let sequence = ShotLedger::new(state.shots_of(new.match_id)).prepare_append(new)?;
        let shot = Shot {
            id: Uuid::new_v4(),
            match_id: new.match_id,
            player_id: new.player_id,
            side: new.side,
            effect: new.effect,
            sequence,
            created_at: Utc::now(),
        };
        state.shots.push(shot.clone());
        Ok(shot)
    }

    async fn remove_shot(&self, match_id: Uuid, side: Side, sequence: i32) -> Result<Shot, GameError> {
        let mut state = self.state.write().await;
        let stored = state
            .stored_match(match_id)
            .ok_or_else(|| GameError::not_found(format!("Match {} not found", match_id)))?;
        if stored.status != MatchStatus::Ongoing {
            return Err(GameError::consistency(format!(
                "Match {} is finished, its shots are final",
                match_id
            )));
        }

        let position = state
            .shots
            .iter()
            .position(|s| s.match_id == match_id && s.side == side && s.sequence == sequence)
            .ok_or_else(|| {
                GameError::not_found(format!(
                    "No shot {} for team {} in match {}",
                    sequence, side, match_id
                ))
            })?;
        Ok(state.shots.remove(position))
    }

    async fn list_shots(&self, filter: &ShotFilter) -> Result<Vec<Shot>, GameError> {
        let state = self.state.read().await;
        let mut shots: Vec<Shot> = state
            .shots
            .iter()
            .filter(|s| filter.match_id.map_or(true, |id| s.match_id == id))
            .filter(|s| filter.player_id.map_or(true, |id| s.player_id == id))
            .cloned()
            .collect();
        shots.sort_by_key(|s| s.created_at);
        Ok(shots)
    }

    async fn apply_backfill(
        &self,
        match_deltas: &[MatchDelta],
        ratings: &BTreeMap<Uuid, i32>,
    ) -> Result<(), GameError> {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();

        for delta in match_deltas {
            let stored = next
                .matches
                .iter_mut()
                .find(|m| m.id == delta.match_id)
                .ok_or_else(|| GameError::not_found(format!("Match {} not found", delta.match_id)))?;
            stored.elo_variation_team_a = Some(delta.elo_variation_team_a);
            stored.elo_variation_team_b = Some(delta.elo_variation_team_b);
        }
        for player in next.players.iter_mut() {
            if let Some(rating) = ratings.get(&player.id) {
                player.rating = *rating;
            }
        }

        *guard = next;
        Ok(())
    }

    async fn delete_ongoing_matches(&self) -> Result<CleanupReport, GameError> {
        let mut guard = self.state.write().await;
        let mut next = guard.clone();

        let ongoing: Vec<&StoredMatch> = next
            .matches
            .iter()
            .filter(|m| m.status == MatchStatus::Ongoing)
            .collect();
        let match_ids: Vec<Uuid> = ongoing.iter().map(|m| m.id).collect();
        let roster_links_deleted: u64 = ongoing
            .iter()
            .map(|m| (m.team_a.len() + m.team_b.len()) as u64)
            .sum();

        let shots_before = next.shots.len();
        next.shots.retain(|s| !match_ids.contains(&s.match_id));
        let shots_deleted = (shots_before - next.shots.len()) as u64;
        next.matches.retain(|m| !match_ids.contains(&m.id));

        *guard = next;

        Ok(CleanupReport {
            matches_deleted: match_ids.len() as u64,
            shots_deleted,
            roster_links_deleted,
            match_ids,
        })
    }
}
