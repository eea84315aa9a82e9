use std::sync::Arc;
use uuid::Uuid;

use crate::db::store::MatchStore;
use crate::error::GameError;
use crate::game::matchups::compute_matchups;
use crate::models::common::{MatchResult, SortOrder};
use crate::models::game_match::{MatchFilter, MatchStatus, Side};
use crate::models::matchup::Matchups;
use crate::models::player::{Player, PlayerProfile, RecentMatch};
use crate::models::shot::ShotFilter;

const RECENT_MATCHES_LIMIT: usize = 10;
const MAX_NAME_LENGTH: usize = 100;

#[derive(Clone)]
pub struct PlayerService {
    store: Arc<dyn MatchStore>,
    initial_rating: i32,
}

impl PlayerService {
    pub fn new(store: Arc<dyn MatchStore>, initial_rating: i32) -> Self {
        Self { store, initial_rating }
    }

    pub async fn create_player(&self, name: &str) -> Result<Player, GameError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(GameError::validation("Player name must not be empty"));
        }
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(GameError::validation(format!(
                "Player name must be at most {} characters",
                MAX_NAME_LENGTH
            )));
        }
        let player = self.store.create_player(name, self.initial_rating).await?;
        tracing::info!("Created player {} ({})", player.name, player.id);
        Ok(player)
    }

    /// Leaderboard order, highest rating first
    pub async fn list_players(&self) -> Result<Vec<Player>, GameError> {
        self.store.list_players().await
    }

    pub async fn get_player(&self, player_id: Uuid) -> Result<Player, GameError> {
        self.store
            .get_player(player_id)
            .await?
            .ok_or_else(|| GameError::not_found(format!("Player {} not found", player_id)))
    }

    pub async fn profile(&self, player_id: Uuid) -> Result<PlayerProfile, GameError> {
        let player = self.get_player(player_id).await?;
        let finished = self
            .store
            .list_matches(
                &MatchFilter {
                    status: Some(MatchStatus::Finished),
                    player_id: Some(player_id),
                },
                SortOrder::Descending,
            )
            .await?;

        let mut wins = 0;
        let mut losses = 0;
        let mut recent_matches = Vec::new();
        for game_match in &finished {
            let Some(side) = game_match.side_of(player_id) else {
                continue;
            };
            let won = game_match.is_winner(side);
            if won {
                wins += 1;
            } else {
                losses += 1;
            }
            if recent_matches.len() < RECENT_MATCHES_LIMIT {
                recent_matches.push(RecentMatch {
                    id: game_match.id,
                    created_at: game_match.created_at,
                    opponents: game_match.roster(side.opponent()).to_vec(),
                    result: MatchResult::from_won(won),
                    rating_change: match side {
                        Side::A => game_match.elo_variation_team_a,
                        Side::B => game_match.elo_variation_team_b,
                    },
                });
            }
        }

        Ok(PlayerProfile {
            id: player.id,
            name: player.name,
            rating: player.rating,
            matches_played: wins + losses,
            wins,
            losses,
            recent_matches,
        })
    }

    #[tracing::instrument(name = "Compute matchups", skip(self), fields(player_id = %player_id))]
    pub async fn matchups(&self, player_id: Uuid) -> Result<Matchups, GameError> {
        self.get_player(player_id).await?;
        let matches = self
            .store
            .list_matches(
                &MatchFilter {
                    status: Some(MatchStatus::Finished),
                    player_id: Some(player_id),
                },
                SortOrder::Descending,
            )
            .await?;
        let shots = self
            .store
            .list_shots(&ShotFilter {
                match_id: None,
                player_id: Some(player_id),
            })
            .await?;

        let matchups = compute_matchups(player_id, &matches, &shots);
        tracing::debug!(
            "Matchups for {}: {} opponents, {} partners",
            player_id,
            matchups.by_opponents.len(),
            matchups.by_partners.len()
        );
        Ok(matchups)
    }
}
