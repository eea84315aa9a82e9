use std::collections::HashSet;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::store::MatchStore;
use crate::error::GameError;
use crate::game::finish::FinishRequest;
use crate::game::rating::EloConfig;
use crate::game::shot_ledger::{bounce_effect, validate_effect, ShotLedger};
use crate::models::common::SortOrder;
use crate::models::game_match::{
    EndMatchResponse, Match, MatchFilter, MatchStatus, RemainingCups, Side,
};
use crate::models::shot::{NewShot, RecapShot, Shot, ShotEffect, ShotFilter};
use crate::services::MaintenanceGate;

/// Match lifecycle: creation, the shot log while ONGOING, and the transition to FINISHED.
#[derive(Clone)]
pub struct MatchService {
    store: Arc<dyn MatchStore>,
    rating: EloConfig,
    gate: MaintenanceGate,
}

impl MatchService {
    pub fn new(store: Arc<dyn MatchStore>, rating: EloConfig, gate: MaintenanceGate) -> Self {
        Self { store, rating, gate }
    }

    #[tracing::instrument(name = "Create match", skip(self))]
    pub async fn create_match(&self, team_a: &[Uuid], team_b: &[Uuid]) -> Result<Match, GameError> {
        if team_a.is_empty() || team_b.is_empty() {
            return Err(GameError::validation("Both teams need at least one player"));
        }

        let mut seen = HashSet::new();
        for player_id in team_a.iter().chain(team_b.iter()) {
            if !seen.insert(*player_id) {
                return Err(GameError::validation(format!(
                    "Player {} appears more than once in the match",
                    player_id
                )));
            }
        }

        let created = self.store.create_match(team_a, team_b).await?;
        tracing::info!(
            "Created match {} ({} vs {} players)",
            created.id,
            created.team_a.len(),
            created.team_b.len()
        );
        Ok(created)
    }

    pub async fn get_match(&self, match_id: Uuid) -> Result<Match, GameError> {
        self.store
            .get_match(match_id)
            .await?
            .ok_or_else(|| GameError::not_found(format!("Match {} not found", match_id)))
    }

    /// All matches, newest first
    pub async fn match_history(&self, status: Option<MatchStatus>) -> Result<Vec<Match>, GameError> {
        let filter = MatchFilter { status, player_id: None };
        self.store.list_matches(&filter, SortOrder::Descending).await
    }

    async fn ledger(&self, match_id: Uuid) -> Result<ShotLedger, GameError> {
        let shots = self
            .store
            .list_shots(&ShotFilter { match_id: Some(match_id), player_id: None })
            .await?;
        Ok(ShotLedger::new(shots))
    }

    /// Live cups per side as derived from the shot log, unclamped
    pub async fn remaining_cups(&self, match_id: Uuid) -> Result<RemainingCups, GameError> {
        self.get_match(match_id).await?;
        Ok(self.ledger(match_id).await?.remaining_cups())
    }

    /// Shots in creation order, labelled with the shooter's name
    pub async fn recap(&self, match_id: Uuid) -> Result<Vec<RecapShot>, GameError> {
        let game_match = self.get_match(match_id).await?;
        let ledger = self.ledger(match_id).await?;

        let name_of = |player_id: Uuid| {
            game_match
                .team_a
                .iter()
                .chain(game_match.team_b.iter())
                .find(|entry| entry.player_id == player_id)
                .map(|entry| entry.name.clone())
        };

        Ok(ledger
            .shots()
            .iter()
            .map(|shot| RecapShot {
                player_id: shot.player_id,
                player: name_of(shot.player_id),
                side: shot.side,
                cup: shot.effect.cup(),
                bounce_cup: shot.effect.bounce_cup(),
                hit: shot.effect.is_hit(),
                sequence: shot.sequence,
                created_at: shot.created_at,
            })
            .collect())
    }

    /// Finish a match and apply the rating deltas to every rostered player.
    ///
    /// Deltas come from the current team averages and the remaining cups, either
    /// the caller's override or the ledger's clamped count as of the finish.
    #[tracing::instrument(name = "End match", skip(self, override_cups), fields(match_id = %match_id, winner = %winner))]
    pub async fn end_match(
        &self,
        match_id: Uuid,
        winner: &str,
        override_cups: Option<RemainingCups>,
    ) -> Result<EndMatchResponse, GameError> {
        let winner = parse_winner(winner)?;
        if let Some(cups) = &override_cups {
            cups.validate()?;
        }

        let _gate = self.gate.shared().await;
        let finish = self
            .store
            .finish_match(&FinishRequest {
                match_id,
                winner,
                override_cups,
                rating: self.rating,
            })
            .await?;

        tracing::info!(
            "Match {} finished, winner {}, remaining {}-{}, deltas A={} B={}",
            match_id,
            winner,
            finish.remaining_cups.team_a,
            finish.remaining_cups.team_b,
            finish.elo_variation_team_a,
            finish.elo_variation_team_b
        );

        Ok(EndMatchResponse {
            match_id,
            winner,
            remaining_cups: finish.remaining_cups,
            elo_variation_team_a: finish.elo_variation_team_a,
            elo_variation_team_b: finish.elo_variation_team_b,
        })
    }

    #[tracing::instrument(name = "Record shot", skip(self), fields(match_id = %match_id, player_id = %player_id))]
    pub async fn record_shot(
        &self,
        match_id: Uuid,
        player_id: Uuid,
        side: &str,
        cup: i32,
        hit: bool,
        sequence: Option<i32>,
    ) -> Result<Shot, GameError> {
        let effect = if hit { ShotEffect::Hit { cup } } else { ShotEffect::Miss { cup } };
        validate_effect(&effect)?;
        self.append(match_id, player_id, side.parse()?, effect, sequence).await
    }

    #[tracing::instrument(name = "Record bounce shot", skip(self), fields(match_id = %match_id, player_id = %player_id))]
    pub async fn record_bounce_shot(
        &self,
        match_id: Uuid,
        player_id: Uuid,
        side: &str,
        cups: &[i32],
        sequence: Option<i32>,
    ) -> Result<Shot, GameError> {
        let effect = bounce_effect(cups)?;
        self.append(match_id, player_id, side.parse()?, effect, sequence).await
    }

    async fn append(
        &self,
        match_id: Uuid,
        player_id: Uuid,
        side: Side,
        effect: ShotEffect,
        sequence: Option<i32>,
    ) -> Result<Shot, GameError> {
        let _gate = self.gate.shared().await;
        let shot = self
            .store
            .append_shot(&NewShot { match_id, player_id, side, effect, sequence })
            .await?;
        tracing::debug!("Appended shot {} as {}#{}", shot.id, shot.side, shot.sequence);
        Ok(shot)
    }

    /// Remove exactly the shot keyed by (match, side, sequence)
    #[tracing::instrument(name = "Undo shot", skip(self), fields(match_id = %match_id))]
    pub async fn undo_shot(&self, match_id: Uuid, side: &str, sequence: i32) -> Result<Shot, GameError> {
        let side: Side = side.parse()?;
        let _gate = self.gate.shared().await;

        let shot = self.store.remove_shot(match_id, side, sequence).await?;

        tracing::info!("Undid shot {}#{} in match {}", side, sequence, match_id);
        Ok(shot)
    }
}

fn parse_winner(token: &str) -> Result<Side, GameError> {
    token
        .parse()
        .map_err(|_| GameError::validation(format!("Winner must be 'A' or 'B', got '{}'", token)))
}
