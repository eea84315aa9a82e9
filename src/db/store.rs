use async_trait::async_trait;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::GameError;
use crate::game::finish::FinishRequest;
use crate::models::common::SortOrder;
use crate::models::game_match::{CleanupReport, Match, MatchDelta, MatchFilter, MatchFinish, Side};
use crate::models::player::Player;
use crate::models::shot::{NewShot, Shot, ShotFilter};

/// Persistence collaborator of the rating engine.
///
/// Every method that writes more than one row is all-or-nothing: on error no write
/// is visible and the prior state is untouched.
#[async_trait]
pub trait MatchStore: Send + Sync {
    async fn create_player(&self, name: &str, rating: i32) -> Result<Player, GameError>;

    async fn get_player(&self, player_id: Uuid) -> Result<Option<Player>, GameError>;

    /// Players ordered by rating, highest first
    async fn list_players(&self) -> Result<Vec<Player>, GameError>;

    /// New ONGOING match without winner; every referenced player must exist
    async fn create_match(&self, team_a: &[Uuid], team_b: &[Uuid]) -> Result<Match, GameError>;

    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>, GameError>;

    async fn list_matches(&self, filter: &MatchFilter, order: SortOrder) -> Result<Vec<Match>, GameError>;

    /// Score and finish a match as one atomic unit under the match lock: check it is
    /// still ONGOING, read its shot log, compute the deltas, flip it to FINISHED and
    /// add each side's delta to every player on that side. Fails with `Consistency`
    /// when the match is no longer ONGOING.
    async fn finish_match(&self, request: &FinishRequest) -> Result<MatchFinish, GameError>;

    /// Validate the shot against the match and its ledger, assign the sequence when
    /// absent and insert, all under a per-match lock.
    async fn append_shot(&self, shot: &NewShot) -> Result<Shot, GameError>;

    /// Remove the shot keyed by (match, side, sequence) under the match lock.
    /// `NotFound` when the match or shot is absent, `Consistency` once the match is finished.
    async fn remove_shot(&self, match_id: Uuid, side: Side, sequence: i32) -> Result<Shot, GameError>;

    /// Shots in creation order
    async fn list_shots(&self, filter: &ShotFilter) -> Result<Vec<Shot>, GameError>;

    /// Store recomputed match deltas and overwrite player ratings in one batch
    async fn apply_backfill(
        &self,
        match_deltas: &[MatchDelta],
        ratings: &BTreeMap<Uuid, i32>,
    ) -> Result<(), GameError>;

    /// Delete every ONGOING match with its shots and roster links
    async fn delete_ongoing_matches(&self) -> Result<CleanupReport, GameError>;
}
