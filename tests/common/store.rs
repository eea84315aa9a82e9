use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use cuprank_backend::db::MatchStore;
use cuprank_backend::error::GameError;
use cuprank_backend::game::finish::FinishRequest;
use cuprank_backend::models::common::SortOrder;
use cuprank_backend::models::game_match::{
    CleanupReport, Match, MatchDelta, MatchFilter, MatchFinish, Side,
};
use cuprank_backend::models::player::Player;
use cuprank_backend::models::shot::{NewShot, Shot, ShotFilter};

/// A write that lands on the inner store right before the wrapped call runs
pub enum Interleave {
    /// A shot appended just before the finish reaches the store
    ShotDuringFinish(NewShot),
    /// The match finished just before the undo reaches the store
    FinishDuringUndo(FinishRequest),
}

/// Wraps the store under test so tests can make a write fail, add rows the API
/// refuses to create, and slip a competing write in front of a call.
pub struct TestStore {
    inner: Arc<dyn MatchStore>,
    fail_next_write: AtomicBool,
    legacy_matches: Mutex<Vec<Match>>,
    interleave: Mutex<Option<Interleave>>,
}

impl TestStore {
    pub fn new(inner: Arc<dyn MatchStore>) -> Self {
        Self {
            inner,
            fail_next_write: AtomicBool::new(false),
            legacy_matches: Mutex::new(Vec::new()),
            interleave: Mutex::new(None),
        }
    }

    /// The next finish, backfill or cleanup fails before writing anything
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    /// Rows written by older versions, served from `list_matches` only
    pub fn inject_legacy_match(&self, game_match: Match) {
        self.legacy_matches.lock().unwrap().push(game_match);
    }

    pub fn interleave(&self, write: Interleave) {
        *self.interleave.lock().unwrap() = Some(write);
    }

    fn check_write(&self) -> Result<(), GameError> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(GameError::TransactionFailure("Injected write failure".into()));
        }
        Ok(())
    }

    fn take_interleave(&self) -> Option<Interleave> {
        self.interleave.lock().unwrap().take()
    }
}

#[async_trait]
impl MatchStore for TestStore {
    async fn create_player(&self, name: &str, rating: i32) -> Result<Player, GameError> {
        self.inner.create_player(name, rating).await
    }

    async fn get_player(&self, player_id: Uuid) -> Result<Option<Player>, GameError> {
        self.inner.get_player(player_id).await
    }

    async fn list_players(&self) -> Result<Vec<Player>, GameError> {
        self.inner.list_players().await
    }

    async fn create_match(&self, team_a: &[Uuid], team_b: &[Uuid]) -> Result<Match, GameError> {
        self.inner.create_match(team_a, team_b).await
    }

    async fn get_match(&self, match_id: Uuid) -> Result<Option<Match>, GameError> {
        self.inner.get_match(match_id).await
    }

    async fn list_matches(&self, filter: &MatchFilter, order: SortOrder) -> Result<Vec<Match>, GameError> {
        let mut matches = self.inner.list_matches(filter, order).await?;
        let legacy: Vec<Match> = self
            .legacy_matches
            .lock()
            .unwrap()
            .iter()
            .filter(|m| filter.status.map_or(true, |status| m.status == status))
            .filter(|m| {
                filter.player_id.map_or(true, |player_id| {
                    m.team_a.iter().chain(m.team_b.iter()).any(|e| e.player_id == player_id)
                })
            })
            .cloned()
            .collect();
        if legacy.is_empty() {
            return Ok(matches);
        }

        matches.extend(legacy);
        matches.sort_by_key(|m| m.created_at);
        if order == SortOrder::Descending {
            matches.reverse();
        }
        Ok(matches)
    }

    async fn finish_match(&self, request: &FinishRequest) -> Result<MatchFinish, GameError> {
        self.check_write()?;
        if let Some(Interleave::ShotDuringFinish(shot)) = self.take_interleave() {
            self.inner.append_shot(&shot).await?;
        }
        self.inner.finish_match(request).await
    }

    async fn append_shot(&self, shot: &NewShot) -> Result<Shot, GameError> {
        self.inner.append_shot(shot).await
    }

    async fn remove_shot(&self, match_id: Uuid, side: Side, sequence: i32) -> Result<Shot, GameError> {
        if let Some(Interleave::FinishDuringUndo(request)) = self.take_interleave() {
            self.inner.finish_match(&request).await?;
        }
        self.inner.remove_shot(match_id, side, sequence).await
    }

    async fn list_shots(&self, filter: &ShotFilter) -> Result<Vec<Shot>, GameError> {
        self.inner.list_shots(filter).await
    }

    async fn apply_backfill(
        &self,
        match_deltas: &[MatchDelta],
        ratings: &BTreeMap<Uuid, i32>,
    ) -> Result<(), GameError> {
        self.check_write()?;
        self.inner.apply_backfill(match_deltas, ratings).await
    }

    async fn delete_ongoing_matches(&self) -> Result<CleanupReport, GameError> {
        self.check_write()?;
        self.inner.delete_ongoing_matches().await
    }
}
