use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::db::store::MatchStore;
use crate::error::GameError;
use crate::game::backfill::replay;
use crate::game::rating::EloConfig;
use crate::models::common::SortOrder;
use crate::models::game_match::{MatchFilter, MatchStatus};
use crate::models::shot::{Shot, ShotFilter};
use crate::services::MaintenanceGate;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct BackfillReport {
    pub matches_processed: usize,
    pub players_updated: usize,
    pub skipped_matches: Vec<Uuid>,
    pub warnings: Vec<String>,
}

/// Rebuilds every rating from the finished match history
#[derive(Clone)]
pub struct BackfillService {
    store: Arc<dyn MatchStore>,
    rating: EloConfig,
    gate: MaintenanceGate,
}

impl BackfillService {
    pub fn new(store: Arc<dyn MatchStore>, rating: EloConfig, gate: MaintenanceGate) -> Self {
        Self { store, rating, gate }
    }

    #[tracing::instrument(name = "Run rating backfill", skip(self))]
    pub async fn run_backfill(&self) -> Result<BackfillReport, GameError> {
        let _gate = self.gate.exclusive().await;

        let players = self.store.list_players().await?;
        let matches = self
            .store
            .list_matches(
                &MatchFilter {
                    status: Some(MatchStatus::Finished),
                    player_id: None,
                },
                SortOrder::Ascending,
            )
            .await?;
        let shots = self.store.list_shots(&ShotFilter::default()).await?;

        let mut shots_by_match: HashMap<Uuid, Vec<Shot>> = HashMap::new();
        for shot in shots {
            shots_by_match.entry(shot.match_id).or_default().push(shot);
        }

        let player_ids: Vec<Uuid> = players.iter().map(|p| p.id).collect();
        let outcome = replay(&player_ids, &matches, &shots_by_match, &self.rating);

        self.store
            .apply_backfill(&outcome.match_deltas, &outcome.ratings)
            .await?;

        let warnings: Vec<String> = outcome
            .skipped
            .iter()
            .map(|match_id| format!("Skipping match {} due to empty team", match_id))
            .collect();
        let report = BackfillReport {
            matches_processed: outcome.match_deltas.len(),
            players_updated: outcome
                .ratings
                .keys()
                .filter(|id| player_ids.contains(id))
                .count(),
            skipped_matches: outcome.skipped,
            warnings,
        };
        tracing::info!(
            "Backfill complete: {} matches processed, {} players updated, {} skipped",
            report.matches_processed,
            report.players_updated,
            report.skipped_matches.len()
        );
        Ok(report)
    }
}
