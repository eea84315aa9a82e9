use std::sync::Arc;

use crate::db::store::MatchStore;
use crate::error::GameError;
use crate::models::game_match::CleanupReport;
use crate::services::MaintenanceGate;

#[derive(Clone)]
pub struct CleanupService {
    store: Arc<dyn MatchStore>,
    gate: MaintenanceGate,
}

impl CleanupService {
    pub fn new(store: Arc<dyn MatchStore>, gate: MaintenanceGate) -> Self {
        Self { store, gate }
    }

    /// Drop every ONGOING match together with its shots and roster links
    #[tracing::instrument(name = "Delete ongoing matches", skip(self))]
    pub async fn delete_ongoing(&self) -> Result<CleanupReport, GameError> {
        let _gate = self.gate.exclusive().await;
        let report = self.store.delete_ongoing_matches().await?;
        tracing::info!(
            "Deleted {} shots, {} roster links and {} ongoing matches",
            report.shots_deleted,
            report.roster_links_deleted,
            report.matches_deleted
        );
        Ok(report)
    }
}
