use std::sync::Arc;
use tokio::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

pub mod match_service;
pub mod player_service;
pub mod backfill_service;
pub mod cleanup_service;

pub use match_service::MatchService;
pub use player_service::PlayerService;
pub use backfill_service::{BackfillReport, BackfillService};
pub use cleanup_service::CleanupService;

/// Process-wide reader/writer gate between live match traffic and maintenance runs.
///
/// Ending a match and appending or undoing shots hold it shared; backfill and
/// cleanup hold it exclusively so they never interleave with a finish in flight.
#[derive(Debug, Clone, Default)]
pub struct MaintenanceGate {
    lock: Arc<RwLock<()>>,
}

impl MaintenanceGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn shared(&self) -> RwLockReadGuard<'_, ()> {
        self.lock.read().await
    }

    pub async fn exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.lock.write().await
    }
}
