// src/models/shot.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::game_match::Side;

/// What a single throw did to the opposing rack
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShotEffect {
    Miss { cup: i32 },
    Hit { cup: i32 },
    Bounce { cup: i32, bounce_cup: i32 },
}

impl ShotEffect {
    /// Build from the persisted `hit` / `cup` / `bounce_cup` columns.
    /// Any row carrying a bounce cup is a bounce, whatever its hit flag says.
    pub fn from_columns(hit: bool, cup: i32, bounce_cup: Option<i32>) -> Self {
        match (hit, bounce_cup) {
            (_, Some(bounce_cup)) => ShotEffect::Bounce { cup, bounce_cup },
            (true, None) => ShotEffect::Hit { cup },
            (false, None) => ShotEffect::Miss { cup },
        }
    }

    pub fn cups_removed(&self) -> i32 {
        match self {
            ShotEffect::Miss { .. } => 0,
            ShotEffect::Hit { .. } => 1,
            ShotEffect::Bounce { .. } => 2,
        }
    }

    pub fn cup(&self) -> i32 {
        match self {
            ShotEffect::Miss { cup } | ShotEffect::Hit { cup } | ShotEffect::Bounce { cup, .. } => *cup,
        }
    }

    pub fn bounce_cup(&self) -> Option<i32> {
        match self {
            ShotEffect::Bounce { bounce_cup, .. } => Some(*bounce_cup),
            _ => None,
        }
    }

    pub fn is_hit(&self) -> bool {
        !matches!(self, ShotEffect::Miss { .. })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Shot {
    pub id: Uuid,
    pub match_id: Uuid,
    pub player_id: Uuid,
    pub side: Side,
    pub effect: ShotEffect,
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
}

/// A shot about to be appended; `sequence` is assigned by the ledger when absent
#[derive(Debug, Clone, PartialEq)]
pub struct NewShot {
    pub match_id: Uuid,
    pub player_id: Uuid,
    pub side: Side,
    pub effect: ShotEffect,
    pub sequence: Option<i32>,
}

#[derive(Debug, Clone, Default)]
pub struct ShotFilter {
    pub match_id: Option<Uuid>,
    pub player_id: Option<Uuid>,
}

// Request/Response DTOs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecordShotRequest {
    pub match_id: Uuid,
    pub player_id: Uuid,
    pub side: String,
    pub cup: i32,
    pub hit: bool,
    pub sequence: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecordBounceRequest {
    pub match_id: Uuid,
    pub player_id: Uuid,
    pub side: String,
    pub cups: Vec<i32>,
    pub sequence: Option<i32>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct UndoShotRequest {
    pub side: String,
    pub sequence: i32,
}

/// One line of a match recap
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecapShot {
    pub player_id: Uuid,
    pub player: Option<String>,
    pub side: Side,
    pub cup: i32,
    pub bounce_cup: Option<i32>,
    pub hit: bool,
    pub sequence: i32,
    pub created_at: DateTime<Utc>,
}
