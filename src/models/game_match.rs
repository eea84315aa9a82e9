// src/models/game_match.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::GameError;

/// Number of cups each side racks at the start of a match
pub const CUPS_PER_SIDE: i32 = 10;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, sqlx::Type)]
#[sqlx(type_name = "varchar")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn opponent(&self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::A => "A",
            Side::B => "B",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(Side::A),
            "B" => Ok(Side::B),
            other => Err(GameError::validation(format!(
                "Invalid side '{}', expected 'A' or 'B'",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum MatchStatus {
    Ongoing,
    Finished,
}

impl FromStr for MatchStatus {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "ONGOING" => Ok(MatchStatus::Ongoing),
            "FINISHED" => Ok(MatchStatus::Finished),
            other => Err(GameError::validation(format!("Unknown match status '{}'", other))),
        }
    }
}

/// A roster slot joined with the player's current data
#[derive(Debug, FromRow, Serialize, Deserialize, Clone, PartialEq)]
pub struct RosterEntry {
    pub player_id: Uuid,
    pub name: String,
    pub rating: i32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Match {
    pub id: Uuid,
    pub status: MatchStatus,
    pub team_a: Vec<RosterEntry>,
    pub team_b: Vec<RosterEntry>,
    pub winner_a: bool,
    pub winner_b: bool,
    pub elo_variation_team_a: Option<i32>,
    pub elo_variation_team_b: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Match {
    pub fn roster(&self, side: Side) -> &[RosterEntry] {
        match side {
            Side::A => &self.team_a,
            Side::B => &self.team_b,
        }
    }

    /// Side the given player is rostered on, if any
    pub fn side_of(&self, player_id: Uuid) -> Option<Side> {
        if self.team_a.iter().any(|p| p.player_id == player_id) {
            Some(Side::A)
        } else if self.team_b.iter().any(|p| p.player_id == player_id) {
            Some(Side::B)
        } else {
            None
        }
    }

    pub fn is_winner(&self, side: Side) -> bool {
        match side {
            Side::A => self.winner_a,
            Side::B => self.winner_b,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.status == MatchStatus::Finished
    }

    pub fn has_empty_side(&self) -> bool {
        self.team_a.is_empty() || self.team_b.is_empty()
    }
}

/// Cups still standing on each side
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct RemainingCups {
    pub team_a: i32,
    pub team_b: i32,
}

impl RemainingCups {
    pub fn full_rack() -> Self {
        Self {
            team_a: CUPS_PER_SIDE,
            team_b: CUPS_PER_SIDE,
        }
    }

    pub fn for_side(&self, side: Side) -> i32 {
        match side {
            Side::A => self.team_a,
            Side::B => self.team_b,
        }
    }

    /// Bounded to `0..=CUPS_PER_SIDE` so over-counted history cannot inflate the margin
    pub fn clamped(&self) -> Self {
        Self {
            team_a: self.team_a.clamp(0, CUPS_PER_SIDE),
            team_b: self.team_b.clamp(0, CUPS_PER_SIDE),
        }
    }

    pub fn validate(&self) -> Result<(), GameError> {
        for (side, cups) in [(Side::A, self.team_a), (Side::B, self.team_b)] {
            if !(0..=CUPS_PER_SIDE).contains(&cups) {
                return Err(GameError::validation(format!(
                    "Remaining cups for team {} must be between 0 and {}, got {}",
                    side, CUPS_PER_SIDE, cups
                )));
            }
        }
        Ok(())
    }
}

/// Everything the store writes when a match transitions to FINISHED
#[derive(Debug, Clone, PartialEq)]
pub struct MatchFinish {
    pub match_id: Uuid,
    pub winner: Side,
    pub remaining_cups: RemainingCups,
    pub elo_variation_team_a: i32,
    pub elo_variation_team_b: i32,
}

/// Recomputed deltas for one match, produced by a backfill
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct MatchDelta {
    pub match_id: Uuid,
    pub elo_variation_team_a: i32,
    pub elo_variation_team_b: i32,
}

#[derive(Debug, Clone, Default)]
pub struct MatchFilter {
    pub status: Option<MatchStatus>,
    pub player_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
pub struct CleanupReport {
    pub matches_deleted: u64,
    pub shots_deleted: u64,
    pub roster_links_deleted: u64,
    pub match_ids: Vec<Uuid>,
}

// Request/Response DTOs
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreateMatchRequest {
    pub team_a: Vec<Uuid>,
    pub team_b: Vec<Uuid>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EndMatchRequest {
    pub winner: String,
    pub remaining_cups: Option<RemainingCups>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EndMatchResponse {
    pub match_id: Uuid,
    pub winner: Side,
    pub remaining_cups: RemainingCups,
    pub elo_variation_team_a: i32,
    pub elo_variation_team_b: i32,
}

#[derive(Debug, Deserialize)]
pub struct MatchHistoryQuery {
    pub status: Option<String>,
}
