// src/models/player.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::models::common::MatchResult;
use crate::models::game_match::RosterEntry;

#[derive(Debug, FromRow, Serialize, Deserialize, Clone, PartialEq)]
pub struct Player {
    pub id: Uuid,
    pub name: String,
    pub rating: i32,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct CreatePlayerRequest {
    pub name: String,
}

/// Player page: current rating plus the finished matches the player took part in
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PlayerProfile {
    pub id: Uuid,
    pub name: String,
    pub rating: i32,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub recent_matches: Vec<RecentMatch>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RecentMatch {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub opponents: Vec<RosterEntry>,
    pub result: MatchResult,
    pub rating_change: Option<i32>,
}
