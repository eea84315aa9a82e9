use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Aggregate of every finished match the queried player shared with one other player.
/// `shots_hit` / `shots_total` are the queried player's own shots in those matches.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MatchupStats {
    pub id: Uuid,
    pub name: String,
    pub games: u32,
    pub wins: u32,
    pub losses: u32,
    pub shots_hit: u32,
    pub shots_total: u32,
}

impl MatchupStats {
    pub fn new(id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            games: 0,
            wins: 0,
            losses: 0,
            shots_hit: 0,
            shots_total: 0,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct Matchups {
    pub by_opponents: Vec<MatchupStats>,
    pub by_partners: Vec<MatchupStats>,
}
