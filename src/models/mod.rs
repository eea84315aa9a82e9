pub mod common;
pub mod player;
pub mod game_match;
pub mod shot;
pub mod matchup;
