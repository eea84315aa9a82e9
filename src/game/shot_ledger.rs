use crate::error::GameError;
use crate::models::game_match::{Match, RemainingCups, Side, CUPS_PER_SIDE};
use crate::models::shot::{NewShot, Shot, ShotEffect};

/// The shot log of a single match.
///
/// Remaining cups are never stored: they are always derived from the log, where
/// a shot by one side removes `effect.cups_removed()` cups from the other side.
#[derive(Debug, Clone, Default)]
pub struct ShotLedger {
    shots: Vec<Shot>,
}

impl ShotLedger {
    pub fn new(shots: Vec<Shot>) -> Self {
        Self { shots }
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    /// Total cups knocked out by `side` from the opposing rack
    pub fn cups_removed_by(&self, side: Side) -> i32 {
        self.shots
            .iter()
            .filter(|shot| shot.side == side)
            .map(|shot| shot.effect.cups_removed())
            .sum()
    }

    /// Raw remaining-cup counts. Not clamped: over-counted legacy logs can go negative.
    pub fn remaining_cups(&self) -> RemainingCups {
        RemainingCups {
            team_a: CUPS_PER_SIDE - self.cups_removed_by(Side::B),
            team_b: CUPS_PER_SIDE - self.cups_removed_by(Side::A),
        }
    }

    pub fn find(&self, side: Side, sequence: i32) -> Option<&Shot> {
        self.shots
            .iter()
            .find(|shot| shot.side == side && shot.sequence == sequence)
    }

    pub fn next_sequence(&self, side: Side) -> i32 {
        self.shots
            .iter()
            .filter(|shot| shot.side == side)
            .map(|shot| shot.sequence)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Validate `new` against the log and return the sequence number it will carry.
    /// Must run under the same lock as the insert that follows it.
    pub fn prepare_append(&self, new: &NewShot) -> Result<i32, GameError> {
        validate_effect(&new.effect)?;

        let sequence = match new.sequence {
            Some(sequence) if sequence < 1 => {
                return Err(GameError::validation(format!(
                    "Sequence must be positive, got {}",
                    sequence
                )));
            }
            Some(sequence) => {
                if self.find(new.side, sequence).is_some() {
                    return Err(GameError::validation(format!(
                        "Sequence {} is already used by team {}",
                        sequence, new.side
                    )));
                }
                sequence
            }
            None => self.next_sequence(new.side),
        };

        let opponent_remaining = self.remaining_cups().for_side(new.side.opponent());
        if new.effect.cups_removed() > opponent_remaining {
            return Err(GameError::validation(format!(
                "Team {} has only {} cups left, a shot cannot remove {}",
                new.side.opponent(),
                opponent_remaining.max(0),
                new.effect.cups_removed()
            )));
        }

        Ok(sequence)
    }
}

/// Cup identifiers must name a cup of the rack; a bounce names two different cups
pub fn validate_effect(effect: &ShotEffect) -> Result<(), GameError> {
    validate_cup(effect.cup())?;
    if let ShotEffect::Bounce { cup, bounce_cup } = effect {
        validate_cup(*bounce_cup)?;
        if cup == bounce_cup {
            return Err(GameError::validation("A bounce must hit two different cups"));
        }
    }
    Ok(())
}

fn validate_cup(cup: i32) -> Result<(), GameError> {
    if (1..=CUPS_PER_SIDE).contains(&cup) {
        Ok(())
    } else {
        Err(GameError::validation(format!(
            "Cup must be between 1 and {}, got {}",
            CUPS_PER_SIDE, cup
        )))
    }
}

/// Build a bounce effect from the cup list sent by a client
pub fn bounce_effect(cups: &[i32]) -> Result<ShotEffect, GameError> {
    match cups {
        [cup, bounce_cup] => {
            let effect = ShotEffect::Bounce {
                cup: *cup,
                bounce_cup: *bounce_cup,
            };
            validate_effect(&effect)?;
            Ok(effect)
        }
        _ => Err(GameError::validation(format!(
            "Two cups required for bounce, got {}",
            cups.len()
        ))),
    }
}

/// Checks that need the match itself: it must still be running and the shooter
/// must play for the side the shot is recorded on.
pub fn check_shot_against_match(game_match: &Match, new: &NewShot) -> Result<(), GameError> {
    if game_match.is_finished() {
        return Err(GameError::consistency(format!(
            "Match {} is already finished",
            game_match.id
        )));
    }
    if !game_match
        .roster(new.side)
        .iter()
        .any(|entry| entry.player_id == new.player_id)
    {
        return Err(GameError::validation(format!(
            "Player {} is not on team {} of match {}",
            new.player_id, new.side, game_match.id
        )));
    }
    Ok(())
}
