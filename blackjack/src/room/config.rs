//! Room configuration.

use std::time::Duration;

use crate::game::{
    constants::{
        DEFAULT_BET_TIMEOUT, DEFAULT_TURN_TIMEOUT, MAX_BET, MAX_SEATS, MIN_BET, MIN_SEATS,
        STARTING_CHIPS,
    },
    entities::Chips,
};

use super::messages::RoomError;

/// Settings fixed at room creation.
#[derive(Clone, Debug)]
pub struct RoomConfig {
    /// Rounds the room plays before closing.
    pub rounds: u8,
    /// Whether rounds open with a betting phase (casino rules).
    pub betting: bool,
    pub min_seats: usize,
    pub max_seats: usize,
    pub starting_chips: Chips,
    pub min_bet: Chips,
    pub max_bet: Chips,
    /// Betting stays open this long before missing bets default to the
    /// minimum.
    pub bet_timeout: Duration,
    /// A seat gets this long to act before it auto-stands.
    pub turn_timeout: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            rounds: 5,
            betting: false,
            min_seats: MIN_SEATS,
            max_seats: MAX_SEATS,
            starting_chips: STARTING_CHIPS,
            min_bet: MIN_BET,
            max_bet: MAX_BET,
            bet_timeout: DEFAULT_BET_TIMEOUT,
            turn_timeout: DEFAULT_TURN_TIMEOUT,
        }
    }
}

impl RoomConfig {
    /// Reject configurations a room cannot actually run with.
    pub fn validate(&self) -> Result<(), RoomError> {
        if self.rounds == 0 {
            return Err(RoomError::InvalidConfig("rounds must be at least 1"));
        }
        if self.min_seats < MIN_SEATS {
            return Err(RoomError::InvalidConfig("rooms need at least two seats"));
        }
        if self.max_seats < self.min_seats || self.max_seats > MAX_SEATS {
            return Err(RoomError::InvalidConfig("seat limits are out of range"));
        }
        if self.betting {
            if self.min_bet == 0 || self.max_bet < self.min_bet {
                return Err(RoomError::InvalidConfig("bet limits are out of range"));
            }
            if self.starting_chips < self.min_bet {
                return Err(RoomError::InvalidConfig(
                    "starting chips cannot cover the minimum bet",
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(RoomConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_catches_bad_limits() {
        let no_rounds = RoomConfig {
            rounds: 0,
            ..RoomConfig::default()
        };
        assert!(no_rounds.validate().is_err());

        let solo = RoomConfig {
            min_seats: 1,
            ..RoomConfig::default()
        };
        assert!(solo.validate().is_err());

        let broke_from_the_start = RoomConfig {
            betting: true,
            starting_chips: 5,
            min_bet: 10,
            ..RoomConfig::default()
        };
        assert!(broke_from_the_start.validate().is_err());
    }
}
