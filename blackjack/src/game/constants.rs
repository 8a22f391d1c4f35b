//! Game-wide constants and tunable defaults.

use std::time::Duration;

use super::entities::Chips;

/// Chip balance every casino-mode session starts with.
pub const STARTING_CHIPS: Chips = 1000;

/// Smallest bet the dealer accepts.
pub const MIN_BET: Chips = 10;

/// Table cap on a single bet. The effective maximum for a seat is the
/// lesser of this and the seat's balance.
pub const MAX_BET: Chips = 500;

/// The winning hand total.
pub const BLACKJACK_TOTAL: u8 = 21;

/// The dealer draws while below this total and stands on soft or hard 17+.
pub const DEALER_STAND_TOTAL: u8 = 17;

/// Seat limits for a multiplayer room.
pub const MIN_SEATS: usize = 2;
pub const MAX_SEATS: usize = 4;

/// Length of a generated room join code.
pub const ROOM_CODE_LEN: usize = 8;

/// How long a multiplayer seat may think before its turn auto-resolves
/// as a stand. Configurable per room; this is only the default.
pub const DEFAULT_TURN_TIMEOUT: Duration = Duration::from_secs(45);

/// How long the betting phase stays open before seats without a bet are
/// assigned the minimum. Configurable per room; this is only the default.
pub const DEFAULT_BET_TIMEOUT: Duration = Duration::from_secs(30);
