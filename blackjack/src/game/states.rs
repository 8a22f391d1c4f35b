//! Typed round states.
//!
//! Each state is a distinct type so a round can only move along the legal
//! path (betting → dealing → player turn → dealer turn → resolved); an
//! out-of-order transition simply does not compile.

use crate::game::entities::Outcome;

/// Waiting for an accepted bet (casino rules only).
#[derive(Debug)]
pub struct Betting {}

/// Ready to deal the opening hands.
#[derive(Debug)]
pub struct Dealing {}

/// The player is acting on their hand.
#[derive(Debug)]
pub struct PlayerTurn {
    /// Double-down is only open before the first card is taken.
    pub(crate) can_double: bool,
}

/// The dealer reveals the hole card and plays out its hand.
#[derive(Debug)]
pub struct DealerTurn {}

/// The round is decided.
#[derive(Debug)]
pub struct Resolved {
    pub outcome: Outcome,
}
