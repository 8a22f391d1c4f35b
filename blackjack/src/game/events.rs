//! Semantic game events emitted by the dealer engine.
//!
//! Events are the engine's only output surface: the TCP handler maps a
//! subset of them onto wire payloads, the room coordinator fans them out
//! to every seat, and a relay may forward them to another transport as
//! long as it preserves their order.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::{
    entities::{Card, Chips, Decision, Outcome},
    stats::SessionStats,
};

/// A seat's position within a room. Single-player sessions use seat 0.
pub type SeatIndex = usize;

/// Where a card landed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Spot {
    Seat(SeatIndex),
    Dealer,
}

/// Why a room was closed.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum CloseReason {
    HostLeft,
    NotEnoughSeats,
    Finished,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::HostLeft => "host left",
            Self::NotEnoughSeats => "not enough seats",
            Self::Finished => "game finished",
        };
        write!(f, "{repr}")
    }
}

/// Everything observable about a game, in emission order.
///
/// A dealt card with `card: None` is face down: its identity is withheld
/// until a later [`GameEvent::HoleCardRevealed`].
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub enum GameEvent {
    RoundStarted {
        round: u8,
        rounds_total: u8,
    },
    BetPrompt {
        seat: SeatIndex,
        chips: Chips,
        min_bet: Chips,
        max_bet: Chips,
    },
    BetPlaced {
        seat: SeatIndex,
        amount: Chips,
        chips: Chips,
    },
    CardDealt {
        spot: Spot,
        card: Option<Card>,
    },
    NaturalBlackjack {
        seat: SeatIndex,
    },
    TurnPrompt {
        seat: SeatIndex,
        total: u8,
        choices: Vec<Decision>,
    },
    DecisionMade {
        seat: SeatIndex,
        decision: Decision,
    },
    Busted {
        seat: SeatIndex,
        total: u8,
    },
    HoleCardRevealed {
        card: Card,
    },
    DealerBusted {
        total: u8,
    },
    RoundResolved {
        seat: SeatIndex,
        outcome: Outcome,
        player_total: u8,
        dealer_total: u8,
        payout: Chips,
    },
    GameFinished {
        seat: SeatIndex,
        stats: SessionStats,
        broke: bool,
    },
    SeatJoined {
        seat: SeatIndex,
        name: String,
    },
    SeatLeft {
        seat: SeatIndex,
    },
    HostChanged {
        seat: SeatIndex,
    },
    RoomClosed {
        reason: CloseReason,
    },
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::RoundStarted {
                round,
                rounds_total,
            } => write!(f, "round {round}/{rounds_total} started"),
            Self::BetPrompt { seat, chips, .. } => {
                write!(f, "seat {seat} to bet ({chips} chips)")
            }
            Self::BetPlaced { seat, amount, .. } => write!(f, "seat {seat} bet {amount}"),
            Self::CardDealt { spot, card } => match (spot, card) {
                (Spot::Seat(seat), Some(card)) => write!(f, "seat {seat} receives {card}"),
                (Spot::Seat(seat), None) => write!(f, "seat {seat} receives a face-down card"),
                (Spot::Dealer, Some(card)) => write!(f, "dealer shows {card}"),
                (Spot::Dealer, None) => write!(f, "dealer takes a face-down card"),
            },
            Self::NaturalBlackjack { seat } => write!(f, "seat {seat} has blackjack"),
            Self::TurnPrompt { seat, total, .. } => {
                write!(f, "seat {seat} to act on {total}")
            }
            Self::DecisionMade { seat, decision } => write!(f, "seat {seat} chose to {decision}"),
            Self::Busted { seat, total } => write!(f, "seat {seat} busts with {total}"),
            Self::HoleCardRevealed { card } => write!(f, "dealer reveals {card}"),
            Self::DealerBusted { total } => write!(f, "dealer busts with {total}"),
            Self::RoundResolved { seat, outcome, .. } => {
                write!(f, "seat {seat}: {outcome}")
            }
            Self::GameFinished { seat, broke, .. } => {
                if *broke {
                    write!(f, "seat {seat} is out of chips")
                } else {
                    write!(f, "seat {seat} finished")
                }
            }
            Self::SeatJoined { seat, name } => write!(f, "{name} joined as seat {seat}"),
            Self::SeatLeft { seat } => write!(f, "seat {seat} left"),
            Self::HostChanged { seat } => write!(f, "seat {seat} is now the host"),
            Self::RoomClosed { reason } => write!(f, "room closed: {reason}"),
        }
    }
}
