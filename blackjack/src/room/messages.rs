//! Room actor message types and the handle used to reach it.

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};

use crate::game::{
    entities::{Chips, Decision},
    events::{GameEvent, SeatIndex},
};

use super::RoomId;

/// Errors a room reports back to a caller. All of these are recoverable
/// from the room's point of view; the room itself keeps running.
#[derive(Clone, Debug, Eq, Error, PartialEq)]
pub enum RoomError {
    #[error("room is full")]
    RoomFull,
    #[error("game already started")]
    GameAlreadyStarted,
    #[error("only the host can do that")]
    NotHost,
    #[error("need at least {0} seats to start")]
    NotEnoughSeats(usize),
    #[error("no such seat")]
    NoSuchSeat,
    #[error("betting is closed")]
    BettingClosed,
    #[error("seat already placed a bet")]
    AlreadyBet,
    #[error("bet must be between {min} and {max}")]
    InvalidBet { min: Chips, max: Chips },
    #[error("not your turn")]
    NotYourTurn,
    #[error("double down is not available")]
    CannotDoubleDown,
    #[error("invalid room config: {0}")]
    InvalidConfig(&'static str),
    #[error("room is closed")]
    Closed,
}

/// Messages a room actor accepts.
#[derive(Debug)]
pub enum RoomMessage {
    /// Take a seat. Events for this seat flow through `events`.
    Join {
        name: String,
        events: mpsc::Sender<GameEvent>,
        respond: oneshot::Sender<Result<SeatIndex, RoomError>>,
    },
    /// Give up a seat (or note a disconnect).
    Leave { seat: SeatIndex },
    /// Host-only: start the game.
    Start {
        seat: SeatIndex,
        respond: oneshot::Sender<Result<(), RoomError>>,
    },
    /// Place a bet during the betting phase.
    PlaceBet {
        seat: SeatIndex,
        amount: Chips,
        respond: oneshot::Sender<Result<(), RoomError>>,
    },
    /// Act on the seat's turn.
    Decide {
        seat: SeatIndex,
        decision: Decision,
        respond: oneshot::Sender<Result<(), RoomError>>,
    },
}

/// A cheap, cloneable way to talk to a room actor.
#[derive(Clone)]
pub struct RoomHandle {
    sender: mpsc::Sender<RoomMessage>,
    id: RoomId,
}

impl RoomHandle {
    pub(crate) fn new(sender: mpsc::Sender<RoomMessage>, id: RoomId) -> Self {
        Self { sender, id }
    }

    #[must_use]
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Whether the actor has shut down.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Take a seat, receiving this seat's events on `events`.
    pub async fn join(
        &self,
        name: impl Into<String>,
        events: mpsc::Sender<GameEvent>,
    ) -> Result<SeatIndex, RoomError> {
        let (respond, rx) = oneshot::channel();
        self.sender
            .send(RoomMessage::Join {
                name: name.into(),
                events,
                respond,
            })
            .await
            .map_err(|_| RoomError::Closed)?;
        rx.await.map_err(|_| RoomError::Closed)?
    }

    pub async fn start(&self, seat: SeatIndex) -> Result<(), RoomError> {
        self.request(|respond| RoomMessage::Start { seat, respond })
            .await
    }

    pub async fn place_bet(&self, seat: SeatIndex, amount: Chips) -> Result<(), RoomError> {
        self.request(|respond| RoomMessage::PlaceBet {
            seat,
            amount,
            respond,
        })
        .await
    }

    pub async fn decide(&self, seat: SeatIndex, decision: Decision) -> Result<(), RoomError> {
        self.request(|respond| RoomMessage::Decide {
            seat,
            decision,
            respond,
        })
        .await
    }

    /// Fire-and-forget: the seat is gone whether or not the room hears
    /// about it in time.
    pub async fn leave(&self, seat: SeatIndex) {
        let _ = self.sender.send(RoomMessage::Leave { seat }).await;
    }

    async fn request(
        &self,
        build: impl FnOnce(oneshot::Sender<Result<(), RoomError>>) -> RoomMessage,
    ) -> Result<(), RoomError> {
        let (respond, rx) = oneshot::channel();
        self.sender
            .send(build(respond))
            .await
            .map_err(|_| RoomError::Closed)?;
        rx.await.map_err(|_| RoomError::Closed)?
    }
}
