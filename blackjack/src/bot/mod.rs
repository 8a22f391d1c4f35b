//! Automated play: the basic-strategy policy and a driver that plays a
//! whole session with it.

pub mod decision;

pub use decision::{BasicStrategy, StrategyConfig};

use async_trait::async_trait;

use crate::game::{
    entities::{Chips, Decision},
    events::GameEvent,
    session::{BetView, SeatDriver, SessionError, TurnView},
};

/// A seat driver that answers every prompt from the strategy policy and
/// always bets the table minimum. Events can optionally be forwarded to
/// a channel for observers.
pub struct BotDriver {
    strategy: BasicStrategy,
    events: Option<tokio::sync::mpsc::Sender<GameEvent>>,
}

impl BotDriver {
    #[must_use]
    pub fn new(strategy: BasicStrategy) -> Self {
        Self {
            strategy,
            events: None,
        }
    }

    #[must_use]
    pub fn with_events(mut self, events: tokio::sync::mpsc::Sender<GameEvent>) -> Self {
        self.events = Some(events);
        self
    }
}

#[async_trait]
impl SeatDriver for BotDriver {
    async fn deliver(&mut self, event: &GameEvent) -> Result<(), SessionError> {
        if let Some(events) = &self.events
            && events.send(event.clone()).await.is_err()
        {
            return Err(SessionError::Disconnected);
        }
        Ok(())
    }

    async fn next_decision(&mut self, view: &TurnView) -> Result<Decision, SessionError> {
        let (decision, reason) = self.strategy.decide(&view.player, view.dealer_upcard);
        log::debug!("bot seat {}: {decision} ({reason})", view.seat);
        Ok(decision)
    }

    async fn next_bet(&mut self, view: &BetView) -> Result<Chips, SessionError> {
        Ok(view.min_bet)
    }
}
