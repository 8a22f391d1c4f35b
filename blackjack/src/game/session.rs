//! A single-seat game session: the loop that runs every round of one
//! game from the opening deal to the final statistics.
//!
//! The session is transport-agnostic. It talks to the outside world only
//! through a [`SeatDriver`], which delivers semantic events and supplies
//! decisions and bets. The TCP handler, the strategy bot, and test
//! harnesses are all just different drivers; the state machine they
//! drive is identical.

use async_trait::async_trait;
use thiserror::Error;

use super::{
    constants::{MAX_BET, MIN_BET, STARTING_CHIPS},
    entities::{Card, Chips, Decision, Deck, GameMode, Hand, Outcome},
    events::{GameEvent, SeatIndex},
    round::{BetOutcome, DealOutcome, Round, RoundContext, TurnOutcome},
    states::{Betting, DealerTurn, Dealing, PlayerTurn, Resolved},
    stats::SessionStats,
};
use crate::net::ProtocolError;

/// Errors that end a session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The peer went away. Treated as graceful early termination, not a
    /// failure: whatever statistics exist are finalized.
    #[error("peer disconnected")]
    Disconnected,
    /// The peer violated the wire protocol; fatal to this session.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
    /// The driver asked for something its transport cannot express.
    #[error("operation not supported by this transport")]
    Unsupported,
    #[error("i/o failure: {0}")]
    Io(#[from] std::io::Error),
}

/// What the driver sees when asked for a turn decision.
#[derive(Clone, Debug)]
pub struct TurnView {
    pub seat: SeatIndex,
    pub player: Hand,
    pub dealer_upcard: Card,
    pub choices: Vec<Decision>,
}

/// What the driver sees when asked for a bet.
#[derive(Clone, Copy, Debug)]
pub struct BetView {
    pub seat: SeatIndex,
    pub chips: Chips,
    pub min_bet: Chips,
    pub max_bet: Chips,
}

/// The session's one connection to the outside: an event sink plus a
/// source of decisions and bets.
#[async_trait]
pub trait SeatDriver: Send {
    async fn deliver(&mut self, event: &GameEvent) -> Result<(), SessionError>;
    async fn next_decision(&mut self, view: &TurnView) -> Result<Decision, SessionError>;
    async fn next_bet(&mut self, view: &BetView) -> Result<Chips, SessionError>;
}

/// Why a session ended.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SessionEnd {
    /// All requested rounds were played.
    Completed,
    /// The balance can no longer cover the minimum bet.
    Broke,
    /// The peer went away before the rounds were done.
    Disconnected,
}

/// The session's final accounting.
#[derive(Clone, Debug)]
pub struct SessionReport {
    pub end: SessionEnd,
    pub rounds_completed: u8,
    pub stats: SessionStats,
}

enum RoundFlow {
    Continue,
    Broke,
}

/// One connected player's game, from accepted request to game over.
///
/// Owns the deck, the chip balance, and the statistics; nothing outside
/// the session mutates them.
#[derive(Debug)]
pub struct GameSession {
    mode: GameMode,
    seat: SeatIndex,
    rounds_total: u8,
    rounds_completed: u8,
    chips: Chips,
    deck: Deck,
    stats: SessionStats,
}

impl GameSession {
    #[must_use]
    pub fn new(mode: GameMode, rounds_total: u8) -> Self {
        let chips = if mode.has_betting() { STARTING_CHIPS } else { 0 };
        let mut stats = SessionStats::default();
        if chips > 0 {
            stats.update_chips(chips);
        }
        Self {
            mode,
            seat: 0,
            rounds_total,
            rounds_completed: 0,
            chips,
            deck: Deck::new(),
            stats,
        }
    }

    /// Swap in a specific deck (seeded or stacked).
    #[must_use]
    pub fn with_deck(mut self, deck: Deck) -> Self {
        self.deck = deck;
        self
    }

    /// Start from a specific bankroll instead of the table default.
    #[must_use]
    pub fn with_chips(mut self, chips: Chips) -> Self {
        self.chips = chips;
        self.stats = SessionStats::default();
        if chips > 0 {
            self.stats.update_chips(chips);
        }
        self
    }

    #[must_use]
    pub fn chips(&self) -> Chips {
        self.chips
    }

    /// Run every round to completion, early termination included.
    ///
    /// A disconnect reports as a [`SessionEnd::Disconnected`] outcome;
    /// protocol violations and transport failures surface as errors.
    pub async fn run<D>(mut self, driver: &mut D) -> Result<SessionReport, SessionError>
    where
        D: SeatDriver + ?Sized,
    {
        let mut end = SessionEnd::Completed;
        while self.rounds_completed < self.rounds_total {
            match self.play_round(driver).await {
                Ok(RoundFlow::Continue) => {}
                Ok(RoundFlow::Broke) => {
                    end = SessionEnd::Broke;
                    break;
                }
                Err(SessionError::Disconnected) => {
                    end = SessionEnd::Disconnected;
                    break;
                }
                Err(error) => return Err(error),
            }
        }

        let broke = end == SessionEnd::Broke;
        if end != SessionEnd::Disconnected {
            let _ = driver
                .deliver(&GameEvent::GameFinished {
                    seat: self.seat,
                    stats: self.stats.clone(),
                    broke,
                })
                .await;
        }

        Ok(SessionReport {
            end,
            rounds_completed: self.rounds_completed,
            stats: self.stats,
        })
    }

    async fn play_round<D>(&mut self, driver: &mut D) -> Result<RoundFlow, SessionError>
    where
        D: SeatDriver + ?Sized,
    {
        if self.mode.has_betting() && self.chips < MIN_BET {
            return Ok(RoundFlow::Broke);
        }

        let round_no = self.rounds_completed + 1;
        driver
            .deliver(&GameEvent::RoundStarted {
                round: round_no,
                rounds_total: self.rounds_total,
            })
            .await?;

        let dealing = if self.mode.has_betting() {
            self.take_bet(driver, round_no).await?
        } else {
            Round::<Dealing>::new(self.seat, round_no, self.rounds_total)
        };

        match dealing.deal(&mut self.deck) {
            DealOutcome::Natural(mut dealer_turn) => {
                flush_events(driver, &mut dealer_turn.data).await?;
                self.finish_dealer(driver, dealer_turn).await
            }
            DealOutcome::Turn(mut turn) => {
                flush_events(driver, &mut turn.data).await?;
                self.player_turn(driver, turn).await
            }
        }
    }

    async fn take_bet<D>(
        &mut self,
        driver: &mut D,
        round_no: u8,
    ) -> Result<Round<Dealing>, SessionError>
    where
        D: SeatDriver + ?Sized,
    {
        let mut betting = Round::<Betting>::new(self.seat, round_no, self.rounds_total);
        let min_bet = MIN_BET;
        let max_bet = MAX_BET.min(self.chips);
        loop {
            let view = BetView {
                seat: self.seat,
                chips: self.chips,
                min_bet,
                max_bet,
            };
            driver
                .deliver(&GameEvent::BetPrompt {
                    seat: self.seat,
                    chips: self.chips,
                    min_bet,
                    max_bet,
                })
                .await?;
            let amount = driver.next_bet(&view).await?;
            match betting.place_bet(amount, min_bet, max_bet) {
                BetOutcome::Accepted(dealing) => {
                    self.chips -= amount;
                    self.stats.update_chips(self.chips);
                    driver
                        .deliver(&GameEvent::BetPlaced {
                            seat: self.seat,
                            amount,
                            chips: self.chips,
                        })
                        .await?;
                    return Ok(dealing);
                }
                BetOutcome::Rejected(again, error) => {
                    log::debug!("seat {}: {error}, re-prompting", self.seat);
                    betting = again;
                }
            }
        }
    }

    async fn player_turn<D>(
        &mut self,
        driver: &mut D,
        mut turn: Round<PlayerTurn>,
    ) -> Result<RoundFlow, SessionError>
    where
        D: SeatDriver + ?Sized,
    {
        loop {
            let choices = self.turn_choices(&turn);
            driver
                .deliver(&GameEvent::TurnPrompt {
                    seat: self.seat,
                    total: turn.data.player.total(),
                    choices: choices.clone(),
                })
                .await?;
            let view = TurnView {
                seat: self.seat,
                player: turn.data.player.clone(),
                dealer_upcard: turn.dealer_upcard(),
                choices,
            };
            let decision = driver.next_decision(&view).await?;

            match decision {
                Decision::Hit => {
                    self.stats.record_decision(decision);
                    driver
                        .deliver(&GameEvent::DecisionMade {
                            seat: self.seat,
                            decision,
                        })
                        .await?;
                    match turn.hit(&mut self.deck) {
                        TurnOutcome::Continue(next) => turn = next,
                        TurnOutcome::Busted(mut resolved) => {
                            flush_events(driver, &mut resolved.data).await?;
                            return self.resolve_round(driver, resolved).await;
                        }
                        TurnOutcome::Standing(dealer_turn) => {
                            return self.finish_dealer(driver, dealer_turn).await;
                        }
                    }
                    flush_events(driver, &mut turn.data).await?;
                }
                Decision::Stand => {
                    self.stats.record_decision(decision);
                    driver
                        .deliver(&GameEvent::DecisionMade {
                            seat: self.seat,
                            decision,
                        })
                        .await?;
                    let dealer_turn = turn.stand();
                    return self.finish_dealer(driver, dealer_turn).await;
                }
                Decision::DoubleDown => {
                    if !self.mode.has_betting()
                        || !turn.can_double()
                        || self.chips < turn.data.bet
                    {
                        log::debug!("seat {}: double down unavailable, re-prompting", self.seat);
                        continue;
                    }
                    self.chips -= turn.data.bet;
                    self.stats.update_chips(self.chips);
                    self.stats.record_decision(decision);
                    driver
                        .deliver(&GameEvent::DecisionMade {
                            seat: self.seat,
                            decision,
                        })
                        .await?;
                    match turn.double_down(&mut self.deck) {
                        Ok(TurnOutcome::Standing(dealer_turn)) => {
                            return self.finish_dealer(driver, dealer_turn).await;
                        }
                        Ok(TurnOutcome::Busted(mut resolved)) => {
                            flush_events(driver, &mut resolved.data).await?;
                            return self.resolve_round(driver, resolved).await;
                        }
                        Ok(TurnOutcome::Continue(next)) => turn = next,
                        Err((next, error)) => {
                            log::debug!("seat {}: {error}, re-prompting", self.seat);
                            turn = next;
                        }
                    }
                }
            }
        }
    }

    async fn finish_dealer<D>(
        &mut self,
        driver: &mut D,
        dealer_turn: Round<DealerTurn>,
    ) -> Result<RoundFlow, SessionError>
    where
        D: SeatDriver + ?Sized,
    {
        let mut resolved = dealer_turn.play(&mut self.deck);
        flush_events(driver, &mut resolved.data).await?;
        self.resolve_round(driver, resolved).await
    }

    async fn resolve_round<D>(
        &mut self,
        driver: &mut D,
        resolved: Round<Resolved>,
    ) -> Result<RoundFlow, SessionError>
    where
        D: SeatDriver + ?Sized,
    {
        let outcome = resolved.outcome();
        let data = resolved.data;
        let winnings = settle(outcome, data.bet, data.player.is_blackjack());
        if self.mode.has_betting() {
            self.chips += winnings;
            self.stats.update_chips(self.chips);
        }
        self.stats.record_round(
            outcome,
            &data.player,
            &data.dealer,
            data.bet,
            data.doubled,
            winnings,
        );
        driver
            .deliver(&GameEvent::RoundResolved {
                seat: self.seat,
                outcome,
                player_total: data.player.total(),
                dealer_total: data.dealer.total(),
                payout: winnings,
            })
            .await?;
        self.rounds_completed += 1;

        if self.mode.has_betting() && self.chips < MIN_BET {
            return Ok(RoundFlow::Broke);
        }
        Ok(RoundFlow::Continue)
    }

    fn turn_choices(&self, turn: &Round<PlayerTurn>) -> Vec<Decision> {
        let mut choices = vec![Decision::Hit, Decision::Stand];
        if self.mode.has_betting() && turn.can_double() && self.chips >= turn.data.bet {
            choices.push(Decision::DoubleDown);
        }
        choices
    }
}

/// What an outcome returns to the balance: a natural win pays 3:2 on top
/// of the escrow, a plain win pays even money, a push refunds, a loss
/// forfeits.
#[must_use]
pub(crate) fn settle(outcome: Outcome, bet: Chips, natural: bool) -> Chips {
    match outcome {
        Outcome::Win if natural => bet + bet * 3 / 2,
        Outcome::Win => bet * 2,
        Outcome::Push => bet,
        Outcome::Loss => 0,
    }
}

async fn flush_events<D>(driver: &mut D, data: &mut RoundContext) -> Result<(), SessionError>
where
    D: SeatDriver + ?Sized,
{
    for event in data.drain_events() {
        driver.deliver(&event).await?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::{Card, Suit};
    use std::collections::VecDeque;

    fn card(rank: u8) -> Card {
        Card::new(rank, Suit::Diamond)
    }

    /// A driver fed from fixed scripts, recording everything delivered.
    #[derive(Default)]
    struct ScriptedDriver {
        decisions: VecDeque<Decision>,
        bets: VecDeque<Chips>,
        events: Vec<GameEvent>,
    }

    #[async_trait]
    impl SeatDriver for ScriptedDriver {
        async fn deliver(&mut self, event: &GameEvent) -> Result<(), SessionError> {
            self.events.push(event.clone());
            Ok(())
        }

        async fn next_decision(&mut self, _view: &TurnView) -> Result<Decision, SessionError> {
            Ok(self.decisions.pop_front().unwrap_or(Decision::Stand))
        }

        async fn next_bet(&mut self, view: &BetView) -> Result<Chips, SessionError> {
            Ok(self.bets.pop_front().unwrap_or(view.min_bet))
        }
    }

    // === Settlement Tests ===

    #[test]
    fn test_settlement_table() {
        assert_eq!(settle(Outcome::Win, 20, true), 50);
        assert_eq!(settle(Outcome::Win, 20, false), 40);
        assert_eq!(settle(Outcome::Push, 20, false), 20);
        assert_eq!(settle(Outcome::Loss, 20, false), 0);
    }

    // === Session Flow Tests ===

    #[tokio::test]
    async fn test_classic_session_plays_every_round() {
        let deck = Deck::stacked(vec![
            // Round 1: player 19 stands, dealer 18.
            card(10),
            card(9),
            card(10),
            card(8),
            // Round 2: player 20 stands, dealer 17.
            card(10),
            card(10),
            card(10),
            card(7),
        ]);
        let mut driver = ScriptedDriver::default();
        let report = GameSession::new(GameMode::Classic, 2)
            .with_deck(deck)
            .run(&mut driver)
            .await
            .unwrap();

        assert_eq!(report.end, SessionEnd::Completed);
        assert_eq!(report.rounds_completed, 2);
        assert_eq!(report.stats.wins, 2);
        assert_eq!(report.stats.total_stands, 2);
        assert!(matches!(
            driver.events.last(),
            Some(GameEvent::GameFinished { broke: false, .. })
        ));
    }

    /// Scenario: a natural pays 3:2 against a dealer 17.
    #[tokio::test]
    async fn test_natural_pays_three_to_two() {
        let deck = Deck::stacked(vec![card(1), card(10), card(9), card(8)]);
        let mut driver = ScriptedDriver::default();
        driver.bets.push_back(20);
        let report = GameSession::new(GameMode::Casino, 1)
            .with_deck(deck)
            .run(&mut driver)
            .await
            .unwrap();

        // 1000 - 20 escrow + 50 payout.
        assert_eq!(report.stats.current_chips, 1030);
        assert_eq!(report.stats.blackjacks, 1);
        // No decision was ever requested.
        assert_eq!(report.stats.total_hits + report.stats.total_stands, 0);
    }

    /// Scenario: chips 100, bet 100, bust — the session ends broke with
    /// rounds still remaining.
    #[tokio::test]
    async fn test_busting_the_bankroll_ends_the_session() {
        let deck = Deck::stacked(vec![
            card(10),
            card(6), // player 16
            card(10),
            card(9), // dealer 19
            card(10), // hit: 26, bust
        ]);
        let mut driver = ScriptedDriver::default();
        driver.bets.push_back(100); // the whole bankroll
        driver.decisions.push_back(Decision::Hit);
        let report = GameSession::new(GameMode::Casino, 5)
            .with_chips(100)
            .with_deck(deck)
            .run(&mut driver)
            .await
            .unwrap();

        assert_eq!(report.end, SessionEnd::Broke);
        assert_eq!(report.rounds_completed, 1);
        assert_eq!(report.stats.current_chips, 0);
        assert!(matches!(
            driver.events.last(),
            Some(GameEvent::GameFinished { broke: true, .. })
        ));
    }

    #[tokio::test]
    async fn test_out_of_range_bet_is_reprompted() {
        let deck = Deck::stacked(vec![card(10), card(9), card(10), card(8)]);
        let mut driver = ScriptedDriver::default();
        driver.bets.push_back(7); // below the minimum
        driver.bets.push_back(5000); // above the cap
        driver.bets.push_back(50);
        let report = GameSession::new(GameMode::Casino, 1)
            .with_deck(deck)
            .run(&mut driver)
            .await
            .unwrap();

        assert_eq!(report.end, SessionEnd::Completed);
        let prompts = driver
            .events
            .iter()
            .filter(|e| matches!(e, GameEvent::BetPrompt { .. }))
            .count();
        assert_eq!(prompts, 3);
        // Won even money on the 50.
        assert_eq!(report.stats.current_chips, 1050);
    }

    #[tokio::test]
    async fn test_double_down_unavailable_in_classic() {
        let deck = Deck::stacked(vec![
            card(6),
            card(5),
            card(10),
            card(8),
        ]);
        let mut driver = ScriptedDriver::default();
        driver.decisions.push_back(Decision::DoubleDown);
        driver.decisions.push_back(Decision::Stand);
        let report = GameSession::new(GameMode::Classic, 1)
            .with_deck(deck)
            .run(&mut driver)
            .await
            .unwrap();

        // The double was refused and the stand played out.
        assert_eq!(report.stats.double_downs, 0);
        assert_eq!(report.stats.total_stands, 1);
    }

    #[tokio::test]
    async fn test_disconnect_finalizes_early() {
        struct DropsOut;

        #[async_trait]
        impl SeatDriver for DropsOut {
            async fn deliver(&mut self, _event: &GameEvent) -> Result<(), SessionError> {
                Ok(())
            }
            async fn next_decision(&mut self, _view: &TurnView) -> Result<Decision, SessionError> {
                Err(SessionError::Disconnected)
            }
            async fn next_bet(&mut self, _view: &BetView) -> Result<Chips, SessionError> {
                Err(SessionError::Disconnected)
            }
        }

        let deck = Deck::stacked(vec![card(10), card(6), card(10), card(8)]);
        let report = GameSession::new(GameMode::Classic, 3)
            .with_deck(deck)
            .run(&mut DropsOut)
            .await
            .unwrap();
        assert_eq!(report.end, SessionEnd::Disconnected);
        assert_eq!(report.rounds_completed, 0);
    }

    #[tokio::test]
    async fn test_event_order_within_a_round() {
        let deck = Deck::stacked(vec![card(10), card(7), card(9), card(6), card(5)]);
        let mut driver = ScriptedDriver::default();
        let _ = GameSession::new(GameMode::Classic, 1)
            .with_deck(deck)
            .run(&mut driver)
            .await
            .unwrap();

        // Deals precede the prompt, which precedes the reveal, which
        // precedes the result.
        let position = |pred: fn(&GameEvent) -> bool| {
            driver.events.iter().position(pred).expect("event present")
        };
        let first_deal = position(|e| matches!(e, GameEvent::CardDealt { .. }));
        let prompt = position(|e| matches!(e, GameEvent::TurnPrompt { .. }));
        let reveal = position(|e| matches!(e, GameEvent::HoleCardRevealed { .. }));
        let result = position(|e| matches!(e, GameEvent::RoundResolved { .. }));
        assert!(first_deal < prompt && prompt < reveal && reveal < result);
    }
}
