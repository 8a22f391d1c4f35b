//! The room actor: seat order, ready gating, betting aggregation, and
//! one shared dealer turn per round.
//!
//! Turn order is strict seat order. A seat that busts or stands is
//! terminal for the round and gets skipped; once every seat is terminal
//! the dealer plays exactly once and every seat is resolved against that
//! one hand. A bust is recorded the moment it happens but announced with
//! the rest of the results at the single resolution point, so no seat
//! observes another seat's post-round state early.

use tokio::{
    sync::mpsc,
    time::{Instant, sleep_until},
};

use crate::game::{
    entities::{Card, Chips, Decision, Deck, Hand},
    events::{CloseReason, GameEvent, SeatIndex, Spot},
    round::{dealer_plays, resolve},
    session::settle,
    stats::SessionStats,
};

use super::{
    RoomId,
    config::RoomConfig,
    messages::{RoomError, RoomHandle, RoomMessage},
};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Phase {
    Lobby,
    Betting,
    Turns(SeatIndex),
}

struct Seat {
    name: String,
    events: mpsc::Sender<GameEvent>,
    connected: bool,
    /// The seat's whole game is over (broke or finished) even though the
    /// room may play on.
    finished: bool,
    chips: Chips,
    stats: SessionStats,
    hand: Hand,
    bet: Option<Chips>,
    doubled: bool,
    first_action: bool,
    /// Stood, busted, or natural this round; skipped by the turn pointer.
    terminal: bool,
    busted: bool,
}

impl Seat {
    fn new(name: String, events: mpsc::Sender<GameEvent>, chips: Chips) -> Self {
        let mut stats = SessionStats::default();
        if chips > 0 {
            stats.update_chips(chips);
        }
        Self {
            name,
            events,
            connected: true,
            finished: false,
            chips,
            stats,
            hand: Hand::new(),
            bet: None,
            doubled: false,
            first_action: true,
            terminal: false,
            busted: false,
        }
    }

    fn live(&self) -> bool {
        self.connected && !self.finished
    }
}

/// One room's entire state, owned by its own task.
pub struct RoomActor {
    id: RoomId,
    config: RoomConfig,
    inbox: mpsc::Receiver<RoomMessage>,
    seats: Vec<Seat>,
    deck: Deck,
    dealer: Hand,
    hole_card: Option<Card>,
    phase: Phase,
    round: u8,
    deadline: Option<Instant>,
    next_round: bool,
    closed: bool,
}

impl RoomActor {
    /// Spawn a room with a fresh id and deck.
    #[must_use]
    pub fn spawn(config: RoomConfig) -> RoomHandle {
        Self::spawn_with(RoomId::generate(), config, Deck::new())
    }

    /// Spawn with a chosen id and deck (seeded or stacked decks make
    /// scripted multiplayer rounds reproducible).
    #[must_use]
    pub fn spawn_with(id: RoomId, config: RoomConfig, deck: Deck) -> RoomHandle {
        let (sender, inbox) = mpsc::channel(64);
        let handle = RoomHandle::new(sender, id.clone());
        let actor = Self {
            id,
            config,
            inbox,
            seats: Vec::new(),
            deck,
            dealer: Hand::new(),
            hole_card: None,
            phase: Phase::Lobby,
            round: 0,
            deadline: None,
            next_round: false,
            closed: false,
        };
        tokio::spawn(actor.run());
        handle
    }

    async fn run(mut self) {
        log::info!("room {}: open", self.id);
        while !self.closed {
            if self.next_round {
                self.next_round = false;
                self.begin_round().await;
                continue;
            }
            if let Some(deadline) = self.deadline {
                tokio::select! {
                    message = self.inbox.recv() => match message {
                        Some(message) => self.handle(message).await,
                        None => break,
                    },
                    () = sleep_until(deadline) => self.on_deadline().await,
                }
            } else {
                match self.inbox.recv().await {
                    Some(message) => self.handle(message).await,
                    None => break,
                }
            }
        }
        log::info!("room {}: actor stopped", self.id);
    }

    async fn handle(&mut self, message: RoomMessage) {
        match message {
            RoomMessage::Join {
                name,
                events,
                respond,
            } => {
                let result = self.join(name, events).await;
                let _ = respond.send(result);
            }
            RoomMessage::Leave { seat } => self.leave(seat).await,
            RoomMessage::Start { seat, respond } => {
                let result = self.start(seat).await;
                let _ = respond.send(result);
            }
            RoomMessage::PlaceBet {
                seat,
                amount,
                respond,
            } => {
                let result = self.place_bet(seat, amount).await;
                let _ = respond.send(result);
            }
            RoomMessage::Decide {
                seat,
                decision,
                respond,
            } => {
                let result = self.decide(seat, decision).await;
                let _ = respond.send(result);
            }
        }
    }

    async fn join(
        &mut self,
        name: String,
        events: mpsc::Sender<GameEvent>,
    ) -> Result<SeatIndex, RoomError> {
        if self.phase != Phase::Lobby {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.seats.len() >= self.config.max_seats {
            return Err(RoomError::RoomFull);
        }
        let chips = if self.config.betting {
            self.config.starting_chips
        } else {
            0
        };
        let seat = self.seats.len();
        self.seats.push(Seat::new(name.clone(), events, chips));
        log::info!("room {}: {name} took seat {seat}", self.id);
        self.broadcast(GameEvent::SeatJoined { seat, name }).await;
        Ok(seat)
    }

    async fn start(&mut self, seat: SeatIndex) -> Result<(), RoomError> {
        if self.phase != Phase::Lobby {
            return Err(RoomError::GameAlreadyStarted);
        }
        if self.host() != Some(seat) {
            return Err(RoomError::NotHost);
        }
        if self.live_count() < self.config.min_seats {
            return Err(RoomError::NotEnoughSeats(self.config.min_seats));
        }
        log::info!("room {}: game starting", self.id);
        self.begin_round().await;
        Ok(())
    }

    async fn begin_round(&mut self) {
        self.round += 1;
        self.dealer = Hand::new();
        self.hole_card = None;
        for seat in &mut self.seats {
            seat.hand = Hand::new();
            seat.bet = None;
            seat.doubled = false;
            seat.first_action = true;
            seat.terminal = false;
            seat.busted = false;
        }
        self.broadcast(GameEvent::RoundStarted {
            round: self.round,
            rounds_total: self.config.rounds,
        })
        .await;

        if self.config.betting {
            self.phase = Phase::Betting;
            self.deadline = Some(Instant::now() + self.config.bet_timeout);
            for seat in self.live_indices() {
                let chips = self.seats[seat].chips;
                self.send_to(
                    seat,
                    GameEvent::BetPrompt {
                        seat,
                        chips,
                        min_bet: self.config.min_bet,
                        max_bet: self.config.max_bet.min(chips),
                    },
                )
                .await;
            }
        } else {
            self.deal_all().await;
        }
    }

    async fn place_bet(&mut self, seat: SeatIndex, amount: Chips) -> Result<(), RoomError> {
        if self.phase != Phase::Betting {
            return Err(RoomError::BettingClosed);
        }
        let Some(state) = self.seats.get(seat) else {
            return Err(RoomError::NoSuchSeat);
        };
        if !state.live() {
            return Err(RoomError::NoSuchSeat);
        }
        if state.bet.is_some() {
            return Err(RoomError::AlreadyBet);
        }
        let min = self.config.min_bet;
        let max = self.config.max_bet.min(state.chips);
        if amount < min || amount > max {
            return Err(RoomError::InvalidBet { min, max });
        }

        let state = &mut self.seats[seat];
        state.bet = Some(amount);
        state.chips -= amount;
        let chips = state.chips;
        state.stats.update_chips(chips);
        self.broadcast(GameEvent::BetPlaced {
            seat,
            amount,
            chips,
        })
        .await;

        if self.all_bets_in() {
            self.deal_all().await;
        }
        Ok(())
    }

    async fn decide(&mut self, seat: SeatIndex, decision: Decision) -> Result<(), RoomError> {
        let Phase::Turns(turn) = self.phase else {
            return Err(RoomError::NotYourTurn);
        };
        if turn != seat {
            return Err(RoomError::NotYourTurn);
        }

        match decision {
            Decision::Hit => {
                {
                    let state = &mut self.seats[seat];
                    state.stats.record_decision(decision);
                    state.first_action = false;
                }
                self.broadcast(GameEvent::DecisionMade { seat, decision })
                    .await;
                let card = self.deck.draw();
                self.seats[seat].hand.push(card);
                self.broadcast(GameEvent::CardDealt {
                    spot: Spot::Seat(seat),
                    card: Some(card),
                })
                .await;

                if self.seats[seat].hand.is_bust() {
                    let total = self.seats[seat].hand.total();
                    let state = &mut self.seats[seat];
                    state.busted = true;
                    state.terminal = true;
                    self.broadcast(GameEvent::Busted { seat, total }).await;
                    self.advance_turn(seat + 1).await;
                } else {
                    self.deadline = Some(Instant::now() + self.config.turn_timeout);
                    self.prompt_turn(seat).await;
                }
            }
            Decision::Stand => {
                self.seats[seat].stats.record_decision(decision);
                self.broadcast(GameEvent::DecisionMade { seat, decision })
                    .await;
                self.seats[seat].terminal = true;
                self.advance_turn(seat + 1).await;
            }
            Decision::DoubleDown => {
                let state = &self.seats[seat];
                let bet = state.bet.unwrap_or(0);
                if !self.config.betting || !state.first_action || bet == 0 || state.chips < bet {
                    return Err(RoomError::CannotDoubleDown);
                }
                {
                    let state = &mut self.seats[seat];
                    state.chips -= bet;
                    state.bet = Some(bet * 2);
                    state.doubled = true;
                    let chips = state.chips;
                    state.stats.update_chips(chips);
                    state.stats.record_decision(decision);
                }
                self.broadcast(GameEvent::DecisionMade { seat, decision })
                    .await;
                let card = self.deck.draw();
                self.seats[seat].hand.push(card);
                self.broadcast(GameEvent::CardDealt {
                    spot: Spot::Seat(seat),
                    card: Some(card),
                })
                .await;
                if self.seats[seat].hand.is_bust() {
                    let total = self.seats[seat].hand.total();
                    self.seats[seat].busted = true;
                    self.broadcast(GameEvent::Busted { seat, total }).await;
                }
                self.seats[seat].terminal = true;
                self.advance_turn(seat + 1).await;
            }
        }
        Ok(())
    }

    async fn leave(&mut self, seat: SeatIndex) {
        let Some(state) = self.seats.get(seat) else {
            return;
        };
        if !state.connected {
            return;
        }
        let was_host = self.host() == Some(seat);
        self.seats[seat].connected = false;
        log::info!("room {}: seat {seat} left", self.id);
        self.broadcast(GameEvent::SeatLeft { seat }).await;

        if self.phase == Phase::Lobby {
            // A host walking out before the deal tears the room down.
            if was_host {
                self.close(CloseReason::HostLeft).await;
            }
            return;
        }

        if self.live_count() < self.config.min_seats {
            self.finish_all().await;
            self.close(CloseReason::NotEnoughSeats).await;
            return;
        }

        // The game survives a mid-game host loss; the dealer state lives
        // here, not in the host's connection.
        if was_host && let Some(new_host) = self.host() {
            self.broadcast(GameEvent::HostChanged { seat: new_host }).await;
        }

        match self.phase {
            Phase::Betting => {
                if self.all_bets_in() {
                    self.deal_all().await;
                }
            }
            Phase::Turns(turn) if turn == seat => {
                // An absent seat stands implicitly.
                self.seats[seat].terminal = true;
                self.advance_turn(seat + 1).await;
            }
            _ => {}
        }
    }

    async fn on_deadline(&mut self) {
        self.deadline = None;
        match self.phase {
            Phase::Betting => {
                for seat in self.live_indices() {
                    if self.seats[seat].bet.is_none() {
                        let amount = self.config.min_bet;
                        let state = &mut self.seats[seat];
                        state.bet = Some(amount);
                        state.chips = state.chips.saturating_sub(amount);
                        let chips = state.chips;
                        state.stats.update_chips(chips);
                        log::info!(
                            "room {}: seat {seat} timed out, betting the minimum",
                            self.id
                        );
                        self.broadcast(GameEvent::BetPlaced {
                            seat,
                            amount,
                            chips,
                        })
                        .await;
                    }
                }
                self.deal_all().await;
            }
            Phase::Turns(turn) => {
                log::info!("room {}: seat {turn} timed out, standing", self.id);
                self.seats[turn].stats.record_decision(Decision::Stand);
                self.broadcast(GameEvent::DecisionMade {
                    seat: turn,
                    decision: Decision::Stand,
                })
                .await;
                self.seats[turn].terminal = true;
                self.advance_turn(turn + 1).await;
            }
            Phase::Lobby => {}
        }
    }

    async fn deal_all(&mut self) {
        self.deadline = None;
        for seat in self.live_indices() {
            for _ in 0..2 {
                let card = self.deck.draw();
                self.seats[seat].hand.push(card);
                self.broadcast(GameEvent::CardDealt {
                    spot: Spot::Seat(seat),
                    card: Some(card),
                })
                .await;
            }
        }

        let upcard = self.deck.draw();
        self.dealer.push(upcard);
        self.broadcast(GameEvent::CardDealt {
            spot: Spot::Dealer,
            card: Some(upcard),
        })
        .await;
        self.hole_card = Some(self.deck.draw());
        self.broadcast(GameEvent::CardDealt {
            spot: Spot::Dealer,
            card: None,
        })
        .await;

        for seat in self.live_indices() {
            if self.seats[seat].hand.is_blackjack() {
                self.seats[seat].terminal = true;
                self.broadcast(GameEvent::NaturalBlackjack { seat }).await;
            }
        }

        self.advance_turn(0).await;
    }

    async fn advance_turn(&mut self, from: SeatIndex) {
        for seat in from..self.seats.len() {
            if self.seats[seat].live() && !self.seats[seat].terminal {
                self.phase = Phase::Turns(seat);
                self.deadline = Some(Instant::now() + self.config.turn_timeout);
                self.prompt_turn(seat).await;
                return;
            }
        }
        self.dealer_turn().await;
    }

    async fn prompt_turn(&mut self, seat: SeatIndex) {
        let total = self.seats[seat].hand.total();
        let choices = self.turn_choices(seat);
        self.broadcast(GameEvent::TurnPrompt {
            seat,
            total,
            choices,
        })
        .await;
    }

    fn turn_choices(&self, seat: SeatIndex) -> Vec<Decision> {
        let state = &self.seats[seat];
        let mut choices = vec![Decision::Hit, Decision::Stand];
        if self.config.betting
            && state.first_action
            && state.bet.is_some_and(|bet| state.chips >= bet)
        {
            choices.push(Decision::DoubleDown);
        }
        choices
    }

    /// The one shared dealer turn, after every seat is terminal.
    async fn dealer_turn(&mut self) {
        self.deadline = None;
        if let Some(hole) = self.hole_card.take() {
            self.dealer.push(hole);
            self.broadcast(GameEvent::HoleCardRevealed { card: hole })
                .await;
        }

        // The dealer only plays a hand out if someone is still standing
        // on an ordinary total; busts are already lost and naturals only
        // need the hole-card check.
        let must_draw = self.live_indices().iter().any(|&seat| {
            let state = &self.seats[seat];
            !state.busted && !state.hand.is_blackjack()
        });
        if must_draw {
            for card in dealer_plays(&mut self.dealer, &mut self.deck) {
                self.broadcast(GameEvent::CardDealt {
                    spot: Spot::Dealer,
                    card: Some(card),
                })
                .await;
            }
        }
        if self.dealer.is_bust() {
            self.broadcast(GameEvent::DealerBusted {
                total: self.dealer.total(),
            })
            .await;
        }

        self.resolve_round().await;
    }

    async fn resolve_round(&mut self) {
        for seat in self.live_indices() {
            let event = {
                let state = &mut self.seats[seat];
                let outcome = resolve(&state.hand, &self.dealer);
                let bet = state.bet.take().unwrap_or(0);
                let payout = settle(outcome, bet, state.hand.is_blackjack());
                if self.config.betting {
                    state.chips += payout;
                    let chips = state.chips;
                    state.stats.update_chips(chips);
                }
                state
                    .stats
                    .record_round(outcome, &state.hand, &self.dealer, bet, state.doubled, payout);
                GameEvent::RoundResolved {
                    seat,
                    outcome,
                    player_total: state.hand.total(),
                    dealer_total: self.dealer.total(),
                    payout,
                }
            };
            self.broadcast(event).await;
        }
        self.finish_round().await;
    }

    async fn finish_round(&mut self) {
        if self.round >= self.config.rounds {
            self.finish_all().await;
            self.close(CloseReason::Finished).await;
            return;
        }

        if self.config.betting {
            for seat in self.live_indices() {
                if self.seats[seat].chips < self.config.min_bet {
                    self.finish_seat(seat, true).await;
                }
            }
        }

        if self.live_count() < self.config.min_seats {
            self.finish_all().await;
            self.close(CloseReason::NotEnoughSeats).await;
            return;
        }

        self.next_round = true;
    }

    async fn finish_seat(&mut self, seat: SeatIndex, broke: bool) {
        let stats = self.seats[seat].stats.clone();
        self.send_to(seat, GameEvent::GameFinished { seat, stats, broke })
            .await;
        self.seats[seat].finished = true;
        if broke {
            log::info!(
                "room {}: seat {seat} ({}) is broke",
                self.id,
                self.seats[seat].name
            );
        }
    }

    async fn finish_all(&mut self) {
        for seat in self.live_indices() {
            self.finish_seat(seat, false).await;
        }
    }

    async fn close(&mut self, reason: CloseReason) {
        self.broadcast(GameEvent::RoomClosed { reason }).await;
        self.closed = true;
        log::info!("room {}: closed ({reason})", self.id);
    }

    fn host(&self) -> Option<SeatIndex> {
        self.seats.iter().position(Seat::live)
    }

    fn live_indices(&self) -> Vec<SeatIndex> {
        self.seats
            .iter()
            .enumerate()
            .filter(|(_, seat)| seat.live())
            .map(|(seat, _)| seat)
            .collect()
    }

    fn live_count(&self) -> usize {
        self.seats.iter().filter(|seat| seat.live()).count()
    }

    fn all_bets_in(&self) -> bool {
        self.live_indices()
            .iter()
            .all(|&seat| self.seats[seat].bet.is_some())
    }

    async fn broadcast(&mut self, event: GameEvent) {
        log::debug!("room {}: {event}", self.id);
        for seat in &mut self.seats {
            if seat.connected && seat.events.send(event.clone()).await.is_err() {
                // The receiver is gone. Turn and bet timeouts keep the
                // round moving; the seat formally leaves then.
                seat.connected = false;
            }
        }
    }

    async fn send_to(&mut self, seat: SeatIndex, event: GameEvent) {
        log::debug!("room {}: seat {seat} <- {event}", self.id);
        let state = &mut self.seats[seat];
        if state.connected && state.events.send(event).await.is_err() {
            state.connected = false;
        }
    }
}
