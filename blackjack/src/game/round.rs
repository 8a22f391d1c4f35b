//! The round state machine: dealing, turn order, dealer play, and the
//! outcome rules.
//!
//! A round is a `Round<T>` where `T` is one of the typed states in
//! [`super::states`]. Transitions consume the round and hand back the
//! next state; recoverable mistakes (a bad bet, an unavailable double)
//! return the round unchanged alongside the error so the caller can
//! re-prompt. Card and turn events accumulate in the round context and
//! are drained by whoever is driving the round.

use std::collections::VecDeque;

use thiserror::Error;

use super::{
    constants::DEALER_STAND_TOTAL,
    entities::{Card, Chips, Deck, Hand, Outcome},
    events::{GameEvent, SeatIndex, Spot},
    states::{Betting, DealerTurn, Dealing, PlayerTurn, Resolved},
};

/// Mistakes a player can recover from; the round re-prompts instead of
/// ending.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum UserError {
    #[error("bet must be between {min} and {max}")]
    InvalidBet { min: Chips, max: Chips },
    #[error("double down is not available")]
    CannotDoubleDown,
}

/// Data shared by every state of one round.
#[derive(Debug)]
pub struct RoundContext {
    pub seat: SeatIndex,
    pub round: u8,
    pub rounds_total: u8,
    pub player: Hand,
    pub dealer: Hand,
    /// The dealer's second card, withheld until the dealer turn.
    pub hole_card: Option<Card>,
    pub bet: Chips,
    pub doubled: bool,
    events: VecDeque<GameEvent>,
}

impl RoundContext {
    fn new(seat: SeatIndex, round: u8, rounds_total: u8) -> Self {
        Self {
            seat,
            round,
            rounds_total,
            player: Hand::new(),
            dealer: Hand::new(),
            hole_card: None,
            bet: 0,
            doubled: false,
            events: VecDeque::new(),
        }
    }

    fn emit(&mut self, event: GameEvent) {
        self.events.push_back(event);
    }

    /// Take everything emitted since the last drain, in order.
    pub fn drain_events(&mut self) -> VecDeque<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

/// One round of blackjack in a specific state.
#[derive(Debug)]
pub struct Round<T> {
    pub data: RoundContext,
    pub state: T,
}

/// Result of offering a bet to a betting round.
#[derive(Debug)]
pub enum BetOutcome {
    Accepted(Round<Dealing>),
    Rejected(Round<Betting>, UserError),
}

/// Where the opening deal leads.
#[derive(Debug)]
pub enum DealOutcome {
    /// The player acts next.
    Turn(Round<PlayerTurn>),
    /// An opening 21: the player turn is skipped entirely and the dealer
    /// still checks its own hand.
    Natural(Round<DealerTurn>),
}

/// Where a player action leads.
#[derive(Debug)]
pub enum TurnOutcome {
    Continue(Round<PlayerTurn>),
    Standing(Round<DealerTurn>),
    /// Over 21: the round is a loss on the spot and the dealer does not
    /// play.
    Busted(Round<Resolved>),
}

impl Round<Betting> {
    #[must_use]
    pub fn new(seat: SeatIndex, round: u8, rounds_total: u8) -> Self {
        Self {
            data: RoundContext::new(seat, round, rounds_total),
            state: Betting {},
        }
    }

    /// Accept a bet within `[min_bet, max_bet]`, or hand the round back
    /// for a re-prompt.
    #[must_use]
    pub fn place_bet(mut self, amount: Chips, min_bet: Chips, max_bet: Chips) -> BetOutcome {
        if amount < min_bet || amount > max_bet {
            return BetOutcome::Rejected(
                self,
                UserError::InvalidBet {
                    min: min_bet,
                    max: max_bet,
                },
            );
        }
        self.data.bet = amount;
        BetOutcome::Accepted(Round {
            data: self.data,
            state: Dealing {},
        })
    }
}

impl Round<Dealing> {
    #[must_use]
    pub fn new(seat: SeatIndex, round: u8, rounds_total: u8) -> Self {
        Self {
            data: RoundContext::new(seat, round, rounds_total),
            state: Dealing {},
        }
    }

    /// Deal two cards to the player and two to the dealer. The dealer's
    /// second card stays face down.
    #[must_use]
    pub fn deal(mut self, deck: &mut Deck) -> DealOutcome {
        let seat = self.data.seat;
        for _ in 0..2 {
            let card = deck.draw();
            self.data.player.push(card);
            self.data.emit(GameEvent::CardDealt {
                spot: Spot::Seat(seat),
                card: Some(card),
            });
        }

        let upcard = deck.draw();
        self.data.dealer.push(upcard);
        self.data.emit(GameEvent::CardDealt {
            spot: Spot::Dealer,
            card: Some(upcard),
        });

        self.data.hole_card = Some(deck.draw());
        self.data.emit(GameEvent::CardDealt {
            spot: Spot::Dealer,
            card: None,
        });

        if self.data.player.is_blackjack() {
            self.data.emit(GameEvent::NaturalBlackjack { seat });
            DealOutcome::Natural(Round {
                data: self.data,
                state: DealerTurn {},
            })
        } else {
            DealOutcome::Turn(Round {
                data: self.data,
                state: PlayerTurn { can_double: true },
            })
        }
    }
}

impl Round<PlayerTurn> {
    #[must_use]
    pub fn can_double(&self) -> bool {
        self.state.can_double
    }

    /// The dealer's face-up card.
    #[must_use]
    pub fn dealer_upcard(&self) -> Card {
        self.data.dealer.cards()[0]
    }

    #[must_use]
    pub fn hit(mut self, deck: &mut Deck) -> TurnOutcome {
        self.draw_for_player(deck);
        if self.data.player.is_bust() {
            self.bust()
        } else {
            self.state.can_double = false;
            TurnOutcome::Continue(self)
        }
    }

    #[must_use]
    pub fn stand(self) -> Round<DealerTurn> {
        Round {
            data: self.data,
            state: DealerTurn {},
        }
    }

    /// Double the escrowed bet, draw exactly one card, and stand (or
    /// bust). Callers enforce casino rules and the chip balance; the
    /// round itself only enforces that this is the first decision.
    pub fn double_down(mut self, deck: &mut Deck) -> Result<TurnOutcome, (Self, UserError)> {
        if !self.state.can_double {
            return Err((self, UserError::CannotDoubleDown));
        }
        self.data.bet *= 2;
        self.data.doubled = true;
        self.draw_for_player(deck);
        if self.data.player.is_bust() {
            Ok(self.bust())
        } else {
            Ok(TurnOutcome::Standing(Round {
                data: self.data,
                state: DealerTurn {},
            }))
        }
    }

    fn draw_for_player(&mut self, deck: &mut Deck) {
        let card = deck.draw();
        self.data.player.push(card);
        self.data.emit(GameEvent::CardDealt {
            spot: Spot::Seat(self.data.seat),
            card: Some(card),
        });
    }

    fn bust(mut self) -> TurnOutcome {
        self.data.emit(GameEvent::Busted {
            seat: self.data.seat,
            total: self.data.player.total(),
        });
        TurnOutcome::Busted(Round {
            data: self.data,
            state: Resolved {
                outcome: Outcome::Loss,
            },
        })
    }
}

impl Round<DealerTurn> {
    /// Reveal the hole card, play out the dealer's hand, and decide the
    /// round. Against a natural the dealer only checks its own hand and
    /// never draws.
    #[must_use]
    pub fn play(mut self, deck: &mut Deck) -> Round<Resolved> {
        if let Some(hole) = self.data.hole_card.take() {
            self.data.dealer.push(hole);
            self.data.emit(GameEvent::HoleCardRevealed { card: hole });
        }

        if !self.data.player.is_blackjack() {
            for card in dealer_plays(&mut self.data.dealer, deck) {
                self.data.emit(GameEvent::CardDealt {
                    spot: Spot::Dealer,
                    card: Some(card),
                });
            }
        }

        if self.data.dealer.is_bust() {
            self.data.emit(GameEvent::DealerBusted {
                total: self.data.dealer.total(),
            });
        }

        let outcome = resolve(&self.data.player, &self.data.dealer);
        Round {
            data: self.data,
            state: Resolved { outcome },
        }
    }
}

impl Round<Resolved> {
    #[must_use]
    pub fn outcome(&self) -> Outcome {
        self.state.outcome
    }
}

/// Draw for the dealer while its total is under 17, returning the cards
/// taken. Shared by single-seat rounds and the room coordinator's one
/// dealer turn per table.
pub fn dealer_plays(dealer: &mut Hand, deck: &mut Deck) -> Vec<Card> {
    let mut drawn = Vec::new();
    while dealer.total() < DEALER_STAND_TOTAL {
        let card = deck.draw();
        dealer.push(card);
        drawn.push(card);
    }
    drawn
}

/// The outcome rules, exactly and exhaustively:
///
/// - a busted player loses regardless of the dealer;
/// - a natural beats anything but another natural, which pushes;
/// - a busted dealer loses to any surviving player;
/// - otherwise the higher total wins and equal totals push.
#[must_use]
pub fn resolve(player: &Hand, dealer: &Hand) -> Outcome {
    if player.is_bust() {
        return Outcome::Loss;
    }
    if player.is_blackjack() {
        return if dealer.is_blackjack() {
            Outcome::Push
        } else {
            Outcome::Win
        };
    }
    if dealer.is_bust() {
        return Outcome::Win;
    }
    let (p, d) = (player.total(), dealer.total());
    if p > d {
        Outcome::Win
    } else if p < d {
        Outcome::Loss
    } else {
        Outcome::Push
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit;

    fn card(rank: u8) -> Card {
        Card::new(rank, Suit::Club)
    }

    fn hand(ranks: &[u8]) -> Hand {
        ranks.iter().map(|&r| card(r)).collect::<Vec<_>>().into()
    }

    // === Outcome Rule Tests ===

    #[test]
    fn test_resolve_covers_every_pairing() {
        // Hands standing in for bust and each total 17..=21.
        let bust = hand(&[10, 9, 5]);
        let totals: Vec<Hand> = (17..=21).map(|t| hand(&[10, t - 10])).collect();

        let mut cases = vec![(bust.clone(), bust.clone())];
        for p in &totals {
            cases.push((p.clone(), bust.clone()));
            cases.push((bust.clone(), p.clone()));
            for d in &totals {
                cases.push((p.clone(), d.clone()));
            }
        }

        for (player, dealer) in cases {
            let outcome = resolve(&player, &dealer);
            let expected = if player.is_bust() {
                Outcome::Loss
            } else if dealer.is_bust() {
                Outcome::Win
            } else if player.total() > dealer.total() {
                Outcome::Win
            } else if player.total() < dealer.total() {
                Outcome::Loss
            } else {
                Outcome::Push
            };
            assert_eq!(outcome, expected, "{player} vs {dealer}");
        }
    }

    #[test]
    fn test_resolve_naturals() {
        let natural = hand(&[1, 10]);
        let seventeen = hand(&[9, 8]);
        let made_21 = hand(&[5, 6, 10]);

        assert_eq!(resolve(&natural, &seventeen), Outcome::Win);
        assert_eq!(resolve(&natural, &hand(&[1, 13])), Outcome::Push);
        // A 21 made with three cards is not a natural; totals tie.
        assert_eq!(resolve(&made_21, &hand(&[1, 10])), Outcome::Push);
    }

    // === Dealer Play Tests ===

    #[test]
    fn test_dealer_stands_at_seventeen_or_better() {
        let mut dealer = hand(&[10, 7]);
        let mut deck = Deck::seeded(3);
        assert!(dealer_plays(&mut dealer, &mut deck).is_empty());

        let mut dealer = hand(&[1, 6]); // soft 17 stands too
        assert!(dealer_plays(&mut dealer, &mut deck).is_empty());
    }

    #[test]
    fn test_dealer_draws_to_seventeen() {
        let mut dealer = hand(&[2, 3]);
        let mut deck = Deck::seeded(11);
        let drawn = dealer_plays(&mut dealer, &mut deck);
        assert!(!drawn.is_empty());
        assert!(dealer.total() >= 17);
    }

    // === Round Flow Tests ===

    /// Scenario: player stands on 17, dealer turns 16 into 21.
    #[test]
    fn test_dealer_outdraws_standing_player() {
        let mut deck = Deck::stacked(vec![
            card(10),
            card(7), // player: 17
            card(10), // dealer upcard
            card(6), // hole: dealer 16
            card(5), // dealer draws to 21
        ]);
        let round = Round::<Dealing>::new(0, 1, 1);
        let DealOutcome::Turn(turn) = round.deal(&mut deck) else {
            panic!("17 is not a natural");
        };
        assert_eq!(turn.data.player.total(), 17);
        assert_eq!(turn.dealer_upcard(), card(10));

        let resolved = turn.stand().play(&mut deck);
        assert_eq!(resolved.data.dealer.total(), 21);
        assert_eq!(resolved.outcome(), Outcome::Loss);
    }

    /// Scenario: a natural skips the player turn and beats a flat 17.
    #[test]
    fn test_natural_blackjack_skips_player_turn() {
        let mut deck = Deck::stacked(vec![card(1), card(10), card(9), card(8)]);
        let round = Round::<Dealing>::new(0, 1, 1);
        let DealOutcome::Natural(dealer_turn) = round.deal(&mut deck) else {
            panic!("A + 10 is a natural");
        };
        let resolved = dealer_turn.play(&mut deck);
        // The dealer checks its 17 and never draws against a natural.
        assert_eq!(resolved.data.dealer.len(), 2);
        assert_eq!(resolved.outcome(), Outcome::Win);
    }

    #[test]
    fn test_hit_until_bust_resolves_immediately() {
        let mut deck = Deck::stacked(vec![
            card(10),
            card(6), // player: 16
            card(10),
            card(10),
            card(10), // hit: 26, bust
        ]);
        let round = Round::<Dealing>::new(0, 1, 1);
        let DealOutcome::Turn(turn) = round.deal(&mut deck) else {
            panic!("16 is not a natural");
        };
        match turn.hit(&mut deck) {
            TurnOutcome::Busted(resolved) => {
                assert_eq!(resolved.outcome(), Outcome::Loss);
                // The hole card was never revealed.
                assert_eq!(resolved.data.dealer.len(), 1);
            }
            other => panic!("expected a bust, got {other:?}"),
        }
    }

    #[test]
    fn test_double_down_draws_once_and_stands() {
        let mut deck = Deck::stacked(vec![
            card(6),
            card(5), // player: 11
            card(10),
            card(7), // dealer: 17
            card(9), // doubled draw: 20
        ]);
        let round = Round::<Dealing>::new(0, 1, 1);
        let DealOutcome::Turn(mut turn) = round.deal(&mut deck) else {
            panic!("11 is not a natural");
        };
        turn.data.bet = 50;
        let out = turn.double_down(&mut deck).expect("first decision");
        let TurnOutcome::Standing(dealer_turn) = out else {
            panic!("20 does not bust");
        };
        assert!(dealer_turn.data.doubled);
        assert_eq!(dealer_turn.data.bet, 100);
        let resolved = dealer_turn.play(&mut deck);
        assert_eq!(resolved.outcome(), Outcome::Win);
    }

    #[test]
    fn test_double_down_denied_after_a_hit() {
        let mut deck = Deck::stacked(vec![
            card(5),
            card(5), // player: 10
            card(10),
            card(7),
            card(2), // hit: 12
        ]);
        let round = Round::<Dealing>::new(0, 1, 1);
        let DealOutcome::Turn(turn) = round.deal(&mut deck) else {
            panic!("10 is not a natural");
        };
        let TurnOutcome::Continue(turn) = turn.hit(&mut deck) else {
            panic!("12 does not bust");
        };
        let (_, err) = turn.double_down(&mut deck).unwrap_err();
        assert_eq!(err, UserError::CannotDoubleDown);
    }

    #[test]
    fn test_bet_bounds() {
        let round = Round::<Betting>::new(0, 1, 1);
        let BetOutcome::Rejected(round, err) = round.place_bet(5, 10, 100) else {
            panic!("5 is below the minimum");
        };
        assert_eq!(err, UserError::InvalidBet { min: 10, max: 100 });
        let BetOutcome::Rejected(round, _) = round.place_bet(101, 10, 100) else {
            panic!("101 is above the maximum");
        };
        match round.place_bet(100, 10, 100) {
            BetOutcome::Accepted(dealing) => assert_eq!(dealing.data.bet, 100),
            BetOutcome::Rejected(..) => panic!("100 is in range"),
        }
    }

    #[test]
    fn test_events_come_out_in_protocol_order() {
        let mut deck = Deck::stacked(vec![card(10), card(7), card(9), card(6)]);
        let round = Round::<Dealing>::new(0, 1, 1);
        let DealOutcome::Turn(mut turn) = round.deal(&mut deck) else {
            panic!("17 is not a natural");
        };
        let events: Vec<GameEvent> = turn.data.drain_events().into();
        assert_eq!(events.len(), 4);
        assert!(matches!(
            events[0],
            GameEvent::CardDealt {
                spot: Spot::Seat(0),
                card: Some(_)
            }
        ));
        assert!(matches!(
            events[2],
            GameEvent::CardDealt {
                spot: Spot::Dealer,
                card: Some(_)
            }
        ));
        assert!(matches!(
            events[3],
            GameEvent::CardDealt {
                spot: Spot::Dealer,
                card: None
            }
        ));
    }
}
