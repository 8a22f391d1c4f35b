//! Core card, hand, and deck types shared by every part of the game.

use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};
use std::{collections::VecDeque, fmt};

use super::constants::BLACKJACK_TOTAL;

/// Card suits, in wire-code order (see the protocol codec).
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub enum Suit {
    Heart,
    Diamond,
    Club,
    Spade,
}

impl Suit {
    /// All suits, indexed by their wire code.
    pub const ALL: [Self; 4] = [Self::Heart, Self::Diamond, Self::Club, Self::Spade];

    /// The suit's wire code (0-3).
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::Heart => 0,
            Self::Diamond => 1,
            Self::Club => 2,
            Self::Spade => 3,
        }
    }

    /// Look a suit up by its wire code.
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Heart),
            1 => Some(Self::Diamond),
            2 => Some(Self::Club),
            3 => Some(Self::Spade),
            _ => None,
        }
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Card ranks run 1-13: 1 is the ace, 11-13 are jack, queen, and king.
pub type Rank = u8;

/// A single playing card. Plain value type; equality and copying are cheap.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Card {
    pub rank: Rank,
    pub suit: Suit,
}

impl Card {
    #[must_use]
    pub const fn new(rank: Rank, suit: Suit) -> Self {
        Self { rank, suit }
    }

    /// The card's blackjack value: aces count 11 here (the hand demotes
    /// them to 1 as needed), face cards count 10.
    #[must_use]
    pub const fn value(&self) -> u8 {
        match self.rank {
            1 => 11,
            2..=10 => self.rank,
            _ => 10,
        }
    }

    #[must_use]
    pub const fn is_ace(&self) -> bool {
        self.rank == 1
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let rank = match self.rank {
            1 => "A".to_string(),
            11 => "J".to_string(),
            12 => "Q".to_string(),
            13 => "K".to_string(),
            r => r.to_string(),
        };
        write!(f, "{rank}{}", self.suit)
    }
}

/// An ordered hand of cards. Insertion order is deal order.
///
/// The total is recomputed from scratch on every call since the hand's
/// composition changes with every deal.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct Hand {
    cards: Vec<Card>,
}

impl Hand {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, card: Card) {
        self.cards.push(card);
    }

    #[must_use]
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// The hand's total. Each ace starts at 11 and is demoted to 1, one
    /// ace at a time, while the total exceeds 21.
    #[must_use]
    pub fn total(&self) -> u8 {
        let mut total: u8 = 0;
        let mut soft_aces: u8 = 0;
        for card in &self.cards {
            if card.is_ace() {
                soft_aces += 1;
            }
            total = total.saturating_add(card.value());
        }
        while total > BLACKJACK_TOTAL && soft_aces > 0 {
            total -= 10;
            soft_aces -= 1;
        }
        total
    }

    /// Whether an ace is still counted as 11.
    #[must_use]
    pub fn is_soft(&self) -> bool {
        let mut total: u8 = 0;
        let mut aces: u8 = 0;
        for card in &self.cards {
            if card.is_ace() {
                aces += 1;
            }
            total = total.saturating_add(card.value());
        }
        while total > BLACKJACK_TOTAL && aces > 0 {
            total -= 10;
            aces -= 1;
        }
        aces > 0 && total <= BLACKJACK_TOTAL
    }

    #[must_use]
    pub fn is_bust(&self) -> bool {
        self.total() > BLACKJACK_TOTAL
    }

    /// An opening two-card 21 is a natural blackjack.
    #[must_use]
    pub fn is_blackjack(&self) -> bool {
        self.cards.len() == 2 && self.total() == BLACKJACK_TOTAL
    }
}

impl From<Vec<Card>> for Hand {
    fn from(cards: Vec<Card>) -> Self {
        Self { cards }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.cards.is_empty() {
            return write!(f, "empty hand (0)");
        }
        for (i, card) in self.cards.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{card}")?;
        }
        write!(f, " ({})", self.total())
    }
}

/// A conceptually infinite deck: every draw independently samples a
/// uniform rank and suit, so there is no exhaustion and no reshuffle
/// state to track.
///
/// A deck can be seeded for reproducible games, or stacked with a fixed
/// card sequence that is dealt first (handy for demos and scripted
/// tests); once a stack runs dry the deck falls back to random draws.
#[derive(Debug)]
pub struct Deck {
    rng: StdRng,
    stacked: VecDeque<Card>,
}

impl Deck {
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            stacked: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            stacked: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn stacked(cards: impl Into<Vec<Card>>) -> Self {
        Self {
            rng: StdRng::from_os_rng(),
            stacked: cards.into().into(),
        }
    }

    pub fn draw(&mut self) -> Card {
        if let Some(card) = self.stacked.pop_front() {
            return card;
        }
        let rank = self.rng.random_range(1..=13u8);
        let suit = Suit::ALL[self.rng.random_range(0..Suit::ALL.len())];
        Card::new(rank, suit)
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

/// Whole chips. Bets and balances are integers; there is nothing smaller
/// than one chip to argue over.
pub type Chips = u32;

/// The rule set a session plays under. Carried once on the session and
/// consulted only where the rules actually branch (betting, double-down,
/// decision source).
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum GameMode {
    /// Plain rounds against the dealer, no chips.
    Classic,
    /// Betting, double-down, and a chip balance that can run out.
    Casino,
    /// Classic rules with decisions supplied by the strategy policy.
    Bot,
    /// A seat in a shared room; the room coordinator owns the rules.
    Multiplayer,
}

impl GameMode {
    /// Whether rounds open with a betting phase.
    #[must_use]
    pub const fn has_betting(self) -> bool {
        matches!(self, Self::Casino)
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Classic => "classic",
            Self::Casino => "casino",
            Self::Bot => "bot",
            Self::Multiplayer => "multiplayer",
        };
        write!(f, "{repr}")
    }
}

/// A player decision during their turn.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Decision {
    Hit,
    Stand,
    /// Double the bet, draw exactly one card, then stand. Casino rules
    /// only, and only as the first decision of a round.
    DoubleDown,
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Hit => "hit",
            Self::Stand => "stand",
            Self::DoubleDown => "double down",
        };
        write!(f, "{repr}")
    }
}

/// How a round ended for a seat. There are no other outcome categories.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub enum Outcome {
    Win,
    Loss,
    /// A tie. Pushes never move chips.
    Push,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Win => "win",
            Self::Loss => "loss",
            Self::Push => "push",
        };
        write!(f, "{repr}")
    }
}
