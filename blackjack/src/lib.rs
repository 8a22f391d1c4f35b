//! # Blackjack
//!
//! A networked blackjack implementation: UDP broadcast discovery, a
//! fixed-layout binary protocol over TCP, and a dealer engine built as a
//! type-safe state machine.
//!
//! ## Architecture
//!
//! A round moves through a fixed set of typed states:
//!
//! - **Betting** (casino rules): escrow a bet within table limits
//! - **Dealing**: two cards each, the dealer's second face down
//! - **PlayerTurn**: hit, stand, or double down
//! - **DealerTurn**: reveal, then draw to 17
//! - **Resolved**: compare totals, settle the escrow
//!
//! The engine is transport-agnostic: a [`GameSession`] talks to the
//! world through a [`SeatDriver`], and the TCP wire adapter, the
//! basic-strategy bot, and multiplayer room seats are just different
//! drivers. Multiplayer rooms are actors ([`room::RoomActor`]) owning
//! all shared state; everything reaches them by message passing.
//!
//! ## Core Modules
//!
//! - [`game`]: cards, the round state machine, sessions, statistics
//! - [`net`]: the wire codec, discovery, the server, a blocking client
//! - [`bot`]: the basic-strategy policy and its driver
//! - [`room`]: multiplayer rooms (2-4 seats, one shared dealer)
//!
//! ## Example
//!
//! ```
//! use blackjack::{GameMode, GameSession};
//!
//! // Three classic rounds; drive it with any SeatDriver.
//! let session = GameSession::new(GameMode::Classic, 3);
//! let _ = session;
//! ```

/// Automated play with the basic-strategy policy.
pub mod bot;

/// The blackjack engine itself.
pub mod game;

/// Networking: codec, discovery, server, client.
pub mod net;

/// Multiplayer rooms.
pub mod room;

pub use game::{
    entities::{Card, Chips, Decision, Deck, GameMode, Hand, Outcome, Rank, Suit},
    events::{CloseReason, GameEvent, SeatIndex, Spot},
    round::{Round, UserError, resolve},
    session::{
        BetView, GameSession, SeatDriver, SessionEnd, SessionError, SessionReport, TurnView,
    },
    stats::SessionStats,
};
pub use net::{
    ProtocolError,
    client::Client,
    codec,
    discovery::{OfferBroadcaster, ServerScanner},
    server::{DiscoveryConfig, GameServer, ServerConfig},
};
pub use bot::{BasicStrategy, BotDriver, StrategyConfig};
pub use room::{RoomActor, RoomConfig, RoomError, RoomHandle, RoomId, RoomManager};
