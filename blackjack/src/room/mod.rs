//! Multiplayer rooms: 2-4 seats sharing one dealer.
//!
//! A room is an actor. All room state lives inside [`actor::RoomActor`]
//! and is mutated only by its own task; session contexts talk to it
//! exclusively through a [`RoomHandle`], so bet placement, turn
//! advancement, and round resolution are serialized by construction.

pub mod actor;
pub mod config;
pub mod manager;
pub mod messages;

pub use actor::RoomActor;
pub use config::RoomConfig;
pub use manager::RoomManager;
pub use messages::{RoomError, RoomHandle, RoomMessage};

use rand::Rng;
use std::fmt;

use crate::game::constants::ROOM_CODE_LEN;

/// An 8-character join code, unique among currently open rooms. The
/// alphabet skips lookalike characters since people read these aloud.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RoomId(String);

impl RoomId {
    const CHARSET: &'static [u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";

    #[must_use]
    pub fn generate() -> Self {
        let mut rng = rand::rng();
        let code = (0..ROOM_CODE_LEN)
            .map(|_| Self::CHARSET[rng.random_range(0..Self::CHARSET.len())] as char)
            .collect();
        Self(code)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for RoomId {
    fn from(code: &str) -> Self {
        Self(code.trim().to_ascii_uppercase())
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        self.0.fmt(f)
    }
}
