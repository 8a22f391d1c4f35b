//! Fixed-layout binary packets.
//!
//! Four message kinds share one frame: a 4-byte magic cookie (big
//! endian), a 1-byte type tag, then a fixed-width body. The layouts are
//! the interop contract with independently written peers, so encoding is
//! exact to the byte:
//!
//! | message        | type | size | body                                    |
//! |----------------|------|------|-----------------------------------------|
//! | Offer          | 0x02 | 39 B | u16 TCP port BE · 32 B name, NUL-padded |
//! | Request        | 0x03 | 38 B | u8 rounds (1-255) · 32 B name           |
//! | Payload-Client | 0x04 | 10 B | 5 B token `"Hittt"` or `"Stand"`        |
//! | Payload-Server | 0x04 |  9 B | u8 result · u16 rank BE · u8 suit       |

use crate::game::entities::{Card, Decision, Outcome, Suit};

use super::errors::ProtocolError;

/// Every valid packet opens with this, big-endian.
pub const MAGIC_COOKIE: u32 = 0xABCD_DCBA;

pub const MSG_TYPE_OFFER: u8 = 0x02;
pub const MSG_TYPE_REQUEST: u8 = 0x03;
pub const MSG_TYPE_PAYLOAD: u8 = 0x04;

pub const OFFER_LEN: usize = 39;
pub const REQUEST_LEN: usize = 38;
pub const CLIENT_PAYLOAD_LEN: usize = 10;
pub const SERVER_PAYLOAD_LEN: usize = 9;

/// Names on the wire occupy exactly this many bytes.
pub const NAME_LEN: usize = 32;

/// The decision tokens are fixed-width five bytes with no delimiter;
/// "Hittt" is padded to match "Stand" deliberately.
pub const TOKEN_HIT: &[u8; 5] = b"Hittt";
pub const TOKEN_STAND: &[u8; 5] = b"Stand";

/// A round result rides on a throwaway card that must not be added to
/// any hand.
pub const RESULT_FILLER_CARD: Card = Card::new(1, Suit::Heart);

/// Round status codes carried by server payloads, from the client's
/// point of view.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WireResult {
    NotOver,
    Push,
    Loss,
    Win,
}

impl WireResult {
    #[must_use]
    pub const fn code(self) -> u8 {
        match self {
            Self::NotOver => 0,
            Self::Push => 1,
            Self::Loss => 2,
            Self::Win => 3,
        }
    }

    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::NotOver),
            1 => Some(Self::Push),
            2 => Some(Self::Loss),
            3 => Some(Self::Win),
            _ => None,
        }
    }
}

impl From<Outcome> for WireResult {
    fn from(outcome: Outcome) -> Self {
        match outcome {
            Outcome::Win => Self::Win,
            Outcome::Loss => Self::Loss,
            Outcome::Push => Self::Push,
        }
    }
}

/// UDP advertisement of a running server's TCP endpoint and name.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Offer {
    pub tcp_port: u16,
    pub server_name: String,
}

impl Offer {
    #[must_use]
    pub fn encode(&self) -> [u8; OFFER_LEN] {
        let mut buf = [0u8; OFFER_LEN];
        buf[0..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        buf[4] = MSG_TYPE_OFFER;
        buf[5..7].copy_from_slice(&self.tcp_port.to_be_bytes());
        buf[7..].copy_from_slice(&encode_name(&self.server_name));
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        check_frame(buf, OFFER_LEN, MSG_TYPE_OFFER)?;
        let tcp_port = u16::from_be_bytes([buf[5], buf[6]]);
        Ok(Self {
            tcp_port,
            server_name: decode_name(&buf[7..]),
        })
    }
}

/// A client's request to play: how many rounds, and who is asking.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Request {
    pub rounds: u8,
    pub client_name: String,
}

impl Request {
    #[must_use]
    pub fn encode(&self) -> [u8; REQUEST_LEN] {
        let mut buf = [0u8; REQUEST_LEN];
        buf[0..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        buf[4] = MSG_TYPE_REQUEST;
        buf[5] = self.rounds;
        buf[6..].copy_from_slice(&encode_name(&self.client_name));
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        check_frame(buf, REQUEST_LEN, MSG_TYPE_REQUEST)?;
        if buf[5] == 0 {
            return Err(ProtocolError::BadRoundCount);
        }
        Ok(Self {
            rounds: buf[5],
            client_name: decode_name(&buf[6..]),
        })
    }
}

/// A player decision on the wire. The token set only spans hit and
/// stand; a double-down is sent as a hit (the extra card is the same
/// exchange, the escrow change is not the wire's business).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ClientPayload {
    pub decision: Decision,
}

impl ClientPayload {
    #[must_use]
    pub fn encode(&self) -> [u8; CLIENT_PAYLOAD_LEN] {
        let mut buf = [0u8; CLIENT_PAYLOAD_LEN];
        buf[0..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        buf[4] = MSG_TYPE_PAYLOAD;
        let token = match self.decision {
            Decision::Stand => TOKEN_STAND,
            Decision::Hit | Decision::DoubleDown => TOKEN_HIT,
        };
        buf[5..].copy_from_slice(token);
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        check_frame(buf, CLIENT_PAYLOAD_LEN, MSG_TYPE_PAYLOAD)?;
        let decision = match &buf[5..10] {
            token if token == TOKEN_HIT => Decision::Hit,
            token if token == TOKEN_STAND => Decision::Stand,
            _ => return Err(ProtocolError::BadDecisionToken),
        };
        Ok(Self { decision })
    }
}

/// A card (or result-bearing filler card) from the dealer.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ServerPayload {
    pub result: WireResult,
    pub card: Card,
}

impl ServerPayload {
    /// A mid-round card deal.
    #[must_use]
    pub const fn card(card: Card) -> Self {
        Self {
            result: WireResult::NotOver,
            card,
        }
    }

    /// A round result on the filler card.
    #[must_use]
    pub fn result(outcome: Outcome) -> Self {
        Self {
            result: outcome.into(),
            card: RESULT_FILLER_CARD,
        }
    }

    #[must_use]
    pub fn encode(&self) -> [u8; SERVER_PAYLOAD_LEN] {
        let mut buf = [0u8; SERVER_PAYLOAD_LEN];
        buf[0..4].copy_from_slice(&MAGIC_COOKIE.to_be_bytes());
        buf[4] = MSG_TYPE_PAYLOAD;
        buf[5] = self.result.code();
        buf[6..8].copy_from_slice(&u16::from(self.card.rank).to_be_bytes());
        buf[8] = self.card.suit.code();
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        check_frame(buf, SERVER_PAYLOAD_LEN, MSG_TYPE_PAYLOAD)?;
        let result = WireResult::from_code(buf[5]).ok_or(ProtocolError::BadResultCode(buf[5]))?;
        let rank = u16::from_be_bytes([buf[6], buf[7]]);
        if !(1..=13).contains(&rank) {
            return Err(ProtocolError::BadRank(rank));
        }
        let suit = Suit::from_code(buf[8]).ok_or(ProtocolError::BadSuit(buf[8]))?;
        Ok(Self {
            result,
            card: Card::new(rank as u8, suit),
        })
    }
}

fn check_frame(buf: &[u8], expected_len: usize, expected_type: u8) -> Result<(), ProtocolError> {
    if buf.len() != expected_len {
        return Err(ProtocolError::BadLength {
            len: buf.len(),
            expected: expected_len,
        });
    }
    let cookie = u32::from_be_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if cookie != MAGIC_COOKIE {
        return Err(ProtocolError::BadMagic { found: cookie });
    }
    if buf[4] != expected_type {
        return Err(ProtocolError::UnexpectedType {
            found: buf[4],
            expected: expected_type,
        });
    }
    Ok(())
}

fn encode_name(name: &str) -> [u8; NAME_LEN] {
    let mut buf = [0u8; NAME_LEN];
    let mut end = name.len().min(NAME_LEN);
    // Respect UTF-8 boundaries when truncating.
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    buf[..end].copy_from_slice(&name.as_bytes()[..end]);
    buf
}

fn decode_name(buf: &[u8]) -> String {
    let end = buf
        .iter()
        .rposition(|&b| b != 0)
        .map_or(0, |last| last + 1);
    String::from_utf8_lossy(&buf[..end])
        .trim_end()
        .to_string()
}
