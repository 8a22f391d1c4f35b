//! Wire protocol error types.

use thiserror::Error;

/// Everything that can be wrong with a packet.
///
/// Over UDP a malformed packet is dropped silently; over TCP it is a
/// protocol violation that ends the session.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ProtocolError {
    #[error("bad magic cookie {found:#010x}")]
    BadMagic { found: u32 },

    #[error("unexpected message type {found:#04x}, expected {expected:#04x}")]
    UnexpectedType { found: u8, expected: u8 },

    #[error("packet is {len} bytes, expected {expected}")]
    BadLength { len: usize, expected: usize },

    #[error("round count must be 1-255")]
    BadRoundCount,

    #[error("unknown decision token")]
    BadDecisionToken,

    #[error("result code {0} out of range")]
    BadResultCode(u8),

    #[error("card rank {0} out of range")]
    BadRank(u16),

    #[error("card suit {0} out of range")]
    BadSuit(u8),
}
