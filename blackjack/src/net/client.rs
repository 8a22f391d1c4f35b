//! A low-level blocking TCP blackjack client.
//!
//! The client follows the wire protocol step for step: it is useful for
//! simple command-line players and as a testing utility against a live
//! server. Anything richer (bets, rooms) rides the semantic event
//! interface instead of this socket.

use anyhow::{Error, bail};
use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpStream},
    time::Duration,
};

use crate::game::entities::{Card, Decision, Hand, Outcome};

use super::codec::{ClientPayload, Request, SERVER_PAYLOAD_LEN, ServerPayload, WireResult};

/// Default timeout for connecting to a server.
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default timeout for reading from the server. Generous because the
/// dealer may legitimately be waiting on other seats.
pub const READ_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for writing to the server.
pub const WRITE_TIMEOUT: Duration = Duration::from_secs(5);

/// How one round went from the client's side of the table.
#[derive(Clone, Debug)]
pub struct RoundReport {
    pub outcome: Outcome,
    pub player: Hand,
    /// The dealer cards this client saw (upcard, then reveals/draws).
    pub dealer: Hand,
    pub hits: u32,
    pub natural: bool,
}

/// A blocking TCP client for one game against a blackjack server.
pub struct Client {
    /// The name this client introduced itself with.
    pub name: String,
    /// The underlying TCP stream.
    pub stream: TcpStream,
}

impl Client {
    /// Connect to a server and send the opening request for `rounds`
    /// rounds of play.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection fails or the request cannot
    /// be written.
    pub fn connect(name: &str, addr: SocketAddr, rounds: u8) -> Result<Self, Error> {
        if rounds == 0 {
            bail!("rounds must be between 1 and 255");
        }
        let mut stream = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT)?;
        stream.set_read_timeout(Some(READ_TIMEOUT))?;
        stream.set_write_timeout(Some(WRITE_TIMEOUT))?;
        let request = Request {
            rounds,
            client_name: name.to_string(),
        };
        stream.write_all(&request.encode())?;
        Ok(Self {
            name: name.to_string(),
            stream,
        })
    }

    /// Read the next server payload (a card, or a result riding the
    /// filler card).
    ///
    /// # Errors
    ///
    /// Returns an error on disconnect or a malformed packet.
    pub fn recv_card(&mut self) -> Result<ServerPayload, Error> {
        let mut buf = [0u8; SERVER_PAYLOAD_LEN];
        self.stream.read_exact(&mut buf)?;
        Ok(ServerPayload::decode(&buf)?)
    }

    /// Send a hit/stand decision.
    ///
    /// # Errors
    ///
    /// Returns an error if the packet cannot be written.
    pub fn send_decision(&mut self, decision: Decision) -> Result<(), Error> {
        let payload = ClientPayload { decision };
        self.stream.write_all(&payload.encode())?;
        Ok(())
    }

    /// Play one full round, asking `decide` whenever the protocol
    /// expects a decision. On an opening 21 no decision is exchanged at
    /// all; the dealer plays straight away.
    ///
    /// # Errors
    ///
    /// Returns an error on disconnect or protocol violation.
    pub fn play_round(
        &mut self,
        mut decide: impl FnMut(&Hand, Card) -> Decision,
    ) -> Result<RoundReport, Error> {
        let mut player = Hand::new();
        let mut dealer = Hand::new();
        let mut hits = 0u32;

        for _ in 0..2 {
            player.push(self.expect_card()?);
        }
        dealer.push(self.expect_card()?);
        let upcard = dealer.cards()[0];
        let natural = player.is_blackjack();

        if !natural {
            loop {
                let decision = decide(&player, upcard);
                self.send_decision(decision)?;
                match decision {
                    Decision::Stand => break,
                    _ => {
                        hits += 1;
                        let payload = self.recv_card()?;
                        player.push(payload.card);
                        if payload.result != WireResult::NotOver {
                            // Busted: the result came with the last card.
                            return Ok(RoundReport {
                                outcome: Outcome::Loss,
                                player,
                                dealer,
                                hits,
                                natural,
                            });
                        }
                        if player.is_bust() {
                            // The loss notice follows on the filler card.
                            let payload = self.recv_card()?;
                            return Ok(RoundReport {
                                outcome: wire_outcome(payload.result)?,
                                player,
                                dealer,
                                hits,
                                natural,
                            });
                        }
                    }
                }
            }
        }

        // Dealer phase: reveals and draws until the result arrives.
        loop {
            let payload = self.recv_card()?;
            if payload.result == WireResult::NotOver {
                dealer.push(payload.card);
            } else {
                return Ok(RoundReport {
                    outcome: wire_outcome(payload.result)?,
                    player,
                    dealer,
                    hits,
                    natural,
                });
            }
        }
    }

    fn expect_card(&mut self) -> Result<Card, Error> {
        let payload = self.recv_card()?;
        if payload.result != WireResult::NotOver {
            bail!("server ended the round mid-deal");
        }
        Ok(payload.card)
    }
}

fn wire_outcome(result: WireResult) -> Result<Outcome, Error> {
    match result {
        WireResult::Win => Ok(Outcome::Win),
        WireResult::Loss => Ok(Outcome::Loss),
        WireResult::Push => Ok(Outcome::Push),
        WireResult::NotOver => bail!("expected a round result"),
    }
}
