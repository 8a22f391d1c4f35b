//! The async game server: UDP offer broadcasting plus one TCP session
//! task per connected client.
//!
//! A session task owns its connection exclusively. It reads exactly one
//! request during the handshake, then hands the socket to a
//! [`WireDriver`] and lets the dealer engine drive the rest; the task's
//! only remaining jobs are shuttling payloads and noticing disconnects.

use std::{io, net::SocketAddr, time::Duration};

use async_trait::async_trait;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

use crate::game::{
    entities::{Chips, Decision, GameMode},
    events::GameEvent,
    session::{BetView, GameSession, SeatDriver, SessionError, TurnView},
};

use super::{
    codec::{CLIENT_PAYLOAD_LEN, ClientPayload, Offer, REQUEST_LEN, Request, ServerPayload},
    discovery::{DEFAULT_BROADCAST_INTERVAL, DEFAULT_DISCOVERY_PORT, OfferBroadcaster},
};

/// Discovery broadcast settings.
#[derive(Clone, Debug)]
pub struct DiscoveryConfig {
    pub port: u16,
    pub interval: Duration,
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_DISCOVERY_PORT,
            interval: DEFAULT_BROADCAST_INTERVAL,
        }
    }
}

/// Server settings. The display name is what offers advertise; it gets
/// truncated to the 32 bytes the wire affords.
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Bind address; port 0 lets the OS choose (offers carry the real
    /// port either way).
    pub bind: SocketAddr,
    pub name: String,
    /// `None` disables discovery broadcasting entirely.
    pub discovery: Option<DiscoveryConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 0)),
            name: "Dealer".to_string(),
            discovery: Some(DiscoveryConfig::default()),
        }
    }
}

/// A bound blackjack server, ready to serve.
pub struct GameServer {
    listener: TcpListener,
    config: ServerConfig,
}

impl GameServer {
    /// Bind the TCP listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the bind address is unavailable.
    pub async fn bind(config: ServerConfig) -> io::Result<Self> {
        let listener = TcpListener::bind(config.bind).await?;
        Ok(Self { listener, config })
    }

    /// The actually-bound address (relevant when binding port 0).
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Broadcast offers (if configured) and accept connections forever.
    ///
    /// # Errors
    ///
    /// Returns an error if accepting fails unrecoverably.
    pub async fn serve(self) -> io::Result<()> {
        let port = self.local_addr()?.port();
        if let Some(discovery) = &self.config.discovery {
            let offer = Offer {
                tcp_port: port,
                server_name: self.config.name.clone(),
            };
            let broadcaster =
                OfferBroadcaster::bind(&offer, discovery.port, discovery.interval).await?;
            log::info!(
                "broadcasting offers for '{}' on port {}",
                self.config.name,
                discovery.port
            );
            tokio::spawn(broadcaster.run());
        }

        log::info!("accepting connections on port {port}");
        loop {
            let (stream, peer) = self.listener.accept().await?;
            tokio::spawn(handle_connection(stream, peer));
        }
    }
}

/// One connection's lifetime: handshake, then the dealer engine runs the
/// game over this socket.
async fn handle_connection(mut stream: TcpStream, peer: SocketAddr) {
    let mut buf = [0u8; REQUEST_LEN];
    if let Err(error) = stream.read_exact(&mut buf).await {
        log::warn!("{peer}: dropped before a request arrived: {error}");
        return;
    }
    let request = match Request::decode(&buf) {
        Ok(request) => request,
        Err(error) => {
            // Protocol violation on the reliable channel: fatal, no retry.
            log::warn!("{peer}: malformed request ({error}), closing");
            return;
        }
    };
    log::info!(
        "{peer}: {} wants to play {} rounds",
        request.client_name,
        request.rounds
    );

    let session = GameSession::new(GameMode::Classic, request.rounds);
    let mut driver = WireDriver::new(stream, peer);
    match session.run(&mut driver).await {
        Ok(report) => log::info!(
            "{peer}: {} finished ({:?}): {} wins, {} losses, {} pushes",
            request.client_name,
            report.end,
            report.stats.wins,
            report.stats.losses,
            report.stats.pushes
        ),
        Err(error) => log::warn!("{peer}: session ended with error: {error}"),
    }
}

/// Adapts the dealer engine's event/decision interface onto the binary
/// protocol. Only card and result events exist on the wire; everything
/// else is implicit in the protocol's fixed order.
struct WireDriver {
    stream: TcpStream,
    peer: SocketAddr,
}

impl WireDriver {
    fn new(stream: TcpStream, peer: SocketAddr) -> Self {
        Self { stream, peer }
    }

    async fn send(&mut self, payload: ServerPayload) -> Result<(), SessionError> {
        self.stream
            .write_all(&payload.encode())
            .await
            .map_err(io_to_session)
    }
}

#[async_trait]
impl SeatDriver for WireDriver {
    async fn deliver(&mut self, event: &GameEvent) -> Result<(), SessionError> {
        log::debug!("{}: {event}", self.peer);
        match event {
            GameEvent::CardDealt {
                card: Some(card), ..
            } => self.send(ServerPayload::card(*card)).await,
            // The face-down card stays with the dealer until reveal.
            GameEvent::CardDealt { card: None, .. } => Ok(()),
            GameEvent::HoleCardRevealed { card } => self.send(ServerPayload::card(*card)).await,
            GameEvent::RoundResolved { outcome, .. } => {
                self.send(ServerPayload::result(*outcome)).await
            }
            _ => Ok(()),
        }
    }

    async fn next_decision(&mut self, _view: &TurnView) -> Result<Decision, SessionError> {
        let mut buf = [0u8; CLIENT_PAYLOAD_LEN];
        self.stream
            .read_exact(&mut buf)
            .await
            .map_err(io_to_session)?;
        let payload = ClientPayload::decode(&buf)?;
        Ok(payload.decision)
    }

    async fn next_bet(&mut self, _view: &BetView) -> Result<Chips, SessionError> {
        // The four-message wire contract has no bet token; betting modes
        // only exist behind the semantic interface.
        Err(SessionError::Unsupported)
    }
}

fn io_to_session(error: io::Error) -> SessionError {
    match error.kind() {
        io::ErrorKind::UnexpectedEof
        | io::ErrorKind::ConnectionReset
        | io::ErrorKind::ConnectionAborted
        | io::ErrorKind::BrokenPipe => SessionError::Disconnected,
        _ => SessionError::Io(error),
    }
}
