//! Server discovery over UDP broadcast.
//!
//! The server side is fire-and-forget: an [`OfferBroadcaster`] resends
//! the offer on a fixed interval, and that periodic resend is the only
//! retry mechanism anywhere in the protocol. The client side is a lazy,
//! restartable [`ServerScanner`]: every scan starts from an empty
//! collection and gathers whatever offers arrive during its window.

use std::{
    collections::BTreeMap,
    io,
    net::{Ipv4Addr, SocketAddr, UdpSocket},
    time::{Duration, Instant},
};

use super::codec::{OFFER_LEN, Offer};

/// The well-known port clients listen on for offers.
pub const DEFAULT_DISCOVERY_PORT: u16 = 13122;

/// How often the server re-broadcasts its offer.
pub const DEFAULT_BROADCAST_INTERVAL: Duration = Duration::from_secs(1);

/// How long a single scan collects offers.
pub const DEFAULT_SCAN_WINDOW: Duration = Duration::from_secs(3);

/// Periodically broadcasts a server's offer packet.
pub struct OfferBroadcaster {
    socket: tokio::net::UdpSocket,
    payload: [u8; OFFER_LEN],
    target: SocketAddr,
    interval: Duration,
}

impl OfferBroadcaster {
    /// Bind a broadcast-capable socket advertising `offer` to the given
    /// discovery port.
    pub async fn bind(
        offer: &Offer,
        discovery_port: u16,
        interval: Duration,
    ) -> io::Result<Self> {
        let socket = tokio::net::UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_broadcast(true)?;
        Ok(Self {
            socket,
            payload: offer.encode(),
            target: (Ipv4Addr::BROADCAST, discovery_port).into(),
            interval,
        })
    }

    /// Broadcast forever. Send failures are logged and retried on the
    /// next tick; there is nothing else to do about them.
    pub async fn run(self) {
        let mut ticker = tokio::time::interval(self.interval);
        loop {
            ticker.tick().await;
            match self.socket.send_to(&self.payload, self.target).await {
                Ok(_) => log::debug!("broadcast offer to {}", self.target),
                Err(error) => log::warn!("offer broadcast failed: {error}"),
            }
        }
    }
}

/// Collects offers from the discovery port into a name → address map.
pub struct ServerScanner {
    socket: UdpSocket,
}

impl ServerScanner {
    /// Bind the discovery port. Port 0 picks an ephemeral port, which is
    /// only useful for tests.
    pub fn bind(port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, port))?;
        Ok(Self { socket })
    }

    pub fn local_port(&self) -> io::Result<u16> {
        Ok(self.socket.local_addr()?.port())
    }

    /// Scan for `window`, returning every distinct server observed. A
    /// repeated offer from the same name refreshes its entry. Malformed
    /// packets are dropped without comment; this channel is best-effort.
    pub fn scan(&self, window: Duration) -> io::Result<BTreeMap<String, SocketAddr>> {
        let mut servers = BTreeMap::new();
        let deadline = Instant::now() + window;
        let mut buf = [0u8; 64];

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                break;
            }
            self.socket
                .set_read_timeout(Some(remaining.min(Duration::from_millis(200))))?;
            match self.socket.recv_from(&mut buf) {
                Ok((len, src)) => match Offer::decode(&buf[..len]) {
                    Ok(offer) => {
                        let addr = SocketAddr::new(src.ip(), offer.tcp_port);
                        if servers.insert(offer.server_name.clone(), addr).is_none() {
                            log::info!("found server {} at {addr}", offer.server_name);
                        }
                    }
                    Err(error) => log::debug!("ignoring packet from {src}: {error}"),
                },
                Err(error)
                    if error.kind() == io::ErrorKind::WouldBlock
                        || error.kind() == io::ErrorKind::TimedOut => {}
                Err(error) => return Err(error),
            }
        }

        Ok(servers)
    }
}
