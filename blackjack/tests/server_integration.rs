//! End-to-end games between the async server and the blocking client
//! over loopback sockets.

use std::{
    io::{Read, Write},
    net::{SocketAddr, TcpStream},
    time::Duration,
};

use blackjack::{Client, Decision, GameServer, Outcome, ServerConfig};

async fn spawn_server() -> SocketAddr {
    let config = ServerConfig {
        bind: "127.0.0.1:0".parse().unwrap(),
        name: "Test Dealer".to_string(),
        // No broadcasting; the tests dial the address directly.
        discovery: None,
    };
    let server = GameServer::bind(config).await.unwrap();
    let addr = server.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = server.serve().await;
    });
    addr
}

#[tokio::test]
async fn test_standing_through_three_rounds() {
    let addr = spawn_server().await;
    let reports = tokio::task::spawn_blocking(move || {
        let mut client = Client::connect("stander", addr, 3).unwrap();
        (0..3)
            .map(|_| client.play_round(|_, _| Decision::Stand).unwrap())
            .collect::<Vec<_>>()
    })
    .await
    .unwrap();

    assert_eq!(reports.len(), 3);
    for report in &reports {
        assert_eq!(report.player.len(), 2);
        assert!(matches!(
            report.outcome,
            Outcome::Win | Outcome::Loss | Outcome::Push
        ));
        if !report.natural {
            // The dealer revealed and played to at least 17.
            assert!(report.dealer.len() >= 2);
            assert!(report.dealer.total() >= 17);
        }
    }
}

#[tokio::test]
async fn test_hitting_until_bust_loses_without_a_reveal() {
    let addr = spawn_server().await;
    let report = tokio::task::spawn_blocking(move || {
        let mut client = Client::connect("reckless", addr, 1).unwrap();
        client.play_round(|_, _| Decision::Hit).unwrap()
    })
    .await
    .unwrap();

    // A natural ends the round before any decision; otherwise endless
    // hitting always busts eventually.
    if !report.natural {
        assert_eq!(report.outcome, Outcome::Loss);
        assert!(report.player.is_bust());
        // The hole card stays hidden when the player busts.
        assert_eq!(report.dealer.len(), 1);
    }
}

#[tokio::test]
async fn test_malformed_request_closes_the_connection() {
    let addr = spawn_server().await;
    tokio::task::spawn_blocking(move || {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        // Right length, wrong cookie.
        stream.write_all(&[0u8; 38]).unwrap();

        let mut buf = [0u8; 16];
        match stream.read(&mut buf) {
            Ok(0) => {}
            Ok(n) => panic!("server replied with {n} bytes to garbage"),
            // A reset also proves the server hung up.
            Err(_) => {}
        }
    })
    .await
    .unwrap();
}

#[tokio::test]
async fn test_garbage_mid_session_terminates_it() {
    let addr = spawn_server().await;
    tokio::task::spawn_blocking(move || {
        let mut client = Client::connect("vandal", addr, 5).unwrap();
        client
            .stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .unwrap();
        // Opening deal: two player cards plus the upcard.
        let mut deal = [0u8; 27];
        client.stream.read_exact(&mut deal).unwrap();
        // Not a decision packet.
        client.stream.write_all(&[0xFF; 10]).unwrap();

        // The server must close rather than keep dealing; drain until
        // EOF (a natural first hand finishes one round first, but with
        // four rounds left the close still proves the point).
        let mut buf = [0u8; 64];
        loop {
            match client.stream.read(&mut buf) {
                Ok(0) => break,
                Ok(_) => {}
                Err(error)
                    if error.kind() == std::io::ErrorKind::WouldBlock
                        || error.kind() == std::io::ErrorKind::TimedOut =>
                {
                    panic!("server kept the session open after garbage")
                }
                // A reset counts as hanging up too.
                Err(_) => break,
            }
        }
    })
    .await
    .unwrap();
}
