//! The blackjack dealer server.
//!
//! Binds a TCP port (port 0 by default, letting the OS pick), then
//! advertises it over UDP broadcast and deals games to whoever connects.

mod config;

use anyhow::Error;
use ctrlc::set_handler;
use log::info;
use pico_args::Arguments;

use blackjack::GameServer;

const HELP: &str = "\
Run a blackjack dealer server

USAGE:
  bj_server [OPTIONS]

OPTIONS:
  --bind IP:PORT        Server socket bind address   [default: env SERVER_BIND or 0.0.0.0:0]
  --name NAME           Advertised server name       [default: env SERVER_NAME or Dealer]
  --discovery-port N    UDP discovery port           [default: env DISCOVERY_PORT or 13122]
  --interval-ms N       Offer broadcast interval     [default: env BROADCAST_INTERVAL_MS or 1000]

FLAGS:
  --no-discovery        Don't broadcast offers
  -h, --help            Print help information

ENVIRONMENT:
  SERVER_BIND, SERVER_NAME, DISCOVERY_PORT, BROADCAST_INTERVAL_MS
  (a .env file is read if present)
";

#[tokio::main]
async fn main() -> Result<(), Error> {
    // Load .env file if it exists.
    let _ = dotenvy::dotenv();

    let mut pargs = Arguments::from_env();

    // Help has a higher priority and should be handled separately.
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let overrides = config::Overrides {
        bind: pargs.opt_value_from_str("--bind")?,
        name: pargs.opt_value_from_str("--name")?,
        discovery_port: pargs.opt_value_from_str("--discovery-port")?,
        broadcast_interval_ms: pargs.opt_value_from_str("--interval-ms")?,
        no_discovery: pargs.contains("--no-discovery"),
    };

    // Catching signals for exit.
    set_handler(|| std::process::exit(0))?;

    env_logger::builder().format_target(false).init();

    let config = config::load(overrides)?;
    info!("starting blackjack server '{}'", config.name);

    let server = GameServer::bind(config).await?;
    info!(
        "listening on {}; press Ctrl+C to stop",
        server.local_addr()?
    );
    server.serve().await?;

    Ok(())
}
