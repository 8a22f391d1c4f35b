//! A command-line blackjack client.
//!
//! Scans for servers over UDP, connects over TCP, and plays the
//! requested rounds either interactively or with the basic-strategy
//! bot making every call.

use std::{
    io::{self, Write},
    net::SocketAddr,
    time::Duration,
};

use anyhow::{Context, Result, bail};
use pico_args::Arguments;

use blackjack::{
    BasicStrategy, Card, Client, Decision, Hand, Outcome, ServerScanner, SessionStats,
    net::discovery::{DEFAULT_DISCOVERY_PORT, DEFAULT_SCAN_WINDOW},
};

const HELP: &str = "\
Play blackjack against a discovered server

USAGE:
  bj_client [OPTIONS]

OPTIONS:
  --name NAME           Player name                  [default: your username]
  --rounds N            Rounds to play, 1-255        [default: ask]
  --server IP:PORT      Skip discovery and connect directly
  --discovery-port N    UDP discovery port           [default: 13122]
  --scan-ms N           Scan window in milliseconds  [default: 3000]

FLAGS:
  --bot                 Let basic strategy make every decision
  -h, --help            Print help information
";

struct Args {
    name: String,
    rounds: Option<u8>,
    server: Option<SocketAddr>,
    discovery_port: u16,
    scan_window: Duration,
    bot: bool,
}

fn main() -> Result<()> {
    env_logger::builder().format_target(false).init();

    let mut pargs = Arguments::from_env();
    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let args = Args {
        name: pargs
            .opt_value_from_str("--name")?
            .unwrap_or_else(whoami::username),
        rounds: pargs.opt_value_from_str("--rounds")?,
        server: pargs.opt_value_from_str("--server")?,
        discovery_port: pargs
            .opt_value_from_str("--discovery-port")?
            .unwrap_or(DEFAULT_DISCOVERY_PORT),
        scan_window: pargs
            .opt_value_from_str("--scan-ms")?
            .map_or(DEFAULT_SCAN_WINDOW, Duration::from_millis),
        bot: pargs.contains("--bot"),
    };

    // Fully specified on the command line: play one game and exit.
    let one_shot = args.rounds.is_some() && args.server.is_some();

    loop {
        let rounds = match args.rounds {
            Some(rounds) if rounds >= 1 => rounds,
            Some(_) => bail!("rounds must be between 1 and 255"),
            None => ask_rounds()?,
        };
        let addr = match args.server {
            Some(addr) => addr,
            None => match pick_server(args.discovery_port, args.scan_window)? {
                Some(addr) => addr,
                None => continue,
            },
        };

        let stats = play_game(&args, addr, rounds)?;
        print_summary(&stats);

        if one_shot || !ask_yes_no("Play again?")? {
            println!("Thanks for playing!");
            return Ok(());
        }
    }
}

fn play_game(args: &Args, addr: SocketAddr, rounds: u8) -> Result<SessionStats> {
    println!("Connecting to {addr} as {}...", args.name);
    let mut client =
        Client::connect(&args.name, addr, rounds).context("couldn't reach the server")?;
    println!("Connected. Playing {rounds} rounds.\n");

    let strategy = BasicStrategy::new();
    let mut stats = SessionStats::default();

    for round in 1..=rounds {
        println!("===== Round {round}/{rounds} =====");
        let report = match client.play_round(|hand, upcard| {
            print_table(hand, upcard);
            if args.bot {
                let (decision, reason) = strategy.decide(hand, upcard);
                println!("Bot plays {decision}: {reason}");
                decision
            } else {
                ask_decision()
            }
        }) {
            Ok(report) => report,
            Err(error) => {
                println!("Round {round} failed: {error}");
                break;
            }
        };

        for _ in 0..report.hits {
            stats.record_decision(Decision::Hit);
        }
        if !report.natural && !report.player.is_bust() {
            stats.record_decision(Decision::Stand);
        }
        if report.natural {
            println!("Blackjack!");
        }
        stats.record_round(report.outcome, &report.player, &report.dealer, 0, false, 0);

        println!("Your hand:   {}", report.player);
        println!("Dealer hand: {}", report.dealer);
        let verdict = match report.outcome {
            Outcome::Win => "You WIN!",
            Outcome::Loss => "You lose.",
            Outcome::Push => "Push.",
        };
        println!("{verdict}\n");
    }

    Ok(stats)
}

/// Scan and let the user choose; `Ok(None)` means rescan.
fn pick_server(port: u16, window: Duration) -> Result<Option<SocketAddr>> {
    println!("Scanning for servers...");
    let scanner = ServerScanner::bind(port).context("couldn't bind the discovery port")?;
    let servers = scanner.scan(window)?;
    if servers.is_empty() {
        println!("No servers found.");
        return if ask_yes_no("Try again?")? {
            Ok(None)
        } else {
            bail!("no servers available")
        };
    }

    let entries: Vec<_> = servers.into_iter().collect();
    println!("  0. rescan");
    for (i, (name, addr)) in entries.iter().enumerate() {
        println!("  {}. {name} at {addr}", i + 1);
    }
    loop {
        let line = prompt("Enter your choice: ")?;
        match line.parse::<usize>() {
            Ok(0) => return Ok(None),
            Ok(n) if n <= entries.len() => {
                let (name, addr) = &entries[n - 1];
                println!("Selected {name}.");
                return Ok(Some(*addr));
            }
            _ => println!("Please enter a number between 0 and {}.", entries.len()),
        }
    }
}

fn print_table(hand: &Hand, upcard: Card) {
    println!("Dealer shows {upcard} (second card face down)");
    println!("You have {hand}");
}

fn ask_rounds() -> Result<u8> {
    loop {
        let line = prompt("How many rounds do you want to play? ")?;
        match line.parse::<u16>() {
            Ok(n) if (1..=255).contains(&n) => return Ok(n as u8),
            _ => println!("Please enter a number between 1 and 255."),
        }
    }
}

fn ask_decision() -> Decision {
    loop {
        match prompt("Hit or stand? (h/s): ") {
            Ok(line) => match line.to_lowercase().as_str() {
                "h" | "hit" => return Decision::Hit,
                "s" | "stand" => return Decision::Stand,
                _ => println!("Please enter 'h' for hit or 's' for stand."),
            },
            // Standing is the safe answer to a closed stdin.
            Err(_) => return Decision::Stand,
        }
    }
}

fn ask_yes_no(question: &str) -> Result<bool> {
    let line = prompt(&format!("{question} (y/n): "))?;
    Ok(matches!(line.to_lowercase().as_str(), "y" | "yes"))
}

fn prompt(text: &str) -> Result<String> {
    print!("{text}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

fn print_summary(stats: &SessionStats) {
    println!("===== Game Summary =====");
    println!("Rounds played:   {}", stats.rounds_played);
    println!(
        "Record:          {} wins / {} losses / {} pushes",
        stats.wins, stats.losses, stats.pushes
    );
    println!("Win rate:        {:.1}%", stats.win_rate());
    println!("Average hand:    {:.1}", stats.average_hand());
    println!(
        "Best streaks:    {} wins, {} losses",
        stats.longest_win_streak, stats.longest_loss_streak
    );
    println!("Blackjacks:      {}", stats.blackjacks);
    if stats.busts > 0 {
        println!(
            "Busts:           {} (worst: {})",
            stats.busts, stats.biggest_bust
        );
    }
    println!("Dealer busts:    {}", stats.dealer_busts);
    println!(
        "Decisions:       {} hits, {} stands",
        stats.total_hits, stats.total_stands
    );
}
