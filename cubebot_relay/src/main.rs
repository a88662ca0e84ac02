// CLI entry point for the standalone relay.
//
// Starts a relay that participants connect to. The relay orders session
// actions into turns and broadcasts them; it never runs the engine. See
// `server.rs` for the networking architecture and `session.rs` for the
// session state.
//
// Logging goes to stderr through `tracing-subscriber`, filtered by
// `RUST_LOG` (default `info`).

use clap::Parser;
use cubebot_relay::server::{RelayConfig, start_relay};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "relay")]
#[command(about = "Ordered broadcast relay for shared cube computer sessions")]
struct Args {
    /// Address to bind to
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Listen port
    #[arg(long, default_value_t = 7878)]
    port: u16,

    /// Session name shown to participants
    #[arg(long, default_value = "cubebot-session")]
    name: String,

    /// Session password (optional)
    #[arg(long)]
    password: Option<String>,

    /// Engine ticks per turn (one tick is one millisecond)
    #[arg(long, default_value_t = 50)]
    ticks_per_turn: u32,

    /// Maximum number of participants
    #[arg(long, default_value_t = 4)]
    max_players: u32,
}

impl From<Args> for RelayConfig {
    fn from(args: Args) -> Self {
        Self {
            bind: args.bind,
            port: args.port,
            session_name: args.name,
            password: args.password,
            ticks_per_turn: args.ticks_per_turn,
            max_players: args.max_players,
        }
    }
}

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let (handle, addr) = match start_relay(args.into()) {
        Ok(result) => result,
        Err(err) => {
            error!(%err, "failed to start relay");
            std::process::exit(1);
        }
    };
    info!(%addr, "press Ctrl+C to stop");

    // The process exits on SIGINT/SIGTERM; the relay thread runs until then.
    handle.join();
}
